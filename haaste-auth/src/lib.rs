//! Session tokens for the Haasteikko backend.
//!
//! [`TokenIssuer`] signs HS256 session tokens at login, and [`IdentityExtractor`] recovers the
//! caller's user id from an `Authorization: Bearer` header on later requests. With the
//! `axum-extract` feature, [`AuthenticatedUser`] does the latter as an axum extractor.

//--------------------------------------------------------------------------------------------------

pub mod extract;
pub(crate) mod internal;
pub mod issue;
#[cfg(feature = "axum-extract")]
pub mod request;
pub mod secret;
mod types;

pub use extract::{ExtractError, IdentityExtractor, InspectedToken};
pub use issue::{IssueError, SessionToken, TokenIssuer};
#[cfg(feature = "axum-extract")]
pub use request::AuthenticatedUser;
pub use secret::{ConfigError, EnvSecretProvider, Secret, SecretProvider, StaticSecretProvider};
pub use types::*;

//--------------------------------------------------------------------------------------------------
