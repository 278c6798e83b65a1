use crate::internal::claims::SessionClaims;
use crate::secret::{ConfigError, SecretProvider};
use crate::{UserId, Username};
use jsonwebtoken::{encode, Algorithm, Header};
use serde::Serialize;
use std::fmt::Display;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{error, info};

//--------------------------------------------------------------------------------------------------
// Session Token Type
//--------------------------------------------------------------------------------------------------

/// A compact HS256 JWT: three base64url segments joined by `.`.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// The token formatted for an `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//--------------------------------------------------------------------------------------------------
// Issue Error
//--------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("signing secret unavailable")]
    Config(#[from] ConfigError),
    #[error("failed to create token")]
    TokenCreation(#[source] jsonwebtoken::errors::Error),
}

//--------------------------------------------------------------------------------------------------
// Issuer
//--------------------------------------------------------------------------------------------------

/// Issues session tokens that expire 24 hours after creation.
///
/// The secret is resolved from the provider for every token, so rotating the configured value
/// takes effect on the next login.
#[derive(Clone, Debug)]
pub struct TokenIssuer<P> {
    secret_provider: P,
}

impl<P: SecretProvider> TokenIssuer<P> {
    pub fn new(secret_provider: P) -> Self {
        TokenIssuer { secret_provider }
    }

    /// Resolve the secret once without issuing anything, so service startup can fail fast on a
    /// misconfigured deployment.
    pub fn check_secret(&self) -> Result<(), ConfigError> {
        self.secret_provider.resolve().map(|_| ())
    }

    pub fn create(
        &self,
        username: impl Into<Username>,
        user_id: impl Into<UserId>,
    ) -> Result<SessionToken, IssueError> {
        self.create_at(username, user_id, OffsetDateTime::now_utc())
    }

    pub fn create_at(
        &self,
        username: impl Into<Username>,
        user_id: impl Into<UserId>,
        now: OffsetDateTime,
    ) -> Result<SessionToken, IssueError> {
        let user_id = user_id.into();
        let claims = SessionClaims::new(username.into(), user_id.clone(), now.into());

        let secret = match self.secret_provider.resolve() {
            Ok(secret) => secret,
            Err(err) => {
                error!("Unable to resolve signing secret: {}", err);
                return Err(err.into());
            }
        };

        let header = Header::new(Algorithm::HS256);
        let token = match encode(&header, &claims, &secret.encoding_key()) {
            Ok(token) => token,
            Err(err) => {
                error!("Error signing token for user {}: {}", user_id, err);
                return Err(IssueError::TokenCreation(err));
            }
        };

        info!(
            "Session token issued for user {}, expires at {}",
            user_id,
            claims.exp().seconds()
        );

        Ok(SessionToken(token))
    }
}

//--------------------------------------------------------------------------------------------------


//--------------------------------------------------------------------------------------------------
