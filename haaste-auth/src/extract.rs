use crate::internal::claims::PresentedClaims;
use crate::UserId;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{decode_header, Header, TokenData};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;

//--------------------------------------------------------------------------------------------------
// Extract Error
//--------------------------------------------------------------------------------------------------

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ExtractError {
    #[error("missing token")]
    MissingToken,
    #[error("malformed token")]
    MalformedToken,
    #[error("token expired")]
    TokenExpired,
    #[error("oid claim not found")]
    MissingIdentityClaim,
}

//--------------------------------------------------------------------------------------------------
// Decoding
//--------------------------------------------------------------------------------------------------

pub const AUTHORIZATION_BEARER_PREFIX: &str = "Bearer ";

// A header without the prefix is taken to be the bare token
fn bearer_token(authorization: Option<&str>) -> Result<&str, ExtractError> {
    let header = authorization.unwrap_or_default();
    let token = header
        .strip_prefix(AUTHORIZATION_BEARER_PREFIX)
        .unwrap_or(header);

    if token.is_empty() {
        debug!("No bearer token presented");
        return Err(ExtractError::MissingToken);
    }

    Ok(token)
}

// Decodes header and payload but never checks the signature against any key. The payload is
// decoded here rather than by `jsonwebtoken::decode`, whose claim pre-parse rejects a repeated
// `exp`/`sub`/`aud`; a repeated claim keeps its last value instead.
fn decode_unverified<T: DeserializeOwned>(token: &str) -> Result<TokenData<T>, ExtractError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [_, payload, signature] = segments.as_slice() else {
        debug!("Token has {} segments, expected 3", segments.len());
        return Err(ExtractError::MalformedToken);
    };

    if let Err(err) = URL_SAFE_NO_PAD.decode(signature) {
        debug!("Token signature segment is not base64url: {}", err);
        return Err(ExtractError::MalformedToken);
    }

    let header = decode_header(token).map_err(|err| {
        debug!("Token header could not be decoded: {:?}", err);
        ExtractError::MalformedToken
    })?;

    let payload = URL_SAFE_NO_PAD.decode(payload).map_err(|err| {
        debug!("Token payload segment is not base64url: {}", err);
        ExtractError::MalformedToken
    })?;

    let claims = serde_json::from_slice::<T>(&payload).map_err(|err| {
        debug!("Token claims could not be decoded: {}", err);
        ExtractError::MalformedToken
    })?;

    Ok(TokenData { header, claims })
}

//--------------------------------------------------------------------------------------------------
// Identity extraction
//--------------------------------------------------------------------------------------------------

/// Recovers the caller's user id from an `Authorization` header value.
///
/// The token's signature is **not** verified. Tokens are trusted on structure alone, with
/// authenticity delegated to whatever sits in front of the service. Any well-formed token that
/// carries a non-empty `oid` claim and has not expired is accepted.
///
/// Tokens issued by [`TokenIssuer`](crate::TokenIssuer) carry the user id as `sub`, not `oid`,
/// so they are rejected here with [`ExtractError::MissingIdentityClaim`].
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityExtractor;

impl IdentityExtractor {
    pub fn new() -> Self {
        IdentityExtractor
    }

    pub fn extract(&self, authorization: Option<&str>) -> Result<UserId, ExtractError> {
        self.extract_at(authorization, OffsetDateTime::now_utc())
    }

    pub fn extract_at(
        &self,
        authorization: Option<&str>,
        now: OffsetDateTime,
    ) -> Result<UserId, ExtractError> {
        let token = bearer_token(authorization)?;
        let claims = decode_unverified::<PresentedClaims>(token)?.claims;

        // Tokens without an exp never expire
        if let Some(exp) = claims.exp() {
            if exp.is_before(now) {
                debug!("Token expired at {}", exp.seconds());
                return Err(ExtractError::TokenExpired);
            }
        }

        match claims.oid() {
            Some(oid) if !oid.is_empty() => Ok(UserId::from(oid)),
            _ => {
                debug!("Token has no usable oid claim");
                Err(ExtractError::MissingIdentityClaim)
            }
        }
    }

    /// Decodes a bearer token for diagnostics, without checking expiry or identity.
    pub fn inspect(&self, authorization: Option<&str>) -> Result<InspectedToken, ExtractError> {
        let token = bearer_token(authorization)?;
        let TokenData { header, claims } = decode_unverified::<Map<String, Value>>(token)?;

        Ok(InspectedToken { header, claims })
    }
}

//--------------------------------------------------------------------------------------------------
// Inspected token
//--------------------------------------------------------------------------------------------------

#[derive(Serialize, Debug, Clone)]
pub struct InspectedToken {
    pub header: Header,
    pub claims: Map<String, Value>,
}

//--------------------------------------------------------------------------------------------------


//--------------------------------------------------------------------------------------------------
