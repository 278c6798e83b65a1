use crate::extract::{ExtractError, IdentityExtractor};
use crate::UserId;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{async_trait, Json};
use serde::Serialize;
use tracing::{debug, warn};

//--------------------------------------------------------------------------------------------------
// Error responses
//--------------------------------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    code: &'static str,
    message: String,
}

impl ExtractError {
    fn code(&self) -> &'static str {
        match self {
            ExtractError::MissingToken => "missing_token",
            ExtractError::MalformedToken => "malformed_token",
            ExtractError::TokenExpired => "token_expired",
            ExtractError::MissingIdentityClaim => "missing_identity_claim",
        }
    }
}

// Every extraction failure is the caller's problem, so all of them are a 401
impl IntoResponse for ExtractError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                code: self.code(),
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

//--------------------------------------------------------------------------------------------------
// Axum extractor to get the caller's user ID
//--------------------------------------------------------------------------------------------------

#[derive(Clone)]
struct ExtractedUser(UserId);

fn extract_request(parts: &mut Parts) -> Result<UserId, ExtractError> {
    // Check to see if we already extracted the user for this request
    if let Some(ExtractedUser(user_id)) = parts.extensions.get::<ExtractedUser>() {
        debug!("User {} already extracted for this request", user_id);
        return Ok(user_id.clone());
    }

    let authorization = match parts.headers.get(AUTHORIZATION) {
        Some(value) => match value.to_str() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Request made with Authorization header with more than visible ASCII characters");
                return Err(ExtractError::MalformedToken);
            }
        },
        None => None,
    };

    let user_id = match IdentityExtractor::new().extract(authorization) {
        Ok(user_id) => user_id,
        Err(err) => {
            warn!("Request rejected, could not extract user: {}", err);
            return Err(err);
        }
    };

    parts.extensions.insert(ExtractedUser(user_id.clone()));

    debug!("Request authenticated as user {}", user_id);

    Ok(user_id)
}

/// The authenticated caller of a request, taken from its bearer token.
///
/// Rejects with a `401` JSON body when no usable identity can be extracted.
pub struct AuthenticatedUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ExtractError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        extract_request(parts).map(AuthenticatedUser)
    }
}

//--------------------------------------------------------------------------------------------------
