/// Bearer token extraction from request headers

use actix_web::http::header::{HeaderMap, AUTHORIZATION};

use crate::error::AuthError;

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the raw token from an `Authorization: Bearer <token>` header
///
/// The prefix is matched case-sensitively with a single space. Whitespace
/// is trimmed at the boundaries of the remainder only.
///
/// # Errors
/// Returns `AuthError::MissingToken` if the header is absent, not valid
/// UTF-8, lacks the prefix, or carries an empty token.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let token = value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .ok_or(AuthError::MissingToken)?;

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    Ok(token.to_string())
}
