/// JWT Token Generation and Validation
///
/// Access tokens are stateless HS256-signed claim sets. Validity is a pure
/// function of signature, issuer and expiry at the time of the check, so
/// every entry point has a clock-injected `_at` variant.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::configuration::AuthSettings;
use crate::error::AuthError;

/// Pick the lifetime for a new access token
///
/// A caller-requested lifetime is honored only when the settings allow it
/// and it lies in `(0, max_access_token_expiry]`; anything else falls back
/// to the configured default.
pub fn resolve_ttl(config: &AuthSettings, requested_seconds: Option<i64>) -> i64 {
    match requested_seconds {
        Some(requested)
            if config.allow_requested_expiry
                && requested > 0
                && requested <= config.max_access_token_expiry =>
        {
            requested
        }
        _ => config.access_token_expiry,
    }
}

/// Generate a new access token for a user
///
/// # Errors
/// - `AuthError::InvalidTtl` if `ttl_seconds` is not positive
/// - `AuthError::TokenSigning` if encoding fails
pub fn issue_access_token(
    user_id: Uuid,
    config: &AuthSettings,
    ttl_seconds: i64,
) -> Result<String, AuthError> {
    issue_access_token_at(user_id, config, ttl_seconds, Utc::now())
}

/// Generate an access token as if issued at `now`
pub fn issue_access_token_at(
    user_id: Uuid,
    config: &AuthSettings,
    ttl_seconds: i64,
    now: DateTime<Utc>,
) -> Result<String, AuthError> {
    if ttl_seconds <= 0 {
        return Err(AuthError::InvalidTtl(ttl_seconds));
    }

    let claims = Claims::new(user_id, &config.issuer, ttl_seconds, now);

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AuthError::TokenSigning(e.to_string()))
}

/// Validate an access token and return the user it was issued to
///
/// # Errors
/// Returns `AuthError::InvalidToken` for every failure: malformed input,
/// bad signature, wrong issuer, expired, or a subject that is not a UUID.
pub fn validate_access_token(token: &str, config: &AuthSettings) -> Result<Uuid, AuthError> {
    validate_access_token_at(token, config, Utc::now())
}

/// Validate an access token against the clock reading `now`
pub fn validate_access_token_at(
    token: &str,
    config: &AuthSettings,
    now: DateTime<Utc>,
) -> Result<Uuid, AuthError> {
    let claims = decode_claims(token, config)?;
    if claims.is_expired_at(now) {
        return Err(AuthError::InvalidToken);
    }
    claims.user_id()
}

/// Verify signature and issuer; expiry is checked by the caller against its clock
fn decode_claims(token: &str, config: &AuthSettings) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);
    validation.validate_exp = false;
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AuthError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const HOUR: i64 = 3600;

    fn get_test_config() -> AuthSettings {
        AuthSettings::with_secret("test-secret-key-at-least-32-characters-long")
    }

    #[test]
    fn test_issue_and_validate_token() {
        let config = get_test_config();
        let user_id = Uuid::new_v4();

        let token = issue_access_token(user_id, &config, HOUR).expect("Failed to issue token");
        let validated = validate_access_token(&token, &config).expect("Failed to validate token");

        assert_eq!(validated, user_id);
    }

    #[test]
    fn test_valid_until_just_before_expiry() {
        let config = get_test_config();
        let user_id = Uuid::new_v4();
        let issued_at = Utc::now();

        let token = issue_access_token_at(user_id, &config, HOUR, issued_at).unwrap();

        let just_before = issued_at + Duration::seconds(HOUR - 1);
        assert_eq!(validate_access_token_at(&token, &config, just_before), Ok(user_id));
    }

    #[test]
    fn test_invalid_at_and_after_expiry() {
        let config = get_test_config();
        let issued_at = Utc::now();

        let token = issue_access_token_at(Uuid::new_v4(), &config, HOUR, issued_at).unwrap();

        let at_expiry = issued_at + Duration::seconds(HOUR);
        let after_expiry = issued_at + Duration::seconds(HOUR + 1);
        assert_eq!(
            validate_access_token_at(&token, &config, at_expiry),
            Err(AuthError::InvalidToken)
        );
        assert_eq!(
            validate_access_token_at(&token, &config, after_expiry),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn test_expired_token_from_the_past() {
        let config = get_test_config();
        let long_ago = Utc::now() - Duration::days(2);

        let token = issue_access_token_at(Uuid::new_v4(), &config, HOUR, long_ago).unwrap();

        assert_eq!(validate_access_token(&token, &config), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_invalid_token() {
        let config = get_test_config();
        let result = validate_access_token("invalid.token.string", &config);

        assert_eq!(result, Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_empty_token() {
        let config = get_test_config();
        assert_eq!(validate_access_token("", &config), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_wrong_secret() {
        let config = get_test_config();
        let token = issue_access_token(Uuid::new_v4(), &config, HOUR).unwrap();

        let mut other = get_test_config();
        other.secret = "a-different-secret-that-is-also-32-bytes".to_string();

        assert_eq!(validate_access_token(&token, &other), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_tampered_token() {
        let config = get_test_config();
        let token = issue_access_token(Uuid::new_v4(), &config, HOUR).unwrap();

        let tampered = format!("{}X", token);
        assert_eq!(validate_access_token(&tampered, &config), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_wrong_issuer() {
        let mut config = get_test_config();
        let token = issue_access_token(Uuid::new_v4(), &config, HOUR).unwrap();

        config.issuer = "wrong-issuer".to_string();
        assert_eq!(validate_access_token(&token, &config), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_non_positive_ttl_rejected() {
        let config = get_test_config();

        assert_eq!(
            issue_access_token(Uuid::new_v4(), &config, 0),
            Err(AuthError::InvalidTtl(0))
        );
        assert_eq!(
            issue_access_token(Uuid::new_v4(), &config, -5),
            Err(AuthError::InvalidTtl(-5))
        );
    }

    #[test]
    fn test_resolve_ttl_ignores_request_when_disabled() {
        let config = get_test_config();
        assert_eq!(resolve_ttl(&config, Some(60)), HOUR);
        assert_eq!(resolve_ttl(&config, None), HOUR);
    }

    #[test]
    fn test_resolve_ttl_bounds_requested_expiry() {
        let mut config = get_test_config();
        config.allow_requested_expiry = true;

        assert_eq!(resolve_ttl(&config, Some(60)), 60);
        assert_eq!(resolve_ttl(&config, Some(HOUR)), HOUR);
        assert_eq!(resolve_ttl(&config, Some(HOUR + 1)), HOUR);
        assert_eq!(resolve_ttl(&config, Some(0)), HOUR);
        assert_eq!(resolve_ttl(&config, Some(-10)), HOUR);
        assert_eq!(resolve_ttl(&config, None), HOUR);
    }
}
