/// Authentication module
///
/// Password hashing, access token issuance/validation, bearer extraction,
/// refresh token lifecycle, and the session flows built on top of them.

mod bearer;
mod claims;
mod jwt;
mod password;
mod refresh_token;
mod service;

pub use bearer::extract_bearer_token;
pub use claims::Claims;
pub use jwt::{
    issue_access_token, issue_access_token_at, resolve_ttl, validate_access_token,
    validate_access_token_at,
};
pub use password::{
    hash_password, verify_password, MAX_PASSWORD_BYTES, MAX_PASSWORD_COST, MIN_PASSWORD_COST,
};
pub use refresh_token::{
    generate_refresh_token, RefreshToken, RefreshTokenState, REFRESH_TOKEN_BYTES,
};
pub use service::{AuthService, LoginOutcome};
