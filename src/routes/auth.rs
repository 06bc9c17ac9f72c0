/// Authentication Routes
///
/// Registration, login, access token refresh, refresh token revocation and
/// credential updates. Handlers only translate between JSON and `AuthService`.

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthService;
use crate::error::AppError;
use crate::middleware::AuthenticatedUser;
use crate::store::UserRecord;

/// Email + password body shared by registration, login and updates
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
    /// Requested access token lifetime (login only, honored when enabled)
    #[serde(default)]
    pub expires_in_seconds: Option<i64>,
}

/// Public view of a user, optionally carrying freshly issued tokens
#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            created_at: user.created_at,
            updated_at: user.updated_at,
            email: user.email,
            token: None,
            refresh_token: None,
        }
    }
}

/// Response of `/api/refresh`
#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// POST /api/users
///
/// # Errors
/// - 400: Invalid email
/// - 409: Email already registered
/// - 500: Password could not be hashed
pub async fn register(
    form: web::Json<CredentialsRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let user = auth.register(&form.email, &form.password).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// POST /api/login
///
/// Returns the user with an access token and a refresh token.
///
/// # Errors
/// - 401: "Incorrect email or password" for unknown email or wrong password
pub async fn login(
    form: web::Json<CredentialsRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let outcome = auth
        .login(&form.email, &form.password, form.expires_in_seconds)
        .await?;

    let mut body = UserResponse::from(outcome.user);
    body.token = Some(outcome.access_token);
    body.refresh_token = Some(outcome.refresh_token.token);

    Ok(HttpResponse::Ok().json(body))
}

/// POST /api/refresh
///
/// Requires `Authorization: Bearer <refresh_token>`.
pub async fn refresh(
    req: HttpRequest,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let token = auth.refresh(req.headers()).await?;
    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

/// POST /api/revoke
///
/// Requires `Authorization: Bearer <refresh_token>`. Idempotent.
pub async fn revoke(
    req: HttpRequest,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    auth.revoke(req.headers()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// PUT /api/users
///
/// **Requires a valid access token**; the caller is injected by `JwtMiddleware`.
pub async fn update_user(
    caller: web::ReqData<AuthenticatedUser>,
    form: web::Json<CredentialsRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let AuthenticatedUser(user_id) = caller.into_inner();
    let user = auth
        .update_credentials(user_id, &form.email, &form.password)
        .await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}
