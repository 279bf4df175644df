/// Authentication Routes
///
/// Registration, login, token refresh, logout, and identity lookups.
/// Tokens travel only as HttpOnly cookies; the access token is echoed in
/// login and refresh bodies for non-browser clients.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{clear_token_cookies, set_token_cookies, AuthService, Identity};
use crate::configuration::CookieSettings;
use crate::error::{AppError, ErrorContext, ValidationError};
use crate::middleware::RefreshCredential;
use crate::models::Account;

/// User registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub confirm_password: Option<String>,
}

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub account: Account,
    pub access_token: String,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// POST /auth/register
///
/// # Errors
/// - 400: invalid email, username or password, or mismatched confirmation
/// - 409: email or username already registered
pub async fn register(
    form: web::Json<RegisterRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("account_registration");
    let form = form.into_inner();

    if let Some(confirm) = &form.confirm_password {
        if confirm != &form.password {
            return Err(ValidationError::PasswordMismatch.into());
        }
    }

    let account = auth
        .register(&form.email, &form.username, &form.password)
        .await?;

    tracing::info!(
        request_id = %context.request_id,
        account_id = %account.id,
        "Account registered successfully"
    );

    Ok(HttpResponse::Created().json(account))
}

/// POST /auth/login
///
/// Sets the `access_token` and `refresh_token` cookies. With `remember_me`
/// both cookies outlive the browser session.
///
/// # Errors
/// - 401: unknown email or wrong password, indistinguishably
pub async fn login(
    form: web::Json<LoginRequest>,
    auth: web::Data<AuthService>,
    cookies: web::Data<CookieSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("account_login");

    let grant = auth.login(&form.email, &form.password).await?;

    tracing::info!(
        request_id = %context.request_id,
        account_id = %grant.account.id,
        remember_me = form.remember_me,
        "Account logged in successfully"
    );

    let mut response = HttpResponse::Ok();
    set_token_cookies(&mut response, &grant.tokens, form.remember_me, &cookies);
    Ok(response.json(LoginResponse {
        access_token: grant.tokens.access_token.clone(),
        account: grant.account,
    }))
}

/// POST /auth/refresh
///
/// Runs behind the refresh guard. Both cookies are rotated.
///
/// # Errors
/// - 403: missing, expired or forged refresh token
/// - 401: the account behind the token no longer exists
pub async fn refresh(
    credential: web::ReqData<RefreshCredential>,
    auth: web::Data<AuthService>,
    cookies: web::Data<CookieSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh")
        .with_account_id(credential.identity.account_id);

    let grant = auth.refresh(&credential.token).await?;

    tracing::info!(
        request_id = %context.request_id,
        account_id = %grant.account.id,
        "Token refreshed successfully"
    );

    let mut response = HttpResponse::Ok();
    set_token_cookies(&mut response, &grant.tokens, false, &cookies);
    Ok(response.json(RefreshResponse {
        access_token: grant.tokens.access_token,
        expires_in: auth.issuer().access_ttl(),
    }))
}

/// POST /auth/logout
///
/// Clears both cookies. Nothing is revoked server-side.
pub async fn logout(cookies: web::Data<CookieSettings>) -> HttpResponse {
    tracing::info!("Logout requested");

    let mut response = HttpResponse::NoContent();
    clear_token_cookies(&mut response, &cookies);
    response.finish()
}

/// GET /auth/current-user
///
/// # Errors
/// - 401: no valid access token (gatekeeper), or the account was deleted
pub async fn current_user(
    identity: web::ReqData<Identity>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let account = auth.current_account(identity.account_id).await?;
    Ok(HttpResponse::Ok().json(account))
}

/// GET /auth/session
///
/// Public: reports whether the request carries a valid access token.
pub async fn session(identity: Option<web::ReqData<Identity>>) -> HttpResponse {
    let response = match identity {
        Some(identity) => SessionResponse {
            authenticated: true,
            account_id: Some(identity.account_id),
            email: Some(identity.email.clone()),
        },
        None => SessionResponse {
            authenticated: false,
            account_id: None,
            email: None,
        },
    };

    HttpResponse::Ok().json(response)
}

/// PATCH /auth/password
///
/// Existing tokens stay valid until they expire.
///
/// # Errors
/// - 400: new password invalid or equal to the current one
/// - 401: current password wrong
pub async fn change_password(
    identity: web::ReqData<Identity>,
    form: web::Json<ChangePasswordRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("password_change").with_account_id(identity.account_id);

    auth.credentials()
        .change_password(identity.account_id, &form.current_password, &form.new_password)
        .await?;

    tracing::info!(
        request_id = %context.request_id,
        account_id = ?context.account_id,
        "Password changed"
    );

    Ok(HttpResponse::NoContent().finish())
}
