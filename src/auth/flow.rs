//! Login, logout, forgot-password, and reset-password flows, shared by the
//! employee and administrator route modules. Each handler takes the
//! principal class it operates on; the two classes never mix.

use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{Duration, Utc};
use rand::Rng;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::auth::jwt::{Claims, encode_token};
use crate::auth::password;
use crate::db::principals::{self, PrincipalClass};
use crate::error::AppError;
use crate::models::Principal;
use crate::state::SharedState;
use crate::validate::MIN_PASSWORD_LEN;

/// A reset code stops authorizing a reset ten minutes after issuance.
pub const RESET_CODE_TTL_MINUTES: i64 = 10;

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

fn auth_cookie(token: &str, ttl_hours: i64) -> CookieJar {
    let cookie = Cookie::build(("access_token", token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(ttl_hours))
        .build();
    CookieJar::new().add(cookie)
}

fn clear_auth_cookie() -> CookieJar {
    let cookie = Cookie::build(("access_token", ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    CookieJar::new().add(cookie)
}

fn generate_reset_code() -> String {
    rand::rng().random_range(100_000..=999_999).to_string()
}

/// Issue an access token for the principal, as cookie and response body.
pub fn issue_token(
    state: &SharedState,
    principal: Principal,
) -> Result<(CookieJar, axum::Json<Value>), AppError> {
    let claims = Claims::new(principal.id, state.config.jwt_ttl_hours);
    let token = encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    let jar = auth_cookie(&token, state.config.jwt_ttl_hours);
    let body = json!({
        "status": "success",
        "data": { "token": token, "user": principal.scrubbed() },
    });
    Ok((jar, axum::Json(body)))
}

pub async fn login(
    state: &SharedState,
    class: PrincipalClass,
    req: LoginRequest,
) -> Result<(CookieJar, axum::Json<Value>), AppError> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "Please provide email and password".to_string(),
        ));
    }

    let principal = principals::find_by_email(&state.pool, class, &req.email)
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("{} not found", class.title())))?;

    let valid = password::verify(&req.password, &principal.password_hash)
        .map_err(AppError::Internal)?;
    if !valid {
        return Err(AppError::BadRequest(
            "Incorrect email or password".to_string(),
        ));
    }

    issue_token(state, principal)
}

pub fn logout() -> (CookieJar, axum::Json<Value>) {
    (clear_auth_cookie(), axum::Json(json!({ "status": "success" })))
}

pub async fn forgot_password(
    state: &SharedState,
    class: PrincipalClass,
    req: ForgotPasswordRequest,
) -> Result<axum::Json<Value>, AppError> {
    let principal = principals::find_by_email(&state.pool, class, &req.email)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("No {} with that email address", class.label()))
        })?;

    let code = generate_reset_code();
    let expires_at = Utc::now() + Duration::minutes(RESET_CODE_TTL_MINUTES);
    principals::issue_reset_code(&state.pool, class, principal.id, &code, expires_at).await?;

    let dispatched = match &state.mailer {
        Some(mailer) => {
            mailer
                .send_reset_code(&principal.email, &principal.name, &code)
                .await
        }
        None => Err("SMTP is not configured".to_string()),
    };

    // An undelivered code must not stay valid.
    if let Err(e) = dispatched {
        tracing::error!("Failed to send password reset email: {e}");
        principals::clear_reset_code(&state.pool, class, principal.id).await?;
        return Err(AppError::Delivery("Error sending email".to_string()));
    }

    Ok(axum::Json(json!({
        "status": "success",
        "message": "Token sent to email!",
    })))
}

pub async fn reset_password(
    state: &SharedState,
    class: PrincipalClass,
    code: &str,
    req: ResetPasswordRequest,
) -> Result<(CookieJar, axum::Json<Value>), AppError> {
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if req.password != req.password_confirm {
        return Err(AppError::BadRequest("Passwords do not match".to_string()));
    }

    let new_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    let principal = principals::consume_reset_code(&state.pool, class, code, &new_hash)
        .await?
        .ok_or_else(|| AppError::BadRequest("Token is invalid or has expired".to_string()))?;

    tracing::info!("{} {} reset their password", class.title(), principal.id);

    issue_token(state, principal)
}
