//! Auth guard: verify a bearer credential, resolve the principal, reject
//! stale credentials, attach the principal to the request. Two extractors
//! instantiate the same state machine for the two principal classes.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;

use crate::auth::jwt;
use crate::db::principals::{self, PrincipalClass};
use crate::error::AppError;
use crate::models::Principal;
use crate::state::SharedState;

fn extract_token(parts: &Parts) -> Option<String> {
    if let Some(auth_header) = parts.headers.get("authorization") {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    let jar = CookieJar::from_headers(&parts.headers);
    jar.get("access_token").map(|c| c.value().to_string())
}

async fn authenticate(
    parts: &Parts,
    state: &SharedState,
    class: PrincipalClass,
) -> Result<Principal, AppError> {
    let token = extract_token(parts)
        .ok_or_else(|| AppError::Unauthorized("You are not logged in".to_string()))?;

    let claims = jwt::decode_token(&token, &state.config.jwt_secret)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

    let principal = principals::find_by_id(&state.pool, class, claims.sub)
        .await?
        .ok_or_else(|| {
            AppError::Unauthorized(
                "The user associated with this token no longer exists".to_string(),
            )
        })?;

    if principal.changed_password_after(claims.iat) {
        return Err(AppError::Unauthorized(
            "Password was recently changed. Please log in again".to_string(),
        ));
    }

    Ok(principal.scrubbed())
}

#[derive(Debug, Clone)]
pub struct CurrentEmployee(pub Principal);

#[derive(Debug, Clone)]
pub struct CurrentAdmin(pub Principal);

impl FromRequestParts<SharedState> for CurrentEmployee {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state, PrincipalClass::Employee)
            .await
            .map(CurrentEmployee)
    }
}

impl FromRequestParts<SharedState> for CurrentAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state, PrincipalClass::Admin)
            .await
            .map(CurrentAdmin)
    }
}
