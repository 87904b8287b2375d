use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum_extra::extract::CookieJar;
use serde_json::{Map, Value, json};

use crate::auth::flow::{self, ForgotPasswordRequest, LoginRequest, ResetPasswordRequest};
use crate::db::principals::PrincipalClass;
use crate::error::AppError;
use crate::records::ADMINS;
use crate::state::SharedState;

pub async fn signup(
    State(state): State<SharedState>,
    Json(attrs): Json<Map<String, Value>>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let doc = ADMINS.create_one(&state.pool, attrs, None).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "admin": doc,
            "message": "Admin created successfully",
        })),
    ))
}

pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<Value>), AppError> {
    flow::login(&state, PrincipalClass::Admin, req).await
}

pub async fn logout() -> (CookieJar, Json<Value>) {
    flow::logout()
}

pub async fn forgot_password(
    State(state): State<SharedState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<Value>, AppError> {
    flow::forgot_password(&state, PrincipalClass::Admin, req).await
}

pub async fn reset_password(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<(CookieJar, Json<Value>), AppError> {
    flow::reset_password(&state, PrincipalClass::Admin, &code, req).await
}
