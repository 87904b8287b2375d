use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::auth::guard::CurrentAdmin;
use crate::error::AppError;
use crate::records::ADMINS;
use crate::state::SharedState;

pub async fn list(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, AppError> {
    let docs = ADMINS.list(&state.pool, &params).await?;
    Ok(Json(json!({
        "status": "success",
        "results": docs.len(),
        "data": docs,
    })))
}

pub async fn get_one(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let doc = ADMINS.get_one(&state.pool, id).await?;
    Ok(Json(json!({ "data": doc })))
}

pub async fn create(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<SharedState>,
    Json(attrs): Json<Map<String, Value>>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let doc = ADMINS
        .create_one(&state.pool, attrs, Some(&admin.name))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Admin created successfully",
            "data": doc,
        })),
    ))
}

pub async fn update(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(attrs): Json<Map<String, Value>>,
) -> Result<Json<Value>, AppError> {
    let doc = ADMINS
        .update_one(&state.pool, id, attrs, Some(&admin.name))
        .await?;
    Ok(Json(json!({
        "message": "Admin updated successfully",
        "data": doc,
    })))
}

pub async fn delete(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ADMINS
        .delete_one(&state.pool, id, Some(&admin.name))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<SharedState>,
) -> Result<Json<Value>, AppError> {
    let doc = ADMINS.get_one(&state.pool, admin.id).await?;
    Ok(Json(json!({
        "status": "success",
        "data": { "admin": doc },
    })))
}
