use std::collections::HashMap;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::auth::guard::{CurrentAdmin, CurrentEmployee};
use crate::bulk;
use crate::db;
use crate::error::AppError;
use crate::models::EmployeeExportRow;
use crate::records::EMPLOYEES;
use crate::state::SharedState;

pub async fn list(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, AppError> {
    let docs = EMPLOYEES.list(&state.pool, &params).await?;
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
    let doc = EMPLOYEES.get_one(&state.pool, id).await?;
    Ok(Json(json!({ "data": doc })))
}

pub async fn create(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<SharedState>,
    Json(attrs): Json<Map<String, Value>>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let doc = EMPLOYEES
        .create_one(&state.pool, attrs, Some(&admin.name))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Employee created successfully",
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
    let doc = EMPLOYEES
        .update_one(&state.pool, id, attrs, Some(&admin.name))
        .await?;
    Ok(Json(json!({
        "message": "Employee updated successfully",
        "data": doc,
    })))
}

pub async fn delete(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    EMPLOYEES
        .delete_one(&state.pool, id, Some(&admin.name))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Own profile, department expanded. This is the only employee-guarded
/// route in this module.
pub async fn me(
    CurrentEmployee(employee): CurrentEmployee,
    State(state): State<SharedState>,
) -> Result<Json<Value>, AppError> {
    let doc = EMPLOYEES.get_one(&state.pool, employee.id).await?;
    Ok(Json(json!({
        "status": "success",
        "data": { "employee": doc },
    })))
}

#[derive(Deserialize)]
pub struct ExportParams {
    department: Option<Uuid>,
}

async fn export_rows(
    state: &SharedState,
    params: &ExportParams,
) -> Result<Vec<EmployeeExportRow>, AppError> {
    let rows = db::employees::list_for_export(&state.pool, params.department).await?;
    if rows.is_empty() {
        return Err(AppError::NotFound("No employees found".to_string()));
    }
    Ok(rows)
}

fn export_filename(params: &ExportParams, extension: &str) -> String {
    let scope = params
        .department
        .map(|d| d.to_string())
        .unwrap_or_else(|| "all".to_string());
    format!("employees_{scope}_{}.{extension}", Utc::now().timestamp())
}

fn attachment(content_type: &'static str, filename: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

pub async fn export_csv(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<SharedState>,
    Query(params): Query<ExportParams>,
) -> Result<Response, AppError> {
    let rows = export_rows(&state, &params).await?;
    let csv = bulk::csv::render(&rows);
    Ok(attachment(
        "text/csv",
        &export_filename(&params, "csv"),
        csv.into_bytes(),
    ))
}

pub async fn export_excel(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<SharedState>,
    Query(params): Query<ExportParams>,
) -> Result<Response, AppError> {
    let rows = export_rows(&state, &params).await?;
    let workbook = bulk::excel::render(&rows).map_err(AppError::Internal)?;
    Ok(attachment(
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        &export_filename(&params, "xlsx"),
        workbook,
    ))
}

pub async fn export_pdf(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<SharedState>,
    Query(params): Query<ExportParams>,
) -> Result<Response, AppError> {
    let rows = export_rows(&state, &params).await?;
    let pdf = bulk::pdf::render(&rows).map_err(AppError::Internal)?;
    Ok(attachment(
        "application/pdf",
        &export_filename(&params, "pdf"),
        pdf,
    ))
}

pub async fn import(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let file = bulk::extract_upload(&headers, body)
        .await
        .map_err(AppError::BadRequest)?;
    let rows = bulk::excel::parse_employee_sheet(&file).map_err(AppError::BadRequest)?;

    let docs = EMPLOYEES
        .create_many(&state.pool, rows, Some(&admin.name))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "Employees imported successfully",
            "count": docs.len(),
            "data": { "employees": docs },
        })),
    ))
}
