use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::db::Database;
use crate::error::StorageError;
use crate::models::*;

type ApiError = (StatusCode, String);

// ============================================================
// Error Handling
// ============================================================

/// Map a storage fault to a response.
///
/// Refused writes are reported to the client as-is. Engine failures are
/// logged in full and answered with a generic message.
fn storage_error(e: StorageError) -> ApiError {
    let status = match &e {
        StorageError::UnknownCategory(_) | StorageError::Constraint(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        StorageError::DuplicateCategory(_) | StorageError::CategoryInUse { .. } => {
            StatusCode::CONFLICT
        }
        StorageError::Sqlite(_) => {
            tracing::error!("Internal error: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            );
        }
    };

    tracing::warn!("Rejected write: {}", e);
    (status, e.to_string())
}

fn not_found(what: &str) -> ApiError {
    (StatusCode::NOT_FOUND, format!("{what} not found"))
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Projects
// ============================================================

pub async fn list_projects(State(db): State<Database>) -> Result<Json<Vec<Project>>, ApiError> {
    db.get_all_projects().map(Json).map_err(storage_error)
}

pub async fn get_project(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<Json<ProjectDetail>, ApiError> {
    db.get_project_detail(id)
        .map_err(storage_error)?
        .map(Json)
        .ok_or_else(|| not_found("Project"))
}

pub async fn create_project(
    State(db): State<Database>,
    Json(input): Json<CreateProjectInput>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    db.create_project(input)
        .map(|p| (StatusCode::CREATED, Json(p)))
        .map_err(storage_error)
}

pub async fn update_project(
    State(db): State<Database>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateProjectInput>,
) -> Result<Json<Project>, ApiError> {
    db.update_project(id, input)
        .map_err(storage_error)?
        .map(Json)
        .ok_or_else(|| not_found("Project"))
}

pub async fn delete_project(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if db.delete_project(id).map_err(storage_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Project"))
    }
}

// ============================================================
// Categories
// ============================================================

pub async fn list_categories(
    State(db): State<Database>,
) -> Result<Json<Vec<Category>>, ApiError> {
    db.get_all_categories().map(Json).map_err(storage_error)
}

pub async fn get_category(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<Json<CategoryWithProjects>, ApiError> {
    db.get_category_with_projects(id)
        .map_err(storage_error)?
        .map(Json)
        .ok_or_else(|| not_found("Category"))
}

pub async fn create_category(
    State(db): State<Database>,
    Json(input): Json<CreateCategoryInput>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    db.create_category(input)
        .map(|c| (StatusCode::CREATED, Json(c)))
        .map_err(storage_error)
}

pub async fn delete_category(
    State(db): State<Database>,
    State(policy): State<CategoryDeletePolicy>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if db.delete_category(id, policy).map_err(storage_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Category"))
    }
}
