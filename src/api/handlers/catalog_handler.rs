use axum::{Json, response::IntoResponse};

use crate::models::catalog::{CPV_CATALOG, IDF_DEPARTEMENTS, KEYWORD_BUCKETS};

/// `GET /catalog/cpv`
pub async fn list_cpv() -> impl IntoResponse {
    Json(CPV_CATALOG)
}

/// `GET /catalog/departments`
pub async fn list_departments() -> impl IntoResponse {
    Json(IDF_DEPARTEMENTS)
}

/// `GET /catalog/buckets`
pub async fn list_buckets() -> impl IntoResponse {
    Json(KEYWORD_BUCKETS)
}
