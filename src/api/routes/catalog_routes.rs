//! Catalog Routes
//!
//! 静态对照表（CPV、省份、关键词分组）。

use crate::api::handlers::catalog_handler::*;
use axum::{Router, routing::get};

use crate::api::app_state::AppState;

/// 创建对照表路由器
pub fn create_catalog_router() -> Router<AppState> {
    Router::new()
        .route("/catalog/cpv", get(list_cpv))
        .route("/catalog/departments", get(list_departments))
        .route("/catalog/buckets", get(list_buckets))
}
