//! Export Routes
//!
//! 所选公告的 CSV / Excel / ICS 导出。

use crate::api::handlers::export_handler::*;
use axum::{Router, routing::post};

use crate::api::app_state::AppState;

/// 创建导出路由器
pub fn create_export_router() -> Router<AppState> {
    Router::new()
        .route("/export/csv", post(export_csv))
        .route("/export/excel", post(export_excel))
        .route("/export/ics", post(export_ics))
}
