use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use chrono::Local;
use tracing::{debug, warn};

use crate::{
    api::{app_state::AppState, dto::search_dto::*},
    error::AppError,
};

/// `GET /search`
///
/// 参数错误返回 400；上游失败以 200 + `error` 字段返回，保持前端可用。
pub async fn search(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let params = SearchParams::from_pairs(pairs);
    let refresh_schema = params.refresh_schema;
    let filter = params.into_filter(Local::now().date_naive())?;
    debug!("Search request: {:?}", filter);

    if refresh_schema {
        state.search_service.refresh_schema().await;
    }

    match state.search_service.search(&filter).await {
        Ok(outcome) => {
            let endpoint = state.search_service.endpoint();
            let response = SearchResponse {
                items: outcome.normalized(endpoint),
                total: outcome.total,
                total_pages: filter.total_pages(outcome.total),
                page: filter.page,
                page_size: filter.page_size,
                debug_url: outcome.debug_url.clone(),
                dialect: outcome.dialect,
                fields: (*outcome.fields).clone(),
            };
            Ok(Json(response).into_response())
        }
        Err(e) => {
            warn!("Search failed: {}", e);
            state.metrics.record_error();
            Ok(Json(SearchErrorResponse::new(&e)).into_response())
        }
    }
}
