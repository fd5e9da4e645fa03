//! Export DTOs

use serde::Deserialize;

use crate::services::export::ExportItem;

/// `POST /export/*` 请求体
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub items: Vec<ExportItem>,
}
