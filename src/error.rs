//! 错误处理模块
//!
//! 定义应用程序的错误类型和错误处理逻辑。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::filter::Dialect;
use crate::services::http_client::FetchError;

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 数据集结构（字段目录）获取失败
    #[error("无法获取数据集结构: {0}")]
    SchemaFetch(#[source] FetchError),

    /// 单个查询方言执行失败，且未触发回退
    #[error("{dialect} 查询失败: {source}")]
    DialectExecution {
        dialect: Dialect,
        #[source]
        source: FetchError,
    },

    /// 两种查询方言均失败，保留最后一次错误
    #[error("{source}")]
    ExhaustedFallback {
        attempted: [Dialect; 2],
        #[source]
        source: FetchError,
    },

    /// 参数验证错误
    #[error("参数验证失败: {0}")]
    Validation(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 导出内容序列化错误
    #[error("序列化错误: {0}")]
    Serialization(String),
}

impl AppError {
    /// 返回导致失败的上游错误（如有）
    pub fn upstream(&self) -> Option<&FetchError> {
        match self {
            AppError::SchemaFetch(e) => Some(e),
            AppError::DialectExecution { source, .. } => Some(source),
            AppError::ExhaustedFallback { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<csv::Error> for AppError {
    fn from(e: csv::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Config(format!("HTTP client: {}", e))
    }
}

/// Axum response implementation for AppError
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code): (u16, String) = (&self).into();
        let mut response = ErrorResponse::new(&code, &self.to_string());
        if let Some(FetchError::Status { url, .. }) = self.upstream() {
            response = response.with_details(url);
        }
        let body = Json(response);
        (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        )
            .into_response()
    }
}

/// 错误响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,
    /// 错误消息
    pub message: String,
    /// 详细信息
    pub details: Option<String>,
    /// 请求 ID
    pub request_id: Option<String>,
}

impl ErrorResponse {
    /// 创建新错误响应
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
            request_id: None,
        }
    }

    /// 添加详细信息
    pub fn with_details(mut self, details: &str) -> Self {
        self.details = Some(details.to_string());
        self
    }
}

/// HTTP 状态码映射
impl From<&AppError> for (u16, String) {
    fn from(err: &AppError) -> (u16, String) {
        match err {
            AppError::Validation(_) => (400, "BAD_REQUEST".to_string()),
            AppError::SchemaFetch(_) => (502, "SCHEMA_UNAVAILABLE".to_string()),
            AppError::DialectExecution { .. } => (502, "UPSTREAM_ERROR".to_string()),
            AppError::ExhaustedFallback { .. } => (502, "UPSTREAM_EXHAUSTED".to_string()),
            AppError::Config(_) => (500, "CONFIG_ERROR".to_string()),
            AppError::Serialization(_) => (500, "SERIALIZATION_ERROR".to_string()),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;
