//! Handlers 模块
//!
//! HTTP 请求处理程序。

pub mod catalog_handler;
pub mod export_handler;
pub mod search_handler;

pub use catalog_handler::*;
pub use export_handler::*;
pub use search_handler::*;
