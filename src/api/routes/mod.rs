//! Routes 模块
//!
//! 定义 API 路由。

pub mod catalog_routes;
pub mod export_routes;
pub mod search_routes;
