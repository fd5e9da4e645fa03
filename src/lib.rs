//! BOAMP Search - 公共采购公告检索前端
//!
//! 面向 Opendatasoft 上的 BOAMP 数据集：发现远端列名，把语义过滤条件
//! 翻译为 Explore v2.1 或 Records v1 查询，在两种方言间按需回退，并缓存
//! 字段结构与查询结果。

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod services;
