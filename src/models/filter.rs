//! 搜索过滤条件
//!
//! 一次请求的语义查询输入，与具体查询方言无关。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 单页最大条数
pub const MAX_PAGE_SIZE: u32 = 100;
/// 默认单页条数
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// 上游查询方言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// Explore v2.1：支持 where 表达式、排序
    Explore,
    /// Records v1：仅支持 refine 参数
    RecordsV1,
}

impl Dialect {
    /// 回退时使用的另一种方言
    pub fn other(self) -> Self {
        match self {
            Dialect::Explore => Dialect::RecordsV1,
            Dialect::RecordsV1 => Dialect::Explore,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Explore => write!(f, "Explore v2.1"),
            Dialect::RecordsV1 => write!(f, "Records v1"),
        }
    }
}

/// 排序方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// 发布日期倒序
    #[default]
    Date,
    /// 截止日期倒序
    Deadline,
    /// 相关度（仅在有全文关键词时生效）
    Relevance,
}

impl SortMode {
    /// 解析排序参数，未知值按日期排序
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "deadline" => SortMode::Deadline,
            "relevance" => SortMode::Relevance,
            _ => SortMode::Date,
        }
    }
}

/// 搜索过滤条件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    /// 全文关键词（可为空）
    pub keywords: String,
    /// CPV 前缀（可为空）
    pub cpv_prefix: String,
    /// 培训模式：限定 CPV 白名单与服务类别
    pub training: bool,
    /// 省份代码
    pub dept_codes: Vec<String>,
    /// 采购方名称片段
    pub buyer: Option<String>,
    /// 发布日期下限（含）
    pub date_from: Option<NaiveDate>,
    /// 发布日期上限（含）
    pub date_to: Option<NaiveDate>,
    /// 公告性质
    pub natures: Vec<String>,
    /// 排序方式
    pub sort: SortMode,
    /// 页码（从 1 开始）
    pub page: u32,
    /// 每页数量（1..=100）
    pub page_size: u32,
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self {
            keywords: String::new(),
            cpv_prefix: String::new(),
            training: false,
            dept_codes: Vec::new(),
            buyer: None,
            date_from: None,
            date_to: None,
            natures: Vec::new(),
            sort: SortMode::Date,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchFilter {
    /// 设置分页，页码至少为 1，每页数量限制在 1..=100
    pub fn with_page(mut self, page: u32, page_size: u32) -> Self {
        self.page = page.max(1);
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// 计算偏移量
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    /// 去除首尾空白后的关键词，空串返回 None
    pub fn trimmed_keywords(&self) -> Option<&str> {
        Some(self.keywords.trim()).filter(|k| !k.is_empty())
    }

    /// 去除首尾空白后的采购方，空串返回 None
    pub fn trimmed_buyer(&self) -> Option<&str> {
        self.buyer.as_deref().map(str::trim).filter(|b| !b.is_empty())
    }

    /// 总页数（总数未知时为 1）
    pub fn total_pages(&self, total: Option<u64>) -> u64 {
        match total {
            Some(total) if self.page_size > 0 => {
                total.div_ceil(u64::from(self.page_size)).max(1)
            }
            _ => 1,
        }
    }
}
