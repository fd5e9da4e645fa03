//! Search DTOs
//!
//! 搜索接口的查询参数与响应体。部分参数可重复出现（`deptCodes`、`nature`、
//! `bucket`），因此参数以键值对列表形式解析。

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::config::loader::parse_flag;
use crate::error::{AppError, Result};
use crate::models::catalog::compose_keywords;
use crate::models::fields::ResolvedFields;
use crate::models::filter::{DEFAULT_PAGE_SIZE, Dialect, SearchFilter, SortMode};
use crate::models::record::NormalizedRecord;

/// 未给出下限时的默认回溯天数
const DEFAULT_LOOKBACK_DAYS: i64 = 90;
/// 未给出上限时的默认前瞻天数
const DEFAULT_LOOKAHEAD_DAYS: i64 = 365;

/// `GET /search` 查询参数
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchParams {
    pub q: String,
    pub cpv_prefix: String,
    pub dept_codes: Vec<String>,
    pub buyer: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub use_date: bool,
    /// 缺省时为开启
    pub use_training: Option<bool>,
    pub training_terms: bool,
    pub natures: Vec<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub buckets: Vec<String>,
    pub refresh_schema: bool,
}

impl SearchParams {
    /// 从查询串键值对解析；未知参数忽略
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = SearchParams::default();

        for (key, value) in pairs {
            match key.as_str() {
                "q" => params.q = value,
                "cpvPrefix" => params.cpv_prefix = value,
                "deptCodes" => params.dept_codes.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|c| !c.is_empty())
                        .map(str::to_string),
                ),
                "buyer" => params.buyer = non_blank(value),
                "dateFrom" => params.date_from = non_blank(value),
                "dateTo" => params.date_to = non_blank(value),
                "useDate" => params.use_date = parse_flag(&value),
                "useTraining" => params.use_training = Some(parse_flag(&value)),
                "trainingTerms" => params.training_terms = parse_flag(&value),
                "nature" => {
                    if let Some(nature) = non_blank(value) {
                        params.natures.push(nature);
                    }
                }
                "sort" => params.sort = non_blank(value),
                "page" => params.page = Some(value),
                "pageSize" => params.page_size = Some(value),
                "bucket" => {
                    if let Some(bucket) = non_blank(value) {
                        params.buckets.push(bucket);
                    }
                }
                "refreshSchema" => params.refresh_schema = parse_flag(&value),
                _ => {}
            }
        }

        params
    }

    /// 构造过滤条件
    ///
    /// 启用日期过滤（或显式给出任一边界）时补齐缺失边界：
    /// 下限为 `today - 90 天`，上限为 `today + 365 天`；否则忽略日期。
    pub fn into_filter(self, today: NaiveDate) -> Result<SearchFilter> {
        let training = self.use_training.unwrap_or(true);

        let (date_from, date_to) = if self.use_date || self.date_from.is_some() || self.date_to.is_some() {
            let from = match self.date_from.as_deref() {
                Some(raw) => parse_date("dateFrom", raw)?,
                None => today - Duration::days(DEFAULT_LOOKBACK_DAYS),
            };
            let to = match self.date_to.as_deref() {
                Some(raw) => parse_date("dateTo", raw)?,
                None => today + Duration::days(DEFAULT_LOOKAHEAD_DAYS),
            };
            (Some(from), Some(to))
        } else {
            (None, None)
        };

        let page = self
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .unwrap_or(1);
        let page_size = self
            .page_size
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let filter = SearchFilter {
            keywords: compose_keywords(self.q.trim(), &self.buckets, self.training_terms),
            cpv_prefix: self.cpv_prefix.trim().to_string(),
            training,
            dept_codes: self.dept_codes,
            buyer: self.buyer,
            date_from,
            date_to,
            natures: self.natures,
            sort: self.sort.as_deref().map(SortMode::parse).unwrap_or_default(),
            ..SearchFilter::default()
        };

        Ok(filter.with_page(page, page_size))
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn parse_date(name: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::Validation(format!("{} must be a YYYY-MM-DD date, got '{}'", name, raw))
    })
}

/// 搜索成功响应
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub items: Vec<NormalizedRecord>,
    pub total: Option<u64>,
    pub total_pages: u64,
    pub page: u32,
    pub page_size: u32,
    pub debug_url: String,
    pub dialect: Dialect,
    pub fields: ResolvedFields,
}

/// 搜索失败响应（HTTP 200，便于前端展示）
#[derive(Debug, Serialize)]
pub struct SearchErrorResponse {
    pub items: Vec<NormalizedRecord>,
    pub total: Option<u64>,
    pub error: String,
}

impl SearchErrorResponse {
    pub fn new(error: &AppError) -> Self {
        Self {
            items: Vec::new(),
            total: None,
            error: error.to_string(),
        }
    }
}
