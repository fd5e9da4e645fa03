//! Dual-dialect query builder
//!
//! Pure translation of a [`SearchFilter`] plus resolved column names into an
//! absolute upstream URL. Explore v2.1 receives a boolean `where` expression;
//! Records v1 only understands repeated `refine.{field}` parameters, so CPV
//! prefix, nature, date range and sort are dropped there.

use crate::models::catalog::{TRAINING_CPV_WHITELIST, TRAINING_SERVICE_CATEGORY};
use crate::models::endpoint::DatasetEndpoint;
use crate::models::fields::ResolvedFields;
use crate::models::filter::{Dialect, SearchFilter, SortMode};

/// Build the URL for the given dialect
pub fn build_url(
    dialect: Dialect,
    endpoint: &DatasetEndpoint,
    filter: &SearchFilter,
    fields: &ResolvedFields,
) -> String {
    match dialect {
        Dialect::Explore => build_explore_url(endpoint, filter, fields),
        Dialect::RecordsV1 => build_records_v1_url(endpoint, filter, fields),
    }
}

pub fn build_explore_url(
    endpoint: &DatasetEndpoint,
    filter: &SearchFilter,
    fields: &ResolvedFields,
) -> String {
    let mut params: Vec<(String, String)> = Vec::new();
    let keywords = filter.trimmed_keywords();

    if let Some(q) = keywords {
        params.push(("q".into(), q.to_string()));
    }

    let clauses = where_clauses(filter, fields);
    if !clauses.is_empty() {
        params.push(("where".into(), clauses.join(" AND ")));
    }

    let order_by = match filter.sort {
        SortMode::Deadline if !fields.deadline.is_empty() => format!("-{}", fields.deadline),
        SortMode::Relevance if keywords.is_some() => "relevance".to_string(),
        _ => format!("-{}", fields.date),
    };
    params.push(("order_by".into(), order_by));
    params.push(("limit".into(), filter.page_size.to_string()));
    params.push(("offset".into(), filter.offset().to_string()));

    if let Some(key) = endpoint.api_key() {
        params.push(("apikey".into(), key.to_string()));
    }

    format!("{}?{}", endpoint.explore_records_url(), encode_query(&params))
}

pub fn build_records_v1_url(
    endpoint: &DatasetEndpoint,
    filter: &SearchFilter,
    fields: &ResolvedFields,
) -> String {
    let mut params: Vec<(String, String)> = vec![
        ("dataset".into(), endpoint.dataset_id().to_string()),
        ("rows".into(), filter.page_size.to_string()),
        ("start".into(), filter.offset().to_string()),
    ];

    if let Some(q) = filter.trimmed_keywords() {
        params.push(("q".into(), q.to_string()));
    }

    // Repeated refine parameters; upstream may combine them as AND rather
    // than the OR group used by Explore.
    if filter.training {
        let cpv = format!("refine.{}", fields.cpv);
        for code in TRAINING_CPV_WHITELIST {
            params.push((cpv.clone(), code.to_string()));
        }
        params.push((
            format!("refine.{}", fields.service_category),
            TRAINING_SERVICE_CATEGORY.to_string(),
        ));
    }

    let dept = format!("refine.{}", fields.dept);
    for code in dept_codes(filter) {
        params.push((dept.clone(), code.to_string()));
    }

    if let Some(buyer) = filter.trimmed_buyer() {
        params.push((format!("refine.{}", fields.buyer), buyer.to_string()));
    }

    if let Some(key) = endpoint.api_key() {
        params.push(("apikey".into(), key.to_string()));
    }

    format!("{}?{}", endpoint.records_v1_url(), encode_query(&params))
}

/// Conjunctive `where` clauses in fixed order
fn where_clauses(filter: &SearchFilter, fields: &ResolvedFields) -> Vec<String> {
    let mut clauses = Vec::new();

    if filter.training {
        let parts: Vec<String> = TRAINING_CPV_WHITELIST
            .iter()
            .map(|code| like_contains(&fields.cpv, code))
            .collect();
        clauses.push(format!("({})", parts.join(" OR ")));
    }

    let prefix = filter.cpv_prefix.trim();
    if !prefix.is_empty() {
        let prefix = escape_literal(prefix);
        clauses.push(format!(
            "(string({f}) LIKE '{p}%' OR string({f}) LIKE '%{p}%')",
            f = fields.cpv,
            p = prefix
        ));
    }

    let depts: Vec<String> = dept_codes(filter)
        .map(|code| format!("'{}'", escape_literal(code)))
        .collect();
    if !depts.is_empty() {
        clauses.push(format!("({} IN ({}))", fields.dept, depts.join(",")));
    }

    if let Some(buyer) = filter.trimmed_buyer() {
        clauses.push(like_contains(&fields.buyer, buyer));
    }

    if filter.training {
        clauses.push(format!(
            "{} = '{}'",
            fields.service_category,
            escape_literal(TRAINING_SERVICE_CATEGORY)
        ));
    }

    let natures: Vec<String> = filter
        .natures
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .map(|n| format!("'{}'", escape_literal(n)))
        .collect();
    if !natures.is_empty() {
        clauses.push(format!("string({}) IN ({})", fields.nature, natures.join(",")));
    }

    if let Some(from) = filter.date_from {
        clauses.push(format!("{} >= '{}'", fields.date, from.format("%Y-%m-%d")));
    }
    if let Some(to) = filter.date_to {
        clauses.push(format!("{} <= '{}'", fields.date, to.format("%Y-%m-%d")));
    }

    clauses
}

fn dept_codes(filter: &SearchFilter) -> impl Iterator<Item = &str> {
    filter
        .dept_codes
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
}

fn like_contains(field: &str, value: &str) -> String {
    format!("string({}) LIKE '%{}%'", field, escape_literal(value))
}

/// Double single quotes so the value stays inside a `'...'` literal
pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

fn encode_query(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
