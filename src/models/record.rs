//! 记录归一化
//!
//! 把两种方言返回的原始记录（Explore 为顶层字段，Records v1 嵌套在 `fields`
//! 之下）映射为稳定的展示结构，并计算详情页链接。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::endpoint::DatasetEndpoint;
use crate::models::fields::ResolvedFields;

/// 通用落地页路径，出现即视为无效链接
const GENERIC_LANDING_PATH: &str = "/pages/entreprise-accueil";

const TITLE_SYNONYMS: &[&str] = &["objet", "titre", "title"];

const URL_SYNONYMS: &[&str] = &[
    "permalink",
    "url_avis",
    "pageurl",
    "lien",
    "link",
    "url",
    "permalien",
];

/// 归一化后的公告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub title: String,
    pub href: String,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub date_iso: Option<String>,
    pub deadline_iso: Option<String>,
    pub buyer: Option<String>,
    pub buyer_address: Option<String>,
    pub dept: Option<String>,
    pub cpv: Option<String>,
    pub description: Option<String>,
    pub budget: Option<String>,
    pub procedure: Option<String>,
    pub market_type: Option<String>,
    pub place: Option<String>,
}

/// 归一化一条原始记录，永不失败
pub fn normalize(raw: &Value, fields: &ResolvedFields, endpoint: &DatasetEndpoint) -> NormalizedRecord {
    let empty = Map::new();
    let attrs = attributes(raw).unwrap_or(&empty);
    let read = |column: &str| attrs.get(column).and_then(value_text);

    let record_id = record_id(raw);

    let title = read(&fields.title)
        .or_else(|| first_of(attrs, TITLE_SYNONYMS))
        .unwrap_or_else(|| match &record_id {
            Some(id) => format!("Avis #{}", id),
            None => "Avis".to_string(),
        });

    let raw_url = read(&fields.url).or_else(|| first_of(attrs, URL_SYNONYMS));
    let reference = read(&fields.reference).or_else(|| record_id.clone());
    let href = normalize_record_url(
        endpoint,
        raw_url.as_deref(),
        reference.as_deref(),
        record_id.as_deref(),
    );

    NormalizedRecord {
        title,
        href,
        reference,
        date_iso: read(&fields.date)
            .or_else(|| read("record_timestamp"))
            .map(iso_date),
        deadline_iso: read(&fields.deadline).map(iso_date),
        buyer: read(&fields.buyer),
        buyer_address: read(&fields.buyer_address),
        dept: read(&fields.dept),
        cpv: read(&fields.cpv),
        description: read(&fields.description),
        budget: read(&fields.budget),
        procedure: read(&fields.procedure),
        market_type: read(&fields.market_type),
        place: read(&fields.place),
    }
}

/// 计算稳定的详情页链接
///
/// 1. 记录自带链接时按门户地址解析（支持相对路径）；
/// 2. 解析结果为门户首页或通用落地页时丢弃；
/// 3. 官方公告站点且有参考号时使用 `{base}/avis/detail/{reference}`；
/// 4. 否则使用数据集记录页；
/// 5. 连记录 ID 都没有时返回门户地址。
pub fn normalize_record_url(
    endpoint: &DatasetEndpoint,
    raw_url: Option<&str>,
    reference: Option<&str>,
    record_id: Option<&str>,
) -> String {
    if let Some(href) = raw_url
        .filter(|u| !u.trim().is_empty())
        .and_then(|u| resolve_against_base(endpoint, u))
    {
        let portal_root = format!("{}/", endpoint.base_url());
        if href != portal_root && !href.contains(GENERIC_LANDING_PATH) {
            return href;
        }
    }

    if let Some(reference) = reference.filter(|r| !r.is_empty()) {
        if endpoint.is_canonical_notice_host() {
            return endpoint.notice_detail_url(reference);
        }
    }

    match record_id.filter(|id| !id.is_empty()) {
        Some(id) => endpoint.record_page_url(id),
        None => endpoint.base_url().to_string(),
    }
}

fn resolve_against_base(endpoint: &DatasetEndpoint, raw_url: &str) -> Option<String> {
    let base = reqwest::Url::parse(&format!("{}/", endpoint.base_url())).ok()?;
    base.join(raw_url.trim()).ok().map(|u| u.to_string())
}

/// Records v1 记录的属性嵌套在 `fields` 下，Explore 记录直接位于顶层
fn attributes(raw: &Value) -> Option<&Map<String, Value>> {
    let object = raw.as_object()?;
    if object.contains_key("fields") {
        object.get("fields").and_then(Value::as_object)
    } else {
        Some(object)
    }
}

fn record_id(raw: &Value) -> Option<String> {
    raw.get("id")
        .and_then(value_text)
        .or_else(|| raw.get("recordid").and_then(value_text))
}

fn first_of(attrs: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| attrs.get(*key).and_then(value_text))
}

/// JSON 值转为展示文本；null、空串、空数组视为缺失
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(value_text).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        Value::Object(_) => Some(value.to_string()),
    }
}

fn iso_date(text: String) -> String {
    text.chars().take(10).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn boamp_endpoint() -> DatasetEndpoint {
        DatasetEndpoint::new("https://www.boamp.fr", "boamp", None)
    }

    fn ods_endpoint() -> DatasetEndpoint {
        DatasetEndpoint::new("https://boamp-datadila.opendatasoft.com", "boamp", None)
    }

    #[test]
    fn test_url_from_reference_on_canonical_host() {
        let href = normalize_record_url(&boamp_endpoint(), None, Some("24-12345"), None);
        assert_eq!(href, "https://www.boamp.fr/avis/detail/24-12345");
    }

    #[test]
    fn test_landing_page_url_is_rejected() {
        let href = normalize_record_url(
            &boamp_endpoint(),
            Some("https://www.boamp.fr/pages/entreprise-accueil"),
            Some("24-12345"),
            Some("rec1"),
        );
        assert_eq!(href, "https://www.boamp.fr/avis/detail/24-12345");
    }

    #[test]
    fn test_portal_root_url_is_rejected() {
        let href = normalize_record_url(&ods_endpoint(), Some("/"), Some("24-1"), Some("rec1"));
        assert_eq!(
            href,
            "https://boamp-datadila.opendatasoft.com/explore/dataset/boamp/record/?id=rec1"
        );
    }

    #[test]
    fn test_relative_url_resolved_against_base() {
        let href = normalize_record_url(&ods_endpoint(), Some("avis/42"), None, None);
        assert_eq!(href, "https://boamp-datadila.opendatasoft.com/avis/42");
    }

    #[test]
    fn test_absolute_url_kept() {
        let href = normalize_record_url(
            &ods_endpoint(),
            Some("https://other.example/notice/1"),
            Some("1"),
            Some("rec"),
        );
        assert_eq!(href, "https://other.example/notice/1");
    }

    #[test]
    fn test_no_identifier_falls_back_to_base() {
        let href = normalize_record_url(&ods_endpoint(), None, None, None);
        assert_eq!(href, "https://boamp-datadila.opendatasoft.com");
    }

    #[test]
    fn test_normalize_records_v1_shape() {
        let fields = ResolvedFields {
            title: "objet".into(),
            date: "dateparution".into(),
            reference: "idweb".into(),
            ..ResolvedFields::default()
        };
        let raw = json!({
            "recordid": "abc",
            "fields": {
                "objet": "Formation UX",
                "dateparution": "2024-05-02T00:00:00+00:00",
                "idweb": "24-999",
                "cpv": ["80500000", "80510000"],
                "montant": 15000
            }
        });

        let record = normalize(&raw, &fields, &boamp_endpoint());
        assert_eq!(record.title, "Formation UX");
        assert_eq!(record.date_iso.as_deref(), Some("2024-05-02"));
        assert_eq!(record.reference.as_deref(), Some("24-999"));
        assert_eq!(record.href, "https://www.boamp.fr/avis/detail/24-999");
        assert_eq!(record.cpv.as_deref(), Some("80500000, 80510000"));
        assert_eq!(record.budget.as_deref(), Some("15000"));
        assert!(record.buyer.is_none());
    }

    #[test]
    fn test_reference_serializes_as_ref() {
        let raw = json!({"id": "24-1", "objet": "Audit"});
        let record = normalize(&raw, &ResolvedFields::default(), &boamp_endpoint());

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["ref"], "24-1");
        assert!(value.get("reference").is_none());
    }

    #[test]
    fn test_normalize_explore_shape_with_synonyms() {
        let fields = ResolvedFields::default();
        let raw = json!({
            "titre": "Marché de formation",
            "url_avis": "https://example.org/detail/7",
            "date_limite_remise_offres": "2024-09-30T12:00:00",
            "acheteur": "Ville de Paris"
        });

        let record = normalize(&raw, &fields, &ods_endpoint());
        assert_eq!(record.title, "Marché de formation");
        assert_eq!(record.href, "https://example.org/detail/7");
        assert_eq!(record.deadline_iso.as_deref(), Some("2024-09-30"));
        assert_eq!(record.buyer.as_deref(), Some("Ville de Paris"));
        assert!(record.reference.is_none());
    }

    #[test]
    fn test_normalize_untitled_record() {
        let raw = json!({"id": "rec-9"});
        let record = normalize(&raw, &ResolvedFields::default(), &ods_endpoint());
        assert_eq!(record.title, "Avis #rec-9");
        // reference column defaults to "id"
        assert_eq!(record.reference.as_deref(), Some("rec-9"));
        assert_eq!(
            record.href,
            "https://boamp-datadila.opendatasoft.com/explore/dataset/boamp/record/?id=rec-9"
        );
    }

    #[test]
    fn test_normalize_non_object_record() {
        let record = normalize(&json!("garbage"), &ResolvedFields::default(), &ods_endpoint());
        assert_eq!(record.title, "Avis");
        assert_eq!(record.href, "https://boamp-datadila.opendatasoft.com");
    }
}
