//! 数据集端点
//!
//! 汇总门户地址、数据集标识与 API 密钥，生成各上游接口的绝对地址。

use serde::Serialize;

use crate::config::config::OdsConfig;

/// 官方公告详情页所在主机后缀
const CANONICAL_NOTICE_HOST_SUFFIX: &str = "boamp.fr";

/// 一个 Opendatasoft 门户上的目标数据集
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetEndpoint {
    base_url: String,
    dataset_id: String,
    #[serde(skip)]
    api_key: Option<String>,
}

impl DatasetEndpoint {
    pub fn new(base_url: &str, dataset_id: &str, api_key: Option<&str>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            dataset_id: dataset_id.to_string(),
            api_key: api_key
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
        }
    }

    pub fn from_config(config: &OdsConfig) -> Self {
        Self::new(
            &config.base_url,
            &config.dataset_id,
            config.api_key.as_deref(),
        )
    }

    /// 去掉末尾斜杠的门户地址
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// 门户主机名（解析失败时为空）
    pub fn host(&self) -> String {
        reqwest::Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default()
    }

    /// 门户是否为官方公告站点（可构造 /avis/detail/{reference}）
    pub fn is_canonical_notice_host(&self) -> bool {
        self.host().ends_with(CANONICAL_NOTICE_HOST_SUFFIX)
    }

    /// 数据集目录（字段结构）接口
    pub fn catalog_url(&self) -> String {
        let url = format!(
            "{}/api/v2/catalog/datasets/{}",
            self.base_url, self.dataset_id
        );
        match &self.api_key {
            Some(key) => format!("{}?apikey={}", url, urlencoding::encode(key)),
            None => url,
        }
    }

    /// Explore v2.1 记录接口（不含查询参数）
    pub fn explore_records_url(&self) -> String {
        format!(
            "{}/api/explore/v2.1/catalog/datasets/{}/records",
            self.base_url, self.dataset_id
        )
    }

    /// Records v1 搜索接口（不含查询参数）
    pub fn records_v1_url(&self) -> String {
        format!("{}/api/records/1.0/search/", self.base_url)
    }

    /// 数据集内单条记录的浏览页
    pub fn record_page_url(&self, record_id: &str) -> String {
        format!(
            "{}/explore/dataset/{}/record/?id={}",
            self.base_url,
            self.dataset_id,
            urlencoding::encode(record_id)
        )
    }

    /// 官方公告详情页
    pub fn notice_detail_url(&self, reference: &str) -> String {
        format!("{}/avis/detail/{}", self.base_url, reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let endpoint = DatasetEndpoint::new("https://example.org/", "boamp", None);
        assert_eq!(endpoint.base_url(), "https://example.org");
        assert_eq!(
            endpoint.records_v1_url(),
            "https://example.org/api/records/1.0/search/"
        );
    }

    #[test]
    fn test_catalog_url_with_api_key() {
        let endpoint = DatasetEndpoint::new("https://example.org", "boamp", Some("k&y"));
        assert_eq!(
            endpoint.catalog_url(),
            "https://example.org/api/v2/catalog/datasets/boamp?apikey=k%26y"
        );
    }

    #[test]
    fn test_blank_api_key_is_ignored() {
        let endpoint = DatasetEndpoint::new("https://example.org", "boamp", Some("  "));
        assert!(endpoint.api_key().is_none());
    }

    #[test]
    fn test_canonical_notice_host() {
        assert!(DatasetEndpoint::new("https://www.boamp.fr", "boamp", None).is_canonical_notice_host());
        assert!(
            !DatasetEndpoint::new("https://boamp-datadila.opendatasoft.com", "boamp", None)
                .is_canonical_notice_host()
        );
    }

    #[test]
    fn test_record_page_url_encodes_id() {
        let endpoint = DatasetEndpoint::new("https://example.org", "boamp", None);
        assert_eq!(
            endpoint.record_page_url("a b/c"),
            "https://example.org/explore/dataset/boamp/record/?id=a%20b%2Fc"
        );
    }
}
