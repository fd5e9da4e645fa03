use crate::config::config::AppConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// 旧部署使用的扁平环境变量及其对应的配置键
const LEGACY_STRING_VARS: &[(&str, &str)] = &[
    ("ODS_BASE", "ods.base_url"),
    ("DATASET_ID", "ods.dataset_id"),
    ("ODS_APIKEY", "ods.api_key"),
    ("SSL_CERT_FILE", "tls.ca_file"),
];

const LEGACY_NUMBER_VARS: &[(&str, &str)] = &[
    ("REQUEST_TIMEOUT_SECONDS", "ods.request_timeout_secs"),
    ("RESULTS_CACHE_TTL_SECONDS", "ods.results_cache_ttl_secs"),
    ("PORT", "server.port"),
];

const LEGACY_FLAG_VARS: &[(&str, &str)] = &[
    ("PREFER_EXPLORE", "ods.prefer_explore"),
    ("AUTO_FALLBACK_INSECURE_SSL", "tls.auto_fallback_insecure"),
    ("ALLOW_INSECURE_SSL", "tls.allow_insecure"),
];

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从默认路径加载配置
    ///
    /// 优先级（后者覆盖前者）：
    /// 1. 内置默认值（`APP_ENV=production` 时使用生产预设）
    /// 2. ./config.toml
    /// 3. 旧版扁平环境变量（ODS_BASE、DATASET_ID ...）
    /// 4. BOAMP_ 前缀环境变量，`__` 分隔层级
    pub fn load() -> Result<AppConfig, figment::Error> {
        Self::load_from(default_config_path())
    }

    /// 从指定路径加载配置
    pub fn load_from(path: PathBuf) -> Result<AppConfig, figment::Error> {
        Self::figment(&path).extract()
    }

    fn figment(path: &Path) -> Figment {
        let defaults = match std::env::var("APP_ENV").as_deref() {
            Ok("production") => AppConfig::production(),
            _ => AppConfig::development(),
        };
        let mut figment = Figment::from(Serialized::defaults(defaults)).merge(Toml::file(path));

        for (var, key) in LEGACY_STRING_VARS {
            if let Some(value) = non_empty_var(var) {
                figment = figment.merge(Serialized::default(key, value));
            }
        }
        for (var, key) in LEGACY_NUMBER_VARS {
            if let Some(value) = non_empty_var(var).and_then(|v| v.trim().parse::<u64>().ok()) {
                figment = figment.merge(Serialized::default(key, value));
            }
        }
        for (var, key) in LEGACY_FLAG_VARS {
            if let Some(value) = non_empty_var(var) {
                figment = figment.merge(Serialized::default(key, parse_flag(&value)));
            }
        }

        figment.merge(Env::prefixed("BOAMP_").split("__"))
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if config.server.port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }

        if config.ods.base_url.trim().is_empty() {
            return Err(ConfigValidationError::MissingBaseUrl);
        }

        if reqwest::Url::parse(&config.ods.base_url).is_err() {
            return Err(ConfigValidationError::InvalidBaseUrl(
                config.ods.base_url.clone(),
            ));
        }

        if config.ods.dataset_id.trim().is_empty() {
            return Err(ConfigValidationError::MissingDatasetId);
        }

        if config.ods.request_timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }

        Ok(())
    }
}

/// 解析 "1/true/yes/on" 形式的开关值
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// 配置验证错误
#[derive(thiserror::Error, Debug)]
pub enum ConfigValidationError {
    #[error("服务端口无效，必须大于 0")]
    InvalidPort,

    #[error("门户基础地址未配置")]
    MissingBaseUrl,

    #[error("门户基础地址无效: {0}")]
    InvalidBaseUrl(String),

    #[error("数据集标识未配置")]
    MissingDatasetId,

    #[error("请求超时无效，必须大于 0")]
    InvalidTimeout,
}

/// 获取默认配置文件路径
pub fn default_config_path() -> PathBuf {
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1", true)]
    #[case("true", true)]
    #[case("YES", true)]
    #[case(" on ", true)]
    #[case("0", false)]
    #[case("off", false)]
    #[case("", false)]
    fn test_parse_flag(#[case] raw: &str, #[case] expected: bool) {
        assert_eq!(parse_flag(raw), expected);
    }

    #[test]
    fn test_development_config_is_valid() {
        let config = AppConfig::development();
        assert!(ConfigLoader::validate(&config).is_ok());
        assert_eq!(config.ods.schema_ttl_secs, 600);
        assert_eq!(config.ods.results_cache_ttl_secs, 60);
        assert!(config.ods.prefer_explore);
    }

    #[test]
    fn test_production_preset() {
        let config = AppConfig::production();
        assert!(ConfigLoader::validate(&config).is_ok());
        assert!(config.logging.structured);
        assert!(!config.tls.auto_fallback_insecure);
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let mut config = AppConfig::development();
        config.ods.base_url = "not a url".into();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_dataset_and_zero_timeout() {
        let mut config = AppConfig::development();
        config.ods.dataset_id = " ".into();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::MissingDatasetId)
        ));

        let mut config = AppConfig::development();
        config.ods.request_timeout_secs = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidTimeout)
        ));
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let figment = Figment::from(Serialized::defaults(AppConfig::development())).merge(
            Toml::string(
                r#"
                [ods]
                dataset_id = "boamp_test"
                prefer_explore = false
                "#,
            ),
        );
        let config: AppConfig = figment.extract().unwrap();

        assert_eq!(config.ods.dataset_id, "boamp_test");
        assert!(!config.ods.prefer_explore);
        assert_eq!(
            config.ods.base_url,
            "https://boamp-datadila.opendatasoft.com"
        );
    }
}
