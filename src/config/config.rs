use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务地址
    pub host: String,
    /// 服务端口
    pub port: u16,
}

/// Opendatasoft 数据源配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OdsConfig {
    /// 门户基础地址，例如 https://boamp-datadila.opendatasoft.com
    pub base_url: String,
    /// 数据集标识
    pub dataset_id: String,
    /// 可选 API 密钥，以 `apikey` 查询参数传递
    pub api_key: Option<String>,
    /// 优先使用 Explore v2.1（否则优先 Records v1）
    pub prefer_explore: bool,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 数据集结构缓存 TTL（秒）
    pub schema_ttl_secs: u64,
    /// 搜索结果缓存 TTL（秒）
    pub results_cache_ttl_secs: u64,
    /// 上游请求使用的 User-Agent
    pub user_agent: String,
}

impl OdsConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn schema_ttl(&self) -> Duration {
        Duration::from_secs(self.schema_ttl_secs)
    }

    pub fn results_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.results_cache_ttl_secs)
    }
}

/// TLS 信任配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TlsConfig {
    /// 额外信任的 CA 证书（PEM）
    pub ca_file: Option<PathBuf>,
    /// 完全关闭证书校验
    pub allow_insecure: bool,
    /// 证书校验失败时以不校验模式重试一次
    pub auto_fallback_insecure: bool,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 结构化日志格式
    pub structured: bool,
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 数据源配置
    pub ods: OdsConfig,
    /// TLS 配置
    pub tls: TlsConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 应用名称
    pub app_name: String,
    /// 环境
    pub environment: String,
}

impl AppConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".into(),
                port: 8000,
            },
            ods: OdsConfig {
                base_url: "https://boamp-datadila.opendatasoft.com".into(),
                dataset_id: "boamp".into(),
                api_key: None,
                prefer_explore: true,
                request_timeout_secs: 30,
                schema_ttl_secs: 600,
                results_cache_ttl_secs: 60,
                user_agent: "Minimal-BOAMP-Client/1.0".into(),
            },
            tls: TlsConfig {
                ca_file: None,
                allow_insecure: false,
                auto_fallback_insecure: true,
            },
            logging: LoggingConfig {
                level: "debug".into(),
                structured: false,
            },
            app_name: "boamp-search".into(),
            environment: "development".into(),
        }
    }

    /// 创建生产环境配置
    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = "production".into();
        config.logging.level = "info".into();
        config.logging.structured = true;
        config.tls.auto_fallback_insecure = false;
        config
    }
}
