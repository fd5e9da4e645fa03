//! Upstream JSON transport
//!
//! All calls to the Opendatasoft portal (catalog and both query dialects) go
//! through [`JsonFetcher`], so the orchestrator can be exercised against a fake.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder, Response};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::config::{OdsConfig, TlsConfig};
use crate::error::{AppError, Result};

/// Failure of a single upstream GET
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("invalid JSON response: {0}")]
    Parse(String),
}

impl FetchError {
    /// HTTP status, when the upstream answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        let message = error_chain(&err);
        if err.is_timeout() {
            FetchError::Timeout(message)
        } else if err.is_decode() {
            FetchError::Parse(message)
        } else {
            FetchError::Transport(message)
        }
    }
}

#[async_trait]
pub trait JsonFetcher: Send + Sync {
    /// GET an absolute URL and parse the body as JSON
    async fn get_json(&self, url: &str) -> std::result::Result<Value, FetchError>;
}

/// reqwest-backed fetcher with optional custom CA and one-shot insecure retry
pub struct ReqwestFetcher {
    client: Client,
    insecure_fallback: Option<Client>,
}

impl ReqwestFetcher {
    pub fn from_config(ods: &OdsConfig, tls: &TlsConfig) -> Result<Self> {
        let mut builder = Self::client_builder(ods);

        if tls.allow_insecure {
            warn!("TLS certificate verification disabled for upstream requests");
            builder = builder.danger_accept_invalid_certs(true);
        } else if let Some(path) = &tls.ca_file {
            let pem = std::fs::read(path).map_err(|e| {
                AppError::Config(format!("cannot read CA bundle {}: {}", path.display(), e))
            })?;
            builder = builder.add_root_certificate(reqwest::Certificate::from_pem(&pem)?);
            debug!("Loaded custom CA bundle from {}", path.display());
        }

        let insecure_fallback = if !tls.allow_insecure && tls.auto_fallback_insecure {
            Some(
                Self::client_builder(ods)
                    .danger_accept_invalid_certs(true)
                    .build()?,
            )
        } else {
            None
        };

        Ok(Self {
            client: builder.build()?,
            insecure_fallback,
        })
    }

    fn client_builder(ods: &OdsConfig) -> ClientBuilder {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        Client::builder()
            .user_agent(ods.user_agent.clone())
            .timeout(ods.request_timeout())
            .default_headers(headers)
    }
}

#[async_trait]
impl JsonFetcher for ReqwestFetcher {
    async fn get_json(&self, url: &str) -> std::result::Result<Value, FetchError> {
        debug!("GET {}", url);

        match self.client.get(url).send().await {
            Ok(response) => read_json(response, url).await,
            Err(err) if is_certificate_error(&err) => match &self.insecure_fallback {
                Some(insecure) => {
                    warn!("Certificate verification failed for {}, retrying once unverified", url);
                    let response = insecure
                        .get(url)
                        .send()
                        .await
                        .map_err(FetchError::from_reqwest)?;
                    read_json(response, url).await
                }
                None => Err(FetchError::from_reqwest(err)),
            },
            Err(err) => Err(FetchError::from_reqwest(err)),
        }
    }
}

async fn read_json(response: Response, url: &str) -> std::result::Result<Value, FetchError> {
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let body = response.bytes().await.map_err(FetchError::from_reqwest)?;
    serde_json::from_slice(&body).map_err(|e| FetchError::Parse(e.to_string()))
}

fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn is_certificate_error(err: &reqwest::Error) -> bool {
    err.is_connect() && error_chain(err).to_lowercase().contains("certificate")
}
