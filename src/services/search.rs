//! Search orchestration
//!
//! Resolves fields from the schema store, consults the result cache, then runs
//! the preferred dialect and at most one fallback to the other dialect.
//! Attempts are strictly sequential.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::config::OdsConfig;
use crate::error::{AppError, Result};
use crate::models::endpoint::DatasetEndpoint;
use crate::models::fields::ResolvedFields;
use crate::models::filter::{Dialect, SearchFilter};
use crate::models::record::{NormalizedRecord, normalize};
use crate::models::schema::DatasetSchema;
use crate::observability::AppMetrics;
use crate::services::clock::Clock;
use crate::services::http_client::{FetchError, JsonFetcher};
use crate::services::query_builder::build_url;
use crate::services::result_cache::{CacheKey, ResultCache, TtlResultCache};
use crate::services::schema_store::{CatalogSchemaStore, SchemaStore};

/// Result of one search, as cached and handed to the presentation layer
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Raw upstream records, shape depends on `dialect`
    pub records: Arc<Vec<Value>>,
    pub total: Option<u64>,
    /// The upstream URL that produced `records`
    pub debug_url: String,
    pub fields: Arc<ResolvedFields>,
    pub dialect: Dialect,
}

impl SearchOutcome {
    /// Dialect-independent view of the records
    pub fn normalized(&self, endpoint: &DatasetEndpoint) -> Vec<NormalizedRecord> {
        self.records
            .iter()
            .map(|raw| normalize(raw, &self.fields, endpoint))
            .collect()
    }
}

#[async_trait]
pub trait SearchService: Send + Sync {
    async fn search(&self, filter: &SearchFilter) -> Result<SearchOutcome>;

    /// Drop the cached schema and refetch it; failures are only logged
    async fn refresh_schema(&self);

    fn endpoint(&self) -> &DatasetEndpoint;
}

/// Whether a failed attempt may be retried with the other dialect
///
/// 4xx usually means the deployment rejected the `where` grammar. 5xx is an
/// upstream fault that the other dialect would hit as well.
pub fn allows_fallback(error: &FetchError) -> bool {
    match error {
        FetchError::Status { status, .. } => (400..500).contains(status),
        FetchError::Transport(_) | FetchError::Timeout(_) | FetchError::Parse(_) => true,
    }
}

enum AttemptState {
    Executing { dialect: Dialect, is_fallback: bool },
    FallingBack { from: Dialect, error: FetchError },
    Terminal(Result<SearchOutcome>),
}

pub struct SearchOrchestrator {
    endpoint: DatasetEndpoint,
    fetcher: Arc<dyn JsonFetcher>,
    schema_store: Arc<dyn SchemaStore>,
    cache: Arc<dyn ResultCache>,
    preferred: Dialect,
    metrics: Arc<AppMetrics>,
}

impl SearchOrchestrator {
    pub fn new(
        endpoint: DatasetEndpoint,
        fetcher: Arc<dyn JsonFetcher>,
        schema_store: Arc<dyn SchemaStore>,
        cache: Arc<dyn ResultCache>,
        preferred: Dialect,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            endpoint,
            fetcher,
            schema_store,
            cache,
            preferred,
            metrics,
        }
    }

    /// Fields for the current schema, defaults when the catalog is unreachable
    async fn resolve_fields(&self) -> ResolvedFields {
        match self.schema_store.get_schema(false).await {
            Ok(schema) => ResolvedFields::resolve(&schema),
            Err(e) => {
                warn!("Schema unavailable, using default column names: {}", e);
                self.metrics.record_schema_degraded();
                ResolvedFields::resolve(&DatasetSchema::default())
            }
        }
    }

    async fn run_attempts(
        &self,
        filter: &SearchFilter,
        fields: Arc<ResolvedFields>,
    ) -> Result<SearchOutcome> {
        let mut state = AttemptState::Executing {
            dialect: self.preferred,
            is_fallback: false,
        };

        loop {
            state = match state {
                AttemptState::Executing {
                    dialect,
                    is_fallback,
                } => {
                    let url = build_url(dialect, &self.endpoint, filter, &fields);
                    match self.execute(dialect, &url).await {
                        Ok((records, total)) => AttemptState::Terminal(Ok(SearchOutcome {
                            records: Arc::new(records),
                            total,
                            debug_url: url,
                            fields: fields.clone(),
                            dialect,
                        })),
                        Err(error) => {
                            self.metrics.record_upstream_error();
                            if is_fallback {
                                AttemptState::Terminal(Err(AppError::ExhaustedFallback {
                                    attempted: [dialect.other(), dialect],
                                    source: error,
                                }))
                            } else if allows_fallback(&error) {
                                AttemptState::FallingBack {
                                    from: dialect,
                                    error,
                                }
                            } else {
                                AttemptState::Terminal(Err(AppError::DialectExecution {
                                    dialect,
                                    source: error,
                                }))
                            }
                        }
                    }
                }
                AttemptState::FallingBack { from, error } => {
                    warn!("{} failed ({}), falling back to {}", from, error, from.other());
                    self.metrics.record_fallback();
                    AttemptState::Executing {
                        dialect: from.other(),
                        is_fallback: true,
                    }
                }
                AttemptState::Terminal(result) => return result,
            };
        }
    }

    async fn execute(
        &self,
        dialect: Dialect,
        url: &str,
    ) -> std::result::Result<(Vec<Value>, Option<u64>), FetchError> {
        debug!("Querying {}: {}", dialect, url);
        let payload = self.fetcher.get_json(url).await?;
        parse_envelope(dialect, payload)
    }
}

/// Split a dialect envelope into records and total count
fn parse_envelope(
    dialect: Dialect,
    payload: Value,
) -> std::result::Result<(Vec<Value>, Option<u64>), FetchError> {
    let (records_key, total_key) = match dialect {
        Dialect::Explore => ("results", "total_count"),
        Dialect::RecordsV1 => ("records", "nhits"),
    };

    let Value::Object(mut envelope) = payload else {
        return Err(FetchError::Parse(format!(
            "{} response is not a JSON object",
            dialect
        )));
    };

    let total = envelope.get(total_key).and_then(Value::as_u64);
    let records = match envelope.remove(records_key) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };

    Ok((records, total))
}

#[async_trait]
impl SearchService for SearchOrchestrator {
    async fn search(&self, filter: &SearchFilter) -> Result<SearchOutcome> {
        let started = Instant::now();
        let fields = self.resolve_fields().await;

        let key = CacheKey::new(&self.endpoint, filter, &fields);
        if let Some(hit) = self.cache.get(&key) {
            debug!("Result cache hit");
            self.metrics.record_cache_hit();
            self.metrics.record_search(started.elapsed().as_millis() as u64);
            return Ok(hit);
        }
        self.metrics.record_cache_miss();

        let result = self.run_attempts(filter, Arc::new(fields)).await;
        self.metrics.record_search(started.elapsed().as_millis() as u64);

        let outcome = result?;
        info!(
            "{} returned {} records (total {:?})",
            outcome.dialect,
            outcome.records.len(),
            outcome.total
        );
        self.cache.put(key, outcome.clone());
        Ok(outcome)
    }

    async fn refresh_schema(&self) {
        self.schema_store.invalidate();
        match self.schema_store.get_schema(true).await {
            Ok(schema) => info!("Schema refreshed, {} columns", schema.columns().len()),
            Err(e) => warn!("Schema refresh failed: {}", e),
        }
    }

    fn endpoint(&self) -> &DatasetEndpoint {
        &self.endpoint
    }
}

/// Wire the production search service from configuration
pub fn create_search_service(
    ods: &OdsConfig,
    fetcher: Arc<dyn JsonFetcher>,
    clock: Arc<dyn Clock>,
    metrics: Arc<AppMetrics>,
) -> Arc<dyn SearchService> {
    let endpoint = DatasetEndpoint::from_config(ods);
    let schema_store = Arc::new(CatalogSchemaStore::new(
        endpoint.clone(),
        fetcher.clone(),
        clock.clone(),
        ods.schema_ttl(),
    ));
    let cache = Arc::new(TtlResultCache::new(ods.results_cache_ttl(), clock));
    let preferred = if ods.prefer_explore {
        Dialect::Explore
    } else {
        Dialect::RecordsV1
    };

    Arc::new(SearchOrchestrator::new(
        endpoint,
        fetcher,
        schema_store,
        cache,
        preferred,
        metrics,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::clock::ManualClock;
    use parking_lot::Mutex;
    use rstest::rstest;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    /// Answers catalog requests with a fixed schema and query requests from a
    /// scripted queue, recording every query URL.
    struct ScriptedFetcher {
        catalog: std::result::Result<Value, FetchError>,
        responses: Mutex<VecDeque<std::result::Result<Value, FetchError>>>,
        queries: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        fn new(responses: Vec<std::result::Result<Value, FetchError>>) -> Arc<Self> {
            Arc::new(Self {
                catalog: Ok(json!({"dataset": {"fields": [{"name": "dateparution"}]}})),
                responses: Mutex::new(responses.into()),
                queries: Mutex::new(Vec::new()),
            })
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().clone()
        }
    }

    #[async_trait]
    impl JsonFetcher for ScriptedFetcher {
        async fn get_json(&self, url: &str) -> std::result::Result<Value, FetchError> {
            if url.contains("/api/v2/catalog/") {
                return self.catalog.clone();
            }
            self.queries.lock().push(url.to_string());
            self.responses
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::Transport("script exhausted".into())))
        }
    }

    struct Harness {
        service: SearchOrchestrator,
        fetcher: Arc<ScriptedFetcher>,
        clock: Arc<ManualClock>,
        metrics: Arc<AppMetrics>,
    }

    fn harness(preferred: Dialect, fetcher: Arc<ScriptedFetcher>) -> Harness {
        let endpoint = DatasetEndpoint::new("https://example.org", "boamp", None);
        let clock = Arc::new(ManualClock::new());
        let metrics = Arc::new(AppMetrics::default());
        let schema_store = Arc::new(CatalogSchemaStore::new(
            endpoint.clone(),
            fetcher.clone(),
            clock.clone(),
            Duration::from_secs(600),
        ));
        let cache = Arc::new(TtlResultCache::new(Duration::from_secs(60), clock.clone()));
        let service = SearchOrchestrator::new(
            endpoint,
            fetcher.clone(),
            schema_store,
            cache,
            preferred,
            metrics.clone(),
        );
        Harness {
            service,
            fetcher,
            clock,
            metrics,
        }
    }

    fn status(code: u16) -> std::result::Result<Value, FetchError> {
        Err(FetchError::Status {
            status: code,
            url: "https://example.org/q".into(),
        })
    }

    fn explore_ok() -> std::result::Result<Value, FetchError> {
        Ok(json!({"total_count": 2, "results": [{"objet": "A"}, {"objet": "B"}]}))
    }

    fn v1_ok() -> std::result::Result<Value, FetchError> {
        Ok(json!({"nhits": 1, "records": [{"recordid": "r1", "fields": {"objet": "C"}}]}))
    }

    #[rstest]
    #[case(404, true)]
    #[case(400, true)]
    #[case(499, true)]
    #[case(500, false)]
    #[case(503, false)]
    #[case(302, false)]
    fn test_fallback_policy_by_status(#[case] code: u16, #[case] expected: bool) {
        let error = FetchError::Status {
            status: code,
            url: String::new(),
        };
        assert_eq!(allows_fallback(&error), expected);
    }

    #[test]
    fn test_fallback_policy_non_status() {
        assert!(allows_fallback(&FetchError::Transport("refused".into())));
        assert!(allows_fallback(&FetchError::Timeout("30s".into())));
        assert!(allows_fallback(&FetchError::Parse("eof".into())));
    }

    #[tokio::test]
    async fn test_primary_success() {
        let h = harness(Dialect::Explore, ScriptedFetcher::new(vec![explore_ok()]));

        let outcome = h.service.search(&SearchFilter::default()).await.unwrap();

        assert_eq!(outcome.dialect, Dialect::Explore);
        assert_eq!(outcome.total, Some(2));
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.fields.date, "dateparution");
        assert!(outcome.debug_url.contains("/api/explore/v2.1/"));
        assert_eq!(h.fetcher.queries(), vec![outcome.debug_url.clone()]);
    }

    #[tokio::test]
    async fn test_404_triggers_exactly_one_fallback() {
        let h = harness(Dialect::Explore, ScriptedFetcher::new(vec![status(404), v1_ok()]));

        let outcome = h.service.search(&SearchFilter::default()).await.unwrap();

        assert_eq!(outcome.dialect, Dialect::RecordsV1);
        assert_eq!(outcome.total, Some(1));
        assert!(outcome.debug_url.contains("/api/records/1.0/search/"));
        assert_eq!(h.fetcher.queries().len(), 2);
        assert_eq!(h.metrics.fallbacks_total.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_503_is_surfaced_without_fallback() {
        let h = harness(Dialect::Explore, ScriptedFetcher::new(vec![status(503), v1_ok()]));

        let err = h.service.search(&SearchFilter::default()).await.unwrap_err();

        assert!(matches!(
            err,
            AppError::DialectExecution {
                dialect: Dialect::Explore,
                source: FetchError::Status { status: 503, .. }
            }
        ));
        assert_eq!(h.fetcher.queries().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_and_parse_errors_fall_back() {
        let h = harness(
            Dialect::Explore,
            ScriptedFetcher::new(vec![Err(FetchError::Timeout("30s".into())), v1_ok()]),
        );
        let outcome = h.service.search(&SearchFilter::default()).await.unwrap();
        assert_eq!(outcome.dialect, Dialect::RecordsV1);

        let h = harness(Dialect::Explore, ScriptedFetcher::new(vec![Ok(json!("oops")), v1_ok()]));
        let outcome = h.service.search(&SearchFilter::default()).await.unwrap();
        assert_eq!(outcome.dialect, Dialect::RecordsV1);
    }

    #[tokio::test]
    async fn test_both_dialects_failing_surfaces_last_error() {
        let h = harness(Dialect::Explore, ScriptedFetcher::new(vec![status(400), status(404)]));

        let err = h.service.search(&SearchFilter::default()).await.unwrap_err();

        match err {
            AppError::ExhaustedFallback { attempted, source } => {
                assert_eq!(attempted, [Dialect::Explore, Dialect::RecordsV1]);
                assert_eq!(source.status(), Some(404));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(h.fetcher.queries().len(), 2);
    }

    #[tokio::test]
    async fn test_fallback_5xx_still_exhausts() {
        let h = harness(Dialect::Explore, ScriptedFetcher::new(vec![status(404), status(502)]));

        let err = h.service.search(&SearchFilter::default()).await.unwrap_err();

        assert!(matches!(err, AppError::ExhaustedFallback { .. }));
        assert_eq!(err.to_string(), "HTTP 502 from https://example.org/q");
        assert_eq!(h.fetcher.queries().len(), 2);
    }

    #[tokio::test]
    async fn test_records_v1_preferred_is_symmetric() {
        let h = harness(Dialect::RecordsV1, ScriptedFetcher::new(vec![status(400), explore_ok()]));

        let outcome = h.service.search(&SearchFilter::default()).await.unwrap();

        let queries = h.fetcher.queries();
        assert!(queries[0].contains("/api/records/1.0/search/"));
        assert!(queries[1].contains("/api/explore/v2.1/"));
        assert_eq!(outcome.dialect, Dialect::Explore);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network_until_expiry() {
        let h = harness(
            Dialect::Explore,
            ScriptedFetcher::new(vec![explore_ok(), explore_ok()]),
        );
        let filter = SearchFilter::default();

        h.service.search(&filter).await.unwrap();
        h.clock.advance(Duration::from_secs(30));
        let cached = h.service.search(&filter).await.unwrap();
        assert_eq!(cached.total, Some(2));
        assert_eq!(h.fetcher.queries().len(), 1);
        assert_eq!(h.metrics.cache_hits_total.load(Ordering::SeqCst), 1);

        h.clock.advance(Duration::from_secs(30));
        h.service.search(&filter).await.unwrap();
        assert_eq!(h.fetcher.queries().len(), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let h = harness(Dialect::Explore, ScriptedFetcher::new(vec![status(503), explore_ok()]));
        let filter = SearchFilter::default();

        assert!(h.service.search(&filter).await.is_err());
        assert!(h.service.search(&filter).await.is_ok());
        assert_eq!(h.fetcher.queries().len(), 2);
    }

    #[tokio::test]
    async fn test_schema_failure_degrades_to_defaults() {
        let fetcher = Arc::new(ScriptedFetcher {
            catalog: Err(FetchError::Transport("down".into())),
            responses: Mutex::new(vec![explore_ok()].into()),
            queries: Mutex::new(Vec::new()),
        });
        let h = harness(Dialect::Explore, fetcher);

        let outcome = h.service.search(&SearchFilter::default()).await.unwrap();

        assert_eq!(outcome.fields.date, "record_timestamp");
        assert!(outcome.debug_url.contains("order_by=-record_timestamp"));
        assert_eq!(h.metrics.schema_degraded_total.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_envelope_parsing() {
        let (records, total) = parse_envelope(
            Dialect::RecordsV1,
            json!({"nhits": 12, "records": [{"recordid": "a"}]}),
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(total, Some(12));

        let (records, total) = parse_envelope(Dialect::Explore, json!({})).unwrap();
        assert!(records.is_empty());
        assert_eq!(total, None);

        assert!(matches!(
            parse_envelope(Dialect::Explore, json!([1, 2])),
            Err(FetchError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_normalized_outcome_hides_dialect_shape() {
        let h = harness(Dialect::Explore, ScriptedFetcher::new(vec![status(404), v1_ok()]));
        let outcome = h.service.search(&SearchFilter::default()).await.unwrap();

        let items = outcome.normalized(h.service.endpoint());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "C");
        assert_eq!(
            items[0].href,
            "https://example.org/explore/dataset/boamp/record/?id=r1"
        );
    }
}
