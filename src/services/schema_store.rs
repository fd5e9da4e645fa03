//! Dataset schema store
//!
//! Fetches the catalog entry of the dataset and keeps the column list in a
//! process-wide snapshot with a fixed TTL. A refresh replaces the snapshot as a
//! whole; readers never observe a partially updated value.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::models::endpoint::DatasetEndpoint;
use crate::models::schema::DatasetSchema;
use crate::services::clock::Clock;
use crate::services::http_client::JsonFetcher;

#[async_trait]
pub trait SchemaStore: Send + Sync {
    /// Cached schema when fresh, otherwise a network fetch
    async fn get_schema(&self, force_refresh: bool) -> Result<Arc<DatasetSchema>>;

    /// Mark the cached snapshot stale so the next read refetches
    fn invalidate(&self);
}

#[derive(Debug, Clone)]
struct SchemaSnapshot {
    schema: Arc<DatasetSchema>,
    fetched_at: Instant,
}

pub struct CatalogSchemaStore {
    endpoint: DatasetEndpoint,
    fetcher: Arc<dyn JsonFetcher>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    snapshot: RwLock<Option<SchemaSnapshot>>,
}

impl CatalogSchemaStore {
    pub fn new(
        endpoint: DatasetEndpoint,
        fetcher: Arc<dyn JsonFetcher>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            endpoint,
            fetcher,
            clock,
            ttl,
            snapshot: RwLock::new(None),
        }
    }

    fn fresh_snapshot(&self) -> Option<Arc<DatasetSchema>> {
        let now = self.clock.now();
        self.snapshot
            .read()
            .as_ref()
            .filter(|s| now.saturating_duration_since(s.fetched_at) < self.ttl)
            .map(|s| s.schema.clone())
    }
}

#[async_trait]
impl SchemaStore for CatalogSchemaStore {
    async fn get_schema(&self, force_refresh: bool) -> Result<Arc<DatasetSchema>> {
        if !force_refresh {
            if let Some(schema) = self.fresh_snapshot() {
                return Ok(schema);
            }
        }

        let url = self.endpoint.catalog_url();
        let payload = self
            .fetcher
            .get_json(&url)
            .await
            .map_err(AppError::SchemaFetch)?;

        let schema = Arc::new(DatasetSchema::from_catalog(&payload));
        if schema.is_empty() {
            info!("Catalog for dataset {} exposed no fields, default column names will be used", self.endpoint.dataset_id());
        } else {
            debug!("Fetched schema with {} columns", schema.columns().len());
        }

        *self.snapshot.write() = Some(SchemaSnapshot {
            schema: schema.clone(),
            fetched_at: self.clock.now(),
        });

        Ok(schema)
    }

    fn invalidate(&self) {
        *self.snapshot.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::clock::ManualClock;
    use crate::services::http_client::FetchError;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        calls: AtomicUsize,
        response: std::result::Result<Value, FetchError>,
    }

    #[async_trait]
    impl JsonFetcher for CountingFetcher {
        async fn get_json(&self, _url: &str) -> std::result::Result<Value, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone()
        }
    }

    fn store(
        response: std::result::Result<Value, FetchError>,
    ) -> (CatalogSchemaStore, Arc<CountingFetcher>, Arc<ManualClock>) {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
            response,
        });
        let clock = Arc::new(ManualClock::new());
        let store = CatalogSchemaStore::new(
            DatasetEndpoint::new("https://example.org", "boamp", None),
            fetcher.clone(),
            clock.clone(),
            Duration::from_secs(600),
        );
        (store, fetcher, clock)
    }

    fn catalog() -> Value {
        json!({"dataset": {"fields": [{"name": "dateparution"}]}})
    }

    #[tokio::test]
    async fn test_cached_within_ttl() {
        let (store, fetcher, clock) = store(Ok(catalog()));

        store.get_schema(false).await.unwrap();
        clock.advance(Duration::from_secs(599));
        let schema = store.get_schema(false).await.unwrap();

        assert!(schema.contains("dateparution"));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refetch_after_ttl() {
        let (store, fetcher, clock) = store(Ok(catalog()));

        store.get_schema(false).await.unwrap();
        clock.advance(Duration::from_secs(600));
        store.get_schema(false).await.unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_force_refresh_and_invalidate_bypass_cache() {
        let (store, fetcher, _clock) = store(Ok(catalog()));

        store.get_schema(false).await.unwrap();
        store.get_schema(true).await.unwrap();
        store.invalidate();
        store.get_schema(false).await.unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_schema_fetch_error() {
        let (store, _fetcher, _clock) = store(Err(FetchError::Transport("refused".into())));

        let err = store.get_schema(false).await.unwrap_err();
        assert!(matches!(err, AppError::SchemaFetch(FetchError::Transport(_))));
    }

    #[tokio::test]
    async fn test_malformed_catalog_yields_empty_schema() {
        let (store, _fetcher, _clock) = store(Ok(json!({"unexpected": true})));

        let schema = store.get_schema(false).await.unwrap();
        assert!(schema.is_empty());
    }
}
