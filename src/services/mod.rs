//! 服务模块

pub mod clock;
pub mod export;
pub mod http_client;
pub mod query_builder;
pub mod result_cache;
pub mod schema_store;
pub mod search;

pub use clock::{Clock, ManualClock, SystemClock};
pub use export::{ExportItem, to_csv, to_ics};
pub use http_client::{FetchError, JsonFetcher, ReqwestFetcher};
pub use query_builder::{build_explore_url, build_records_v1_url, build_url};
pub use result_cache::{CacheKey, ResultCache, TtlResultCache};
pub use schema_store::{CatalogSchemaStore, SchemaStore};
pub use search::{
    SearchOrchestrator, SearchOutcome, SearchService, allows_fallback, create_search_service,
};
