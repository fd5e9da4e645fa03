use boamp_search::api::{self, app_state::AppState};
use boamp_search::config::loader::ConfigLoader;
use boamp_search::error::AppError;
use boamp_search::models::endpoint::DatasetEndpoint;
use boamp_search::observability::{
    AppMetrics, HealthCheckResult, ObservabilityState, create_observability_router, init_tracing,
};
use boamp_search::services::{JsonFetcher, ReqwestFetcher, SystemClock, create_search_service};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::load().map_err(AppError::from)?;
    init_tracing(&config.logging.level, config.logging.structured);
    ConfigLoader::validate(&config)?;
    info!("Configuration loaded ({})", config.environment);

    let fetcher: Arc<dyn JsonFetcher> = Arc::new(ReqwestFetcher::from_config(&config.ods, &config.tls)?);
    let metrics = Arc::new(AppMetrics::default());

    let search_service = create_search_service(
        &config.ods,
        fetcher.clone(),
        Arc::new(SystemClock),
        metrics.clone(),
    );
    info!(
        "Search service ready for dataset {} on {} (prefer Explore: {})",
        config.ods.dataset_id, config.ods.base_url, config.ods.prefer_explore
    );

    let observability_state = Arc::new(ObservabilityState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        metrics.clone(),
    ));
    probe_catalog(&observability_state, fetcher.as_ref(), &DatasetEndpoint::from_config(&config.ods)).await;

    let api_router = api::create_router(AppState::new(search_service, metrics));
    let router = create_observability_router(observability_state).merge(api_router);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}

/// Startup reachability check of the catalog endpoint, reported on /health
async fn probe_catalog(state: &ObservabilityState, fetcher: &dyn JsonFetcher, endpoint: &DatasetEndpoint) {
    let started = Instant::now();
    let result = fetcher.get_json(&endpoint.catalog_url()).await;
    let latency_ms = started.elapsed().as_millis() as u64;

    let (healthy, message) = match result {
        Ok(_) => (true, "catalog reachable".to_string()),
        Err(e) => {
            warn!("Catalog probe failed: {}", e);
            (false, e.to_string())
        }
    };

    state
        .add_health_check(HealthCheckResult {
            name: "ods_catalog".to_string(),
            healthy,
            message,
            latency_ms,
        })
        .await;
}
