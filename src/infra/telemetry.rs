//! Process-wide logging and metric descriptions.

use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, Registry, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::application::catalog::{METRIC_QUERY_FAILED, METRIC_QUERY_MS};
use crate::cache::store::{
    METRIC_CACHE_EXPIRED, METRIC_CACHE_HIT, METRIC_CACHE_INVALIDATED, METRIC_CACHE_MISS,
};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static DESCRIBE: Once = Once::new();

const COUNTERS: [(&str, &str); 5] = [
    (METRIC_CACHE_HIT, "Cache reads answered by a fresh entry."),
    (METRIC_CACHE_MISS, "Cache reads that had to go to the store."),
    (METRIC_CACHE_EXPIRED, "Entries found past their TTL and evicted on read."),
    (METRIC_CACHE_INVALIDATED, "Entries removed after a write or an admin clear."),
    (METRIC_QUERY_FAILED, "Catalog searches that errored or hit the query timeout."),
];

/// Install the global subscriber. `RUST_LOG` refines `logging.level`.
///
/// Fails if a subscriber is already installed.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    DESCRIBE.call_once(describe_metrics);

    let filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(output_layer(logging.format))
        .with(filter)
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|err| InfraError::telemetry(format!("logging already initialised: {err}")))
}

fn output_layer(format: LogFormat) -> Box<dyn Layer<Registry> + Send + Sync> {
    match format {
        // Spans carry the request id and cache key fields.
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    }
}

fn describe_metrics() {
    for (name, description) in COUNTERS {
        describe_counter!(name, Unit::Count, description);
    }
    describe_histogram!(
        METRIC_QUERY_MS,
        Unit::Milliseconds,
        "Store latency of a catalog search on cache miss."
    );
}
