use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer().json().with_target(true).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "cornice_ingest_accepted_total",
            Unit::Count,
            "Uploads that completed the full ingestion pipeline."
        );
        describe_counter!(
            "cornice_ingest_rejected_total",
            Unit::Count,
            "Uploads rejected before a metadata row was created."
        );
        describe_counter!(
            "cornice_resize_total",
            Unit::Count,
            "Stored images downscaled and rewritten in place."
        );
        describe_counter!(
            "cornice_resize_skipped_total",
            Unit::Count,
            "Stored images already within the width budget."
        );
        describe_counter!(
            "cornice_resize_failed_total",
            Unit::Count,
            "Resize attempts that kept the original resolution."
        );
    });
}
