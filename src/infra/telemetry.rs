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

/// Install the global tracing subscriber described by `logging`.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
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
            "postline_accounts_registered_total",
            Unit::Count,
            "Accounts created through registration."
        );
        describe_counter!(
            "postline_logins_total",
            Unit::Count,
            "Login attempts, labelled by outcome."
        );
        describe_counter!(
            "postline_posts_created_total",
            Unit::Count,
            "Posts created."
        );
        describe_counter!(
            "postline_posts_deleted_total",
            Unit::Count,
            "Posts deleted."
        );
        describe_counter!(
            "postline_image_release_failures_total",
            Unit::Count,
            "Stored images that could not be removed after their post changed."
        );
    });
}
