use opentelemetry_otlp::WithExportConfig;
use secrecy::ExposeSecret;
use tokio::task::JoinHandle;
use tonic::metadata::MetadataMap;
use tracing::subscriber::set_global_default;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

use crate::configuration::TelemetrySettings;
use opentelemetry_sdk::trace::Tracer;

pub fn init_subscriber<Sink>(
    name: String,
    env_filter: String,
    sink: Sink,
    settings: &TelemetrySettings,
) where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    LogTracer::init().expect("Failed to set logger");

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));
    let (bunyan_layer, fmt_layer) = if settings.json {
        (Some(BunyanFormattingLayer::new(name, sink)), None)
    } else {
        (None, Some(fmt::layer().with_writer(sink)))
    };
    let otel_layer = telemetry_layer(settings)
        .map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    let registry = Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(bunyan_layer)
        .with(fmt_layer)
        .with(otel_layer);
    set_global_default(registry).expect("Failed to set subscriber");
}

pub fn telemetry_layer(settings: &TelemetrySettings) -> Option<Tracer> {
    if !settings.enabled {
        return None;
    }
    let mut meta_data = MetadataMap::new();
    meta_data.insert(
        "x-honeycomb-team",
        settings
            .api_key
            .expose_secret()
            .parse()
            .expect("Failed to parse honeycomb api key"),
    );
    let open_telemetry_tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_metadata(meta_data)
                .with_endpoint(&settings.endpoint)
                .with_tls_config(Default::default()),
        )
        .install_batch(opentelemetry_sdk::runtime::Tokio)
        .expect("failed to get opentelemetry tracer");
    Some(open_telemetry_tracer)
}

/// Runs `f` on the blocking pool, inside the span of the caller.
pub fn spawn_blocking_with_tracing<F, R>(f: F) -> JoinHandle<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let current_span = tracing::Span::current();
    tokio::task::spawn_blocking(move || current_span.in_scope(f))
}
