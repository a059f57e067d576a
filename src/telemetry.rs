use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::{TonicExporterBuilder, WithExportConfig};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::Config;
use opentelemetry_sdk::{runtime, Resource};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use tracing_opentelemetry::{MetricsLayer, OpenTelemetryLayer};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Console output follows `RUST_LOG` (INFO by default), the log file always records DEBUG and up.
pub fn init_telemetry(log_dir: &str, log_name: &str, otlp_endpoint: Option<&str>) -> Result<()> {
    let log_file = open_log_file(Path::new(log_dir), log_name)?;

    let (trace_layer, metrics_layer) = match otlp_endpoint {
        Some(endpoint) => {
            let service_resource = Resource::new(vec![
                KeyValue::new(SERVICE_NAME, env!("CARGO_PKG_NAME")),
                KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
            ]);

            let tracer_provider = opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(build_tonic_exporter(endpoint))
                .with_trace_config(Config::default().with_resource(service_resource.clone()))
                .install_batch(runtime::Tokio)
                .context("Failed to install tracer")?;
            let tracer = tracer_provider.tracer(env!("CARGO_PKG_NAME"));
            global::set_tracer_provider(tracer_provider);

            let meter = opentelemetry_otlp::new_pipeline()
                .metrics(runtime::Tokio)
                .with_exporter(build_tonic_exporter(endpoint))
                .with_resource(service_resource)
                .build()
                .context("Failed to install meter")?;
            global::set_meter_provider(meter.clone());

            global::set_text_map_propagator(TraceContextPropagator::new());
            (
                Some(OpenTelemetryLayer::new(tracer).with_filter(LevelFilter::INFO)),
                Some(MetricsLayer::new(meter).with_filter(LevelFilter::INFO)),
            )
        }
        None => (None, None),
    };

    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("INFO"));
    Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file))
                .with_filter(LevelFilter::DEBUG),
        )
        .with(trace_layer)
        .with(metrics_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

/// Flushes spans still buffered for the OTLP exporter.
pub fn shutdown_telemetry() {
    global::shutdown_tracer_provider();
}

fn open_log_file(log_dir: &Path, log_name: &str) -> Result<File> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let path = log_dir.join(log_name);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

fn build_tonic_exporter(endpoint: &str) -> TonicExporterBuilder {
    opentelemetry_otlp::new_exporter()
        .tonic()
        .with_timeout(Duration::from_secs(15))
        .with_endpoint(endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_is_created_in_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("log");
        open_log_file(&log_dir, "app.log").unwrap();
        assert!(log_dir.join("app.log").exists());
    }
}
