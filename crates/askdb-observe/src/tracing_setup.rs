//! Global subscriber: env-filtered fmt output on stderr, plus an optional
//! OpenTelemetry bridge that prints finished spans to stdout.
//!
//! ```no_run
//! use askdb_observe::tracing_setup::{filter_for_verbosity, init_tracing, shutdown_tracing};
//!
//! init_tracing(filter_for_verbosity(1, false), false).unwrap();
//! tracing::info!("ready");
//! shutdown_tracing();
//! ```

use std::error::Error;
use std::sync::OnceLock;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static OTEL_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// Filter directive for `-v` repetitions; `--quiet` only matters at zero.
pub fn filter_for_verbosity(verbose: u8, quiet: bool) -> &'static str {
    match (verbose, quiet) {
        (0, true) => "error",
        (0, false) => "warn",
        (1, _) => "info,askdb=debug",
        _ => "trace",
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `default_filter`.
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(default_filter: &str, enable_otel: bool) -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let otel_layer = enable_otel.then(|| {
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build();
        let tracer = provider.tracer("askdb");
        opentelemetry::global::set_tracer_provider(provider.clone());
        let _ = OTEL_PROVIDER.set(provider);
        tracing_opentelemetry::layer().with_tracer(tracer)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(otel_layer)
        .try_init()?;
    Ok(())
}

/// Flush buffered spans. Does nothing unless `--otel` was given.
pub fn shutdown_tracing() {
    let Some(provider) = OTEL_PROVIDER.get() else {
        return;
    };
    if let Err(e) = provider.shutdown() {
        eprintln!("warning: span exporter did not shut down cleanly: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_only_applies_without_verbose() {
        assert_eq!(filter_for_verbosity(0, true), "error");
        assert_eq!(filter_for_verbosity(0, false), "warn");
        assert_eq!(filter_for_verbosity(1, true), "info,askdb=debug");
        assert_eq!(filter_for_verbosity(3, false), "trace");
    }

    #[test]
    fn test_verbose_filters_parse() {
        for v in 0..3 {
            assert!(EnvFilter::try_new(filter_for_verbosity(v, false)).is_ok());
        }
    }
}
