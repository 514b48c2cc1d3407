//! Tracing subscriber initialization with optional OpenTelemetry export.
//!
//! ```no_run
//! // Structured logging only
//! mnemos_observe::tracing_setup::init_tracing(false).unwrap();
//!
//! // Also export spans (registry resolution, capability dispatch, LLM retries)
//! // to stdout as OpenTelemetry traces
//! mnemos_observe::tracing_setup::init_tracing(true).unwrap();
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use std::sync::OnceLock;

/// Name the tracer registers under.
pub const TRACER_NAME: &str = "mnemos";

static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// Install the global subscriber.
///
/// Always adds a `fmt` layer that reports span close timing, so the
/// `#[instrument]`ed registry and dispatcher calls show their duration.
/// With `enable_otel`, spans are also bridged to OpenTelemetry and printed
/// by the stdout exporter. The filter comes from `RUST_LOG`, defaulting to `info`.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(enable_otel: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE);

    // `None` layers are skipped, so one registry covers both modes.
    let otel_layer = enable_otel.then(|| {
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build();
        let tracer = provider.tracer(TRACER_NAME);
        let _ = TRACER_PROVIDER.set(provider.clone());
        opentelemetry::global::set_tracer_provider(provider);
        tracing_opentelemetry::layer().with_tracer(tracer)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()?;
    Ok(())
}

/// Flush buffered spans and shut the tracer provider down.
///
/// No-op when OpenTelemetry was never enabled.
pub fn shutdown_tracing() {
    let Some(provider) = TRACER_PROVIDER.get() else {
        return;
    };
    if let Err(e) = provider.shutdown() {
        eprintln!("mnemos: failed to flush traces: {e}");
    }
}
