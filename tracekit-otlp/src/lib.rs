//! # OTLP JSON export for the TraceKit tracer
//!
//! Turns completed [`tracekit`] spans into the OTLP/HTTP JSON wire shape
//! and POSTs them to a collector endpoint, best-effort: one request per
//! batch, no retries, and failures are logged and swallowed above the
//! exporter rather than surfaced to the host request.
//!
//! The usual wiring goes through the pipeline helper, which reads the
//! endpoint, API key and service name out of the resolved configuration:
//!
//! ```no_run
//! use tracekit::TracerConfig;
//!
//! let tracer = tracekit_otlp::new_pipeline(TracerConfig::from_env()).install_batch();
//!
//! let root = tracer.start_trace("http-request", Vec::new(), false);
//! tracer.end_span(root.as_ref(), Vec::new(), tracekit::Status::Ok);
//! tracer.flush();
//! # let _ = tracer.shutdown();
//! ```

mod exporter;
pub mod payload;

pub use exporter::{
    OtlpHttpExporter, OtlpHttpExporterBuilder, API_KEY_HEADER, DEFAULT_EXPORT_TIMEOUT,
};
pub use payload::{
    build_trace_payload, validate_payload_structure, PayloadSummary, TracePayload,
    STATUS_CODE_ERROR, STATUS_CODE_OK,
};

use tracekit::{BatchConfig, Tracer, TracerConfig};

/// Start wiring a [`Tracer`] to an OTLP HTTP exporter built from `config`.
pub fn new_pipeline(config: TracerConfig) -> PipelineBuilder {
    PipelineBuilder {
        config,
        batch_config: None,
    }
}

/// Builder wiring configuration, exporter, and processor together.
#[derive(Debug)]
pub struct PipelineBuilder {
    config: TracerConfig,
    batch_config: Option<BatchConfig>,
}

impl PipelineBuilder {
    /// Use explicit queue bounds for the background exporter.
    pub fn with_batch_config(mut self, batch_config: BatchConfig) -> Self {
        self.batch_config = Some(batch_config);
        self
    }

    /// Install with inline export on every flush.
    ///
    /// Right for CLI one-shots where the process may exit immediately
    /// after flushing. Falls back to a no-op pipeline when the exporter
    /// cannot be built.
    pub fn install_simple(self) -> Tracer {
        let builder = Tracer::builder(self.config.clone());
        match OtlpHttpExporter::from_config(&self.config) {
            Ok(exporter) => builder.with_simple_exporter(exporter).build(),
            Err(err) => {
                tracing::warn!(error = %err, "OTLP exporter unavailable, spans will be discarded");
                builder.build()
            }
        }
    }

    /// Install with export on a dedicated background thread, so the
    /// request path never waits on network I/O.
    pub fn install_batch(self) -> Tracer {
        let builder = Tracer::builder(self.config.clone());
        match OtlpHttpExporter::from_config(&self.config) {
            Ok(exporter) => {
                let batch_config = self.batch_config.unwrap_or_default();
                builder
                    .with_batch_exporter_and_config(exporter, batch_config)
                    .build()
            }
            Err(err) => {
                tracing::warn!(error = %err, "OTLP exporter unavailable, spans will be discarded");
                builder.build()
            }
        }
    }
}
