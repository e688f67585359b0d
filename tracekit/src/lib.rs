//! # TraceKit client for Rust
//!
//! An in-process span recorder that builds a call-tree of timed operations
//! per request and hands completed spans to an export pipeline. The client
//! consists of a few main structs:
//!
//! * The [`Tracer`], a cheaply clonable per-request context holding the span
//!   list and the active-span stack.
//! * The [`TracerConfig`], resolved once from explicit values, environment
//!   variables, and defaults.
//! * The export pipeline: an [`ExportProcessor`] deciding where export work
//!   runs, feeding a [`SpanExporter`] that encodes and transmits batches.
//!
//! The OTLP/HTTP exporter lives in the companion `tracekit-otlp` crate;
//! this crate ships an [`InMemorySpanExporter`] for tests and debugging.
//!
//! The tracer is fail-open by design: sampling decisions and internal
//! faults surface to callers only as `None` from span-creation calls, which
//! every annotation call accepts as a valid no-op.
//!
//! ```
//! use tracekit::{InMemorySpanExporter, Status, Tracer, TracerConfig};
//!
//! let exporter = InMemorySpanExporter::new();
//! let config = TracerConfig::builder()
//!     .with_api_key("k")
//!     .with_sample_rate(1.0)
//!     .build();
//! let tracer = Tracer::builder(config)
//!     .with_simple_exporter(exporter.clone())
//!     .build();
//!
//! let root = tracer.start_trace("http-request", Vec::new(), false);
//! tracer.end_span(root.as_ref(), Vec::new(), Status::Ok);
//! tracer.flush();
//!
//! assert_eq!(exporter.finished_spans().len(), 1);
//! ```

pub mod config;
mod error;
mod export;
mod id_generator;
mod processor;
mod sampler;
pub mod semconv;
mod span;
mod time;
mod tracer;
pub mod value;

pub use config::{TracerConfig, TracerConfigBuilder};
pub use error::TraceError;
pub use export::{ExportResult, InMemorySpanExporter, NoopSpanExporter, SpanExporter};
#[cfg(any(test, feature = "testing"))]
pub use id_generator::IncrementIdGenerator;
pub use id_generator::{IdGenerator, RandomIdGenerator};
pub use processor::{
    BatchConfig, BatchConfigBuilder, BatchExportProcessor, ExportProcessor, SimpleExportProcessor,
};
pub use sampler::Sampler;
pub use span::{SpanData, SpanEvent, SpanHandle, SpanId, SpanKind, Status, TraceId};
pub use tracer::{Tracer, TracerBuilder};
pub use value::{attributes_from_json, AttributeValue, KeyValue};
