//! Span exporters.
//!
//! Protocol-specific exporters implement [`SpanExporter`] so they can be
//! plugged into the pipeline behind a processor. An exporter is expected
//! to be a simple encoder and transmitter; batching, queueing and fan-in
//! happen above it.

use crate::error::TraceError;
use crate::span::SpanData;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

/// Result of handing a batch to an exporter.
pub type ExportResult = Result<(), TraceError>;

/// Interface for sending batches of completed spans to a destination.
pub trait SpanExporter: Send + Sync + Debug {
    /// Deliver a batch of completed spans.
    ///
    /// Never called concurrently for the same exporter instance. Must not
    /// block indefinitely; whatever timeout the underlying transport
    /// enforces is the only delivery guarantee. Retries, if any, are the
    /// exporter's own business.
    fn export(&mut self, batch: Vec<SpanData>) -> ExportResult;

    /// Called once when the pipeline shuts down, after the final export.
    fn shutdown(&mut self) {}
}

/// An exporter that discards everything.
///
/// Used as the default wiring of a [`Tracer`](crate::Tracer) that has not
/// been given a real exporter, so recording still works in tests and
/// half-configured environments.
#[derive(Clone, Debug, Default)]
pub struct NoopSpanExporter {
    _private: (),
}

impl NoopSpanExporter {
    /// Create a new no-op exporter.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpanExporter for NoopSpanExporter {
    fn export(&mut self, _batch: Vec<SpanData>) -> ExportResult {
        Ok(())
    }
}

/// An exporter that stores finished spans in memory.
///
/// Useful for testing and debugging; clones share the same underlying
/// store, so a test can keep one handle and give the other to the
/// pipeline.
#[derive(Clone, Debug, Default)]
pub struct InMemorySpanExporter {
    spans: Arc<Mutex<Vec<SpanData>>>,
}

impl InMemorySpanExporter {
    /// Create a new empty in-memory exporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// The finished spans received so far.
    pub fn finished_spans(&self) -> Vec<SpanData> {
        self.spans
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Clear the internal storage of finished spans.
    pub fn reset(&self) {
        if let Ok(mut guard) = self.spans.lock() {
            guard.clear();
        }
    }
}

impl SpanExporter for InMemorySpanExporter {
    fn export(&mut self, mut batch: Vec<SpanData>) -> ExportResult {
        self.spans
            .lock()
            .map(|mut guard| guard.append(&mut batch))
            .map_err(|_| TraceError::Internal("span store lock poisoned".to_owned()))
    }

    fn shutdown(&mut self) {
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::{SpanId, SpanKind, Status, TraceId};

    fn span(name: &str) -> SpanData {
        SpanData {
            trace_id: TraceId::from(1),
            span_id: SpanId::from(2),
            parent_span_id: None,
            name: name.to_owned(),
            kind: SpanKind::Internal,
            start_time_unix_nano: 1,
            end_time_unix_nano: Some(2),
            attributes: Vec::new(),
            events: Vec::new(),
            status: Status::Ok,
        }
    }

    #[test]
    fn clones_share_the_store() {
        let exporter = InMemorySpanExporter::new();
        let mut pipeline_half = exporter.clone();
        pipeline_half
            .export(vec![span("a"), span("b")])
            .expect("export into memory");
        assert_eq!(exporter.finished_spans().len(), 2);

        exporter.reset();
        assert!(exporter.finished_spans().is_empty());
    }
}
