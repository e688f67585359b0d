//! Tracer core.
//!
//! The [`Tracer`] owns the per-request span list and the LIFO stack of
//! currently open spans. It is a cheap clonable handle: layers that
//! cooperate on one request share clones instead of reaching through
//! process-wide state, and all mutation happens under one lock.
//!
//! Every operation is fail-open. Whatever goes wrong inside (sampling,
//! poisoned lock, unknown span id) degrades to "tracing skipped for this
//! operation", never to an error in the host request. The only signal a
//! caller sees is `None` from span-creation calls, which every annotation
//! call accepts as a valid no-op.

use crate::config::TracerConfig;
use crate::error::TraceError;
use crate::export::{NoopSpanExporter, SpanExporter};
use crate::id_generator::{IdGenerator, RandomIdGenerator};
use crate::processor::{
    BatchConfig, BatchExportProcessor, ExportProcessor, SimpleExportProcessor,
};
use crate::sampler::Sampler;
use crate::semconv;
use crate::span::{SpanData, SpanEvent, SpanHandle, SpanId, SpanKind, Status, TraceId};
use crate::time::now_unix_nano;
use crate::value::{self, KeyValue};
use std::error::Error;
use std::sync::{Arc, Mutex};

const EXCEPTION_EVENT_NAME: &str = "exception";

#[derive(Debug, Default)]
struct TraceState {
    spans: Vec<SpanData>,
    active_stack: Vec<SpanId>,
    trace_id: Option<TraceId>,
}

#[derive(Debug)]
struct TracerInner {
    config: TracerConfig,
    sampler: Sampler,
    id_generator: Box<dyn IdGenerator>,
    processor: Box<dyn ExportProcessor>,
    state: Mutex<TraceState>,
}

/// The per-request tracing context.
#[derive(Clone, Debug)]
pub struct Tracer {
    inner: Arc<TracerInner>,
}

impl Tracer {
    /// Start building a tracer over resolved configuration.
    pub fn builder(config: TracerConfig) -> TracerBuilder {
        TracerBuilder {
            config,
            id_generator: None,
            processor: None,
        }
    }

    /// The configuration this tracer was built with.
    pub fn config(&self) -> &TracerConfig {
        &self.inner.config
    }

    /// Whether the tracer records and exports anything at all.
    pub fn is_enabled(&self) -> bool {
        self.inner.config.is_enabled()
    }

    /// Fraction of traces recorded, in `[0, 1]`.
    pub fn sample_rate(&self) -> f64 {
        self.inner.config.sample_rate()
    }

    /// Sample rate as a percentage in `[0, 100]`.
    pub fn sample_rate_percent(&self) -> f64 {
        self.inner.config.sample_rate_percent()
    }

    /// Whether response bodies should be captured as span attributes.
    pub fn should_trace_response(&self) -> bool {
        self.inner.config.should_trace_response()
    }

    /// Whether executed database queries should be captured.
    pub fn should_trace_db_query(&self) -> bool {
        self.inner.config.should_trace_db_query()
    }

    /// Whether request bodies should be captured.
    pub fn should_trace_request_body(&self) -> bool {
        self.inner.config.should_trace_request_body()
    }

    /// Open a new trace with its root span.
    ///
    /// Returns `None` when the trace is not sampled (or the tracer is
    /// disabled); callers treat that as a valid no-op. `force_sample`
    /// bypasses the ratio, which error recording relies on so failures
    /// are never dropped by sampling.
    pub fn start_trace(
        &self,
        name: impl Into<String>,
        attributes: Vec<KeyValue>,
        force_sample: bool,
    ) -> Option<SpanHandle> {
        self.start_root(name.into(), attributes, force_sample, SpanKind::Internal)
    }

    /// Open a span nested under the currently active span.
    ///
    /// With no active span this behaves like [`Tracer::start_trace`] and
    /// opens a new root instead.
    pub fn start_span(
        &self,
        name: impl Into<String>,
        attributes: Vec<KeyValue>,
    ) -> Option<SpanHandle> {
        self.start_span_with_kind(name, attributes, SpanKind::Internal)
    }

    /// Open a nested span with an explicit kind.
    pub fn start_span_with_kind(
        &self,
        name: impl Into<String>,
        attributes: Vec<KeyValue>,
        kind: SpanKind,
    ) -> Option<SpanHandle> {
        if !self.is_enabled() {
            return None;
        }
        let name = name.into();
        {
            let Ok(mut state) = self.inner.state.lock() else {
                return None;
            };
            if let (Some(&parent_id), Some(trace_id)) =
                (state.active_stack.last(), state.trace_id)
            {
                let span_id = self.inner.id_generator.new_span_id();
                let start = now_unix_nano();
                state.spans.push(SpanData {
                    trace_id,
                    span_id,
                    parent_span_id: Some(parent_id),
                    name,
                    kind,
                    start_time_unix_nano: start,
                    end_time_unix_nano: None,
                    attributes,
                    events: Vec::new(),
                    status: Status::Ok,
                });
                state.active_stack.push(span_id);
                return Some(SpanHandle {
                    trace_id,
                    span_id,
                    start_time_unix_nano: start,
                });
            }
        }
        self.start_root(name, attributes, false, kind)
    }

    fn start_root(
        &self,
        name: String,
        attributes: Vec<KeyValue>,
        force_sample: bool,
        kind: SpanKind,
    ) -> Option<SpanHandle> {
        if !self.inner.sampler.should_sample(force_sample) {
            return None;
        }
        let trace_id = self.inner.id_generator.new_trace_id();
        let span_id = self.inner.id_generator.new_span_id();
        let start = now_unix_nano();
        let Ok(mut state) = self.inner.state.lock() else {
            return None;
        };
        state.trace_id = Some(trace_id);
        state.active_stack.push(span_id);
        state.spans.push(SpanData {
            trace_id,
            span_id,
            parent_span_id: None,
            name,
            kind,
            start_time_unix_nano: start,
            end_time_unix_nano: None,
            attributes,
            events: Vec::new(),
            status: Status::Ok,
        });
        Some(SpanHandle {
            trace_id,
            span_id,
            start_time_unix_nano: start,
        })
    }

    /// End a span: set its end time, merge final attributes, set status,
    /// and remove it from the active stack.
    ///
    /// A `None` handle, an unknown span id, or a span that already ended
    /// are all tolerated as no-ops. Ending a span that is not the current
    /// top of the stack is logged but only removes that span's own stack
    /// entry, so an out-of-order end cannot detach an unrelated span.
    pub fn end_span(
        &self,
        handle: Option<&SpanHandle>,
        final_attributes: Vec<KeyValue>,
        status: Status,
    ) {
        let Some(handle) = handle else { return };
        let Ok(mut state) = self.inner.state.lock() else {
            return;
        };
        let Some(span) = state
            .spans
            .iter_mut()
            .find(|span| span.span_id == handle.span_id)
        else {
            tracing::debug!(span_id = %handle.span_id, "end_span: unknown span id");
            return;
        };
        if span.end_time_unix_nano.is_some() {
            tracing::debug!(span_id = %handle.span_id, "end_span: span already ended");
            return;
        }
        // Wall clock may step backwards; an end before the start would
        // produce a negative duration downstream.
        span.end_time_unix_nano = Some(now_unix_nano().max(span.start_time_unix_nano));
        value::merge_attributes(&mut span.attributes, final_attributes);
        span.status = status;

        if let Some(position) = state
            .active_stack
            .iter()
            .rposition(|&id| id == handle.span_id)
        {
            if position != state.active_stack.len() - 1 {
                tracing::debug!(span_id = %handle.span_id, "end_span: span ended out of stack order");
            }
            state.active_stack.remove(position);
        }
    }

    /// The span new children and events implicitly attach to, if any.
    pub fn active_span(&self) -> Option<SpanId> {
        self.inner
            .state
            .lock()
            .ok()
            .and_then(|state| state.active_stack.last().copied())
    }

    /// Id of the trace currently in progress, if any.
    pub fn trace_id(&self) -> Option<TraceId> {
        self.inner.state.lock().ok().and_then(|state| state.trace_id)
    }

    /// Append a timed event to the given span.
    pub fn add_event(
        &self,
        handle: Option<&SpanHandle>,
        name: impl Into<String>,
        attributes: Vec<KeyValue>,
    ) {
        if !self.is_enabled() {
            return;
        }
        let Some(handle) = handle else { return };
        let Ok(mut state) = self.inner.state.lock() else {
            return;
        };
        match state
            .spans
            .iter_mut()
            .find(|span| span.span_id == handle.span_id)
        {
            Some(span) => span.events.push(SpanEvent {
                name: name.into(),
                time_unix_nano: now_unix_nano(),
                attributes,
            }),
            None => {
                tracing::debug!(span_id = %handle.span_id, "add_event: unknown span id");
            }
        }
    }

    /// Record an error against a span, marking the span failed.
    ///
    /// With a `None` handle a fresh root span named `operation_name` is
    /// force-created, bypassing sampling, so errors are never lost. The
    /// span receives an `exception` event carrying the concrete error type,
    /// the message, and the formatted cause chain, plus an `error.message`
    /// attribute that surfaces in the exported status. This call never
    /// fails and hands back the handle of the span it annotated.
    pub fn record_exception<E>(
        &self,
        handle: Option<&SpanHandle>,
        error: &E,
        operation_name: &str,
        attributes: Vec<KeyValue>,
    ) -> Option<SpanHandle>
    where
        E: Error + ?Sized,
    {
        if !self.is_enabled() {
            return None;
        }
        let (handle, event_extras) = match handle {
            Some(handle) => (handle.clone(), attributes),
            None => {
                let handle = self.start_trace(operation_name, attributes, true)?;
                (handle, Vec::new())
            }
        };

        let message = error.to_string();
        let mut event_attributes = vec![
            KeyValue::new(semconv::EXCEPTION_TYPE, std::any::type_name::<E>()),
            KeyValue::new(semconv::EXCEPTION_MESSAGE, message.clone()),
            KeyValue::new(semconv::EXCEPTION_STACKTRACE, format_error_chain(error)),
        ];
        value::merge_attributes(&mut event_attributes, event_extras);

        if let Ok(mut state) = self.inner.state.lock() {
            match state
                .spans
                .iter_mut()
                .find(|span| span.span_id == handle.span_id)
            {
                Some(span) => {
                    span.events.push(SpanEvent {
                        name: EXCEPTION_EVENT_NAME.to_owned(),
                        time_unix_nano: now_unix_nano(),
                        attributes: event_attributes,
                    });
                    span.status = Status::Error;
                    value::merge_attributes(
                        &mut span.attributes,
                        vec![KeyValue::new(semconv::ERROR_MESSAGE, message)],
                    );
                }
                None => {
                    tracing::debug!(span_id = %handle.span_id, "record_exception: unknown span id");
                }
            }
        }
        Some(handle)
    }

    /// Run `f` inside a span named `name`, ending it with `Ok` status.
    pub fn in_span<T, F>(&self, name: &str, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let span = self.start_span(name, Vec::new());
        let result = f();
        self.end_span(span.as_ref(), Vec::new(), Status::Ok);
        result
    }

    /// Run `f` inside a span; an `Err` is recorded as an exception and the
    /// span ends with `Error` status. The result is handed back untouched.
    pub fn in_span_result<T, E, F>(&self, name: &str, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: Error,
    {
        let span = self.start_span(name, Vec::new());
        let result = f();
        match &result {
            Ok(_) => self.end_span(span.as_ref(), Vec::new(), Status::Ok),
            Err(err) => {
                self.record_exception(span.as_ref(), err, name, Vec::new());
                self.end_span(span.as_ref(), Vec::new(), Status::Error);
            }
        }
        result
    }

    /// Export completed spans and reset the trace state.
    ///
    /// No-op when the tracer is disabled, no spans were recorded, or no
    /// trace was started. The handoff to the export pipeline is
    /// fire-and-forget; the span list, the active stack, and the trace id
    /// are cleared whether or not delivery succeeds.
    pub fn flush(&self) {
        if !self.is_enabled() {
            return;
        }
        let batch = {
            let Ok(mut state) = self.inner.state.lock() else {
                return;
            };
            if state.spans.is_empty() || state.trace_id.is_none() {
                return;
            }
            let batch: Vec<SpanData> = state
                .spans
                .iter()
                .filter(|span| span.is_completed())
                .cloned()
                .collect();
            state.spans.clear();
            state.active_stack.clear();
            state.trace_id = None;
            batch
        };
        self.inner.processor.on_flush(batch);
    }

    /// Flush, then block until buffered spans reach the exporter.
    pub fn force_flush(&self) -> Result<(), TraceError> {
        self.flush();
        self.inner.processor.force_flush()
    }

    /// Flush, then drain and release the export pipeline.
    pub fn shutdown(&self) -> Result<(), TraceError> {
        self.flush();
        self.inner.processor.shutdown()
    }
}

fn format_error_chain<E>(error: &E) -> String
where
    E: Error + ?Sized,
{
    let mut formatted = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        formatted.push_str("\ncaused by: ");
        formatted.push_str(&cause.to_string());
        source = cause.source();
    }
    formatted
}

/// Builder for [`Tracer`] wiring configuration to an export pipeline.
#[derive(Debug)]
pub struct TracerBuilder {
    config: TracerConfig,
    id_generator: Option<Box<dyn IdGenerator>>,
    processor: Option<Box<dyn ExportProcessor>>,
}

impl TracerBuilder {
    /// Use a custom id generator, e.g. a deterministic one in tests.
    pub fn with_id_generator<G>(mut self, id_generator: G) -> Self
    where
        G: IdGenerator + 'static,
    {
        self.id_generator = Some(Box::new(id_generator));
        self
    }

    /// Use a fully custom export processor.
    pub fn with_processor<P>(mut self, processor: P) -> Self
    where
        P: ExportProcessor + 'static,
    {
        self.processor = Some(Box::new(processor));
        self
    }

    /// Export inline through `exporter` on every flush.
    pub fn with_simple_exporter<E>(self, exporter: E) -> Self
    where
        E: SpanExporter + 'static,
    {
        self.with_processor(SimpleExportProcessor::new(Box::new(exporter)))
    }

    /// Export through `exporter` from a dedicated background thread.
    pub fn with_batch_exporter<E>(self, exporter: E) -> Self
    where
        E: SpanExporter + 'static,
    {
        self.with_batch_exporter_and_config(exporter, BatchConfig::default())
    }

    /// Export in the background with explicit queue bounds.
    pub fn with_batch_exporter_and_config<E>(self, exporter: E, config: BatchConfig) -> Self
    where
        E: SpanExporter + 'static,
    {
        self.with_processor(BatchExportProcessor::new(exporter, config))
    }

    /// Finish the tracer. Without an exporter the pipeline discards spans.
    pub fn build(self) -> Tracer {
        let sampler = Sampler::new(self.config.is_enabled(), self.config.sample_rate());
        Tracer {
            inner: Arc::new(TracerInner {
                sampler,
                id_generator: self
                    .id_generator
                    .unwrap_or_else(|| Box::new(RandomIdGenerator::default())),
                processor: self.processor.unwrap_or_else(|| {
                    Box::new(SimpleExportProcessor::new(Box::new(NoopSpanExporter::new())))
                }),
                state: Mutex::new(TraceState::default()),
                config: self.config,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::InMemorySpanExporter;
    use crate::value::attributes_from_json;
    use serde_json::json;
    use std::fmt;

    fn test_tracer(sample_rate: f64) -> (Tracer, InMemorySpanExporter) {
        let exporter = InMemorySpanExporter::new();
        let config = TracerConfig::builder()
            .with_api_key("test-key")
            .with_sample_rate(sample_rate)
            .build();
        let tracer = Tracer::builder(config)
            .with_simple_exporter(exporter.clone())
            .build();
        (tracer, exporter)
    }

    fn disabled_tracer() -> Tracer {
        // No API key resolves to disabled regardless of the enabled flag.
        let config = TracerConfig::builder()
            .with_api_key("")
            .with_enabled(true)
            .build();
        Tracer::builder(config).build()
    }

    #[derive(Debug)]
    struct QueryFailed;

    impl fmt::Display for QueryFailed {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "query failed: relation missing")
        }
    }

    impl Error for QueryFailed {}

    #[test]
    fn started_and_ended_span_is_exported_once() {
        let (tracer, exporter) = test_tracer(1.0);

        let root = tracer.start_trace("http-request", Vec::new(), false);
        let handle = root.clone().expect("sampled at rate 1.0");
        tracer.end_span(root.as_ref(), Vec::new(), Status::Ok);
        tracer.flush();

        let spans = exporter.finished_spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "http-request");
        assert_eq!(spans[0].trace_id, handle.trace_id);
        assert_eq!(spans[0].span_id, handle.span_id);
        assert_eq!(spans[0].parent_span_id, None);
        assert_eq!(spans[0].status, Status::Ok);
        assert!(spans[0].duration_nanos().is_some());
    }

    #[test]
    fn unended_span_is_not_exported() {
        let (tracer, exporter) = test_tracer(1.0);

        tracer.start_trace("open", Vec::new(), false);
        tracer.flush();

        assert!(exporter.finished_spans().is_empty());
        // The open span is gone with the flush, not held forever.
        assert_eq!(tracer.trace_id(), None);
    }

    #[test]
    fn nesting_follows_the_active_stack() {
        let (tracer, _exporter) = test_tracer(1.0);

        let root = tracer.start_trace("root", Vec::new(), false);
        let root_handle = root.clone().expect("sampled");
        let child = tracer.start_span("child", Vec::new());
        let child_handle = child.clone().expect("child of sampled root");

        assert_eq!(child_handle.trace_id, root_handle.trace_id);
        assert_eq!(tracer.active_span(), Some(child_handle.span_id));

        tracer.end_span(child.as_ref(), Vec::new(), Status::Ok);
        assert_eq!(tracer.active_span(), Some(root_handle.span_id));

        tracer.end_span(root.as_ref(), Vec::new(), Status::Ok);
        assert_eq!(tracer.active_span(), None);
    }

    #[test]
    fn child_spans_record_their_parent() {
        let (tracer, exporter) = test_tracer(1.0);

        let root = tracer.start_trace("root", Vec::new(), false);
        let child = tracer.start_span("child", Vec::new());
        tracer.end_span(child.as_ref(), Vec::new(), Status::Ok);
        tracer.end_span(root.as_ref(), Vec::new(), Status::Ok);
        tracer.flush();

        let spans = exporter.finished_spans();
        let root_handle = root.expect("sampled");
        let child_data = spans
            .iter()
            .find(|span| span.name == "child")
            .expect("child exported");
        assert_eq!(child_data.parent_span_id, Some(root_handle.span_id));
    }

    #[test]
    fn start_span_without_active_stack_opens_a_root() {
        let (tracer, exporter) = test_tracer(1.0);

        let span = tracer.start_span("implicit-root", Vec::new());
        assert!(span.is_some());
        assert_eq!(tracer.trace_id(), span.as_ref().map(|s| s.trace_id));

        tracer.end_span(span.as_ref(), Vec::new(), Status::Ok);
        tracer.flush();
        assert_eq!(exporter.finished_spans()[0].parent_span_id, None);
    }

    #[test]
    fn ending_out_of_order_does_not_detach_other_spans() {
        let (tracer, _exporter) = test_tracer(1.0);

        let root = tracer.start_trace("root", Vec::new(), false);
        let child = tracer.start_span("child", Vec::new());
        let child_handle = child.clone().expect("sampled");

        // Root ends first; only its own stack entry goes away.
        tracer.end_span(root.as_ref(), Vec::new(), Status::Ok);
        assert_eq!(tracer.active_span(), Some(child_handle.span_id));

        tracer.end_span(child.as_ref(), Vec::new(), Status::Ok);
        assert_eq!(tracer.active_span(), None);
    }

    #[test]
    fn end_span_tolerates_unknown_and_repeated_ends() {
        let (tracer, exporter) = test_tracer(1.0);

        let ghost = SpanHandle {
            trace_id: TraceId::from(7),
            span_id: SpanId::from(7),
            start_time_unix_nano: 0,
        };
        tracer.end_span(Some(&ghost), Vec::new(), Status::Ok);
        tracer.end_span(None, Vec::new(), Status::Ok);

        let root = tracer.start_trace("root", Vec::new(), false);
        tracer.end_span(root.as_ref(), Vec::new(), Status::Ok);
        // The second end must not clobber status or end time.
        tracer.end_span(root.as_ref(), vec![KeyValue::new("late", 1)], Status::Error);
        tracer.flush();

        let spans = exporter.finished_spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].status, Status::Ok);
        assert!(spans[0].attributes.iter().all(|kv| kv.key != "late"));
    }

    #[test]
    fn end_span_merges_final_attributes() {
        let (tracer, exporter) = test_tracer(1.0);

        let root = tracer.start_trace(
            "http-request",
            attributes_from_json(json!({ "http.method": "GET", "http.status_code": null })),
            false,
        );
        tracer.end_span(
            root.as_ref(),
            attributes_from_json(json!({ "http.status_code": 200 })),
            Status::Ok,
        );
        tracer.flush();

        let spans = exporter.finished_spans();
        let status_code = spans[0]
            .attributes
            .iter()
            .find(|kv| kv.key == "http.status_code")
            .expect("merged attribute");
        assert_eq!(status_code.value, crate::AttributeValue::Int(200));
    }

    #[test]
    fn add_event_appends_to_the_span() {
        let (tracer, exporter) = test_tracer(1.0);

        let root = tracer.start_trace("root", Vec::new(), false);
        tracer.add_event(
            root.as_ref(),
            "cache-miss",
            vec![KeyValue::new("key", "user:42")],
        );
        tracer.add_event(None, "ignored", Vec::new());
        tracer.end_span(root.as_ref(), Vec::new(), Status::Ok);
        tracer.flush();

        let spans = exporter.finished_spans();
        assert_eq!(spans[0].events.len(), 1);
        assert_eq!(spans[0].events[0].name, "cache-miss");
        assert!(spans[0].events[0].time_unix_nano > 0);
    }

    #[test]
    fn record_exception_force_creates_a_root_despite_sampling() {
        let (tracer, exporter) = test_tracer(0.0);

        // Nothing samples at rate zero...
        assert!(tracer.start_trace("dropped", Vec::new(), false).is_none());

        // ...but errors still get a span.
        let handle = tracer.record_exception(None, &QueryFailed, "db-query", Vec::new());
        let handle = handle.expect("force-sampled");
        tracer.end_span(Some(&handle), Vec::new(), Status::Error);
        tracer.flush();

        let spans = exporter.finished_spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "db-query");
        assert_eq!(spans[0].status, Status::Error);
        assert_eq!(spans[0].events.len(), 1);
        assert_eq!(spans[0].events[0].name, "exception");
    }

    #[test]
    fn record_exception_annotates_an_existing_span() {
        let (tracer, exporter) = test_tracer(1.0);

        let root = tracer.start_trace("request", Vec::new(), false);
        let returned = tracer.record_exception(root.as_ref(), &QueryFailed, "unused", Vec::new());
        assert_eq!(returned, root);

        tracer.end_span(root.as_ref(), Vec::new(), Status::Error);
        tracer.flush();

        let spans = exporter.finished_spans();
        let event = &spans[0].events[0];
        let keys: Vec<&str> = event.attributes.iter().map(|kv| kv.key.as_str()).collect();
        assert!(keys.contains(&semconv::EXCEPTION_TYPE));
        assert!(keys.contains(&semconv::EXCEPTION_MESSAGE));
        assert!(keys.contains(&semconv::EXCEPTION_STACKTRACE));

        let message = spans[0]
            .attributes
            .iter()
            .find(|kv| kv.key == semconv::ERROR_MESSAGE)
            .expect("error.message merged into span");
        assert_eq!(
            message.value,
            crate::AttributeValue::Str("query failed: relation missing".to_owned())
        );
    }

    #[test]
    fn flush_clears_trace_state() {
        let (tracer, exporter) = test_tracer(1.0);

        let root = tracer.start_trace("root", Vec::new(), false);
        tracer.end_span(root.as_ref(), Vec::new(), Status::Ok);
        assert!(tracer.trace_id().is_some());

        tracer.flush();
        assert_eq!(tracer.trace_id(), None);
        assert_eq!(tracer.active_span(), None);

        // A second flush has nothing to do and exports nothing new.
        tracer.flush();
        assert_eq!(exporter.finished_spans().len(), 1);
    }

    #[test]
    fn disabled_tracer_is_a_complete_no_op() {
        let tracer = disabled_tracer();

        assert!(!tracer.is_enabled());
        assert!(tracer.start_trace("t", Vec::new(), false).is_none());
        assert!(tracer.start_trace("t", Vec::new(), true).is_none());
        assert!(tracer.start_span("s", Vec::new()).is_none());
        assert!(tracer
            .record_exception(None, &QueryFailed, "op", Vec::new())
            .is_none());
        assert_eq!(tracer.trace_id(), None);
        tracer.flush();
    }

    #[test]
    fn in_span_result_records_errors_and_returns_them() {
        let (tracer, exporter) = test_tracer(1.0);

        let ok: Result<i32, QueryFailed> = tracer.in_span_result("works", || Ok(5));
        assert_eq!(ok.expect("closure result"), 5);

        let err: Result<(), QueryFailed> = tracer.in_span_result("fails", || Err(QueryFailed));
        assert!(err.is_err());
        tracer.flush();

        let spans = exporter.finished_spans();
        assert_eq!(spans.len(), 2);
        let failed = spans
            .iter()
            .find(|span| span.name == "fails")
            .expect("failed span exported");
        assert_eq!(failed.status, Status::Error);
        assert_eq!(failed.events.len(), 1);
        let worked = spans
            .iter()
            .find(|span| span.name == "works")
            .expect("ok span exported");
        assert_eq!(worked.status, Status::Ok);
        assert!(worked.events.is_empty());
    }

    #[test]
    fn shared_clones_see_one_trace() {
        let (tracer, exporter) = test_tracer(1.0);
        let sibling = tracer.clone();

        let root = tracer.start_trace("root", Vec::new(), false);
        let child = sibling.start_span("child", Vec::new());
        assert_eq!(
            child.as_ref().map(|c| c.trace_id),
            root.as_ref().map(|r| r.trace_id)
        );

        sibling.end_span(child.as_ref(), Vec::new(), Status::Ok);
        tracer.end_span(root.as_ref(), Vec::new(), Status::Ok);
        tracer.flush();
        assert_eq!(exporter.finished_spans().len(), 2);
    }

    #[test]
    fn deterministic_ids_with_increment_generator() {
        let exporter = InMemorySpanExporter::new();
        let config = TracerConfig::builder().with_api_key("k").build();
        let tracer = Tracer::builder(config)
            .with_id_generator(crate::IncrementIdGenerator::new())
            .with_simple_exporter(exporter.clone())
            .build();

        let root = tracer.start_trace("root", Vec::new(), false).expect("sampled");
        assert_eq!(root.trace_id, TraceId::from(1));
        assert_eq!(root.span_id, SpanId::from(2));
    }
}
