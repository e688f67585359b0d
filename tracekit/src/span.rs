//! # Span
//!
//! A span is one timed, named operation. Spans nest to form a trace tree:
//! each trace contains a root span, which typically describes the
//! end-to-end latency of a request, plus sub-spans for its sub-operations.
//!
//! A span's start time is set on creation; the end time stays unset until
//! the span is ended, and only ended spans are eligible for export.

use crate::value::KeyValue;
use std::fmt;

/// A 16-byte value which identifies a given trace.
///
/// Renders as 32 lowercase hex characters. The id is valid if it contains
/// at least one non-zero byte.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(u128);

impl TraceId {
    /// Invalid trace id.
    pub const INVALID: TraceId = TraceId(0);

    /// Create a trace id from its representation as a byte array.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        TraceId(u128::from_be_bytes(bytes))
    }

    /// Return the representation of this trace id as a byte array.
    pub const fn to_bytes(self) -> [u8; 16] {
        self.0.to_be_bytes()
    }
}

impl From<u128> for TraceId {
    fn from(value: u128) -> Self {
        TraceId(value)
    }
}

impl fmt::Debug for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:032x}", self.0))
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:032x}", self.0))
    }
}

/// An 8-byte value which identifies a given span within a trace.
///
/// Renders as 16 lowercase hex characters. The id is valid if it contains
/// at least one non-zero byte.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId(u64);

impl SpanId {
    /// Invalid span id.
    pub const INVALID: SpanId = SpanId(0);

    /// Create a span id from its representation as a byte array.
    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        SpanId(u64::from_be_bytes(bytes))
    }

    /// Return the representation of this span id as a byte array.
    pub const fn to_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl From<u64> for SpanId {
    fn from(value: u64) -> Self {
        SpanId(value)
    }
}

impl fmt::Debug for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:016x}", self.0))
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:016x}", self.0))
    }
}

/// Role classification of a span within a trace.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpanKind {
    /// Unspecified kind; collectors usually treat it as internal.
    Unspecified,
    /// An operation internal to the application.
    #[default]
    Internal,
    /// Handling of a synchronous request from a remote caller.
    Server,
    /// An outgoing synchronous request to a remote service.
    Client,
    /// Scheduling of an operation picked up later, e.g. enqueueing a job.
    Producer,
    /// Processing of an operation scheduled by a producer.
    Consumer,
}

impl SpanKind {
    /// OTLP integer encoding of this kind.
    pub fn as_otlp(self) -> u32 {
        match self {
            SpanKind::Unspecified => 0,
            SpanKind::Internal => 1,
            SpanKind::Server => 2,
            SpanKind::Client => 3,
            SpanKind::Producer => 4,
            SpanKind::Consumer => 5,
        }
    }

    /// Decode an OTLP kind integer, coercing out-of-range values to
    /// [`SpanKind::Internal`].
    pub fn from_otlp(value: u32) -> Self {
        match value {
            0 => SpanKind::Unspecified,
            1 => SpanKind::Internal,
            2 => SpanKind::Server,
            3 => SpanKind::Client,
            4 => SpanKind::Producer,
            5 => SpanKind::Consumer,
            _ => SpanKind::Internal,
        }
    }
}

/// Outcome recorded on a span.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Status {
    /// The operation completed as expected.
    #[default]
    Ok,
    /// The operation contains an error.
    Error,
}

/// A timed annotation attached to exactly one span, append-only.
#[derive(Clone, Debug, PartialEq)]
pub struct SpanEvent {
    /// Event name.
    pub name: String,
    /// Wall-clock time of the event in nanoseconds since the Unix epoch.
    pub time_unix_nano: u64,
    /// Event attributes.
    pub attributes: Vec<KeyValue>,
}

/// Everything recorded about a single span; the standard exporter input.
#[derive(Clone, Debug, PartialEq)]
pub struct SpanData {
    /// Trace this span belongs to.
    pub trace_id: TraceId,
    /// Id of this span, unique within the trace.
    pub span_id: SpanId,
    /// Id of the enclosing span, `None` for trace roots.
    pub parent_span_id: Option<SpanId>,
    /// Span name.
    pub name: String,
    /// Span kind.
    pub kind: SpanKind,
    /// Start time in nanoseconds since the Unix epoch.
    pub start_time_unix_nano: u64,
    /// End time, set when the span ends. Spans without it are still open
    /// and not eligible for export.
    pub end_time_unix_nano: Option<u64>,
    /// Span attributes.
    pub attributes: Vec<KeyValue>,
    /// Span events.
    pub events: Vec<SpanEvent>,
    /// Span status.
    pub status: Status,
}

impl SpanData {
    /// Nanoseconds between start and end, `None` while the span is open.
    pub fn duration_nanos(&self) -> Option<u64> {
        self.end_time_unix_nano
            .map(|end| end.saturating_sub(self.start_time_unix_nano))
    }

    /// Whether the span has ended and is eligible for export.
    pub fn is_completed(&self) -> bool {
        self.end_time_unix_nano.is_some()
    }
}

/// Identifiers handed back by span-creation calls.
///
/// Annotation calls take the handle to locate the span they operate on.
/// Creation returns `None` instead of a handle when the trace is not
/// sampled or the tracer is disabled; every annotation call accepts that
/// as a valid no-op, so callers never need to branch on it.
#[derive(Clone, Debug, PartialEq)]
pub struct SpanHandle {
    /// Trace the span belongs to.
    pub trace_id: TraceId,
    /// Id of the span.
    pub span_id: SpanId,
    /// Start time in nanoseconds since the Unix epoch.
    pub start_time_unix_nano: u64,
}
