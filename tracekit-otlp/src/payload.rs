//! OTLP JSON trace payload construction.
//!
//! The wire shape follows the OTLP/HTTP JSON encoding: every qualifying
//! span nests under a single resource (carrying the service name) and a
//! single instrumentation scope. Attribute values are flattened to
//! `stringValue` pairs: strings pass through, numbers and bools stringify,
//! anything without a scalar form is blanked.

use serde::Serialize;
use tracekit::{semconv, AttributeValue, KeyValue, SpanData, SpanEvent, Status};

/// Instrumentation scope name reported with every batch.
const SCOPE_NAME: &str = "tracekit";
const SCOPE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Status code reported for spans that completed as expected.
pub const STATUS_CODE_OK: &str = "STATUS_CODE_OK";
/// Status code reported for failed spans.
pub const STATUS_CODE_ERROR: &str = "STATUS_CODE_ERROR";

/// Message reported for failed spans carrying no `error.message` attribute.
const DEFAULT_ERROR_MESSAGE: &str = "Error";

/// Name substituted for events recorded without one.
const DEFAULT_EVENT_NAME: &str = "event";

/// Top-level OTLP trace payload.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TracePayload {
    /// Spans grouped under their producing resource.
    pub resource_spans: Vec<ResourceSpans>,
}

/// Spans produced by one resource.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpans {
    /// The producing resource, identified by its attributes.
    pub resource: Resource,
    /// Spans grouped under their instrumentation scope.
    pub scope_spans: Vec<ScopeSpans>,
}

/// Entity that produced the spans, e.g. one service instance.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Resource attributes, attached once per batch rather than per span.
    pub attributes: Vec<OtlpKeyValue>,
}

/// Spans produced by one instrumentation scope.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeSpans {
    /// The producing scope.
    pub scope: Scope,
    /// The span records themselves.
    pub spans: Vec<OtlpSpan>,
}

/// Instrumentation scope identification.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    /// Scope name.
    pub name: String,
    /// Scope version.
    pub version: String,
}

/// One span on the wire.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtlpSpan {
    /// Trace id as 32 lowercase hex characters.
    pub trace_id: String,
    /// Span id as 16 lowercase hex characters.
    pub span_id: String,
    /// Enclosing span id, omitted for trace roots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,
    /// Span name.
    pub name: String,
    /// OTLP kind integer.
    pub kind: u32,
    /// Start time as a decimal string of Unix nanoseconds.
    pub start_time_unix_nano: String,
    /// End time as a decimal string of Unix nanoseconds.
    pub end_time_unix_nano: String,
    /// Flattened span attributes.
    pub attributes: Vec<OtlpKeyValue>,
    /// Span events, omitted when empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<OtlpEvent>,
    /// Span status.
    pub status: OtlpStatus,
}

/// One span event on the wire.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtlpEvent {
    /// Event name, never empty.
    pub name: String,
    /// Event time as a decimal string of Unix nanoseconds.
    pub time_unix_nano: String,
    /// Flattened event attributes.
    pub attributes: Vec<OtlpKeyValue>,
}

/// Attribute pair on the wire.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtlpKeyValue {
    /// Attribute key.
    pub key: String,
    /// Attribute value, always string-typed.
    pub value: OtlpAnyValue,
}

/// String-typed attribute value.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtlpAnyValue {
    /// The flattened value.
    pub string_value: String,
}

/// Span outcome on the wire.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtlpStatus {
    /// `STATUS_CODE_OK` or `STATUS_CODE_ERROR`.
    pub code: &'static str,
    /// Error description, empty for successful spans.
    pub message: String,
}

/// Diagnostic view of a payload that passed structural validation.
#[derive(Clone, Debug, PartialEq)]
pub struct PayloadSummary {
    /// Total spans across all resource groups.
    pub span_count: usize,
    /// Service name from the first resource, when present.
    pub service_name: Option<String>,
}

/// Build the OTLP payload for `spans`, keeping only completed spans.
///
/// Returns `None` when nothing is exportable, which the transport treats
/// as "nothing to send" rather than an error.
pub fn build_trace_payload(service_name: &str, spans: &[SpanData]) -> Option<TracePayload> {
    let spans: Vec<OtlpSpan> = spans
        .iter()
        .filter(|span| span.is_completed())
        .map(otlp_span)
        .collect();
    if spans.is_empty() {
        return None;
    }
    Some(TracePayload {
        resource_spans: vec![ResourceSpans {
            resource: Resource {
                attributes: vec![OtlpKeyValue {
                    key: semconv::SERVICE_NAME.to_owned(),
                    value: OtlpAnyValue {
                        string_value: service_name.to_owned(),
                    },
                }],
            },
            scope_spans: vec![ScopeSpans {
                scope: Scope {
                    name: SCOPE_NAME.to_owned(),
                    version: SCOPE_VERSION.to_owned(),
                },
                spans,
            }],
        }],
    })
}

/// Defensively check that `resourceSpans[0].scopeSpans[0].spans[]` is
/// present and non-empty.
///
/// `None` means the payload must not be sent. The summary feeds transport
/// diagnostics, e.g. the service name in export logs.
pub fn validate_payload_structure(payload: &TracePayload) -> Option<PayloadSummary> {
    let first_resource = payload.resource_spans.first()?;
    let first_scope = first_resource.scope_spans.first()?;
    if first_scope.spans.is_empty() {
        return None;
    }
    let span_count = payload
        .resource_spans
        .iter()
        .flat_map(|resource| resource.scope_spans.iter())
        .map(|scope| scope.spans.len())
        .sum();
    let service_name = first_resource
        .resource
        .attributes
        .iter()
        .find(|kv| kv.key == semconv::SERVICE_NAME)
        .map(|kv| kv.value.string_value.clone());
    Some(PayloadSummary {
        span_count,
        service_name,
    })
}

fn otlp_span(span: &SpanData) -> OtlpSpan {
    OtlpSpan {
        trace_id: span.trace_id.to_string(),
        span_id: span.span_id.to_string(),
        parent_span_id: span.parent_span_id.map(|id| id.to_string()),
        name: span.name.clone(),
        kind: span.kind.as_otlp(),
        start_time_unix_nano: span.start_time_unix_nano.to_string(),
        end_time_unix_nano: span.end_time_unix_nano.unwrap_or(0).to_string(),
        attributes: span.attributes.iter().map(otlp_attribute).collect(),
        events: span.events.iter().map(otlp_event).collect(),
        status: otlp_status(span),
    }
}

fn otlp_attribute(kv: &KeyValue) -> OtlpKeyValue {
    let string_value = match &kv.value {
        AttributeValue::Str(value) => value.clone(),
        AttributeValue::Int(value) => value.to_string(),
        AttributeValue::Float(value) => value.to_string(),
        AttributeValue::Bool(value) => value.to_string(),
        AttributeValue::Array(_) => String::new(),
    };
    OtlpKeyValue {
        key: kv.key.clone(),
        value: OtlpAnyValue { string_value },
    }
}

fn otlp_event(event: &SpanEvent) -> OtlpEvent {
    let name = if event.name.is_empty() {
        DEFAULT_EVENT_NAME.to_owned()
    } else {
        event.name.clone()
    };
    OtlpEvent {
        name,
        time_unix_nano: event.time_unix_nano.to_string(),
        attributes: event.attributes.iter().map(otlp_attribute).collect(),
    }
}

fn otlp_status(span: &SpanData) -> OtlpStatus {
    match span.status {
        Status::Ok => OtlpStatus {
            code: STATUS_CODE_OK,
            message: String::new(),
        },
        Status::Error => {
            let message = span
                .attributes
                .iter()
                .find(|kv| kv.key == semconv::ERROR_MESSAGE)
                .and_then(|kv| match &kv.value {
                    AttributeValue::Str(value) if !value.is_empty() => Some(value.clone()),
                    _ => None,
                })
                .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_owned());
            OtlpStatus {
                code: STATUS_CODE_ERROR,
                message,
            }
        }
    }
}
