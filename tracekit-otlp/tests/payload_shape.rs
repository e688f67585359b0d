//! End-to-end: record through the tracer, build the wire payload, and
//! check the JSON the collector would receive.

use serde_json::json;
use tracekit::{
    attributes_from_json, IncrementIdGenerator, InMemorySpanExporter, Status, Tracer, TracerConfig,
};
use tracekit_otlp::{build_trace_payload, validate_payload_structure};

fn recording_tracer(exporter: InMemorySpanExporter) -> Tracer {
    let config = TracerConfig::builder()
        .with_api_key("k")
        .with_service_name("gemvc-app")
        .with_sample_rate(1.0)
        .build();
    Tracer::builder(config)
        .with_id_generator(IncrementIdGenerator::new())
        .with_simple_exporter(exporter)
        .build()
}

#[test]
fn recorded_request_serializes_to_one_otlp_span() {
    let exporter = InMemorySpanExporter::new();
    let tracer = recording_tracer(exporter.clone());

    let span = tracer.start_trace(
        "http-request",
        attributes_from_json(json!({ "http.method": "GET" })),
        false,
    );
    tracer.end_span(
        span.as_ref(),
        attributes_from_json(json!({ "http.status_code": 200 })),
        Status::Ok,
    );
    tracer.flush();

    let finished = exporter.finished_spans();
    let payload = build_trace_payload("gemvc-app", &finished).expect("payload");
    let summary = validate_payload_structure(&payload).expect("valid");
    assert_eq!(summary.span_count, 1);
    assert_eq!(summary.service_name.as_deref(), Some("gemvc-app"));

    let json = serde_json::to_value(&payload).expect("serializable");
    let span = &json["resourceSpans"][0]["scopeSpans"][0]["spans"][0];

    assert_eq!(span["name"], "http-request");
    assert_eq!(span["kind"], 1);
    assert_eq!(span["traceId"], "00000000000000000000000000000001");
    assert_eq!(span["spanId"], "0000000000000002");
    assert!(span.get("parentSpanId").is_none());
    assert_eq!(span["status"]["code"], "STATUS_CODE_OK");

    let attributes = span["attributes"].as_array().expect("attribute list");
    let status_code = attributes
        .iter()
        .find(|kv| kv["key"] == "http.status_code")
        .expect("status code attribute");
    assert_eq!(status_code["value"]["stringValue"], "200");

    let resource = &json["resourceSpans"][0]["resource"]["attributes"][0];
    assert_eq!(resource["key"], "service.name");
    assert_eq!(resource["value"]["stringValue"], "gemvc-app");
}

#[test]
fn open_spans_never_reach_the_wire() {
    let exporter = InMemorySpanExporter::new();
    let tracer = recording_tracer(exporter.clone());

    tracer.start_trace("left-open", Vec::new(), false);
    tracer.flush();

    assert!(build_trace_payload("gemvc-app", &exporter.finished_spans()).is_none());
}
