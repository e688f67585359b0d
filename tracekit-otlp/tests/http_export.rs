//! Exporter behavior against a local collector stub.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracekit::{KeyValue, SpanData, SpanExporter, SpanId, SpanKind, Status, TraceError, TraceId};
use tracekit_otlp::OtlpHttpExporter;

struct CapturedRequest {
    request_line: String,
    api_key: Option<String>,
    body: serde_json::Value,
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn header_value(headers: &str, name: &str) -> Option<String> {
    headers.lines().find_map(|line| {
        let (header, value) = line.split_once(':')?;
        if header.eq_ignore_ascii_case(name) {
            Some(value.trim().to_owned())
        } else {
            None
        }
    })
}

/// Accept one request, capture it, and answer with `status_line`.
fn spawn_collector(status_line: &'static str) -> (String, mpsc::Receiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind collector stub");
    let addr = listener.local_addr().expect("local addr");
    let (sender, receiver) = mpsc::channel();

    thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 4096];
        let header_end = loop {
            match stream.read(&mut chunk) {
                Ok(0) | Err(_) => return,
                Ok(read) => {
                    buffer.extend_from_slice(&chunk[..read]);
                    if let Some(position) = find_subsequence(&buffer, b"\r\n\r\n") {
                        break position + 4;
                    }
                }
            }
        };
        let headers = String::from_utf8_lossy(&buffer[..header_end]).to_string();
        let content_length = header_value(&headers, "content-length")
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(0);
        while buffer.len() < header_end + content_length {
            match stream.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(read) => buffer.extend_from_slice(&chunk[..read]),
            }
        }
        let body = serde_json::from_slice(&buffer[header_end..header_end + content_length])
            .unwrap_or(serde_json::Value::Null);
        let _ = sender.send(CapturedRequest {
            request_line: headers.lines().next().unwrap_or_default().to_owned(),
            api_key: header_value(&headers, "x-api-key"),
            body,
        });
        let response = format!("{status_line}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.flush();
    });

    (format!("http://{addr}/v1/traces"), receiver)
}

fn completed_span(name: &str) -> SpanData {
    SpanData {
        trace_id: TraceId::from(0xaaaa),
        span_id: SpanId::from(0xbbbb),
        parent_span_id: None,
        name: name.to_owned(),
        kind: SpanKind::Client,
        start_time_unix_nano: 1_000,
        end_time_unix_nano: Some(2_000),
        attributes: vec![KeyValue::new("peer.service", "billing")],
        events: Vec::new(),
        status: Status::Ok,
    }
}

#[test]
fn posts_payload_with_api_key_header() {
    let (endpoint, received) = spawn_collector("HTTP/1.1 200 OK");
    let mut exporter = OtlpHttpExporter::builder()
        .with_endpoint(&endpoint)
        .with_api_key("secret")
        .with_service_name("checkout")
        .with_timeout(Duration::from_secs(5))
        .build()
        .expect("exporter");

    exporter
        .export(vec![completed_span("outbound")])
        .expect("export succeeds against 200");

    let request = received
        .recv_timeout(Duration::from_secs(5))
        .expect("request captured");
    assert!(request.request_line.starts_with("POST /v1/traces"));
    assert_eq!(request.api_key.as_deref(), Some("secret"));

    let span = &request.body["resourceSpans"][0]["scopeSpans"][0]["spans"][0];
    assert_eq!(span["name"], "outbound");
    assert_eq!(span["kind"], 3);
    assert_eq!(
        request.body["resourceSpans"][0]["resource"]["attributes"][0]["value"]["stringValue"],
        "checkout"
    );
}

#[test]
fn non_success_response_reports_export_failed() {
    let (endpoint, _received) = spawn_collector("HTTP/1.1 500 Internal Server Error");
    let mut exporter = OtlpHttpExporter::builder()
        .with_endpoint(&endpoint)
        .with_api_key("secret")
        .with_timeout(Duration::from_secs(5))
        .build()
        .expect("exporter");

    let result = exporter.export(vec![completed_span("rejected")]);
    assert!(matches!(result, Err(TraceError::ExportFailed(_))));
}

#[test]
fn unreachable_collector_reports_export_failed() {
    // Grab a port and release it again, so nothing is listening there.
    let endpoint = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        format!("http://{}/v1/traces", listener.local_addr().expect("addr"))
    };
    let mut exporter = OtlpHttpExporter::builder()
        .with_endpoint(endpoint)
        .with_api_key("secret")
        .with_timeout(Duration::from_secs(2))
        .build()
        .expect("exporter");

    let result = exporter.export(vec![completed_span("lost")]);
    assert!(matches!(result, Err(TraceError::ExportFailed(_))));
}

#[test]
fn batch_without_completed_spans_sends_nothing() {
    let mut open = completed_span("open");
    open.end_time_unix_nano = None;

    // Default endpoint, but no request ever leaves the process.
    let mut exporter = OtlpHttpExporter::builder().build().expect("exporter");
    exporter.export(Vec::new()).expect("empty batch is fine");
    exporter.export(vec![open]).expect("open spans are skipped");
}
