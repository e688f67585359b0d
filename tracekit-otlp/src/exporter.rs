//! Best-effort OTLP HTTP exporter.
//!
//! One POST per batch, no retries. Failures come back as [`TraceError`]
//! for the processor above to log and swallow; nothing here ever reaches
//! the host request.

use crate::payload::{build_trace_payload, validate_payload_structure};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;
use tracekit::{SpanData, SpanExporter, TraceError, TracerConfig};

/// Header carrying the collector API key (`X-API-Key` on the wire).
pub const API_KEY_HEADER: &str = "x-api-key";

/// Default wait for the collector to accept a batch.
pub const DEFAULT_EXPORT_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends OTLP JSON trace payloads to a collector endpoint.
#[derive(Debug)]
pub struct OtlpHttpExporter {
    client: reqwest::blocking::Client,
    endpoint: String,
    headers: HeaderMap,
    service_name: String,
}

impl OtlpHttpExporter {
    /// Start building an exporter.
    pub fn builder() -> OtlpHttpExporterBuilder {
        OtlpHttpExporterBuilder::default()
    }

    /// Build an exporter wired from resolved tracer configuration.
    pub fn from_config(config: &TracerConfig) -> Result<Self, TraceError> {
        Self::builder()
            .with_endpoint(config.endpoint())
            .with_api_key(config.api_key())
            .with_service_name(config.service_name())
            .build()
    }

    /// The endpoint this exporter POSTs to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl SpanExporter for OtlpHttpExporter {
    fn export(&mut self, batch: Vec<SpanData>) -> Result<(), TraceError> {
        let Some(payload) = build_trace_payload(&self.service_name, &batch) else {
            tracing::debug!("no completed spans in batch, nothing to send");
            return Ok(());
        };
        let Some(summary) = validate_payload_structure(&payload) else {
            return Err(TraceError::InvalidPayload(
                "missing resourceSpans/scopeSpans/spans",
            ));
        };

        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .json(&payload)
            .send()
            .map_err(|err| TraceError::ExportFailed(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TraceError::ExportFailed(format!(
                "collector returned {status}"
            )));
        }
        tracing::debug!(
            spans = summary.span_count,
            service = summary.service_name.as_deref().unwrap_or_default(),
            "trace batch delivered"
        );
        Ok(())
    }
}

/// Builder for [`OtlpHttpExporter`].
#[derive(Debug, Default)]
pub struct OtlpHttpExporterBuilder {
    endpoint: Option<String>,
    api_key: Option<String>,
    service_name: Option<String>,
    timeout: Option<Duration>,
}

impl OtlpHttpExporterBuilder {
    /// Set the collector endpoint URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the API key sent with every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the service name reported in the resource attributes.
    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = Some(service_name.into());
        self
    }

    /// Set the request timeout, the only delivery bound there is.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the exporter and its HTTP client.
    pub fn build(self) -> Result<OtlpHttpExporter, TraceError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(api_key) = self.api_key.filter(|key| !key.is_empty()) {
            let value = HeaderValue::from_str(&api_key).map_err(|_| {
                TraceError::Internal("API key is not a valid header value".to_owned())
            })?;
            headers.insert(HeaderName::from_static(API_KEY_HEADER), value);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_EXPORT_TIMEOUT))
            .build()
            .map_err(|err| TraceError::Internal(format!("failed to build HTTP client: {err}")))?;

        Ok(OtlpHttpExporter {
            client,
            endpoint: self
                .endpoint
                .unwrap_or_else(|| tracekit::config::DEFAULT_ENDPOINT.to_owned()),
            headers,
            service_name: self
                .service_name
                .unwrap_or_else(|| tracekit::config::DEFAULT_SERVICE_NAME.to_owned()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_falls_back_to_config_defaults() {
        let exporter = OtlpHttpExporter::builder().build().expect("build");
        assert_eq!(exporter.endpoint(), tracekit::config::DEFAULT_ENDPOINT);
        assert_eq!(exporter.service_name, tracekit::config::DEFAULT_SERVICE_NAME);
        // No API key, no header.
        assert!(!exporter.headers.contains_key(API_KEY_HEADER));
    }

    #[test]
    fn from_config_copies_endpoint_key_and_service() {
        let config = TracerConfig::builder()
            .with_api_key("secret")
            .with_endpoint("http://127.0.0.1:4318/v1/traces")
            .with_service_name("checkout")
            .build();
        let exporter = OtlpHttpExporter::from_config(&config).expect("build");
        assert_eq!(exporter.endpoint(), "http://127.0.0.1:4318/v1/traces");
        assert_eq!(exporter.service_name, "checkout");
        assert_eq!(
            exporter
                .headers
                .get(API_KEY_HEADER)
                .and_then(|value| value.to_str().ok()),
            Some("secret")
        );
    }

    #[test]
    fn control_characters_in_api_key_are_rejected() {
        let result = OtlpHttpExporter::builder().with_api_key("bad\nkey").build();
        assert!(result.is_err());
    }
}
