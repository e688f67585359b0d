//! Tracer configuration.
//!
//! Every setting resolves through the same precedence chain: an explicit
//! value given to the builder, then the primary environment variable, then
//! (for the request-body flag only) a legacy secondary variable, then a
//! hard-coded default. The resolved [`TracerConfig`] is immutable.

use std::env;

/// API key presented to the collector. Tracing is force-disabled when this
/// resolves to empty, since nothing could be delivered anyway.
pub const TRACEKIT_API_KEY: &str = "TRACEKIT_API_KEY";
/// Logical service name attached to every exported batch.
pub const TRACEKIT_SERVICE_NAME: &str = "TRACEKIT_SERVICE_NAME";
/// Collector endpoint URL traces are POSTed to.
pub const TRACEKIT_ENDPOINT: &str = "TRACEKIT_ENDPOINT";
/// Master switch for the tracer.
pub const TRACEKIT_ENABLED: &str = "TRACEKIT_ENABLED";
/// Fraction of traces to record, in `[0, 1]`.
pub const TRACEKIT_SAMPLE_RATE: &str = "TRACEKIT_SAMPLE_RATE";
/// Whether response bodies should be captured as span attributes.
pub const TRACEKIT_TRACE_RESPONSE: &str = "TRACEKIT_TRACE_RESPONSE";
/// Whether executed database queries should be captured.
pub const TRACEKIT_TRACE_DB_QUERY: &str = "TRACEKIT_TRACE_DB_QUERY";
/// Whether request bodies should be captured.
pub const TRACEKIT_TRACE_REQUEST_BODY: &str = "TRACEKIT_TRACE_REQUEST_BODY";
/// Legacy spelling of [`TRACEKIT_TRACE_REQUEST_BODY`], still honored as a
/// fallback for deployments configured before the rename.
pub const TRACEKIT_TRACE_RESPONSE_BODY: &str = "TRACEKIT_TRACE_RESPONSE_BODY";

/// Service name used when none is configured.
pub const DEFAULT_SERVICE_NAME: &str = "gemvc-app";
/// Collector endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://app.tracekit.dev/v1/traces";

const DEFAULT_SAMPLE_RATE: f64 = 1.0;

/// Resolved, immutable tracer configuration.
#[derive(Clone, Debug)]
pub struct TracerConfig {
    api_key: String,
    service_name: String,
    endpoint: String,
    enabled: bool,
    sample_rate: f64,
    trace_response: bool,
    trace_db_query: bool,
    trace_request_body: bool,
}

impl TracerConfig {
    /// Start building a configuration. Settings not given explicitly
    /// resolve from the environment and then from defaults.
    pub fn builder() -> TracerConfigBuilder {
        TracerConfigBuilder::default()
    }

    /// Resolve a configuration purely from the environment and defaults.
    pub fn from_env() -> Self {
        Self::builder().build()
    }

    /// Whether the tracer records and exports anything at all.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// API key sent with every export request.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Logical service name attached to exported batches.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Collector endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fraction of traces recorded, in `[0, 1]`.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Sample rate as a percentage in `[0, 100]`.
    pub fn sample_rate_percent(&self) -> f64 {
        self.sample_rate * 100.0
    }

    /// Whether response bodies should be captured as span attributes.
    pub fn should_trace_response(&self) -> bool {
        self.trace_response
    }

    /// Whether executed database queries should be captured.
    pub fn should_trace_db_query(&self) -> bool {
        self.trace_db_query
    }

    /// Whether request bodies should be captured.
    pub fn should_trace_request_body(&self) -> bool {
        self.trace_request_body
    }
}

/// Builder for [`TracerConfig`] taking strongly typed explicit values.
///
/// Only environment values go through the permissive string parsers;
/// whatever is set here wins over the environment.
#[derive(Clone, Debug, Default)]
pub struct TracerConfigBuilder {
    api_key: Option<String>,
    service_name: Option<String>,
    endpoint: Option<String>,
    enabled: Option<bool>,
    sample_rate: Option<f64>,
    trace_response: Option<bool>,
    trace_db_query: Option<bool>,
    trace_request_body: Option<bool>,
}

impl TracerConfigBuilder {
    /// Set the collector API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the logical service name.
    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = Some(service_name.into());
        self
    }

    /// Set the collector endpoint URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Enable or disable the tracer. An empty API key still disables it.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Set the sample rate; values outside `[0, 1]` are clamped.
    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }

    /// Capture response bodies as span attributes.
    pub fn with_trace_response(mut self, trace_response: bool) -> Self {
        self.trace_response = Some(trace_response);
        self
    }

    /// Capture executed database queries.
    pub fn with_trace_db_query(mut self, trace_db_query: bool) -> Self {
        self.trace_db_query = Some(trace_db_query);
        self
    }

    /// Capture request bodies.
    pub fn with_trace_request_body(mut self, trace_request_body: bool) -> Self {
        self.trace_request_body = Some(trace_request_body);
        self
    }

    /// Resolve every setting and freeze the configuration.
    ///
    /// `enabled` becomes false unconditionally when the API key resolves
    /// to empty, regardless of an explicit enabled flag.
    pub fn build(self) -> TracerConfig {
        let api_key = self
            .api_key
            .or_else(|| env_string(TRACEKIT_API_KEY))
            .unwrap_or_default();
        let service_name = self
            .service_name
            .or_else(|| env_string(TRACEKIT_SERVICE_NAME))
            .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_owned());
        let endpoint = self
            .endpoint
            .or_else(|| env_string(TRACEKIT_ENDPOINT))
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned());
        let sample_rate = self
            .sample_rate
            .map(clamp_sample_rate)
            .or_else(|| env::var(TRACEKIT_SAMPLE_RATE).ok().map(|raw| parse_sample_rate(&raw)))
            .unwrap_or(DEFAULT_SAMPLE_RATE);
        let enabled = self
            .enabled
            .or_else(|| env_bool(TRACEKIT_ENABLED))
            .unwrap_or(true);
        let trace_response = self
            .trace_response
            .or_else(|| env_bool(TRACEKIT_TRACE_RESPONSE))
            .unwrap_or(false);
        let trace_db_query = self
            .trace_db_query
            .or_else(|| env_bool(TRACEKIT_TRACE_DB_QUERY))
            .unwrap_or(false);
        let trace_request_body = self
            .trace_request_body
            .or_else(|| env_bool(TRACEKIT_TRACE_REQUEST_BODY))
            .or_else(|| env_bool(TRACEKIT_TRACE_RESPONSE_BODY))
            .unwrap_or(false);

        TracerConfig {
            enabled: enabled && !api_key.is_empty(),
            api_key,
            service_name,
            endpoint,
            sample_rate,
            trace_response,
            trace_db_query,
            trace_request_body,
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
    env::var(name).ok().map(|raw| parse_bool(&raw))
}

/// Permissive boolean parsing: `1`/`true` and `0`/`false` are exact
/// (case-insensitive), any other non-empty value counts as true.
fn parse_bool(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false"
    )
}

fn parse_sample_rate(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .map(clamp_sample_rate)
        .unwrap_or(DEFAULT_SAMPLE_RATE)
}

fn clamp_sample_rate(rate: f64) -> f64 {
    if rate.is_finite() {
        rate.clamp(0.0, 1.0)
    } else {
        DEFAULT_SAMPLE_RATE
    }
}
