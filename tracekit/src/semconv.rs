//! Attribute keys exchanged with the host layers.
//!
//! A trimmed-down set of the OpenTelemetry semantic conventions this
//! tracer and its collaborators actually use. The HTTP keys are supplied
//! by the request/response layer; the exception and error keys are written
//! by the tracer itself.

/// Logical name of the service emitting spans, attached once per batch.
pub const SERVICE_NAME: &str = "service.name";

/// HTTP request method.
pub const HTTP_METHOD: &str = "http.method";

/// Full request URL.
pub const HTTP_URL: &str = "http.url";

/// Value of the `User-Agent` request header.
pub const HTTP_USER_AGENT: &str = "http.user_agent";

/// Matched route template, lower cardinality than the URL.
pub const HTTP_ROUTE: &str = "http.route";

/// HTTP response status code.
pub const HTTP_STATUS_CODE: &str = "http.status_code";

/// Error message reported in the span status of failed spans.
pub const ERROR_MESSAGE: &str = "error.message";

/// Concrete type of a recorded error.
pub const EXCEPTION_TYPE: &str = "exception.type";

/// Message of a recorded error.
pub const EXCEPTION_MESSAGE: &str = "exception.message";

/// Formatted cause chain of a recorded error.
pub const EXCEPTION_STACKTRACE: &str = "exception.stacktrace";
