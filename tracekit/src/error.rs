use thiserror::Error;

/// Errors surfaced by the export pipeline.
///
/// Span recording operations never return these. They come out of the
/// explicitly fallible plumbing (`force_flush`, `shutdown`, `export`) for
/// hosts that want to block on delivery; everything on the request path
/// logs and swallows them instead.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TraceError {
    /// The exporter failed to deliver a batch.
    #[error("span export failed: {0}")]
    ExportFailed(String),

    /// The trace payload failed structural validation before send.
    #[error("invalid trace payload: {0}")]
    InvalidPayload(&'static str),

    /// The export pipeline was already shut down.
    #[error("export pipeline already shut down")]
    AlreadyShutdown,

    /// The background exporter did not acknowledge in time.
    #[error("export pipeline did not respond within {0:?}")]
    Timeout(std::time::Duration),

    /// Other errors propagated from the pipeline internals.
    #[error("{0}")]
    Internal(String),
}
