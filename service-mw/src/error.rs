use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MwError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("Telemetry error: {0}")]
    TelemetryError(String),
}

impl From<opentelemetry::trace::TraceError> for MwError {
    fn from(err: opentelemetry::trace::TraceError) -> Self {
        MwError::TelemetryError(err.to_string())
    }
}

impl From<tracing_subscriber::util::TryInitError> for MwError {
    fn from(err: tracing_subscriber::util::TryInitError) -> Self {
        MwError::TelemetryError(err.to_string())
    }
}

/// Errors that can be reported by the logging middleware.
///
/// Every error exposes its message through `Display`. Error types that
/// capture a stack trace also return it from [`StackTracer::stack_trace`];
/// the default reports none.
pub trait StackTracer: fmt::Display {
    fn stack_trace(&self) -> Option<&Backtrace> {
        None
    }
}

impl StackTracer for MwError {}

impl StackTracer for tonic::Status {}

impl StackTracer for std::io::Error {}

impl StackTracer for String {}

impl StackTracer for Box<dyn std::error::Error + Send + Sync> {}

impl StackTracer for anyhow::Error {
    fn stack_trace(&self) -> Option<&Backtrace> {
        let trace = self.backtrace();
        (trace.status() == BacktraceStatus::Captured).then_some(trace)
    }
}

/// Wraps an error together with the stack trace of the point it was created.
///
/// The trace is always captured, regardless of `RUST_BACKTRACE`.
pub struct Traced<E> {
    inner: E,
    trace: Backtrace,
}

impl<E> Traced<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            trace: Backtrace::force_capture(),
        }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn into_inner(self) -> E {
        self.inner
    }
}

impl<E> From<E> for Traced<E> {
    fn from(inner: E) -> Self {
        Self::new(inner)
    }
}

impl<E: fmt::Display> fmt::Display for Traced<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl<E: fmt::Debug> fmt::Debug for Traced<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Traced")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<E: std::error::Error> std::error::Error for Traced<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

impl<E: fmt::Display> StackTracer for Traced<E> {
    fn stack_trace(&self) -> Option<&Backtrace> {
        Some(&self.trace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traced_keeps_message_and_trace() {
        let err = Traced::new(std::io::Error::other("disk full"));
        assert_eq!(err.to_string(), "disk full");
        assert!(err.stack_trace().is_some());
        assert_eq!(err.into_inner().kind(), std::io::ErrorKind::Other);
    }

    #[test]
    fn test_status_has_no_trace() {
        let status = tonic::Status::not_found("order not found");
        assert!(status.stack_trace().is_none());
        assert!(status.to_string().contains("order not found"));
    }

    #[test]
    fn test_config_error_conversion() {
        let err: MwError = config::ConfigError::Message("bad value".to_string()).into();
        assert!(matches!(err, MwError::ConfigError(_)));
        assert!(err.to_string().contains("bad value"));
    }
}
