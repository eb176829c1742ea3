//! gRPC utilities for micros services.
//!
//! - Interceptor that carries the correlation ID into the request context
//! - Client-side injection of the correlation ID into outgoing metadata

pub mod interceptors;

pub use interceptors::{correlation_interceptor, inject_correlation_id, request_context};

// Re-export commonly used tonic types
pub use tonic::{Code, Request, Response, Status};
