//! Distributed-transaction correlation.
//!
//! A correlation ID ties together every request that belongs to one
//! distributed transaction. This crate never generates one; it only moves an
//! existing ID between the request [`Context`] and transport headers.

pub mod client;
pub mod transport;

use std::fmt;

use crate::context::{Context, ContextKey};

pub use client::CorrelatedRequestExt;
pub use transport::{
    HEADER, HEADER_HTTP2, context_to_grpc, context_to_http, grpc_to_context, http_to_context,
};

/// Opaque token identifying a distributed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CorrelationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for CorrelationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Context key under which the correlation ID is stored.
pub const CORRELATION_ID: ContextKey<CorrelationId> = ContextKey::new("dtx.correlation_id");

/// The correlation ID attached to `ctx`, if any.
pub fn correlation_id(ctx: &Context) -> Option<&str> {
    ctx.value(&CORRELATION_ID).map(CorrelationId::as_str)
}

/// Derive a context carrying `id` as its correlation ID.
pub fn with_correlation_id(ctx: &Context, id: impl Into<CorrelationId>) -> Context {
    ctx.with_value(&CORRELATION_ID, id.into())
}
