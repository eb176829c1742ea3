//! Correlation-ID propagation across HTTP and gRPC boundaries.
//!
//! Servers call the `*_to_context` functions on inbound requests; clients
//! call the `context_to_*` functions on outbound requests. All four are
//! total: a missing header, a missing context value, or a value that cannot
//! be encoded leaves the target unchanged.

use http::{HeaderMap, HeaderName, HeaderValue};
use tonic::metadata::{Ascii, MetadataMap, MetadataValue};

use super::{correlation_id, with_correlation_id};
use crate::context::Context;

/// HTTP header carrying the correlation ID.
pub const HEADER: &str = "X-TX-CORRELATION-ID";

/// gRPC metadata key carrying the correlation ID. HTTP/2 forbids upper-case
/// header names.
pub const HEADER_HTTP2: &str = "x-tx-correlation-id";

static CORRELATION_HEADER: HeaderName = HeaderName::from_static(HEADER_HTTP2);

/// Move a correlation ID from inbound HTTP headers into the context.
///
/// An absent or empty header returns `ctx` unchanged, as does a value that
/// is not UTF-8. When the header repeats, the first value is used.
pub fn http_to_context(ctx: Context, headers: &HeaderMap) -> Context {
    let token = headers
        .get(&CORRELATION_HEADER)
        .and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
        .unwrap_or_default();

    if token.is_empty() {
        return ctx;
    }
    with_correlation_id(&ctx, token)
}

/// Move the context's correlation ID into outbound HTTP headers, replacing
/// any value already set.
pub fn context_to_http(ctx: &Context, headers: &mut HeaderMap) {
    let Some(token) = correlation_id(ctx) else {
        return;
    };

    match HeaderValue::from_bytes(token.as_bytes()) {
        Ok(value) => {
            headers.insert(CORRELATION_HEADER.clone(), value);
        }
        Err(_) => {
            tracing::debug!(correlation_id = %token, "Skipping correlation ID that is not a valid header value");
        }
    }
}

/// Move a correlation ID from inbound gRPC metadata into the context.
///
/// An absent key returns `ctx` unchanged. When the key carries several
/// values, the last one wins.
pub fn grpc_to_context(ctx: Context, metadata: &MetadataMap) -> Context {
    let Some(last) = metadata.get_all(HEADER_HTTP2).iter().last() else {
        return ctx;
    };

    match std::str::from_utf8(last.as_encoded_bytes()) {
        Ok(token) => with_correlation_id(&ctx, token),
        Err(_) => {
            tracing::debug!("Skipping correlation ID metadata that is not valid UTF-8");
            ctx
        }
    }
}

/// Move the context's correlation ID into outbound gRPC metadata as a
/// single value, replacing any values already set.
pub fn context_to_grpc(ctx: &Context, metadata: &mut MetadataMap) {
    let Some(token) = correlation_id(ctx) else {
        return;
    };

    match MetadataValue::<Ascii>::try_from(token.as_bytes()) {
        Ok(value) => {
            metadata.insert(HEADER_HTTP2, value);
        }
        Err(_) => {
            tracing::debug!(correlation_id = %token, "Skipping correlation ID that is not valid metadata");
        }
    }
}
