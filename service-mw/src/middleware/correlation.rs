use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

use crate::context::Context;
use crate::dtx::{self, http_to_context};

/// Builds the request [`Context`] from inbound headers and stores it in the
/// request extensions, where [`RequestContext`] picks it up.
pub async fn correlation_middleware(mut req: Request, next: Next) -> Response {
    let base = req.extensions().get::<Context>().cloned().unwrap_or_default();
    let ctx = http_to_context(base, req.headers());

    let span = tracing::debug_span!(
        "correlation",
        correlation_id = tracing::field::Empty,
    );
    if let Some(id) = dtx::correlation_id(&ctx) {
        span.record("correlation_id", id);
    }

    req.extensions_mut().insert(ctx);
    next.run(req).instrument(span).await
}

/// Extractor for the request [`Context`]. Yields an empty context when
/// [`correlation_middleware`] is not installed.
#[derive(Debug, Clone, Default)]
pub struct RequestContext(pub Context);

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts.extensions.get::<Context>().cloned().unwrap_or_default(),
        ))
    }
}
