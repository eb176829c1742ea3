//! Correlation-ID propagation for outbound reqwest calls.

use reqwest::header::HeaderMap;

use super::transport::context_to_http;
use crate::context::Context;

/// Extension trait for attaching the request context's correlation ID to an
/// outgoing reqwest request.
///
/// # Example
///
/// ```ignore
/// use service_mw::dtx::CorrelatedRequestExt;
///
/// client.post(url)
///     .with_correlation(&ctx)
///     .json(&payload)
///     .send()
///     .await?;
/// ```
pub trait CorrelatedRequestExt {
    fn with_correlation(self, ctx: &Context) -> Self;
}

impl CorrelatedRequestExt for reqwest::RequestBuilder {
    fn with_correlation(self, ctx: &Context) -> Self {
        let mut headers = HeaderMap::new();
        context_to_http(ctx, &mut headers);
        if headers.is_empty() {
            return self;
        }
        self.headers(headers)
    }
}
