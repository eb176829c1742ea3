//! gRPC interceptors for correlation-ID propagation.

use tonic::{Request, Status};

use crate::context::Context;
use crate::dtx::{self, context_to_grpc, grpc_to_context};

/// Interceptor that builds the request [`Context`] from incoming metadata.
///
/// The context is stored in the request extensions; handlers read it with
/// [`request_context`]. Requests are never rejected.
///
/// # Example
///
/// ```ignore
/// use service_mw::grpc::interceptors::correlation_interceptor;
///
/// let service = OrderServiceServer::with_interceptor(orders, correlation_interceptor);
/// ```
#[allow(clippy::result_large_err)]
pub fn correlation_interceptor(mut request: Request<()>) -> Result<Request<()>, Status> {
    let ctx = grpc_to_context(request_context(&request), request.metadata());

    if let Some(id) = dtx::correlation_id(&ctx) {
        tracing::debug!(correlation_id = %id, "Received correlation ID");
    }

    request.extensions_mut().insert(ctx);
    Ok(request)
}

/// The [`Context`] stored by [`correlation_interceptor`], or an empty one.
pub fn request_context<T>(request: &Request<T>) -> Context {
    request
        .extensions()
        .get::<Context>()
        .cloned()
        .unwrap_or_default()
}

/// Inject the context's correlation ID into outgoing gRPC request metadata.
///
/// Call this before making a gRPC client call so downstream services join
/// the same distributed transaction.
///
/// # Example
///
/// ```ignore
/// let mut request = tonic::Request::new(charge);
/// inject_correlation_id(&ctx, &mut request);
/// client.charge(request).await?;
/// ```
pub fn inject_correlation_id<T>(ctx: &Context, request: &mut Request<T>) {
    context_to_grpc(ctx, request.metadata_mut());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtx::HEADER_HTTP2;

    #[test]
    fn test_interceptor_passes_through_untagged_request() {
        let request = Request::new(());
        let request = correlation_interceptor(request).unwrap();

        let ctx = request_context(&request);
        assert_eq!(dtx::correlation_id(&ctx), None);
    }

    #[test]
    fn test_interceptor_stores_last_correlation_id() {
        let mut request = Request::new(());
        request
            .metadata_mut()
            .append(HEADER_HTTP2, "first".parse().unwrap());
        request
            .metadata_mut()
            .append(HEADER_HTTP2, "second".parse().unwrap());

        let request = correlation_interceptor(request).unwrap();
        assert_eq!(
            dtx::correlation_id(&request_context(&request)),
            Some("second")
        );
    }

    #[test]
    fn test_inject_correlation_id() {
        let ctx = dtx::with_correlation_id(&Context::background(), "xyz");
        let mut request = Request::new("payload");
        inject_correlation_id(&ctx, &mut request);

        let values: Vec<_> = request
            .metadata()
            .get_all(HEADER_HTTP2)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(values, vec!["xyz".to_string()]);
    }
}
