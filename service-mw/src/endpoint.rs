//! The endpoint abstraction that middleware wraps.
//!
//! An endpoint is one step of a request pipeline: it takes the request
//! [`Context`] and a request value and produces a response or an error.
//! Middleware turns an endpoint into another endpoint of the same shape.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;

#[async_trait]
pub trait Endpoint: Send + Sync {
    type Request: Send + 'static;
    type Response: Send + 'static;
    type Error: Send + 'static;

    async fn call(
        &self,
        ctx: Context,
        request: Self::Request,
    ) -> Result<Self::Response, Self::Error>;
}

#[async_trait]
impl<E: Endpoint + ?Sized> Endpoint for Arc<E> {
    type Request = E::Request;
    type Response = E::Response;
    type Error = E::Error;

    async fn call(
        &self,
        ctx: Context,
        request: Self::Request,
    ) -> Result<Self::Response, Self::Error> {
        (**self).call(ctx, request).await
    }
}

/// Endpoint backed by an async closure. Created with [`endpoint_fn`].
pub struct EndpointFn<F, Req> {
    f: F,
    _request: PhantomData<fn(Req)>,
}

/// Build an endpoint from an async closure.
///
/// ```ignore
/// let ping = endpoint_fn(|_ctx: Context, req: String| async move {
///     Ok::<_, tonic::Status>(format!("pong: {req}"))
/// });
/// ```
pub fn endpoint_fn<F, Req, Fut, Resp, Err>(f: F) -> EndpointFn<F, Req>
where
    F: Fn(Context, Req) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Resp, Err>> + Send + 'static,
{
    EndpointFn {
        f,
        _request: PhantomData,
    }
}

#[async_trait]
impl<F, Req, Fut, Resp, Err> Endpoint for EndpointFn<F, Req>
where
    F: Fn(Context, Req) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Resp, Err>> + Send + 'static,
    Req: Send + 'static,
    Resp: Send + 'static,
    Err: Send + 'static,
{
    type Request = Req;
    type Response = Resp;
    type Error = Err;

    async fn call(&self, ctx: Context, request: Req) -> Result<Resp, Err> {
        (self.f)(ctx, request).await
    }
}

/// Wraps an endpoint into another endpoint with the same request, response
/// and error types.
pub trait Middleware<E: Endpoint> {
    type Output: Endpoint<Request = E::Request, Response = E::Response, Error = E::Error>;

    fn apply(&self, inner: E) -> Self::Output;
}

/// Middleware that also receives the logical method name of the endpoint it
/// wraps, for transports that multiplex many operations.
pub trait LabeledMiddleware<E: Endpoint> {
    type Output: Endpoint<Request = E::Request, Response = E::Response, Error = E::Error>;

    fn apply(&self, method: &str, inner: E) -> Self::Output;
}

pub trait EndpointExt: Endpoint + Sized {
    fn wrap<M: Middleware<Self>>(self, middleware: &M) -> M::Output {
        middleware.apply(self)
    }

    fn wrap_labeled<M: LabeledMiddleware<Self>>(self, method: &str, middleware: &M) -> M::Output {
        middleware.apply(method, self)
    }
}

impl<E: Endpoint> EndpointExt for E {}
