//! service-mw: request logging and correlation-ID propagation for micros
//! services.
pub mod config;
pub mod context;
pub mod dtx;
pub mod endpoint;
pub mod error;
pub mod grpc;
pub mod keyer;
pub mod middleware;
pub mod observability;

pub use context::{Context, ContextKey};
pub use endpoint::{Endpoint, EndpointExt, LabeledMiddleware, Middleware, endpoint_fn};
pub use error::{MwError, StackTracer, Traced};

pub use async_trait;
pub use axum;
pub use tonic;
pub use tracing;
