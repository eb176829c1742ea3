pub mod correlation;
pub mod log;

pub use correlation::{RequestContext, correlation_middleware};
pub use log::{LabeledLogMiddleware, LogMiddleware, Logged, labeled_log, log};
