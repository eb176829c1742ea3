//! Debug-level request/response logging for endpoints.
//!
//! Every call through a logged endpoint emits one `request`/`response` line,
//! preceded by an `err` line when the call fails. The outcome of the call is
//! returned untouched.

use std::backtrace::Backtrace;
use std::io::Write;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::context::Context;
use crate::endpoint::{Endpoint, LabeledMiddleware, Middleware};
use crate::error::StackTracer;
use crate::keyer::{self, Keyer};
use crate::observability::{LogSink, LogValue, Logger, NIL, render, render_display};

/// Destination for stack traces of failing calls.
type TraceWriter = Arc<Mutex<dyn Write + Send>>;

fn stdout_writer() -> TraceWriter {
    Arc::new(Mutex::new(std::io::stdout()))
}

/// Middleware that logs every call through the wrapped endpoint.
#[derive(Clone)]
pub struct LogMiddleware {
    sink: Arc<dyn LogSink>,
    keyer: Arc<dyn Keyer>,
    print_trace: bool,
    trace_out: TraceWriter,
}

/// Like [`LogMiddleware`], but annotates lines with the endpoint's method
/// name under the `method` key.
#[derive(Clone)]
pub struct LabeledLogMiddleware {
    sink: Arc<dyn LogSink>,
    keyer: Arc<dyn Keyer>,
    print_trace: bool,
    trace_out: TraceWriter,
}

/// Logs every request and response at debug level.
///
/// When `print_trace` is set and a failing call's error carries a stack
/// trace, the trace is written to standard output.
///
/// # Example
///
/// ```ignore
/// use service_mw::{keyer::Keys, middleware::log, observability::TracingSink};
///
/// let logged = log(Arc::new(TracingSink), Keys::new().with("module", "orders"), false)
///     .apply(create_order_endpoint);
/// ```
pub fn log(sink: Arc<dyn LogSink>, keyer: impl Keyer + 'static, print_trace: bool) -> LogMiddleware {
    LogMiddleware {
        sink,
        keyer: Arc::new(keyer),
        print_trace,
        trace_out: stdout_writer(),
    }
}

/// Labeled version of [`log`].
pub fn labeled_log(
    sink: Arc<dyn LogSink>,
    keyer: impl Keyer + 'static,
    print_trace: bool,
) -> LabeledLogMiddleware {
    LabeledLogMiddleware {
        sink,
        keyer: Arc::new(keyer),
        print_trace,
        trace_out: stdout_writer(),
    }
}

impl LogMiddleware {
    /// Send stack traces to `writer` instead of standard output.
    pub fn with_trace_writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.trace_out = Arc::new(Mutex::new(writer));
        self
    }

    pub fn wrap<E: Endpoint>(&self, inner: E) -> Logged<E> {
        Logged {
            inner,
            sink: self.sink.clone(),
            keyer: self.keyer.clone(),
            print_trace: self.print_trace,
            trace_out: self.trace_out.clone(),
        }
    }
}

impl LabeledLogMiddleware {
    /// Send stack traces to `writer` instead of standard output.
    pub fn with_trace_writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.trace_out = Arc::new(Mutex::new(writer));
        self
    }

    pub fn wrap<E: Endpoint>(&self, method: &str, inner: E) -> Logged<E> {
        Logged {
            inner,
            sink: self.sink.clone(),
            keyer: Arc::new(keyer::with(self.keyer.as_ref(), "method", method)),
            print_trace: self.print_trace,
            trace_out: self.trace_out.clone(),
        }
    }
}

impl<E> Middleware<E> for LogMiddleware
where
    E: Endpoint,
    E::Request: LogValue,
    E::Response: LogValue,
    E::Error: StackTracer,
{
    type Output = Logged<E>;

    fn apply(&self, inner: E) -> Logged<E> {
        self.wrap(inner)
    }
}

impl<E> LabeledMiddleware<E> for LabeledLogMiddleware
where
    E: Endpoint,
    E::Request: LogValue,
    E::Response: LogValue,
    E::Error: StackTracer,
{
    type Output = Logged<E>;

    fn apply(&self, method: &str, inner: E) -> Logged<E> {
        self.wrap(method, inner)
    }
}

/// An endpoint wrapped by [`LogMiddleware`].
pub struct Logged<E> {
    inner: E,
    sink: Arc<dyn LogSink>,
    keyer: Arc<dyn Keyer>,
    print_trace: bool,
    trace_out: TraceWriter,
}

impl<E> Logged<E> {
    pub fn inner(&self) -> &E {
        &self.inner
    }

    fn print_stack_trace(&self, trace: &Backtrace) {
        let Ok(mut out) = self.trace_out.lock() else {
            return;
        };
        let _ = write!(out, "\n{}\n\n", trace);
        let _ = out.flush();
    }
}

#[async_trait]
impl<E> Endpoint for Logged<E>
where
    E: Endpoint,
    E::Request: LogValue,
    E::Response: LogValue,
    E::Error: StackTracer,
{
    type Request = E::Request;
    type Response = E::Response;
    type Error = E::Error;

    async fn call(
        &self,
        ctx: Context,
        request: Self::Request,
    ) -> Result<Self::Response, Self::Error> {
        let logger = Logger::debug(self.sink.clone())
            .with_context(&ctx)
            .with_keyer(self.keyer.as_ref());

        // The request moves into the inner endpoint, so render it first.
        let rendered_request = render(&request);

        let result = self.inner.call(ctx, request).await;

        let rendered_response = match &result {
            Ok(response) => render(response),
            Err(err) => {
                logger.log([("err", render_display(err))]);
                if self.print_trace
                    && let Some(trace) = err.stack_trace()
                {
                    self.print_stack_trace(trace);
                }
                NIL.to_string()
            }
        };

        logger.log([("request", rendered_request), ("response", rendered_response)]);

        result
    }
}
