pub mod logger;
pub mod logging;
pub mod render;

pub use logger::{CORRELATION_ID_KEY, LogEntry, LogSink, Logger, RecordingSink, TracingSink};
pub use logging::init_tracing;
pub use render::{LogValue, NIL, render, render_display};
