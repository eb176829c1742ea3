use std::sync::Arc;

use config::{Config as Cfg, File};
use serde::Deserialize;

use crate::error::MwError;
use crate::keyer::Keyer;
use crate::middleware::{LabeledLogMiddleware, LogMiddleware, labeled_log, log};
use crate::observability::LogSink;

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_json")]
    pub json: bool,
    /// Dump stack traces of failing calls to stdout.
    #[serde(default)]
    pub print_trace: bool,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

fn default_service_name() -> String {
    "service".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json() -> bool {
    true
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            log_level: default_log_level(),
            json: default_json(),
            print_trace: false,
            otlp_endpoint: None,
        }
    }
}

impl LogConfig {
    /// Load from `.env`, an optional `configuration` file and `APP__*`
    /// environment variables, in increasing order of precedence.
    pub fn load() -> Result<Self, MwError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn log_middleware(
        &self,
        sink: Arc<dyn LogSink>,
        keyer: impl Keyer + 'static,
    ) -> LogMiddleware {
        log(sink, keyer, self.print_trace)
    }

    pub fn labeled_log_middleware(
        &self,
        sink: Arc<dyn LogSink>,
        keyer: impl Keyer + 'static,
    ) -> LabeledLogMiddleware {
        labeled_log(sink, keyer, self.print_trace)
    }
}
