//! Logging infrastructure
//!
//! Structured logging through `tracing`, with pretty, compact or JSON output
//! to a standard stream or a daily rolling file. The interop layer reports
//! through the `log_*` helpers below so every event carries a stable
//! `event` field.

use once_cell::sync::OnceCell;
use std::path::Path;
use tracing::Level;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::errors::{CallError, DecodeError, EncodeError};

static LOGGER_INITIALIZED: OnceCell<()> = OnceCell::new();

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with timestamps
    Pretty,
    /// Compact format for production
    Compact,
    /// JSON format for structured logging
    Json,
}

/// Log output destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
    /// File with daily rotation
    File { directory: String, prefix: String },
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level
    pub level: Level,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Whether to include span open/close events
    pub span_events: bool,
    /// Extra filter directives (e.g., "pyhost=debug,pyo3=warn")
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Pretty,
            output: LogOutput::Stderr,
            span_events: false,
            filter: None,
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Read overrides from the environment:
    /// `PYHOST_LOG_LEVEL` (trace..error), `PYHOST_LOG_FORMAT`
    /// (pretty, compact, json), `PYHOST_LOG_FILE` (directory for rolling
    /// files) and `PYHOST_LOG_SPANS` (any value enables span events).
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(level) = std::env::var("PYHOST_LOG_LEVEL") {
            config.level = parse_level(&level).unwrap_or(Level::INFO);
        }

        if let Ok(format) = std::env::var("PYHOST_LOG_FORMAT") {
            config.format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "compact" => LogFormat::Compact,
                _ => LogFormat::Pretty,
            };
        }

        if let Ok(directory) = std::env::var("PYHOST_LOG_FILE") {
            config.output = LogOutput::File { directory, prefix: "pyhost".to_string() };
        }

        config.span_events = std::env::var("PYHOST_LOG_SPANS").is_ok();

        config
    }
}

fn parse_level(s: &str) -> Option<Level> {
    match s.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Install the global subscriber.
///
/// Returns a `WorkerGuard` that must stay alive for logs to be flushed.
/// Only the first successful call installs anything; later calls (or a
/// subscriber installed elsewhere) yield `None`.
pub fn init_logging(config: LogConfig) -> Option<WorkerGuard> {
    if is_initialized() {
        return None;
    }

    let (writer, guard) = match &config.output {
        LogOutput::Stdout => tracing_appender::non_blocking(std::io::stdout()),
        LogOutput::Stderr => tracing_appender::non_blocking(std::io::stderr()),
        LogOutput::File { directory, prefix } => {
            tracing_appender::non_blocking(rolling::daily(directory, prefix))
        }
    };

    let span_events = span_events_config(config.span_events);
    let layer: BoxedLayer = match config.format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(writer)
            .pretty()
            .with_span_events(span_events)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .with_writer(writer)
            .compact()
            .with_span_events(span_events)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .with_writer(writer)
            .json()
            .with_span_events(span_events)
            .boxed(),
    };

    let filter = build_filter(&config);
    match tracing_subscriber::registry().with(layer.with_filter(filter)).try_init() {
        Ok(()) => {
            let _ = LOGGER_INITIALIZED.set(());
            Some(guard)
        }
        Err(_) => None,
    }
}

pub fn is_initialized() -> bool {
    LOGGER_INITIALIZED.get().is_some()
}

fn build_filter(config: &LogConfig) -> EnvFilter {
    let base_filter = EnvFilter::from_default_env()
        .add_directive(config.level.into());

    match &config.filter {
        Some(filter_str) => {
            filter_str.split(',')
                .fold(base_filter, |filter, directive| {
                    filter.add_directive(directive.parse().unwrap_or_else(|_| {
                        tracing::warn!("Invalid filter directive: {}", directive);
                        config.level.into()
                    }))
                })
        }
        None => base_filter,
    }
}

fn span_events_config(enabled: bool) -> FmtSpan {
    if enabled {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    }
}

/// Initialize logging with defaults for development
pub fn init_dev_logging() -> Option<WorkerGuard> {
    init_logging(LogConfig {
        level: Level::DEBUG,
        format: LogFormat::Pretty,
        output: LogOutput::Stderr,
        span_events: true,
        filter: Some("pyhost=debug".to_string()),
    })
}

/// Initialize logging with defaults for production
pub fn init_prod_logging(log_dir: impl AsRef<Path>) -> Option<WorkerGuard> {
    init_logging(LogConfig {
        level: Level::INFO,
        format: LogFormat::Json,
        output: LogOutput::File {
            directory: log_dir.as_ref().to_string_lossy().to_string(),
            prefix: "pyhost".to_string(),
        },
        span_events: false,
        filter: Some("pyhost=info,warn".to_string()),
    })
}

// ============================================================================
// Interop events
// ============================================================================

pub fn log_runtime_init(search_paths: usize) {
    tracing::info!(
        event = "runtime_init",
        search_paths,
        "Embedded interpreter session starting"
    );
}

pub fn log_runtime_finalize(released: usize) {
    tracing::info!(
        event = "runtime_finalize",
        released,
        "Embedded interpreter session shutting down"
    );
}

pub fn log_module_loaded(module: &str, registered: usize) {
    tracing::debug!(
        event = "module_loaded",
        module,
        registered,
        "Module loaded"
    );
}

pub fn log_registration_replaced(name: &str, module: &str) {
    tracing::debug!(
        event = "registration_replaced",
        function = name,
        module,
        "Registered function replaced"
    );
}

#[inline]
pub fn log_call(name: &str, arg_count: usize) {
    tracing::debug!(
        event = "call",
        function = name,
        args = arg_count,
        "Function called"
    );
}

#[inline]
pub fn log_call_return(name: &str, kind: &str) {
    tracing::trace!(
        event = "call_return",
        function = name,
        result = kind,
        "Function returned"
    );
}

pub fn log_call_error(err: &CallError) {
    tracing::error!(
        event = "call_error",
        function = %err.name,
        stage = err.stage(),
        error = %err,
        "Function call failed"
    );
}

pub fn log_encode_error(err: &EncodeError) {
    tracing::debug!(event = "encode_error", error = %err, "Encode failed");
}

pub fn log_decode_error(err: &DecodeError) {
    tracing::debug!(event = "decode_error", error = %err, "Decode failed");
}

/// Performance tracking utilities
pub mod perf {
    use std::time::Instant;
    use tracing::debug;

    /// Track operation duration (returns guard that logs on drop)
    #[must_use]
    pub fn track(operation: &str) -> PerformanceGuard {
        PerformanceGuard {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub struct PerformanceGuard {
        operation: String,
        start: Instant,
    }

    impl Drop for PerformanceGuard {
        fn drop(&mut self) {
            let elapsed = self.start.elapsed();
            debug!(
                operation = %self.operation,
                duration_us = elapsed.as_micros() as u64,
                "operation completed"
            );
        }
    }
}
