//! Structured logging and operation metrics
//!
//! Logs go through `tracing`; [`init_tracing`] installs a registry with an
//! `EnvFilter` and either a text or JSON fmt layer. With the `observability`
//! feature every accessor operation also bumps a `metrics` counter.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, trace, Level};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Counter incremented once per accessor operation
pub const OPERATIONS_TOTAL: &str = "hrops_operations_total";

/// Error types for observability setup
#[derive(Error, Debug)]
pub enum ObservabilityError {
    #[error("Failed to initialize tracing: {0}")]
    TracingInit(String),
}

/// Result type for observability operations
pub type Result<T> = std::result::Result<T, ObservabilityError>;

/// Configuration for logging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Enable JSON logging format
    pub json_logs: bool,

    /// Service name attached to the startup event
    pub service_name: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            service_name: "hrops".to_string(),
        }
    }
}

/// How an accessor operation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
    /// Read skipped because the session identity is incomplete
    Skipped,
    /// Response discarded because a newer list response was already applied
    Stale,
}

impl Outcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Skipped => "skipped",
            Self::Stale => "stale",
        }
    }
}

/// Record one accessor operation
pub fn record_operation(entity: &str, operation: &'static str, outcome: Outcome) {
    #[cfg(feature = "observability")]
    metrics::counter!(
        OPERATIONS_TOTAL,
        "entity" => entity.to_string(),
        "operation" => operation,
        "outcome" => outcome.as_str()
    )
    .increment(1);

    trace!(entity, operation, outcome = outcome.as_str(), "operation recorded");
}

/// Install the global subscriber writing to stderr
///
/// # Errors
/// Returns an error if the log level is invalid or a subscriber is already set
pub fn init_tracing(config: &ObservabilityConfig) -> Result<()> {
    init_tracing_with_writer(config, std::io::stderr)
}

/// Install the global subscriber writing to `writer`
///
/// `RUST_LOG`, when set, takes precedence over `config.log_level`.
///
/// # Errors
/// Returns an error if the log level is invalid or a subscriber is already set
pub fn init_tracing_with_writer<W>(config: &ObservabilityConfig, writer: W) -> Result<()>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    config
        .log_level
        .parse::<Level>()
        .map_err(|e| ObservabilityError::TracingInit(format!("Invalid log level: {e}")))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json_logs {
        let json_layer = fmt::layer()
            .json()
            .with_writer(writer)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true);
        registry.with(json_layer).try_init()
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE);
        registry.with(fmt_layer).try_init()
    };
    installed.map_err(|e| ObservabilityError::TracingInit(e.to_string()))?;

    info!(
        service = %config.service_name,
        "Tracing initialized with level: {}",
        config.log_level
    );
    Ok(())
}
