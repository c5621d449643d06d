//! Error types for the Pulse engine binary.
//!
//! [`EngineError`] wraps every failure mode during startup so `main` can
//! propagate with `?`. Once the jobs are running, failures are logged and
//! never surface here.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: pulse_core::ConfigError,
    },

    /// The scheduler could not be constructed.
    #[error("scheduler error: {source}")]
    Scheduler {
        /// The underlying scheduler error.
        #[from]
        source: pulse_core::SchedulerError,
    },

    /// Installing a shutdown signal handler failed.
    #[error("signal error: {source}")]
    Signal {
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
