//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Console output for operators
//! - JSON-formatted rolling log files
//! - `RUST_LOG` overrides on top of the configured level
//!
//! # Example
//!
//! ```no_run
//! use sextant::logging::init_logging;
//! use sextant::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(table = "users", "Computing checksum");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use sextant::log_retry_attempt;
/// use std::time::Duration;
///
/// log_retry_attempt!(2, 3, Duration::from_secs(30), "Connection timeout");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_retries:expr, $delay:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_retries = $max_retries,
            delay_ms = $delay.as_millis() as u64,
            reason = %$reason,
            "Retrying warehouse request"
        );
    };
}

/// Log one event of a batch the warehouse partially rejected
///
/// # Example
///
/// ```no_run
/// use sextant::log_rejected_event;
///
/// log_rejected_event!(1, 20, r#"{"event_type":"web_request"}"#);
/// ```
#[macro_export]
macro_rules! log_rejected_event {
    ($position:expr, $total:expr, $event:expr) => {
        tracing::info!(
            position = $position,
            total = $total,
            "possible error processing event ({}/{}): {}",
            $position,
            $total,
            $event
        );
    };
}
