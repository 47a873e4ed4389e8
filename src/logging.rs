//! Structured logging for the clinic server and the seed tool
//!
//! Production writes JSON lines; every other environment gets the pretty
//! formatter. `RUST_LOG` overrides the configured level.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

use crate::error::{Error, Result};

/// Install the global subscriber; fails if one is already installed
pub fn init_tracing(log_level: &str, environment: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "vetclinic={level},seed={level},tower_http={level},sqlx=warn",
            level = log_level
        ))
    });

    let registry = Registry::default().with(filter);
    let installed = if environment == "production" {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(fmt::layer().pretty().with_span_events(FmtSpan::CLOSE))
            .try_init()
    };
    installed.map_err(|e| Error::internal(format!("Failed to initialize tracing: {}", e)))?;

    tracing::info!(environment, log_level, "Logging initialized");
    Ok(())
}

/// Span for a transactional store operation on one record.
///
/// `deleted_pets` and `deleted_visits` are recorded by cascading deletes.
#[macro_export]
macro_rules! db_span {
    ($operation:expr, $record_id:expr) => {
        tracing::info_span!(
            "database",
            operation = $operation,
            record_id = %$record_id,
            deleted_pets = tracing::field::Empty,
            deleted_visits = tracing::field::Empty,
        )
    };
}

/// Log an error with context
#[macro_export]
macro_rules! log_error {
    ($error:expr, $msg:expr) => {
        tracing::error!(
            error = %$error,
            error_type = ?$error,
            $msg
        )
    };
    ($error:expr, $msg:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::error!(
            error = %$error,
            error_type = ?$error,
            $($key = tracing::field::display(&$value),)*
            $msg
        )
    };
}

/// Helper for timing operations
pub struct Timer {
    start: std::time::Instant,
    operation: String,
}

impl Timer {
    /// Start a new timer
    pub fn start(operation: impl Into<String>) -> Self {
        Timer {
            start: std::time::Instant::now(),
            operation: operation.into(),
        }
    }

    /// Stop the timer and log the duration
    pub fn stop(self) -> std::time::Duration {
        let duration = self.start.elapsed();
        tracing::debug!(
            operation = %self.operation,
            duration_ms = duration.as_millis(),
            "Operation completed"
        );
        duration
    }

    /// Stop the timer and log the duration at info level
    pub fn stop_info(self) -> std::time::Duration {
        let duration = self.start.elapsed();
        tracing::info!(
            operation = %self.operation,
            duration_ms = duration.as_millis(),
            "Operation completed"
        );
        duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer() {
        let timer = Timer::start("test_operation");
        std::thread::sleep(std::time::Duration::from_millis(10));
        let duration = timer.stop();
        assert!(duration.as_millis() >= 10);
    }

    #[test]
    fn test_second_init_is_rejected() {
        let _ = init_tracing("debug", "test");
        assert!(init_tracing("debug", "test").is_err());
    }

    #[test]
    fn test_timer_info() {
        let timer = Timer::start("dashboard_summary");
        assert!(timer.stop_info() >= std::time::Duration::ZERO);
    }
}
