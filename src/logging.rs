use std::fmt;

/// Attempt-scoped logger.
///
/// Every event carries the attempt id and the enforced organization as
/// structured fields. Credentials must be passed through
/// [`Secret::masked`](crate::Secret::masked) before they reach a message;
/// `Secret` itself always formats as `[REDACTED]`.
#[derive(Debug, Clone, Copy)]
pub struct GateLog<'a> {
    attempt_id: &'a str,
    org: &'a str,
}

impl<'a> GateLog<'a> {
    /// Creates a logger for one attempt.
    pub fn new(attempt_id: &'a str, org: &'a str) -> Self {
        Self { attempt_id, org }
    }

    /// Logs an info-level message.
    ///
    /// ```no_run
    /// # use membership_gate::{GateLog, Secret};
    /// let log = GateLog::new("attempt-1", "nidus-lab");
    /// let token = Secret::new("gho_0123456789abcdef".to_string());
    /// log.info(format_args!("verifying with {}", token.masked()));
    /// ```
    pub fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(attempt_id = %self.attempt_id, org = %self.org, "{}", args);
    }

    /// Logs a warning-level message.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(attempt_id = %self.attempt_id, org = %self.org, "{}", args);
    }

    /// Logs an error-level message.
    pub fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(attempt_id = %self.attempt_id, org = %self.org, "{}", args);
    }

    /// Logs a debug-level message.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(attempt_id = %self.attempt_id, org = %self.org, "{}", args);
    }
}
