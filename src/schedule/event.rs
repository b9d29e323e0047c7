//! Parsed recurrence expression handed back to the backend that produced it.

/// One recurrence produced by [`Handler::parse_schedules`](super::Handler::parse_schedules).
///
/// The lifecycle code treats events as opaque and passes them unmodified to
/// [`Handler::create_job`](super::Handler::create_job).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    expression: String,
    native: String,
}

impl Event {
    /// Create an event from the configured `expression` and its backend-native form.
    pub fn new(expression: impl Into<String>, native: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            native: native.into(),
        }
    }

    /// Expression as written in configuration.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Form understood by the native scheduler.
    #[must_use]
    pub fn native(&self) -> &str {
        &self.native
    }
}
