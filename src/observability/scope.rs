//! Observation scopes for a unit of work (a query run, a fixture load)
//!
//! - `{name}_BEGIN` on creation
//! - `{name}_COMPLETE`, `{name}_CANCELED` or `{name}_FAILED` on the way out
//! - `{name}_INCOMPLETE` if dropped without an outcome

use std::time::Instant;

use super::logger::{Logger, Severity};

/// Logs the start and the outcome of a unit of work.
pub struct ObservationScope {
    name: String,
    fields: Vec<(String, String)>,
    started: Instant,
    finished: bool,
}

impl ObservationScope {
    /// Open a scope; logs `{name}_BEGIN`
    pub fn new(name: &str) -> Self {
        Self::with_fields(name, &[])
    }

    /// Open a scope whose fields are repeated on every line it logs
    pub fn with_fields(name: &str, fields: &[(&str, &str)]) -> Self {
        let scope = Self {
            name: name.to_string(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            started: Instant::now(),
            finished: false,
        };
        scope.emit(Severity::Info, "BEGIN", &[]);
        scope
    }

    /// Successful outcome; logs `{name}_COMPLETE` with elapsed time
    pub fn complete(mut self, extra: &[(&str, &str)]) {
        self.finished = true;
        let elapsed = self.elapsed_ms();
        let mut fields = vec![("elapsed_ms", elapsed.as_str())];
        fields.extend_from_slice(extra);
        self.emit(Severity::Info, "COMPLETE", &fields);
    }

    /// Deliberate cancellation; logs `{name}_CANCELED` at WARN
    pub fn canceled(mut self) {
        self.finished = true;
        self.emit(Severity::Warn, "CANCELED", &[]);
    }

    /// Failure; logs `{name}_FAILED` at the given severity
    pub fn fail(mut self, severity: Severity, code: &str, reason: &str) {
        self.finished = true;
        self.emit(severity, "FAILED", &[("code", code), ("reason", reason)]);
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn elapsed_ms(&self) -> String {
        self.started.elapsed().as_millis().to_string()
    }

    fn emit(&self, severity: Severity, suffix: &str, extra: &[(&str, &str)]) {
        let event = format!("{}_{}", self.name, suffix);
        let mut fields: Vec<(&str, &str)> = self
            .fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        fields.extend_from_slice(extra);
        Logger::log(severity, &event, &fields);
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.finished {
            self.emit(
                Severity::Warn,
                "INCOMPLETE",
                &[("reason", "scope dropped without outcome")],
            );
        }
    }
}
