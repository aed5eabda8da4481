//! Query context
//!
//! Ambient state shared by every cursor of one query execution: identity,
//! cancellation, configuration and metrics. Cloning is cheap and every
//! clone observes the same cancellation token and metrics.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use uuid::Uuid;

use crate::observability::{log_event, Event, ExecutionMetrics, Logger, Severity};

use super::config::ExecutionConfig;
use super::errors::{ExecutionError, ExecutionResult};

/// Shared cancellation signal, set by whoever owns the query
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; cannot be undone
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Context a cursor is bound to at creation time
#[derive(Debug, Clone)]
pub struct QueryContext {
    query_id: Uuid,
    cancellation: CancellationToken,
    config: Arc<ExecutionConfig>,
    metrics: Arc<ExecutionMetrics>,
}

impl QueryContext {
    pub fn new(config: ExecutionConfig) -> Self {
        Self {
            query_id: Uuid::new_v4(),
            cancellation: CancellationToken::new(),
            config: Arc::new(config),
            metrics: Arc::new(ExecutionMetrics::new()),
        }
    }

    pub fn query_id(&self) -> Uuid {
        self.query_id
    }

    /// Handle that cancels this query when triggered
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    pub fn metrics(&self) -> &ExecutionMetrics {
        &self.metrics
    }

    /// Polled at the start of every `next`
    pub fn check_cancellation(&self) -> ExecutionResult<()> {
        if self.cancellation.is_canceled() {
            self.metrics.increment_cancellations();
            let query_id = self.query_id.to_string();
            log_event(Event::QueryCanceled, &[("query_id", &query_id)]);
            return Err(ExecutionError::query_canceled(self.query_id));
        }
        Ok(())
    }

    /// Per-call cursor tracing, gated by `log_operator_execution`
    pub fn trace(&self, event: Event, operator: &str, detail: &str) {
        if self.config.log_operator_execution {
            let query_id = self.query_id.to_string();
            Logger::log(
                Severity::Trace,
                event.as_str(),
                &[("detail", detail), ("operator", operator), ("query_id", &query_id)],
            );
        }
    }
}

impl Default for QueryContext {
    fn default() -> Self {
        Self::new(ExecutionConfig::default())
    }
}
