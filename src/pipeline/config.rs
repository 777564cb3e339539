//! Pipeline configuration.

use crate::observability::TracingConfig;

/// Configuration for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Name used in spans and metric labels.
    pub name: String,
    /// Maximum predicate invocations in flight per step.
    ///
    /// `None` dispatches every element of a step at once. The same cap
    /// applies to every operation; `Some(0)` behaves like `Some(1)`.
    pub concurrency: Option<usize>,
    /// Span configuration.
    pub tracing: TracingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: "pipeline".to_string(),
            concurrency: None,
            tracing: TracingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a default config with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Cap the number of predicate invocations in flight per step.
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = Some(limit);
        self
    }

    /// Use the given span configuration.
    pub fn with_tracing(mut self, tracing: TracingConfig) -> Self {
        self.tracing = tracing;
        self
    }
}
