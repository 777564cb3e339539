//! Tracing integration for structured logging and spans.

use tracing::{Level, Span, span};

use crate::operation::OperationKind;
use crate::pipeline::PipelineState;

/// Configuration for tracing behavior.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Whether to create a span around each pipeline run.
    pub pipeline_spans: bool,
    /// Whether to create a span around each step.
    pub step_spans: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            pipeline_spans: true,
            step_spans: true,
        }
    }
}

impl TracingConfig {
    /// Pipeline spans only.
    pub fn minimal() -> Self {
        Self {
            pipeline_spans: true,
            step_spans: false,
        }
    }

    /// Disable all spans.
    pub fn none() -> Self {
        Self {
            pipeline_spans: false,
            step_spans: false,
        }
    }

    pub(crate) fn pipeline_span(&self, name: &str, steps: usize) -> Span {
        if self.pipeline_spans {
            span_pipeline(name, steps)
        } else {
            Span::none()
        }
    }

    pub(crate) fn step_span(&self, pipeline: &str, index: usize, operation: OperationKind) -> Span {
        if self.step_spans {
            span_step(pipeline, index, operation)
        } else {
            Span::none()
        }
    }
}

/// Create a span for a pipeline run.
#[inline]
pub fn span_pipeline(name: &str, steps: usize) -> Span {
    span!(Level::INFO, "pipeline", name = %name, steps = steps)
}

/// Create a span for one step.
#[inline]
pub fn span_step(pipeline: &str, index: usize, operation: OperationKind) -> Span {
    span!(
        Level::DEBUG,
        "step",
        pipeline = %pipeline,
        index = index,
        operation = %operation
    )
}

/// Log a step starting.
#[inline]
pub fn trace_step_started(index: usize, operation: OperationKind, elements: usize) {
    tracing::debug!(
        index = index,
        operation = %operation,
        elements = elements,
        "step started"
    );
}

/// Log a step completing successfully.
#[inline]
pub fn trace_step_finished(index: usize, operation: OperationKind, output_len: Option<usize>) {
    tracing::debug!(
        index = index,
        operation = %operation,
        output_len = ?output_len,
        "step finished"
    );
}

/// Log a step failure.
#[inline]
pub fn trace_step_failed(error: &dyn std::error::Error) {
    tracing::error!(error = %error, "step failed");
}

/// Log pipeline state change.
#[inline]
pub fn trace_state_change(pipeline: &str, from: PipelineState, to: PipelineState) {
    tracing::info!(
        pipeline = %pipeline,
        from = %from,
        to = %to,
        "pipeline state changed"
    );
}
