//! Metrics collection using metrics-rs.

use metrics::{Counter, Histogram, Label, Unit, counter, histogram};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::operation::OperationKind;

/// Whether metrics have been initialized.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

// Metric names as constants for consistency
const STEPS_EXECUTED: &str = "during_steps_executed";
const STEPS_FAILED: &str = "during_steps_failed";
const ELEMENTS_PROCESSED: &str = "during_elements_processed";
const STEP_TIME_NS: &str = "during_step_time_ns";
const PIPELINES_COMPLETED: &str = "during_pipelines_completed";

/// Initialize metrics descriptions.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    metrics::describe_counter!(
        STEPS_EXECUTED,
        Unit::Count,
        "Total number of steps that completed successfully"
    );
    metrics::describe_counter!(STEPS_FAILED, Unit::Count, "Total number of steps that failed");
    metrics::describe_counter!(
        ELEMENTS_PROCESSED,
        Unit::Count,
        "Total number of elements handed to steps"
    );
    metrics::describe_histogram!(
        STEP_TIME_NS,
        Unit::Nanoseconds,
        "Wall time to run a single step"
    );
    metrics::describe_counter!(
        PIPELINES_COMPLETED,
        Unit::Count,
        "Pipelines that reached a terminal state, by outcome"
    );
}

/// Metrics collector for one step of a pipeline.
#[derive(Clone)]
pub struct StepMetrics {
    executed: Counter,
    failed: Counter,
    elements: Counter,
    step_time: Histogram,
}

impl StepMetrics {
    /// Create a collector labelled with the pipeline and operation.
    pub fn new(pipeline: &str, operation: OperationKind) -> Self {
        let labels = vec![
            Label::new("pipeline", pipeline.to_string()),
            Label::new("operation", operation.name()),
        ];
        Self {
            executed: counter!(STEPS_EXECUTED, labels.clone()),
            failed: counter!(STEPS_FAILED, labels.clone()),
            elements: counter!(ELEMENTS_PROCESSED, labels.clone()),
            step_time: histogram!(STEP_TIME_NS, labels),
        }
    }

    /// Record the size of the step's input.
    #[inline]
    pub fn record_input(&self, elements: usize) {
        self.elements.increment(elements as u64);
    }

    /// Record the step's outcome and duration.
    #[inline]
    pub fn record_outcome(&self, succeeded: bool, duration: Duration) {
        if succeeded {
            self.executed.increment(1);
        } else {
            self.failed.increment(1);
        }
        self.step_time.record(duration.as_nanos() as f64);
    }

    /// Start timing the step.
    pub fn start_timer(&self) -> Instant {
        Instant::now()
    }
}

/// Record a pipeline reaching a terminal state.
#[inline]
pub fn record_pipeline_completed(pipeline: &str, succeeded: bool) {
    let outcome = if succeeded { "success" } else { "error" };
    counter!(PIPELINES_COMPLETED, "pipeline" => pipeline.to_string(), "outcome" => outcome)
        .increment(1);
}
