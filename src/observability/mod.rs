//! Observability features: metrics and tracing.
//!
//! - **Metrics**: Counters and histograms via `metrics-rs`
//! - **Tracing**: Structured logging and spans via `tracing`
//!
//! ## Metrics
//!
//! | Metric | Type | Description |
//! |--------|------|-------------|
//! | `during_steps_executed` | Counter | Steps that completed successfully |
//! | `during_steps_failed` | Counter | Steps that failed |
//! | `during_elements_processed` | Counter | Elements handed to steps |
//! | `during_step_time_ns` | Histogram | Wall time per step |
//! | `during_pipelines_completed` | Counter | Terminal pipelines, by `outcome` |
//!
//! No recorder is installed by the library; install one (prometheus, statsd,
//! ...) in the application to collect them.
//!
//! ## Tracing
//!
//! A `pipeline` span wraps each run and a `step` span wraps each step. Both
//! can be disabled through [`TracingConfig`].

mod metrics;
mod tracing_support;

pub use self::metrics::{StepMetrics, init_metrics, record_pipeline_completed};
pub use self::tracing_support::{
    TracingConfig, span_pipeline, span_step, trace_state_change, trace_step_failed,
    trace_step_finished, trace_step_started,
};
