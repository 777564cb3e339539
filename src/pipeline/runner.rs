//! Single-shot pipeline execution.
//!
//! A [`Pipeline`] is the frozen plan produced by a builder: the initial
//! collection plus an immutable, ordered list of steps. Running it executes
//! the steps one after another, each on the materialized output of the
//! previous one, and delivers exactly one terminal outcome.

use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::Instrument;

use super::config::PipelineConfig;
use super::state::{PipelineState, Terminal};
use crate::error::{Error, Result};
use crate::observability::{
    StepMetrics, record_pipeline_completed, trace_state_change, trace_step_failed,
    trace_step_finished, trace_step_started,
};
use crate::operation::{Step, run_operation};
use crate::value::into_sequence;

/// A built pipeline, ready to run once.
#[derive(Debug)]
pub struct Pipeline {
    collection: Value,
    steps: Arc<[Step]>,
    terminal: Terminal,
    config: PipelineConfig,
    state: PipelineState,
    completed: bool,
}

impl Pipeline {
    pub(crate) fn new(
        collection: Value,
        steps: Arc<[Step]>,
        terminal: Terminal,
        config: PipelineConfig,
    ) -> Self {
        Self {
            collection,
            steps,
            terminal,
            config,
            state: PipelineState::Building,
            completed: false,
        }
    }

    /// Current state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Whether a terminal outcome has been delivered.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// The current collection: the initial one until a run succeeds, the
    /// final result afterwards.
    pub fn collection(&self) -> &Value {
        &self.collection
    }

    /// The steps this pipeline runs, in order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// The pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Execute every step in order and deliver the outcome.
    ///
    /// The first failing step ends the run: later steps never start, the
    /// error callback is invoked right away and the state becomes
    /// [`PipelineState::Failed`]. On success the runner yields to the
    /// scheduler once, then stores the result as the current collection,
    /// invokes the success callback and moves to [`PipelineState::Succeeded`].
    ///
    /// The outcome is also returned. A pipeline runs at most once; later
    /// calls fail with [`Error::AlreadyRun`] and invoke no callback.
    ///
    /// # Cancel safety
    ///
    /// Dropping the returned future before it resolves (for example under
    /// `tokio::time::timeout` or `select!`) still ends the run: the state
    /// becomes [`PipelineState::Failed`] and [`Error::Cancelled`] is
    /// delivered to the error callback.
    pub async fn run(&mut self) -> Result<Value> {
        if self.state != PipelineState::Building {
            return Err(Error::AlreadyRun);
        }
        if !self.terminal.has_error_callback() {
            tracing::debug!(pipeline = %self.config.name, "running without an error callback");
        }
        self.transition(PipelineState::Running);

        let steps = Arc::clone(&self.steps);
        let config = self.config.clone();
        let initial = self.collection.clone();
        let mut guard = RunGuard {
            pipeline: self,
            finished: false,
        };

        let span = config.tracing.pipeline_span(&config.name, steps.len());
        let outcome = execute(initial, &steps, &config).instrument(span).await;

        let outcome = match outcome {
            Ok(result) => {
                tokio::task::yield_now().await;
                guard.pipeline.collection = result.clone();
                let outcome = Ok(result);
                guard.pipeline.complete(PipelineState::Succeeded, &outcome);
                outcome
            }
            Err(error) => {
                trace_step_failed(&error);
                let outcome = Err(error);
                guard.pipeline.complete(PipelineState::Failed, &outcome);
                outcome
            }
        };
        guard.finished = true;
        outcome
    }

    /// Run on a new tokio task.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn(mut self) -> PipelineHandle {
        let task = tokio::spawn(async move {
            let outcome = self.run().await;
            (self, outcome)
        });
        PipelineHandle { task }
    }

    fn complete(&mut self, state: PipelineState, outcome: &Result<Value>) {
        self.transition(state);
        if self.terminal.deliver(outcome) {
            self.completed = true;
        }
        record_pipeline_completed(&self.config.name, outcome.is_ok());
    }

    fn transition(&mut self, to: PipelineState) {
        trace_state_change(&self.config.name, self.state, to);
        self.state = to;
    }
}

/// Ends a run whose future was dropped mid-flight.
struct RunGuard<'a> {
    pipeline: &'a mut Pipeline,
    finished: bool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!(
                pipeline = %self.pipeline.config.name,
                "pipeline run dropped before completion"
            );
            self.pipeline.complete(PipelineState::Failed, &Err(Error::Cancelled));
        }
    }
}

async fn execute(initial: Value, steps: &[Step], config: &PipelineConfig) -> Result<Value> {
    let mut current = initial;
    for step in steps {
        let kind = step.kind();
        let items = into_sequence(current);
        let metrics = StepMetrics::new(&config.name, kind);
        metrics.record_input(items.len());
        trace_step_started(step.index(), kind, items.len());

        let started = metrics.start_timer();
        let outcome = run_operation(step.operation(), items, config.concurrency)
            .instrument(config.tracing.step_span(&config.name, step.index(), kind))
            .await;
        metrics.record_outcome(outcome.is_ok(), started.elapsed());

        current = outcome
            .map_err(|failure| Error::predicate(step.index(), kind, failure.index, failure.source))?;
        let output_len = if kind.yields_sequence() {
            current.as_array().map(Vec::len)
        } else {
            None
        };
        trace_step_finished(step.index(), kind, output_len);
    }
    Ok(current)
}

/// Handle to a pipeline running on its own task.
pub struct PipelineHandle {
    task: JoinHandle<(Pipeline, Result<Value>)>,
}

impl PipelineHandle {
    /// Whether the run has finished.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the run and return its outcome.
    pub async fn wait(self) -> Result<Value> {
        self.join().await.and_then(|(_, outcome)| outcome)
    }

    /// Wait for the run and return the finished pipeline with its outcome.
    pub async fn join(self) -> Result<(Pipeline, Result<Value>)> {
        self.task
            .await
            .map_err(|e| Error::Join(e.to_string()))
    }
}
