//! Pipeline lifecycle state and terminal callbacks.

use std::fmt;

use serde_json::Value;

use crate::error::{Error, Result};

/// State of a pipeline.
///
/// `Building → Running → { Succeeded | Failed }`. Both outcomes are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PipelineState {
    /// Steps are being declared or the pipeline has not been handed off yet.
    #[default]
    Building,
    /// The steps are executing.
    Running,
    /// Every step completed; the final collection was delivered.
    Succeeded,
    /// A step failed; the error was delivered.
    Failed,
}

impl PipelineState {
    /// Whether no further transitions can happen.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Succeeded | PipelineState::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Building => "Building",
            PipelineState::Running => "Running",
            PipelineState::Succeeded => "Succeeded",
            PipelineState::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// Receives the final collection of a successful run.
pub type SuccessCallback = Box<dyn FnOnce(Value) + Send>;

/// Receives the first error of a failed run.
pub type ErrorCallback = Box<dyn FnOnce(Error) + Send>;

/// The caller's success/error callback pair.
///
/// Delivery happens at most once; whichever outcome is delivered first
/// consumes both callbacks.
#[derive(Default)]
pub(crate) struct Terminal {
    on_success: Option<SuccessCallback>,
    on_error: Option<ErrorCallback>,
    delivered: bool,
}

impl Terminal {
    pub(crate) fn set_success(&mut self, callback: SuccessCallback) {
        self.on_success = Some(callback);
    }

    pub(crate) fn set_error(&mut self, callback: ErrorCallback) {
        self.on_error = Some(callback);
    }

    pub(crate) fn has_error_callback(&self) -> bool {
        self.on_error.is_some()
    }

    /// Deliver `outcome` to the matching callback.
    ///
    /// Returns `false` if an outcome was already delivered.
    pub(crate) fn deliver(&mut self, outcome: &Result<Value>) -> bool {
        if self.delivered {
            return false;
        }
        self.delivered = true;

        let on_success = self.on_success.take();
        let on_error = self.on_error.take();
        match outcome {
            Ok(value) => {
                if let Some(callback) = on_success {
                    callback(value.clone());
                }
            }
            Err(error) => match on_error {
                Some(callback) => callback(error.clone()),
                None => tracing::warn!(error = %error, "pipeline failed with no error callback"),
            },
        }
        true
    }
}

impl fmt::Debug for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Terminal")
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("delivered", &self.delivered)
            .finish()
    }
}
