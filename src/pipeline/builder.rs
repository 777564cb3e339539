//! Fluent pipeline builder.
//!
//! The builder is the declaration phase of a pipeline: each chaining method
//! appends one step and hands the builder back. Nothing runs until the
//! builder is frozen with [`PipelineBuilder::build`] and the resulting
//! [`Pipeline`] is run.
//!
//! # Example
//!
//! ```rust,ignore
//! use during::during;
//! use serde_json::json;
//!
//! let mut pipeline = during(json!([1, 2, 3]))
//!     .map(|x| async move { Ok(json!(x.as_i64().unwrap_or(0) * 2)) })
//!     .reduce(0, |x, sum| async move {
//!         Ok(json!(sum.as_i64().unwrap_or(0) + x.as_i64().unwrap_or(0)))
//!     })
//!     .build();
//!
//! assert_eq!(pipeline.run().await?, json!(12));
//! ```

use std::future::Future;

use serde_json::{Map, Value};

use super::config::PipelineConfig;
use super::runner::Pipeline;
use super::state::Terminal;
use crate::error::{Error, Result};
use crate::operation::{
    Operation, OperationKind, Predicate, PredicateResult, Step, fold_fn, test_fn, transform_fn,
};
use crate::value::into_sequence;

/// A fluent builder accumulating the steps of a pipeline.
#[derive(Debug)]
pub struct PipelineBuilder {
    collection: Value,
    steps: Vec<Step>,
    terminal: Terminal,
    config: PipelineConfig,
}

impl PipelineBuilder {
    /// Start a pipeline over `collection`.
    ///
    /// A value that is not an array becomes a one-element collection.
    pub fn new(collection: impl Into<Value>) -> Self {
        Self {
            collection: Value::Array(into_sequence(collection.into())),
            steps: Vec::new(),
            terminal: Terminal::default(),
            config: PipelineConfig::default(),
        }
    }

    /// Use the given configuration.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the name used in spans and metric labels.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Cap the number of predicate invocations in flight per step.
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.config.concurrency = Some(limit);
        self
    }

    /// Append a step by operation name.
    ///
    /// Fails immediately with [`Error::UnknownOperation`] if no operation is
    /// registered under `name`, or [`Error::InvalidArguments`] if `args` or
    /// `predicate` do not fit it. See [`Operation::from_parts`].
    pub fn chain(self, name: &str, args: Vec<Value>, predicate: Predicate) -> Result<Self> {
        let kind: OperationKind = name.parse()?;
        let operation = Operation::from_parts(kind, args, predicate)?;
        Ok(self.push(operation))
    }

    fn push(mut self, operation: Operation) -> Self {
        let index = self.steps.len();
        self.steps.push(Step::new(index, operation));
        self
    }

    /// Run `f` for every element. The collection passes through unchanged.
    pub fn each<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PredicateResult<()>> + Send + 'static,
    {
        self.push(Operation::Each(unit_transform(f)))
    }

    /// Run `f` for every element, last element first. The collection passes
    /// through unchanged and in its original order.
    pub fn each_right<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PredicateResult<()>> + Send + 'static,
    {
        self.push(Operation::EachRight(unit_transform(f)))
    }

    /// Replace every element with `f(element)`, keeping input order.
    pub fn map<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PredicateResult<Value>> + Send + 'static,
    {
        self.push(Operation::Map(transform_fn(f)))
    }

    /// Fold left to right; `f` is called as `f(element, accumulator)`.
    pub fn reduce<F, Fut>(self, seed: impl Into<Value>, f: F) -> Self
    where
        F: Fn(Value, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PredicateResult<Value>> + Send + 'static,
    {
        self.push(Operation::Reduce {
            seed: seed.into(),
            fold: fold_fn(f),
        })
    }

    /// Fold right to left; `f` is called as `f(element, accumulator)`.
    pub fn reduce_right<F, Fut>(self, seed: impl Into<Value>, f: F) -> Self
    where
        F: Fn(Value, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PredicateResult<Value>> + Send + 'static,
    {
        self.push(Operation::ReduceRight {
            seed: seed.into(),
            fold: fold_fn(f),
        })
    }

    /// Map every element, flattening array results one level.
    pub fn concat<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PredicateResult<Value>> + Send + 'static,
    {
        self.push(Operation::Concat(transform_fn(f)))
    }

    /// Keep the elements `f` accepts.
    pub fn filter<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PredicateResult<bool>> + Send + 'static,
    {
        self.push(Operation::Filter(test_fn(f)))
    }

    /// Drop the elements `f` accepts.
    pub fn reject<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PredicateResult<bool>> + Send + 'static,
    {
        self.push(Operation::Reject(test_fn(f)))
    }

    /// The first element `f` accepts, or `null`.
    pub fn find<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PredicateResult<bool>> + Send + 'static,
    {
        self.push(Operation::Find(test_fn(f)))
    }

    /// `true` if `f` accepts any element.
    pub fn some<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PredicateResult<bool>> + Send + 'static,
    {
        self.push(Operation::Some(test_fn(f)))
    }

    /// `true` if `f` accepts every element.
    pub fn every<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PredicateResult<bool>> + Send + 'static,
    {
        self.push(Operation::Every(test_fn(f)))
    }

    /// Stable sort by the criterion `f` computes for each element.
    pub fn sort_by<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PredicateResult<Value>> + Send + 'static,
    {
        self.push(Operation::SortBy(transform_fn(f)))
    }

    /// Keep the elements whose fields strictly equal every entry of `comparison`.
    pub fn where_matches<K, V>(self, comparison: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.push(Operation::Where(comparison_map(comparison)))
    }

    /// The first element whose fields strictly equal every entry of
    /// `comparison`, or `null`.
    pub fn find_where<K, V>(self, comparison: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.push(Operation::FindWhere(comparison_map(comparison)))
    }

    /// Replace every element with its `key` field (`null` when absent).
    pub fn pluck(self, key: impl Into<String>) -> Self {
        self.push(Operation::Pluck(key.into()))
    }

    /// Register both terminal callbacks.
    ///
    /// At most one of them is ever invoked, at most once.
    pub fn then<S, E>(self, on_success: S, on_error: E) -> Self
    where
        S: FnOnce(Value) + Send + 'static,
        E: FnOnce(Error) + Send + 'static,
    {
        self.on_success(on_success).on_error(on_error)
    }

    /// Register the success callback.
    pub fn on_success<S>(mut self, callback: S) -> Self
    where
        S: FnOnce(Value) + Send + 'static,
    {
        self.terminal.set_success(Box::new(callback));
        self
    }

    /// Register the error callback.
    ///
    /// Register one before running: without it a failure is only logged and
    /// returned from [`Pipeline::run`].
    pub fn on_error<E>(mut self, callback: E) -> Self
    where
        E: FnOnce(Error) + Send + 'static,
    {
        self.terminal.set_error(Box::new(callback));
        self
    }

    /// The steps declared so far.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Freeze the collection and steps into a runnable pipeline.
    pub fn build(self) -> Pipeline {
        Pipeline::new(self.collection, self.steps.into(), self.terminal, self.config)
    }
}

fn unit_transform<F, Fut>(f: F) -> crate::operation::TransformFn
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = PredicateResult<()>> + Send + 'static,
{
    transform_fn(move |item| {
        let pending = f(item);
        async move { pending.await.map(|()| Value::Null) }
    })
}

fn comparison_map<K, V>(comparison: impl IntoIterator<Item = (K, V)>) -> Map<String, Value>
where
    K: Into<String>,
    V: Into<Value>,
{
    comparison
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}
