//! Asynchronous per-element predicates.
//!
//! A predicate is the caller's function a step runs once per element. Each
//! shape is stored behind an `Arc` so a step can hand clones to every element
//! in flight.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;

use crate::error::BoxError;

/// Outcome of a single predicate invocation.
pub type PredicateResult<T> = std::result::Result<T, BoxError>;

/// Element to new value (each, map, concat, sortBy).
pub type TransformFn = Arc<dyn Fn(Value) -> BoxFuture<'static, PredicateResult<Value>> + Send + Sync>;

/// Element to verdict (filter, reject, find, some, every).
pub type TestFn = Arc<dyn Fn(Value) -> BoxFuture<'static, PredicateResult<bool>> + Send + Sync>;

/// Element and accumulator to new accumulator (reduce, reduceRight).
pub type FoldFn =
    Arc<dyn Fn(Value, Value) -> BoxFuture<'static, PredicateResult<Value>> + Send + Sync>;

/// A predicate of one of the supported shapes.
#[derive(Clone)]
pub enum Predicate {
    /// No predicate; the operation is fully described by its arguments.
    None,
    /// See [`TransformFn`].
    Transform(TransformFn),
    /// See [`TestFn`].
    Test(TestFn),
    /// See [`FoldFn`].
    Fold(FoldFn),
}

impl Predicate {
    /// Wrap an async element transform.
    pub fn transform<F, Fut>(f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PredicateResult<Value>> + Send + 'static,
    {
        Predicate::Transform(transform_fn(f))
    }

    /// Wrap an async element test.
    pub fn test<F, Fut>(f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PredicateResult<bool>> + Send + 'static,
    {
        Predicate::Test(test_fn(f))
    }

    /// Wrap an async fold step, called as `f(element, accumulator)`.
    pub fn fold<F, Fut>(f: F) -> Self
    where
        F: Fn(Value, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PredicateResult<Value>> + Send + 'static,
    {
        Predicate::Fold(fold_fn(f))
    }

    /// Short name of the shape, for error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            Predicate::None => "none",
            Predicate::Transform(_) => "transform",
            Predicate::Test(_) => "test",
            Predicate::Fold(_) => "fold",
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate::{}", self.shape())
    }
}

pub(crate) fn transform_fn<F, Fut>(f: F) -> TransformFn
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = PredicateResult<Value>> + Send + 'static,
{
    Arc::new(move |item| f(item).boxed())
}

pub(crate) fn test_fn<F, Fut>(f: F) -> TestFn
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = PredicateResult<bool>> + Send + 'static,
{
    Arc::new(move |item| f(item).boxed())
}

pub(crate) fn fold_fn<F, Fut>(f: F) -> FoldFn
where
    F: Fn(Value, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = PredicateResult<Value>> + Send + 'static,
{
    Arc::new(move |item, memo| f(item, memo).boxed())
}
