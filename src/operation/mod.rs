//! Step registry: the catalog of collection operations a pipeline can run.
//!
//! Every [`OperationKind`] has exactly one [`Operation`] variant carrying
//! its normalized arguments and predicate. [`run_operation`] is the single
//! dispatch point from a variant to the bounded-concurrency algorithm that
//! implements it.
//!
//! # Example
//!
//! ```rust,ignore
//! use during::operation::{Operation, OperationKind, Predicate};
//! use serde_json::json;
//!
//! let op = Operation::from_parts(OperationKind::Pluck, vec![json!("name")], Predicate::None)?;
//! assert_eq!(op.kind(), OperationKind::Pluck);
//! ```

mod dispatch;
mod kind;
mod predicate;

use std::fmt;

use serde_json::{Map, Value};

use crate::error::{Error, Result};

pub use dispatch::{ElementError, StepOutcome, run_operation};
pub use kind::OperationKind;
pub use predicate::{FoldFn, Predicate, PredicateResult, TestFn, TransformFn};
pub(crate) use predicate::{fold_fn, test_fn, transform_fn};

/// A registered operation with its arguments bound.
#[derive(Clone)]
pub enum Operation {
    /// See [`OperationKind::Each`].
    Each(TransformFn),
    /// See [`OperationKind::EachRight`].
    EachRight(TransformFn),
    /// See [`OperationKind::Map`].
    Map(TransformFn),
    /// See [`OperationKind::Reduce`].
    Reduce {
        /// Initial accumulator.
        seed: Value,
        /// Called as `fold(element, accumulator)`.
        fold: FoldFn,
    },
    /// See [`OperationKind::ReduceRight`].
    ReduceRight {
        /// Initial accumulator.
        seed: Value,
        /// Called as `fold(element, accumulator)`.
        fold: FoldFn,
    },
    /// See [`OperationKind::Concat`].
    Concat(TransformFn),
    /// See [`OperationKind::Filter`].
    Filter(TestFn),
    /// See [`OperationKind::Reject`].
    Reject(TestFn),
    /// See [`OperationKind::Find`].
    Find(TestFn),
    /// See [`OperationKind::Some`].
    Some(TestFn),
    /// See [`OperationKind::Every`].
    Every(TestFn),
    /// See [`OperationKind::SortBy`].
    SortBy(TransformFn),
    /// See [`OperationKind::Where`].
    Where(Map<String, Value>),
    /// See [`OperationKind::FindWhere`].
    FindWhere(Map<String, Value>),
    /// See [`OperationKind::Pluck`].
    Pluck(String),
}

impl Operation {
    /// Bind positional arguments and a predicate to an operation kind.
    ///
    /// `reduce` and `reduceRight` take their seed from `args[0]` (`null` when
    /// absent). `where` and `findWhere` take a comparison object and `pluck` a
    /// field name from `args[0]`; these three take [`Predicate::None`].
    /// Extra arguments are ignored.
    pub fn from_parts(kind: OperationKind, args: Vec<Value>, predicate: Predicate) -> Result<Self> {
        let mut args = args.into_iter();
        let op = match (kind, predicate) {
            (OperationKind::Each, Predicate::Transform(f)) => Operation::Each(f),
            (OperationKind::EachRight, Predicate::Transform(f)) => Operation::EachRight(f),
            (OperationKind::Map, Predicate::Transform(f)) => Operation::Map(f),
            (OperationKind::Concat, Predicate::Transform(f)) => Operation::Concat(f),
            (OperationKind::SortBy, Predicate::Transform(f)) => Operation::SortBy(f),
            (OperationKind::Reduce, Predicate::Fold(fold)) => Operation::Reduce {
                seed: args.next().unwrap_or(Value::Null),
                fold,
            },
            (OperationKind::ReduceRight, Predicate::Fold(fold)) => Operation::ReduceRight {
                seed: args.next().unwrap_or(Value::Null),
                fold,
            },
            (OperationKind::Filter, Predicate::Test(f)) => Operation::Filter(f),
            (OperationKind::Reject, Predicate::Test(f)) => Operation::Reject(f),
            (OperationKind::Find, Predicate::Test(f)) => Operation::Find(f),
            (OperationKind::Some, Predicate::Test(f)) => Operation::Some(f),
            (OperationKind::Every, Predicate::Test(f)) => Operation::Every(f),
            (OperationKind::Where, Predicate::None) => Operation::Where(comparison(kind, args.next())?),
            (OperationKind::FindWhere, Predicate::None) => {
                Operation::FindWhere(comparison(kind, args.next())?)
            }
            (OperationKind::Pluck, Predicate::None) => match args.next() {
                Some(Value::String(key)) => Operation::Pluck(key),
                _ => return Err(Error::invalid_arguments(kind, "expected a field name")),
            },
            (kind, predicate) => {
                return Err(Error::invalid_arguments(
                    kind,
                    format!(
                        "expected a {} predicate, got {}",
                        expected_shape(kind),
                        predicate.shape()
                    ),
                ));
            }
        };
        Ok(op)
    }

    /// The tag of this operation.
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Each(_) => OperationKind::Each,
            Operation::EachRight(_) => OperationKind::EachRight,
            Operation::Map(_) => OperationKind::Map,
            Operation::Reduce { .. } => OperationKind::Reduce,
            Operation::ReduceRight { .. } => OperationKind::ReduceRight,
            Operation::Concat(_) => OperationKind::Concat,
            Operation::Filter(_) => OperationKind::Filter,
            Operation::Reject(_) => OperationKind::Reject,
            Operation::Find(_) => OperationKind::Find,
            Operation::Some(_) => OperationKind::Some,
            Operation::Every(_) => OperationKind::Every,
            Operation::SortBy(_) => OperationKind::SortBy,
            Operation::Where(_) => OperationKind::Where,
            Operation::FindWhere(_) => OperationKind::FindWhere,
            Operation::Pluck(_) => OperationKind::Pluck,
        }
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Reduce { seed, .. } | Operation::ReduceRight { seed, .. } => {
                write!(f, "{}(seed = {})", self.kind(), seed)
            }
            Operation::Where(comparison) | Operation::FindWhere(comparison) => {
                write!(f, "{}({})", self.kind(), Value::Object(comparison.clone()))
            }
            Operation::Pluck(key) => write!(f, "pluck({key:?})"),
            _ => write!(f, "{}", self.kind()),
        }
    }
}

fn expected_shape(kind: OperationKind) -> &'static str {
    match kind {
        OperationKind::Each
        | OperationKind::EachRight
        | OperationKind::Map
        | OperationKind::Concat
        | OperationKind::SortBy => "transform",
        OperationKind::Reduce | OperationKind::ReduceRight => "fold",
        OperationKind::Filter
        | OperationKind::Reject
        | OperationKind::Find
        | OperationKind::Some
        | OperationKind::Every => "test",
        OperationKind::Where | OperationKind::FindWhere | OperationKind::Pluck => "none",
    }
}

fn comparison(kind: OperationKind, arg: Option<Value>) -> Result<Map<String, Value>> {
    match arg {
        Some(Value::Object(map)) => Ok(map),
        _ => Err(Error::invalid_arguments(kind, "expected a comparison object")),
    }
}

/// One declared operation awaiting execution.
///
/// Steps are immutable once created; a pipeline only reads them.
#[derive(Debug, Clone)]
pub struct Step {
    index: usize,
    operation: Operation,
}

impl Step {
    pub(crate) fn new(index: usize, operation: Operation) -> Self {
        Self { index, operation }
    }

    /// Position of this step in its pipeline.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The bound operation.
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// The operation tag.
    pub fn kind(&self) -> OperationKind {
        self.operation.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reduce_seed_defaults_to_null() {
        let fold = Predicate::fold(|_item, memo| async move { Ok(memo) });
        let op = Operation::from_parts(OperationKind::Reduce, vec![], fold.clone()).unwrap();
        assert!(matches!(op, Operation::Reduce { seed: Value::Null, .. }));

        let op = Operation::from_parts(OperationKind::ReduceRight, vec![json!(""), json!(1)], fold)
            .unwrap();
        assert!(matches!(op, Operation::ReduceRight { seed, .. } if seed == json!("")));
    }

    #[test]
    fn test_wrong_shape_is_rejected() {
        let test = Predicate::test(|_| async { Ok(true) });
        let err = Operation::from_parts(OperationKind::Map, vec![], test).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidArguments { operation: OperationKind::Map, .. }
        ));
        assert!(err.to_string().contains("expected a transform predicate, got test"));
    }

    #[test]
    fn test_derived_operation_arguments() {
        let op = Operation::from_parts(
            OperationKind::Where,
            vec![json!({"age": 29})],
            Predicate::None,
        )
        .unwrap();
        assert_eq!(op.kind(), OperationKind::Where);

        assert!(
            Operation::from_parts(OperationKind::FindWhere, vec![json!(3)], Predicate::None)
                .is_err()
        );
        assert!(Operation::from_parts(OperationKind::Pluck, vec![], Predicate::None).is_err());

        let op =
            Operation::from_parts(OperationKind::Pluck, vec![json!("name")], Predicate::None)
                .unwrap();
        assert_eq!(format!("{op:?}"), "pluck(\"name\")");
    }
}
