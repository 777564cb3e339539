//! The fixed catalog of operation names.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Tag identifying which registered algorithm a step invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Run the predicate for every element.
    Each,
    /// Run the predicate for every element, last element first.
    EachRight,
    /// Replace every element with the predicate's result.
    Map,
    /// Fold left to right from a seed.
    Reduce,
    /// Fold right to left from a seed.
    ReduceRight,
    /// Map, then flatten array results one level.
    Concat,
    /// Keep the elements the predicate accepts.
    Filter,
    /// Drop the elements the predicate accepts.
    Reject,
    /// First element the predicate accepts.
    Find,
    /// Whether any element is accepted.
    Some,
    /// Whether every element is accepted.
    Every,
    /// Sort by the criterion the predicate computes.
    SortBy,
    /// Keep the elements whose fields match a comparison object.
    Where,
    /// First element whose fields match a comparison object.
    FindWhere,
    /// Project a named field of every element.
    Pluck,
}

impl OperationKind {
    /// Every registered operation, in catalog order.
    pub const ALL: [OperationKind; 15] = [
        OperationKind::Each,
        OperationKind::EachRight,
        OperationKind::Map,
        OperationKind::Reduce,
        OperationKind::ReduceRight,
        OperationKind::Concat,
        OperationKind::Filter,
        OperationKind::Reject,
        OperationKind::Find,
        OperationKind::Some,
        OperationKind::Every,
        OperationKind::SortBy,
        OperationKind::Where,
        OperationKind::FindWhere,
        OperationKind::Pluck,
    ];

    /// The registered name of this operation.
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::Each => "each",
            OperationKind::EachRight => "eachRight",
            OperationKind::Map => "map",
            OperationKind::Reduce => "reduce",
            OperationKind::ReduceRight => "reduceRight",
            OperationKind::Concat => "concat",
            OperationKind::Filter => "filter",
            OperationKind::Reject => "reject",
            OperationKind::Find => "find",
            OperationKind::Some => "some",
            OperationKind::Every => "every",
            OperationKind::SortBy => "sortBy",
            OperationKind::Where => "where",
            OperationKind::FindWhere => "findWhere",
            OperationKind::Pluck => "pluck",
        }
    }

    /// Whether the operation yields a sequence (as opposed to a single value).
    pub fn yields_sequence(&self) -> bool {
        !matches!(
            self,
            OperationKind::Reduce
                | OperationKind::ReduceRight
                | OperationKind::Find
                | OperationKind::Some
                | OperationKind::Every
                | OperationKind::FindWhere
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OperationKind {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Error> {
        OperationKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| Error::UnknownOperation(name.to_string()))
    }
}
