//! # During
//!
//! Deferred, chainable pipelines of asynchronous collection operations.
//!
//! A pipeline starts from a collection, accumulates steps such as `map`,
//! `filter` or `reduce`, and runs them strictly in declaration order. Inside a
//! step the caller's async predicate runs once per element, with bounded
//! in-flight concurrency; the step's fully materialized output becomes the
//! next step's input. A run delivers exactly one terminal outcome: the final
//! collection, or the first error.
//!
//! ## Features
//!
//! - **Explicit two-phase lifecycle**: declare steps on a builder, then run
//!   the frozen pipeline once
//! - **Ordered results**: sequence operations keep input order no matter
//!   which predicate finishes first
//! - **Early exit**: `find`, `some` and `every` stop dispatching once their
//!   answer is known
//! - **First error wins**: a failing step ends the run and no later step starts
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use during::prelude::*;
//! use serde_json::json;
//!
//! let mut pipeline = during(json!([1, 2, 3]))
//!     .map(|x| async move { Ok(json!(x.as_i64().unwrap_or(0) * 2)) })
//!     .reduce(0, |x, sum| async move {
//!         Ok(json!(sum.as_i64().unwrap_or(0) + x.as_i64().unwrap_or(0)))
//!     })
//!     .then(|total| println!("total: {total}"), |err| eprintln!("failed: {err}"))
//!     .build();
//!
//! pipeline.run().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod observability;
pub mod operation;
pub mod pipeline;
pub mod value;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::during;
    pub use crate::error::{BoxError, Error, Result};
    pub use crate::operation::{OperationKind, Predicate, PredicateResult};
    pub use crate::pipeline::{Pipeline, PipelineBuilder, PipelineConfig, PipelineState};
}

pub use error::{BoxError, Error, Result};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineConfig, PipelineState};

/// Start a pipeline over `collection`.
///
/// Shorthand for [`PipelineBuilder::new`]; a value that is not an array
/// becomes a one-element collection.
pub fn during(collection: impl Into<serde_json::Value>) -> PipelineBuilder {
    PipelineBuilder::new(collection)
}
