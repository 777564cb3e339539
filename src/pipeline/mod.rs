//! Pipeline construction and execution.
//!
//! - [`PipelineBuilder`]: declares the ordered steps
//! - [`Pipeline`]: the frozen plan, run exactly once
//! - [`PipelineState`]: `Building → Running → { Succeeded | Failed }`
//!
//! # Example
//!
//! ```rust,ignore
//! use during::pipeline::PipelineBuilder;
//! use serde_json::json;
//!
//! let people = json!([{"name": "scott", "age": 29}, {"name": "lindsay", "age": 25}]);
//!
//! let mut pipeline = PipelineBuilder::new(people)
//!     .filter(|p| async move { Ok(p["age"] == 29) })
//!     .then(|found| println!("{found}"), |err| eprintln!("{err}"))
//!     .build();
//!
//! pipeline.run().await?;
//! ```

mod builder;
mod config;
mod runner;
mod state;

pub use builder::PipelineBuilder;
pub use config::PipelineConfig;
pub use runner::{Pipeline, PipelineHandle};
pub use state::{ErrorCallback, PipelineState, SuccessCallback};
