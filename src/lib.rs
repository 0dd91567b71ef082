//! # linemunge
//!
//! Lazy, composable pipelines over lines of text.
//!
//! A pipeline starts at a source (a file, a live-tailed file, or an
//! in-memory sequence), passes through transform and filter stages, and ends
//! in a terminal action that drains it: write, display, reduce, sort, or
//! merge with other pipelines.
//!
//! ## Overview
//!
//! - **Pull-based**: nothing is read until a terminal action pulls
//! - **Single pass**: a pipeline is consumed as it is pulled
//! - **Owned chains**: closing the tip closes every ancestor exactly once
//! - **Disk-backed sort**: sorted output is re-read from a temporary file
//! - **K-way merge**: combines already-sorted pipelines without buffering
//!
//! ## Example
//!
//! ```
//! use linemunge::Pipeline;
//!
//! let log = vec![
//!     "10.0.0.1 GET /index.html 200\n".to_string(),
//!     "10.0.0.2 GET /missing 404\n".to_string(),
//!     "10.0.0.3 GET /gone 404\n".to_string(),
//! ];
//!
//! let missing = Pipeline::from_values(log)
//!     .split(" ")
//!     .keep_if_field_matches(3, "404")
//!     .field(2)
//!     .collect_vec()
//!     .unwrap();
//!
//! assert_eq!(missing, vec!["/missing\n", "/gone\n"]);
//! ```

pub mod element;
pub mod error;
pub mod lines;
pub mod merge;
pub mod pipeline;
pub mod sink;
pub mod sort;
pub mod source;
pub mod stage;
pub mod tail;

pub use element::{Fields, Render};
pub use error::{Error, Result};
pub use lines::Pattern;
pub use merge::MergeStage;
pub use pipeline::{Elements, Pipeline};
pub use sort::{Comparator, Order};
pub use source::{IterSource, LineSource};
pub use stage::{FilterStage, MapStage, Stage};
pub use tail::{CancelToken, TailOptions, TailSource};
