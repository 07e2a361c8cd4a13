//! salesboard - sales task tracking library
//!
//! An in-memory tracker for sales tasks. Each task carries the revenue it
//! brought in and the hours spent on it; the library ranks tasks by return
//! on time invested and reports aggregate performance.
//!
//! # Core Concepts
//!
//! - **Sanitizer**: the single trust boundary turning loose JSON into tasks
//! - **Derived tasks**: tasks plus ROI, recomputed on every read
//! - **Store**: owned task collection with single-slot delete undo
//! - **Loader**: one-time bootstrap with a generated fallback
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `clock`: Injectable time source
//! - `config`: Configuration loading from `.salesboard.toml`
//! - `derive`: ROI derivation and display ordering
//! - `edit`: Guarded edits from the details surface
//! - `error`: Error types and result aliases
//! - `insights`: Revenue breakdowns and ROI distribution
//! - `loader`: Task sources and bootstrap
//! - `metrics`: Aggregate metrics and performance grade
//! - `output`: Human and JSON output envelopes
//! - `sanitize`: Record normalization
//! - `seed`: Deterministic synthetic task generator
//! - `store`: Task store and undo state machine
//! - `task`: Task model and loose input types

pub mod cli;
pub mod clock;
pub mod config;
pub mod derive;
pub mod edit;
pub mod error;
pub mod insights;
pub mod loader;
pub mod metrics;
pub mod output;
pub mod sanitize;
pub mod seed;
pub mod store;
pub mod task;

pub use error::{Error, Result};
