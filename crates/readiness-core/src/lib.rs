//! readiness-core — Assessment state, autosave and scoring.
//!
//! This crate defines the answer store, the durable autosave pipeline, the
//! per-section save/advance controller, and the results calculation that the
//! rest of the readiness system builds on.

pub mod error;
pub mod model;
pub mod parser;
pub mod persistence;
pub mod progress;
pub mod results;
pub mod section;
pub mod storage;
pub mod store;
pub mod traits;
