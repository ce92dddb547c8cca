//! Pipeline stages for SavedModel → TensorFlow.js conversion.
//!
//! Each submodule implements exactly one step of the workflow and knows
//! nothing about the others; [`crate::convert`] sequences them.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ invoke ──▶ verify
//! (gate)   (converter) (model.json + *.bin)
//! ```
//!
//! 1. [`input`]: the SavedModel directory and `saved_model.pb` must exist;
//!    nothing is spawned otherwise
//! 2. [`invoke`]: run `tensorflowjs_converter` with the fixed argument set;
//!    the only stage with a child process
//! 3. [`verify`]: check the descriptor exists and enumerate weight shards
//!
//! Dependency resolution happens before all of these and lives in the
//! `tfjs-auto` crate.

pub mod input;
pub mod invoke;
pub mod verify;
