//! Progress-callback trait for per-stage workflow events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the workflow moves through its stages:
//!
//! ```text
//! Start → CheckingDependency → [Installing] → ValidatingInput
//!       → Converting → ValidatingOutput → {Success, Failure}
//! ```
//!
//! Every started stage ends with exactly one of `on_stage_complete` or
//! `on_stage_failed`. No stage is started after a failure.
//!
//! # Example
//!
//! ```rust
//! use tfjs_convert::{ConversionConfig, ConversionProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl ConversionProgressCallback for Printer {
//!     fn on_stage_complete(&self, stage: Stage, detail: &str) {
//!         eprintln!("[{stage}] {detail}");
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// A step of the conversion workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Probing `tensorflowjs_converter --version`.
    CheckingDependency,
    /// Installing the converter package (only if the probe failed).
    Installing,
    /// Checking the SavedModel directory and its descriptor.
    ValidatingInput,
    /// Running the converter.
    Converting,
    /// Checking `model.json` and listing weight shards.
    ValidatingOutput,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::CheckingDependency => "Checking dependency",
            Stage::Installing => "Installing",
            Stage::ValidatingInput => "Validating input",
            Stage::Converting => "Converting",
            Stage::ValidatingOutput => "Validating output",
        };
        f.write_str(label)
    }
}

/// Called by the workflow driver as it moves between stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `on_stage_start` for [`Stage::Installing`] and
/// `on_tool_output` may fire from a blocking worker thread, hence
/// `Send + Sync`.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called when a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage succeeds.
    ///
    /// # Arguments
    /// * `stage`: the stage that finished
    /// * `detail`: one-line human-readable summary
    fn on_stage_complete(&self, stage: Stage, detail: &str) {
        let _ = (stage, detail);
    }

    /// Called when a stage fails; the workflow stops right after.
    ///
    /// # Arguments
    /// * `stage`: the stage that failed
    /// * `error`: human-readable error description
    fn on_stage_failed(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }

    /// One line of converter stdout/stderr, forwarded verbatim.
    fn on_tool_output(&self, line: &str) {
        let _ = line;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ConversionProgressCallback for Recorder {
        fn on_stage_start(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("start {stage}"));
        }

        fn on_stage_failed(&self, stage: Stage, _error: &str) {
            self.events.lock().unwrap().push(format!("fail {stage}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_stage_start(Stage::Converting);
        cb.on_tool_output("Writing weight file model.json...");
        cb.on_stage_complete(Stage::Converting, "done");
        cb.on_stage_failed(Stage::ValidatingOutput, "missing");
    }

    #[test]
    fn partial_override_receives_events() {
        let rec = Arc::new(Recorder::default());
        let cb: ProgressCallback = rec.clone();
        cb.on_stage_start(Stage::ValidatingInput);
        cb.on_stage_complete(Stage::ValidatingInput, "ok");
        cb.on_stage_failed(Stage::Converting, "exit status 1");
        assert_eq!(
            *rec.events.lock().unwrap(),
            vec!["start Validating input", "fail Converting"]
        );
    }

    #[test]
    fn stage_serialises_snake_case() {
        let json = serde_json::to_string(&Stage::CheckingDependency).unwrap();
        assert_eq!(json, "\"checking_dependency\"");
    }
}
