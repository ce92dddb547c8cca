//! # tfjs-convert
//!
//! Turn a TensorFlow SavedModel into a TensorFlow.js model the web app can
//! load, by driving the external `tensorflowjs_converter` and then checking
//! that the expected files actually landed on disk.
//!
//! The conversion itself (graph rewriting, weight packing) belongs entirely
//! to the converter. This crate makes the run reproducible: it makes sure the
//! converter is installed, refuses to start without a complete input,
//! invokes the tool with a fixed argument set, and judges the result by the
//! output directory rather than by the tool's exit code alone.
//!
//! ## Workflow
//!
//! ```text
//! public/models/saved_model/
//!  │
//!  ├─ 1. Dependency  probe `tensorflowjs_converter --version`, pip-install if missing
//!  ├─ 2. Input       saved_model.pb must exist (fail fast, nothing spawned)
//!  ├─ 3. Convert     tensorflowjs_converter --input_format=tf_saved_model …
//!  ├─ 4. Output      model.json must exist; list *.bin weight shards
//!  └─ 5. Report      ConversionReport / exit code 0, or ConvertError / exit code 1
//!  │
//! public/models/baby_cry_detector/
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tfjs_convert::{convert, exit_code, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> std::process::ExitCode {
//!     let config = ConversionConfig::builder().root(".").build().unwrap();
//!     let result = convert(&config).await;
//!     match &result {
//!         Ok(report) => println!("{} weight file(s)", report.weight_file_count()),
//!         Err(e) => eprintln!("❌ {e}"),
//!     }
//!     std::process::ExitCode::from(exit_code(&result))
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `convert-model` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, DEFAULT_INPUT_DIR, DEFAULT_OUTPUT_DIR};
pub use convert::{convert, convert_sync, exit_code, inspect_output};
pub use error::ConvertError;
pub use output::{ConversionReport, DependencyStatus};
pub use pipeline::input::InputArtifacts;
pub use pipeline::invoke::Invocation;
pub use pipeline::verify::{ManifestCheck, OutputArtifacts};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
pub use tfjs_auto::{ConverterTool, Installer};
