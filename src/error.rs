//! Error types for the tfjs-convert library.
//!
//! Every failure is fatal: the workflow is a straight line with no retry
//! edge, so there is a single [`ConvertError`] enum whose variants line up
//! with the stage that produced them (see [`ConvertError::stage`]). The
//! `Display` text is what the CLI prints after `❌`, so each message names
//! the offending path or command and, for dependency problems, the manual
//! install command.

use crate::progress::Stage;
use std::path::PathBuf;
use tfjs_auto::TfjsAutoError;
use thiserror::Error;

/// All errors returned by the tfjs-convert library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Dependency errors ────────────────────────────────────────────────
    /// The converter is missing and could not be installed.
    #[error(transparent)]
    Dependency(#[from] TfjsAutoError),

    // ── Input errors ─────────────────────────────────────────────────────
    /// The SavedModel directory does not exist.
    #[error("SavedModel not found at '{path}'")]
    InputNotFound { path: PathBuf },

    /// The SavedModel path exists but is a file.
    #[error("SavedModel path '{path}' is not a directory")]
    InputNotADirectory { path: PathBuf },

    /// The SavedModel directory lacks its graph descriptor.
    #[error("{descriptor} not found in '{dir}'")]
    InputDescriptorMissing { dir: PathBuf, descriptor: String },

    // ── Converter errors ─────────────────────────────────────────────────
    /// The converter process could not be started.
    #[error("Failed to start converter '{program}': {source}")]
    ConverterSpawnFailed {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The converter ran and exited unsuccessfully.
    #[error(
        "Conversion failed: '{}' exited with {}{}",
        .program.display(),
        .status,
        format_tail(.stderr_tail)
    )]
    ConverterFailed {
        program: PathBuf,
        status: String,
        stderr_tail: String,
    },

    // ── Output errors ────────────────────────────────────────────────────
    /// The converter reported success but the descriptor is not on disk.
    #[error("{} not created at '{}'", file_name(.path), .path.display())]
    OutputDescriptorMissing { path: PathBuf },

    /// The output directory could not be listed.
    #[error("Failed to read output directory '{path}': {source}")]
    OutputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ────────────────────────────────────────────────────────
    /// Unexpected internal error (e.g. a panicked blocking task).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// The workflow stage this error ends, if it belongs to one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ConvertError::Dependency(TfjsAutoError::NotInstalled { .. }) => {
                Some(Stage::CheckingDependency)
            }
            ConvertError::Dependency(_) => Some(Stage::Installing),
            ConvertError::InputNotFound { .. }
            | ConvertError::InputNotADirectory { .. }
            | ConvertError::InputDescriptorMissing { .. } => Some(Stage::ValidatingInput),
            ConvertError::ConverterSpawnFailed { .. } | ConvertError::ConverterFailed { .. } => {
                Some(Stage::Converting)
            }
            ConvertError::OutputDescriptorMissing { .. } | ConvertError::OutputUnreadable { .. } => {
                Some(Stage::ValidatingOutput)
            }
            ConvertError::InvalidConfig(_) | ConvertError::Internal(_) => None,
        }
    }

    /// Manual install command, for dependency failures.
    pub fn remediation(&self) -> Option<&str> {
        match self {
            ConvertError::Dependency(e) => Some(e.remediation()),
            _ => None,
        }
    }

    /// Process exit code for this failure. Always `1`: causes are told apart
    /// by the printed diagnostic, never by the code.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

fn format_tail(tail: &str) -> String {
    if tail.trim().is_empty() {
        String::new()
    } else {
        format!("\n{tail}")
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "descriptor".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converter_failed_display_with_tail() {
        let e = ConvertError::ConverterFailed {
            program: "tensorflowjs_converter".into(),
            status: "exit status 1".into(),
            stderr_tail: "ValueError: Unsupported signature".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("exit status 1"), "got: {msg}");
        assert!(msg.contains("Unsupported signature"), "got: {msg}");
    }

    #[test]
    fn converter_failed_display_without_tail() {
        let e = ConvertError::ConverterFailed {
            program: "tensorflowjs_converter".into(),
            status: "exit status 2".into(),
            stderr_tail: String::new(),
        };
        assert!(!e.to_string().ends_with('\n'));
    }

    #[test]
    fn output_descriptor_display_names_file() {
        let e = ConvertError::OutputDescriptorMissing {
            path: "public/models/baby_cry_detector/model.json".into(),
        };
        let msg = e.to_string();
        assert!(msg.starts_with("model.json not created"), "got: {msg}");
    }

    #[test]
    fn dependency_error_carries_remediation() {
        let e = ConvertError::from(TfjsAutoError::NotInstalled {
            program: "tensorflowjs_converter".into(),
            remediation: "pip install tensorflowjs".into(),
        });
        assert_eq!(e.remediation(), Some("pip install tensorflowjs"));
        assert_eq!(e.stage(), Some(Stage::CheckingDependency));
        assert!(e.to_string().contains("pip install tensorflowjs"));
    }

    #[test]
    fn install_failure_belongs_to_installing_stage() {
        let e = ConvertError::from(TfjsAutoError::InstallFailed {
            command: "python3 -m pip install tensorflowjs".into(),
            status: "exit status 1".into(),
            stderr_tail: String::new(),
            remediation: "pip install tensorflowjs".into(),
        });
        assert_eq!(e.stage(), Some(Stage::Installing));
    }

    #[test]
    fn every_failure_exits_with_one() {
        let errors = [
            ConvertError::InputNotFound { path: "x".into() },
            ConvertError::InvalidConfig("bad".into()),
            ConvertError::OutputDescriptorMissing {
                path: "out/model.json".into(),
            },
        ];
        for e in errors {
            assert_eq!(e.exit_code(), 1);
        }
    }
}
