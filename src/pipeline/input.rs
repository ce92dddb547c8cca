//! Input validation: the SavedModel directory must be in place before the
//! converter is ever spawned.
//!
//! Two checks gate the run: the directory exists (and is a directory), and
//! it contains the graph descriptor (`saved_model.pb`). A missing
//! `variables/` subdirectory is suspicious but not fatal; some exported
//! graphs have their weights frozen into the descriptor.

use crate::error::ConvertError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A SavedModel directory that passed validation.
#[derive(Debug, Clone, Serialize)]
pub struct InputArtifacts {
    pub dir: PathBuf,
    /// Path to the graph descriptor inside `dir`.
    pub descriptor: PathBuf,
    /// Whether the weight-variable subdirectory is present.
    pub has_variables: bool,
}

/// Validate the SavedModel directory `dir`.
///
/// # Errors
/// - [`ConvertError::InputNotFound`] if `dir` does not exist
/// - [`ConvertError::InputNotADirectory`] if `dir` is a file
/// - [`ConvertError::InputDescriptorMissing`] if `dir/<descriptor>` is not a file
pub fn validate_input(
    dir: &Path,
    descriptor: &str,
    variables_dir: &str,
) -> Result<InputArtifacts, ConvertError> {
    if !dir.exists() {
        return Err(ConvertError::InputNotFound {
            path: dir.to_path_buf(),
        });
    }
    if !dir.is_dir() {
        return Err(ConvertError::InputNotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let descriptor_path = dir.join(descriptor);
    if !descriptor_path.is_file() {
        return Err(ConvertError::InputDescriptorMissing {
            dir: dir.to_path_buf(),
            descriptor: descriptor.to_string(),
        });
    }

    let has_variables = dir.join(variables_dir).is_dir();
    if !has_variables {
        warn!(
            "No {}/ directory in {}; the converter may fail to load weights",
            variables_dir,
            dir.display()
        );
    }

    debug!("Validated SavedModel: {}", descriptor_path.display());
    Ok(InputArtifacts {
        dir: dir.to_path_buf(),
        descriptor: descriptor_path,
        has_variables,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_dir_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let err = validate_input(&tmp.path().join("nope"), "saved_model.pb", "variables")
            .unwrap_err();
        assert!(matches!(err, ConvertError::InputNotFound { .. }));
    }

    #[test]
    fn file_instead_of_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("saved_model");
        fs::write(&file, b"").unwrap();
        let err = validate_input(&file, "saved_model.pb", "variables").unwrap_err();
        assert!(matches!(err, ConvertError::InputNotADirectory { .. }));
    }

    #[test]
    fn dir_without_descriptor() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("variables")).unwrap();
        let err = validate_input(tmp.path(), "saved_model.pb", "variables").unwrap_err();
        assert!(err.to_string().contains("saved_model.pb not found"), "got: {err}");
    }

    #[test]
    fn descriptor_as_directory_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("saved_model.pb")).unwrap();
        let err = validate_input(tmp.path(), "saved_model.pb", "variables").unwrap_err();
        assert!(matches!(err, ConvertError::InputDescriptorMissing { .. }));
    }

    #[test]
    fn valid_saved_model() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("saved_model.pb"), b"\x08\x01").unwrap();
        fs::create_dir(tmp.path().join("variables")).unwrap();
        let input = validate_input(tmp.path(), "saved_model.pb", "variables").unwrap();
        assert!(input.has_variables);
        assert_eq!(input.descriptor, tmp.path().join("saved_model.pb"));
    }

    #[test]
    fn missing_variables_is_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("saved_model.pb"), b"").unwrap();
        let input = validate_input(tmp.path(), "saved_model.pb", "variables").unwrap();
        assert!(!input.has_variables);
    }
}
