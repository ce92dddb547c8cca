//! Output validation: trust the file system, not the converter's exit code.
//!
//! After a run, the descriptor (`model.json`) must exist. Weight shards are
//! found by file-name suffix (`*.bin`) among the regular files of the output
//! directory and reported sorted by name.
//!
//! `model.json` is also read for its `weightsManifest` so shards it
//! references but which are not on disk can be flagged. That cross-check is
//! advisory: a descriptor that does not parse or points at missing shards
//! is logged and recorded, but the pass/fail verdict is "descriptor exists".

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A TensorFlow.js output directory that passed validation.
#[derive(Debug, Clone, Serialize)]
pub struct OutputArtifacts {
    pub dir: PathBuf,
    /// Path to the descriptor inside `dir`.
    pub descriptor: PathBuf,
    /// Weight shard file names, sorted.
    pub weight_files: Vec<String>,
    /// Combined size of `weight_files` in bytes.
    pub total_weight_bytes: u64,
    /// Descriptor cross-check, `None` if `model.json` could not be parsed.
    pub manifest: Option<ManifestCheck>,
}

/// Shards named by the descriptor's weights manifest vs. what is on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManifestCheck {
    /// `format` field of the descriptor, e.g. `layers-model`.
    pub format: Option<String>,
    /// Every path listed under `weightsManifest[].paths`.
    pub referenced: Vec<String>,
    /// Referenced paths that are not regular files in the output directory.
    pub missing: Vec<String>,
}

/// The subset of `model.json` this crate looks at.
///
/// Unknown fields (`modelTopology`, `signature`, …) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub generated_by: Option<String>,
    #[serde(default)]
    pub converted_by: Option<String>,
    #[serde(default)]
    pub weights_manifest: Vec<WeightGroup>,
}

/// One entry of `weightsManifest`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeightGroup {
    #[serde(default)]
    pub paths: Vec<String>,
}

/// Validate the converter output in `dir`.
///
/// # Errors
/// - [`ConvertError::OutputDescriptorMissing`] if `dir/<descriptor>` is not a file
///   (including when `dir` itself does not exist)
/// - [`ConvertError::OutputUnreadable`] if `dir` cannot be listed
pub fn validate_output(
    dir: &Path,
    descriptor: &str,
    weight_suffix: &str,
) -> Result<OutputArtifacts, ConvertError> {
    let descriptor_path = dir.join(descriptor);
    if !descriptor_path.is_file() {
        return Err(ConvertError::OutputDescriptorMissing {
            path: descriptor_path,
        });
    }

    let shards = list_weight_files(dir, weight_suffix).map_err(|e| {
        ConvertError::OutputUnreadable {
            path: dir.to_path_buf(),
            source: e,
        }
    })?;
    let total_weight_bytes: u64 = shards.iter().map(|(_, size)| size).sum();
    let weight_files: Vec<String> = shards.into_iter().map(|(name, _)| name).collect();

    let manifest = check_manifest(&descriptor_path, dir);
    if let Some(ref m) = manifest {
        if !m.missing.is_empty() {
            warn!(
                "{} references missing weight file(s): {}",
                descriptor_path.display(),
                m.missing.join(", ")
            );
        }
    }

    debug!(
        "Found {} weight file(s), {} bytes",
        weight_files.len(),
        total_weight_bytes
    );

    Ok(OutputArtifacts {
        dir: dir.to_path_buf(),
        descriptor: descriptor_path,
        weight_files,
        total_weight_bytes,
        manifest,
    })
}

/// Regular files in `dir` whose names end in `suffix`, as `(name, size)`
/// sorted by name. Subdirectories are not descended into.
pub fn list_weight_files(dir: &Path, suffix: &str) -> std::io::Result<Vec<(String, u64)>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        if !meta.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(suffix) {
            files.push((name, meta.len()));
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

/// Parse `descriptor` and compare its weights manifest with `dir`.
///
/// Returns `None` (after logging) if the descriptor can't be read or parsed.
pub fn check_manifest(descriptor: &Path, dir: &Path) -> Option<ManifestCheck> {
    let text = match std::fs::read_to_string(descriptor) {
        Ok(t) => t,
        Err(e) => {
            warn!("Could not read {}: {}", descriptor.display(), e);
            return None;
        }
    };
    let parsed: ModelDescriptor = match serde_json::from_str(&text) {
        Ok(d) => d,
        Err(e) => {
            warn!("{} is not a valid model descriptor: {}", descriptor.display(), e);
            return None;
        }
    };

    if let Some(ref by) = parsed.converted_by {
        debug!("Descriptor converted by {}", by);
    }

    let referenced: Vec<String> = parsed
        .weights_manifest
        .iter()
        .flat_map(|g| g.paths.iter().cloned())
        .collect();
    let missing = referenced
        .iter()
        .filter(|p| !dir.join(p).is_file())
        .cloned()
        .collect();

    Some(ManifestCheck {
        format: parsed.format,
        referenced,
        missing,
    })
}
