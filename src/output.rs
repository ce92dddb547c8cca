//! Result types returned by a successful conversion.
//!
//! Everything here is `Serialize` so the CLI's `--json` flag can print the
//! whole report for scripts and CI.

use crate::pipeline::input::InputArtifacts;
use crate::pipeline::invoke::Invocation;
use crate::pipeline::verify::OutputArtifacts;
use serde::Serialize;
use std::path::PathBuf;
use tfjs_auto::Resolution;

/// How the converter dependency was satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyStatus {
    /// Program used for the conversion.
    pub program: PathBuf,
    /// `true` if the converter was installed during this run.
    pub installed: bool,
}

impl From<Resolution> for DependencyStatus {
    fn from(r: Resolution) -> Self {
        Self {
            program: r.program,
            installed: r.installed,
        }
    }
}

/// Everything a verified conversion produced.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub dependency: DependencyStatus,
    pub input: InputArtifacts,
    pub invocation: Invocation,
    pub output: OutputArtifacts,
    /// Wall-clock time of the whole workflow.
    pub total_duration_ms: u64,
}

impl ConversionReport {
    /// Number of weight shards written.
    pub fn weight_file_count(&self) -> usize {
        self.output.weight_files.len()
    }
}
