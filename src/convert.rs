//! Workflow driver: dependency → input gate → converter → output check.
//!
//! ```text
//! Start → CheckingDependency → [Installing] → ValidatingInput
//!       → Converting → ValidatingOutput → {Success, Failure}
//! ```
//!
//! Every arrow is one-way. The first error ends the run: it is reported to
//! the progress callback for the stage it occurred in and returned as-is.
//! [`exit_code`] is the only place a result becomes a process exit code.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::output::{ConversionReport, DependencyStatus};
use crate::pipeline::verify::{self, OutputArtifacts};
use crate::pipeline::{input, invoke};
use crate::progress::Stage;
use std::cell::Cell;
use std::time::Instant;
use tfjs_auto::Installer;
use tracing::{error, info};

/// Run the full conversion workflow.
///
/// # Returns
/// `Ok(ConversionReport)` only when the converter exited 0 *and* the output
/// descriptor exists on disk.
///
/// # Errors
/// Returns the first failure, in workflow order:
/// - [`ConvertError::Dependency`]: converter missing and not installable
/// - `Input*`: SavedModel directory or `saved_model.pb` missing; the
///   converter is never spawned
/// - `Converter*`: spawn failure or non-zero exit
/// - `Output*`: descriptor missing after a "successful" run
pub async fn convert(config: &ConversionConfig) -> Result<ConversionReport, ConvertError> {
    let total_start = Instant::now();
    let input_path = config.input_path();
    let output_path = config.output_path();
    info!(
        "Starting conversion: {} → {}",
        input_path.display(),
        output_path.display()
    );

    // ── Step 1: Converter available (install if needed) ──────────────────
    let dependency = resolve_dependency(config).await?;

    // ── Step 2: Input gate ───────────────────────────────────────────────
    stage_start(config, Stage::ValidatingInput);
    let input = stage_finish(
        config,
        Stage::ValidatingInput,
        input::validate_input(&input_path, &config.input_descriptor, &config.variables_dir),
        |i| format!("Found {} in {}", config.input_descriptor, i.dir.display()),
    )?;

    // ── Step 3: Run the converter ────────────────────────────────────────
    stage_start(config, Stage::Converting);
    let invocation = stage_finish(
        config,
        Stage::Converting,
        invoke::run_converter(&dependency.program, config).await,
        |_| "Conversion successful!".to_string(),
    )?;

    // ── Step 4: Trust the file system ────────────────────────────────────
    let output = verify_output(config)?;

    let total_duration_ms = total_start.elapsed().as_millis() as u64;
    info!(
        "Conversion complete: {} weight file(s), {}ms total",
        output.weight_files.len(),
        total_duration_ms
    );

    Ok(ConversionReport {
        dependency,
        input,
        invocation,
        output,
        total_duration_ms,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally; do not call from inside
/// an async context.
pub fn convert_sync(config: &ConversionConfig) -> Result<ConversionReport, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(config))
}

/// Validate an existing output directory without running anything.
///
/// Fires the [`Stage::ValidatingOutput`] callbacks like a full run would.
pub fn inspect_output(config: &ConversionConfig) -> Result<OutputArtifacts, ConvertError> {
    verify_output(config)
}

/// Map a workflow result to a process exit code: `0` on success, `1` on
/// any failure.
pub fn exit_code<T>(result: &Result<T, ConvertError>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(e) => e.exit_code(),
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Probe (and maybe install) the converter on a blocking thread.
///
/// The `Installing` stage is opened from inside the resolver, right before
/// the installer runs, so a failure is attributed to whichever of the two
/// stages was active.
async fn resolve_dependency(config: &ConversionConfig) -> Result<DependencyStatus, ConvertError> {
    stage_start(config, Stage::CheckingDependency);

    let tool = config.converter.clone();
    let installer = config.installer.clone();
    let auto_install = config.auto_install;
    let cb = config.progress_callback.clone();

    let (result, installing) = tokio::task::spawn_blocking(move || {
        let installing = Cell::new(false);
        let on_install = |i: &Installer| {
            installing.set(true);
            info!(
                "{} not found; installing with: {}",
                tool.program.display(),
                i.command_line()
            );
            if let Some(ref cb) = cb {
                cb.on_stage_complete(
                    Stage::CheckingDependency,
                    &format!("{} not found", tool.program.display()),
                );
                cb.on_stage_start(Stage::Installing);
            }
        };
        let result = tfjs_auto::ensure_converter(&tool, &installer, auto_install, Some(&on_install));
        (result, installing.get())
    })
    .await
    .map_err(|e| ConvertError::Internal(format!("dependency check task failed: {e}")))?;

    let stage = if installing {
        Stage::Installing
    } else {
        Stage::CheckingDependency
    };
    let status = stage_finish(config, stage, result.map_err(ConvertError::from), |r| {
        if r.installed {
            format!("{} installed successfully", config.installer.package)
        } else {
            format!("{} is already installed", r.program.display())
        }
    })?;
    Ok(status.into())
}

fn verify_output(config: &ConversionConfig) -> Result<OutputArtifacts, ConvertError> {
    stage_start(config, Stage::ValidatingOutput);
    stage_finish(
        config,
        Stage::ValidatingOutput,
        verify::validate_output(
            &config.output_path(),
            &config.output_descriptor,
            &config.weight_suffix,
        ),
        |o| format!("Created: {}", o.descriptor.display()),
    )
}

fn stage_start(config: &ConversionConfig, stage: Stage) {
    info!("{}…", stage);
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
}

/// Report the end of `stage` and pass `result` through unchanged.
fn stage_finish<T>(
    config: &ConversionConfig,
    stage: Stage,
    result: Result<T, ConvertError>,
    detail: impl FnOnce(&T) -> String,
) -> Result<T, ConvertError> {
    match &result {
        Ok(value) => {
            let detail = detail(value);
            info!("{}: {}", stage, detail);
            if let Some(ref cb) = config.progress_callback {
                cb.on_stage_complete(stage, &detail);
            }
        }
        Err(e) => {
            error!("{} failed: {}", stage, e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_stage_failed(stage, &e.to_string());
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_zero_only_on_success() {
        assert_eq!(exit_code::<()>(&Ok(())), 0);
        assert_eq!(
            exit_code::<()>(&Err(ConvertError::InputNotFound {
                path: "public/models/saved_model".into()
            })),
            1
        );
        assert_eq!(
            exit_code::<()>(&Err(ConvertError::ConverterFailed {
                program: "tensorflowjs_converter".into(),
                status: "exit status 2".into(),
                stderr_tail: String::new(),
            })),
            1
        );
    }

    #[test]
    fn inspect_output_on_empty_root_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let config = ConversionConfig::builder().root(tmp.path()).build().unwrap();
        let err = inspect_output(&config).unwrap_err();
        assert_eq!(err.stage(), Some(Stage::ValidatingOutput));
    }
}
