//! # tfjs-auto
//!
//! Make sure [`tensorflowjs_converter`](https://github.com/tensorflow/tfjs/tree/master/tfjs-converter)
//! is invocable before a conversion run, installing the `tensorflowjs` pip
//! package on demand so users don't have to set up the Python side by hand.
//!
//! ## How it works
//!
//! On every call to [`ensure_converter`]:
//!
//! 1. Probes `tensorflowjs_converter --version` with all output discarded.
//! 2. If the probe succeeds, returns immediately (no install attempt).
//! 3. Otherwise runs `python3 -m pip install tensorflowjs`.
//! 4. Re-probes the configured program, then the user script directory
//!    (`~/.local/bin` on Linux) where `pip --user` puts console scripts.
//!
//! Nothing is cached between calls: availability is recomputed every time,
//! so two probes in a row with no environment change always agree.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tfjs_auto::{ensure_converter, ConverterTool, Installer};
//!
//! let tool = ConverterTool::from_env();
//! let installer = Installer::from_env();
//! let resolved = ensure_converter(&tool, &installer, true, Some(&|i: &Installer| {
//!     eprintln!("Installing: {}", i.command_line());
//! }))
//! .expect("converter unavailable");
//! println!("using {}", resolved.program.display());
//! ```
//!
//! ## Environment variable overrides
//!
//! - `TFJS_CONVERTER_PATH`: converter program to probe and run.
//! - `TFJS_AUTO_PYTHON`: interpreter used for `-m pip install`.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Console script installed by the `tensorflowjs` pip package.
pub const CONVERTER_PROGRAM: &str = "tensorflowjs_converter";

/// pip package that provides [`CONVERTER_PROGRAM`].
pub const PIP_PACKAGE: &str = "tensorflowjs";

/// How many trailing installer stderr lines are quoted in errors.
const STDERR_TAIL_LINES: usize = 10;

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by tfjs-auto operations.
///
/// Every variant carries the manual install command so callers can print it
/// without knowing which installer was configured.
#[derive(Error, Debug)]
pub enum TfjsAutoError {
    /// The converter is missing and automatic installation was disabled.
    #[error("'{program}' is not installed and automatic installation is disabled.\nPlease install manually: {remediation}")]
    NotInstalled { program: String, remediation: String },

    /// The installer itself could not be started (e.g. no python on PATH).
    #[error("Could not start installer '{command}': {source}\nPlease install manually: {remediation}")]
    InstallerUnavailable {
        command: String,
        remediation: String,
        #[source]
        source: std::io::Error,
    },

    /// The installer ran and reported failure.
    #[error("Installer '{command}' failed with {status}\n{stderr_tail}\nPlease install manually: {remediation}")]
    InstallFailed {
        command: String,
        status: String,
        stderr_tail: String,
        remediation: String,
    },

    /// The install succeeded but no candidate program answers the probe.
    #[error(
        "'{program}' is still not invocable after installing '{package}'.\n\
Make sure the pip scripts directory is on PATH, or install manually: {remediation}"
    )]
    StillUnavailable {
        program: String,
        package: String,
        remediation: String,
    },
}

impl TfjsAutoError {
    /// The manual install command to show the user.
    pub fn remediation(&self) -> &str {
        match self {
            TfjsAutoError::NotInstalled { remediation, .. }
            | TfjsAutoError::InstallerUnavailable { remediation, .. }
            | TfjsAutoError::InstallFailed { remediation, .. }
            | TfjsAutoError::StillUnavailable { remediation, .. } => remediation,
        }
    }
}

// ── Tool and installer descriptions ──────────────────────────────────────────

/// The external converter and how to ask it for its version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterTool {
    /// Program name (looked up on `PATH`) or explicit path.
    pub program: PathBuf,
    /// Arguments for the availability probe. Default: `["--version"]`.
    pub version_args: Vec<String>,
}

impl ConverterTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            version_args: vec!["--version".to_string()],
        }
    }

    /// `TFJS_CONVERTER_PATH` if set, else [`CONVERTER_PROGRAM`].
    pub fn from_env() -> Self {
        match std::env::var("TFJS_CONVERTER_PATH") {
            Ok(p) if !p.is_empty() => Self::new(p),
            _ => Self::default(),
        }
    }
}

impl Default for ConverterTool {
    fn default() -> Self {
        Self::new(CONVERTER_PROGRAM)
    }
}

/// A package-install command, e.g. `python3 -m pip install tensorflowjs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installer {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Package name, used for the manual remediation hint.
    pub package: String,
}

impl Installer {
    pub fn new(
        program: impl Into<PathBuf>,
        args: impl IntoIterator<Item = impl Into<String>>,
        package: impl Into<String>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            package: package.into(),
        }
    }

    /// `<python> -m pip install <package>`.
    pub fn pip(python: impl Into<PathBuf>, package: impl Into<String>) -> Self {
        let package = package.into();
        Self::new(
            python,
            ["-m".to_string(), "pip".into(), "install".into(), package.clone()],
            package,
        )
    }

    /// pip installer for [`PIP_PACKAGE`] using `TFJS_AUTO_PYTHON` if set.
    pub fn from_env() -> Self {
        let python = match std::env::var("TFJS_AUTO_PYTHON") {
            Ok(p) if !p.is_empty() => PathBuf::from(p),
            _ => PathBuf::from(default_python()),
        };
        Self::pip(python, PIP_PACKAGE)
    }

    /// The command the user should run if automatic install is not possible.
    pub fn remediation(&self) -> String {
        format!("pip install {}", self.package)
    }

    /// Printable form of the full install command.
    pub fn command_line(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

impl Default for Installer {
    fn default() -> Self {
        Self::pip(default_python(), PIP_PACKAGE)
    }
}

fn default_python() -> &'static str {
    if cfg!(windows) {
        "python"
    } else {
        "python3"
    }
}

/// Outcome of [`ensure_converter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Program to invoke for the conversion.
    pub program: PathBuf,
    /// `true` if an install ran during this call.
    pub installed: bool,
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Returns `true` if `tool` spawns and exits 0 for its version query.
///
/// Spawn failures (not found, permission denied) count as unavailable.
pub fn probe(tool: &ConverterTool) -> bool {
    probe_program(&tool.program, &tool.version_args)
}

/// Runs `installer` to completion, capturing its output.
pub fn install(installer: &Installer) -> Result<(), TfjsAutoError> {
    let output = Command::new(&installer.program)
        .args(&installer.args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| TfjsAutoError::InstallerUnavailable {
            command: installer.command_line(),
            remediation: installer.remediation(),
            source: e,
        })?;

    if output.status.success() {
        return Ok(());
    }

    Err(TfjsAutoError::InstallFailed {
        command: installer.command_line(),
        status: describe_status(&output.status),
        stderr_tail: tail_lines(&String::from_utf8_lossy(&output.stderr), STDERR_TAIL_LINES),
        remediation: installer.remediation(),
    })
}

/// Ensures the converter is invocable, installing it if allowed.
///
/// - If `tool` already answers the probe, no install is attempted.
/// - If it doesn't and `auto_install` is `false`, fails with
///   [`TfjsAutoError::NotInstalled`].
/// - Otherwise calls `on_install` (if any), runs `installer`, and re-probes
///   every path from [`candidate_programs`].
///
/// Any installer failure is returned as-is; there is no retry.
pub fn ensure_converter(
    tool: &ConverterTool,
    installer: &Installer,
    auto_install: bool,
    on_install: Option<&dyn Fn(&Installer)>,
) -> Result<Resolution, TfjsAutoError> {
    if probe(tool) {
        return Ok(Resolution {
            program: tool.program.clone(),
            installed: false,
        });
    }

    if !auto_install {
        return Err(TfjsAutoError::NotInstalled {
            program: tool.program.display().to_string(),
            remediation: installer.remediation(),
        });
    }

    if let Some(cb) = on_install {
        cb(installer);
    }
    install(installer)?;

    candidate_programs(tool)
        .into_iter()
        .find(|candidate| probe_program(candidate, &tool.version_args))
        .map(|program| Resolution {
            program,
            installed: true,
        })
        .ok_or_else(|| TfjsAutoError::StillUnavailable {
            program: tool.program.display().to_string(),
            package: installer.package.clone(),
            remediation: installer.remediation(),
        })
}

/// Places to look for the converter after an install, in order.
///
/// A bare program name is also tried inside the user script directory,
/// since a fresh `pip --user` install is often not on `PATH` yet.
/// Explicit paths are only ever tried as given.
pub fn candidate_programs(tool: &ConverterTool) -> Vec<PathBuf> {
    let mut candidates = vec![tool.program.clone()];

    if tool.program.components().count() == 1 {
        if let Some(dir) = user_script_dir() {
            let mut path = dir.join(&tool.program);
            if !std::env::consts::EXE_EXTENSION.is_empty() && path.extension().is_none() {
                path.set_extension(std::env::consts::EXE_EXTENSION);
            }
            if !candidates.contains(&path) {
                candidates.push(path);
            }
        }
    }

    candidates
}

/// The last `n` lines of `text`, joined with `\n`.
pub fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}

/// Human-readable exit status: `exit status N` or `termination by signal`.
pub fn describe_status(status: &ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit status {code}"),
        None => "termination by signal".to_string(),
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn probe_program(program: &Path, args: &[String]) -> bool {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Where `pip install --user` drops console scripts.
fn user_script_dir() -> Option<PathBuf> {
    dirs::executable_dir().or_else(|| dirs::home_dir().map(|h| h.join(".local").join("bin")))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const MISSING: &str = "tfjs-auto-definitely-not-installed-xyz";

    #[test]
    fn probe_missing_program_is_false() {
        assert!(!probe(&ConverterTool::new(MISSING)));
    }

    #[test]
    fn probe_is_idempotent() {
        let tool = ConverterTool::new(MISSING);
        assert_eq!(probe(&tool), probe(&tool));
    }

    #[test]
    fn default_installer_is_pip() {
        let i = Installer::pip("python3", PIP_PACKAGE);
        assert_eq!(i.command_line(), "python3 -m pip install tensorflowjs");
        assert_eq!(i.remediation(), "pip install tensorflowjs");
    }

    #[test]
    fn explicit_path_has_single_candidate() {
        let tool = ConverterTool::new("/opt/tools/tensorflowjs_converter");
        assert_eq!(
            candidate_programs(&tool),
            vec![PathBuf::from("/opt/tools/tensorflowjs_converter")]
        );
    }

    #[test]
    fn bare_name_is_tried_first() {
        let tool = ConverterTool::default();
        let candidates = candidate_programs(&tool);
        assert_eq!(candidates[0], PathBuf::from(CONVERTER_PROGRAM));
    }

    #[test]
    fn tail_lines_keeps_last_n() {
        assert_eq!(tail_lines("a\nb\nc\nd", 2), "c\nd");
        assert_eq!(tail_lines("only", 5), "only");
        assert_eq!(tail_lines("", 3), "");
    }

    #[test]
    fn not_installed_when_auto_install_disabled() {
        let installs = Cell::new(0);
        let err = ensure_converter(
            &ConverterTool::new(MISSING),
            &Installer::default(),
            false,
            Some(&|_: &Installer| installs.set(installs.get() + 1)),
        )
        .unwrap_err();
        assert!(matches!(err, TfjsAutoError::NotInstalled { .. }));
        assert_eq!(err.remediation(), "pip install tensorflowjs");
        assert_eq!(installs.get(), 0);
    }

    #[test]
    fn installer_that_cannot_start_is_reported() {
        let installer = Installer::new(MISSING, Vec::<String>::new(), PIP_PACKAGE);
        let err = install(&installer).unwrap_err();
        assert!(matches!(err, TfjsAutoError::InstallerUnavailable { .. }));
        assert!(err.to_string().contains("pip install tensorflowjs"));
    }

    #[cfg(unix)]
    #[test]
    fn available_tool_skips_install() {
        let installs = Cell::new(0);
        let resolved = ensure_converter(
            &ConverterTool::new("true"),
            &Installer::new("false", Vec::<String>::new(), PIP_PACKAGE),
            true,
            Some(&|_: &Installer| installs.set(installs.get() + 1)),
        )
        .expect("`true` answers the probe");
        assert!(!resolved.installed);
        assert_eq!(resolved.program, PathBuf::from("true"));
        assert_eq!(installs.get(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn failing_installer_is_fatal() {
        let installer = Installer::new("sh", ["-c", "echo boom >&2; exit 3"], PIP_PACKAGE);
        let err =
            ensure_converter(&ConverterTool::new(MISSING), &installer, true, None).unwrap_err();
        match err {
            TfjsAutoError::InstallFailed {
                status,
                stderr_tail,
                ..
            } => {
                assert_eq!(status, "exit status 3");
                assert_eq!(stderr_tail, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn successful_install_that_still_lacks_tool() {
        let installer = Installer::new("true", Vec::<String>::new(), PIP_PACKAGE);
        let err =
            ensure_converter(&ConverterTool::new(MISSING), &installer, true, None).unwrap_err();
        assert!(matches!(err, TfjsAutoError::StillUnavailable { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn install_then_resolve_then_noop() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("tensorflowjs_converter");
        let script = format!(
            "printf '#!/bin/sh\\nexit 0\\n' > '{p}' && chmod +x '{p}'",
            p = fake.display()
        );
        let installer = Installer::new("sh", ["-c".to_string(), script], PIP_PACKAGE);
        let tool = ConverterTool::new(&fake);

        let first = ensure_converter(&tool, &installer, true, None).unwrap();
        assert!(first.installed);
        assert_eq!(first.program, fake);

        let second = ensure_converter(&tool, &installer, true, None).unwrap();
        assert!(!second.installed);
    }
}
