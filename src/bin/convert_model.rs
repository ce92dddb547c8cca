//! CLI binary for tfjs-convert.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, prints stage banners, and turns the outcome into the
//! process exit code (0 = converted and verified, 1 = anything else).

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tfjs_convert::{
    convert, exit_code, inspect_output, ConversionConfig, ConversionProgressCallback,
    ConversionReport, ConvertError, ConverterTool, Installer, OutputArtifacts, ProgressCallback,
    Stage, DEFAULT_INPUT_DIR, DEFAULT_OUTPUT_DIR,
};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const RULE_WIDTH: usize = 60;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one ✓/❌ line per stage, plus a spinner while
/// the long-running stages (install, convert) are in flight. Converter output
/// is echoed dimmed above the spinner.
struct CliProgressCallback {
    /// Spinner for the currently running long stage, if any.
    spinner: Mutex<Option<ProgressBar>>,
    /// Show a spinner at all (off with --no-progress).
    animate: bool,
    /// Echo converter output (off with -v, where tracing already logs it).
    echo_output: bool,
}

impl CliProgressCallback {
    fn new(animate: bool, echo_output: bool) -> Arc<Self> {
        Arc::new(Self {
            spinner: Mutex::new(None),
            animate,
            echo_output,
        })
    }

    fn start_spinner(&self, message: String) {
        if !self.animate {
            eprintln!("{message}");
            return;
        }
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Working");
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(80));
        if let Ok(mut slot) = self.spinner.lock() {
            *slot = Some(bar);
        }
    }

    fn stop_spinner(&self) {
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        }
    }

    /// Print a line without tearing the spinner.
    fn println(&self, line: String) {
        if let Ok(slot) = self.spinner.lock() {
            if let Some(ref bar) = *slot {
                bar.println(line);
                return;
            }
        }
        eprintln!("{line}");
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        match stage {
            Stage::Installing => {
                self.println("tensorflowjs not found. Installing...".to_string());
                self.start_spinner("Installing tensorflowjs…".to_string());
            }
            Stage::Converting => self.start_spinner("Converting model…".to_string()),
            _ => {}
        }
    }

    fn on_stage_complete(&self, stage: Stage, detail: &str) {
        self.stop_spinner();
        // A missing converter is a hand-off to Installing, not a result.
        if stage == Stage::CheckingDependency && detail.ends_with("not found") {
            return;
        }
        eprintln!("{} {}", green("✓"), detail);
    }

    fn on_stage_failed(&self, _stage: Stage, error: &str) {
        self.stop_spinner();
        let mut lines = error.lines();
        if let Some(first) = lines.next() {
            eprintln!("{} {}", red("❌"), red(first));
        }
        for line in lines {
            eprintln!("   {}", dim(line));
        }
    }

    fn on_tool_output(&self, line: &str) {
        if self.echo_output && !line.trim().is_empty() {
            self.println(format!("  {}", dim(line)));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert public/models/saved_model → public/models/baby_cry_detector
  convert-model

  # Run against another checkout
  convert-model --root ~/src/cry-detector

  # Custom locations
  convert-model --input exported/saved_model --output public/models/v2

  # Fail instead of pip-installing tensorflowjs
  convert-model --no-install

  # Only check an existing output directory
  convert-model --verify-only

  # Machine-readable report
  convert-model --json > report.json

EXIT CODES:
  0   conversion completed and model.json verified
  1   any failure (dependency, input, converter, or missing output)

ENVIRONMENT VARIABLES:
  TFJS_CONVERTER_PATH       Converter program (default: tensorflowjs_converter)
  TFJS_AUTO_PYTHON          Python used for `-m pip install tensorflowjs`
  TFJS_CONVERT_ROOT         Project root (default: .)
  RUST_LOG                  Override log filter (e.g. tfjs_convert=debug)
"#;

/// Convert a TensorFlow SavedModel to TensorFlow.js and verify the output.
#[derive(Parser, Debug)]
#[command(
    name = "convert-model",
    version,
    about = "Convert a TensorFlow SavedModel to TensorFlow.js and verify the output",
    long_about = "Run tensorflowjs_converter on a SavedModel directory (installing the \
tensorflowjs pip package first if needed), then check that model.json and its weight \
shards were written. Exit code 0 means converted and verified; 1 means any failure.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Project root the model directories are relative to.
    #[arg(long, env = "TFJS_CONVERT_ROOT", default_value = ".")]
    root: PathBuf,

    /// SavedModel directory (contains saved_model.pb and variables/).
    #[arg(short, long, env = "TFJS_CONVERT_INPUT", default_value = DEFAULT_INPUT_DIR)]
    input: PathBuf,

    /// Output directory for model.json and *.bin shards.
    #[arg(short, long, env = "TFJS_CONVERT_OUTPUT", default_value = DEFAULT_OUTPUT_DIR)]
    output: PathBuf,

    /// Converter program or path.
    #[arg(long, env = "TFJS_CONVERTER_PATH")]
    converter: Option<PathBuf>,

    /// Python interpreter used to pip-install tensorflowjs.
    #[arg(long, env = "TFJS_AUTO_PYTHON")]
    python: Option<PathBuf>,

    /// Do not install tensorflowjs automatically when the converter is missing.
    #[arg(long, env = "TFJS_CONVERT_NO_INSTALL")]
    no_install: bool,

    /// Only validate an existing output directory; run nothing.
    #[arg(long)]
    verify_only: bool,

    /// Print the conversion report as JSON on stdout.
    #[arg(long, env = "TFJS_CONVERT_JSON")]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "TFJS_CONVERT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs (includes converter output).
    #[arg(short, long, env = "TFJS_CONVERT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "TFJS_CONVERT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Stage banners already tell the user what happened; library logs are
    // only for -v or RUST_LOG.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if cli.quiet {
        None
    } else {
        let animate = !cli.no_progress && !cli.verbose;
        Some(CliProgressCallback::new(animate, !cli.verbose) as Arc<dyn ConversionProgressCallback>)
    };

    let config = match build_config(&cli, progress_cb) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{} {:#}", red("❌"), e);
            return ExitCode::from(1);
        }
    };

    if !cli.quiet {
        eprintln!("{}", rule());
        eprintln!("{}", bold("Baby Cry Detector - Model Conversion"));
        eprintln!("{}", rule());
        eprintln!();
    }

    // ── Verify-only mode ─────────────────────────────────────────────────
    if cli.verify_only {
        let result = inspect_output(&config);
        let code = exit_code(&result);
        let printed = match &result {
            Ok(output) => print_output(&cli, output),
            Err(e) => {
                print_failure(&cli, &config, e);
                Ok(())
            }
        };
        return finish(code, printed);
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let result = convert(&config).await;
    let code = exit_code(&result);
    let printed = match &result {
        Ok(report) => print_success(&cli, report),
        Err(e) => {
            print_failure(&cli, &config, e);
            Ok(())
        }
    };
    finish(code, printed)
}

/// Combine the workflow exit code with any failure printing the result.
fn finish(code: u8, printed: Result<()>) -> ExitCode {
    match printed {
        Ok(()) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{} {:#}", red("❌"), e);
            ExitCode::from(1)
        }
    }
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .root(&cli.root)
        .input_dir(&cli.input)
        .output_dir(&cli.output)
        .auto_install(!cli.no_install);

    if let Some(ref program) = cli.converter {
        builder = builder.converter(ConverterTool::new(program));
    }
    if let Some(ref python) = cli.python {
        builder = builder.installer(Installer::pip(python, tfjs_auto::PIP_PACKAGE));
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Human-readable lines for a validated output directory.
fn print_output_summary(output: &OutputArtifacts) {
    eprintln!(
        "{} Created {} weight file(s): {}",
        green("✓"),
        output.weight_files.len(),
        output.weight_files.join(", ")
    );
    if let Some(ref manifest) = output.manifest {
        if !manifest.missing.is_empty() {
            eprintln!(
                "{} {} references missing shard(s): {}",
                cyan("⚠"),
                output.descriptor.display(),
                manifest.missing.join(", ")
            );
        }
    }
}

fn print_output(cli: &Cli, output: &OutputArtifacts) -> Result<()> {
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(output).context("Failed to serialise output")?
        );
    }
    if !cli.quiet {
        print_output_summary(output);
    }
    Ok(())
}

fn print_success(cli: &Cli, report: &ConversionReport) -> Result<()> {
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(report).context("Failed to serialise report")?
        );
    }
    if cli.quiet {
        return Ok(());
    }

    print_output_summary(&report.output);
    eprintln!(
        "   {}",
        dim(&format!(
            "{} bytes of weights, {}ms total",
            report.output.total_weight_bytes, report.total_duration_ms
        ))
    );
    eprintln!();
    eprintln!("{}", rule());
    eprintln!("{} {}", green("✓"), bold("SUCCESS! Model conversion complete"));
    eprintln!("{}", rule());
    eprintln!();
    eprintln!("Next steps:");
    eprintln!("1. Start your development server");
    eprintln!("2. The app will automatically load the TensorFlow.js model");
    eprintln!("3. Test the cry detection feature");
    eprintln!();
    Ok(())
}

fn print_failure(cli: &Cli, config: &ConversionConfig, error: &ConvertError) {
    // Stage failures were already printed by the progress callback.
    if cli.quiet || error.stage().is_none() {
        eprintln!("{} {}", red("❌"), error);
    }
    if cli.quiet {
        return;
    }

    eprintln!();
    eprintln!("{}", rule());
    eprintln!("{} {}", red("❌"), bold("FAILED - Conversion unsuccessful"));
    eprintln!("{}", rule());
    eprintln!();
    eprintln!("Troubleshooting:");
    if let Some(remedy) = error.remediation() {
        eprintln!("1. Install the converter manually: {}", remedy);
        eprintln!(
            "2. Make sure `{}` is on your PATH",
            config.converter.program.display()
        );
    } else {
        eprintln!(
            "1. Ensure the SavedModel files are in {}/",
            config.input_path().display()
        );
        eprintln!("2. Check that {} exists", config.input_descriptor);
        eprintln!(
            "3. Verify {}/ folder contains the weight files",
            config.variables_dir
        );
    }
    eprintln!();
}
