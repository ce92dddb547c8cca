//! Converter invocation: run `tensorflowjs_converter` to completion.
//!
//! The argument list is fixed:
//!
//! ```text
//! <program> --input_format=<fmt> --output_format=<fmt>
//!           --signature_name=<name> <input_dir> <output_dir>
//! ```
//!
//! Only the exit status decides success. stdout and stderr are piped so the
//! CLI can show them under its spinner; each line is forwarded untouched to
//! the progress callback, and the last few stderr lines are kept purely to
//! quote them in the failure message. Both pipes are drained while waiting,
//! otherwise a chatty converter could block on a full pipe buffer.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use serde::Serialize;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Number of trailing stderr lines quoted in [`ConvertError::ConverterFailed`].
pub const STDERR_TAIL_LINES: usize = 20;

/// A completed, successful converter run.
#[derive(Debug, Clone, Serialize)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub exit_code: i32,
    pub duration_ms: u64,
}

/// The converter arguments for `config`, in order.
pub fn converter_args(config: &ConversionConfig) -> Vec<OsString> {
    vec![
        format!("--input_format={}", config.input_format).into(),
        format!("--output_format={}", config.output_format).into(),
        format!("--signature_name={}", config.signature_name).into(),
        config.input_path().into_os_string(),
        config.output_path().into_os_string(),
    ]
}

/// Run `program` with [`converter_args`] and wait for it to exit.
///
/// There is no timeout: a hung converter hangs the caller.
///
/// # Errors
/// - [`ConvertError::ConverterSpawnFailed`] if the process cannot start
/// - [`ConvertError::ConverterFailed`] on any non-zero exit
pub async fn run_converter(
    program: &Path,
    config: &ConversionConfig,
) -> Result<Invocation, ConvertError> {
    let args = converter_args(config);
    let start = Instant::now();

    info!(
        "Running {} {}",
        program.display(),
        args.iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    );

    let mut child = Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ConvertError::ConverterSpawnFailed {
            program: program.to_path_buf(),
            source: e,
        })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let cb = config.progress_callback.clone();

    let (_, stderr_tail, status) = tokio::join!(
        forward_lines(stdout, cb.clone(), 0),
        forward_lines(stderr, cb, STDERR_TAIL_LINES),
        child.wait(),
    );

    let status = status
        .map_err(|e| ConvertError::Internal(format!("waiting for converter failed: {e}")))?;
    let duration_ms = start.elapsed().as_millis() as u64;

    if !status.success() {
        return Err(ConvertError::ConverterFailed {
            program: program.to_path_buf(),
            status: tfjs_auto::describe_status(&status),
            stderr_tail: Vec::from(stderr_tail).join("\n"),
        });
    }

    debug!("Converter exited successfully in {}ms", duration_ms);
    Ok(Invocation {
        program: program.to_path_buf(),
        args: args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect(),
        exit_code: status.code().unwrap_or(0),
        duration_ms,
    })
}

/// Read `reader` line by line until EOF, forwarding each line and keeping
/// the last `keep` of them.
async fn forward_lines<R>(
    reader: Option<R>,
    cb: Option<ProgressCallback>,
    keep: usize,
) -> VecDeque<String>
where
    R: AsyncRead + Unpin,
{
    let mut tail = VecDeque::with_capacity(keep);
    let Some(reader) = reader else {
        return tail;
    };

    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf)
                    .trim_end_matches(['\r', '\n'])
                    .to_string();
                debug!(target: "tensorflowjs_converter", "{}", line);
                if let Some(ref cb) = cb {
                    cb.on_tool_output(&line);
                }
                if keep > 0 {
                    if tail.len() == keep {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
            }
            Err(e) => {
                warn!("Stopped reading converter output: {}", e);
                break;
            }
        }
    }
    tail
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_are_fixed_and_ordered() {
        let config = ConversionConfig::builder().root("/app").build().unwrap();
        let args: Vec<String> = converter_args(&config)
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect();
        assert_eq!(
            args,
            vec![
                "--input_format=tf_saved_model",
                "--output_format=tfjs_layers_model",
                "--signature_name=serving_default",
                "/app/public/models/saved_model",
                "/app/public/models/baby_cry_detector",
            ]
        );
    }

    #[tokio::test]
    async fn missing_program_is_spawn_failure() {
        let config = ConversionConfig::builder().build().unwrap();
        let err = run_converter(Path::new("tfjs-convert-no-such-converter"), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::ConverterSpawnFailed { .. }));
    }

    #[tokio::test]
    async fn tail_keeps_only_last_lines() {
        let text: Vec<u8> = (1..=30).map(|i| format!("line {i}\n")).collect::<String>().into_bytes();
        let tail = forward_lines(Some(&text[..]), None, 3).await;
        assert_eq!(Vec::from(tail), vec!["line 28", "line 29", "line 30"]);
    }

    #[tokio::test]
    async fn final_line_without_newline_is_kept() {
        let tail = forward_lines(Some(&b"a\r\nb"[..]), None, 5).await;
        assert_eq!(Vec::from(tail), vec!["a", "b"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_is_failure() {
        let config = ConversionConfig::builder().build().unwrap();
        let err = run_converter(Path::new("false"), &config).await.unwrap_err();
        match err {
            ConvertError::ConverterFailed { status, .. } => assert_eq!(status, "exit status 1"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
