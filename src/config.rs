//! Configuration types for SavedModel → TensorFlow.js conversion.
//!
//! All workflow behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The defaults reproduce the project
//! layout the web app expects:
//!
//! ```text
//! <root>/public/models/saved_model/         ← input  (saved_model.pb + variables/)
//! <root>/public/models/baby_cry_detector/   ← output (model.json + *.bin)
//! ```
//!
//! Input and output directories are stored relative to `root`; an absolute
//! directory replaces the root entirely (plain [`Path::join`] semantics).

use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::{Path, PathBuf};
use tfjs_auto::{ConverterTool, Installer};

/// Default SavedModel directory, relative to the root.
pub const DEFAULT_INPUT_DIR: &str = "public/models/saved_model";

/// Default TensorFlow.js output directory, relative to the root.
pub const DEFAULT_OUTPUT_DIR: &str = "public/models/baby_cry_detector";

/// Configuration for a conversion run.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use tfjs_convert::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .root("/srv/app")
///     .auto_install(false)
///     .build()
///     .unwrap();
/// assert!(config.output_path().ends_with("baby_cry_detector"));
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Project root the model directories are resolved against. Default: `.`.
    pub root: PathBuf,

    /// SavedModel directory. Default: [`DEFAULT_INPUT_DIR`].
    pub input_dir: PathBuf,

    /// TensorFlow.js output directory. Default: [`DEFAULT_OUTPUT_DIR`].
    pub output_dir: PathBuf,

    /// Converter to probe and run. Default: `tensorflowjs_converter`,
    /// overridable with `TFJS_CONVERTER_PATH`.
    pub converter: ConverterTool,

    /// Install command used when the probe fails. Default:
    /// `python3 -m pip install tensorflowjs` (`TFJS_AUTO_PYTHON` overrides
    /// the interpreter).
    pub installer: Installer,

    /// Install the converter when missing. Default: true.
    ///
    /// When false a missing converter fails the run immediately with the
    /// manual install command.
    pub auto_install: bool,

    /// `--input_format`. Default: `tf_saved_model`.
    pub input_format: String,

    /// `--output_format`. Default: `tfjs_layers_model`.
    pub output_format: String,

    /// `--signature_name`. Default: `serving_default`.
    pub signature_name: String,

    /// Graph descriptor required inside the input dir. Default: `saved_model.pb`.
    pub input_descriptor: String,

    /// Weight-variable subdirectory of the input dir. Default: `variables`.
    pub variables_dir: String,

    /// Descriptor the converter must produce. Default: `model.json`.
    pub output_descriptor: String,

    /// File-name suffix of weight shards. Default: `.bin`.
    pub weight_suffix: String,

    /// Optional per-stage progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            converter: ConverterTool::from_env(),
            installer: Installer::from_env(),
            auto_install: true,
            input_format: "tf_saved_model".to_string(),
            output_format: "tfjs_layers_model".to_string(),
            signature_name: "serving_default".to_string(),
            input_descriptor: "saved_model.pb".to_string(),
            variables_dir: "variables".to_string(),
            output_descriptor: "model.json".to_string(),
            weight_suffix: ".bin".to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("root", &self.root)
            .field("input_dir", &self.input_dir)
            .field("output_dir", &self.output_dir)
            .field("converter", &self.converter)
            .field("installer", &self.installer)
            .field("auto_install", &self.auto_install)
            .field("input_format", &self.input_format)
            .field("output_format", &self.output_format)
            .field("signature_name", &self.signature_name)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// SavedModel directory resolved against `root`.
    pub fn input_path(&self) -> PathBuf {
        self.root.join(&self.input_dir)
    }

    /// Output directory resolved against `root`.
    pub fn output_path(&self) -> PathBuf {
        self.root.join(&self.output_dir)
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.root = root.into();
        self
    }

    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn converter(mut self, tool: ConverterTool) -> Self {
        self.config.converter = tool;
        self
    }

    /// Shorthand for `converter(ConverterTool::new(program))`.
    pub fn converter_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.config.converter = ConverterTool::new(program);
        self
    }

    pub fn installer(mut self, installer: Installer) -> Self {
        self.config.installer = installer;
        self
    }

    pub fn auto_install(mut self, v: bool) -> Self {
        self.config.auto_install = v;
        self
    }

    pub fn input_format(mut self, format: impl Into<String>) -> Self {
        self.config.input_format = format.into();
        self
    }

    pub fn output_format(mut self, format: impl Into<String>) -> Self {
        self.config.output_format = format.into();
        self
    }

    pub fn signature_name(mut self, name: impl Into<String>) -> Self {
        self.config.signature_name = name.into();
        self
    }

    pub fn input_descriptor(mut self, name: impl Into<String>) -> Self {
        self.config.input_descriptor = name.into();
        self
    }

    pub fn output_descriptor(mut self, name: impl Into<String>) -> Self {
        self.config.output_descriptor = name.into();
        self
    }

    pub fn weight_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.weight_suffix = suffix.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        let c = &self.config;
        let required = [
            ("input format", &c.input_format),
            ("output format", &c.output_format),
            ("signature name", &c.signature_name),
            ("input descriptor", &c.input_descriptor),
            ("output descriptor", &c.output_descriptor),
            ("weight suffix", &c.weight_suffix),
        ];
        for (what, value) in required {
            if value.trim().is_empty() {
                return Err(ConvertError::InvalidConfig(format!("{what} must not be empty")));
            }
        }
        if c.converter.program.as_os_str().is_empty() {
            return Err(ConvertError::InvalidConfig(
                "converter program must not be empty".into(),
            ));
        }
        if same_dir(&c.input_path(), &c.output_path()) {
            return Err(ConvertError::InvalidConfig(format!(
                "input and output directories are the same: {}",
                c.input_path().display()
            )));
        }
        Ok(self.config)
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    a.components().eq(b.components())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_project_layout() {
        let c = ConversionConfig::builder().build().unwrap();
        assert_eq!(c.input_path(), Path::new("./public/models/saved_model"));
        assert_eq!(c.output_path(), Path::new("./public/models/baby_cry_detector"));
        assert_eq!(c.input_format, "tf_saved_model");
        assert_eq!(c.output_format, "tfjs_layers_model");
        assert_eq!(c.signature_name, "serving_default");
        assert!(c.auto_install);
    }

    #[test]
    fn root_is_joined() {
        let c = ConversionConfig::builder().root("/srv/app").build().unwrap();
        assert_eq!(c.input_path(), Path::new("/srv/app/public/models/saved_model"));
    }

    #[test]
    fn absolute_dir_replaces_root() {
        let c = ConversionConfig::builder()
            .root("/srv/app")
            .output_dir("/tmp/tfjs")
            .build()
            .unwrap();
        assert_eq!(c.output_path(), Path::new("/tmp/tfjs"));
    }

    #[test]
    fn empty_signature_rejected() {
        let err = ConversionConfig::builder().signature_name("  ").build().unwrap_err();
        assert!(err.to_string().contains("signature name"), "got: {err}");
    }

    #[test]
    fn same_input_and_output_rejected() {
        let err = ConversionConfig::builder()
            .input_dir("models/x")
            .output_dir("models/x/")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidConfig(_)));
    }

    #[test]
    fn debug_hides_callback() {
        let c = ConversionConfig::builder()
            .progress_callback(std::sync::Arc::new(crate::progress::NoopProgressCallback))
            .build()
            .unwrap();
        assert!(format!("{c:?}").contains("<dyn ConversionProgressCallback>"));
    }
}
