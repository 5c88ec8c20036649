//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services.
//! Resolution goes through a key lookup function rather than reading the process environment
//! directly, so binaries pass `std::env::var` while tests pass a plain map.

use crate::constants::{
    DEFAULT_DATA_DIR, DEFAULT_OUTPUT_DIR, DEFAULT_PDF_CONVERTER, DEFAULT_PDF_TIMEOUT_SECS,
    DEFAULT_REQUIRED_FIELDS, DEFAULT_TEMPLATE_FILE, PHYSICIANS_FILE_NAME, RAW_DIR_NAME,
};
use crate::{FollowUpError, FollowUpResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DATA_DIR_KEY: &str = "FOLLOWUP_DATA_DIR";
pub const TEMPLATE_FILE_KEY: &str = "FOLLOWUP_TEMPLATE_FILE";
pub const OUTPUT_DIR_KEY: &str = "FOLLOWUP_OUTPUT_DIR";
pub const RAW_DIR_KEY: &str = "FOLLOWUP_RAW_DIR";
pub const REQUIRED_FIELDS_KEY: &str = "FOLLOWUP_REQUIRED_FIELDS";
pub const PDF_CONVERTER_KEY: &str = "FOLLOWUP_PDF_CONVERTER";
pub const PDF_TIMEOUT_KEY: &str = "FOLLOWUP_PDF_TIMEOUT_SECS";
pub const PDF_REQUIRED_KEY: &str = "FOLLOWUP_PDF_REQUIRED";
pub const AUTO_UPLOAD_KEY: &str = "FOLLOWUP_AUTO_UPLOAD";

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    template_file: PathBuf,
    output_dir: PathBuf,
    raw_dir: PathBuf,
    required_fields: Vec<String>,
    pdf_converter: Option<PathBuf>,
    pdf_timeout: Duration,
    pdf_required: bool,
    auto_upload: bool,
}

impl CoreConfig {
    /// Create a configuration with default policy for the given locations.
    ///
    /// The RAW directory defaults to `<output_dir>/RAW`.
    pub fn new(data_dir: PathBuf, template_file: PathBuf, output_dir: PathBuf) -> Self {
        let raw_dir = output_dir.join(RAW_DIR_NAME);
        Self {
            data_dir,
            template_file,
            output_dir,
            raw_dir,
            required_fields: DEFAULT_REQUIRED_FIELDS
                .iter()
                .map(|f| f.to_string())
                .collect(),
            pdf_converter: Some(PathBuf::from(DEFAULT_PDF_CONVERTER)),
            pdf_timeout: Duration::from_secs(DEFAULT_PDF_TIMEOUT_SECS),
            pdf_required: false,
            auto_upload: false,
        }
    }

    /// Resolve configuration from `lookup`, falling back to defaults for absent keys.
    ///
    /// # Errors
    ///
    /// Returns `FollowUpError::InvalidConfig` if a boolean or numeric value cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> FollowUpResult<Self> {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let data_dir = value(DATA_DIR_KEY).unwrap_or_else(|| DEFAULT_DATA_DIR.into());
        let template_file =
            value(TEMPLATE_FILE_KEY).unwrap_or_else(|| DEFAULT_TEMPLATE_FILE.into());
        let output_dir = value(OUTPUT_DIR_KEY).unwrap_or_else(|| DEFAULT_OUTPUT_DIR.into());

        let mut cfg = Self::new(
            PathBuf::from(data_dir),
            PathBuf::from(template_file),
            PathBuf::from(output_dir),
        );

        if let Some(raw_dir) = value(RAW_DIR_KEY) {
            cfg.raw_dir = PathBuf::from(raw_dir);
        }
        if let Some(fields) = lookup(REQUIRED_FIELDS_KEY) {
            cfg.required_fields = required_fields_from_env_value(&fields);
        }
        if let Some(converter) = value(PDF_CONVERTER_KEY) {
            cfg.pdf_converter = if converter.eq_ignore_ascii_case("off") {
                None
            } else {
                Some(PathBuf::from(converter))
            };
        }
        if let Some(secs) = value(PDF_TIMEOUT_KEY) {
            let secs: u64 = secs.parse().map_err(|_| {
                FollowUpError::InvalidConfig(format!("{PDF_TIMEOUT_KEY} must be a number of seconds"))
            })?;
            cfg.pdf_timeout = Duration::from_secs(secs);
        }
        cfg.pdf_required = bool_from_env_value(PDF_REQUIRED_KEY, value(PDF_REQUIRED_KEY))?;
        cfg.auto_upload = bool_from_env_value(AUTO_UPLOAD_KEY, value(AUTO_UPLOAD_KEY))?;

        Ok(cfg)
    }

    pub fn with_raw_dir(mut self, raw_dir: PathBuf) -> Self {
        self.raw_dir = raw_dir;
        self
    }

    pub fn with_required_fields(mut self, fields: Vec<String>) -> Self {
        self.required_fields = fields;
        self
    }

    pub fn with_pdf_converter(mut self, converter: Option<PathBuf>) -> Self {
        self.pdf_converter = converter;
        self
    }

    pub fn with_pdf_required(mut self, required: bool) -> Self {
        self.pdf_required = required;
        self
    }

    pub fn with_auto_upload(mut self, auto_upload: bool) -> Self {
        self.auto_upload = auto_upload;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn physicians_file(&self) -> PathBuf {
        self.data_dir.join(PHYSICIANS_FILE_NAME)
    }

    pub fn template_file(&self) -> &Path {
        &self.template_file
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn raw_dir(&self) -> &Path {
        &self.raw_dir
    }

    pub fn required_fields(&self) -> &[String] {
        &self.required_fields
    }

    /// Converter binary, or `None` when conversion is switched off.
    pub fn pdf_converter(&self) -> Option<&Path> {
        self.pdf_converter.as_deref()
    }

    pub fn pdf_timeout(&self) -> Duration {
        self.pdf_timeout
    }

    pub fn pdf_required(&self) -> bool {
        self.pdf_required
    }

    pub fn auto_upload(&self) -> bool {
        self.auto_upload
    }

    /// Create the data, output and RAW directories plus the template's parent directory.
    ///
    /// The template itself is not created; generation reports it missing per request.
    pub fn ensure_dirs(&self) -> FollowUpResult<()> {
        let template_parent = self
            .template_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty());

        for dir in [&self.data_dir, &self.output_dir, &self.raw_dir]
            .into_iter()
            .map(PathBuf::as_path)
            .chain(template_parent)
        {
            fs::create_dir_all(dir).map_err(FollowUpError::OutputDirCreation)?;
        }
        Ok(())
    }
}

/// Parse a comma-separated list of required request fields. Blank entries are dropped, so an
/// empty value disables required-field checks.
pub fn required_fields_from_env_value(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a boolean setting. `None` means `false`.
pub fn bool_from_env_value(key: &str, value: Option<String>) -> FollowUpResult<bool> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(FollowUpError::InvalidConfig(format!(
            "{key} must be a boolean, got '{other}'"
        ))),
    }
}
