//! Follow-up visit document generation.
//!
//! A request is rendered in memory against the Word template, then stored under
//! `<output_dir>/<sanitised name>/<sanitised name>.docx`. Storing the same content twice reuses
//! the existing file; different content for an existing name gets the next free ` (n)` suffix.
//! PDF conversion follows and is best-effort unless the configuration makes it mandatory.

use crate::constants::{
    DATE_OF_EVALUATION_KEY, DEFAULT_FILE_STEM, DOCX_EXTENSION, DOC_SECTIONS_KEY, FILE_NAME_KEY,
    MAX_DOCUMENT_VERSIONS, PATIENT_NAME_KEY,
};
use crate::pdf::{expected_pdf_path, PdfConverter};
use crate::{write_atomic, CoreConfig, FollowUpError, FollowUpResult};
use followup_docx::DocxTemplate;
use followup_types::SafeFileName;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// A document description as posted by the front-end.
///
/// Any JSON object is accepted; the keys become template variables.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRequest {
    fields: Map<String, Value>,
}

impl DocumentRequest {
    /// # Errors
    ///
    /// Returns `InvalidInput` unless `value` is a JSON object.
    pub fn from_value(value: Value) -> FollowUpResult<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(FollowUpError::InvalidInput(format!(
                "document description must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Trimmed, non-empty string value of `key`.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn patient_name(&self) -> Option<&str> {
        self.field_str(PATIENT_NAME_KEY)
    }

    pub fn date_of_evaluation(&self) -> Option<&str> {
        self.field_str(DATE_OF_EVALUATION_KEY)
    }

    /// Output file stem: `fileName`, else `patientName`, else `follow_up`, sanitised.
    ///
    /// A candidate that sanitises to nothing is skipped in favour of the next one.
    pub fn file_stem(&self) -> SafeFileName {
        [FILE_NAME_KEY, PATIENT_NAME_KEY]
            .iter()
            .filter_map(|key| self.field_str(key))
            .find_map(SafeFileName::sanitise)
            .unwrap_or_else(|| SafeFileName::sanitise_or(DEFAULT_FILE_STEM, DEFAULT_FILE_STEM))
    }

    /// Required fields that are absent, `null`, or blank strings, in `required` order.
    pub fn missing_fields<'a>(&self, required: &'a [String]) -> Vec<&'a str> {
        required
            .iter()
            .map(String::as_str)
            .filter(|key| match self.fields.get(*key) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            })
            .collect()
    }

    /// Template variables: every request field, with `docSections` defaulting to `[]`.
    pub fn template_context(&self) -> Value {
        let mut fields = self.fields.clone();
        fields
            .entry(DOC_SECTIONS_KEY)
            .or_insert_with(|| Value::Array(Vec::new()));
        Value::Object(fields)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A generated follow-up note.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    /// Sanitised base name, used for the download header and the document folder.
    pub file_name: SafeFileName,
    /// Where the DOCX was stored; its stem may carry a ` (n)` suffix.
    pub docx_path: PathBuf,
    pub pdf_path: Option<PathBuf>,
    pub bytes: Vec<u8>,
    /// Hex SHA-256 of `bytes`.
    pub sha256: String,
    pub date_of_evaluation: Option<String>,
    /// `true` when identical content was already stored and no new file was written.
    pub reused_existing: bool,
}

impl GeneratedDocument {
    /// `Content-Disposition` value for downloading the DOCX.
    pub fn content_disposition(&self) -> String {
        self.file_name.content_disposition(DOCX_EXTENSION)
    }
}

#[derive(Debug)]
struct StoredDocx {
    file_name: SafeFileName,
    path: PathBuf,
    bytes: Vec<u8>,
    sha256: String,
    reused: bool,
}

/// Renders, stores and converts follow-up notes.
#[derive(Clone)]
pub struct DocumentService {
    cfg: Arc<CoreConfig>,
    converter: Arc<dyn PdfConverter>,
    write_lock: Arc<Mutex<()>>,
}

impl DocumentService {
    pub fn new(cfg: Arc<CoreConfig>, converter: Arc<dyn PdfConverter>) -> Self {
        Self {
            cfg,
            converter,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    /// Generates the DOCX for `request`, stores it and attempts PDF conversion.
    ///
    /// # Errors
    ///
    /// - `MissingField` if a configured required field is absent
    /// - `TemplateNotFound` / `Template` if the template is missing or fails to render;
    ///   nothing is written in either case
    /// - `OutputDirCreation`, `FileRead`, `FileWrite` for storage failures
    /// - the converter's error, only when PDFs are configured as required
    pub async fn generate(&self, request: DocumentRequest) -> FollowUpResult<GeneratedDocument> {
        let date_of_evaluation = request.date_of_evaluation().map(str::to_owned);

        let service = self.clone();
        let stored = tokio::task::spawn_blocking(move || service.render_and_store(&request))
            .await
            .map_err(|e| FollowUpError::Task(e.to_string()))??;

        let pdf_path = self.convert(&stored).await?;

        Ok(GeneratedDocument {
            file_name: stored.file_name,
            docx_path: stored.path,
            pdf_path,
            bytes: stored.bytes,
            sha256: stored.sha256,
            date_of_evaluation,
            reused_existing: stored.reused,
        })
    }

    async fn convert(&self, stored: &StoredDocx) -> FollowUpResult<Option<PathBuf>> {
        let out_dir = stored
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.cfg.output_dir().to_path_buf());

        if stored.reused {
            let existing = expected_pdf_path(&stored.path, &out_dir)?;
            if existing.is_file() {
                tracing::debug!("reusing existing PDF {}", existing.display());
                return Ok(Some(existing));
            }
        }

        match self.converter.convert(&stored.path, &out_dir).await {
            Ok(pdf) => Ok(Some(pdf)),
            Err(e) if self.cfg.pdf_required() => {
                tracing::error!("PDF conversion failed for {}: {}", stored.path.display(), e);
                Err(e)
            }
            Err(e) => {
                tracing::warn!(
                    "PDF conversion failed for {}, returning DOCX only: {}",
                    stored.path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    fn render_and_store(&self, request: &DocumentRequest) -> FollowUpResult<StoredDocx> {
        let missing = request.missing_fields(self.cfg.required_fields());
        if !missing.is_empty() {
            return Err(FollowUpError::MissingField(missing.join(", ")));
        }

        let template = DocxTemplate::open(self.cfg.template_file())?;
        let bytes = template.render(&request.template_context())?;
        let sha256 = hex::encode(Sha256::digest(&bytes));

        let file_name = request.file_stem();
        let dir = self.cfg.output_dir().join(file_name.as_str());
        fs::create_dir_all(&dir).map_err(FollowUpError::OutputDirCreation)?;

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        for version in 1..=MAX_DOCUMENT_VERSIONS {
            let stem = if version == 1 {
                file_name.clone()
            } else {
                file_name.with_suffix(version)
            };
            let path = dir.join(stem.with_extension(DOCX_EXTENSION));

            if !path.exists() {
                write_atomic(&path, &bytes).map_err(FollowUpError::FileWrite)?;
                tracing::info!("stored {} ({} bytes)", path.display(), bytes.len());
                return Ok(StoredDocx {
                    file_name,
                    path,
                    bytes,
                    sha256,
                    reused: false,
                });
            }

            let existing = fs::read(&path).map_err(FollowUpError::FileRead)?;
            if hex::encode(Sha256::digest(&existing)) == sha256 {
                tracing::info!("identical document already stored at {}", path.display());
                return Ok(StoredDocx {
                    file_name,
                    path,
                    bytes,
                    sha256,
                    reused: true,
                });
            }
        }

        Err(FollowUpError::FileWrite(std::io::Error::other(format!(
            "more than {MAX_DOCUMENT_VERSIONS} versions of '{file_name}' exist"
        ))))
    }
}
