//! # Follow-up Core
//!
//! Core business logic for the follow-up visit document service.
//!
//! This crate contains pure data operations and file/folder management:
//! - The physician registry backed by a JSON file under the data directory
//! - Rendering follow-up visit notes from the Word template and storing them per patient
//! - Best-effort PDF conversion through an external converter
//! - Locating the RAW and transcribed PDFs that belong to one portal upload
//!
//! **No API concerns**: HTTP servers, browser automation and CLI parsing belong in
//! `api-rest`, `followup-portal` and `followup-cli`.

pub mod config;
pub mod constants;
pub mod documents;
pub mod error;
pub mod pdf;
pub mod physicians;
pub mod uploads;

pub use config::CoreConfig;
pub use documents::{DocumentRequest, DocumentService, GeneratedDocument};
pub use error::{FollowUpError, FollowUpResult};
pub use pdf::{converter_from_config, DisabledConverter, PdfConverter, SofficeConverter};
pub use physicians::{AddPhysicianOutcome, PhysicianRegistry};
pub use uploads::{plan_uploads, PlannedUpload, UploadKind};

pub use followup_types::{NonEmptyText, SafeFileName};

use std::fs;
use std::io::Write;
use std::path::Path;

/// Writes `bytes` to `path` by way of a sibling temporary file and a rename.
///
/// Readers either see the previous contents or the new contents, never a partial write.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = dir.join(format!(".{file_name}.tmp"));

    let result = (|| {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}
