//! DOCX to PDF conversion.

use crate::constants::PDF_EXTENSION;
use crate::{CoreConfig, FollowUpError, FollowUpResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;

/// Converts a Word document into a PDF.
#[async_trait]
pub trait PdfConverter: Send + Sync {
    /// Converts `docx` and writes `<stem>.pdf` into `out_dir`, returning the PDF path.
    async fn convert(&self, docx: &Path, out_dir: &Path) -> FollowUpResult<PathBuf>;
}

/// Headless LibreOffice (`soffice`) converter.
#[derive(Debug, Clone)]
pub struct SofficeConverter {
    binary: PathBuf,
    timeout: Duration,
}

impl SofficeConverter {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

#[async_trait]
impl PdfConverter for SofficeConverter {
    async fn convert(&self, docx: &Path, out_dir: &Path) -> FollowUpResult<PathBuf> {
        let expected = expected_pdf_path(docx, out_dir)?;

        let child = Command::new(&self.binary)
            .arg("--headless")
            .arg("--convert-to")
            .arg(PDF_EXTENSION)
            .arg("--outdir")
            .arg(out_dir)
            .arg(docx)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                FollowUpError::PdfConversion(format!(
                    "failed to start {}: {e}",
                    self.binary.display()
                ))
            })?;

        // Dropping the output future on timeout kills the child.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                FollowUpError::PdfConversion(format!(
                    "timed out after {}s converting {}",
                    self.timeout.as_secs(),
                    docx.display()
                ))
            })?
            .map_err(|e| FollowUpError::PdfConversion(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FollowUpError::PdfConversion(format!(
                "{} exited with {}: {}",
                self.binary.display(),
                output.status,
                stderr.trim()
            )));
        }

        if !expected.is_file() {
            return Err(FollowUpError::PdfConversion(format!(
                "converter reported success but {} was not produced",
                expected.display()
            )));
        }

        tracing::info!("converted {} to {}", docx.display(), expected.display());
        Ok(expected)
    }
}

/// Converter used when conversion is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledConverter;

#[async_trait]
impl PdfConverter for DisabledConverter {
    async fn convert(&self, _docx: &Path, _out_dir: &Path) -> FollowUpResult<PathBuf> {
        Err(FollowUpError::PdfConverterDisabled)
    }
}

/// Builds the converter selected by `cfg`.
pub fn converter_from_config(cfg: &CoreConfig) -> Arc<dyn PdfConverter> {
    match cfg.pdf_converter() {
        Some(binary) => Arc::new(SofficeConverter::new(binary, cfg.pdf_timeout())),
        None => Arc::new(DisabledConverter),
    }
}

/// Path of the PDF a converter is expected to produce for `docx`.
pub fn expected_pdf_path(docx: &Path, out_dir: &Path) -> FollowUpResult<PathBuf> {
    let stem = docx.file_stem().ok_or_else(|| {
        FollowUpError::PdfConversion(format!("{} has no file name", docx.display()))
    })?;
    Ok(out_dir.join(format!("{}.{PDF_EXTENSION}", stem.to_string_lossy())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_expected_pdf_path_keeps_suffixed_stem() {
        let path = expected_pdf_path(Path::new("/out/Smith John (2).docx"), Path::new("/out"))
            .unwrap();
        assert_eq!(path, Path::new("/out/Smith John (2).pdf"));
    }

    #[test]
    fn test_expected_pdf_path_keeps_inner_dots() {
        let path = expected_pdf_path(Path::new("/out/J. Smith.docx"), Path::new("/out")).unwrap();
        assert_eq!(path, Path::new("/out/J. Smith.pdf"));
    }

    #[tokio::test]
    async fn test_converter_from_config_respects_off() {
        let cfg = CoreConfig::new("d".into(), "t.docx".into(), "o".into())
            .with_pdf_converter(None);
        let converter = converter_from_config(&cfg);

        let err = converter
            .convert(Path::new("a.docx"), Path::new("."))
            .await
            .unwrap_err();

        assert!(matches!(err, FollowUpError::PdfConverterDisabled));
    }

    #[tokio::test]
    async fn test_missing_binary_is_a_conversion_error() {
        let temp = TempDir::new().unwrap();
        let docx = temp.path().join("note.docx");
        std::fs::write(&docx, b"docx").unwrap();
        let converter = SofficeConverter::new(
            temp.path().join("no-such-soffice"),
            Duration::from_secs(5),
        );

        let err = converter.convert(&docx, temp.path()).await.unwrap_err();

        assert!(matches!(err, FollowUpError::PdfConversion(ref m) if m.contains("failed to start")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_exit_without_output_is_an_error() {
        let temp = TempDir::new().unwrap();
        let docx = temp.path().join("note.docx");
        std::fs::write(&docx, b"docx").unwrap();
        let converter = SofficeConverter::new("true", Duration::from_secs(5));

        let err = converter.convert(&docx, temp.path()).await.unwrap_err();

        assert!(matches!(err, FollowUpError::PdfConversion(ref m) if m.contains("was not produced")));
    }
}
