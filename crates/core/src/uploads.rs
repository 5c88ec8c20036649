//! Locating the PDFs that make up one portal upload.

use crate::constants::{PDF_EXTENSION, RAW_TITLE_PREFIX, TRANSCRIBED_TITLE_PREFIX};
use crate::{CoreConfig, FollowUpError, FollowUpResult};
use followup_types::SafeFileName;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// Externally supplied raw visit note from the RAW directory.
    Raw,
    /// PDF generated from the follow-up template.
    Transcribed,
}

impl UploadKind {
    fn title_prefix(self) -> &'static str {
        match self {
            UploadKind::Raw => RAW_TITLE_PREFIX,
            UploadKind::Transcribed => TRANSCRIBED_TITLE_PREFIX,
        }
    }

    /// Portal title for a note evaluated on `date`.
    pub fn title(self, date: &str) -> String {
        format!("{} {}", self.title_prefix(), date.trim())
    }
}

/// One file to send to the portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUpload {
    pub kind: UploadKind,
    pub title: String,
    pub path: PathBuf,
}

fn is_pdf(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(PDF_EXTENSION))
}

fn pdf_entries(dir: &Path) -> FollowUpResult<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(FollowUpError::FileRead(e)),
    };
    Ok(entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| is_pdf(path))
        .collect())
}

/// First PDF in `dir`, in file-name order, whose name starts with `prefix`.
///
/// A missing directory yields `Ok(None)`.
pub fn find_pdf_by_prefix(dir: &Path, prefix: &str) -> FollowUpResult<Option<PathBuf>> {
    let mut matches: Vec<PathBuf> = pdf_entries(dir)?
        .into_iter()
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(prefix))
        })
        .collect();
    matches.sort();
    Ok(matches.into_iter().next())
}

/// Most recently modified PDF in `dir`; ties go to the greater file name.
pub fn latest_pdf_in(dir: &Path) -> FollowUpResult<Option<PathBuf>> {
    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for path in pdf_entries(dir)? {
        let modified = fs::metadata(&path)
            .and_then(|m| m.modified())
            .map_err(FollowUpError::FileRead)?;
        let is_newer = newest
            .as_ref()
            .is_none_or(|(time, current)| (modified, &path) > (*time, current));
        if is_newer {
            newest = Some((modified, path));
        }
    }
    Ok(newest.map(|(_, path)| path))
}

/// Resolves the files for one upload: the RAW note first (when `raw_prefix` is given), then
/// the newest transcribed PDF in the patient's document folder.
///
/// A blank `raw_prefix` is treated like `None`: only the transcribed note is planned.
///
/// # Errors
///
/// - `InvalidInput` if `file_name` or `date_of_evaluation` is blank, or `file_name` has no
///   usable characters
/// - `UploadFileNotFound` if either file cannot be found
pub fn plan_uploads(
    cfg: &CoreConfig,
    file_name: &str,
    date_of_evaluation: &str,
    raw_prefix: Option<&str>,
) -> FollowUpResult<Vec<PlannedUpload>> {
    if date_of_evaluation.trim().is_empty() {
        return Err(FollowUpError::InvalidInput(
            "dateOfEvaluation is required.".into(),
        ));
    }
    if file_name.trim().is_empty() {
        return Err(FollowUpError::InvalidInput("fileName is required.".into()));
    }
    let stem = SafeFileName::sanitise(file_name).ok_or_else(|| {
        FollowUpError::InvalidInput(format!("fileName '{file_name}' has no usable characters"))
    })?;

    let mut planned = Vec::with_capacity(2);

    if let Some(prefix) = raw_prefix.map(str::trim).filter(|p| !p.is_empty()) {
        let path = find_pdf_by_prefix(cfg.raw_dir(), prefix)?.ok_or_else(|| {
            FollowUpError::UploadFileNotFound(format!(
                "No RAW PDF starting with '{prefix}' in {}",
                cfg.raw_dir().display()
            ))
        })?;
        planned.push(PlannedUpload {
            kind: UploadKind::Raw,
            title: UploadKind::Raw.title(date_of_evaluation),
            path,
        });
    }

    let folder = cfg.output_dir().join(stem.as_str());
    let path = latest_pdf_in(&folder)?.ok_or_else(|| {
        FollowUpError::UploadFileNotFound(format!(
            "No PDF found for '{stem}' in {}",
            folder.display()
        ))
    })?;
    planned.push(PlannedUpload {
        kind: UploadKind::Transcribed,
        title: UploadKind::Transcribed.title(date_of_evaluation),
        path,
    });

    Ok(planned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn config(temp: &TempDir) -> CoreConfig {
        CoreConfig::new(
            temp.path().join("data"),
            temp.path().join("fu.docx"),
            temp.path().join("out"),
        )
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"%PDF-1.4").unwrap();
    }

    #[test]
    fn test_find_pdf_by_prefix_picks_first_match() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("RAWTRANSCIBED-CKOUT-2025-03-01 b.pdf"));
        touch(&temp.path().join("RAWTRANSCIBED-CKOUT-2025-03-01 a.PDF"));
        touch(&temp.path().join("RAWTRANSCIBED-CKOUT-2025-03-01.docx"));
        touch(&temp.path().join("OTHER.pdf"));

        let found = find_pdf_by_prefix(temp.path(), "RAWTRANSCIBED-CKOUT-2025-03-01").unwrap();

        assert_eq!(found, Some(temp.path().join("RAWTRANSCIBED-CKOUT-2025-03-01 a.PDF")));
        assert_eq!(find_pdf_by_prefix(temp.path(), "NOPE").unwrap(), None);
        assert_eq!(find_pdf_by_prefix(&temp.path().join("missing"), "R").unwrap(), None);
    }

    #[test]
    fn test_latest_pdf_in_prefers_newest() {
        let temp = TempDir::new().unwrap();
        let older = temp.path().join("Smith John.pdf");
        let newer = temp.path().join("Smith John (2).pdf");
        touch(&older);
        std::thread::sleep(Duration::from_millis(20));
        touch(&newer);

        assert_eq!(latest_pdf_in(temp.path()).unwrap(), Some(newer));
    }

    #[test]
    fn test_plan_uploads_orders_raw_first() {
        let temp = TempDir::new().unwrap();
        let cfg = config(&temp);
        touch(&cfg.raw_dir().join("RAW-SMITH-2025-03-01.pdf"));
        touch(&cfg.output_dir().join("Smith John").join("Smith John.pdf"));

        let planned =
            plan_uploads(&cfg, "Smith: John", "2025-03-01", Some("RAW-SMITH")).unwrap();

        assert_eq!(planned.len(), 2);
        assert_eq!(planned[0].kind, UploadKind::Raw);
        assert_eq!(planned[0].title, "RAW DATA FOLLOW UP VISIT NOTE ON 2025-03-01");
        assert_eq!(planned[1].kind, UploadKind::Transcribed);
        assert_eq!(planned[1].title, "TRANSCRIBED DATA FOLLOW UP VISIT NOTE ON 2025-03-01");
        assert_eq!(
            planned[1].path,
            cfg.output_dir().join("Smith John").join("Smith John.pdf")
        );
    }

    #[test]
    fn test_plan_uploads_reports_missing_files() {
        let temp = TempDir::new().unwrap();
        let cfg = config(&temp);

        let err = plan_uploads(&cfg, "Smith John", "2025-03-01", None).unwrap_err();
        assert!(matches!(err, FollowUpError::UploadFileNotFound(ref m) if m.contains("Smith John")));

        touch(&cfg.output_dir().join("Smith John").join("Smith John.pdf"));
        let err = plan_uploads(&cfg, "Smith John", "2025-03-01", Some("RAW-X")).unwrap_err();
        assert!(matches!(err, FollowUpError::UploadFileNotFound(ref m) if m.contains("RAW-X")));
    }

    #[test]
    fn test_blank_raw_prefix_plans_only_the_transcribed_note() {
        let temp = TempDir::new().unwrap();
        let cfg = config(&temp);
        touch(&cfg.raw_dir().join("RAW-SMITH-2025-03-01.pdf"));
        touch(&cfg.output_dir().join("Smith John").join("Smith John.pdf"));

        let planned = plan_uploads(&cfg, "Smith John", "2025-03-01", Some("  ")).unwrap();

        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].kind, UploadKind::Transcribed);
    }

    #[test]
    fn test_plan_uploads_rejects_blank_selectors() {
        let temp = TempDir::new().unwrap();
        let cfg = config(&temp);

        assert!(matches!(
            plan_uploads(&cfg, "  ", "2025-03-01", None),
            Err(FollowUpError::InvalidInput(_))
        ));
        assert!(matches!(
            plan_uploads(&cfg, "???", "2025-03-01", None),
            Err(FollowUpError::InvalidInput(_))
        ));
        assert!(matches!(
            plan_uploads(&cfg, "Smith", " ", None),
            Err(FollowUpError::InvalidInput(_))
        ));
    }
}
