use crate::browser::{PortalBrowser, WebDriverBrowser};
use crate::config::PortalConfig;
use crate::{PortalError, PortalResult};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A file to upload with the title and notes shown in the portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalDocument {
    pub title: String,
    pub notes: String,
    pub path: PathBuf,
}

impl PortalDocument {
    /// Document whose notes repeat its title.
    pub fn titled(title: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let title = title.into();
        Self {
            notes: title.clone(),
            title,
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub title: String,
    pub path: PathBuf,
    /// Whether the upload form closed within the confirmation window after submitting.
    pub confirmed: bool,
}

/// Uploads one document through the portal's upload form.
///
/// # Errors
///
/// - `FileMissing` if `doc.path` does not exist; checked before touching the browser
/// - `ElementNotFound` / `OptionNotFound` when the form does not look as expected
/// - `Command` for any other WebDriver failure
pub async fn upload_document<B>(
    browser: &mut B,
    cfg: &PortalConfig,
    doc: &PortalDocument,
) -> PortalResult<UploadReport>
where
    B: PortalBrowser + ?Sized,
{
    let path = std::fs::canonicalize(&doc.path)
        .ok()
        .filter(|p| p.is_file())
        .ok_or_else(|| PortalError::FileMissing(doc.path.clone()))?;
    let selectors = &cfg.selectors;

    tracing::info!("uploading {} as '{}'", path.display(), doc.title);

    browser.open(&cfg.portal_url).await?;
    browser.click(&selectors.upload_control).await?;
    browser.fill(&selectors.title, &doc.title).await?;
    browser.attach_file(&selectors.file, &path).await?;
    browser
        .select_option(&selectors.document_type, &cfg.document_type)
        .await?;
    browser.select_option(&selectors.provider, &cfg.provider).await?;
    browser.fill(&selectors.notes, &doc.notes).await?;
    browser.click(&selectors.submit).await?;

    if let Some(text) = browser.accept_alert().await? {
        tracing::info!("accepted portal alert: {}", text);
    }

    let confirmed = browser
        .wait_until_gone(&selectors.title, cfg.confirm)
        .await?;
    if confirmed {
        tracing::info!("uploaded '{}'", doc.title);
    } else {
        tracing::warn!(
            "upload form still open {}s after submitting '{}'",
            cfg.confirm.as_secs(),
            doc.title
        );
    }

    Ok(UploadReport {
        title: doc.title.clone(),
        path,
        confirmed,
    })
}

/// Uploads `documents` in order, stopping at the first failure, then closes the browser.
///
/// The browser is closed whether or not the uploads succeed. A failure to close is logged
/// and does not hide the upload result.
pub async fn run_batch<B>(
    browser: &mut B,
    cfg: &PortalConfig,
    documents: &[PortalDocument],
) -> PortalResult<Vec<UploadReport>>
where
    B: PortalBrowser + ?Sized,
{
    let mut reports = Vec::with_capacity(documents.len());
    let mut outcome = Ok(());

    for doc in documents {
        match upload_document(browser, cfg, doc).await {
            Ok(report) => reports.push(report),
            Err(e) => {
                tracing::error!("portal upload of '{}' failed: {}", doc.title, e);
                outcome = Err(e);
                break;
            }
        }
    }

    if let Err(e) = browser.close().await {
        tracing::warn!("failed to close browser session: {}", e);
    }

    outcome.map(|()| reports)
}

/// Sends documents to the portal.
#[async_trait]
pub trait DocumentUploader: Send + Sync {
    async fn upload(&self, documents: Vec<PortalDocument>) -> PortalResult<Vec<UploadReport>>;
}

/// [`DocumentUploader`] that drives a real browser.
///
/// Each batch gets its own WebDriver session. Batches run one at a time because they share
/// the single browser the portal is logged into.
pub struct WebDriverUploader {
    cfg: Arc<PortalConfig>,
    session: Mutex<()>,
}

impl WebDriverUploader {
    pub fn new(cfg: Arc<PortalConfig>) -> Self {
        Self {
            cfg,
            session: Mutex::new(()),
        }
    }
}

#[async_trait]
impl DocumentUploader for WebDriverUploader {
    async fn upload(&self, documents: Vec<PortalDocument>) -> PortalResult<Vec<UploadReport>> {
        if let Some(missing) = documents.iter().find(|d| !d.path.is_file()) {
            return Err(PortalError::FileMissing(missing.path.clone()));
        }

        let _session = self.session.lock().await;
        let mut browser = WebDriverBrowser::connect(&self.cfg).await?;
        run_batch(&mut browser, &self.cfg, &documents).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Selector;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Records every call; fails when asked for `missing`.
    #[derive(Default)]
    struct FakeBrowser {
        steps: Vec<String>,
        missing: Option<Selector>,
        alert: Option<String>,
        form_closes: bool,
        closed: bool,
    }

    impl FakeBrowser {
        fn check(&self, selector: &Selector) -> PortalResult<()> {
            if self.missing.as_ref() == Some(selector) {
                return Err(PortalError::ElementNotFound(selector.to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl PortalBrowser for FakeBrowser {
        async fn open(&mut self, url: &str) -> PortalResult<()> {
            self.steps.push(format!("open {url}"));
            Ok(())
        }

        async fn click(&mut self, selector: &Selector) -> PortalResult<()> {
            self.check(selector)?;
            self.steps.push(format!("click {selector}"));
            Ok(())
        }

        async fn fill(&mut self, selector: &Selector, text: &str) -> PortalResult<()> {
            self.check(selector)?;
            self.steps.push(format!("fill {selector} = {text}"));
            Ok(())
        }

        async fn attach_file(&mut self, selector: &Selector, path: &Path) -> PortalResult<()> {
            self.check(selector)?;
            assert!(path.is_absolute());
            self.steps.push(format!("attach {selector}"));
            Ok(())
        }

        async fn select_option(&mut self, selector: &Selector, option: &str) -> PortalResult<()> {
            self.check(selector)?;
            self.steps.push(format!("select {selector} = {option}"));
            Ok(())
        }

        async fn accept_alert(&mut self) -> PortalResult<Option<String>> {
            Ok(self.alert.take())
        }

        async fn wait_until_gone(
            &mut self,
            _selector: &Selector,
            _timeout: Duration,
        ) -> PortalResult<bool> {
            Ok(self.form_closes)
        }

        async fn close(&mut self) -> PortalResult<()> {
            self.closed = true;
            Ok(())
        }
    }

    fn pdf(temp: &TempDir, name: &str) -> PathBuf {
        let path = temp.path().join(name);
        std::fs::write(&path, b"%PDF-1.4").unwrap();
        path
    }

    #[tokio::test]
    async fn test_upload_document_fills_the_form_in_order() {
        let temp = TempDir::new().unwrap();
        let cfg = PortalConfig::default();
        let mut browser = FakeBrowser {
            alert: Some("Document uploaded".into()),
            form_closes: true,
            ..FakeBrowser::default()
        };
        let doc = PortalDocument::titled(
            "TRANSCRIBED DATA FOLLOW UP VISIT NOTE ON 2025-03-01",
            pdf(&temp, "Smith John.pdf"),
        );

        let report = upload_document(&mut browser, &cfg, &doc).await.unwrap();

        assert!(report.confirmed);
        assert_eq!(
            browser.steps,
            vec![
                format!("open {}", cfg.portal_url),
                format!("click {}", cfg.selectors.upload_control),
                format!("fill {} = {}", cfg.selectors.title, doc.title),
                format!("attach {}", cfg.selectors.file),
                format!("select {} = Consults", cfg.selectors.document_type),
                format!("select {} = KLICKOVICH MD, ROBERT", cfg.selectors.provider),
                format!("fill {} = {}", cfg.selectors.notes, doc.title),
                format!("click {}", cfg.selectors.submit),
            ]
        );
    }

    #[tokio::test]
    async fn test_unconfirmed_upload_is_reported_not_failed() {
        let temp = TempDir::new().unwrap();
        let mut browser = FakeBrowser::default();
        let doc = PortalDocument::titled("T", pdf(&temp, "a.pdf"));

        let report = upload_document(&mut browser, &PortalConfig::default(), &doc)
            .await
            .unwrap();

        assert!(!report.confirmed);
    }

    #[tokio::test]
    async fn test_missing_file_fails_before_browser_is_used() {
        let temp = TempDir::new().unwrap();
        let mut browser = FakeBrowser::default();
        let doc = PortalDocument::titled("T", temp.path().join("absent.pdf"));

        let err = upload_document(&mut browser, &PortalConfig::default(), &doc)
            .await
            .unwrap_err();

        assert!(matches!(err, PortalError::FileMissing(_)));
        assert!(browser.steps.is_empty());
    }

    #[tokio::test]
    async fn test_batch_stops_at_missing_element_and_still_closes() {
        let temp = TempDir::new().unwrap();
        let cfg = PortalConfig::default();
        let mut browser = FakeBrowser {
            missing: Some(cfg.selectors.provider.clone()),
            ..FakeBrowser::default()
        };
        let docs = vec![
            PortalDocument::titled("RAW", pdf(&temp, "raw.pdf")),
            PortalDocument::titled("TRANSCRIBED", pdf(&temp, "t.pdf")),
        ];

        let err = run_batch(&mut browser, &cfg, &docs).await.unwrap_err();

        assert!(matches!(err, PortalError::ElementNotFound(ref s) if s.contains("providerId")));
        assert!(browser.closed);
        assert_eq!(browser.steps.iter().filter(|s| s.starts_with("open")).count(), 1);
    }

    #[tokio::test]
    async fn test_batch_uploads_in_order() {
        let temp = TempDir::new().unwrap();
        let mut browser = FakeBrowser {
            form_closes: true,
            ..FakeBrowser::default()
        };
        let docs = vec![
            PortalDocument::titled("RAW", pdf(&temp, "raw.pdf")),
            PortalDocument::titled("TRANSCRIBED", pdf(&temp, "t.pdf")),
        ];

        let reports = run_batch(&mut browser, &PortalConfig::default(), &docs)
            .await
            .unwrap();

        let titles: Vec<_> = reports.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["RAW", "TRANSCRIBED"]);
        assert!(browser.closed);
    }

    #[tokio::test]
    async fn test_webdriver_uploader_checks_files_before_connecting() {
        let temp = TempDir::new().unwrap();
        let uploader = WebDriverUploader::new(Arc::new(PortalConfig {
            webdriver_url: "http://127.0.0.1:1".into(),
            ..PortalConfig::default()
        }));

        let err = uploader
            .upload(vec![PortalDocument::titled("T", temp.path().join("absent.pdf"))])
            .await
            .unwrap_err();

        assert!(matches!(err, PortalError::FileMissing(_)));
    }
}
