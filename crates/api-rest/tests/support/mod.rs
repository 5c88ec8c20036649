#![allow(dead_code)]

use api_rest::{router, AppState};
use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use followup_core::pdf::expected_pdf_path;
use followup_core::{CoreConfig, FollowUpError, FollowUpResult, PdfConverter};
use followup_portal::{DocumentUploader, PortalDocument, PortalError, PortalResult, UploadReport};
use serde_json::Value;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt as _;
use tower_http::cors::CorsLayer;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const TEMPLATE_BODY: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8"?>"#,
    r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
    "<w:p><w:r><w:t>Patient: {{ patientName }}</w:t></w:r></w:p>",
    "<w:p><w:r><w:t>Seen: {{ dateOfEvaluation }}</w:t></w:r></w:p>",
    "</w:body></w:document>"
);

/// Writes `<stem>.pdf` next to the DOCX.
pub struct FakeConverter;

#[async_trait]
impl PdfConverter for FakeConverter {
    async fn convert(&self, docx: &Path, out_dir: &Path) -> FollowUpResult<PathBuf> {
        let pdf = expected_pdf_path(docx, out_dir)?;
        fs::write(&pdf, b"%PDF-1.4").map_err(FollowUpError::FileWrite)?;
        Ok(pdf)
    }
}

/// Records batches instead of driving a browser.
#[derive(Default)]
pub struct FakeUploader {
    pub batches: Mutex<Vec<Vec<PortalDocument>>>,
    pub fail: bool,
}

impl FakeUploader {
    pub fn batches(&self) -> Vec<Vec<PortalDocument>> {
        self.batches.lock().unwrap().clone()
    }

    /// Waits for a background upload to be recorded.
    pub async fn wait_for_batches(&self, count: usize) -> Vec<Vec<PortalDocument>> {
        for _ in 0..100 {
            let batches = self.batches();
            if batches.len() >= count {
                return batches;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.batches()
    }
}

#[async_trait]
impl DocumentUploader for FakeUploader {
    async fn upload(&self, documents: Vec<PortalDocument>) -> PortalResult<Vec<UploadReport>> {
        self.batches.lock().unwrap().push(documents.clone());
        if self.fail {
            return Err(PortalError::ElementNotFound("css `[name=\"providerId\"]`".into()));
        }
        Ok(documents
            .into_iter()
            .map(|d| UploadReport {
                title: d.title,
                path: d.path,
                confirmed: true,
            })
            .collect())
    }
}

pub struct TestApp {
    pub router: Router,
    pub cfg: Arc<CoreConfig>,
    pub uploader: Arc<FakeUploader>,
    pub temp: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(|cfg| cfg, FakeUploader::default())
    }

    pub fn with_config(
        configure: impl FnOnce(CoreConfig) -> CoreConfig,
        uploader: FakeUploader,
    ) -> Self {
        let temp = TempDir::new().unwrap();
        let cfg = configure(CoreConfig::new(
            temp.path().join("data"),
            temp.path().join("templates").join("FU_TEMPLATE.docx"),
            temp.path().join("out"),
        ));
        cfg.ensure_dirs().unwrap();

        let cfg = Arc::new(cfg);
        let uploader = Arc::new(uploader);
        let state =
            AppState::with_converter(cfg.clone(), Arc::new(FakeConverter), uploader.clone())
                .unwrap();

        Self {
            router: router(state, CorsLayer::permissive()),
            cfg,
            uploader,
            temp,
        }
    }

    pub fn write_template(&self) {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(TEMPLATE_BODY.as_bytes()).unwrap();
        fs::write(self.cfg.template_file(), writer.finish().unwrap().into_inner()).unwrap();
    }

    pub fn write_pdf(&self, path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"%PDF-1.4").unwrap();
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Bytes) {
        let builder = Request::builder().method(method).uri(path);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, body)
    }

    pub async fn request_json(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, _, bytes) = self.request(method, path, body).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }
}
