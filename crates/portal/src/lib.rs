//! # Follow-up Portal
//!
//! Uploads finished visit notes into the practice-management portal by driving a browser
//! over WebDriver.
//!
//! The portal has no API, so every step is a UI interaction located by static element
//! names and XPath expressions ([`PortalSelectors`]). A renamed element makes the upload
//! fail immediately with [`PortalError::ElementNotFound`]; there is no retry.
//!
//! [`PortalBrowser`] is the seam between the upload flow and the browser, so the flow can be
//! exercised without a WebDriver server.

mod browser;
mod config;
mod upload;

pub use browser::{PortalBrowser, WebDriverBrowser};
pub use config::{PortalConfig, PortalSelectors, Selector};
pub use upload::{
    run_batch, upload_document, DocumentUploader, PortalDocument, UploadReport, WebDriverUploader,
};

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("invalid portal configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to start WebDriver session: {0}")]
    Connect(String),
    #[error("portal element not found: {0}")]
    ElementNotFound(String),
    #[error("option '{option}' not found in {field}")]
    OptionNotFound { field: String, option: String },
    #[error("WebDriver command failed: {0}")]
    Command(String),
    #[error("file to upload not found: {}", .0.display())]
    FileMissing(PathBuf),
}

impl From<fantoccini::error::CmdError> for PortalError {
    fn from(err: fantoccini::error::CmdError) -> Self {
        PortalError::Command(err.to_string())
    }
}

pub type PortalResult<T> = std::result::Result<T, PortalError>;
