use followup_docx::DocxError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FollowUpError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("Missing required field: {0}")]
    MissingField(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Template file not found: {}", .0.display())]
    TemplateNotFound(PathBuf),
    #[error("failed to render template: {0}")]
    Template(DocxError),
    #[error("PDF conversion failed: {0}")]
    PdfConversion(String),
    #[error("PDF conversion is disabled")]
    PdfConverterDisabled,

    #[error("failed to read physician store: {0}")]
    StoreRead(std::io::Error),
    #[error("failed to write physician store: {0}")]
    StoreWrite(std::io::Error),
    #[error("physician store is not valid JSON: {0}")]
    StoreParse(serde_json::Error),
    #[error("failed to serialize physicians: {0}")]
    Serialization(serde_json::Error),

    #[error("failed to create output directory: {0}")]
    OutputDirCreation(std::io::Error),
    #[error("failed to write document: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read document: {0}")]
    FileRead(std::io::Error),
    #[error("{0}")]
    UploadFileNotFound(String),

    #[error("background task failed: {0}")]
    Task(String),
}

impl From<DocxError> for FollowUpError {
    fn from(err: DocxError) -> Self {
        match err {
            DocxError::NotFound(path) => FollowUpError::TemplateNotFound(path),
            other => FollowUpError::Template(other),
        }
    }
}

pub type FollowUpResult<T> = std::result::Result<T, FollowUpError>;
