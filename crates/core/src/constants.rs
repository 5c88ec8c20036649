//! Constants used throughout the follow-up core crate.
//!
//! Default paths, request keys and portal titles live here so that the REST API, the CLI and
//! the core services agree on them.

/// Default directory holding the physician registry.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Filename of the physician registry inside the data directory.
pub const PHYSICIANS_FILE_NAME: &str = "physicians.json";

/// Default Word template for follow-up visit notes.
pub const DEFAULT_TEMPLATE_FILE: &str = "templates/FU_TEMPLATE_Klickovich.docx";

/// Default directory for generated DOCX/PDF artifacts.
pub const DEFAULT_OUTPUT_DIR: &str = "PRC_Files_Folder";

/// Directory name, inside the output directory, for externally supplied RAW PDFs.
pub const RAW_DIR_NAME: &str = "RAW";

/// Stem used when a request names neither a file nor a patient.
pub const DEFAULT_FILE_STEM: &str = "follow_up";

/// Fields that must be present on a document request unless configured otherwise.
pub const DEFAULT_REQUIRED_FIELDS: &[&str] = &[PATIENT_NAME_KEY, DATE_OF_EVALUATION_KEY];

/// Default PDF converter binary (LibreOffice).
pub const DEFAULT_PDF_CONVERTER: &str = "soffice";

/// Default time allowed for one PDF conversion.
pub const DEFAULT_PDF_TIMEOUT_SECS: u64 = 120;

pub const DOCX_EXTENSION: &str = "docx";
pub const PDF_EXTENSION: &str = "pdf";

/// Media type of a Word document.
pub const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

pub const FILE_NAME_KEY: &str = "fileName";
pub const PATIENT_NAME_KEY: &str = "patientName";
pub const DATE_OF_EVALUATION_KEY: &str = "dateOfEvaluation";
pub const DOC_SECTIONS_KEY: &str = "docSections";

/// Portal title prefix for the raw visit note.
pub const RAW_TITLE_PREFIX: &str = "RAW DATA FOLLOW UP VISIT NOTE ON";

/// Portal title prefix for the transcribed (generated) visit note.
pub const TRANSCRIBED_TITLE_PREFIX: &str = "TRANSCRIBED DATA FOLLOW UP VISIT NOTE ON";

/// Upper bound on `name (n)` versions kept for one document name.
pub const MAX_DOCUMENT_VERSIONS: u32 = 999;
