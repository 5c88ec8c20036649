//! Follow-up DOCX templating
//!
//! Renders Word documents from a `.docx` template whose text contains template-language
//! tags (`{{ patientName }}`, `{% for s in docSections %}`...).
//!
//! ## Model
//!
//! A `.docx` file is a zip archive of XML parts. Only the parts that carry document text are
//! rendered:
//!
//! ```text
//! word/document.xml
//! word/header*.xml, word/footer*.xml
//! word/footnotes.xml, word/endnotes.xml
//! ```
//!
//! Every other part (styles, media, relationships) is copied through byte for byte.
//!
//! Word routinely splits what the author typed as one tag across several runs
//! (`{{</w:t></w:r><w:r><w:t>name}}`), so parts are prepared before rendering. See
//! [`prepare_part`] for the exact rewrite rules.
//!
//! ## Example Usage
//!
//! ```no_run
//! use followup_docx::DocxTemplate;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let template = DocxTemplate::open(Path::new("templates/FU_TEMPLATE_Klickovich.docx"))?;
//! let bytes = template.render(&serde_json::json!({ "patientName": "Smith, John" }))?;
//! std::fs::write("Smith John.docx", bytes)?;
//! # Ok(())
//! # }
//! ```

mod template;
mod xml;

pub use template::DocxTemplate;
pub use xml::prepare_part;

use std::path::PathBuf;

/// Errors that can occur while loading or rendering a template
#[derive(Debug, thiserror::Error)]
pub enum DocxError {
    /// Template file does not exist
    #[error("template file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The archive does not contain a part every Word document must have
    #[error("template is missing required part {0}")]
    MissingPart(&'static str),

    /// A text part is not valid UTF-8
    #[error("part {part} is not valid UTF-8")]
    Encoding { part: String },

    /// The template language rejected a part
    #[error("failed to render {part}: {message}")]
    Render { part: String, message: String },

    /// Archive could not be read or written
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DocxResult<T> = std::result::Result<T, DocxError>;
