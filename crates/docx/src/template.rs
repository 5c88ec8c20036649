//! In-memory `.docx` template and its rendering.

use crate::xml::prepare_part;
use crate::{DocxError, DocxResult};
use minijinja::{AutoEscape, Environment};
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

const MAIN_DOCUMENT_PART: &str = "word/document.xml";

/// One entry of the template archive.
#[derive(Debug, Clone)]
struct Part {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    is_dir: bool,
}

/// A Word template loaded into memory.
///
/// Loading reads the whole archive once; each [`render`](Self::render) call produces a fresh
/// document and never touches the filesystem, so a failed render leaves nothing behind.
#[derive(Debug, Clone)]
pub struct DocxTemplate {
    parts: Vec<Part>,
}

impl DocxTemplate {
    /// Loads a template from disk.
    ///
    /// # Errors
    ///
    /// Returns `DocxError` if:
    /// - the path does not exist or is not a file (`NotFound`)
    /// - the file cannot be read (`Io`)
    /// - the file is not a zip archive or lacks `word/document.xml`
    pub fn open(path: &Path) -> DocxResult<Self> {
        if !path.is_file() {
            return Err(DocxError::NotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;
        tracing::debug!("loaded template {} ({} bytes)", path.display(), bytes.len());
        Self::from_bytes(bytes)
    }

    /// Loads a template from the raw bytes of a `.docx` file.
    pub fn from_bytes(bytes: Vec<u8>) -> DocxResult<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = Vec::with_capacity(archive.len());

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;
            parts.push(Part {
                name: entry.name().to_owned(),
                data,
                compression: entry.compression(),
                is_dir: entry.is_dir(),
            });
        }

        if !parts.iter().any(|p| p.name == MAIN_DOCUMENT_PART) {
            return Err(DocxError::MissingPart(MAIN_DOCUMENT_PART));
        }

        Ok(Self { parts })
    }

    /// Names of all parts in archive order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    /// Renders the template with `context` and returns the bytes of the new `.docx`.
    ///
    /// Substituted values are XML-escaped. Undefined variables render as empty text and
    /// iterate as empty sequences.
    ///
    /// Entries carry a fixed timestamp, so the same context always yields the same bytes.
    ///
    /// # Errors
    ///
    /// Returns `DocxError::Render` naming the part whose template failed, or
    /// `DocxError::Zip`/`Io` if the output archive cannot be assembled.
    pub fn render(&self, context: &serde_json::Value) -> DocxResult<Vec<u8>> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        for part in &self.parts {
            let method = match part.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = SimpleFileOptions::default()
                .compression_method(method)
                .last_modified_time(DateTime::default());

            if part.is_dir {
                writer.add_directory(part.name.as_str(), options)?;
                continue;
            }

            writer.start_file(part.name.as_str(), options)?;
            if is_text_part(&part.name) {
                let rendered = render_part(&env, part, context)?;
                writer.write_all(rendered.as_bytes())?;
            } else {
                writer.write_all(&part.data)?;
            }
        }

        Ok(writer.finish()?.into_inner())
    }
}

fn render_part(
    env: &Environment<'_>,
    part: &Part,
    context: &serde_json::Value,
) -> DocxResult<String> {
    let source = std::str::from_utf8(&part.data).map_err(|_| DocxError::Encoding {
        part: part.name.clone(),
    })?;
    let prepared = prepare_part(source);

    env.render_named_str(&part.name, &prepared, context)
        .map_err(|e| DocxError::Render {
            part: part.name.clone(),
            message: e.to_string(),
        })
}

/// Parts whose text is user-visible and may carry template tags.
fn is_text_part(name: &str) -> bool {
    if name == MAIN_DOCUMENT_PART || name == "word/footnotes.xml" || name == "word/endnotes.xml" {
        return true;
    }
    (name.starts_with("word/header") || name.starts_with("word/footer")) && name.ends_with(".xml")
}
