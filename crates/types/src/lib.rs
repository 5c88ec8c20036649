//! # Follow-up Types
//!
//! Small validated value types shared by every crate in the workspace.
//!
//! - [`NonEmptyText`]: trimmed text that is guaranteed to contain something
//! - [`SafeFileName`]: a file stem that is safe to create on Windows, macOS and Linux

mod file_name;
mod text;

pub use file_name::{SafeFileName, ALLOWED_PUNCTUATION, MAX_FILE_STEM_CHARS};
pub use text::{NonEmptyText, TextError};
