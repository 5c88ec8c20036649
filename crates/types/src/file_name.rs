//! Filesystem-safe file stems.
//!
//! Request payloads name their output files after patients, so the raw value can contain
//! anything a front-end lets a user type. [`SafeFileName`] keeps alphanumerics plus a small
//! punctuation set and drops the rest, which removes every character that Windows, macOS or
//! Linux refuse in a path component (`< > : " / \ | ? *` and control characters).

/// Punctuation kept by [`SafeFileName::sanitise`] in addition to alphanumerics and spaces.
pub const ALLOWED_PUNCTUATION: &[char] = &['-', '_', '.', ',', '(', ')', '[', ']'];

/// Upper bound on the length of any stem, counted in characters, including a reserved-name
/// prefix and a ` (n)` version suffix.
pub const MAX_FILE_STEM_CHARS: usize = 120;

const WINDOWS_RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// A file stem (name without extension) that is safe to use as a path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SafeFileName(String);

impl SafeFileName {
    /// Sanitises `raw` into a safe stem.
    ///
    /// Returns `None` when nothing usable survives, e.g. for `"???"` or `".."`.
    pub fn sanitise(raw: &str) -> Option<Self> {
        let mut kept = String::with_capacity(raw.len());
        let mut pending_space = false;

        for c in raw.chars() {
            if c.is_alphanumeric() || ALLOWED_PUNCTUATION.contains(&c) {
                if pending_space && !kept.is_empty() {
                    kept.push(' ');
                }
                pending_space = false;
                kept.push(c);
            } else if c.is_whitespace() {
                pending_space = true;
            }
        }

        let stem = trim_edges(&kept);
        if stem.is_empty() {
            return None;
        }

        let device = stem.split('.').next().unwrap_or(stem).to_ascii_uppercase();
        let stem = if WINDOWS_RESERVED_NAMES.contains(&device.as_str()) {
            format!("_{stem}")
        } else {
            stem.to_owned()
        };

        Some(Self(truncate(&stem, MAX_FILE_STEM_CHARS)))
    }

    /// Sanitises `raw`, falling back to the sanitised `fallback` and finally to `"document"`.
    pub fn sanitise_or(raw: &str, fallback: &str) -> Self {
        Self::sanitise(raw)
            .or_else(|| Self::sanitise(fallback))
            .unwrap_or_else(|| Self("document".to_owned()))
    }

    /// Returns the stem with a ` (n)` suffix, used to avoid overwriting earlier output.
    ///
    /// The base is shortened when needed so the result stays within [`MAX_FILE_STEM_CHARS`].
    pub fn with_suffix(&self, n: u32) -> Self {
        let suffix = format!(" ({n})");
        let room = MAX_FILE_STEM_CHARS.saturating_sub(suffix.chars().count());
        let base = truncate(&self.0, room);
        if base.is_empty() {
            return Self(format!("{}{}", self.0, suffix));
        }
        Self(base + &suffix)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name with the given extension, e.g. `Smith John.docx`.
    pub fn with_extension(&self, extension: &str) -> String {
        format!("{}.{}", self.0, extension)
    }

    /// Builds a `Content-Disposition` value that downloads this file as an attachment.
    ///
    /// Non-ASCII names get an ASCII `filename` fallback plus an RFC 5987 `filename*`.
    pub fn content_disposition(&self, extension: &str) -> String {
        let file_name = self.with_extension(extension);
        if file_name.is_ascii() {
            return format!("attachment; filename=\"{file_name}\"");
        }

        let fallback: String = file_name
            .chars()
            .map(|c| if c.is_ascii() { c } else { '_' })
            .collect();
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            fallback,
            urlencoding::encode(&file_name)
        )
    }
}

fn trim_edges(s: &str) -> &str {
    s.trim_matches(|c: char| c == ' ' || c == '.')
}

/// First `max` characters of `s`, without the spaces and dots a cut can leave at the end.
fn truncate(s: &str, max: usize) -> String {
    let cut: String = s.chars().take(max).collect();
    trim_edges(&cut).to_owned()
}

impl std::fmt::Display for SafeFileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SafeFileName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stem(raw: &str) -> Option<String> {
        SafeFileName::sanitise(raw).map(|s| s.as_str().to_owned())
    }

    #[test]
    fn strips_characters_illegal_on_common_filesystems() {
        assert_eq!(
            stem(r#"Smith<>:"/\|?*John"#).as_deref(),
            Some("SmithJohn")
        );
    }

    #[test]
    fn keeps_alphanumerics_and_allowed_punctuation() {
        assert_eq!(
            stem("FU-2025_03.01, Smith (John) [v2]").as_deref(),
            Some("FU-2025_03.01, Smith (John) [v2]")
        );
    }

    #[test]
    fn keeps_non_ascii_letters() {
        assert_eq!(stem("Zoë Ångström").as_deref(), Some("Zoë Ångström"));
    }

    #[test]
    fn collapses_whitespace_and_trims_edges() {
        assert_eq!(stem("  Smith \t\n John  ").as_deref(), Some("Smith John"));
        assert_eq!(stem("...report...").as_deref(), Some("report"));
    }

    #[test]
    fn drops_quotes_and_percent_signs() {
        assert_eq!(stem("O'Brien 100% #1").as_deref(), Some("OBrien 100 1"));
    }

    #[test]
    fn nothing_usable_yields_none() {
        assert_eq!(stem("???"), None);
        assert_eq!(stem(".."), None);
        assert_eq!(stem("   "), None);
    }

    #[test]
    fn reserved_device_names_are_prefixed() {
        assert_eq!(stem("con").as_deref(), Some("_con"));
        assert_eq!(stem("LPT1.notes").as_deref(), Some("_LPT1.notes"));
        assert_eq!(stem("Connor").as_deref(), Some("Connor"));
    }

    #[test]
    fn long_names_are_truncated() {
        let raw = "a".repeat(500);
        let safe = SafeFileName::sanitise(&raw).unwrap();
        assert_eq!(safe.as_str().chars().count(), MAX_FILE_STEM_CHARS);
    }

    #[test]
    fn reserved_prefix_counts_towards_the_limit() {
        let raw = format!("CON.{}", "a".repeat(300));
        let safe = SafeFileName::sanitise(&raw).unwrap();
        assert!(safe.as_str().starts_with("_CON."));
        assert_eq!(safe.as_str().chars().count(), MAX_FILE_STEM_CHARS);
    }

    #[test]
    fn suffixed_long_names_stay_within_the_limit() {
        let safe = SafeFileName::sanitise(&"a".repeat(500)).unwrap();

        let suffixed = safe.with_suffix(999);

        assert_eq!(suffixed.as_str().chars().count(), MAX_FILE_STEM_CHARS);
        assert!(suffixed.as_str().ends_with("a (999)"));
    }

    #[test]
    fn sanitise_or_uses_fallback() {
        assert_eq!(SafeFileName::sanitise_or("***", "follow_up").as_str(), "follow_up");
        assert_eq!(SafeFileName::sanitise_or("***", "***").as_str(), "document");
    }

    #[test]
    fn suffix_stays_safe() {
        let safe = SafeFileName::sanitise("Smith John").unwrap();
        let suffixed = safe.with_suffix(2);
        assert_eq!(suffixed.as_str(), "Smith John (2)");
        assert_eq!(SafeFileName::sanitise(suffixed.as_str()), Some(suffixed));
    }

    #[test]
    fn ascii_content_disposition() {
        let safe = SafeFileName::sanitise("Smith John").unwrap();
        assert_eq!(
            safe.content_disposition("docx"),
            "attachment; filename=\"Smith John.docx\""
        );
    }

    #[test]
    fn non_ascii_content_disposition_has_encoded_parameter() {
        let safe = SafeFileName::sanitise("Zoë").unwrap();
        assert_eq!(
            safe.content_disposition("docx"),
            "attachment; filename=\"Zo_.docx\"; filename*=UTF-8''Zo%C3%AB.docx"
        );
    }
}
