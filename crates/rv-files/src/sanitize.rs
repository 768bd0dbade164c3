//! File-name sanitization.
//!
//! The sanitized name is the externally visible identifier of an uploaded
//! file: it is what reports reference in markdown, so it must not contain
//! path components or markdown-significant characters.

/// Placeholder used when nothing usable is left of a name.
pub const DEFAULT_FILENAME: &str = "file";

const MARKDOWN_CHARS: [char; 7] = ['*', '_', '[', ']', '(', ')', '!'];

/// Sanitize a user-supplied file name.
///
/// - control characters become `-`
/// - only the part after the last `/` or `\` is kept
/// - `* _ [ ] ( ) !` become `-`
/// - empty, `.` and `..` become [`DEFAULT_FILENAME`]
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let without_control: String = name
        .chars()
        .map(|c| if c.is_control() { '-' } else { c })
        .collect();

    let basename = without_control
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = basename
        .chars()
        .map(|c| if MARKDOWN_CHARS.contains(&c) { '-' } else { c })
        .collect();

    let trimmed = cleaned.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        DEFAULT_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Split `name` into stem and extension (including the dot).
///
/// A leading dot does not start an extension: `.env` has stem `.env`.
#[must_use]
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(0) | None => (name, ""),
        Some(idx) => name.split_at(idx),
    }
}

/// `name` with `-{n}` inserted before the extension: `a.png` → `a-2.png`.
#[must_use]
pub fn numbered_filename(name: &str, n: usize) -> String {
    let (stem, ext) = split_extension(name);
    format!("{stem}-{n}{ext}")
}
