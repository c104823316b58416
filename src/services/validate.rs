//! Input validation helpers for deliverable creation.
//!
//! All checks run before any store is touched; a failure here means zero
//! writes happened.

use url::Url;

use crate::error::{AppError, Result};

/// Trim and validate a deliverable title.
pub fn normalize_title(raw: &str) -> Result<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(AppError::Validation("title required".into()));
    }
    Ok(title.to_string())
}

/// Validate a deliverable URL: must parse and use an http(s) scheme.
pub fn validate_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("invalid url".into()));
    }
    let parsed = Url::parse(trimmed).map_err(|_| AppError::Validation("invalid url".into()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::Validation("invalid url".into()));
    }
    Ok(trimmed.to_string())
}

/// Extract the lowercase extension from a filename.
pub fn file_extension(filename: &str) -> Option<String> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Validate a file payload against the configured size limit and
/// extension allow-list. Returns the accepted extension.
pub fn validate_file_payload(
    filename: &str,
    size_bytes: usize,
    max_bytes: usize,
    allowed_extensions: &[String],
) -> Result<String> {
    if size_bytes == 0 {
        return Err(AppError::Validation("file required".into()));
    }
    if size_bytes > max_bytes {
        return Err(AppError::Validation("file rejected".into()));
    }
    let ext = file_extension(filename).ok_or_else(|| AppError::Validation("file rejected".into()))?;
    if !allowed_extensions.iter().any(|a| a == &ext) {
        return Err(AppError::Validation("file rejected".into()));
    }
    Ok(ext)
}
