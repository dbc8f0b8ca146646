//! Object key derivation: `{folder}/{epochMillis}-{token}.{ext}`.

use crate::{models::asset::ObjectKey, services::validation::ValidationError};
use chrono::Utc;
use rand::Rng;

pub const DEFAULT_FOLDER: &str = "uploads";
const DEFAULT_EXTENSION: &str = "jpg";
const MAX_EXTENSION_LEN: usize = 10;
const TOKEN_LEN: usize = 6;
const TOKEN_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Derive a fresh key for `original_filename` under `folder`.
pub fn next_key(original_filename: &str, folder: &str) -> Result<ObjectKey, ValidationError> {
    next_key_at(original_filename, folder, Utc::now().timestamp_millis())
}

pub fn next_key_at(
    original_filename: &str,
    folder: &str,
    epoch_millis: i64,
) -> Result<ObjectKey, ValidationError> {
    let folder = sanitize_folder(folder)?;
    let filename = format!(
        "{}-{}.{}",
        epoch_millis,
        random_token(),
        file_extension(original_filename)
    );
    Ok(ObjectKey { folder, filename })
}

/// Normalize a caller-supplied folder.
///
/// Surrounding whitespace and slashes are dropped and empty segments
/// collapse (`/a//b/` -> `a/b`). `.` and `..` segments, backslashes and
/// control characters are rejected. An empty result falls back to `uploads`.
pub fn sanitize_folder(folder: &str) -> Result<String, ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidFolder {
        folder: folder.to_string(),
        reason: reason.to_string(),
    };

    if folder.chars().any(|c| c.is_control()) {
        return Err(invalid("control characters are not allowed"));
    }
    if folder.contains('\\') {
        return Err(invalid("backslashes are not allowed"));
    }

    let mut segments = Vec::new();
    for segment in folder.trim().split('/') {
        match segment {
            "" => continue,
            "." | ".." => return Err(invalid("relative path segments are not allowed")),
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return Ok(DEFAULT_FOLDER.to_string());
    }
    Ok(segments.join("/"))
}

/// Lowercased extension of the last path component, `jpg` when missing or unusable.
pub fn file_extension(original_filename: &str) -> String {
    let name = original_filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_filename);

    match name.rsplit_once('.') {
        Some((_, ext))
            if !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.bytes().all(|b| b.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

/// Six lowercase base36 characters.
pub fn random_token() -> String {
    let mut rng = rand::rng();
    (0..TOKEN_LEN)
        .map(|_| TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

/// Check a backend-relative key taken from a URL before it touches the filesystem.
pub fn is_key_safe(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('/')
        && !key.contains('\\')
        && !key.chars().any(|c| c.is_control())
        && key.split('/').all(|seg| !seg.is_empty() && seg != "." && seg != "..")
}
