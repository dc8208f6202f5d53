//! Slug derivation from document file paths.
//!
//! Slugs are taken verbatim from the file stem. The only rewrite is removal of
//! a leading `YYYY-MM-DD-` publication prefix, so `2025-09-12-hello.md` and
//! `hello.md` address the same document. Case and punctuation are left alone;
//! authors are expected to name files with URL-safe characters.

use std::path::Path;

const DATE_PREFIX_LEN: usize = "YYYY-MM-DD-".len();

/// Derive the slug for the document stored at `path`.
pub fn derive_slug(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    match strip_date_prefix(&stem) {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => stem,
    }
}

fn strip_date_prefix(stem: &str) -> Option<&str> {
    let prefix = stem.as_bytes().get(..DATE_PREFIX_LEN)?;
    let shape_matches = prefix.iter().enumerate().all(|(idx, byte)| match idx {
        4 | 7 | 10 => *byte == b'-',
        _ => byte.is_ascii_digit(),
    });

    shape_matches.then(|| &stem[DATE_PREFIX_LEN..])
}
