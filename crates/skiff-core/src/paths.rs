//! Canonical path handling.
//!
//! Canonical paths are opaque strings in one of two families: local paths
//! rooted at the in-page local root (`about:blank/...`) and full
//! delivery-network URLs. Normalization is purely lexical — the runtime
//! never touches a filesystem — and the host's canonicalization hook, when
//! present, has the final word on local paths.

use url::Url;

use crate::error::{Error, Result};

/// Implicit root for top-level relative specifiers: an empty in-page
/// document location.
pub const LOCAL_ROOT: &str = "about:blank";

/// True for canonical paths served by the delivery network.
#[must_use]
pub fn is_remote(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

/// True for specifiers that name a package rather than a path.
#[must_use]
pub fn is_bare(specifier: &str) -> bool {
    !(specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier.starts_with('/')
        || is_remote(specifier))
}

/// Everything up to the last `/`, or the whole path when it has none.
#[must_use]
pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) => &path[..i],
        None => path,
    }
}

/// The root segment of a local canonical path (`about:blank/src/a.js` →
/// `about:blank`).
#[must_use]
pub fn local_root_of(path: &str) -> &str {
    match path.find('/') {
        Some(i) => &path[..i],
        None => path,
    }
}

/// Collapse `.` and `..` segments of a local canonical path. `..` never
/// escapes the root segment.
#[must_use]
pub fn normalize(path: &str) -> String {
    let (root, rest) = match path.find('/') {
        Some(i) => (&path[..i], &path[i + 1..]),
        None => return path.to_string(),
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        root.to_string()
    } else {
        format!("{root}/{}", segments.join("/"))
    }
}

/// Join a specifier against its importer's canonical path.
///
/// Remote importers are joined through the `url` crate; local ones
/// lexically. Full URLs pass through (re-parsed for validity).
pub fn join(importer: &str, specifier: &str) -> Result<String> {
    if is_remote(specifier) {
        let url = Url::parse(specifier)
            .map_err(|e| Error::not_found(format!("Invalid URL '{specifier}': {e}")))?;
        return Ok(url.to_string());
    }

    if is_remote(importer) {
        let base = Url::parse(importer)
            .map_err(|e| Error::not_found(format!("Invalid importer URL '{importer}': {e}")))?;
        let joined = base
            .join(specifier)
            .map_err(|e| Error::not_found(format!("Cannot resolve '{specifier}': {e}")))?;
        return Ok(joined.to_string());
    }

    if let Some(absolute) = specifier.strip_prefix('/') {
        return Ok(normalize(&format!("{}/{absolute}", local_root_of(importer))));
    }

    Ok(normalize(&format!("{}/{specifier}", dirname(importer))))
}

/// Strip the local root from a canonical path, yielding the path handed to
/// the host adapter (`about:blank/src/a.js` → `src/a.js`).
#[must_use]
pub fn host_path<'a>(canonical: &'a str, local_root: &str) -> &'a str {
    canonical
        .strip_prefix(local_root)
        .map_or(canonical, |rest| rest.strip_prefix('/').unwrap_or(rest))
}

/// Filename extension of the last path segment, if any.
#[must_use]
pub fn extension(path: &str) -> Option<&str> {
    let segment = match path.rfind('/') {
        Some(i) => &path[i + 1..],
        None => path,
    };
    match segment.rfind('.') {
        Some(i) if i > 0 && i + 1 < segment.len() => Some(&segment[i + 1..]),
        _ => None,
    }
}
