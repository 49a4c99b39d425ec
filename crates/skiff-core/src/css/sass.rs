//! Preprocessed stylesheet dialects (SCSS/Sass), compiled with grass.

use crate::error::{Error, Result};
use crate::paths;

/// True when the canonical path names a preprocessed stylesheet dialect.
#[must_use]
pub fn is_sass_path(path: &str) -> bool {
    matches!(paths::extension(path), Some("scss" | "sass"))
}

/// Compile SCSS/Sass source to plain CSS.
///
/// There is no include-path resolution: in-page sources are self-contained
/// and `@use`/`@import` of further files is not part of the host contract.
pub fn compile_sass(path: &str, source: &str) -> Result<String> {
    let options = grass::Options::default().style(grass::OutputStyle::Expanded);

    grass::from_string(source.to_string(), &options)
        .map_err(|e| Error::compile(path, format!("Sass compile error: {e}")))
}
