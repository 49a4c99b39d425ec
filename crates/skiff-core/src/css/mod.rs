//! Stylesheet compilation.
//!
//! Preprocessed dialects go through grass first; everything then passes
//! through lightningcss, which both validates the syntax and normalizes the
//! output text that ends up in the inserted style element.

pub mod sass;

use lightningcss::printer::PrinterOptions;
use lightningcss::stylesheet::{ParserOptions, StyleSheet};

use crate::error::{Error, Result};

/// Compile a stylesheet source, plain or preprocessed, to plain CSS text.
pub fn compile_stylesheet(path: &str, source: &str) -> Result<String> {
    let css = if sass::is_sass_path(path) {
        sass::compile_sass(path, source)?
    } else {
        source.to_string()
    };
    process_css(path, &css)
}

/// Parse and reprint plain CSS. Syntax errors become compile errors tagged
/// with the canonical path.
pub fn process_css(path: &str, source: &str) -> Result<String> {
    let stylesheet = StyleSheet::parse(source, ParserOptions::default())
        .map_err(|e| Error::compile(path, format!("CSS parse error: {e}")))?;

    let output = stylesheet
        .to_css(PrinterOptions::default())
        .map_err(|e| Error::compile(path, format!("CSS print error: {e}")))?;

    Ok(output.code)
}

/// Suffix every top-level selector with an attribute selector, scoping the
/// rules to elements carrying that attribute.
///
/// At-rule headers pass through untouched; selectors inside at-rule bodies
/// are not rewritten.
#[must_use]
pub fn scope_css(css: &str, attr: &str) -> String {
    let mut out = String::with_capacity(css.len() + 64);
    let mut chunk = String::new();
    let mut depth = 0usize;

    for c in css.chars() {
        match c {
            '{' => {
                if depth == 0 && !chunk.trim_start().starts_with('@') {
                    out.push_str(&scope_selector_list(&chunk, attr));
                } else {
                    out.push_str(&chunk);
                }
                out.push('{');
                chunk.clear();
                depth += 1;
            }
            '}' => {
                out.push_str(&chunk);
                out.push('}');
                chunk.clear();
                depth = depth.saturating_sub(1);
            }
            _ => chunk.push(c),
        }
    }

    out.push_str(&chunk);
    out
}

fn scope_selector_list(list: &str, attr: &str) -> String {
    list.split(',')
        .map(|selector| {
            let kept = selector.trim_end();
            if kept.trim().is_empty() {
                selector.to_string()
            } else {
                let trailing = &selector[kept.len()..];
                format!("{kept}[{attr}]{trailing}")
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}
