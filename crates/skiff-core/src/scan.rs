//! Static import discovery for script sources.
//!
//! Finds `import ... from "x"`, side-effect `import "x"`,
//! `export ... from "x"`, and dynamic `import("x")` specifiers without a
//! full parse. Comments are skipped; results come back in first-appearance
//! order, deduplicated by specifier.

use std::collections::HashSet;

/// How a specifier appeared in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// `import ... from "x"` or side-effect `import "x"`.
    Static,
    /// `export ... from "x"`.
    Reexport,
    /// `import("x")`.
    Dynamic,
}

/// One discovered import target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    pub specifier: String,
    pub kind: ImportKind,
    /// 1-indexed line of the statement, best-effort.
    pub line: u32,
}

/// Scan script source for statically discoverable import targets.
#[must_use]
pub fn scan_imports(source: &str) -> Vec<ImportSpec> {
    let bytes = source.as_bytes();
    let len = bytes.len();
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut line: u32 = 1;
    let mut i = 0;

    while i < len {
        match bytes[i] {
            b'\n' => {
                line += 1;
                i += 1;
            }
            b'/' if i + 1 < len && bytes[i + 1] == b'/' => {
                while i < len && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if i + 1 < len && bytes[i + 1] == b'*' => {
                i += 2;
                while i + 1 < len && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    if bytes[i] == b'\n' {
                        line += 1;
                    }
                    i += 1;
                }
                i = (i + 2).min(len);
            }
            _ if keyword_at(bytes, i, b"import") => {
                let at_line = line;
                if let Some(found) = scan_import_clause(bytes, i + 6, &mut line) {
                    if seen.insert(found.specifier.clone()) {
                        let kind = if found.dynamic {
                            ImportKind::Dynamic
                        } else {
                            ImportKind::Static
                        };
                        out.push(ImportSpec {
                            specifier: found.specifier,
                            kind,
                            line: at_line,
                        });
                    }
                    i = found.end;
                } else {
                    i += 1;
                }
            }
            _ if keyword_at(bytes, i, b"export") => {
                let at_line = line;
                if let Some(found) = scan_from_clause(bytes, i + 6, &mut line) {
                    if seen.insert(found.specifier.clone()) {
                        out.push(ImportSpec {
                            specifier: found.specifier,
                            kind: ImportKind::Reexport,
                            line: at_line,
                        });
                    }
                    i = found.end;
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }

    out
}

struct Found {
    specifier: String,
    end: usize,
    dynamic: bool,
}

/// Keyword match with word boundaries on both sides.
fn keyword_at(bytes: &[u8], pos: usize, keyword: &[u8]) -> bool {
    let end = pos + keyword.len();
    if end > bytes.len() || &bytes[pos..end] != keyword {
        return false;
    }
    if pos > 0 && is_ident_byte(bytes[pos - 1]) {
        return false;
    }
    if end < bytes.len() && is_ident_byte(bytes[end]) {
        return false;
    }
    true
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Scan whatever follows the `import` keyword: a dynamic call, a direct
/// string (side-effect import), or a clause ending in `from "x"`.
fn scan_import_clause(bytes: &[u8], start: usize, line: &mut u32) -> Option<Found> {
    let mut i = skip_whitespace(bytes, start, line);

    // Dynamic import: import("x")
    if i < bytes.len() && bytes[i] == b'(' {
        i = skip_whitespace(bytes, i + 1, line);
        let (specifier, end) = read_string(bytes, i, line)?;
        return Some(Found {
            specifier,
            end,
            dynamic: true,
        });
    }

    // Side-effect import: import "x"
    if i < bytes.len() && is_quote(bytes[i]) {
        let (specifier, end) = read_string(bytes, i, line)?;
        return Some(Found {
            specifier,
            end,
            dynamic: false,
        });
    }

    // Clause form: import { a, b } from "x" / import a from "x"
    scan_from_clause(bytes, i, line).map(|found| Found {
        dynamic: false,
        ..found
    })
}

/// Scan forward for `from "x"`, stopping at `;` or a bounded distance.
fn scan_from_clause(bytes: &[u8], start: usize, line: &mut u32) -> Option<Found> {
    let limit = (start + 1000).min(bytes.len());
    let mut i = start;

    while i < limit {
        match bytes[i] {
            b'\n' => {
                *line += 1;
                i += 1;
            }
            b';' => return None,
            _ if keyword_at(bytes, i, b"from") => {
                let at = skip_whitespace(bytes, i + 4, line);
                let (specifier, end) = read_string(bytes, at, line)?;
                return Some(Found {
                    specifier,
                    end,
                    dynamic: false,
                });
            }
            _ => i += 1,
        }
    }

    None
}

fn is_quote(b: u8) -> bool {
    b == b'"' || b == b'\'' || b == b'`'
}

fn skip_whitespace(bytes: &[u8], mut i: usize, line: &mut u32) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        if bytes[i] == b'\n' {
            *line += 1;
        }
        i += 1;
    }
    i
}

/// Read a quoted string starting at `i`; returns the contents and the index
/// past the closing quote.
fn read_string(bytes: &[u8], i: usize, line: &mut u32) -> Option<(String, usize)> {
    if i >= bytes.len() || !is_quote(bytes[i]) {
        return None;
    }
    let quote = bytes[i];
    let start = i + 1;
    let mut j = start;

    while j < bytes.len() && bytes[j] != quote {
        if bytes[j] == b'\\' && j + 1 < bytes.len() {
            j += 2;
            continue;
        }
        if bytes[j] == b'\n' {
            *line += 1;
        }
        j += 1;
    }

    if j >= bytes.len() {
        return None;
    }

    let specifier = String::from_utf8_lossy(&bytes[start..j]).into_owned();
    Some((specifier, j + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specifiers(source: &str) -> Vec<String> {
        scan_imports(source)
            .into_iter()
            .map(|s| s.specifier)
            .collect()
    }

    #[test]
    fn test_named_import() {
        let found = scan_imports(r#"import { foo } from "./dep";"#);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].specifier, "./dep");
        assert_eq!(found[0].kind, ImportKind::Static);
    }

    #[test]
    fn test_default_and_namespace_imports() {
        assert_eq!(specifiers(r#"import _ from "lodash";"#), ["lodash"]);
        assert_eq!(specifiers(r#"import * as u from "./utils";"#), ["./utils"]);
    }

    #[test]
    fn test_side_effect_import() {
        let found = scan_imports(r#"import "./polyfill";"#);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].specifier, "./polyfill");
        assert_eq!(found[0].kind, ImportKind::Static);
    }

    #[test]
    fn test_dynamic_import() {
        let found = scan_imports(r#"const m = await import("./lazy");"#);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].specifier, "./lazy");
        assert_eq!(found[0].kind, ImportKind::Dynamic);
    }

    #[test]
    fn test_reexport() {
        let found = scan_imports(r#"export { x } from "./dep"; export * from "./all";"#);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].kind, ImportKind::Reexport);
        assert_eq!(found[1].specifier, "./all");
    }

    #[test]
    fn test_plain_export_is_not_a_dependency() {
        assert!(specifiers("export const x = 1;").is_empty());
    }

    #[test]
    fn test_comments_are_skipped() {
        let source = r#"
// import a from "line-commented"
/* import b from "block-commented" */
import c from "./real";
"#;
        assert_eq!(specifiers(source), ["./real"]);
    }

    #[test]
    fn test_first_appearance_order_and_dedup() {
        let source = r#"
import a from "./a";
import b from "./b";
import again from "./a";
"#;
        assert_eq!(specifiers(source), ["./a", "./b"]);
    }

    #[test]
    fn test_single_quotes() {
        assert_eq!(specifiers("import x from './single';"), ["./single"]);
    }

    #[test]
    fn test_scoped_package() {
        assert_eq!(specifiers(r#"import t from "@scope/pkg";"#), ["@scope/pkg"]);
    }

    #[test]
    fn test_identifier_containing_import_is_ignored() {
        assert!(specifiers(r#"const reimport = 1; myimport("./x");"#).is_empty());
    }

    #[test]
    fn test_line_numbers() {
        let source = "\nimport a from \"./a\";\n\nimport b from \"./b\";\n";
        let found = scan_imports(source);
        assert_eq!(found[0].line, 2);
        assert_eq!(found[1].line, 4);
    }

    #[test]
    fn test_empty_source() {
        assert!(scan_imports("").is_empty());
    }
}
