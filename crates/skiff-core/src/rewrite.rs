//! Specifier rewriting and the registration wire format.
//!
//! The direct strategy rewrites import/export specifier strings to resolved
//! canonical ids just before handing a unit to the engine's native loader.
//! The registration strategy wraps unit bodies in a universal registration
//! form, `System.register([slots], function (_export, _module) { ... })`,
//! and reads the slot list back out of delivery-network artifacts.

/// Rewrite every static and dynamic import specifier through `map`.
///
/// Specifiers for which `map` returns `None` are left untouched.
pub fn rewrite_specifiers<F>(code: &str, mut map: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(code.len());

    for line in code.lines() {
        let trimmed = line.trim_start();
        if is_import_line(trimmed) || is_reexport_line(trimmed) {
            out.push_str(&rewrite_static_line(line, &mut map));
        } else if line.contains("import(") {
            out.push_str(&rewrite_dynamic_line(line, &mut map));
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }

    if !code.ends_with('\n') && out.ends_with('\n') {
        out.pop();
    }

    out
}

/// Wrap a script body in the registration form, naming its dependency slots.
#[must_use]
pub fn wrap_register(code: &str, slots: &[String]) -> String {
    let list = slots
        .iter()
        .map(|s| serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\"")))
        .collect::<Vec<_>>()
        .join(", ");

    format!("System.register([{list}], function (_export, _module) {{\n{code}\n}});\n")
}

/// Read the dependency slot list off a registration-form source.
///
/// Returns `None` when the source does not open with a registration header,
/// which is how plain module sources are told apart from pre-registered
/// delivery-network artifacts.
#[must_use]
pub fn scan_register_slots(source: &str) -> Option<Vec<String>> {
    let bytes = source.as_bytes();
    let mut i = skip_trivia(bytes, 0);

    const HEADER: &[u8] = b"System.register";
    if bytes.len() < i + HEADER.len() || &bytes[i..i + HEADER.len()] != HEADER {
        return None;
    }
    i = skip_trivia(bytes, i + HEADER.len());

    if i >= bytes.len() || bytes[i] != b'(' {
        return None;
    }
    i = skip_trivia(bytes, i + 1);

    if i >= bytes.len() || bytes[i] != b'[' {
        return None;
    }
    i = skip_trivia(bytes, i + 1);

    let mut slots = Vec::new();
    loop {
        if i >= bytes.len() {
            return None;
        }
        if bytes[i] == b']' {
            return Some(slots);
        }
        let (slot, end) = read_quoted(bytes, i)?;
        slots.push(slot);
        i = skip_trivia(bytes, end);
        if i < bytes.len() && bytes[i] == b',' {
            i = skip_trivia(bytes, i + 1);
        }
    }
}

fn is_import_line(trimmed: &str) -> bool {
    trimmed.strip_prefix("import").is_some_and(|rest| {
        rest.starts_with(' ') || rest.starts_with('"') || rest.starts_with('\'')
    })
}

fn is_reexport_line(trimmed: &str) -> bool {
    trimmed.starts_with("export ") && trimmed.contains(" from ")
}

fn rewrite_static_line<F>(line: &str, map: &mut F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let search_from = match line.find(" from ") {
        Some(i) => i + 6,
        // Side-effect import: the string follows the keyword directly.
        None => line.find("import").map_or(0, |i| i + 6),
    };

    if let Some((start, end)) = extract_quoted(line, search_from) {
        if let Some(new) = map(&line[start..end]) {
            return format!("{}{new}{}", &line[..start], &line[end..]);
        }
    }

    line.to_string()
}

fn rewrite_dynamic_line<F>(line: &str, map: &mut F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(at) = rest.find("import(") {
        let after = at + 7;
        out.push_str(&rest[..after]);
        rest = &rest[after..];

        if let Some((start, end)) = extract_quoted(rest, 0) {
            // Only rewrite when the argument is the immediate string literal.
            let leading = &rest[..start.saturating_sub(1)];
            if leading.trim().is_empty() {
                if let Some(new) = map(&rest[start..end]) {
                    out.push_str(&rest[..start]);
                    out.push_str(&new);
                    rest = &rest[end..];
                    continue;
                }
            }
        }
    }

    out.push_str(rest);
    out
}

/// Locate the next quoted string at or after `from`; returns content bounds.
fn extract_quoted(line: &str, from: usize) -> Option<(usize, usize)> {
    let bytes = line.as_bytes();
    let mut i = from;
    while i < bytes.len() && !matches!(bytes[i], b'"' | b'\'' | b'`') {
        i += 1;
    }
    if i >= bytes.len() {
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
        j += 1;
    }

    (j < bytes.len()).then_some((start, j))
}

fn read_quoted(bytes: &[u8], i: usize) -> Option<(String, usize)> {
    if i >= bytes.len() || !matches!(bytes[i], b'"' | b'\'') {
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
        j += 1;
    }
    if j >= bytes.len() {
        return None;
    }
    Some((String::from_utf8_lossy(&bytes[start..j]).into_owned(), j + 1))
}

fn skip_trivia(bytes: &[u8], mut i: usize) -> usize {
    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i + 1 < bytes.len() && bytes[i] == b'/' && bytes[i + 1] == b'/' {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }
        if i + 1 < bytes.len() && bytes[i] == b'/' && bytes[i + 1] == b'*' {
            i += 2;
            while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                i += 1;
            }
            i = (i + 2).min(bytes.len());
            continue;
        }
        return i;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_static_import() {
        let code = r#"import { a } from "./dep";"#;
        let out = rewrite_specifiers(code, |s| {
            (s == "./dep").then(|| "about:blank/dep.js".to_string())
        });
        assert_eq!(out, r#"import { a } from "about:blank/dep.js";"#);
    }

    #[test]
    fn test_rewrite_side_effect_import() {
        let code = r#"import "./polyfill";"#;
        let out = rewrite_specifiers(code, |_| Some("about:blank/polyfill.js".to_string()));
        assert_eq!(out, r#"import "about:blank/polyfill.js";"#);
    }

    #[test]
    fn test_rewrite_reexport() {
        let code = r#"export { x } from "./dep";"#;
        let out = rewrite_specifiers(code, |_| Some("X".to_string()));
        assert_eq!(out, r#"export { x } from "X";"#);
    }

    #[test]
    fn test_rewrite_dynamic_import() {
        let code = r#"const m = await import("./lazy");"#;
        let out = rewrite_specifiers(code, |s| {
            (s == "./lazy").then(|| "about:blank/lazy.js".to_string())
        });
        assert_eq!(out, r#"const m = await import("about:blank/lazy.js");"#);
    }

    #[test]
    fn test_unmapped_specifier_is_untouched() {
        let code = r#"import { a } from "./dep";"#;
        let out = rewrite_specifiers(code, |_| None);
        assert_eq!(out, code);
    }

    #[test]
    fn test_non_import_lines_pass_through() {
        let code = "const x = 1;\nimport a from \"./a\";\nconst y = 2;";
        let out = rewrite_specifiers(code, |_| Some("Z".to_string()));
        assert_eq!(out, "const x = 1;\nimport a from \"Z\";\nconst y = 2;");
    }

    #[test]
    fn test_wrap_and_scan_roundtrip() {
        let slots = vec!["./a.js".to_string(), "https://x/y".to_string()];
        let wrapped = wrap_register("_export(\"default\", 1);", &slots);
        assert_eq!(scan_register_slots(&wrapped).unwrap(), slots);
    }

    #[test]
    fn test_wrap_register_empty_slots() {
        let wrapped = wrap_register("code();", &[]);
        assert!(wrapped.starts_with("System.register([]"));
        assert_eq!(scan_register_slots(&wrapped).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_scan_register_slots_rejects_plain_source() {
        assert_eq!(scan_register_slots("import a from \"./a\";"), None);
        assert_eq!(scan_register_slots(""), None);
    }

    #[test]
    fn test_scan_register_slots_skips_leading_comments() {
        let source = "// bundled by cdn\nSystem.register(['./dep.js'], function (e, m) {});";
        assert_eq!(scan_register_slots(source).unwrap(), ["./dep.js"]);
    }
}
