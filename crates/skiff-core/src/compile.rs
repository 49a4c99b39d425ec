//! Pluggable compiler boundaries.
//!
//! The individual format compilers are consumed as opaque transforms. The
//! script compiler lowers optionally-typed scripts with embedded markup to
//! plain executable text; the template compiler turns a component template
//! into a render procedure. The in-crate defaults cover plain sources;
//! embedders plug real compilers in through `RuntimeOptions`.

use std::rc::Rc;

use crate::error::{Error, Result};

/// Script-lowering backend (type stripping, markup-to-call-expression).
pub trait ScriptCompiler {
    fn name(&self) -> &'static str;

    /// Lower script source to plain executable text.
    fn compile(&self, path: &str, source: &str) -> Result<String>;
}

/// Identity backend for hosts whose scripts are already plain.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughCompiler;

impl ScriptCompiler for PassthroughCompiler {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn compile(&self, _path: &str, source: &str) -> Result<String> {
        Ok(source.to_string())
    }
}

/// A compiled template: props in, markup out.
pub type RenderProc = Rc<dyn Fn(&serde_json::Value) -> String>;

/// Template-to-render-procedure backend.
pub trait TemplateCompiler {
    fn compile(&self, path: &str, template: &str) -> Result<RenderProc>;
}

/// Default template backend: `{{ path.to.field }}` interpolation against the
/// render props. Strings render bare, other values through their JSON text,
/// missing fields as the empty string.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterpolatingCompiler;

impl TemplateCompiler for InterpolatingCompiler {
    fn compile(&self, path: &str, template: &str) -> Result<RenderProc> {
        let segments = parse_segments(path, template)?;
        Ok(Rc::new(move |props| render_segments(&segments, props)))
    }
}

enum Segment {
    Text(String),
    Expr(String),
}

fn parse_segments(path: &str, template: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        if open > 0 {
            segments.push(Segment::Text(rest[..open].to_string()));
        }
        let after = &rest[open + 2..];
        let close = after
            .find("}}")
            .ok_or_else(|| Error::compile(path, "unterminated '{{' in template"))?;
        segments.push(Segment::Expr(after[..close].trim().to_string()));
        rest = &after[close + 2..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Text(rest.to_string()));
    }

    Ok(segments)
}

fn render_segments(segments: &[Segment], props: &serde_json::Value) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Expr(expr) => {
                if let Some(value) = lookup(props, expr) {
                    match value {
                        serde_json::Value::String(s) => out.push_str(s),
                        serde_json::Value::Null => {}
                        other => out.push_str(&other.to_string()),
                    }
                }
            }
        }
    }
    out
}

fn lookup<'a>(props: &'a serde_json::Value, expr: &str) -> Option<&'a serde_json::Value> {
    expr.split('.').try_fold(props, |value, key| value.get(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_passthrough_compiler() {
        let out = PassthroughCompiler
            .compile("about:blank/a.js", "export const x = 1;")
            .unwrap();
        assert_eq!(out, "export const x = 1;");
    }

    #[test]
    fn test_interpolation() {
        let render = InterpolatingCompiler
            .compile("about:blank/w.vue", "<p>Hello, {{ name }}!</p>")
            .unwrap();
        assert_eq!(render(&json!({"name": "World"})), "<p>Hello, World!</p>");
    }

    #[test]
    fn test_interpolation_dot_paths_and_numbers() {
        let render = InterpolatingCompiler
            .compile("about:blank/w.vue", "{{ user.name }} is {{ user.age }}")
            .unwrap();
        let props = json!({"user": {"name": "Ada", "age": 36}});
        assert_eq!(render(&props), "Ada is 36");
    }

    #[test]
    fn test_interpolation_missing_field_is_empty() {
        let render = InterpolatingCompiler
            .compile("about:blank/w.vue", "[{{ missing }}]")
            .unwrap();
        assert_eq!(render(&json!({})), "[]");
    }

    #[test]
    fn test_unterminated_expression_is_compile_error() {
        let err = InterpolatingCompiler
            .compile("about:blank/w.vue", "<p>{{ name</p>")
            .err()
            .unwrap();
        assert!(matches!(err, Error::Compile { .. }));
    }
}
