//! Single-file component transform strategy.
//!
//! Components carry `<template>`, `<script>`, and `<style>` sections in one
//! source file. The template compiles to a render procedure, the script
//! section runs through the script pipeline (its dependencies are the
//! component's), and the style section — optionally in a preprocessed
//! dialect, optionally scoped — compiles to plain CSS for injection at
//! execution time.

use std::hash::{Hash, Hasher};

use crate::css;
use crate::error::{Error, Result};
use crate::unit::{ComponentUnit, ExecutableUnit, SourceKind, StyleUnit};

use super::script::transform_script;
use super::{TransformContext, TransformOutput, TransformStrategy};

pub struct ComponentStrategy;

impl TransformStrategy for ComponentStrategy {
    fn source_kind(&self) -> SourceKind {
        SourceKind::Component
    }

    fn transform(&self, ctx: &TransformContext<'_>) -> Result<TransformOutput> {
        let path = ctx.canonical_path;
        let sections = parse_sections(path, ctx.source)?;

        let template = sections
            .template
            .ok_or_else(|| Error::compile(path, "missing <template> section"))?;
        let render = ctx
            .template_compiler
            .compile(path, template.content.trim())?;

        let script = match &sections.script {
            Some(section) => Some(transform_script(path, &section.content, ctx.script_compiler)?),
            None => None,
        };

        let (style, scope_attr) = match &sections.style {
            Some(section) => {
                let css = match section.attr("lang") {
                    Some("scss" | "sass") => {
                        let compiled = css::sass::compile_sass(path, &section.content)?;
                        css::process_css(path, &compiled)?
                    }
                    Some(other) => {
                        return Err(Error::compile(
                            path,
                            format!("unsupported style dialect '{other}'"),
                        ));
                    }
                    None => css::process_css(path, &section.content)?,
                };

                let scope_attr = section
                    .has_flag("scoped")
                    .then(|| format!("data-s-{}", scope_hash(path)));
                let css = match &scope_attr {
                    Some(attr) => css::scope_css(&css, attr),
                    None => css,
                };
                (Some(StyleUnit { css }), scope_attr)
            }
            None => (None, None),
        };

        let dependencies = script
            .as_ref()
            .map(|unit| unit.dependencies.clone())
            .unwrap_or_default();

        let unit = ComponentUnit {
            name: component_name(path),
            render,
            script,
            style,
            scope_attr,
        };

        Ok(TransformOutput {
            dependencies,
            unit: ExecutableUnit::Component(unit),
        })
    }
}

/// Component name from the file stem (`widget.vue` → `widget`).
fn component_name(path: &str) -> Option<String> {
    let segment = path.rsplit('/').next()?;
    let stem = segment.rsplit_once('.').map_or(segment, |(stem, _)| stem);
    (!stem.is_empty()).then(|| stem.to_string())
}

/// Stable per-path scope id.
fn scope_hash(path: &str) -> String {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    path.hash(&mut hasher);
    format!("{:08x}", hasher.finish() as u32)
}

#[derive(Debug, Default)]
struct Sections {
    template: Option<Section>,
    script: Option<Section>,
    style: Option<Section>,
}

#[derive(Debug)]
struct Section {
    attrs: Vec<(String, Option<String>)>,
    content: String,
}

impl Section {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .and_then(|(_, value)| value.as_deref())
    }

    fn has_flag(&self, name: &str) -> bool {
        self.attrs.iter().any(|(key, _)| key == name)
    }
}

fn parse_sections(path: &str, source: &str) -> Result<Sections> {
    let sections = Sections {
        template: find_section(path, source, "template")?,
        script: find_section(path, source, "script")?,
        style: find_section(path, source, "style")?,
    };

    if sections.template.is_none() && sections.script.is_none() && sections.style.is_none() {
        return Err(Error::compile(path, "no component sections found"));
    }

    Ok(sections)
}

/// Find one `<name ...>...</name>` block. Duplicate blocks are rejected.
fn find_section(path: &str, source: &str, name: &str) -> Result<Option<Section>> {
    let open_tag = format!("<{name}");
    let close_tag = format!("</{name}>");

    let Some(open) = find_tag(source, &open_tag) else {
        return Ok(None);
    };

    let after_open = open + open_tag.len();
    let Some(tag_end_rel) = source[after_open..].find('>') else {
        return Err(Error::compile(path, format!("unterminated <{name}> tag")));
    };
    let tag_end = after_open + tag_end_rel;
    let attrs = parse_attrs(&source[after_open..tag_end]);

    let content_start = tag_end + 1;
    let Some(close_rel) = source[content_start..].find(&close_tag) else {
        return Err(Error::compile(path, format!("missing {close_tag}")));
    };
    let content_end = content_start + close_rel;

    if find_tag(&source[content_end + close_tag.len()..], &open_tag).is_some() {
        return Err(Error::compile(path, format!("duplicate <{name}> section")));
    }

    Ok(Some(Section {
        attrs,
        content: source[content_start..content_end].to_string(),
    }))
}

/// Locate an opening tag followed by whitespace or `>` (so `<style` does not
/// match `<styleguide`).
fn find_tag(source: &str, open_tag: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(rel) = source[from..].find(open_tag) {
        let at = from + rel;
        let after = at + open_tag.len();
        match source.as_bytes().get(after) {
            Some(b'>' | b' ' | b'\t' | b'\n' | b'\r') => return Some(at),
            None => return None,
            _ => from = after,
        }
    }
    None
}

fn parse_attrs(raw: &str) -> Vec<(String, Option<String>)> {
    raw.split_whitespace()
        .map(|token| match token.split_once('=') {
            Some((key, value)) => (
                key.to_string(),
                Some(value.trim_matches(['"', '\'']).to_string()),
            ),
            None => (token.to_string(), None),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{InterpolatingCompiler, PassthroughCompiler};
    use serde_json::json;

    const WIDGET: &str = r#"
<template>
  <p class="greeting">Hello, {{ name }}!</p>
</template>

<script>
import { helper } from "./helper.js";
export const kind = "widget";
</script>

<style lang="scss" scoped>
$color: red;
.greeting { color: $color; }
</style>
"#;

    fn transform(path: &str, source: &str) -> Result<TransformOutput> {
        let ctx = TransformContext {
            canonical_path: path,
            source,
            script_compiler: &PassthroughCompiler,
            template_compiler: &InterpolatingCompiler,
        };
        ComponentStrategy.transform(&ctx)
    }

    #[test]
    fn test_full_component() {
        let output = transform("about:blank/widget.vue", WIDGET).unwrap();
        assert_eq!(output.dependencies, ["./helper.js"]);

        let ExecutableUnit::Component(unit) = output.unit else {
            panic!("expected component unit");
        };
        assert_eq!(unit.name.as_deref(), Some("widget"));
        assert!(unit.script.is_some());

        let style = unit.style.unwrap();
        assert!(style.css.contains("color: red"));
        let scope = unit.scope_attr.unwrap();
        assert!(style.css.contains(&format!(".greeting[{scope}]")));

        let markup = (unit.render)(&json!({"name": "World"}));
        assert!(markup.contains("Hello, World!"));
    }

    #[test]
    fn test_template_only_component() {
        let output = transform(
            "about:blank/plain.vue",
            "<template><span>{{ x }}</span></template>",
        )
        .unwrap();
        assert!(output.dependencies.is_empty());
        let ExecutableUnit::Component(unit) = output.unit else {
            panic!("expected component unit");
        };
        assert!(unit.script.is_none());
        assert!(unit.style.is_none());
        assert!(unit.scope_attr.is_none());
    }

    #[test]
    fn test_missing_template_is_compile_error() {
        let err = transform(
            "about:blank/broken.vue",
            "<script>export const x = 1;</script>",
        )
        .unwrap_err();
        match err {
            Error::Compile { detail, .. } => assert!(detail.contains("template")),
            other => panic!("expected compile error, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_section_rejected() {
        let source = "<template><a/></template><template><b/></template>";
        let err = transform("about:blank/dup.vue", source).unwrap_err();
        assert!(matches!(err, Error::Compile { .. }));
    }

    #[test]
    fn test_unscoped_plain_style() {
        let source =
            "<template><i>x</i></template><style>.plain { margin: 0; }</style>";
        let output = transform("about:blank/p.vue", source).unwrap();
        let ExecutableUnit::Component(unit) = output.unit else {
            panic!("expected component unit");
        };
        let style = unit.style.unwrap();
        assert!(style.css.contains(".plain"));
        assert!(!style.css.contains("[data-s-"));
    }

    #[test]
    fn test_unsupported_style_dialect() {
        let source = "<template><i>x</i></template><style lang=\"less\">.x{}</style>";
        let err = transform("about:blank/l.vue", source).unwrap_err();
        assert!(matches!(err, Error::Compile { .. }));
    }

    #[test]
    fn test_scope_hash_is_stable() {
        assert_eq!(scope_hash("about:blank/a.vue"), scope_hash("about:blank/a.vue"));
        assert_ne!(scope_hash("about:blank/a.vue"), scope_hash("about:blank/b.vue"));
    }
}
