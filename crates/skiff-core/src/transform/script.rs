//! Script transform strategy.

use crate::compile::ScriptCompiler;
use crate::error::{Error, Result};
use crate::rewrite::scan_register_slots;
use crate::scan::scan_imports;
use crate::unit::{ExecutableUnit, ScriptUnit, SourceKind};

use super::{TransformContext, TransformOutput, TransformStrategy};

/// Scripts: lower through the script compiler, then statically discover
/// import targets. Sources already carrying a registration header keep
/// their declared slot list as their dependencies.
pub struct ScriptStrategy;

impl TransformStrategy for ScriptStrategy {
    fn source_kind(&self) -> SourceKind {
        SourceKind::Script
    }

    fn transform(&self, ctx: &TransformContext<'_>) -> Result<TransformOutput> {
        let unit = transform_script(ctx.canonical_path, ctx.source, ctx.script_compiler)?;
        Ok(TransformOutput {
            dependencies: unit.dependencies.clone(),
            unit: ExecutableUnit::Script(unit),
        })
    }
}

/// Shared with the component strategy, which runs its script section through
/// the same pipeline.
pub(crate) fn transform_script(
    path: &str,
    source: &str,
    compiler: &dyn ScriptCompiler,
) -> Result<ScriptUnit> {
    let code = compiler.compile(path, source).map_err(|e| match e {
        Error::Compile { .. } => e,
        other => Error::compile(path, other.to_string()),
    })?;

    if let Some(slots) = scan_register_slots(&code) {
        return Ok(ScriptUnit {
            path: path.to_string(),
            code,
            dependencies: slots,
            registered: true,
        });
    }

    let dependencies = scan_imports(&code)
        .into_iter()
        .map(|spec| spec.specifier)
        .collect();

    Ok(ScriptUnit {
        path: path.to_string(),
        code,
        dependencies,
        registered: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{InterpolatingCompiler, PassthroughCompiler};

    fn transform(source: &str) -> TransformOutput {
        let ctx = TransformContext {
            canonical_path: "about:blank/app.js",
            source,
            script_compiler: &PassthroughCompiler,
            template_compiler: &InterpolatingCompiler,
        };
        ScriptStrategy.transform(&ctx).unwrap()
    }

    #[test]
    fn test_discovers_dependencies() {
        let output = transform("import a from \"./a\";\nimport \"lodash\";\nexport const x = 1;");
        assert_eq!(output.dependencies, ["./a", "lodash"]);
        match output.unit {
            ExecutableUnit::Script(unit) => {
                assert!(!unit.registered);
                assert!(unit.code.contains("export const x = 1;"));
            }
            other => panic!("expected script unit, got {other:?}"),
        }
    }

    #[test]
    fn test_registered_source_keeps_slot_list() {
        let source = "System.register([\"./dep.js\"], function (_export, _module) {});";
        let output = transform(source);
        assert_eq!(output.dependencies, ["./dep.js"]);
        match output.unit {
            ExecutableUnit::Script(unit) => assert!(unit.registered),
            other => panic!("expected script unit, got {other:?}"),
        }
    }

    #[test]
    fn test_compiler_failure_is_tagged() {
        struct FailingCompiler;
        impl ScriptCompiler for FailingCompiler {
            fn name(&self) -> &'static str {
                "failing"
            }
            fn compile(&self, _path: &str, _source: &str) -> Result<String> {
                Err(Error::not_found("inner"))
            }
        }

        let err = transform_script("about:blank/app.ts", "let x;", &FailingCompiler).unwrap_err();
        match err {
            Error::Compile { path, .. } => assert_eq!(path, "about:blank/app.ts"),
            other => panic!("expected compile error, got {other:?}"),
        }
    }
}
