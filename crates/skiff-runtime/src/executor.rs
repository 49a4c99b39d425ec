//! Execution engine: binds resolved dependency exports and runs units.
//!
//! Data, stylesheet, and component assembly execute in-process; script
//! bodies go to the host scripting environment in the shape the active
//! module-format strategy calls for. Both strategies must produce the same
//! observable exports for the same source — only the wire format and the
//! in-page loading primitive differ.

use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::trace;

use skiff_core::rewrite::{rewrite_specifiers, wrap_register};
use skiff_core::{
    Bindings, ComponentDefinition, ExecutableUnit, ExportValue, Exports, HostDocument,
    ModuleFormat, NativeArtifact, RegisteredUnit, Result, ScriptUnit,
};

use crate::engine::ScriptEngine;

pub(crate) struct Executor {
    pub engine: Rc<dyn ScriptEngine>,
    pub document: Rc<dyn HostDocument>,
    pub format: ModuleFormat,
}

impl Executor {
    /// Execute a unit against its resolved dependency bindings. `resolved`
    /// maps each dependency specifier, as written, to its canonical path.
    pub async fn execute(
        &self,
        unit: &ExecutableUnit,
        bindings: &Bindings,
        resolved: &BTreeMap<String, String>,
    ) -> Result<Exports> {
        match unit {
            ExecutableUnit::Data(value) => Ok(Exports::json_default(value.clone())),

            ExecutableUnit::Style(style) => Ok(self.insert_style(&style.css)),

            ExecutableUnit::Remote(url) => {
                let artifact = NativeArtifact {
                    url: url.clone(),
                    source: None,
                };
                self.engine.import_module(&artifact).await
            }

            ExecutableUnit::Script(script) => {
                self.execute_script(script, bindings, resolved).await
            }

            ExecutableUnit::Component(component) => {
                let script_exports = match &component.script {
                    Some(script) => self.execute_script(script, bindings, resolved).await?,
                    None => Exports::default(),
                };

                let style_css = component.style.as_ref().map(|style| style.css.clone());
                if let Some(css) = &style_css {
                    self.document.insert_style(css);
                }

                let definition = ComponentDefinition::new(
                    component.name.clone(),
                    component.render.clone(),
                    component.scope_attr.clone(),
                    style_css,
                    script_exports,
                );
                Ok(Exports::default_only(ExportValue::Component(Rc::new(
                    definition,
                ))))
            }
        }
    }

    /// Stylesheet execution: one live style element, exported as both the
    /// element handle and the final CSS text.
    fn insert_style(&self, css: &str) -> Exports {
        let handle = self.document.insert_style(css);
        let mut map = BTreeMap::new();
        map.insert("default".to_string(), ExportValue::Style(handle));
        map.insert("element".to_string(), ExportValue::Style(handle));
        map.insert("css".to_string(), ExportValue::Json(css.into()));
        Exports::from_map(map)
    }

    async fn execute_script(
        &self,
        unit: &ScriptUnit,
        bindings: &Bindings,
        resolved: &BTreeMap<String, String>,
    ) -> Result<Exports> {
        // Pre-registered sources run through the shim under either strategy;
        // the registration form is universal. Plain bodies are wrapped on
        // the way in.
        if unit.registered || self.format == ModuleFormat::Register {
            let code = if unit.registered {
                unit.code.clone()
            } else {
                wrap_register(&unit.code, &unit.dependencies)
            };
            let registered = RegisteredUnit {
                path: unit.path.clone(),
                code,
                slots: unit.dependencies.clone(),
            };
            trace!(path = %registered.path, slots = registered.slots.len(), "instantiating registered unit");
            return self.engine.instantiate(&registered, bindings).await;
        }

        let source = rewrite_specifiers(&unit.code, |spec| resolved.get(spec).cloned());
        let artifact = NativeArtifact {
            url: unit.path.clone(),
            source: Some(source),
        };
        trace!(url = %artifact.url, "importing native artifact");
        self.engine.import_module(&artifact).await
    }
}
