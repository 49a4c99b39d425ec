//! Format transform dispatch.
//!
//! The registry maps a canonical path's extension to a transform strategy;
//! each strategy turns raw content into an executable unit plus the list of
//! specifiers it depends on. Unknown extensions fall back to the script
//! strategy — extensionless delivery-network artifacts are scripts.

pub mod component;
pub mod data;
pub mod script;
pub mod style;

use std::collections::HashMap;
use std::rc::Rc;

use crate::compile::{ScriptCompiler, TemplateCompiler};
use crate::error::Result;
use crate::paths;
use crate::unit::{ExecutableUnit, SourceKind};

/// Everything a strategy needs to transform one module.
pub struct TransformContext<'a> {
    pub canonical_path: &'a str,
    pub source: &'a str,
    pub script_compiler: &'a dyn ScriptCompiler,
    pub template_compiler: &'a dyn TemplateCompiler,
}

/// Transform result: the executable unit plus its dependency specifiers.
#[derive(Debug)]
pub struct TransformOutput {
    pub unit: ExecutableUnit,
    pub dependencies: Vec<String>,
}

/// One strategy per source kind; the table is open for extension.
pub trait TransformStrategy {
    fn source_kind(&self) -> SourceKind;

    fn transform(&self, ctx: &TransformContext<'_>) -> Result<TransformOutput>;
}

/// Extension → strategy table.
pub struct TransformRegistry {
    by_extension: HashMap<String, Rc<dyn TransformStrategy>>,
    fallback: Rc<dyn TransformStrategy>,
}

impl TransformRegistry {
    /// The built-in table: scripts, data, stylesheets, components.
    #[must_use]
    pub fn with_defaults() -> Self {
        let script: Rc<dyn TransformStrategy> = Rc::new(script::ScriptStrategy);
        let data: Rc<dyn TransformStrategy> = Rc::new(data::DataStrategy);
        let style: Rc<dyn TransformStrategy> = Rc::new(style::StyleStrategy);
        let component: Rc<dyn TransformStrategy> = Rc::new(component::ComponentStrategy);

        let mut registry = Self {
            by_extension: HashMap::new(),
            fallback: Rc::clone(&script),
        };
        for ext in ["js", "mjs", "jsx", "ts", "tsx"] {
            registry.register(ext, Rc::clone(&script));
        }
        registry.register("json", data);
        for ext in ["css", "scss", "sass"] {
            registry.register(ext, Rc::clone(&style));
        }
        registry.register("vue", component);
        registry
    }

    /// Register (or replace) the strategy for an extension.
    pub fn register(&mut self, extension: &str, strategy: Rc<dyn TransformStrategy>) {
        self.by_extension
            .insert(extension.to_ascii_lowercase(), strategy);
    }

    /// Strategy for a canonical path, dispatched on its extension.
    #[must_use]
    pub fn strategy_for(&self, canonical_path: &str) -> &dyn TransformStrategy {
        paths::extension(canonical_path)
            .and_then(|ext| self.by_extension.get(&ext.to_ascii_lowercase()))
            .unwrap_or(&self.fallback)
            .as_ref()
    }

    /// Source kind a canonical path will transform as.
    #[must_use]
    pub fn source_kind_for(&self, canonical_path: &str) -> SourceKind {
        self.strategy_for(canonical_path).source_kind()
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
