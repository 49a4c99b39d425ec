//! Executable units and the exports value model.
//!
//! A format transform turns raw content into an [`ExecutableUnit`] plus the
//! specifiers it depends on; executing the unit against its resolved
//! dependency [`Bindings`] yields [`Exports`]. Exports are handed to callers
//! by cheap clone — nothing outside the module graph ever holds a module
//! record.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::compile::RenderProc;
use crate::host::StyleHandle;

/// Source artifact family, keyed off the canonical path's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Script,
    Data,
    Stylesheet,
    Component,
}

/// One exported binding value.
#[derive(Clone)]
pub enum ExportValue {
    /// Structured data (data modules, script-produced values).
    Json(serde_json::Value),
    /// Handle to a live style element in the host document.
    Style(StyleHandle),
    /// A mounted component definition.
    Component(Rc<ComponentDefinition>),
}

impl ExportValue {
    #[must_use]
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_style(&self) -> Option<StyleHandle> {
        match self {
            Self::Style(handle) => Some(*handle),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_component(&self) -> Option<&ComponentDefinition> {
        match self {
            Self::Component(definition) => Some(definition),
            _ => None,
        }
    }
}

impl fmt::Debug for ExportValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(value) => write!(f, "Json({value})"),
            Self::Style(handle) => write!(f, "Style({})", handle.index()),
            Self::Component(definition) => {
                write!(f, "Component({})", definition.name.as_deref().unwrap_or("?"))
            }
        }
    }
}

/// A module's produced binding object.
#[derive(Debug, Clone, Default)]
pub struct Exports {
    inner: Rc<BTreeMap<String, ExportValue>>,
}

impl Exports {
    #[must_use]
    pub fn from_map(map: BTreeMap<String, ExportValue>) -> Self {
        Self {
            inner: Rc::new(map),
        }
    }

    /// Exports with a single `default` binding.
    #[must_use]
    pub fn default_only(value: ExportValue) -> Self {
        let mut map = BTreeMap::new();
        map.insert("default".to_string(), value);
        Self::from_map(map)
    }

    /// Exports with a single `default` JSON binding.
    #[must_use]
    pub fn json_default(value: serde_json::Value) -> Self {
        Self::default_only(ExportValue::Json(value))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ExportValue> {
        self.inner.get(name)
    }

    #[must_use]
    pub fn default_export(&self) -> Option<&ExportValue> {
        self.get("default")
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Resolved dependency bindings handed to unit execution, keyed by the
/// specifier exactly as the unit wrote it.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    map: BTreeMap<String, Exports>,
}

impl Bindings {
    pub fn insert(&mut self, specifier: impl Into<String>, exports: Exports) {
        self.map.insert(specifier.into(), exports);
    }

    #[must_use]
    pub fn get(&self, specifier: &str) -> Option<&Exports> {
        self.map.get(specifier)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Exports)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Natively importable artifact for the direct strategy. `source` is inline
/// module text; when absent the engine fetches `url` itself.
#[derive(Debug, Clone)]
pub struct NativeArtifact {
    pub url: String,
    pub source: Option<String>,
}

/// Registration-form unit executed through the in-process loader shim.
#[derive(Debug, Clone)]
pub struct RegisteredUnit {
    pub path: String,
    pub code: String,
    pub slots: Vec<String>,
}

/// Script unit: lowered code plus its statically discovered dependencies.
#[derive(Debug, Clone)]
pub struct ScriptUnit {
    pub path: String,
    pub code: String,
    pub dependencies: Vec<String>,
    /// Source already carries a registration header (delivery-network
    /// artifacts); executed through the shim under either strategy.
    pub registered: bool,
}

/// Stylesheet unit: compiled plain CSS, inserted on execution.
#[derive(Debug, Clone)]
pub struct StyleUnit {
    pub css: String,
}

/// Component unit: compiled sections awaiting execution.
pub struct ComponentUnit {
    pub name: Option<String>,
    pub render: RenderProc,
    pub script: Option<ScriptUnit>,
    pub style: Option<StyleUnit>,
    pub scope_attr: Option<String>,
}

impl fmt::Debug for ComponentUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentUnit")
            .field("name", &self.name)
            .field("has_script", &self.script.is_some())
            .field("has_style", &self.style.is_some())
            .field("scope_attr", &self.scope_attr)
            .finish_non_exhaustive()
    }
}

/// Executable unit produced by a format transform.
pub enum ExecutableUnit {
    Script(ScriptUnit),
    Data(serde_json::Value),
    Style(StyleUnit),
    Component(ComponentUnit),
    /// Delivery-network artifact the engine's native loader fetches and
    /// executes itself.
    Remote(String),
}

impl ExecutableUnit {
    #[must_use]
    pub fn source_kind(&self) -> SourceKind {
        match self {
            Self::Script(_) | Self::Remote(_) => SourceKind::Script,
            Self::Data(_) => SourceKind::Data,
            Self::Style(_) => SourceKind::Stylesheet,
            Self::Component(_) => SourceKind::Component,
        }
    }
}

impl fmt::Debug for ExecutableUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Script(unit) => f.debug_tuple("Script").field(&unit.path).finish(),
            Self::Data(value) => f.debug_tuple("Data").field(value).finish(),
            Self::Style(unit) => f.debug_tuple("Style").field(&unit.css.len()).finish(),
            Self::Component(unit) => f.debug_tuple("Component").field(&unit.name).finish(),
            Self::Remote(url) => f.debug_tuple("Remote").field(url).finish(),
        }
    }
}

/// A mounted component: render procedure, script exports, injected style.
pub struct ComponentDefinition {
    pub name: Option<String>,
    pub scope_attr: Option<String>,
    pub style_css: Option<String>,
    pub script_exports: Exports,
    render: RenderProc,
}

impl ComponentDefinition {
    #[must_use]
    pub fn new(
        name: Option<String>,
        render: RenderProc,
        scope_attr: Option<String>,
        style_css: Option<String>,
        script_exports: Exports,
    ) -> Self {
        Self {
            name,
            scope_attr,
            style_css,
            script_exports,
            render,
        }
    }

    /// Render the component with the given props. When the component's style
    /// is scoped, the scope attribute is applied to the rendered root.
    #[must_use]
    pub fn render(&self, props: &serde_json::Value) -> String {
        let markup = (self.render)(props);
        match &self.scope_attr {
            Some(attr) => inject_scope_attr(&markup, attr),
            None => markup,
        }
    }
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("name", &self.name)
            .field("scope_attr", &self.scope_attr)
            .field("has_style", &self.style_css.is_some())
            .finish_non_exhaustive()
    }
}

/// Insert the scope attribute into the first opening tag of the markup.
fn inject_scope_attr(markup: &str, attr: &str) -> String {
    let Some(open) = markup.find('<') else {
        return markup.to_string();
    };
    let Some(close_rel) = markup[open..].find('>') else {
        return markup.to_string();
    };
    let mut close = open + close_rel;
    if markup[..close].ends_with('/') {
        close -= 1;
    }
    format!("{} {attr}{}", &markup[..close], &markup[close..])
}
