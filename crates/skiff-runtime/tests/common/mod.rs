//! Shared test doubles: a scripted engine and an in-memory fetcher.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use futures::future::LocalBoxFuture;

use skiff_core::scan_imports;
use skiff_core::RemoteFetcher;
use skiff_runtime::{
    Bindings, Error, ExportValue, Exports, NativeArtifact, RegisteredUnit, Result, ScriptEngine,
};

/// Dependency exports as a module body sees them. Modules reference their
/// dependencies by specifier — the raw slot name in registration form, the
/// rewritten canonical id in native form — so lookups match on path suffix.
pub struct DepView {
    map: HashMap<String, Exports>,
}

impl DepView {
    fn empty() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn get(&self, suffix: &str) -> Option<&Exports> {
        self.map
            .iter()
            .find(|(key, _)| key.ends_with(suffix))
            .map(|(_, exports)| exports)
    }

    /// Convenience: a dependency's named JSON export.
    pub fn json(&self, suffix: &str, name: &str) -> Option<serde_json::Value> {
        self.get(suffix)?
            .get(name)?
            .as_json()
            .cloned()
    }
}

/// What happens when a module body runs: dependency view + execution tick in,
/// exports out. The tick increases monotonically across all executions, so
/// it doubles as a timestamp for recompute tests.
pub type Program = Rc<dyn Fn(&DepView, u64) -> Result<Exports>>;

/// Scripted stand-in for the host scripting environment.
///
/// Programs are keyed by module id — canonical path or delivery URL, prefix
/// matches allowed for URLs. Both strategies run the same program for the
/// same module, which is exactly the observable equivalence a real engine
/// must provide.
#[derive(Default)]
pub struct FakeEngine {
    programs: RefCell<HashMap<String, Program>>,
    /// Native module registry: id → exports, as a page loader would keep.
    registry: RefCell<HashMap<String, Exports>>,
    tick: Cell<u64>,
    executions: RefCell<Vec<String>>,
}

impl FakeEngine {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn program<F>(&self, id: &str, program: F)
    where
        F: Fn(&DepView, u64) -> Result<Exports> + 'static,
    {
        self.programs
            .borrow_mut()
            .insert(id.to_string(), Rc::new(program));
    }

    pub fn execution_count(&self, id: &str) -> usize {
        self.executions
            .borrow()
            .iter()
            .filter(|executed| *executed == id)
            .count()
    }

    fn lookup(&self, id: &str) -> Option<Program> {
        let programs = self.programs.borrow();
        programs.get(id).cloned().or_else(|| {
            programs
                .iter()
                .find(|(key, _)| id.starts_with(key.as_str()))
                .map(|(_, program)| Rc::clone(program))
        })
    }

    fn run(&self, id: &str, deps: &DepView) -> Result<Exports> {
        let program = self
            .lookup(id)
            .ok_or_else(|| Error::execution(id, "no program for module"))?;
        let tick = self.tick.get() + 1;
        self.tick.set(tick);
        self.executions.borrow_mut().push(id.to_string());
        let exports = program(deps, tick)?;
        self.registry
            .borrow_mut()
            .insert(id.to_string(), exports.clone());
        Ok(exports)
    }
}

impl ScriptEngine for FakeEngine {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn import_module<'a>(
        &'a self,
        artifact: &'a NativeArtifact,
    ) -> LocalBoxFuture<'a, Result<Exports>> {
        Box::pin(async move {
            let deps = match &artifact.source {
                // Inline native artifact: its specifiers are already
                // rewritten to ids this engine has executed and registered.
                Some(source) => {
                    let mut map = HashMap::new();
                    for spec in scan_imports(source) {
                        let registered =
                            self.registry.borrow().get(&spec.specifier).cloned();
                        let Some(exports) = registered else {
                            return Err(Error::execution(
                                artifact.url.as_str(),
                                format!("unresolved native import '{}'", spec.specifier),
                            ));
                        };
                        map.insert(spec.specifier, exports);
                    }
                    DepView { map }
                }
                // URL-only artifact: the native loader fetches and links it
                // (and its nested dependencies) itself.
                None => DepView::empty(),
            };
            self.run(&artifact.url, &deps)
        })
    }

    fn instantiate<'a>(
        &'a self,
        unit: &'a RegisteredUnit,
        bindings: &'a Bindings,
    ) -> LocalBoxFuture<'a, Result<Exports>> {
        Box::pin(async move {
            if !unit.code.trim_start().starts_with("System.register") {
                return Err(Error::execution(
                    unit.path.as_str(),
                    "unit is not in registration form",
                ));
            }
            let mut map = HashMap::new();
            for (specifier, exports) in bindings.iter() {
                map.insert(specifier.to_string(), exports.clone());
            }
            self.run(&unit.path, &DepView { map })
        })
    }
}

/// In-memory delivery network.
#[derive(Default)]
pub struct FakeFetcher {
    sources: RefCell<HashMap<String, String>>,
    fetches: RefCell<Vec<String>>,
}

impl FakeFetcher {
    pub fn insert(&self, url: impl Into<String>, source: impl Into<String>) {
        self.sources.borrow_mut().insert(url.into(), source.into());
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.borrow().len()
    }
}

impl RemoteFetcher for FakeFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<String>> {
        self.fetches.borrow_mut().push(url.to_string());
        let result = self
            .sources
            .borrow()
            .get(url)
            .cloned()
            .ok_or_else(|| Error::not_found(url));
        Box::pin(async move { result })
    }
}

/// Exports with the given named JSON values.
pub fn json_exports(pairs: &[(&str, serde_json::Value)]) -> Exports {
    let mut map = BTreeMap::new();
    for (name, value) in pairs {
        map.insert((*name).to_string(), ExportValue::Json(value.clone()));
    }
    Exports::from_map(map)
}
