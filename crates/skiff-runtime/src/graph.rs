//! Module graph and cache.
//!
//! An arena of module records indexed by canonical path: the runtime's only
//! shared mutable structure. Mutation happens exclusively from the import
//! pipeline under single-threaded cooperative scheduling, so the
//! pending-operation-per-path dedup is the sole synchronization primitive
//! and no locks are needed.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};

use futures::future::{LocalBoxFuture, Shared};
use tracing::trace;

use skiff_core::{Error, Exports, SourceKind};

/// Lifecycle state of a module record.
///
/// On success a record moves Unresolved → Loading → Transformed → Executed,
/// monotonically. Invalidated resets the record to require a fresh Loading
/// pass on next demand; Failed is terminal until invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    Unresolved,
    Loading,
    Transformed,
    Executed,
    Invalidated,
    Failed,
}

/// Shared in-flight pipeline; concurrent demand for a path awaits one of
/// these rather than starting a second load.
pub(crate) type SharedImport = Shared<LocalBoxFuture<'static, Result<Exports, Error>>>;

/// One record per canonical path.
pub(crate) struct ModuleRecord {
    pub state: ModuleState,
    pub kind: Option<SourceKind>,
    pub exports: Option<Exports>,
    pub error: Option<Error>,
    pub dependencies: BTreeSet<String>,
    pub dependents: BTreeSet<String>,
    pub pending: Option<SharedImport>,
    /// Invalidated while a pipeline was in flight. The settled result stands
    /// for current awaiters; the next demand reloads.
    pub stale: bool,
}

impl ModuleRecord {
    fn new() -> Self {
        Self {
            state: ModuleState::Unresolved,
            kind: None,
            exports: None,
            error: None,
            dependencies: BTreeSet::new(),
            dependents: BTreeSet::new(),
            pending: None,
            stale: false,
        }
    }
}

#[derive(Default)]
pub(crate) struct ModuleGraph {
    records: RefCell<HashMap<String, ModuleRecord>>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, path: &str) -> Option<ModuleState> {
        self.records.borrow().get(path).map(|record| record.state)
    }

    pub fn kind(&self, path: &str) -> Option<SourceKind> {
        self.records.borrow().get(path).and_then(|record| record.kind)
    }

    /// Cached outcome for a path, when no fresh pass is required.
    pub fn cached(&self, path: &str) -> Option<Result<Exports, Error>> {
        let records = self.records.borrow();
        let record = records.get(path)?;
        if record.stale {
            return None;
        }
        match record.state {
            ModuleState::Executed => record.exports.clone().map(Ok),
            ModuleState::Failed => record.error.clone().map(Err),
            _ => None,
        }
    }

    pub fn pending(&self, path: &str) -> Option<SharedImport> {
        self.records
            .borrow()
            .get(path)
            .and_then(|record| record.pending.clone())
    }

    /// Begin a fresh Loading pass: create or reset the record, discard
    /// cached exports and outgoing dependency edges (their inverses
    /// included), and register the shared in-flight operation.
    pub fn begin_load(&self, path: &str, pending: SharedImport) {
        let mut records = self.records.borrow_mut();

        let old_deps: Vec<String> = records
            .get(path)
            .map(|record| record.dependencies.iter().cloned().collect())
            .unwrap_or_default();
        for dep in old_deps {
            if let Some(dep_record) = records.get_mut(&dep) {
                dep_record.dependents.remove(path);
            }
        }

        let record = records
            .entry(path.to_string())
            .or_insert_with(ModuleRecord::new);
        record.state = ModuleState::Loading;
        record.kind = None;
        record.exports = None;
        record.error = None;
        record.dependencies.clear();
        record.pending = Some(pending);
        record.stale = false;
    }

    pub fn set_transformed(&self, path: &str, kind: SourceKind) {
        if let Some(record) = self.records.borrow_mut().get_mut(path) {
            record.state = ModuleState::Transformed;
            record.kind = Some(kind);
        }
    }

    /// Wire dependency edges for a freshly transformed record, keeping the
    /// inverse `dependents` edges in step.
    pub fn link(&self, path: &str, dependencies: &[String]) {
        let mut records = self.records.borrow_mut();
        for dep in dependencies {
            records
                .entry(dep.clone())
                .or_insert_with(ModuleRecord::new)
                .dependents
                .insert(path.to_string());
        }
        if let Some(record) = records.get_mut(path) {
            record.dependencies = dependencies.iter().cloned().collect();
        }
    }

    /// Settle the in-flight operation with its final outcome. A record
    /// invalidated mid-flight lands in Invalidated instead so the next
    /// demand performs a fresh pass.
    pub fn settle(&self, path: &str, result: &Result<Exports, Error>) {
        let mut records = self.records.borrow_mut();
        let Some(record) = records.get_mut(path) else {
            return;
        };
        record.pending = None;
        match result {
            Ok(exports) => {
                record.exports = Some(exports.clone());
                record.state = ModuleState::Executed;
            }
            Err(error) => {
                record.error = Some(error.clone());
                record.state = ModuleState::Failed;
            }
        }
        if record.stale {
            record.state = ModuleState::Invalidated;
            record.stale = false;
        }
        trace!(path, state = ?record.state, "module settled");
    }

    /// Mark a record and every transitive dependent Invalidated. Forward
    /// only — dependencies are untouched. Returns the marked paths.
    pub fn invalidate(&self, path: &str) -> Vec<String> {
        let mut records = self.records.borrow_mut();
        if !records.contains_key(path) {
            return Vec::new();
        }

        let mut queue = vec![path.to_string()];
        let mut seen: HashSet<String> = HashSet::new();
        let mut marked = Vec::new();

        while let Some(current) = queue.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(record) = records.get_mut(&current) {
                if record.pending.is_some() {
                    record.stale = true;
                } else {
                    record.state = ModuleState::Invalidated;
                }
                queue.extend(record.dependents.iter().cloned());
                marked.push(current);
            }
        }

        marked
    }

    #[cfg(test)]
    pub fn dependents_of(&self, path: &str) -> Vec<String> {
        self.records
            .borrow()
            .get(path)
            .map(|record| record.dependents.iter().cloned().collect())
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub fn dependencies_of(&self, path: &str) -> Vec<String> {
        self.records
            .borrow()
            .get(path)
            .map(|record| record.dependencies.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn dummy_pending() -> SharedImport {
        let fut: LocalBoxFuture<'static, Result<Exports, Error>> =
            Box::pin(async { Ok(Exports::default()) });
        fut.shared()
    }

    fn loaded(graph: &ModuleGraph, path: &str, deps: &[&str]) {
        graph.begin_load(path, dummy_pending());
        let deps: Vec<String> = deps.iter().map(ToString::to_string).collect();
        graph.link(path, &deps);
        graph.settle(path, &Ok(Exports::default()));
    }

    #[test]
    fn test_edges_are_mutual_inverses() {
        let graph = ModuleGraph::new();
        loaded(&graph, "about:blank/index.js", &["about:blank/dep.js"]);

        assert_eq!(
            graph.dependencies_of("about:blank/index.js"),
            ["about:blank/dep.js"]
        );
        assert_eq!(
            graph.dependents_of("about:blank/dep.js"),
            ["about:blank/index.js"]
        );
    }

    #[test]
    fn test_begin_load_unlinks_old_edges() {
        let graph = ModuleGraph::new();
        loaded(&graph, "about:blank/index.js", &["about:blank/old.js"]);

        graph.begin_load("about:blank/index.js", dummy_pending());
        assert!(graph.dependents_of("about:blank/old.js").is_empty());
        assert!(graph.dependencies_of("about:blank/index.js").is_empty());
    }

    #[test]
    fn test_invalidation_cascades_forward_only() {
        let graph = ModuleGraph::new();
        loaded(&graph, "about:blank/dep.js", &[]);
        loaded(&graph, "about:blank/index.js", &["about:blank/dep.js"]);
        loaded(&graph, "about:blank/other.js", &[]);

        let marked = graph.invalidate("about:blank/dep.js");
        assert_eq!(marked.len(), 2);
        assert_eq!(
            graph.state("about:blank/dep.js"),
            Some(ModuleState::Invalidated)
        );
        assert_eq!(
            graph.state("about:blank/index.js"),
            Some(ModuleState::Invalidated)
        );
        assert_eq!(
            graph.state("about:blank/other.js"),
            Some(ModuleState::Executed)
        );
    }

    #[test]
    fn test_invalidation_does_not_walk_backward() {
        let graph = ModuleGraph::new();
        loaded(&graph, "about:blank/dep.js", &[]);
        loaded(&graph, "about:blank/index.js", &["about:blank/dep.js"]);

        graph.invalidate("about:blank/index.js");
        assert_eq!(
            graph.state("about:blank/dep.js"),
            Some(ModuleState::Executed)
        );
    }

    #[test]
    fn test_invalidate_unknown_path_is_noop() {
        let graph = ModuleGraph::new();
        assert!(graph.invalidate("about:blank/nope.js").is_empty());
    }

    #[test]
    fn test_cached_failure_resurfaces() {
        let graph = ModuleGraph::new();
        graph.begin_load("about:blank/bad.js", dummy_pending());
        graph.settle(
            "about:blank/bad.js",
            &Err(Error::compile("about:blank/bad.js", "boom")),
        );

        let outcome = graph.cached("about:blank/bad.js").unwrap();
        assert!(matches!(outcome, Err(Error::Compile { .. })));
        assert_eq!(graph.state("about:blank/bad.js"), Some(ModuleState::Failed));
    }

    #[test]
    fn test_invalidate_during_flight_marks_stale() {
        let graph = ModuleGraph::new();
        graph.begin_load("about:blank/a.js", dummy_pending());
        graph.invalidate("about:blank/a.js");

        // Still pending; settles into Invalidated so the next demand reloads.
        graph.settle("about:blank/a.js", &Ok(Exports::default()));
        assert_eq!(
            graph.state("about:blank/a.js"),
            Some(ModuleState::Invalidated)
        );
        assert!(graph.cached("about:blank/a.js").is_none());
    }

    #[test]
    fn test_cycle_edges_are_representable() {
        // The graph stores whatever edges the pipeline wires; cycle policy
        // is enforced upstream in the import chain.
        let graph = ModuleGraph::new();
        loaded(&graph, "about:blank/a.js", &["about:blank/b.js"]);
        loaded(&graph, "about:blank/b.js", &["about:blank/a.js"]);

        let marked = graph.invalidate("about:blank/a.js");
        assert_eq!(marked.len(), 2);
    }
}
