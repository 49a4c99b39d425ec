//! The runtime facade: `resolve`, `import`, `invalidate`.

use std::collections::BTreeMap;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use tracing::{debug, trace, warn};

use skiff_core::transform::{TransformContext, TransformOutput, TransformStrategy};
use skiff_core::{
    paths, pkg, Bindings, Error, ExecutableUnit, Exports, HostAdapter, HostDocument, HttpFetcher,
    InterpolatingCompiler, MemoryDocument, ModuleFormat, PackageManifest, PassthroughCompiler,
    RemoteFetcher, Result, ScriptCompiler, TemplateCompiler, TransformRegistry,
};

use crate::engine::{NullEngine, ScriptEngine};
use crate::executor::Executor;
use crate::graph::{ModuleGraph, ModuleState, SharedImport};

/// Runtime configuration. The host adapter is the only required field;
/// everything else has a working default.
pub struct RuntimeOptions {
    host: Rc<dyn HostAdapter>,
    engine: Option<Rc<dyn ScriptEngine>>,
    document: Option<Rc<dyn HostDocument>>,
    fetcher: Option<Rc<dyn RemoteFetcher>>,
    script_compiler: Option<Rc<dyn ScriptCompiler>>,
    template_compiler: Option<Rc<dyn TemplateCompiler>>,
    registry: TransformRegistry,
    format: ModuleFormat,
    local_root: String,
}

impl RuntimeOptions {
    pub fn new(host: Rc<dyn HostAdapter>) -> Self {
        Self {
            host,
            engine: None,
            document: None,
            fetcher: None,
            script_compiler: None,
            template_compiler: None,
            registry: TransformRegistry::with_defaults(),
            format: ModuleFormat::default(),
            local_root: paths::LOCAL_ROOT.to_string(),
        }
    }

    /// Module-format strategy for this instance. Fixed at construction.
    #[must_use]
    pub fn with_module_format(mut self, format: ModuleFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_engine(mut self, engine: Rc<dyn ScriptEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    #[must_use]
    pub fn with_document(mut self, document: Rc<dyn HostDocument>) -> Self {
        self.document = Some(document);
        self
    }

    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Rc<dyn RemoteFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    #[must_use]
    pub fn with_script_compiler(mut self, compiler: Rc<dyn ScriptCompiler>) -> Self {
        self.script_compiler = Some(compiler);
        self
    }

    #[must_use]
    pub fn with_template_compiler(mut self, compiler: Rc<dyn TemplateCompiler>) -> Self {
        self.template_compiler = Some(compiler);
        self
    }

    /// Register an additional transform strategy for an extension.
    #[must_use]
    pub fn with_transform(mut self, extension: &str, strategy: Rc<dyn TransformStrategy>) -> Self {
        self.registry.register(extension, strategy);
        self
    }

    /// Override the implicit local root (defaults to `about:blank`).
    #[must_use]
    pub fn with_local_root(mut self, local_root: impl Into<String>) -> Self {
        self.local_root = local_root.into();
        self
    }
}

/// The in-page module runtime.
///
/// Single-threaded and cooperatively scheduled: all suspension happens at
/// host fetches, delivery-network fetches, and engine execution. `Runtime`
/// is deliberately not `Send`.
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

struct RuntimeInner {
    host: Rc<dyn HostAdapter>,
    fetcher: Rc<dyn RemoteFetcher>,
    script_compiler: Rc<dyn ScriptCompiler>,
    template_compiler: Rc<dyn TemplateCompiler>,
    registry: TransformRegistry,
    format: ModuleFormat,
    local_root: String,
    graph: ModuleGraph,
    executor: Executor,
}

impl Runtime {
    /// Build a runtime from options. Fails only when the default
    /// delivery-network client cannot be constructed.
    pub fn new(options: RuntimeOptions) -> Result<Self> {
        let engine: Rc<dyn ScriptEngine> = options.engine.unwrap_or_else(|| Rc::new(NullEngine));
        let document: Rc<dyn HostDocument> = options
            .document
            .unwrap_or_else(|| Rc::new(MemoryDocument::new()));
        let fetcher: Rc<dyn RemoteFetcher> = match options.fetcher {
            Some(fetcher) => fetcher,
            None => Rc::new(HttpFetcher::new()?),
        };

        let executor = Executor {
            engine,
            document,
            format: options.format,
        };

        Ok(Self {
            inner: Rc::new(RuntimeInner {
                host: options.host,
                fetcher,
                script_compiler: options
                    .script_compiler
                    .unwrap_or_else(|| Rc::new(PassthroughCompiler)),
                template_compiler: options
                    .template_compiler
                    .unwrap_or_else(|| Rc::new(InterpolatingCompiler)),
                registry: options.registry,
                format: options.format,
                local_root: options.local_root,
                graph: ModuleGraph::new(),
                executor,
            }),
        })
    }

    /// The module-format strategy this instance was built with.
    #[must_use]
    pub fn module_format(&self) -> ModuleFormat {
        self.inner.format
    }

    /// Lifecycle state of a canonical path, if the graph has a record.
    #[must_use]
    pub fn module_state(&self, canonical_path: &str) -> Option<ModuleState> {
        self.inner.graph.state(canonical_path)
    }

    /// Resolve a specifier to a canonical path (or delivery-network URL for
    /// bare names). Top-level relative specifiers resolve against the
    /// implicit local root.
    pub async fn resolve(&self, specifier: &str) -> Result<String> {
        self.inner
            .clone()
            .resolve_specifier(specifier.to_string(), None, Rc::new(Vec::new()))
            .await
    }

    /// Import a module and return its exports. Concurrent demand for the
    /// same canonical path shares a single in-flight load.
    pub async fn import(&self, specifier: &str) -> Result<Exports> {
        let inner = self.inner.clone();
        let path = inner
            .clone()
            .resolve_specifier(specifier.to_string(), None, Rc::new(Vec::new()))
            .await?;
        inner.import_path(path, Rc::new(Vec::new())).await
    }

    /// Mark the module (and, transitively, everything that depends on it)
    /// stale, so the next `import` performs a fresh load. No-op for paths
    /// the graph has never seen.
    pub async fn invalidate(&self, specifier: &str) -> Result<()> {
        let inner = self.inner.clone();
        let path = inner
            .clone()
            .resolve_specifier(specifier.to_string(), None, Rc::new(Vec::new()))
            .await?;
        let marked = inner.graph.invalidate(&path);
        debug!(path = %path, dependents = marked.len().saturating_sub(1), "invalidated");
        Ok(())
    }
}

impl RuntimeInner {
    /// Resolution: relative/absolute specifiers normalize against the
    /// importer (or the local root); everything else is a bare package name.
    fn resolve_specifier(
        self: Rc<Self>,
        specifier: String,
        importer: Option<String>,
        chain: Rc<Vec<String>>,
    ) -> LocalBoxFuture<'static, Result<String>> {
        Box::pin(async move {
            if paths::is_bare(&specifier) {
                return self.resolve_bare(&specifier, importer.as_deref(), &chain).await;
            }

            let importer = importer.unwrap_or_else(|| self.local_root.clone());
            let joined = paths::join(&importer, &specifier)?;
            if paths::is_remote(&joined) {
                return Ok(joined);
            }
            self.host.canonical_path(&joined).await
        })
    }

    /// Bare-specifier resolution: host override verbatim, else the nearest
    /// manifest's declared range against the format's delivery network.
    async fn resolve_bare(
        self: Rc<Self>,
        specifier: &str,
        importer: Option<&str>,
        chain: &Rc<Vec<String>>,
    ) -> Result<String> {
        let (name, subpath) = pkg::split_bare_specifier(specifier);

        if let Some(url) = self.host.bare_dependency_url(name) {
            debug!(name, url = %url, "bare specifier resolved by host override");
            return Ok(url);
        }

        let manifest = self
            .clone()
            .find_manifest(importer.map(ToString::to_string), chain.clone())
            .await?;
        let range = manifest
            .as_ref()
            .and_then(|manifest| manifest.dependency_range(name))
            .ok_or_else(|| {
                Error::not_found(format!("no manifest declares a dependency on '{name}'"))
            })?;

        let url = pkg::delivery_url(self.format.cdn_base(), name, range)?;
        debug!(name, range, url = %url, "bare specifier resolved via manifest");
        Ok(match subpath {
            Some(subpath) => format!("{url}/{subpath}"),
            None => url,
        })
    }

    /// Locate the nearest `package.json` walking up from the importer's
    /// directory to the local root. Hits are imported through the graph so
    /// the manifest is cached like any other data module; misses are probed
    /// directly against the host and leave no record behind.
    fn find_manifest(
        self: Rc<Self>,
        importer: Option<String>,
        chain: Rc<Vec<String>>,
    ) -> LocalBoxFuture<'static, Result<Option<PackageManifest>>> {
        Box::pin(async move {
            let mut dir = match importer.as_deref().filter(|path| !paths::is_remote(path)) {
                Some(path) => paths::dirname(path).to_string(),
                None => self.local_root.clone(),
            };

            loop {
                let candidate = format!("{dir}/package.json");
                let probe = paths::host_path(&candidate, &self.local_root).to_string();
                if self.host.file_contents(&probe).await.is_ok() {
                    let exports = self
                        .clone()
                        .import_path(candidate.clone(), chain.clone())
                        .await?;
                    let value = exports
                        .default_export()
                        .and_then(skiff_core::ExportValue::as_json)
                        .cloned()
                        .unwrap_or(serde_json::Value::Null);
                    return PackageManifest::from_value(&candidate, &value).map(Some);
                }

                if dir == self.local_root {
                    return Ok(None);
                }
                let parent = paths::dirname(&dir).to_string();
                if parent == dir {
                    return Ok(None);
                }
                dir = parent;
            }
        })
    }

    /// The per-path import pipeline of the module graph: cache check,
    /// in-flight join, or a fresh Loading → Transformed → Executed pass
    /// registered as the shared pending operation.
    fn import_path(
        self: Rc<Self>,
        path: String,
        chain: Rc<Vec<String>>,
    ) -> LocalBoxFuture<'static, Result<Exports>> {
        Box::pin(async move {
            if chain.contains(&path) {
                let chain_text = format!("{} -> {path}", chain.join(" -> "));
                warn!(path = %path, "circular import rejected");
                return Err(Error::CircularImport {
                    path,
                    chain: chain_text,
                });
            }

            if let Some(outcome) = self.graph.cached(&path) {
                trace!(path = %path, "cache hit");
                return outcome;
            }

            if let Some(pending) = self.graph.pending(&path) {
                trace!(path = %path, "joining in-flight load");
                return pending.await;
            }

            debug!(path = %path, "loading");
            let pipeline: LocalBoxFuture<'static, Result<Exports>> = {
                let inner = Rc::clone(&self);
                let path = path.clone();
                Box::pin(async move {
                    let result = inner.clone().run_pipeline(path.clone(), chain).await;
                    inner.graph.settle(&path, &result);
                    result
                })
            };
            let shared: SharedImport = pipeline.shared();
            self.graph.begin_load(&path, shared.clone());
            shared.await
        })
    }

    /// One Loading pass: fetch, transform, resolve and import dependencies,
    /// wire edges, execute. Dependency bodies always execute before this
    /// record's body.
    async fn run_pipeline(
        self: Rc<Self>,
        path: String,
        chain: Rc<Vec<String>>,
    ) -> Result<Exports> {
        let output = self.load_and_transform(&path).await?;
        self.graph.set_transformed(&path, output.unit.source_kind());

        let mut next_chain = (*chain).clone();
        next_chain.push(path.clone());
        let next_chain = Rc::new(next_chain);

        // Dependency specifiers resolve relative to this record.
        let mut resolved = BTreeMap::new();
        for specifier in &output.dependencies {
            let canonical = self
                .clone()
                .resolve_specifier(specifier.clone(), Some(path.clone()), next_chain.clone())
                .await?;
            resolved.insert(specifier.clone(), canonical);
        }

        let resolved_paths: Vec<String> = resolved.values().cloned().collect();
        self.graph.link(&path, &resolved_paths);

        // Fetches may interleave; execution order is still dependencies
        // first because every import completes before this body runs.
        let imports = output.dependencies.iter().map(|specifier| {
            let specifier = specifier.clone();
            let canonical = resolved[&specifier].clone();
            let inner = self.clone();
            let chain = next_chain.clone();
            async move {
                inner
                    .import_path(canonical, chain)
                    .await
                    .map(|exports| (specifier, exports))
            }
        });
        let mut bindings = Bindings::default();
        for (specifier, exports) in futures::future::try_join_all(imports).await? {
            bindings.insert(specifier, exports);
        }

        trace!(path = %path, "executing");
        self.executor.execute(&output.unit, &bindings, &resolved).await
    }

    /// Fetch raw content and run the matching format transform. Remote paths
    /// under the direct strategy skip both — the engine's native loader owns
    /// them end to end.
    async fn load_and_transform(&self, path: &str) -> Result<TransformOutput> {
        if paths::is_remote(path) {
            return match self.format {
                ModuleFormat::Esm => Ok(TransformOutput {
                    unit: ExecutableUnit::Remote(path.to_string()),
                    dependencies: Vec::new(),
                }),
                ModuleFormat::Register => {
                    let source = self.fetcher.fetch(path).await?;
                    self.transform(path, &source)
                }
            };
        }

        let host_rel = paths::host_path(path, &self.local_root).to_string();
        let source = self
            .host
            .file_contents(&host_rel)
            .await
            .map_err(|e| match e {
                Error::NotFound(_) => Error::not_found(path),
                other => other,
            })?;
        self.transform(path, &source)
    }

    fn transform(&self, path: &str, source: &str) -> Result<TransformOutput> {
        let ctx = TransformContext {
            canonical_path: path,
            source,
            script_compiler: self.script_compiler.as_ref(),
            template_compiler: self.template_compiler.as_ref(),
        };
        self.registry.strategy_for(path).transform(&ctx)
    }
}
