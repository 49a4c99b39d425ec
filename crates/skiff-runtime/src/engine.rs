//! Host scripting environment boundary.
//!
//! The runtime orchestrates loading and linking; actually running script
//! text is the host environment's job. The two methods mirror the two
//! module-format strategies, and a conforming engine must make them
//! observably equivalent for the same source.

use futures::future::LocalBoxFuture;

use skiff_core::{Bindings, Error, Exports, NativeArtifact, RegisteredUnit, Result};

/// The host scripting environment.
///
/// Identity contract: an artifact executed with inline source is registered
/// by the engine under `artifact.url`, and specifiers inside later artifacts
/// arrive already rewritten to those ids. Artifacts without inline source
/// are fetched by the engine's native loader itself.
pub trait ScriptEngine {
    fn name(&self) -> &'static str;

    /// Direct strategy: execute a natively importable artifact and return
    /// its exports.
    fn import_module<'a>(
        &'a self,
        artifact: &'a NativeArtifact,
    ) -> LocalBoxFuture<'a, Result<Exports>>;

    /// Registration strategy: run a registration-form unit body against its
    /// pre-resolved dependency slot bindings.
    fn instantiate<'a>(
        &'a self,
        unit: &'a RegisteredUnit,
        bindings: &'a Bindings,
    ) -> LocalBoxFuture<'a, Result<Exports>>;
}

/// Fallback engine used when the embedder supplies none.
///
/// Script execution fails with a defined execution error; data, stylesheet,
/// and component template/style modules never reach the engine and keep
/// working.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEngine;

impl ScriptEngine for NullEngine {
    fn name(&self) -> &'static str {
        "null"
    }

    fn import_module<'a>(
        &'a self,
        artifact: &'a NativeArtifact,
    ) -> LocalBoxFuture<'a, Result<Exports>> {
        let err = Error::execution(artifact.url.as_str(), "no script engine configured");
        Box::pin(async move { Err(err) })
    }

    fn instantiate<'a>(
        &'a self,
        unit: &'a RegisteredUnit,
        _bindings: &'a Bindings,
    ) -> LocalBoxFuture<'a, Result<Exports>> {
        let err = Error::execution(unit.path.as_str(), "no script engine configured");
        Box::pin(async move { Err(err) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_engine_fails_scripts() {
        let artifact = NativeArtifact {
            url: "about:blank/app.js".to_string(),
            source: None,
        };
        let err = NullEngine.import_module(&artifact).await.unwrap_err();
        assert!(matches!(err, Error::Execution { .. }));
    }
}
