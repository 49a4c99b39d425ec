#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]

//! In-page, on-demand module runtime.
//!
//! Given a pluggable source host, the runtime resolves module specifiers
//! (relative, absolute, and bare package names), transforms heterogeneous
//! source artifacts, links them into a live dependency graph, executes them
//! against the host scripting environment, and caches the result keyed by
//! canonical path. Bare names resolve through the nearest package manifest
//! to a version-range-qualified delivery-network URL in one of two module
//! formats.

pub mod engine;
mod executor;
pub mod graph;
mod runtime;

pub use engine::{NullEngine, ScriptEngine};
pub use graph::ModuleState;
pub use runtime::{Runtime, RuntimeOptions};

pub use skiff_core::{
    Bindings, Error, ExportValue, Exports, HostAdapter, HostDocument, MemoryDocument, MemoryHost,
    ModuleFormat, NativeArtifact, RegisteredUnit, Result, SourceKind, StyleHandle, CDN_ESM_URL,
    CDN_SYSTEM_URL,
};
