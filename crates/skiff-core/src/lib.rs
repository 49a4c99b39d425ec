#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]

pub mod compile;
pub mod css;
pub mod error;
pub mod host;
pub mod paths;
pub mod pkg;
pub mod rewrite;
pub mod scan;
pub mod transform;
pub mod unit;

pub use compile::{InterpolatingCompiler, PassthroughCompiler, RenderProc, ScriptCompiler, TemplateCompiler};
pub use error::{Error, Result};
pub use host::{HostAdapter, HostDocument, MemoryDocument, MemoryHost, StyleHandle};
pub use pkg::{
    split_bare_specifier, HttpFetcher, ModuleFormat, PackageManifest, RemoteFetcher, CDN_ESM_URL,
    CDN_SYSTEM_URL,
};
pub use scan::{scan_imports, ImportKind, ImportSpec};
pub use transform::{TransformContext, TransformOutput, TransformRegistry, TransformStrategy};
pub use unit::{
    Bindings, ComponentDefinition, ExecutableUnit, ExportValue, Exports, NativeArtifact,
    RegisteredUnit, ScriptUnit, SourceKind, StyleUnit,
};
