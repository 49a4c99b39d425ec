//! Structured-data transform strategy.

use crate::error::{Error, Result};
use crate::unit::{ExecutableUnit, SourceKind};

use super::{TransformContext, TransformOutput, TransformStrategy};

/// Data files: the parsed value is the module's whole export. No
/// dependencies.
pub struct DataStrategy;

impl TransformStrategy for DataStrategy {
    fn source_kind(&self) -> SourceKind {
        SourceKind::Data
    }

    fn transform(&self, ctx: &TransformContext<'_>) -> Result<TransformOutput> {
        let value: serde_json::Value = serde_json::from_str(ctx.source)
            .map_err(|e| Error::compile(ctx.canonical_path, e.to_string()))?;

        Ok(TransformOutput {
            unit: ExecutableUnit::Data(value),
            dependencies: Vec::new(),
        })
    }
}
