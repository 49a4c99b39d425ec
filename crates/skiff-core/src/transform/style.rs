//! Stylesheet transform strategy.

use crate::css;
use crate::error::Result;
use crate::unit::{ExecutableUnit, SourceKind, StyleUnit};

use super::{TransformContext, TransformOutput, TransformStrategy};

/// Stylesheets: preprocessed dialects compile to plain CSS first; executing
/// the unit inserts one live style element and exports the element handle
/// and the final CSS text. No static dependencies.
pub struct StyleStrategy;

impl TransformStrategy for StyleStrategy {
    fn source_kind(&self) -> SourceKind {
        SourceKind::Stylesheet
    }

    fn transform(&self, ctx: &TransformContext<'_>) -> Result<TransformOutput> {
        let css = css::compile_stylesheet(ctx.canonical_path, ctx.source)?;
        Ok(TransformOutput {
            unit: ExecutableUnit::Style(StyleUnit { css }),
            dependencies: Vec::new(),
        })
    }
}
