//! Package manifest (`package.json`) shape.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{Error, Result};

/// The slice of `package.json` the runtime cares about: the declared
/// dependency map consulted for bare-specifier resolution.
///
/// Manifests are not cached separately — they flow through the module graph
/// as ordinary data modules and this type is read back off their exports.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PackageManifest {
    pub name: Option<String>,
    pub version: Option<String>,
    pub dependencies: BTreeMap<String, String>,
}

impl PackageManifest {
    /// Parse manifest source text.
    pub fn parse(path: &str, source: &str) -> Result<Self> {
        serde_json::from_str(source).map_err(|e| Error::compile(path, e.to_string()))
    }

    /// Read a manifest back off a data module's parsed value.
    pub fn from_value(path: &str, value: &serde_json::Value) -> Result<Self> {
        serde_json::from_value(value.clone()).map_err(|e| Error::compile(path, e.to_string()))
    }

    /// Declared range for a dependency name, if any.
    #[must_use]
    pub fn dependency_range(&self, name: &str) -> Option<&str> {
        self.dependencies.get(name).map(String::as_str)
    }
}
