//! Bare-specifier and delivery-network resolution.
//!
//! A bare name resolves through the nearest package manifest's declared
//! range to a version-range-qualified delivery URL, `<base>/<name>@<range>`.
//! Which base is used follows the runtime's module-format strategy: the
//! native-import network serves ES modules, the registration network serves
//! `System.register` artifacts.

pub mod fetch;
pub mod manifest;
pub mod range;

pub use fetch::{HttpFetcher, RemoteFetcher};
pub use manifest::PackageManifest;
pub use range::validate_range;

use crate::error::Result;

/// Delivery-network base serving natively importable ES modules.
pub const CDN_ESM_URL: &str = "https://dev.jspm.io";

/// Delivery-network base serving registration-format (`System.register`)
/// artifacts.
pub const CDN_SYSTEM_URL: &str = "https://system-dev.jspm.io";

/// Which executable shape the runtime loads and executes.
///
/// Instance-scoped: every `Runtime` carries its own value, so differently
/// configured runtimes coexist in one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModuleFormat {
    /// Native dynamic-import execution; bare packages come from
    /// [`CDN_ESM_URL`].
    #[default]
    Esm,
    /// Registration-form execution through the in-process loader shim; bare
    /// packages come from [`CDN_SYSTEM_URL`].
    Register,
}

impl ModuleFormat {
    /// The delivery-network base matching this format.
    #[must_use]
    pub fn cdn_base(self) -> &'static str {
        match self {
            Self::Esm => CDN_ESM_URL,
            Self::Register => CDN_SYSTEM_URL,
        }
    }
}

/// Split a bare specifier into package name and optional subpath.
///
/// `lodash` → (`lodash`, None); `lodash/fp` → (`lodash`, Some(`fp`));
/// `@scope/pkg/sub` → (`@scope/pkg`, Some(`sub`)).
#[must_use]
pub fn split_bare_specifier(specifier: &str) -> (&str, Option<&str>) {
    if let Some(rest) = specifier.strip_prefix('@') {
        if let Some(scope_end) = rest.find('/') {
            let name_end = match rest[scope_end + 1..].find('/') {
                Some(i) => 1 + scope_end + 1 + i,
                None => specifier.len(),
            };
            let subpath = (name_end < specifier.len()).then(|| &specifier[name_end + 1..]);
            return (&specifier[..name_end], subpath);
        }
        return (specifier, None);
    }

    match specifier.find('/') {
        Some(i) => (&specifier[..i], Some(&specifier[i + 1..])),
        None => (specifier, None),
    }
}

/// Build the delivery URL for a package name and declared range.
///
/// The range is validated before it is baked into the URL so an unusable
/// manifest entry fails here rather than as an opaque network 404.
pub fn delivery_url(base: &str, name: &str, range: &str) -> Result<String> {
    validate_range(name, range)?;
    Ok(format!("{base}/{name}@{range}"))
}
