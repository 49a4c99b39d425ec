//! Host boundaries: source content, canonicalization, and the page document.
//!
//! The runtime never owns storage. Everything it reads comes through a
//! [`HostAdapter`]; every style element it creates goes through a
//! [`HostDocument`]. Both optional adapter capabilities have defined
//! fallbacks rather than being probed at runtime.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use futures::future::LocalBoxFuture;

use crate::error::{Error, Result};

/// Source provider consumed by the runtime.
///
/// One required method, two optional ones. Implementations may suspend
/// (editor round-trips, network-backed virtual filesystems); plain
/// in-memory hosts just return ready futures.
pub trait HostAdapter {
    /// Raw contents for a host-relative path. Must fail when the resource
    /// does not exist.
    fn file_contents<'a>(&'a self, path: &'a str) -> LocalBoxFuture<'a, Result<String>>;

    /// Canonicalization hook for local paths. Identity when not overridden.
    fn canonical_path<'a>(&'a self, pathname: &'a str) -> LocalBoxFuture<'a, Result<String>> {
        Box::pin(async move { Ok(pathname.to_string()) })
    }

    /// Bare-specifier override. Returning a URL bypasses manifest and
    /// delivery-network resolution for that name; `None` falls through.
    fn bare_dependency_url(&self, _name: &str) -> Option<String> {
        None
    }
}

/// In-memory host adapter: a path → content map.
///
/// The primary host for tests and embedders whose sources already live in
/// memory. Tracks how many content reads were served so callers can assert
/// on cache behavior.
#[derive(Debug, Default)]
pub struct MemoryHost {
    files: RefCell<HashMap<String, String>>,
    overrides: RefCell<HashMap<String, String>>,
    reads: Cell<usize>,
}

impl MemoryHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<String>, contents: impl Into<String>) {
        self.files.borrow_mut().insert(path.into(), contents.into());
    }

    pub fn remove(&self, path: &str) {
        self.files.borrow_mut().remove(path);
    }

    /// Register a bare-dependency override served by this host.
    pub fn override_bare(&self, name: impl Into<String>, url: impl Into<String>) {
        self.overrides.borrow_mut().insert(name.into(), url.into());
    }

    /// Number of `file_contents` calls that returned content.
    #[must_use]
    pub fn read_count(&self) -> usize {
        self.reads.get()
    }
}

impl HostAdapter for MemoryHost {
    fn file_contents<'a>(&'a self, path: &'a str) -> LocalBoxFuture<'a, Result<String>> {
        let result = match self.files.borrow().get(path) {
            Some(contents) => {
                self.reads.set(self.reads.get() + 1);
                Ok(contents.clone())
            }
            None => Err(Error::not_found(path)),
        };
        Box::pin(async move { result })
    }

    fn bare_dependency_url(&self, name: &str) -> Option<String> {
        self.overrides.borrow().get(name).cloned()
    }
}

/// Handle to a style element inserted into the host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyleHandle(usize);

impl StyleHandle {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// The page document, reduced to the one mutation the runtime performs.
pub trait HostDocument {
    /// Insert one live style element containing `css`; returns its handle.
    fn insert_style(&self, css: &str) -> StyleHandle;

    /// Text of a previously inserted style element.
    fn style_text(&self, handle: StyleHandle) -> Option<String>;
}

/// In-memory document used when the embedder supplies none.
#[derive(Debug, Default)]
pub struct MemoryDocument {
    styles: RefCell<Vec<String>>,
}

impl MemoryDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of style elements inserted so far.
    #[must_use]
    pub fn style_count(&self) -> usize {
        self.styles.borrow().len()
    }

    /// Concatenated text of every inserted style element.
    #[must_use]
    pub fn all_styles(&self) -> String {
        self.styles.borrow().join("\n")
    }
}

impl HostDocument for MemoryDocument {
    fn insert_style(&self, css: &str) -> StyleHandle {
        let mut styles = self.styles.borrow_mut();
        styles.push(css.to_string());
        StyleHandle(styles.len() - 1)
    }

    fn style_text(&self, handle: StyleHandle) -> Option<String> {
        self.styles.borrow().get(handle.0).cloned()
    }
}
