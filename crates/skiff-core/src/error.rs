use thiserror::Error;

/// Result alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the module runtime.
///
/// Variants carry plain data (`Clone`) because a failure is cached on the
/// module record and re-surfaced to every later importer of the same path
/// until the record is invalidated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Host, content, or delivery-network lookup failed.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A transform strategy failed on otherwise-found content.
    #[error("Failed to compile {path}: {detail}")]
    Compile { path: String, detail: String },

    /// The executed unit itself threw or rejected.
    #[error("Failed to execute {path}: {detail}")]
    Execution { path: String, detail: String },

    /// A manifest declares a dependency range that does not parse.
    #[error("Invalid version range '{range}' for '{name}': {detail}")]
    InvalidRange {
        name: String,
        range: String,
        detail: String,
    },

    /// A static import cycle was reached while linking a module.
    #[error("Circular import of {path} via {chain}")]
    CircularImport { path: String, chain: String },

    /// Delivery-network transport failure (not a missing resource).
    #[error("Delivery network error: {0}")]
    Network(String),
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn compile(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Compile {
            path: path.into(),
            detail: detail.into(),
        }
    }

    pub fn execution(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Execution {
            path: path.into(),
            detail: detail.into(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Network(format!("Request timed out: {e}"))
        } else if e.is_connect() {
            Self::Network(format!("Connection failed: {e}"))
        } else {
            Self::Network(e.to_string())
        }
    }
}
