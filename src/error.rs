//! Error types for the model tree and the project store.

use thiserror::Error;

/// Boxed error used where a lower layer reports failures of several kinds.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures raised by the project/asset store.
///
/// The store never swallows errors: every failing operation returns one of
/// these variants to its immediate caller.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested project or asset key is absent.
    #[error("{what} not found")]
    NotFound {
        /// Human-readable description of the missing key.
        what: String,
    },
    /// The database could not be opened or upgraded.
    #[error("project store unavailable: {reason}")]
    Unavailable {
        /// Why the store could not be opened.
        reason: String,
        /// Underlying cause, if any.
        #[source]
        source: Option<BoxError>,
    },
    /// A single get/put/delete/scan failed.
    #[error("store operation `{operation}` failed")]
    Transaction {
        /// Name of the failing operation.
        operation: &'static str,
        /// Underlying cause.
        #[source]
        source: BoxError,
    },
    /// The operation succeeded but produced no usable value.
    #[error("malformed {what}: {reason}")]
    Malformed {
        /// What was being read.
        what: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl StoreError {
    /// Returns `true` for [`StoreError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub(crate) fn transaction(
        operation: &'static str,
    ) -> impl FnOnce(rusqlite::Error) -> StoreError {
        move |err| StoreError::Transaction { operation, source: Box::new(err) }
    }

    pub(crate) fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable { reason: reason.into(), source: None }
    }
}

/// Failures raised while editing or decoding the model tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// The name is not a valid identifier for the entity being created.
    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),
    /// A class with this name already exists.
    #[error("name `{0}` already exists")]
    NameExists(String),
    /// A module path did not resolve.
    #[error("module `{0}` not found")]
    ModuleNotFound(String),
    /// A class type did not resolve.
    #[error("class `{0}` not found")]
    ClassNotFound(String),
    /// A persisted stereotype tag is not known.
    #[error("unknown stereotype `{0}`")]
    UnknownStereotype(String),
    /// A persisted platform tag is not known.
    #[error("unknown platform `{0}`")]
    UnknownPlatform(String),
    /// A persisted object does not have the expected shape.
    #[error("cannot decode {entity}: {reason}")]
    Decode {
        /// Entity kind being decoded (e.g. `class`).
        entity: &'static str,
        /// What was wrong.
        reason: String,
    },
}

impl ModelError {
    pub(crate) fn decode(entity: &'static str, reason: impl Into<String>) -> Self {
        Self::Decode { entity, reason: reason.into() }
    }
}
