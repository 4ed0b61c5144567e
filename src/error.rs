//! Error types for the public interface of the crate.
//!
//! Internally we use `anyhow` everywhere (see `Res`). At the public boundary, i.e. the command
//! functions, errors are tagged with an `ErrorType` so that a caller can tell a bad input apart from
//! a failed write without parsing messages.

use crate::auth::AuthError;
use crate::model::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// The result type used inside the crate.
pub(crate) type Res<T> = anyhow::Result<T>;

/// The result type returned by public functions.
pub type Result<T> = std::result::Result<T, Error>;

/// The broad category of an `Error`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Bad user input: a price, a quantity or an item that cannot be accepted.
    Validation,
    /// A local file or the spreadsheet could not be read or written.
    Persistence,
    /// The password for a privileged action was wrong.
    Auth,
    /// The home directory or its configuration file is missing or invalid.
    Config,
    /// A request to the spreadsheet service failed before any data was exchanged.
    Sheet,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// The public error type. It wraps an `anyhow::Error`, which carries the full context chain, and
/// an `ErrorType`.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    pub fn new(error_type: ErrorType, inner: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            inner: inner.into(),
        }
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    /// Tags `inner` by the domain error found in its chain: a `ValidationError` or an `AuthError`.
    /// Anything else gets `fallback`.
    pub(crate) fn classify(inner: anyhow::Error, fallback: ErrorType) -> Self {
        let error_type = if inner.chain().any(|e| e.is::<ValidationError>()) {
            ErrorType::Validation
        } else if inner.chain().any(|e| e.is::<AuthError>()) {
            ErrorType::Auth
        } else {
            fallback
        };
        Self { error_type, inner }
    }

    /// Looks for an error of type `E` anywhere in the context chain.
    pub fn find<E>(&self) -> Option<&E>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.inner.chain().find_map(|e| e.downcast_ref::<E>())
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:?}", self.error_type, self.inner)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:#}", self.error_type, self.inner)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner.as_ref())
    }
}

/// Converts an internal result into a public `Result` tagged with an `ErrorType`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;

    /// Like `pub_result` but lets a `ValidationError` or `AuthError` in the chain decide the type.
    fn classify(self, fallback: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }

    fn classify(self, fallback: ErrorType) -> Result<T> {
        self.map_err(|e| Error::classify(e.into(), fallback))
    }
}
