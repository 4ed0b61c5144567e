//! The gate in front of catalog edits.
//!
//! `AppState` only knows about the `Authorizer` trait. `SharedSecret` is the one implementation: a
//! single password read from `config.json`, compared as-is. It keeps casual edits out and nothing
//! more.

use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// Decides whether a presented credential unlocks privileged actions.
pub trait Authorizer: Debug + Send + Sync {
    fn authorize(&self, credential: &str) -> Result<(), AuthError>;
}

/// A wrong or missing credential. There is no lockout; the caller may simply try again.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct AuthError;

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Incorrect password")
    }
}

impl Error for AuthError {}

/// One password shared by everyone allowed to edit prices.
#[derive(Clone)]
pub struct SharedSecret {
    secret: String,
}

impl SharedSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl Debug for SharedSecret {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecret").finish_non_exhaustive()
    }
}

impl Authorizer for SharedSecret {
    fn authorize(&self, credential: &str) -> Result<(), AuthError> {
        if !self.secret.is_empty() && credential == self.secret {
            Ok(())
        } else {
            Err(AuthError)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_secret() {
        let secret = SharedSecret::new("bushman");
        assert!(secret.authorize("bushman").is_ok());
        assert_eq!(secret.authorize("Bushman"), Err(AuthError));
        assert_eq!(secret.authorize(""), Err(AuthError));
    }

    #[test]
    fn test_empty_secret_never_authorizes() {
        assert!(SharedSecret::new("").authorize("").is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let s = format!("{:?}", SharedSecret::new("bushman"));
        assert!(!s.contains("bushman"));
    }
}
