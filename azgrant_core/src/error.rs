//! Error taxonomy for directory operations.
//!
//! Lookup failures (`NotFound`, `Ambiguous`) and authentication failures
//! abort a run; `RoleNotFound`, `Api`, and `Timeout` are handled per
//! permission so one bad item never blocks the rest of a batch.

use thiserror::Error;

/// Errors produced by directory lookups and mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// A name-based lookup matched zero directory objects.
    #[error("no {kind} found matching '{name}'")]
    NotFound {
        /// The kind of object searched for (e.g. "service principal").
        kind: &'static str,
        /// The identifier that failed to match.
        name: String,
    },

    /// A name-based lookup matched more than one directory object.
    /// Never resolved by silently picking one result.
    #[error("{count} directory objects match '{name}' - use a more specific identifier")]
    Ambiguous {
        /// The identifier that matched multiple objects.
        name: String,
        /// How many objects matched.
        count: usize,
    },

    /// The requested permission does not exist on the target resource as
    /// an application role. Permissions that exist only for delegated
    /// grants land here too.
    #[error("'{permission}' is not an application permission on {resource}")]
    RoleNotFound {
        /// The permission name that failed to resolve.
        permission: String,
        /// The display name of the resource searched.
        resource: String,
    },

    /// The directory backend rejected a call.
    #[error("directory API error ({status} {code}): {message}")]
    Api {
        /// HTTP status, or 0 for transport-level failures.
        status: u16,
        /// The backend's error code.
        code: String,
        /// The backend's error message.
        message: String,
    },

    /// The per-call transport deadline elapsed. Never retried by the
    /// reconciler.
    #[error("directory call timed out")]
    Timeout,

    /// Failed to establish an authenticated session. Fatal before any
    /// directory call is attempted.
    #[error("authentication failed: {0}")]
    Auth(String),
}

impl DirectoryError {
    /// Shorthand for a transport-level failure that is not a timeout.
    pub fn transport(message: String) -> Self {
        DirectoryError::Api {
            status: 0,
            code: "transport".to_owned(),
            message,
        }
    }
}
