//! Error types for tola-idom.
//!
//! Only host operations can fail. Protocol misuse of the open/close surface
//! is a programmer error and panics instead (see [`crate::patch`]).

use thiserror::Error;

/// Errors raised by a [`HostAdapter`](crate::host::HostAdapter) primitive.
///
/// The patcher never catches or retries these: they abort the current pass
/// and are returned from [`Patcher::patch`](crate::patch::Patcher::patch).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    /// The handle does not refer to a live host node
    #[error("unknown host node #{id}")]
    UnknownNode {
        /// Raw id of the missing node
        id: u32,
    },

    /// A reference node is not a child of the given parent
    #[error("host node #{child} is not a child of #{parent}")]
    NotAChild {
        /// Raw id of the parent
        parent: u32,
        /// Raw id of the supposed child
        child: u32,
    },

    /// Children were attached to a node that cannot hold any
    #[error("host node #{id} cannot contain children")]
    NotAContainer {
        /// Raw id of the leaf node
        id: u32,
    },

    /// Backend specific failure
    #[error("host backend error: {0}")]
    Backend(String),
}

/// Result type alias for patch operations.
pub type PatchResult<T> = Result<T, PatchError>;

impl PatchError {
    /// Create a backend error with a message.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PatchError::UnknownNode { id: 7 };
        assert_eq!(err.to_string(), "unknown host node #7");

        let err = PatchError::NotAChild { parent: 1, child: 4 };
        assert_eq!(err.to_string(), "host node #4 is not a child of #1");

        let err = PatchError::backend("detached document");
        assert_eq!(err.to_string(), "host backend error: detached document");
    }

    #[test]
    fn test_error_is_send_sync() {
        static_assertions::assert_impl_all!(PatchError: Send, Sync, std::error::Error);
    }
}
