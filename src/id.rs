//! Identity types for the patcher
//!
//! - **TxnId**: one per top-level patch pass. Mutable attributes, classes and
//!   styles are stamped with the pass that last asserted them, so "did this
//!   survive the pass" is a single integer comparison at close time.
//! - **Key**: optional caller-chosen identity of a child among its siblings.
//!   Keys only take part in element matching; they are never sent to the host.

use std::fmt;

use compact_str::{CompactString, ToCompactString};

// =============================================================================
// TxnId
// =============================================================================

/// Transaction id of a patch pass
///
/// Monotonically increasing per [`Patcher`](crate::patch::Patcher). The zero
/// value is reserved for "never asserted" and is older than every real pass.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[must_use]
pub struct TxnId(u64);

impl TxnId {
    /// Stamp older than any pass.
    pub const STALE: Self = Self(0);

    /// Create a TxnId from a raw u64 value.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw u64 representation
    #[inline]
    pub const fn as_raw(&self) -> u64 {
        self.0
    }

    /// The id of the pass following this one.
    #[inline]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Whether an entry stamped with `self` was not asserted during `current`.
    #[inline]
    pub fn is_stale(self, current: TxnId) -> bool {
        self < current
    }
}

impl fmt::Debug for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::STALE {
            write!(f, "TxnId(stale)")
        } else {
            write!(f, "TxnId({})", self.0)
        }
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn#{}", self.0)
    }
}

// =============================================================================
// Key
// =============================================================================

/// Sibling identity of a declared child
///
/// Two elements with the same selector but different keys never match each
/// other, and a keyed declaration never reuses an unkeyed node.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Key(CompactString);

impl Key {
    /// Create a key from anything string-like.
    pub fn new(key: impl Into<CompactString>) -> Self {
        Self(key.into())
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({:?})", self.0.as_str())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        Self(key.into())
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        Self(key.into())
    }
}

macro_rules! impl_key_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Key {
                fn from(key: $ty) -> Self {
                    Self(key.to_compact_string())
                }
            }
        )*
    };
}

impl_key_from_int!(u8, u16, u32, u64, usize, i32, i64);

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txn_ordering() {
        let first = TxnId::STALE.next();
        let second = first.next();

        assert!(TxnId::STALE.is_stale(first));
        assert!(first.is_stale(second));
        assert!(!second.is_stale(second));
        assert_eq!(second.as_raw(), 2);
    }

    #[test]
    fn test_txn_debug() {
        assert_eq!(format!("{:?}", TxnId::STALE), "TxnId(stale)");
        assert_eq!(format!("{}", TxnId::from_raw(3)), "txn#3");
    }

    #[test]
    fn test_key_conversions() {
        assert_eq!(Key::from(42u32), Key::from("42"));
        assert_eq!(Key::from(String::from("row")).as_str(), "row");
        assert_ne!(Key::from(1usize), Key::from(2usize));
    }
}
