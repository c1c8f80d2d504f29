//! Transaction-stamped attribute, class and style lists
//!
//! Every mutable entry remembers the [`TxnId`] of the last pass that asserted
//! it. Asserting an entry re-stamps it; at element close the patcher sweeps
//! out everything whose stamp is older than the current pass. No per-pass
//! maps are rebuilt.
//!
//! Lists are small and scanned linearly, keeping insertion order so host
//! operations are issued deterministically.

use compact_str::CompactString;
use smallvec::SmallVec;

use crate::id::TxnId;

/// A named value plus the pass that last asserted it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamped<V> {
    pub name: CompactString,
    pub value: V,
    pub txn: TxnId,
}

/// Outcome of asserting an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assert {
    /// Entry did not exist before
    Added,
    /// Entry existed with a different value
    Changed,
    /// Entry existed with the same value; only the stamp moved
    Unchanged,
}

impl Assert {
    /// Whether the host needs to hear about this assertion.
    #[inline]
    pub fn is_dirty(self) -> bool {
        !matches!(self, Assert::Unchanged)
    }
}

/// Ordered list of stamped entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampedList<V> {
    entries: SmallVec<[Stamped<V>; 4]>,
}

/// Mutable attributes: name -> value
pub type Attrs = StampedList<CompactString>;

/// Mutable classes: presence only
pub type Classes = StampedList<()>;

/// Mutable inline styles: property -> value
pub type Styles = StampedList<CompactString>;

impl<V> Default for StampedList<V> {
    fn default() -> Self {
        Self { entries: SmallVec::new() }
    }
}

impl<V: PartialEq> StampedList<V> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get an entry's value by name.
    pub fn get(&self, name: &str) -> Option<&V> {
        self.entries.iter().find(|e| e.name == name).map(|e| &e.value)
    }

    /// Check if an entry exists.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Stamped<V>> {
        self.entries.iter()
    }

    /// Set `name` to `value` and stamp it with `txn`.
    pub fn assert(&mut self, name: &str, value: V, txn: TxnId) -> Assert {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.txn = txn;
                if entry.value == value {
                    Assert::Unchanged
                } else {
                    entry.value = value;
                    Assert::Changed
                }
            }
            None => {
                self.entries.push(Stamped { name: name.into(), value, txn });
                Assert::Added
            }
        }
    }

    /// Insert an entry that is already applied on the host but not yet
    /// asserted by any pass. It survives only if re-asserted before close.
    pub fn adopt(&mut self, name: impl Into<CompactString>, value: V) {
        let name = name.into();
        if !self.contains(&name) {
            self.entries.push(Stamped { name, value, txn: TxnId::STALE });
        }
    }

    /// Remove and return every entry not asserted during `current`.
    pub fn sweep(&mut self, current: TxnId) -> SmallVec<[Stamped<V>; 4]> {
        if self.entries.iter().all(|e| !e.txn.is_stale(current)) {
            return SmallVec::new();
        }
        let (kept, stale): (SmallVec<[Stamped<V>; 4]>, SmallVec<[Stamped<V>; 4]>) = self
            .entries
            .drain(..)
            .partition(|e| !e.txn.is_stale(current));
        self.entries = kept;
        stale
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(n: u64) -> TxnId {
        TxnId::from_raw(n)
    }

    #[test]
    fn test_assert_reports_changes() {
        let mut attrs = Attrs::new();

        assert_eq!(attrs.assert("title", "a".into(), txn(1)), Assert::Added);
        assert_eq!(attrs.assert("title", "a".into(), txn(2)), Assert::Unchanged);
        assert_eq!(attrs.assert("title", "b".into(), txn(3)), Assert::Changed);

        assert_eq!(attrs.get("title").map(|v| v.as_str()), Some("b"));
        assert_eq!(attrs.len(), 1);
        assert!(!Assert::Unchanged.is_dirty());
    }

    #[test]
    fn test_sweep_removes_only_stale() {
        let mut classes = Classes::new();
        classes.assert("active", (), txn(1));
        classes.assert("hidden", (), txn(1));
        classes.assert("active", (), txn(2));

        let stale = classes.sweep(txn(2));
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].name, "hidden");
        assert!(classes.contains("active"));
        assert!(!classes.contains("hidden"));

        // A second sweep in the same pass is a no-op
        assert!(classes.sweep(txn(2)).is_empty());
    }

    #[test]
    fn test_adopted_entries_are_stale() {
        let mut classes = Classes::new();
        classes.adopt("legacy", ());
        assert!(classes.contains("legacy"));

        let stale = classes.sweep(txn(1));
        assert_eq!(stale.len(), 1);
        assert!(classes.is_empty());
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut styles = Styles::new();
        styles.assert("color", "red".into(), txn(1));
        styles.assert("width", "1px".into(), txn(1));
        styles.assert("color", "blue".into(), txn(1));

        let names: Vec<_> = styles.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["color", "width"]);
    }
}
