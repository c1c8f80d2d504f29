//! Child list reconciliation.
//!
//! - `segment`: segment lists and the reuse matcher used while children are declared
//! - `merge`: turns the segment lists into a near-minimal host operation sequence

mod merge;
mod segment;

pub use merge::{child_handles, PatchStats};
pub use segment::{Reconciler, Segment, SegmentId, SegmentOp, Slot};
