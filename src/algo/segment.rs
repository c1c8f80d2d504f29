//! Segment model and reuse matcher
//!
//! A [`Reconciler`] describes one child list during a pass as runs of node
//! slots tagged `Insert`, `Update` or `Remove`. Every run lives in an arena
//! and is linked into up to two lists by index:
//!
//! ```text
//! source list       (pre-patch order)   Remove + Update segments
//! destination list  (post-patch order)  Insert + Update segments
//! ```
//!
//! Initially the whole old child list is one `Remove` segment and the
//! destination list is empty. Each declared child either reuses an old node
//! (splitting it out of its `Remove` run into an `Update` run appended to the
//! destination list) or is inserted as a new node.
//!
//! # Complexity
//!
//! A cursor into the source list remembers where the last match ended, so
//! order-preserving declarations match in amortized O(1) each. Out-of-order
//! reuse falls back to a wrapping scan of the remaining `Remove` runs.

use smallvec::SmallVec;

use crate::node::{Children, Node};

// =============================================================================
// Ids
// =============================================================================

/// Index of a node in the reconciler's slot table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot(u32);

impl Slot {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a segment in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentId(u32);

impl SegmentId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

// =============================================================================
// Segment
// =============================================================================

/// Role of a segment's nodes in this pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentOp {
    /// New nodes, destination list only
    Insert,
    /// Reused nodes, in both lists
    Update,
    /// Old nodes not (yet) reused, source list only
    Remove,
}

/// A maximal run of same-tagged slots
#[derive(Debug, Clone)]
pub struct Segment {
    pub op: SegmentOp,
    pub slots: SmallVec<[Slot; 4]>,
    pub(crate) prev_src: Option<SegmentId>,
    pub(crate) next_src: Option<SegmentId>,
    pub(crate) prev_dst: Option<SegmentId>,
    pub(crate) next_dst: Option<SegmentId>,
}

impl Segment {
    fn new(op: SegmentOp, slots: SmallVec<[Slot; 4]>) -> Self {
        Self {
            op,
            slots,
            prev_src: None,
            next_src: None,
            prev_dst: None,
            next_dst: None,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

// =============================================================================
// Reconciler
// =============================================================================

/// Segment lists of one child list during one pass
#[derive(Debug)]
pub struct Reconciler<H> {
    /// Old children first, then nodes created this pass. `None` once a node
    /// is handed out (open child frame) or released.
    pub(crate) nodes: Vec<Option<Node<H>>>,
    pub(crate) segments: Vec<Segment>,
    pub(crate) src_head: Option<SegmentId>,
    pub(crate) dst_head: Option<SegmentId>,
    pub(crate) dst_tail: Option<SegmentId>,
    /// Where the next reuse scan starts. `None` past the end.
    pub(crate) cursor: Option<SegmentId>,
}

impl<H> Reconciler<H> {
    /// Wrap the previous child list as a single `Remove` segment.
    pub fn new(children: Children<H>) -> Self {
        let nodes: Vec<Option<Node<H>>> = children.into_iter().map(Some).collect();
        let mut reconciler = Self {
            segments: Vec::new(),
            src_head: None,
            dst_head: None,
            dst_tail: None,
            cursor: None,
            nodes,
        };
        if !reconciler.nodes.is_empty() {
            let slots = (0..reconciler.nodes.len() as u32).map(Slot).collect();
            let head = reconciler.alloc(SegmentOp::Remove, slots);
            reconciler.src_head = Some(head);
            reconciler.cursor = Some(head);
        }
        reconciler
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Node access
    // ─────────────────────────────────────────────────────────────────────────

    pub fn node(&self, slot: Slot) -> Option<&Node<H>> {
        self.nodes.get(slot.index()).and_then(Option::as_ref)
    }

    pub fn node_mut(&mut self, slot: Slot) -> Option<&mut Node<H>> {
        self.nodes.get_mut(slot.index()).and_then(Option::as_mut)
    }

    /// Every node still held, old children first, without reconciling.
    pub(crate) fn salvage(self) -> Children<H> {
        self.nodes.into_iter().flatten().collect()
    }

    pub fn segment(&self, id: SegmentId) -> &Segment {
        &self.segments[id.index()]
    }

    /// Segments in source order.
    pub fn source_segments(&self) -> impl Iterator<Item = &Segment> {
        std::iter::successors(self.src_head, |&id| self.segment(id).next_src).map(|id| self.segment(id))
    }

    /// Segments in destination order.
    pub fn destination_segments(&self) -> impl Iterator<Item = &Segment> {
        std::iter::successors(self.dst_head, |&id| self.segment(id).next_dst).map(|id| self.segment(id))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Declaring children
    // ─────────────────────────────────────────────────────────────────────────

    /// Append a newly created node to the destination list.
    pub fn insert(&mut self, node: Node<H>) -> Slot {
        let slot = Slot(self.nodes.len() as u32);
        self.nodes.push(Some(node));
        match self.dst_tail {
            Some(tail) if self.segment(tail).op == SegmentOp::Insert => {
                self.segments[tail.index()].slots.push(slot);
            }
            _ => {
                let seg = self.alloc(SegmentOp::Insert, smallvec::smallvec![slot]);
                self.push_dst(seg);
            }
        }
        slot
    }

    /// Find an old node satisfying `pred` and move it to the destination list.
    ///
    /// With `allow_skip` the scan visits every `Remove` run, starting at the
    /// cursor and wrapping around. Without it only the first not-yet-reused
    /// node at the cursor is tested.
    pub fn reuse(&mut self, mut pred: impl FnMut(&Node<H>) -> bool, allow_skip: bool) -> Option<Slot> {
        let (seg, index) = if allow_skip {
            self.scan(&mut pred)?
        } else {
            self.peek(&mut pred)?
        };
        Some(self.claim(seg, index))
    }

    fn peek(&self, pred: &mut impl FnMut(&Node<H>) -> bool) -> Option<(SegmentId, usize)> {
        let mut cur = self.cursor;
        while let Some(id) = cur {
            let seg = self.segment(id);
            if seg.op == SegmentOp::Remove {
                let node = self.node(seg.slots[0])?;
                return pred(node).then_some((id, 0));
            }
            cur = seg.next_src;
        }
        None
    }

    fn scan(&self, pred: &mut impl FnMut(&Node<H>) -> bool) -> Option<(SegmentId, usize)> {
        let start = self.cursor.or(self.src_head)?;
        let mut cur = Some(start);
        let mut wrapped = false;
        loop {
            let id = match cur {
                Some(id) if wrapped && id == start => return None,
                Some(id) => id,
                None if wrapped || self.cursor.is_none() => return None,
                None => {
                    wrapped = true;
                    match self.src_head {
                        Some(head) if head != start => head,
                        _ => return None,
                    }
                }
            };
            let seg = self.segment(id);
            if seg.op == SegmentOp::Remove {
                let hit = seg
                    .slots
                    .iter()
                    .position(|&slot| self.node(slot).is_some_and(|node| pred(node)));
                if let Some(index) = hit {
                    return Some((id, index));
                }
            }
            cur = seg.next_src;
        }
    }

    /// Move the node at `index` of `Remove` segment `seg` into an `Update`
    /// segment at the tail of the destination list.
    fn claim(&mut self, seg: SegmentId, index: usize) -> Slot {
        // Cheap path: the node directly continues the last reused run
        let continues = self
            .dst_tail
            .filter(|&tail| self.segment(tail).op == SegmentOp::Update && self.segment(tail).next_src == Some(seg));
        if let (0, Some(tail)) = (index, continues) {
            let slot = self.segments[seg.index()].slots.remove(0);
            self.segments[tail.index()].slots.push(slot);
            if self.segment(seg).is_empty() {
                let next = self.segment(seg).next_src;
                self.unlink_src(seg);
                self.cursor = next;
            } else {
                self.cursor = Some(seg);
            }
            return slot;
        }

        let after: SmallVec<[Slot; 4]> = self.segments[seg.index()].slots.drain(index + 1..).collect();
        let slot = self.segments[seg.index()].slots.remove(index);
        let before_empty = self.segment(seg).is_empty();

        let update = match (before_empty, after.is_empty()) {
            // Singleton run: retag in place
            (true, true) => {
                let s = &mut self.segments[seg.index()];
                s.op = SegmentOp::Update;
                s.slots.push(slot);
                self.cursor = s.next_src;
                seg
            }
            // Match at the head: the remainder keeps the old segment
            (true, false) => {
                self.segments[seg.index()].slots = after;
                let update = self.alloc(SegmentOp::Update, smallvec::smallvec![slot]);
                self.link_src_before(update, seg);
                self.cursor = Some(seg);
                update
            }
            (false, _) => {
                let update = self.alloc(SegmentOp::Update, smallvec::smallvec![slot]);
                self.link_src_after(update, seg);
                if after.is_empty() {
                    self.cursor = self.segment(update).next_src;
                } else {
                    let rest = self.alloc(SegmentOp::Remove, after);
                    self.link_src_after(rest, update);
                    self.cursor = Some(rest);
                }
                update
            }
        };
        self.push_dst(update);
        slot
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Arena and list plumbing
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn alloc(&mut self, op: SegmentOp, slots: SmallVec<[Slot; 4]>) -> SegmentId {
        debug_assert!(!slots.is_empty(), "segments are never empty");
        let id = SegmentId(self.segments.len() as u32);
        self.segments.push(Segment::new(op, slots));
        id
    }

    pub(crate) fn seg_mut(&mut self, id: SegmentId) -> &mut Segment {
        &mut self.segments[id.index()]
    }

    fn push_dst(&mut self, id: SegmentId) {
        self.seg_mut(id).prev_dst = self.dst_tail;
        self.seg_mut(id).next_dst = None;
        match self.dst_tail {
            Some(tail) => self.seg_mut(tail).next_dst = Some(id),
            None => self.dst_head = Some(id),
        }
        self.dst_tail = Some(id);
    }

    pub(crate) fn unlink_dst(&mut self, id: SegmentId) {
        let (prev, next) = {
            let seg = self.segment(id);
            (seg.prev_dst, seg.next_dst)
        };
        match prev {
            Some(p) => self.seg_mut(p).next_dst = next,
            None => self.dst_head = next,
        }
        match next {
            Some(n) => self.seg_mut(n).prev_dst = prev,
            None => self.dst_tail = prev,
        }
        let seg = self.seg_mut(id);
        seg.prev_dst = None;
        seg.next_dst = None;
    }

    pub(crate) fn unlink_src(&mut self, id: SegmentId) {
        let (prev, next) = {
            let seg = self.segment(id);
            (seg.prev_src, seg.next_src)
        };
        match prev {
            Some(p) => self.seg_mut(p).next_src = next,
            None => self.src_head = next,
        }
        if let Some(n) = next {
            self.seg_mut(n).prev_src = prev;
        }
        if self.cursor == Some(id) {
            self.cursor = next;
        }
        let seg = self.seg_mut(id);
        seg.prev_src = None;
        seg.next_src = None;
    }

    pub(crate) fn link_src_after(&mut self, id: SegmentId, after: SegmentId) {
        let next = self.segment(after).next_src;
        self.seg_mut(id).prev_src = Some(after);
        self.seg_mut(id).next_src = next;
        self.seg_mut(after).next_src = Some(id);
        if let Some(n) = next {
            self.seg_mut(n).prev_src = Some(id);
        }
    }

    pub(crate) fn link_src_before(&mut self, id: SegmentId, before: SegmentId) {
        let prev = self.segment(before).prev_src;
        self.seg_mut(id).prev_src = prev;
        self.seg_mut(id).next_src = Some(before);
        self.seg_mut(before).prev_src = Some(id);
        match prev {
            Some(p) => self.seg_mut(p).next_src = Some(id),
            None => self.src_head = Some(id),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
