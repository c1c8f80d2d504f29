//! Merge optimizer
//!
//! Turns the segment lists built during a pass into host operations.
//!
//! # Algorithm
//!
//! 1. The heaviest `Update` segment becomes the anchor. Its nodes stay put.
//! 2. The anchor repeatedly absorbs its cheaper destination neighbor:
//!    - `Insert` next to an old `Remove` run on the same side: pair nodes
//!      up as replacements, then insert or remove the surplus
//!    - `Insert` otherwise: insert next to the anchor
//!    - `Update` reachable over `Remove` runs only: remove those runs
//!    - `Update` elsewhere: move its nodes next to the anchor
//! 3. Whatever `Remove` runs are left are removed.
//!
//! Without any `Update` segment the old list is replaced positionally.
//!
//! Every old node is touched at most once (removed, replaced or moved with
//! its segment) and every new node is inserted at most once, so a pass over
//! `|O|` old and `|N|` new children issues at most `|O| + |N|` operations.

use std::cmp::Ordering;

use smallvec::SmallVec;

use crate::error::PatchResult;
use crate::host::HostAdapter;
use crate::node::{Children, Node};

use super::segment::{Reconciler, SegmentId, SegmentOp, Slot};

// =============================================================================
// PatchStats
// =============================================================================

/// Counters of host operations issued by a pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchStats {
    /// Host nodes created
    pub created: usize,
    /// Old nodes swapped for new ones in place
    pub replaced: usize,
    /// New nodes inserted or appended
    pub inserted: usize,
    /// Reused nodes moved among their siblings
    pub moved: usize,
    /// Old nodes removed
    pub removed: usize,
    /// Text or comment payloads rewritten
    pub text_updates: usize,
    /// Attribute, class and style writes (including removals)
    pub attr_updates: usize,
}

impl PatchStats {
    /// Structural operations only (replace, insert, move, remove).
    pub fn structural(&self) -> usize {
        self.replaced + self.inserted + self.moved + self.removed
    }

    /// Whether the pass changed nothing on the host.
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

// =============================================================================
// Merge
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Prev,
    Next,
}

impl<H> Reconciler<H> {
    /// Apply the declared child list of `parent` to the host and return it.
    ///
    /// Nodes removed or replaced are dropped.
    pub fn merge<A>(mut self, host: &mut A, parent: &H, stats: &mut PatchStats) -> PatchResult<Children<H>>
    where
        A: HostAdapter<Handle = H> + ?Sized,
    {
        match self.heaviest_update() {
            Some(anchor) => self.grow(anchor, host, parent, stats)?,
            None => self.replace_wholesale(host, parent, stats)?,
        }
        self.remove_leftovers(host, parent, stats)?;
        Ok(self.into_children())
    }

    fn heaviest_update(&self) -> Option<SegmentId> {
        let mut best: Option<(SegmentId, usize)> = None;
        let mut cur = self.dst_head;
        while let Some(id) = cur {
            let seg = self.segment(id);
            if seg.op == SegmentOp::Update && best.is_none_or(|(_, len)| seg.len() > len) {
                best = Some((id, seg.len()));
            }
            cur = seg.next_dst;
        }
        best.map(|(id, _)| id)
    }

    fn grow<A>(&mut self, anchor: SegmentId, host: &mut A, parent: &H, stats: &mut PatchStats) -> PatchResult<()>
    where
        A: HostAdapter<Handle = H> + ?Sized,
    {
        loop {
            let seg = self.segment(anchor);
            let (neighbor, side) = match (seg.prev_dst, seg.next_dst) {
                (None, None) => return Ok(()),
                (Some(prev), None) => (prev, Side::Prev),
                (None, Some(next)) => (next, Side::Next),
                (Some(prev), Some(next)) => match self.pick_side(anchor, prev, next) {
                    Side::Prev => (prev, Side::Prev),
                    Side::Next => (next, Side::Next),
                },
            };

            match self.segment(neighbor).op {
                SegmentOp::Insert => self.absorb_insert(anchor, neighbor, side, host, parent, stats)?,
                SegmentOp::Update => self.absorb_update(anchor, neighbor, side, host, parent, stats)?,
                SegmentOp::Remove => unreachable!("remove segments never enter the destination list"),
            }

            let slots = std::mem::take(&mut self.seg_mut(neighbor).slots);
            let target = self.seg_mut(anchor);
            match side {
                Side::Prev => target.slots.insert_many(0, slots),
                Side::Next => target.slots.extend(slots),
            }
            self.unlink_dst(neighbor);
        }
    }

    /// Cheaper neighbor first. On a tie, prefer the side with an old run
    /// available for replacement.
    fn pick_side(&self, anchor: SegmentId, prev: SegmentId, next: SegmentId) -> Side {
        let prev_cost = self.absorb_cost(anchor, prev, Side::Prev);
        let next_cost = self.absorb_cost(anchor, next, Side::Next);
        match prev_cost.cmp(&next_cost) {
            Ordering::Less => Side::Prev,
            Ordering::Greater => Side::Next,
            Ordering::Equal => {
                let prev_remove = self.adjoining_remove(anchor, Side::Prev).is_some();
                let next_remove = self.adjoining_remove(anchor, Side::Next).is_some();
                if prev_remove && !next_remove {
                    Side::Prev
                } else {
                    Side::Next
                }
            }
        }
    }

    fn absorb_cost(&self, anchor: SegmentId, neighbor: SegmentId, side: Side) -> usize {
        let seg = self.segment(neighbor);
        match seg.op {
            SegmentOp::Update if self.removes_between(anchor, neighbor, side).is_some() => 0,
            _ => seg.len(),
        }
    }

    /// `Remove` runs separating `anchor` from `neighbor` in source order, in
    /// source order, or `None` when anything else lies between them.
    fn removes_between(&self, anchor: SegmentId, neighbor: SegmentId, side: Side) -> Option<SmallVec<[SegmentId; 2]>> {
        let mut between = SmallVec::new();
        let mut cur = self.src_step(anchor, side);
        while let Some(id) = cur {
            if id == neighbor {
                if side == Side::Prev {
                    between.reverse();
                }
                return Some(between);
            }
            if self.segment(id).op != SegmentOp::Remove {
                return None;
            }
            between.push(id);
            cur = self.src_step(id, side);
        }
        None
    }

    fn src_step(&self, id: SegmentId, side: Side) -> Option<SegmentId> {
        let seg = self.segment(id);
        match side {
            Side::Prev => seg.prev_src,
            Side::Next => seg.next_src,
        }
    }

    fn adjoining_remove(&self, anchor: SegmentId, side: Side) -> Option<SegmentId> {
        self.src_step(anchor, side)
            .filter(|&id| self.segment(id).op == SegmentOp::Remove)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Absorbing neighbors
    // ─────────────────────────────────────────────────────────────────────────

    fn absorb_insert<A>(
        &mut self,
        anchor: SegmentId,
        insert: SegmentId,
        side: Side,
        host: &mut A,
        parent: &H,
        stats: &mut PatchStats,
    ) -> PatchResult<()>
    where
        A: HostAdapter<Handle = H> + ?Sized,
    {
        let new = self.segment(insert).slots.clone();
        let old: SmallVec<[Slot; 4]> = match self.adjoining_remove(anchor, side) {
            Some(run) => {
                let slots = std::mem::take(&mut self.seg_mut(run).slots);
                self.unlink_src(run);
                slots
            }
            None => SmallVec::new(),
        };

        // Pairs line up from the anchor outwards
        let paired = new.len().min(old.len());
        let (new_paired, new_rest, old_paired, old_rest) = match side {
            Side::Next => (&new[..paired], &new[paired..], &old[..paired], &old[paired..]),
            Side::Prev => {
                let (new_rest, new_paired) = new.split_at(new.len() - paired);
                let (old_rest, old_paired) = old.split_at(old.len() - paired);
                (new_paired, new_rest, old_paired, old_rest)
            }
        };
        log::trace!(
            "merge: insert {} node(s) on {:?} side, {} replacing old",
            new.len(),
            side,
            paired
        );

        for (&n, &o) in new_paired.iter().zip(old_paired) {
            host.replace_node(parent, self.handle(n), self.handle(o))?;
            stats.replaced += 1;
        }
        for &o in old_rest {
            host.remove_node(parent, self.handle(o))?;
            stats.removed += 1;
        }

        match side {
            Side::Next => {
                let at_end = self.segment(anchor).next_src.is_none();
                let mut after = new_paired.last().copied().unwrap_or(self.last_slot(anchor));
                for &n in new_rest {
                    let after_handle = if at_end { None } else { Some(self.handle(after)) };
                    host.append_node(parent, self.handle(n), after_handle)?;
                    stats.inserted += 1;
                    after = n;
                }
            }
            Side::Prev => {
                let reference = new_paired.first().copied().unwrap_or(self.first_slot(anchor));
                for &n in new_rest {
                    host.insert_before(parent, self.handle(n), self.handle(reference))?;
                    stats.inserted += 1;
                }
            }
        }

        for o in old {
            self.release(o);
        }
        Ok(())
    }

    fn absorb_update<A>(
        &mut self,
        anchor: SegmentId,
        update: SegmentId,
        side: Side,
        host: &mut A,
        parent: &H,
        stats: &mut PatchStats,
    ) -> PatchResult<()>
    where
        A: HostAdapter<Handle = H> + ?Sized,
    {
        if let Some(between) = self.removes_between(anchor, update, side) {
            log::trace!("merge: joining run across {} removed run(s)", between.len());
            for run in between {
                self.remove_run(run, host, parent, stats)?;
            }
        } else {
            log::trace!(
                "merge: moving {} node(s) to {:?} side",
                self.segment(update).len(),
                side
            );
            match side {
                Side::Next => {
                    let mut after = self.last_slot(anchor);
                    for &slot in &self.segment(update).slots {
                        host.append_node(parent, self.handle(slot), Some(self.handle(after)))?;
                        stats.moved += 1;
                        after = slot;
                    }
                }
                Side::Prev => {
                    let reference = self.first_slot(anchor);
                    for &slot in &self.segment(update).slots {
                        host.insert_before(parent, self.handle(slot), self.handle(reference))?;
                        stats.moved += 1;
                    }
                }
            }
        }
        // Its nodes now sit next to the anchor's, so the anchor stands for both
        self.unlink_src(update);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // No anchor, leftovers
    // ─────────────────────────────────────────────────────────────────────────

    /// Positional replacement when nothing was reused.
    fn replace_wholesale<A>(&mut self, host: &mut A, parent: &H, stats: &mut PatchStats) -> PatchResult<()>
    where
        A: HostAdapter<Handle = H> + ?Sized,
    {
        let mut old: SmallVec<[Slot; 8]> = SmallVec::new();
        while let Some(run) = self.src_head {
            old.extend(std::mem::take(&mut self.seg_mut(run).slots));
            self.unlink_src(run);
        }
        let new: SmallVec<[Slot; 8]> = self
            .destination_segments()
            .flat_map(|seg| seg.slots.iter().copied())
            .collect();
        log::trace!("merge: replacing {} old node(s) with {} new", old.len(), new.len());

        let paired = new.len().min(old.len());
        for (&n, &o) in new[..paired].iter().zip(&old[..paired]) {
            host.replace_node(parent, self.handle(n), self.handle(o))?;
            stats.replaced += 1;
        }
        for &o in &old[paired..] {
            host.remove_node(parent, self.handle(o))?;
            stats.removed += 1;
        }
        for &n in &new[paired..] {
            host.append_node(parent, self.handle(n), None)?;
            stats.inserted += 1;
        }

        for o in old {
            self.release(o);
        }
        Ok(())
    }

    fn remove_leftovers<A>(&mut self, host: &mut A, parent: &H, stats: &mut PatchStats) -> PatchResult<()>
    where
        A: HostAdapter<Handle = H> + ?Sized,
    {
        let runs: SmallVec<[SegmentId; 4]> =
            std::iter::successors(self.src_head, |&id| self.segment(id).next_src)
                .filter(|&id| self.segment(id).op == SegmentOp::Remove)
                .collect();
        for run in runs {
            self.remove_run(run, host, parent, stats)?;
        }
        Ok(())
    }

    fn remove_run<A>(&mut self, run: SegmentId, host: &mut A, parent: &H, stats: &mut PatchStats) -> PatchResult<()>
    where
        A: HostAdapter<Handle = H> + ?Sized,
    {
        let slots = std::mem::take(&mut self.seg_mut(run).slots);
        self.unlink_src(run);
        for &slot in &slots {
            host.remove_node(parent, self.handle(slot))?;
            stats.removed += 1;
        }
        for slot in slots {
            self.release(slot);
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Slots
    // ─────────────────────────────────────────────────────────────────────────

    fn handle(&self, slot: Slot) -> &H {
        match self.node(slot) {
            Some(node) => node.handle(),
            None => unreachable!("slot {slot:?} is checked out during merge"),
        }
    }

    fn first_slot(&self, id: SegmentId) -> Slot {
        self.segment(id).slots[0]
    }

    fn last_slot(&self, id: SegmentId) -> Slot {
        let slots = &self.segment(id).slots;
        slots[slots.len() - 1]
    }

    fn release(&mut self, slot: Slot) {
        self.nodes[slot.index()] = None;
    }

    fn into_children(mut self) -> Children<H> {
        let order: SmallVec<[Slot; 8]> = self
            .destination_segments()
            .flat_map(|seg| seg.slots.iter().copied())
            .collect();
        order
            .into_iter()
            .filter_map(|slot| self.nodes[slot.index()].take())
            .collect::<Children<H>>()
    }
}

/// Handles of a child list, in order.
pub fn child_handles<H: Clone>(children: &[Node<H>]) -> Vec<H> {
    children.iter().map(|node| node.handle().clone()).collect()
}

// =============================================================================
// Tests
// =============================================================================
