//! Incremental patching
//!
//! A [`Patcher`] drives one [`HostAdapter`] through immediate-mode passes:
//! view code re-declares the whole subtree on every pass with
//! `open`/`close`/`text` and friends, and the patcher updates the host with
//! as few primitive operations as it can find.
//!
//! ```ignore
//! let mut patcher = Patcher::new(StubHost::new());
//! let root_handle = patcher.host_mut().mount("body");
//! let mut root = Element::new(root_handle, "body");
//!
//! patcher.patch(&mut root, |p| {
//!     p.open(Selector::new("ul").with_class("items"))?;
//!     for item in &items {
//!         p.key(Some(item.id.into()));
//!         p.open("li")?;
//!         p.attr("title", &item.title)?;
//!         p.text(&item.label)?;
//!         p.close()?;
//!     }
//!     p.close()
//! })?;
//! ```
//!
//! # Call discipline
//!
//! Every `open` needs exactly one matching `close` inside the same pass.
//! Attribute, class, style and listener calls describe the innermost open
//! element and must come before its first text or comment child. Breaking
//! these rules is a bug in the calling code and panics.
//!
//! # Host failures
//!
//! Errors from the host abort the pass and are returned unchanged. The host
//! and the materialized tree are then partially updated; the tree stays
//! memory-safe but no longer describes the host precisely, so callers should
//! rebuild it from a fresh root.

mod frame;

use crate::algo::PatchStats;
use crate::error::PatchResult;
use crate::host::HostAdapter;
use crate::id::{Key, TxnId};
use crate::node::{Comment, DocType, Element, Fragment, Node, Text};
use crate::selector::Selector;

use frame::{Contents, Frame, FrameKind};

// =============================================================================
// PatchConfig
// =============================================================================

/// Tuning knobs of the patcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchConfig {
    /// When a text or comment has no exact match, overwrite the old node of
    /// the same kind at the cursor with `set_text` instead of creating one.
    pub recycle_text: bool,
}

impl PatchConfig {
    /// Reuse leaf nodes aggressively.
    pub const DEFAULT: Self = Self { recycle_text: true };

    /// Only ever reuse exact matches.
    pub const STRICT: Self = Self { recycle_text: false };
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// =============================================================================
// Patcher
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum LeafKind {
    Text,
    Comment,
}

impl LeafKind {
    fn payload<H>(self, node: &Node<H>) -> Option<&str> {
        match (self, node) {
            (LeafKind::Text, Node::Text(t)) => Some(t.content()),
            (LeafKind::Comment, Node::Comment(c)) => Some(c.content()),
            _ => None,
        }
    }
}

/// Immediate-mode patcher over a host tree
pub struct Patcher<A: HostAdapter> {
    host: A,
    txn: TxnId,
    stack: Vec<Frame<A::Handle>>,
    config: PatchConfig,
    stats: PatchStats,
}

impl<A: HostAdapter> Patcher<A> {
    pub fn new(host: A) -> Self {
        Self::with_config(host, PatchConfig::default())
    }

    pub fn with_config(host: A, config: PatchConfig) -> Self {
        Self {
            host,
            txn: TxnId::STALE,
            stack: Vec::new(),
            config,
            stats: PatchStats::default(),
        }
    }

    pub fn host(&self) -> &A {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut A {
        &mut self.host
    }

    pub fn into_host(self) -> A {
        self.host
    }

    pub fn config(&self) -> &PatchConfig {
        &self.config
    }

    /// Id of the current (or last finished) pass.
    pub fn txn(&self) -> TxnId {
        self.txn
    }

    /// Counters of the current (or last finished) pass.
    pub fn stats(&self) -> &PatchStats {
        &self.stats
    }

    /// Whether a pass is running.
    pub fn in_progress(&self) -> bool {
        !self.stack.is_empty()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Passes
    // ─────────────────────────────────────────────────────────────────────────

    /// Run one pass over `root`, whose host node must already exist.
    ///
    /// `build` declares the root's complete content: its mutable state and
    /// children. Anything from the previous pass it does not declare again
    /// is removed from the host.
    ///
    /// # Panics
    ///
    /// When called from inside another pass, or when `build` leaves
    /// elements open.
    pub fn patch<F>(&mut self, root: &mut Element<A::Handle>, build: F) -> PatchResult<PatchStats>
    where
        F: FnOnce(&mut Self) -> PatchResult<()>,
    {
        self.assert_idle();
        let frame = Frame::new(root.handle.clone(), FrameKind::Root, Contents::take(root), None, false);
        let (contents, result) = self.run(frame, build);
        contents.restore(root);
        result
    }

    /// Run one pass over the child list of a host container.
    ///
    /// Same as [`patch`](Self::patch), but the container itself has no
    /// attributes, classes or styles to manage.
    pub fn patch_fragment<F>(&mut self, fragment: &mut Fragment<A::Handle>, build: F) -> PatchResult<PatchStats>
    where
        F: FnOnce(&mut Self) -> PatchResult<()>,
    {
        self.assert_idle();
        let contents = Contents {
            children: std::mem::take(&mut fragment.children),
            ..Contents::default()
        };
        let frame = Frame::new(fragment.handle.clone(), FrameKind::Fragment, contents, None, false);
        let (contents, result) = self.run(frame, build);
        fragment.children = contents.children;
        result
    }

    fn assert_idle(&self) {
        assert!(
            self.stack.is_empty(),
            "patch started while pass {} is still in progress",
            self.txn
        );
    }

    fn run<F>(&mut self, frame: Frame<A::Handle>, build: F) -> (Contents<A::Handle>, PatchResult<PatchStats>)
    where
        F: FnOnce(&mut Self) -> PatchResult<()>,
    {
        self.txn = self.txn.next();
        self.stats = PatchStats::default();
        log::debug!("patch: begin {}", self.txn);
        self.stack.push(frame);

        if let Err(err) = build(self) {
            log::debug!("patch: {} abandoned: {}", self.txn, err);
            return (self.abandon(), Err(err));
        }

        let frame = match self.stack.pop() {
            Some(frame) if self.stack.is_empty() => frame,
            _ => panic!(
                "unbalanced open/close in pass {}: {} element(s) left open",
                self.txn,
                self.stack.len()
            ),
        };
        match self.finish(frame) {
            Ok(contents) => {
                log::debug!("patch: end {} {:?}", self.txn, self.stats);
                (contents, Ok(self.stats))
            }
            Err(err) => {
                log::debug!("patch: {} failed at root: {}", self.txn, err);
                (Contents::default(), Err(err))
            }
        }
    }

    /// Unwind every open frame without reconciling.
    fn abandon(&mut self) -> Contents<A::Handle> {
        let mut root = Contents::default();
        while let Some(frame) = self.stack.pop() {
            let slot = frame.slot;
            let contents = frame.salvage();
            let parent = self.stack.last_mut();
            match (parent, slot) {
                (Some(parent), Some(slot)) => {
                    if let Some(element) = parent.reconciler.node_mut(slot).and_then(Node::as_element_mut) {
                        contents.restore(element);
                    }
                }
                _ => root = contents,
            }
        }
        root
    }

    /// Sweep stale state and reconcile the children of a popped frame.
    fn finish(&mut self, frame: Frame<A::Handle>) -> PatchResult<Contents<A::Handle>> {
        let Frame {
            handle,
            reconciler,
            mut attrs,
            mut classes,
            mut styles,
            ..
        } = frame;

        for stale in attrs.sweep(self.txn) {
            self.host.remove_attribute(&handle, &stale.name)?;
            self.stats.attr_updates += 1;
        }
        for stale in classes.sweep(self.txn) {
            self.host.remove_class(&handle, &stale.name)?;
            self.stats.attr_updates += 1;
        }
        for stale in styles.sweep(self.txn) {
            self.host.remove_style(&handle, &stale.name)?;
            self.stats.attr_updates += 1;
        }

        let children = reconciler.merge(&mut self.host, &handle, &mut self.stats)?;
        Ok(Contents {
            children,
            attrs,
            classes,
            styles,
            ..Contents::default()
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Structure
    // ─────────────────────────────────────────────────────────────────────────

    /// Set or clear the key of the next declared child.
    pub fn key(&mut self, key: Option<Key>) {
        top(&mut self.stack, "key").pending_key = key;
    }

    /// Open an element, keyed by the pending [`key`](Self::key) if any.
    pub fn open(&mut self, selector: impl Into<Selector>) -> PatchResult<()> {
        let key = top(&mut self.stack, "open").pending_key.take();
        self.open_with(selector.into(), key)
    }

    /// Open an element with an explicit key.
    pub fn open_keyed(&mut self, selector: impl Into<Selector>, key: impl Into<Key>) -> PatchResult<()> {
        top(&mut self.stack, "open_keyed").pending_key = None;
        self.open_with(selector.into(), Some(key.into()))
    }

    fn open_with(&mut self, selector: Selector, key: Option<Key>) -> PatchResult<()> {
        let frame = top(&mut self.stack, "open");
        frame.after_leaf = false;
        let reused = frame.reconciler.reuse(
            |node| node.as_element().is_some_and(|e| e.matches(&selector, key.as_ref())),
            true,
        );

        let (slot, fresh) = match reused {
            Some(slot) => {
                if let Some(element) = frame.reconciler.node_mut(slot).and_then(Node::as_element_mut) {
                    element.narrow_classes(&selector);
                }
                (slot, false)
            }
            None => {
                let handle = self.create_element(&selector)?;
                let element = Element::with_key(handle, selector, key);
                let slot = top(&mut self.stack, "open").reconciler.insert(Node::Element(Box::new(element)));
                (slot, true)
            }
        };

        let parent = top(&mut self.stack, "open");
        let Some(element) = parent.reconciler.node_mut(slot).and_then(Node::as_element_mut) else {
            unreachable!("declared element vanished from its parent");
        };
        let handle = element.handle.clone();
        let contents = Contents::take(element);
        self.stack
            .push(Frame::new(handle, FrameKind::Element, contents, Some(slot), fresh));
        Ok(())
    }

    fn create_element(&mut self, selector: &Selector) -> PatchResult<A::Handle> {
        let handle = self.host.create_element(selector.tag(), selector.namespace())?;
        self.stats.created += 1;
        // Selector parts are fixed for the node's lifetime
        if let Some(id) = selector.id() {
            self.host.set_attribute(&handle, "id", Some(id))?;
            self.stats.attr_updates += 1;
        }
        for class in selector.classes() {
            self.host.add_class(&handle, class)?;
            self.stats.attr_updates += 1;
        }
        Ok(handle)
    }

    /// Close the innermost open element and reconcile its content.
    ///
    /// # Panics
    ///
    /// When no element is open.
    pub fn close(&mut self) -> PatchResult<()> {
        let frame = match self.stack.pop() {
            Some(frame) if frame.kind == FrameKind::Element => frame,
            _ => panic!("close() without a matching open()"),
        };
        let slot = frame.slot;
        let contents = self.finish(frame)?;

        let parent = top(&mut self.stack, "close");
        parent.after_leaf = false;
        let element = match slot {
            Some(slot) => parent.reconciler.node_mut(slot).and_then(Node::as_element_mut),
            None => None,
        };
        match element {
            Some(element) => contents.restore(element),
            None => unreachable!("closed element vanished from its parent"),
        }
        Ok(())
    }

    /// Declare a text child. Empty text declares nothing.
    pub fn text(&mut self, content: &str) -> PatchResult<()> {
        if content.is_empty() {
            return Ok(());
        }
        self.leaf(LeafKind::Text, content)
    }

    /// Declare a comment child.
    pub fn comment(&mut self, content: &str) -> PatchResult<()> {
        self.leaf(LeafKind::Comment, content)
    }

    fn leaf(&mut self, kind: LeafKind, content: &str) -> PatchResult<()> {
        let frame = top(&mut self.stack, "text");
        frame.pending_key = None;
        frame.after_leaf = true;

        if frame
            .reconciler
            .reuse(|node| kind.payload(node) == Some(content), false)
            .is_some()
        {
            return Ok(());
        }

        if self.config.recycle_text {
            let recycled = frame.reconciler.reuse(|node| kind.payload(node).is_some(), false);
            if let Some(node) = recycled.and_then(|slot| frame.reconciler.node_mut(slot)) {
                let handle = match node {
                    Node::Text(t) => {
                        t.content = content.into();
                        &t.handle
                    }
                    Node::Comment(c) => {
                        c.content = content.into();
                        &c.handle
                    }
                    Node::Element(_) | Node::DocType(_) => unreachable!("recycled a non-leaf node"),
                };
                self.host.set_text(handle, content)?;
                self.stats.text_updates += 1;
                return Ok(());
            }
        }

        let node = match kind {
            LeafKind::Text => Node::Text(Text::new(self.host.create_text(content)?, content)),
            LeafKind::Comment => Node::Comment(Comment::new(self.host.create_comment(content)?, content)),
        };
        self.stats.created += 1;
        top(&mut self.stack, "text").reconciler.insert(node);
        Ok(())
    }

    /// Declare a doctype child.
    pub fn doctype(&mut self, name: &str, public_id: Option<&str>, system_id: Option<&str>) -> PatchResult<()> {
        let frame = top(&mut self.stack, "doctype");
        frame.pending_key = None;
        frame.after_leaf = true;

        let reused = frame.reconciler.reuse(
            |node| node.as_doc_type().is_some_and(|d| d.matches(name, public_id, system_id)),
            false,
        );
        if reused.is_none() {
            let handle = self.host.create_doctype(name, public_id, system_id)?;
            self.stats.created += 1;
            let node = Node::DocType(DocType::new(handle, name, public_id, system_id));
            top(&mut self.stack, "doctype").reconciler.insert(node);
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Element state
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether the innermost open element was created during this pass.
    pub fn is_freshly_created(&self) -> bool {
        self.stack.last().is_some_and(|frame| frame.fresh)
    }

    /// Assert a mutable attribute. The host is only called on change.
    ///
    /// `id` is ignored when the element's selector sets one.
    pub fn attr(&mut self, name: &str, value: &str) -> PatchResult<()> {
        let txn = self.txn;
        let frame = element_top(&mut self.stack, "attr");
        if frame.owns_attr(name) {
            return Ok(());
        }
        if frame.attrs.assert(name, value.into(), txn).is_dirty() {
            self.host.set_attribute(&frame.handle, name, Some(value))?;
            self.stats.attr_updates += 1;
        }
        Ok(())
    }

    /// Assert a mutable class. Selector classes are ignored.
    pub fn class_(&mut self, name: &str) -> PatchResult<()> {
        let txn = self.txn;
        let frame = element_top(&mut self.stack, "class_");
        if frame.owns_class(name) {
            return Ok(());
        }
        if frame.classes.assert(name, (), txn).is_dirty() {
            self.host.add_class(&frame.handle, name)?;
            self.stats.attr_updates += 1;
        }
        Ok(())
    }

    /// Assert a mutable inline style.
    pub fn style(&mut self, name: &str, value: &str) -> PatchResult<()> {
        let txn = self.txn;
        let frame = element_top(&mut self.stack, "style");
        if frame.styles.assert(name, value.into(), txn).is_dirty() {
            self.host.set_style(&frame.handle, name, value)?;
            self.stats.attr_updates += 1;
        }
        Ok(())
    }

    /// Set an attribute once, when the element is created. `None` sets a
    /// valueless (boolean) attribute.
    pub fn iattr(&mut self, name: &str, value: Option<&str>) -> PatchResult<()> {
        let frame = element_top(&mut self.stack, "iattr");
        if frame.fresh {
            self.host.set_attribute(&frame.handle, name, value)?;
            self.stats.attr_updates += 1;
        }
        Ok(())
    }

    /// Set an inline style once, when the element is created.
    pub fn istyle(&mut self, name: &str, value: &str) -> PatchResult<()> {
        let frame = element_top(&mut self.stack, "istyle");
        if frame.fresh {
            self.host.set_style(&frame.handle, name, value)?;
            self.stats.attr_updates += 1;
        }
        Ok(())
    }

    /// Register an event listener once, when the element is created.
    pub fn on(&mut self, name: &str, listener: A::Listener) -> PatchResult<()> {
        let frame = element_top(&mut self.stack, "on");
        if frame.fresh {
            self.host.add_event_listener(&frame.handle, name, listener)?;
        }
        Ok(())
    }
}

impl<A: HostAdapter + std::fmt::Debug> std::fmt::Debug for Patcher<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Patcher")
            .field("host", &self.host)
            .field("txn", &self.txn)
            .field("depth", &self.stack.len())
            .field("config", &self.config)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Stack access
// ─────────────────────────────────────────────────────────────────────────────

fn top<'a, H>(stack: &'a mut [Frame<H>], call: &str) -> &'a mut Frame<H> {
    match stack.last_mut() {
        Some(frame) => frame,
        None => panic!("{call}() called outside of a patch pass"),
    }
}

/// Innermost frame, which must describe an element that takes state calls.
fn element_top<'a, H>(stack: &'a mut [Frame<H>], call: &str) -> &'a mut Frame<H> {
    let frame = top(stack, call);
    assert!(
        frame.kind != FrameKind::Fragment,
        "{call}() on a fragment, which has no element state"
    );
    assert!(
        !frame.after_leaf,
        "{call}() after a text or comment child; element state must come first"
    );
    frame
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::PatchError;
    use crate::stub::{HostOp, StubHost, StubId};

    fn setup() -> (Patcher<StubHost>, Element<StubId>) {
        let mut patcher = Patcher::new(StubHost::new());
        let handle = patcher.host_mut().mount("body");
        (patcher, Element::new(handle, "body"))
    }

    fn html(patcher: &Patcher<StubHost>, root: &Element<StubId>) -> String {
        patcher.host().inner_html(*root.handle())
    }

    fn list(p: &mut Patcher<StubHost>, keys: &[&str]) -> PatchResult<()> {
        p.open("ul")?;
        for &k in keys {
            p.open_keyed("li", k)?;
            p.text(k)?;
            p.close()?;
        }
        p.close()
    }

    #[test]
    fn test_first_pass_builds_tree() {
        let (mut patcher, mut root) = setup();
        let stats = patcher
            .patch(&mut root, |p| {
                p.open(Selector::new("div").with_id("app").with_class("shell"))?;
                p.attr("title", "hi")?;
                p.text("hello")?;
                p.close()
            })
            .unwrap();

        assert_eq!(html(&patcher, &root), "<div id=\"app\" title=\"hi\" class=\"shell\">hello</div>");
        assert_eq!(stats.created, 2);
        assert_eq!(stats.inserted, 2);
        assert_eq!(root.child_count(), 1);
        let div = root.children_elements().next().unwrap();
        assert_eq!(div.attr("title"), Some("hi"));
        assert_eq!(div.text_content(), "hello");
    }

    #[test]
    fn test_idempotent_second_pass() {
        let (mut patcher, mut root) = setup();
        let view = |p: &mut Patcher<StubHost>| {
            p.doctype("html", None, None)?;
            p.open(Selector::new("main").with_class("a"))?;
            p.attr("lang", "en")?;
            p.class_("dark")?;
            p.style("color", "red")?;
            p.comment("note")?;
            list(p, &["x", "y"])?;
            p.close()
        };

        patcher.patch(&mut root, view).unwrap();
        let before = html(&patcher, &root);
        patcher.host_mut().take_ops();

        let stats = patcher.patch(&mut root, view).unwrap();
        assert!(patcher.host().ops().is_empty());
        assert!(stats.is_noop());
        assert_eq!(html(&patcher, &root), before);
    }

    #[test]
    fn test_text_then_element_appends_in_order() {
        let (mut patcher, mut root) = setup();
        patcher
            .patch(&mut root, |p| {
                p.text("a")?;
                p.open("div")?;
                p.close()
            })
            .unwrap();

        let body = *root.handle();
        let children = patcher.host().children(body).to_vec();
        let structural: Vec<HostOp> = patcher
            .host()
            .ops()
            .iter()
            .filter(|op| op.is_structural())
            .cloned()
            .collect();
        assert_eq!(
            structural,
            vec![
                HostOp::Append { parent: body, node: children[0], after: None },
                HostOp::Append { parent: body, node: children[1], after: None },
            ]
        );
        assert_eq!(html(&patcher, &root), "a<div></div>");
    }

    #[test]
    fn test_keyed_reorder_moves_nodes() {
        let (mut patcher, mut root) = setup();
        patcher.patch(&mut root, |p| list(p, &["a", "b", "c", "d"])).unwrap();
        let ul = *root.children()[0].handle();
        let before = patcher.host().children(ul).to_vec();

        let stats = patcher.patch(&mut root, |p| list(p, &["d", "a", "b", "c"])).unwrap();

        assert_eq!(html(&patcher, &root), "<ul><li>d</li><li>a</li><li>b</li><li>c</li></ul>");
        assert_eq!(stats.moved, 1);
        assert_eq!(stats.created, 0);
        let after = patcher.host().children(ul).to_vec();
        assert_eq!(after, vec![before[3], before[0], before[1], before[2]]);
    }

    #[test]
    fn test_inserts_between_reused_runs() {
        let keys = ["1", "2", "3", "4", "5", "6", "7"];
        let (mut patcher, mut root) = setup();
        patcher.patch(&mut root, |p| list(p, &keys)).unwrap();
        patcher.host_mut().take_ops();

        let stats = patcher
            .patch(&mut root, |p| list(p, &["1", "2", "3", "8", "9", "4", "5", "6", "7"]))
            .unwrap();

        assert_eq!((stats.replaced, stats.removed, stats.moved), (0, 0, 0));
        let ul = *root.children()[0].handle();
        let placed: Vec<&HostOp> = patcher
            .host()
            .ops()
            .iter()
            .filter(|op| matches!(op, HostOp::InsertBefore { parent, .. } if *parent == ul))
            .collect();
        assert_eq!(placed.len(), 2);
        let four = patcher.host().children(ul)[5];
        assert_eq!(patcher.host().text(patcher.host().children(four)[0]), Some("4"));
        for op in placed {
            assert!(matches!(op, HostOp::InsertBefore { reference, .. } if *reference == four));
        }
        assert_eq!(
            patcher.host().inner_html(ul),
            "<li>1</li><li>2</li><li>3</li><li>8</li><li>9</li><li>4</li><li>5</li><li>6</li><li>7</li>"
        );
    }

    #[test]
    fn test_key_precedence() {
        let (mut patcher, mut root) = setup();
        patcher
            .patch(&mut root, |p| {
                p.open("li")?;
                p.close()?;
                p.open_keyed("li", "k")?;
                p.close()
            })
            .unwrap();
        let keyed = *root.children()[1].handle();

        patcher
            .patch(&mut root, |p| {
                p.key(Some(Key::from("k")));
                p.open("li")?;
                p.close()
            })
            .unwrap();

        assert_eq!(root.child_count(), 1);
        assert_eq!(*root.children()[0].handle(), keyed);
        assert_eq!(root.children_elements().next().and_then(|e| e.key()), Some(&Key::from("k")));
    }

    #[test]
    fn test_pending_key_resets_after_child() {
        let (mut patcher, mut root) = setup();
        patcher
            .patch(&mut root, |p| {
                p.key(Some(Key::from(1)));
                p.open("p")?;
                p.close()?;
                p.open("p")?;
                p.close()
            })
            .unwrap();

        let keys: Vec<Option<&Key>> = root.children_elements().map(|e| e.key()).collect();
        assert_eq!(keys, vec![Some(&Key::from(1)), None]);
    }

    #[test]
    fn test_stale_attribute_removed_once_at_close() {
        let (mut patcher, mut root) = setup();
        patcher
            .patch(&mut root, |p| {
                p.open("a")?;
                p.attr("href", "/x")?;
                p.attr("title", "t")?;
                p.close()
            })
            .unwrap();
        let a = *root.children()[0].handle();
        patcher.host_mut().take_ops();

        patcher
            .patch(&mut root, |p| {
                p.open("a")?;
                p.attr("href", "/x")?;
                assert_eq!(p.host().attribute(a, "title"), Some(Some("t")));
                p.close()
            })
            .unwrap();

        assert_eq!(
            patcher.host().ops(),
            &[HostOp::RemoveAttribute { node: a, name: "title".into() }]
        );
        assert_eq!(patcher.host().attribute(a, "title"), None);
        assert_eq!(root.children_elements().next().and_then(|e| e.attr("href")), Some("/x"));

        patcher.host_mut().take_ops();
        patcher
            .patch(&mut root, |p| {
                p.open("a")?;
                p.attr("href", "/x")?;
                p.close()
            })
            .unwrap();
        assert!(patcher.host().ops().is_empty());
    }

    #[test]
    fn test_changed_values_update_host() {
        let (mut patcher, mut root) = setup();
        let view = |value: &'static str| {
            move |p: &mut Patcher<StubHost>| {
                p.open("div")?;
                p.attr("data-v", value)?;
                p.style("width", value)?;
                p.close()
            }
        };
        patcher.patch(&mut root, view("1")).unwrap();
        let stats = patcher.patch(&mut root, view("2")).unwrap();

        let div = *root.children()[0].handle();
        assert_eq!(stats.attr_updates, 2);
        assert_eq!(patcher.host().attribute(div, "data-v"), Some(Some("2")));
        assert_eq!(patcher.host().style(div, "width"), Some("2"));
    }

    #[test]
    fn test_selector_class_rehomed_then_swept() {
        let (mut patcher, mut root) = setup();
        patcher
            .patch(&mut root, |p| {
                p.open(Selector::new("p").with_class("a").with_class("b"))?;
                p.close()
            })
            .unwrap();
        let node = *root.children()[0].handle();

        // Narrower selector keeps the node; "b" survives only when asserted
        patcher
            .patch(&mut root, |p| {
                p.open(Selector::new("p").with_class("a"))?;
                p.class_("b")?;
                p.close()
            })
            .unwrap();
        assert_eq!(*root.children()[0].handle(), node);
        assert!(patcher.host().has_class(node, "b"));

        patcher
            .patch(&mut root, |p| {
                p.open(Selector::new("p").with_class("a"))?;
                p.close()
            })
            .unwrap();
        assert_eq!(*root.children()[0].handle(), node);
        assert!(patcher.host().has_class(node, "a"));
        assert!(!patcher.host().has_class(node, "b"));
    }

    #[test]
    fn test_selector_parts_survive_unasserted_mutable_copies() {
        let (mut patcher, mut root) = setup();
        let sel = || Selector::new("p").with_id("x").with_class("a");
        patcher
            .patch(&mut root, |p| {
                p.open(sel())?;
                p.class_("a")?;
                p.attr("id", "x")?;
                p.close()
            })
            .unwrap();
        let node = *root.children()[0].handle();

        patcher
            .patch(&mut root, |p| {
                p.open(sel())?;
                p.close()
            })
            .unwrap();
        assert_eq!(*root.children()[0].handle(), node);
        assert!(patcher.host().has_class(node, "a"));
        assert_eq!(patcher.host().attribute(node, "id"), Some(Some("x")));
        assert_eq!(patcher.host().to_html(node), r#"<p id="x" class="a"></p>"#);
        let elem = root.children()[0].as_element().unwrap();
        assert!(elem.classes().is_empty());
        assert!(elem.attrs().is_empty());
    }

    #[test]
    fn test_immutable_state_only_when_fresh() {
        let (mut patcher, mut root) = setup();
        let clicks = Rc::new(Cell::new(0));
        let mut fresh_flags = Vec::new();

        for value in ["first", "second"] {
            let clicks = Rc::clone(&clicks);
            patcher
                .patch(&mut root, |p| {
                    p.open("button")?;
                    fresh_flags.push(p.is_freshly_created());
                    p.iattr("type", Some(value))?;
                    p.iattr("disabled", None)?;
                    p.istyle("order", value)?;
                    p.on("click", Box::new(move || clicks.set(clicks.get() + 1)))?;
                    p.close()
                })
                .unwrap();
        }

        let button = *root.children()[0].handle();
        assert_eq!(fresh_flags, vec![true, false]);
        assert_eq!(patcher.host().attribute(button, "type"), Some(Some("first")));
        assert_eq!(patcher.host().attribute(button, "disabled"), Some(None));
        assert_eq!(patcher.host().style(button, "order"), Some("first"));
        assert_eq!(patcher.host().dispatch(button, "click"), 1);
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn test_text_recycling() {
        let (mut patcher, mut root) = setup();
        patcher.patch(&mut root, |p| p.text("old")).unwrap();
        let node = *root.children()[0].handle();
        patcher.host_mut().take_ops();

        let stats = patcher.patch(&mut root, |p| p.text("new")).unwrap();

        assert_eq!(patcher.host().ops(), &[HostOp::SetText { node, text: "new".into() }]);
        assert_eq!(stats.text_updates, 1);
        assert_eq!(root.text_content(), "new");
    }

    #[test]
    fn test_strict_config_replaces_text() {
        let mut patcher = Patcher::with_config(StubHost::new(), PatchConfig::STRICT);
        let mut root = Element::new(patcher.host_mut().mount("p"), "p");
        patcher.patch(&mut root, |p| p.text("old")).unwrap();

        let stats = patcher.patch(&mut root, |p| p.text("new")).unwrap();

        assert_eq!((stats.created, stats.replaced, stats.text_updates), (1, 1, 0));
        assert_eq!(patcher.host().inner_html(*root.handle()), "new");
    }

    #[test]
    fn test_empty_text_is_noop() {
        let (mut patcher, mut root) = setup();
        let stats = patcher
            .patch(&mut root, |p| {
                p.text("")?;
                p.text("x")
            })
            .unwrap();
        assert_eq!(stats.created, 1);
        assert_eq!(root.child_count(), 1);
    }

    #[test]
    fn test_removed_children() {
        let (mut patcher, mut root) = setup();
        patcher.patch(&mut root, |p| list(p, &["a", "b", "c"])).unwrap();
        let stats = patcher.patch(&mut root, |p| list(p, &["b"])).unwrap();

        assert_eq!(stats.removed, 2);
        assert_eq!(html(&patcher, &root), "<ul><li>b</li></ul>");
        let ul = root.children_elements().next().unwrap();
        assert_eq!(ul.child_count(), 1);
    }

    #[test]
    fn test_root_state_is_reconciled() {
        let (mut patcher, mut root) = setup();
        patcher.patch(&mut root, |p| p.class_("loading")).unwrap();
        assert!(patcher.host().has_class(*root.handle(), "loading"));

        patcher.patch(&mut root, |_| Ok(())).unwrap();
        assert!(!patcher.host().has_class(*root.handle(), "loading"));
        assert!(root.classes().is_empty());
    }

    #[test]
    fn test_fragment_patching() {
        let mut patcher = Patcher::new(StubHost::new());
        let mut fragment = Fragment::new(patcher.host_mut().mount("template"));

        patcher
            .patch_fragment(&mut fragment, |p| {
                p.open("b")?;
                p.close()?;
                p.text("tail")
            })
            .unwrap();

        assert_eq!(fragment.children().len(), 2);
        assert_eq!(patcher.host().inner_html(*fragment.handle()), "<b></b>tail");
    }

    #[test]
    fn test_host_error_abandons_pass() {
        let (mut patcher, mut root) = setup();
        patcher.patch(&mut root, |p| list(p, &["a"])).unwrap();

        let err = patcher
            .patch(&mut root, |p| {
                p.open("ul")?;
                Err(PatchError::backend("boom"))
            })
            .unwrap_err();

        assert_eq!(err, PatchError::Backend("boom".into()));
        assert!(!patcher.in_progress());
        // A fresh pass is accepted afterwards
        patcher.patch(&mut root, |_| Ok(())).unwrap();
    }

    #[test]
    fn test_txn_advances_per_pass() {
        let (mut patcher, mut root) = setup();
        assert_eq!(patcher.txn(), TxnId::STALE);
        patcher.patch(&mut root, |_| Ok(())).unwrap();
        patcher.patch(&mut root, |_| Ok(())).unwrap();
        assert_eq!(patcher.txn().as_raw(), 2);
    }

    #[test]
    #[should_panic(expected = "without a matching open")]
    fn test_close_without_open_panics() {
        let (mut patcher, mut root) = setup();
        let _ = patcher.patch(&mut root, |p| p.close());
    }

    #[test]
    #[should_panic(expected = "unbalanced open/close")]
    fn test_unclosed_element_panics() {
        let (mut patcher, mut root) = setup();
        let _ = patcher.patch(&mut root, |p| p.open("div"));
    }

    #[test]
    #[should_panic(expected = "after a text or comment child")]
    fn test_attr_after_text_panics() {
        let (mut patcher, mut root) = setup();
        let _ = patcher.patch(&mut root, |p| {
            p.open("div")?;
            p.text("x")?;
            p.attr("title", "late")
        });
    }

    #[test]
    #[should_panic(expected = "on a fragment")]
    fn test_attr_on_fragment_panics() {
        let mut patcher = Patcher::new(StubHost::new());
        let mut fragment = Fragment::new(patcher.host_mut().mount("template"));
        let _ = patcher.patch_fragment(&mut fragment, |p| p.attr("x", "y"));
    }

    #[test]
    #[should_panic(expected = "still in progress")]
    fn test_reentrant_patch_panics() {
        let (mut patcher, mut root) = setup();
        let mut inner = Element::new(patcher.host_mut().mount("div"), "div");
        let _ = patcher.patch(&mut root, |p| p.patch(&mut inner, |_| Ok(())).map(drop));
    }

    #[test]
    #[should_panic(expected = "outside of a patch pass")]
    fn test_calls_outside_pass_panic() {
        let mut patcher = Patcher::new(StubHost::new());
        let _ = patcher.text("x");
    }
}
