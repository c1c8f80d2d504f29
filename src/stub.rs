//! Headless host backend
//!
//! [`StubHost`] keeps a plain arena of nodes, records every primitive it is
//! asked to perform as a [`HostOp`], and renders any subtree to HTML. It is
//! what server-side rendering and the test-suite patch against.
//!
//! Invariants:
//! - Node ids are never reused; removed nodes stay in the arena, detached.
//! - A node has at most one parent; attaching an attached node moves it.
//! - Only elements may have children.

use std::fmt;

use compact_str::CompactString;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{PatchError, PatchResult};
use crate::host::HostAdapter;
use crate::render::{RenderConfig, render_html};

// =============================================================================
// Ids and ops
// =============================================================================

/// Handle of a stub node
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StubId(u32);

impl StubId {
    pub const fn as_raw(self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for StubId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Event callback stored by the stub host
pub type StubListener = Box<dyn Fn()>;

/// A recorded host primitive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOp {
    CreateElement { node: StubId, tag: CompactString },
    CreateText { node: StubId, text: CompactString },
    CreateComment { node: StubId, text: CompactString },
    CreateDocType { node: StubId, name: CompactString },
    SetText { node: StubId, text: CompactString },
    Replace { parent: StubId, new: StubId, old: StubId },
    InsertBefore { parent: StubId, node: StubId, reference: StubId },
    Append { parent: StubId, node: StubId, after: Option<StubId> },
    Remove { parent: StubId, node: StubId },
    AddClass { node: StubId, name: CompactString },
    RemoveClass { node: StubId, name: CompactString },
    SetStyle { node: StubId, name: CompactString, value: CompactString },
    RemoveStyle { node: StubId, name: CompactString },
    SetAttribute { node: StubId, name: CompactString, value: Option<CompactString> },
    RemoveAttribute { node: StubId, name: CompactString },
    Listen { node: StubId, name: CompactString },
}

impl HostOp {
    /// Whether this op changes the shape of the tree (not creation).
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Replace { .. } | Self::InsertBefore { .. } | Self::Append { .. } | Self::Remove { .. }
        )
    }

    /// Whether this op creates a node.
    pub fn is_create(&self) -> bool {
        matches!(
            self,
            Self::CreateElement { .. }
                | Self::CreateText { .. }
                | Self::CreateComment { .. }
                | Self::CreateDocType { .. }
        )
    }
}

// =============================================================================
// Arena
// =============================================================================

/// Payload of a stub node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubKind {
    Element {
        tag: CompactString,
        namespace: Option<CompactString>,
    },
    Text(CompactString),
    Comment(CompactString),
    DocType {
        name: CompactString,
        public_id: Option<CompactString>,
        system_id: Option<CompactString>,
    },
}

#[derive(Debug)]
pub(crate) struct StubNode {
    pub(crate) kind: StubKind,
    pub(crate) parent: Option<StubId>,
    pub(crate) children: Vec<StubId>,
    pub(crate) attrs: Vec<(CompactString, Option<CompactString>)>,
    pub(crate) classes: Vec<CompactString>,
    pub(crate) styles: Vec<(CompactString, CompactString)>,
}

impl StubNode {
    fn new(kind: StubKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            attrs: Vec::new(),
            classes: Vec::new(),
            styles: Vec::new(),
        }
    }

    fn allows_children(&self) -> bool {
        matches!(self.kind, StubKind::Element { .. })
    }
}

/// Headless host tree with an op log
#[derive(Default)]
pub struct StubHost {
    nodes: Vec<StubNode>,
    listeners: FxHashMap<StubId, SmallVec<[(CompactString, StubListener); 1]>>,
    ops: Vec<HostOp>,
}

impl fmt::Debug for StubHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StubHost")
            .field("nodes", &self.nodes.len())
            .field("listeners", &self.listeners.len())
            .field("ops", &self.ops.len())
            .finish()
    }
}

impl StubHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached element without recording it.
    ///
    /// Used for patch roots, which exist before any pass runs.
    pub fn mount(&mut self, tag: &str) -> StubId {
        self.alloc(StubKind::Element {
            tag: tag.into(),
            namespace: None,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Op log
    // ─────────────────────────────────────────────────────────────────────────

    /// Recorded ops since the last [`take_ops`](Self::take_ops).
    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    /// Drain the op log.
    pub fn take_ops(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inspection
    // ─────────────────────────────────────────────────────────────────────────

    pub fn kind(&self, id: StubId) -> Option<&StubKind> {
        self.nodes.get(id.index()).map(|n| &n.kind)
    }

    pub fn parent(&self, id: StubId) -> Option<StubId> {
        self.nodes.get(id.index()).and_then(|n| n.parent)
    }

    pub fn children(&self, id: StubId) -> &[StubId] {
        self.nodes.get(id.index()).map_or(&[], |n| n.children.as_slice())
    }

    /// Payload of a text or comment node.
    pub fn text(&self, id: StubId) -> Option<&str> {
        match self.kind(id)? {
            StubKind::Text(t) | StubKind::Comment(t) => Some(t),
            _ => None,
        }
    }

    /// Attribute value. Boolean attributes yield `Some(None)`.
    pub fn attribute(&self, id: StubId, name: &str) -> Option<Option<&str>> {
        let node = self.nodes.get(id.index())?;
        node.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_deref())
    }

    pub fn has_class(&self, id: StubId, name: &str) -> bool {
        self.nodes
            .get(id.index())
            .is_some_and(|n| n.classes.iter().any(|c| c == name))
    }

    pub fn style(&self, id: StubId, name: &str) -> Option<&str> {
        let node = self.nodes.get(id.index())?;
        node.styles
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Render a node and its subtree.
    pub fn to_html(&self, id: StubId) -> String {
        self.to_html_with(id, &RenderConfig::default())
    }

    pub fn to_html_with(&self, id: StubId, config: &RenderConfig) -> String {
        let mut output = String::new();
        render_html(self, id, config, &mut output);
        output
    }

    /// Render only the children of a node.
    pub fn inner_html(&self, id: StubId) -> String {
        let config = RenderConfig::default();
        let mut output = String::new();
        for &child in self.children(id) {
            render_html(self, child, &config, &mut output);
        }
        output
    }

    /// Invoke every listener registered for `name` on `id`.
    ///
    /// Returns how many listeners ran.
    pub fn dispatch(&self, id: StubId, name: &str) -> usize {
        let Some(listeners) = self.listeners.get(&id) else {
            return 0;
        };
        let mut count = 0;
        for (event, listener) in listeners {
            if event == name {
                listener();
                count += 1;
            }
        }
        count
    }

    pub(crate) fn node(&self, id: StubId) -> Option<&StubNode> {
        self.nodes.get(id.index())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    fn alloc(&mut self, kind: StubKind) -> StubId {
        let id = StubId(self.nodes.len() as u32);
        self.nodes.push(StubNode::new(kind));
        id
    }

    fn get(&self, id: StubId) -> PatchResult<&StubNode> {
        self.nodes
            .get(id.index())
            .ok_or(PatchError::UnknownNode { id: id.0 })
    }

    fn get_mut(&mut self, id: StubId) -> PatchResult<&mut StubNode> {
        self.nodes
            .get_mut(id.index())
            .ok_or(PatchError::UnknownNode { id: id.0 })
    }

    fn container(&self, id: StubId) -> PatchResult<&StubNode> {
        let node = self.get(id)?;
        if !node.allows_children() {
            return Err(PatchError::NotAContainer { id: id.0 });
        }
        Ok(node)
    }

    fn position(&self, parent: StubId, child: StubId) -> PatchResult<usize> {
        self.container(parent)?
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(PatchError::NotAChild {
                parent: parent.0,
                child: child.0,
            })
    }

    /// Detach `node` from wherever it currently is.
    fn detach(&mut self, node: StubId) -> PatchResult<()> {
        if let Some(parent) = self.get_mut(node)?.parent.take() {
            self.get_mut(parent)?.children.retain(|&c| c != node);
        }
        Ok(())
    }

    fn attach_at(&mut self, parent: StubId, node: StubId, index: usize) -> PatchResult<()> {
        if parent == node {
            return Err(PatchError::backend("cannot attach a node to itself"));
        }
        self.get_mut(parent)?.children.insert(index, node);
        self.get_mut(node)?.parent = Some(parent);
        Ok(())
    }

    fn element_mut(&mut self, id: StubId) -> PatchResult<&mut StubNode> {
        let node = self.get_mut(id)?;
        if !node.allows_children() {
            return Err(PatchError::backend(format!("#{} is not an element", id.0)));
        }
        Ok(node)
    }
}

// =============================================================================
// HostAdapter
// =============================================================================

impl HostAdapter for StubHost {
    type Handle = StubId;
    type Listener = StubListener;

    fn create_element(&mut self, tag: &str, namespace: Option<&str>) -> PatchResult<StubId> {
        let node = self.alloc(StubKind::Element {
            tag: tag.into(),
            namespace: namespace.map(Into::into),
        });
        self.ops.push(HostOp::CreateElement { node, tag: tag.into() });
        Ok(node)
    }

    fn create_text(&mut self, text: &str) -> PatchResult<StubId> {
        let node = self.alloc(StubKind::Text(text.into()));
        self.ops.push(HostOp::CreateText { node, text: text.into() });
        Ok(node)
    }

    fn create_comment(&mut self, text: &str) -> PatchResult<StubId> {
        let node = self.alloc(StubKind::Comment(text.into()));
        self.ops.push(HostOp::CreateComment { node, text: text.into() });
        Ok(node)
    }

    fn create_doctype(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> PatchResult<StubId> {
        let node = self.alloc(StubKind::DocType {
            name: name.into(),
            public_id: public_id.map(Into::into),
            system_id: system_id.map(Into::into),
        });
        self.ops.push(HostOp::CreateDocType { node, name: name.into() });
        Ok(node)
    }

    fn set_text(&mut self, node: &StubId, text: &str) -> PatchResult<()> {
        match &mut self.get_mut(*node)?.kind {
            StubKind::Text(t) | StubKind::Comment(t) => *t = text.into(),
            _ => return Err(PatchError::backend(format!("#{} has no text payload", node.0))),
        }
        self.ops.push(HostOp::SetText { node: *node, text: text.into() });
        Ok(())
    }

    fn replace_node(&mut self, parent: &StubId, new: &StubId, old: &StubId) -> PatchResult<()> {
        self.get(*new)?;
        self.position(*parent, *old)?;
        self.detach(*new)?;
        let index = self.position(*parent, *old)?;
        self.get_mut(*parent)?.children[index] = *new;
        self.get_mut(*old)?.parent = None;
        self.get_mut(*new)?.parent = Some(*parent);
        self.ops.push(HostOp::Replace {
            parent: *parent,
            new: *new,
            old: *old,
        });
        Ok(())
    }

    fn insert_before(&mut self, parent: &StubId, node: &StubId, reference: &StubId) -> PatchResult<()> {
        self.get(*node)?;
        self.position(*parent, *reference)?;
        self.detach(*node)?;
        let index = self.position(*parent, *reference)?;
        self.attach_at(*parent, *node, index)?;
        self.ops.push(HostOp::InsertBefore {
            parent: *parent,
            node: *node,
            reference: *reference,
        });
        Ok(())
    }

    fn append_node(&mut self, parent: &StubId, node: &StubId, after: Option<&StubId>) -> PatchResult<()> {
        self.get(*node)?;
        self.container(*parent)?;
        if let Some(after) = after {
            self.position(*parent, *after)?;
        }
        self.detach(*node)?;
        let index = match after {
            Some(after) => self.position(*parent, *after)? + 1,
            None => self.get(*parent)?.children.len(),
        };
        self.attach_at(*parent, *node, index)?;
        self.ops.push(HostOp::Append {
            parent: *parent,
            node: *node,
            after: after.copied(),
        });
        Ok(())
    }

    fn remove_node(&mut self, parent: &StubId, node: &StubId) -> PatchResult<()> {
        self.position(*parent, *node)?;
        self.detach(*node)?;
        self.ops.push(HostOp::Remove {
            parent: *parent,
            node: *node,
        });
        Ok(())
    }

    fn add_class(&mut self, node: &StubId, name: &str) -> PatchResult<()> {
        let elem = self.element_mut(*node)?;
        if !elem.classes.iter().any(|c| c == name) {
            elem.classes.push(name.into());
        }
        self.ops.push(HostOp::AddClass { node: *node, name: name.into() });
        Ok(())
    }

    fn remove_class(&mut self, node: &StubId, name: &str) -> PatchResult<()> {
        self.element_mut(*node)?.classes.retain(|c| c != name);
        self.ops.push(HostOp::RemoveClass { node: *node, name: name.into() });
        Ok(())
    }

    fn set_style(&mut self, node: &StubId, name: &str, value: &str) -> PatchResult<()> {
        let elem = self.element_mut(*node)?;
        match elem.styles.iter_mut().find(|(k, _)| k == name) {
            Some(entry) => entry.1 = value.into(),
            None => elem.styles.push((name.into(), value.into())),
        }
        self.ops.push(HostOp::SetStyle {
            node: *node,
            name: name.into(),
            value: value.into(),
        });
        Ok(())
    }

    fn remove_style(&mut self, node: &StubId, name: &str) -> PatchResult<()> {
        self.element_mut(*node)?.styles.retain(|(k, _)| k != name);
        self.ops.push(HostOp::RemoveStyle { node: *node, name: name.into() });
        Ok(())
    }

    fn set_attribute(&mut self, node: &StubId, name: &str, value: Option<&str>) -> PatchResult<()> {
        let elem = self.element_mut(*node)?;
        let value: Option<CompactString> = value.map(Into::into);
        match elem.attrs.iter_mut().find(|(k, _)| k == name) {
            Some(entry) => entry.1 = value.clone(),
            None => elem.attrs.push((name.into(), value.clone())),
        }
        self.ops.push(HostOp::SetAttribute {
            node: *node,
            name: name.into(),
            value,
        });
        Ok(())
    }

    fn remove_attribute(&mut self, node: &StubId, name: &str) -> PatchResult<()> {
        self.element_mut(*node)?.attrs.retain(|(k, _)| k != name);
        self.ops.push(HostOp::RemoveAttribute { node: *node, name: name.into() });
        Ok(())
    }

    fn add_event_listener(&mut self, node: &StubId, name: &str, listener: StubListener) -> PatchResult<()> {
        self.element_mut(*node)?;
        self.listeners
            .entry(*node)
            .or_default()
            .push((name.into(), listener));
        self.ops.push(HostOp::Listen { node: *node, name: name.into() });
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_append_and_insert_before() {
        let mut host = StubHost::new();
        let root = host.mount("ul");
        let a = host.create_element("li", None).unwrap();
        let b = host.create_element("li", None).unwrap();
        let c = host.create_element("li", None).unwrap();

        host.append_node(&root, &a, None).unwrap();
        host.append_node(&root, &c, Some(&a)).unwrap();
        host.insert_before(&root, &b, &c).unwrap();

        assert_eq!(host.children(root), &[a, b, c]);
        assert_eq!(host.parent(b), Some(root));
    }

    #[test]
    fn test_insert_before_moves_attached_node() {
        let mut host = StubHost::new();
        let root = host.mount("div");
        let a = host.create_text("a").unwrap();
        let b = host.create_text("b").unwrap();
        host.append_node(&root, &a, None).unwrap();
        host.append_node(&root, &b, None).unwrap();

        host.insert_before(&root, &b, &a).unwrap();
        assert_eq!(host.children(root), &[b, a]);

        host.append_node(&root, &b, Some(&a)).unwrap();
        assert_eq!(host.children(root), &[a, b]);
    }

    #[test]
    fn test_replace_and_remove() {
        let mut host = StubHost::new();
        let root = host.mount("div");
        let old = host.create_text("old").unwrap();
        let new = host.create_text("new").unwrap();
        host.append_node(&root, &old, None).unwrap();

        host.replace_node(&root, &new, &old).unwrap();
        assert_eq!(host.children(root), &[new]);
        assert_eq!(host.parent(old), None);

        host.remove_node(&root, &new).unwrap();
        assert!(host.children(root).is_empty());
    }

    #[test]
    fn test_structural_errors() {
        let mut host = StubHost::new();
        let root = host.mount("div");
        let text = host.create_text("t").unwrap();
        let stray = host.create_text("s").unwrap();

        assert!(matches!(
            host.remove_node(&root, &stray),
            Err(PatchError::NotAChild { .. })
        ));
        assert!(matches!(
            host.append_node(&text, &stray, None),
            Err(PatchError::NotAContainer { .. })
        ));
        assert!(matches!(
            host.set_text(&StubId(99), "x"),
            Err(PatchError::UnknownNode { id: 99 })
        ));
    }

    #[test]
    fn test_element_state_and_log() {
        let mut host = StubHost::new();
        let div = host.mount("div");

        host.set_attribute(&div, "title", Some("t")).unwrap();
        host.set_attribute(&div, "hidden", None).unwrap();
        host.add_class(&div, "a").unwrap();
        host.set_style(&div, "color", "red").unwrap();

        assert_eq!(host.attribute(div, "title"), Some(Some("t")));
        assert_eq!(host.attribute(div, "hidden"), Some(None));
        assert!(host.has_class(div, "a"));
        assert_eq!(host.style(div, "color"), Some("red"));
        assert_eq!(host.op_count(), 4);

        host.remove_class(&div, "a").unwrap();
        host.remove_style(&div, "color").unwrap();
        host.remove_attribute(&div, "title").unwrap();
        assert!(!host.has_class(div, "a"));
        assert_eq!(host.style(div, "color"), None);
        assert_eq!(host.attribute(div, "title"), None);

        let ops = host.take_ops();
        assert_eq!(ops.len(), 7);
        assert!(ops.iter().all(|op| !op.is_structural()));
        assert_eq!(host.op_count(), 0);
    }

    #[test]
    fn test_dispatch_runs_matching_listeners() {
        let mut host = StubHost::new();
        let button = host.mount("button");
        let hits = Rc::new(Cell::new(0));

        let counter = Rc::clone(&hits);
        host.add_event_listener(&button, "click", Box::new(move || counter.set(counter.get() + 1)))
            .unwrap();

        assert_eq!(host.dispatch(button, "click"), 1);
        assert_eq!(host.dispatch(button, "input"), 0);
        assert_eq!(hits.get(), 1);
    }
}
