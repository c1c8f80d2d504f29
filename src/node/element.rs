//! Element type - materialized host elements
//!
//! The selector part (tag, namespace, id, selector classes, key) is frozen at
//! creation. Attributes, mutable classes and styles carry transaction stamps
//! and are reconciled on every pass.

use compact_str::CompactString;

use crate::attr::{Attrs, Classes, Styles};
use crate::id::Key;
use crate::selector::{ClassList, Selector};

use super::{Children, Node};

// =============================================================================
// Element<H>
// =============================================================================

/// Element node with its host handle and reconciled state
#[derive(Debug)]
pub struct Element<H> {
    pub(crate) handle: H,
    pub(crate) tag: CompactString,
    pub(crate) namespace: Option<CompactString>,
    pub(crate) id: Option<CompactString>,
    /// Classes fixed by the selector at creation (narrowed on reuse)
    pub(crate) selector_classes: ClassList,
    pub(crate) key: Option<Key>,
    pub(crate) attrs: Attrs,
    pub(crate) classes: Classes,
    pub(crate) styles: Styles,
    pub(crate) children: Children<H>,
}

impl<H> Element<H> {
    /// Wrap an existing host element.
    ///
    /// Used for patch roots: the host node already exists and whatever it
    /// contains is not known to the patcher, so the element starts empty.
    pub fn new(handle: H, selector: impl Into<Selector>) -> Self {
        Self::with_key(handle, selector.into(), None)
    }

    pub(crate) fn with_key(handle: H, selector: Selector, key: Option<Key>) -> Self {
        Self {
            handle,
            tag: selector.tag,
            namespace: selector.namespace,
            id: selector.id,
            selector_classes: selector.classes,
            key,
            attrs: Attrs::new(),
            classes: Classes::new(),
            styles: Styles::new(),
            children: Children::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Selector
    // ─────────────────────────────────────────────────────────────────────────

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// Classes frozen by the selector.
    pub fn selector_classes(&self) -> impl Iterator<Item = &str> {
        self.selector_classes.iter().map(|c| c.as_str())
    }

    /// Structural match used by the reuse matcher.
    ///
    /// Namespace, tag and id must be equal, every requested class must be
    /// among the selector classes and keys must be equal (`None == None`).
    pub(crate) fn matches(&self, selector: &Selector, key: Option<&Key>) -> bool {
        self.namespace == selector.namespace
            && self.tag == selector.tag
            && self.id == selector.id
            && self.key.as_ref() == key
            && selector.classes_within(&self.selector_classes)
    }

    /// Narrow the selector classes to those `selector` declares.
    ///
    /// Classes no longer declared are moved into the mutable class list
    /// unstamped, so they are swept from the host at close unless the pass
    /// asserts them with `class_`.
    pub(crate) fn narrow_classes(&mut self, selector: &Selector) {
        if self.selector_classes.len() == selector.classes.len() {
            return;
        }
        let (kept, dropped): (ClassList, ClassList) = self
            .selector_classes
            .drain(..)
            .partition(|c| selector.classes.contains(c));
        self.selector_classes = kept;
        for class in dropped {
            self.classes.adopt(class, ());
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reconciled state
    // ─────────────────────────────────────────────────────────────────────────

    /// Get a mutable attribute value by name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(|v| v.as_str())
    }

    /// Get an inline style value by property name
    pub fn style(&self, name: &str) -> Option<&str> {
        self.styles.get(name).map(|v| v.as_str())
    }

    /// Check for a class, whether from the selector or set mutably
    pub fn has_class(&self, name: &str) -> bool {
        self.selector_classes.iter().any(|c| c == name) || self.classes.contains(name)
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn classes(&self) -> &Classes {
        &self.classes
    }

    pub fn styles(&self) -> &Styles {
        &self.styles
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Children
    // ─────────────────────────────────────────────────────────────────────────

    pub fn children(&self) -> &[Node<H>] {
        &self.children
    }

    /// Check if element has no children
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of direct children (all node types)
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Iterate over child element references
    pub fn children_elements(&self) -> impl Iterator<Item = &Element<H>> {
        self.children.iter().filter_map(|n| n.as_element())
    }

    /// Get text content of this element (concatenated from all text nodes)
    pub fn text_content(&self) -> String {
        let mut result = String::new();
        self.collect_text(&mut result);
        result
    }

    fn collect_text(&self, buf: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => buf.push_str(t.content()),
                Node::Element(e) => e.collect_text(buf),
                Node::Comment(_) | Node::DocType(_) => {}
            }
        }
    }
}

// =============================================================================
// Fragment<H>
// =============================================================================

/// Child list of a host container the patcher does not otherwise manage
///
/// Patching a fragment only reconciles its children. It has no attributes,
/// classes or styles of its own.
#[derive(Debug)]
pub struct Fragment<H> {
    pub(crate) handle: H,
    pub(crate) children: Children<H>,
}

impl<H> Fragment<H> {
    /// Wrap an existing (empty) host container.
    pub fn new(handle: H) -> Self {
        Self {
            handle,
            children: Children::new(),
        }
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn children(&self) -> &[Node<H>] {
        &self.children
    }
}
