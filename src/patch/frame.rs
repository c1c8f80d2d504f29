//! Traversal frames
//!
//! One frame per open element or fragment. A frame takes the element's
//! children and mutable state out of the tree while it is open and hands
//! them back on close, so the frames on the stack never alias each other.

use compact_str::CompactString;

use crate::algo::{Reconciler, Slot};
use crate::attr::{Attrs, Classes, Styles};
use crate::id::Key;
use crate::node::{Children, Element};
use crate::selector::ClassList;

/// What a frame was opened on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameKind {
    /// The element passed to `Patcher::patch`
    Root,
    /// The fragment passed to `Patcher::patch_fragment`
    Fragment,
    /// An element declared with `open`
    Element,
}

/// Everything a frame borrows from its element while open
#[derive(Debug)]
pub(crate) struct Contents<H> {
    pub children: Children<H>,
    pub attrs: Attrs,
    pub classes: Classes,
    pub styles: Styles,
    /// Read-only copy of the selector id, never written back
    pub selector_id: Option<CompactString>,
    /// Read-only copy of the selector classes, never written back
    pub selector_classes: ClassList,
}

impl<H> Default for Contents<H> {
    fn default() -> Self {
        Self {
            children: Children::new(),
            attrs: Attrs::new(),
            classes: Classes::new(),
            styles: Styles::new(),
            selector_id: None,
            selector_classes: ClassList::new(),
        }
    }
}

impl<H> Contents<H> {
    pub fn take(element: &mut Element<H>) -> Self {
        Self {
            children: std::mem::take(&mut element.children),
            attrs: std::mem::take(&mut element.attrs),
            classes: std::mem::take(&mut element.classes),
            styles: std::mem::take(&mut element.styles),
            selector_id: element.id.clone(),
            selector_classes: element.selector_classes.clone(),
        }
    }

    pub fn restore(self, element: &mut Element<H>) {
        element.children = self.children;
        element.attrs = self.attrs;
        element.classes = self.classes;
        element.styles = self.styles;
    }
}

/// Per-level traversal state
#[derive(Debug)]
pub(crate) struct Frame<H> {
    pub handle: H,
    pub kind: FrameKind,
    pub reconciler: Reconciler<H>,
    pub attrs: Attrs,
    pub classes: Classes,
    pub styles: Styles,
    /// Id owned by the selector; `attr("id", ..)` leaves it alone
    pub selector_id: Option<CompactString>,
    /// Classes owned by the selector; `class_` leaves them alone
    pub selector_classes: ClassList,
    /// Position of the element in the parent frame (`None` for the root)
    pub slot: Option<Slot>,
    /// Element was created during this pass
    pub fresh: bool,
    /// Key for the next declared child
    pub pending_key: Option<Key>,
    /// Last call declared a leaf child
    pub after_leaf: bool,
}

impl<H> Frame<H> {
    pub fn new(handle: H, kind: FrameKind, contents: Contents<H>, slot: Option<Slot>, fresh: bool) -> Self {
        Self {
            handle,
            kind,
            reconciler: Reconciler::new(contents.children),
            attrs: contents.attrs,
            classes: contents.classes,
            styles: contents.styles,
            selector_id: contents.selector_id,
            selector_classes: contents.selector_classes,
            slot,
            fresh,
            pending_key: None,
            after_leaf: false,
        }
    }

    /// Contents of an abandoned frame, children in slot order.
    pub fn salvage(self) -> Contents<H> {
        Contents {
            children: self.reconciler.salvage(),
            attrs: self.attrs,
            classes: self.classes,
            styles: self.styles,
            ..Contents::default()
        }
    }

    /// Class is frozen by the element's selector.
    pub fn owns_class(&self, name: &str) -> bool {
        self.selector_classes.iter().any(|c| c == name)
    }

    /// Attribute is managed by the selector (only `id` can be).
    pub fn owns_attr(&self, name: &str) -> bool {
        name == "id" && self.selector_id.is_some()
    }
}
