//! Materialized node tree
//!
//! This module provides `Element`, `Node`, `Text`, `Comment` and `DocType`:
//! the in-memory mirror of what has been applied to the host. Every node owns
//! exactly one host handle `H`; dropping a node releases the handle.
//!
//! The tree is only ever mutated by the [`Patcher`](crate::patch::Patcher).
//! Callers read it back through the accessors here.

mod element;
mod text;

pub use element::{Element, Fragment};
pub use text::{Comment, DocType, Text};

use smallvec::SmallVec;

/// Node in a materialized tree
#[derive(Debug)]
pub enum Node<H> {
    Element(Box<Element<H>>),
    Text(Text<H>),
    Comment(Comment<H>),
    DocType(DocType<H>),
}

impl<H> Node<H> {
    // Generates for each variant (element -> Element, etc.):
    //   - is_xxx(&self) -> bool
    //   - as_xxx(&self) -> Option<&Type<H>>
    //   - as_xxx_mut(&mut self) -> Option<&mut Type<H>>
    impl_enum_accessors!(H; element, text, comment, doc_type);

    impl_variant_field_get!(handle, handle, &H, Element, Text, Comment, DocType);

    /// Short kind name, for logs and debugging.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Element(_) => "element",
            Node::Text(_) => "text",
            Node::Comment(_) => "comment",
            Node::DocType(_) => "doctype",
        }
    }
}

/// Type alias for children collection.
pub type Children<H> = SmallVec<[Node<H>; 4]>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::Selector;

    #[test]
    fn test_node_accessors() {
        let mut node: Node<u32> = Node::Text(Text::new(7, "hi"));

        assert!(node.is_text());
        assert!(!node.is_element());
        assert_eq!(node.as_text().map(|t| t.content()), Some("hi"));
        assert!(node.as_text_mut().is_some());
        assert!(node.as_doc_type().is_none());
        assert_eq!(*node.handle(), 7);
        assert_eq!(node.kind_name(), "text");
    }

    #[test]
    fn test_element_handle_through_box() {
        let elem = Element::new(3u32, Selector::new("div"));
        let node = Node::Element(Box::new(elem));

        assert_eq!(*node.handle(), 3);
        assert_eq!(node.as_element().map(|e| e.tag()), Some("div"));
    }
}
