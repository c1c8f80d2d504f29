//! Element selectors
//!
//! A [`Selector`] is the structural part of an element declaration: tag name,
//! namespace, id and "selector classes". These are fixed when the element is
//! first created and are what the reuse matcher compares against. Everything
//! else (attributes, mutable classes, styles) is diffed per pass.

use compact_str::CompactString;
use smallvec::SmallVec;

/// XHTML namespace
pub const HTML_NS: &str = "http://www.w3.org/1999/xhtml";

/// SVG namespace
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// MathML namespace
pub const MATHML_NS: &str = "http://www.w3.org/1998/Math/MathML";

/// Selector classes of an element
pub type ClassList = SmallVec<[CompactString; 2]>;

/// Structural identity of a declared element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub(crate) tag: CompactString,
    pub(crate) namespace: Option<CompactString>,
    pub(crate) id: Option<CompactString>,
    pub(crate) classes: ClassList,
}

impl Selector {
    /// Selector for a plain tag in the default namespace.
    pub fn new(tag: impl Into<CompactString>) -> Self {
        Self {
            tag: tag.into(),
            namespace: None,
            id: None,
            classes: SmallVec::new(),
        }
    }

    /// Selector for an SVG element.
    pub fn svg(tag: impl Into<CompactString>) -> Self {
        Self::new(tag).with_namespace(SVG_NS)
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<CompactString>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the element id.
    pub fn with_id(mut self, id: impl Into<CompactString>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a selector class. Duplicates are ignored.
    pub fn with_class(mut self, class: impl Into<CompactString>) -> Self {
        let class = class.into();
        if !self.classes.contains(&class) {
            self.classes.push(class);
        }
        self
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

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(|c| c.as_str())
    }

    /// Whether every class of `self` is present in `stored`.
    pub(crate) fn classes_within(&self, stored: &ClassList) -> bool {
        self.classes.iter().all(|c| stored.contains(c))
    }
}

impl From<&str> for Selector {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<String> for Selector {
    fn from(tag: String) -> Self {
        Self::new(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_builder() {
        let sel = Selector::svg("circle").with_id("dot").with_class("a").with_class("a");

        assert_eq!(sel.tag(), "circle");
        assert_eq!(sel.namespace(), Some(SVG_NS));
        assert_eq!(sel.id(), Some("dot"));
        assert_eq!(sel.classes().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_classes_within() {
        let stored: ClassList = ["btn".into(), "primary".into()].into_iter().collect();

        assert!(Selector::new("a").with_class("btn").classes_within(&stored));
        assert!(Selector::new("a").classes_within(&stored));
        assert!(!Selector::new("a").with_class("ghost").classes_within(&stored));
    }
}
