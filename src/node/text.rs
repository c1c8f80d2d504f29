//! Leaf node types
//!
//! Text, comment and doctype nodes. Matching is by exact payload equality.

use compact_str::CompactString;

// =============================================================================
// Text<H>
// =============================================================================

/// Text content node
#[derive(Debug)]
pub struct Text<H> {
    pub(crate) handle: H,
    pub(crate) content: CompactString,
}

impl<H> Text<H> {
    pub(crate) fn new(handle: H, content: impl Into<CompactString>) -> Self {
        Self {
            handle,
            content: content.into(),
        }
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Check if text is only whitespace
    pub fn is_whitespace(&self) -> bool {
        self.content.trim().is_empty()
    }
}

// =============================================================================
// Comment<H>
// =============================================================================

/// Comment node
#[derive(Debug)]
pub struct Comment<H> {
    pub(crate) handle: H,
    pub(crate) content: CompactString,
}

impl<H> Comment<H> {
    pub(crate) fn new(handle: H, content: impl Into<CompactString>) -> Self {
        Self {
            handle,
            content: content.into(),
        }
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

// =============================================================================
// DocType<H>
// =============================================================================

/// Document type declaration
#[derive(Debug)]
pub struct DocType<H> {
    pub(crate) handle: H,
    pub(crate) name: CompactString,
    pub(crate) public_id: Option<CompactString>,
    pub(crate) system_id: Option<CompactString>,
}

impl<H> DocType<H> {
    pub(crate) fn new(
        handle: H,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Self {
        Self {
            handle,
            name: name.into(),
            public_id: public_id.map(Into::into),
            system_id: system_id.map(Into::into),
        }
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn public_id(&self) -> Option<&str> {
        self.public_id.as_deref()
    }

    pub fn system_id(&self) -> Option<&str> {
        self.system_id.as_deref()
    }

    /// Triple equality with a declared doctype.
    pub(crate) fn matches(&self, name: &str, public_id: Option<&str>, system_id: Option<&str>) -> bool {
        self.name == name && self.public_id() == public_id && self.system_id() == system_id
    }
}
