//! Host adapter contract
//!
//! The patcher never touches a real tree itself. It computes what has to
//! change and drives a [`HostAdapter`], which owns the live nodes (a browser
//! DOM, a native widget tree, or the headless [`StubHost`](crate::stub::StubHost)).
//!
//! # Structural primitives
//!
//! ```text
//! replace_node(parent, new, old)      old is detached, new takes its slot
//! insert_before(parent, node, ref)    node placed right before ref
//! append_node(parent, node, after)    node placed right after `after`,
//!                                     or at the end when `after` is None
//! remove_node(parent, node)           node detached from parent
//! ```
//!
//! `insert_before` and `append_node` may be called with a node that is
//! already a child of `parent`: this is a move, exactly like the DOM's
//! `insertBefore`. Hosts must detach the node from its old slot first.

use std::fmt;

use crate::error::PatchResult;

/// Primitive node operations of a host tree
///
/// Every method may fail; failures abort the patch pass and are returned to
/// the caller unchanged.
pub trait HostAdapter {
    /// Opaque reference to a host node. Cloned freely by the patcher.
    type Handle: Clone + fmt::Debug;

    /// Event callback accepted by [`add_event_listener`](Self::add_event_listener).
    type Listener;

    // ─────────────────────────────────────────────────────────────────────────
    // Creation
    // ─────────────────────────────────────────────────────────────────────────

    fn create_element(&mut self, tag: &str, namespace: Option<&str>) -> PatchResult<Self::Handle>;

    fn create_text(&mut self, text: &str) -> PatchResult<Self::Handle>;

    fn create_comment(&mut self, text: &str) -> PatchResult<Self::Handle>;

    fn create_doctype(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> PatchResult<Self::Handle>;

    /// Overwrite the payload of a text or comment node.
    fn set_text(&mut self, node: &Self::Handle, text: &str) -> PatchResult<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Structure
    // ─────────────────────────────────────────────────────────────────────────

    fn replace_node(
        &mut self,
        parent: &Self::Handle,
        new: &Self::Handle,
        old: &Self::Handle,
    ) -> PatchResult<()>;

    fn insert_before(
        &mut self,
        parent: &Self::Handle,
        node: &Self::Handle,
        reference: &Self::Handle,
    ) -> PatchResult<()>;

    fn append_node(
        &mut self,
        parent: &Self::Handle,
        node: &Self::Handle,
        after: Option<&Self::Handle>,
    ) -> PatchResult<()>;

    fn remove_node(&mut self, parent: &Self::Handle, node: &Self::Handle) -> PatchResult<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Element state
    // ─────────────────────────────────────────────────────────────────────────

    fn add_class(&mut self, node: &Self::Handle, name: &str) -> PatchResult<()>;

    fn remove_class(&mut self, node: &Self::Handle, name: &str) -> PatchResult<()>;

    fn set_style(&mut self, node: &Self::Handle, name: &str, value: &str) -> PatchResult<()>;

    fn remove_style(&mut self, node: &Self::Handle, name: &str) -> PatchResult<()>;

    /// Set an attribute. `None` sets a boolean (valueless) attribute.
    fn set_attribute(
        &mut self,
        node: &Self::Handle,
        name: &str,
        value: Option<&str>,
    ) -> PatchResult<()>;

    fn remove_attribute(&mut self, node: &Self::Handle, name: &str) -> PatchResult<()>;

    /// Register an event callback. Non-interactive hosts may ignore it.
    fn add_event_listener(
        &mut self,
        node: &Self::Handle,
        name: &str,
        listener: Self::Listener,
    ) -> PatchResult<()> {
        let _ = (node, name, listener);
        Ok(())
    }
}
