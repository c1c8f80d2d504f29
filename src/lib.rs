//! tola-idom - Incremental DOM patching over pluggable host trees
//!
//! ## Core Concepts
//!
//! **Immediate mode**: view code re-declares its whole subtree on every pass
//! through `open`/`close`/`text` calls. There is no intermediate virtual tree:
//! the [`Patcher`] matches each declaration against what the previous pass
//! materialized and updates the host in place.
//!
//! **Segments**: while a child list is declared, old and new children are
//! grouped into `Insert`/`Update`/`Remove` runs. On close the merge optimizer
//! turns them into at most `|old| + |new|` host operations.
//!
//! **Transactions**: every pass has a [`TxnId`]. Attributes, classes and
//! styles remember the pass that last asserted them and are removed from the
//! host once a pass closes their element without asserting them again.
//!
//! ## Modules
//! - `patch`: `Patcher`, the open/close state machine
//! - `algo`: segment model, reuse matcher and merge optimizer
//! - `node`: materialized tree (`Element`, `Node`, `Text`, ...)
//! - `host`: `HostAdapter`, the primitive operations of a host tree
//! - `stub`: `StubHost`, an in-memory host with an op log
//! - `render`: HTML serialization of stub trees
//! - `attr`, `selector`, `id`: transaction-stamped state and identities
//!
//! ## Usage
//!
//! ```ignore
//! use tola_idom::prelude::*;
//!
//! let mut patcher = Patcher::new(StubHost::new());
//! let body = patcher.host_mut().mount("body");
//! let mut root = Element::new(body, "body");
//!
//! patcher.patch(&mut root, |p| {
//!     p.open(Selector::new("h1").with_class("title"))?;
//!     p.text("Hello")?;
//!     p.close()
//! })?;
//!
//! assert_eq!(patcher.host().inner_html(body), "<h1 class=\"title\">Hello</h1>");
//! ```

#[macro_use]
mod macros;

// =============================================================================
// Core modules
// =============================================================================

/// Transaction-stamped attributes, classes and styles
pub mod attr;

/// Reconciliation algorithms: segments, reuse, merge
pub mod algo;

/// Error types
pub mod error;

/// Host adapter contract
pub mod host;

/// Transaction ids and child keys
pub mod id;

/// Node types: Element, Node, Text, Comment, DocType
pub mod node;

/// The open/close patcher
pub mod patch;

/// Prelude for common imports
pub mod prelude;

/// HTML rendering
pub mod render;

/// Element selectors
pub mod selector;

/// Headless host backend
pub mod stub;

// =============================================================================
// Re-exports
// =============================================================================

// Node types
pub use node::{Children, Comment, DocType, Element, Fragment, Node, Text};

// Patching
pub use patch::{PatchConfig, Patcher};

// Algorithms
pub use algo::PatchStats;

// Host
pub use host::HostAdapter;
pub use stub::{HostOp, StubHost, StubId};

// Identity
pub use id::{Key, TxnId};
pub use selector::Selector;

// Error types
pub use error::{PatchError, PatchResult};

// =============================================================================
// Tests
// =============================================================================
