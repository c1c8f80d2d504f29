//! Prelude module for common imports.
//!
//! ```ignore
//! use tola_idom::prelude::*;
//! ```

// Node types
pub use crate::node::{Children, Comment, DocType, Element, Fragment, Node, Text};

// Patching
pub use crate::patch::{PatchConfig, Patcher};
pub use crate::algo::PatchStats;

// Host
pub use crate::host::HostAdapter;
pub use crate::stub::{HostOp, StubHost, StubId};

// Identity and selectors
pub use crate::id::{Key, TxnId};
pub use crate::selector::Selector;

// Rendering
pub use crate::render::{RenderConfig, VoidStyle};

// Error
pub use crate::error::{PatchError, PatchResult};
