//! Model-to-part synchronization.
//!
//! # Responsibility
//! - Reconcile each part's content children with the model's child order.
//! - Reuse mapped parts on moves, create missing ones through the factory,
//!   dispose parts whose model objects left the tree.
//! - Full-replace feedback and handle parts anchored to a target.
//!
//! # Invariants
//! - After a pass, the content children of every visited part represent
//!   exactly the model children, in order.
//! - No model object maps to two live content parts, and within one pass
//!   no model object is placed under two parents.
//! - Invalid model child lists are rejected before any mutation of the
//!   affected part.

mod content;
mod handles;
mod lcs;

pub(crate) use content::ContentSynchronizer;
pub(crate) use handles::{replace_anchored_parts, AnchoredReplacement};

use crate::content::ContentRef;
use crate::part::{PartError, PartId};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Counters for one synchronization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub created: usize,
    pub moved: usize,
    pub disposed: usize,
    pub anchorages_attached: usize,
    pub anchorages_detached: usize,
}

impl SyncStats {
    /// Returns whether the pass changed the part tree or anchorages.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Synchronization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The model listed the same object twice under one part.
    DuplicateModelChild { part: PartId, content: ContentRef },
    /// The model listed the part's own object or one of its ancestors'.
    ContentCycle { part: PartId, content: ContentRef },
    /// The model listed an object `owner` already shows in this pass.
    SharedModelChild {
        part: PartId,
        owner: PartId,
        content: ContentRef,
    },
    Part(PartError),
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateModelChild { part, content } => write!(
                f,
                "model children of {part} list {content:?} more than once"
            ),
            Self::ContentCycle { part, content } => write!(
                f,
                "model children of {part} contain {content:?}, which is the part's own or an ancestor's content"
            ),
            Self::SharedModelChild {
                part,
                owner,
                content,
            } => write!(
                f,
                "model children of {part} list {content:?}, already shown under {owner}"
            ),
            Self::Part(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Part(err) => Some(err),
            Self::DuplicateModelChild { .. }
            | Self::ContentCycle { .. }
            | Self::SharedModelChild { .. } => None,
        }
    }
}

impl From<PartError> for SyncError {
    fn from(value: PartError) -> Self {
        Self::Part(value)
    }
}
