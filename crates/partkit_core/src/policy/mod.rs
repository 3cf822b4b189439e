//! Interaction policies and the transactional edit protocol.
//!
//! # Responsibility
//! - Define the capability traits tools look up on parts
//!   (`dyn DragPolicy`, `dyn ClickPolicy`, `dyn HoverPolicy`).
//! - Provide transactional sub-policies (`TransformPolicy`,
//!   `CreationPolicy`) and the stock interaction policies built on them.
//! - Mirror the selection as anchored feedback parts.
//!
//! # Invariants
//! - `Idle --init--> Active --interact*--> --commit--> Idle`; `init` while
//!   active and `interact` while idle are protocol violations.
//! - `interact` only changes transient visual state; the model is mutated
//!   solely by the operation `commit` returns, once executed.
//! - `commit` on an idle policy is a no-op; `commit(Revert)` restores the
//!   pre-`init` transient state and yields no operation.

mod click;
mod creation;
mod drag;
mod hover;
mod selection;
mod transaction;
mod transform;

pub use click::{
    CloneOrFocusAndSelectOnClickPolicy, FocusAndSelectOnClickPolicy, SelectOnClickPolicy,
};
pub use creation::{CreateContentOperation, CreationPolicy, CREATE_CONTENT_LABEL};
pub use drag::TranslateOnDragPolicy;
pub use hover::{AnchoredPartFactory, HoverOnHoverPolicy, HOVER_ROLE};
pub use selection::{SelectionFeedbackBehavior, SELECTION_ROLE};
pub use transaction::{CommitMode, ProtocolViolation, Transaction, ViolationKind};
pub use transform::{SetTransformOperation, TransformPolicy, SET_TRANSFORM_LABEL};

use crate::adapter::Adapter;
use crate::error::CoreError;
use crate::operation::Operation;
use crate::part::PartId;
use crate::tool::PointerEvent;
use crate::viewer::Viewer;

/// Drag gesture protocol, driven by the drag tool.
pub trait DragPolicy: Adapter<PartId> {
    fn init(&mut self, viewer: &mut Viewer, event: &PointerEvent) -> Result<(), CoreError>;

    fn interact(&mut self, viewer: &mut Viewer, event: &PointerEvent) -> Result<(), CoreError>;

    fn commit(
        &mut self,
        viewer: &mut Viewer,
        mode: CommitMode,
    ) -> Result<Option<Operation>, CoreError>;
}

/// Single-event click handling.
pub trait ClickPolicy: Adapter<PartId> {
    fn click(
        &mut self,
        viewer: &mut Viewer,
        event: &PointerEvent,
    ) -> Result<Option<Operation>, CoreError>;
}

/// Pointer-over handling. Hover state is not undoable, so no operation.
pub trait HoverPolicy: Adapter<PartId> {
    fn hover(&mut self, viewer: &mut Viewer, event: &PointerEvent) -> Result<(), CoreError>;
}
