//! Tools: input-event routing to part policies.
//!
//! # Responsibility
//! - Resolve the target part of an event via renderer hit-testing.
//! - Fetch policy adapters by capability and drive their protocol.
//! - Execute the resulting operations through the editing domain.
//!
//! # Invariants
//! - A tool owns at most one open gesture at a time.
//! - Events without a matching policy are ignored, not errors.

mod click;
mod drag;
mod event;
mod hover;

pub use click::ClickTool;
pub use drag::DragTool;
pub use event::{EventKind, InputEvent, Modifiers, PointerButton, PointerEvent};
pub use hover::HoverTool;

use crate::adapter::Shared;
use crate::domain::DomainContext;
use crate::error::CoreError;
use crate::part::PartId;
use crate::viewer::{Viewer, ViewerId};

pub trait Tool {
    fn name(&self) -> &'static str;

    /// Event kinds the domain routes to this tool.
    fn subscriptions(&self) -> &'static [EventKind];

    fn activate(&mut self) {}

    /// Called when the domain deactivates; open gestures are closed here.
    fn deactivate(&mut self, _cx: &mut DomainContext<'_>) {}

    fn handle(
        &mut self,
        cx: &mut DomainContext<'_>,
        viewer: ViewerId,
        event: &InputEvent,
    ) -> Result<(), CoreError>;
}

/// Every adapter of capability `T` on `part`, ordered by role.
fn policies_of<T: ?Sized + 'static>(viewer: &Viewer, part: PartId) -> Vec<Shared<T>> {
    viewer
        .part(part)
        .map(|visual_part| visual_part.adapters().get_adapters::<T>().into_values().collect())
        .unwrap_or_default()
}
