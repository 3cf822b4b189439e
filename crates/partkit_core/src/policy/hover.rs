//! Hover tracking and hover handles.

use super::{HoverPolicy, ProtocolViolation, ViolationKind};
use crate::adapter::Adapter;
use crate::error::CoreError;
use crate::part::{PartId, PartKind, VisualPart};
use crate::tool::PointerEvent;
use crate::viewer::Viewer;
use std::rc::Rc;

/// Anchorage role of hover handles.
pub const HOVER_ROLE: &str = "hover";

/// Creates unbound feedback or handle parts for a target part.
pub trait AnchoredPartFactory {
    fn create_anchored_parts(&self, viewer: &Viewer, target: PartId) -> Vec<VisualPart>;
}

/// Records the host as hovered and full-replaces its hover handles.
///
/// Register one on the root part so that moving into empty space clears
/// the hover.
#[derive(Default)]
pub struct HoverOnHoverPolicy {
    host: Option<PartId>,
    handles: Option<Rc<dyn AnchoredPartFactory>>,
}

impl HoverOnHoverPolicy {
    pub const NAME: &'static str = "hover_on_hover";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handles(handles: Rc<dyn AnchoredPartFactory>) -> Self {
        Self {
            host: None,
            handles: Some(handles),
        }
    }
}

impl HoverPolicy for HoverOnHoverPolicy {
    fn hover(&mut self, viewer: &mut Viewer, _event: &PointerEvent) -> Result<(), CoreError> {
        let host = self
            .host
            .ok_or(ProtocolViolation::new(Self::NAME, ViolationKind::Unattached))?;
        let Some(model) = viewer.hover_model() else {
            return Ok(());
        };
        let root = viewer.root();
        let hovered = (host != root).then_some(host);
        let previous = model.borrow().hover();
        if previous == hovered {
            return Ok(());
        }

        if let Some(previous) = previous {
            if viewer.tree().contains(previous) {
                viewer.replace_anchored_parts(previous, PartKind::Handle, HOVER_ROLE, Vec::new())?;
            }
        }
        model.borrow_mut().set_hover(hovered);

        if let (Some(target), Some(factory)) = (hovered, &self.handles) {
            let parts = factory.create_anchored_parts(viewer, target);
            viewer.replace_anchored_parts(target, PartKind::Handle, HOVER_ROLE, parts)?;
        }
        Ok(())
    }
}

impl Adapter<PartId> for HoverOnHoverPolicy {
    fn adaptable_attached(&mut self, host: PartId) {
        self.host = Some(host);
    }

    fn adaptable_detached(&mut self, _host: PartId) {
        self.host = None;
    }
}
