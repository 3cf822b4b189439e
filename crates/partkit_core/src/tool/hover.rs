use super::{policies_of, EventKind, InputEvent, Tool};
use crate::domain::DomainContext;
use crate::error::CoreError;
use crate::policy::HoverPolicy;
use crate::viewer::ViewerId;

/// Routes pointer movement to the `dyn HoverPolicy` adapters of the part
/// under the pointer.
#[derive(Debug, Default)]
pub struct HoverTool;

impl HoverTool {
    pub fn new() -> Self {
        Self
    }
}

impl Tool for HoverTool {
    fn name(&self) -> &'static str {
        "hover"
    }

    fn subscriptions(&self) -> &'static [EventKind] {
        &[EventKind::Move, EventKind::Drag]
    }

    fn handle(
        &mut self,
        cx: &mut DomainContext<'_>,
        viewer: ViewerId,
        event: &InputEvent,
    ) -> Result<(), CoreError> {
        let (InputEvent::Move(pointer) | InputEvent::Drag(pointer)) = event else {
            return Ok(());
        };
        let target = cx.viewer_mut(viewer)?;
        let part = target.part_at(pointer.position);
        for policy in policies_of::<dyn HoverPolicy>(target, part) {
            policy.borrow_mut().hover(target, pointer)?;
        }
        Ok(())
    }
}
