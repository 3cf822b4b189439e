use super::{policies_of, EventKind, InputEvent, Tool};
use crate::domain::DomainContext;
use crate::error::CoreError;
use crate::operation::Operation;
use crate::policy::ClickPolicy;
use crate::viewer::ViewerId;
use log::debug;

const CLICK_LABEL: &str = "Click";

/// Routes presses to the `dyn ClickPolicy` adapters of the part under the
/// pointer and executes what they return as one operation.
#[derive(Debug, Default)]
pub struct ClickTool;

impl ClickTool {
    pub fn new() -> Self {
        Self
    }
}

impl Tool for ClickTool {
    fn name(&self) -> &'static str {
        "click"
    }

    fn subscriptions(&self) -> &'static [EventKind] {
        &[EventKind::Press]
    }

    fn handle(
        &mut self,
        cx: &mut DomainContext<'_>,
        viewer: ViewerId,
        event: &InputEvent,
    ) -> Result<(), CoreError> {
        let InputEvent::Press(pointer) = event else {
            return Ok(());
        };
        let target = cx.viewer_mut(viewer)?;
        let part = target.part_at(pointer.position);
        let policies = policies_of::<dyn ClickPolicy>(target, part);
        if policies.is_empty() {
            debug!(
                "event=tool_ignore module=tool status=skipped tool=click part={} reason=no_policy",
                part
            );
            return Ok(());
        }

        let mut operations = Vec::new();
        for policy in policies {
            let clicked = policy.borrow_mut().click(target, pointer)?;
            operations.extend(clicked);
        }
        let operation = match operations.len() {
            0 => return Ok(()),
            1 => operations.remove(0),
            _ => Operation::composite(CLICK_LABEL, operations),
        };
        cx.execute(operation)?;
        Ok(())
    }
}
