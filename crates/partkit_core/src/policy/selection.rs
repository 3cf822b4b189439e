//! Selection feedback anchored to selected parts.

use super::AnchoredPartFactory;
use crate::adapter::Adapter;
use crate::part::{PartError, PartId, PartKind};
use crate::viewer::{Viewer, ViewerId};
use log::debug;
use std::rc::Rc;

/// Anchorage role of selection feedback.
pub const SELECTION_ROLE: &str = "selection";

/// Keeps the feedback parts built by its factory anchored to every selected
/// part and to nothing else.
///
/// Installed as a viewer adapter. The viewer runs it after synchronization
/// and disposal, the editing domain after every history change.
pub struct SelectionFeedbackBehavior {
    factory: Rc<dyn AnchoredPartFactory>,
    decorated: Vec<PartId>,
}

impl SelectionFeedbackBehavior {
    pub fn new(factory: Rc<dyn AnchoredPartFactory>) -> Self {
        Self {
            factory,
            decorated: Vec::new(),
        }
    }

    /// Parts currently carrying selection feedback.
    pub fn decorated(&self) -> &[PartId] {
        &self.decorated
    }

    /// Full-replaces feedback on parts that joined the selection and clears
    /// it on parts that left. Returns whether anything was replaced.
    pub fn update(&mut self, viewer: &mut Viewer) -> Result<bool, PartError> {
        let selection = match viewer.selection_model() {
            Some(model) => {
                let selection = model.borrow().selection().to_vec();
                selection
            }
            None => Vec::new(),
        };
        let mut changed = false;
        for part in &self.decorated {
            // Disposal already took the feedback of dead parts with it.
            if selection.contains(part) || !viewer.tree().contains(*part) {
                continue;
            }
            viewer.replace_anchored_parts(
                *part,
                PartKind::Feedback,
                SELECTION_ROLE,
                Vec::new(),
            )?;
            changed = true;
        }
        for part in &selection {
            if self.decorated.contains(part) {
                continue;
            }
            let parts = self.factory.create_anchored_parts(viewer, *part);
            viewer.replace_anchored_parts(*part, PartKind::Feedback, SELECTION_ROLE, parts)?;
            changed = true;
        }
        if changed {
            debug!(
                "event=selection_feedback module=policy status=ok selected={} previously={}",
                selection.len(),
                self.decorated.len()
            );
        }
        self.decorated = selection;
        Ok(changed)
    }
}

impl Adapter<ViewerId> for SelectionFeedbackBehavior {}
