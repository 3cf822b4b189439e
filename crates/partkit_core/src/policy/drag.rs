//! Drag-to-translate.

use super::{CommitMode, DragPolicy, ProtocolViolation, Transaction, TransformPolicy, ViolationKind};
use crate::adapter::{Adapter, Shared};
use crate::error::CoreError;
use crate::geometry::Point;
use crate::operation::{Operation, OperationBuilder};
use crate::part::PartId;
use crate::tool::PointerEvent;
use crate::viewer::Viewer;
use log::warn;

const TRANSLATE_LABEL: &str = "Translate";

struct DragSession {
    start: Point,
    targets: Vec<(PartId, Shared<TransformPolicy>)>,
}

/// Translates the host part, or every selected part when the host is
/// selected, through their `TransformPolicy` adapters.
pub struct TranslateOnDragPolicy {
    host: Option<PartId>,
    transaction: Transaction<DragSession>,
}

impl Default for TranslateOnDragPolicy {
    fn default() -> Self {
        Self {
            host: None,
            transaction: Transaction::new(Self::NAME),
        }
    }
}

impl TranslateOnDragPolicy {
    pub const NAME: &'static str = "translate_on_drag";

    pub fn new() -> Self {
        Self::default()
    }

    fn targets(
        &self,
        viewer: &Viewer,
        host: PartId,
    ) -> Result<Vec<(PartId, Shared<TransformPolicy>)>, CoreError> {
        let selection = match viewer.selection_model() {
            Some(model) => {
                let selection = model.borrow().selection().to_vec();
                selection
            }
            None => Vec::new(),
        };
        let candidates = if selection.contains(&host) {
            selection
        } else {
            vec![host]
        };

        let mut targets = Vec::with_capacity(candidates.len());
        for part in candidates {
            let policy = match viewer.part(part) {
                Some(visual_part) => visual_part.adapters().get_adapter::<TransformPolicy>()?,
                None => None,
            };
            if let Some(policy) = policy {
                targets.push((part, policy));
            }
        }
        Ok(targets)
    }
}

fn revert_all(viewer: &mut Viewer, targets: &[(PartId, Shared<TransformPolicy>)]) {
    for (part, policy) in targets {
        if let Err(err) = policy.borrow_mut().commit(viewer, CommitMode::Revert) {
            warn!(
                "event=policy_revert module=policy status=error policy={} part={} error={}",
                TranslateOnDragPolicy::NAME,
                part,
                err
            );
        }
    }
}

impl DragPolicy for TranslateOnDragPolicy {
    fn init(&mut self, viewer: &mut Viewer, event: &PointerEvent) -> Result<(), CoreError> {
        self.transaction.ensure_idle()?;
        let host = self
            .host
            .ok_or(ProtocolViolation::new(Self::NAME, ViolationKind::Unattached))?;

        let candidates = self.targets(viewer, host)?;
        let mut started = Vec::with_capacity(candidates.len());
        for (part, policy) in candidates {
            let initialized = policy.borrow_mut().init(viewer);
            if let Err(err) = initialized {
                revert_all(viewer, &started);
                return Err(err);
            }
            started.push((part, policy));
        }

        self.transaction.begin(DragSession {
            start: event.position,
            targets: started,
        })?;
        Ok(())
    }

    fn interact(&mut self, viewer: &mut Viewer, event: &PointerEvent) -> Result<(), CoreError> {
        let session = self.transaction.snapshot()?;
        let delta = event.position.delta_from(session.start);
        for (part, policy) in &session.targets {
            let local = viewer.scene_delta_to_parent(*part, delta)?;
            policy.borrow_mut().translate(viewer, local)?;
        }
        Ok(())
    }

    fn commit(
        &mut self,
        viewer: &mut Viewer,
        mode: CommitMode,
    ) -> Result<Option<Operation>, CoreError> {
        let Some(session) = self.transaction.finish() else {
            return Ok(None);
        };
        let mut builder = OperationBuilder::new(TRANSLATE_LABEL);
        let mut first_error = None;
        for (_, policy) in &session.targets {
            match policy.borrow_mut().commit(viewer, mode) {
                Ok(operation) => builder = builder.chain_opt(operation),
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }
        Ok(builder.build_non_empty())
    }
}

impl Adapter<PartId> for TranslateOnDragPolicy {
    fn adaptable_attached(&mut self, host: PartId) {
        self.host = Some(host);
    }

    fn adaptable_detached(&mut self, _host: PartId) {
        self.host = None;
    }
}
