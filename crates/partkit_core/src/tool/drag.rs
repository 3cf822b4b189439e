use super::{policies_of, EventKind, InputEvent, PointerEvent, Tool};
use crate::adapter::Shared;
use crate::domain::DomainContext;
use crate::error::CoreError;
use crate::operation::OperationBuilder;
use crate::part::PartId;
use crate::policy::{CommitMode, DragPolicy};
use crate::viewer::{Viewer, ViewerId};
use log::{debug, warn};

const DRAG_LABEL: &str = "Drag";

struct Gesture {
    viewer: ViewerId,
    part: PartId,
    policies: Vec<Shared<dyn DragPolicy>>,
}

/// Drives `dyn DragPolicy` adapters through press, drag and release.
///
/// A press while a gesture is open force-commits that gesture first. A
/// protocol error reverts and drops the gesture.
#[derive(Default)]
pub struct DragTool {
    gesture: Option<Gesture>,
}

impl DragTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_open_gesture(&self) -> bool {
        self.gesture.is_some()
    }

    fn begin(
        &mut self,
        cx: &mut DomainContext<'_>,
        viewer: ViewerId,
        pointer: &PointerEvent,
    ) -> Result<(), CoreError> {
        let target = cx.viewer_mut(viewer)?;
        let part = target.part_at(pointer.position);
        let policies = policies_of::<dyn DragPolicy>(target, part);
        if policies.is_empty() {
            debug!(
                "event=tool_ignore module=tool status=skipped tool=drag part={} reason=no_policy",
                part
            );
            return Ok(());
        }

        let mut started = Vec::with_capacity(policies.len());
        for policy in policies {
            let initialized = policy.borrow_mut().init(target, pointer);
            if let Err(err) = initialized {
                abort(target, part, &started, &err);
                return Err(err);
            }
            started.push(policy);
        }
        debug!(
            "event=gesture_begin module=tool status=ok tool=drag part={} policies={}",
            part,
            started.len()
        );
        self.gesture = Some(Gesture {
            viewer,
            part,
            policies: started,
        });
        Ok(())
    }

    fn interact(
        &mut self,
        cx: &mut DomainContext<'_>,
        pointer: &PointerEvent,
    ) -> Result<(), CoreError> {
        let Some(gesture) = self.gesture.take() else {
            return Ok(());
        };
        let target = cx.viewer_mut(gesture.viewer)?;
        for policy in &gesture.policies {
            let interacted = policy.borrow_mut().interact(target, pointer);
            if let Err(err) = interacted {
                abort(target, gesture.part, &gesture.policies, &err);
                return Err(err);
            }
        }
        self.gesture = Some(gesture);
        Ok(())
    }

    fn finish(&mut self, cx: &mut DomainContext<'_>, mode: CommitMode) -> Result<(), CoreError> {
        let Some(gesture) = self.gesture.take() else {
            return Ok(());
        };
        let target = cx.viewer_mut(gesture.viewer)?;
        let mut builder = OperationBuilder::new(DRAG_LABEL);
        let mut first_error = None;
        for policy in &gesture.policies {
            let committed = policy.borrow_mut().commit(target, mode);
            match committed {
                Ok(operation) => builder = builder.chain_opt(operation),
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
        if let Some(err) = first_error {
            warn!(
                "event=gesture_abort module=tool status=error tool=drag part={} error={}",
                gesture.part, err
            );
            if mode == CommitMode::Apply {
                // Operations of the policies that did commit are dropped, so
                // their transient placement must not outlive the gesture.
                if let Err(refresh_err) = target.refresh_content_visuals() {
                    warn!(
                        "event=gesture_abort module=tool status=error tool=drag part={} stage=refresh error={}",
                        gesture.part, refresh_err
                    );
                }
            }
            return Err(err);
        }
        if mode == CommitMode::Apply {
            if let Some(operation) = builder.build_non_empty() {
                cx.execute(operation)?;
            }
        }
        debug!(
            "event=gesture_end module=tool status=ok tool=drag part={} reverted={}",
            gesture.part,
            mode == CommitMode::Revert
        );
        Ok(())
    }

    fn force_commit(&mut self, cx: &mut DomainContext<'_>) -> Result<(), CoreError> {
        if let Some(gesture) = &self.gesture {
            warn!(
                "event=gesture_force_commit module=tool status=ok tool=drag part={}",
                gesture.part
            );
        }
        self.finish(cx, CommitMode::Apply)
    }
}

fn abort(viewer: &mut Viewer, part: PartId, policies: &[Shared<dyn DragPolicy>], err: &CoreError) {
    warn!(
        "event=gesture_abort module=tool status=error tool=drag part={} error={}",
        part, err
    );
    for policy in policies {
        // Policies that never opened a transaction treat this as a no-op.
        let reverted = policy
            .try_borrow_mut()
            .map(|mut policy| policy.commit(viewer, CommitMode::Revert));
        if let Ok(Err(revert_err)) = reverted {
            warn!(
                "event=gesture_abort module=tool status=error tool=drag part={} stage=revert error={}",
                part, revert_err
            );
        }
    }
}

impl Tool for DragTool {
    fn name(&self) -> &'static str {
        "drag"
    }

    fn subscriptions(&self) -> &'static [EventKind] {
        &[
            EventKind::Press,
            EventKind::Drag,
            EventKind::Release,
            EventKind::Cancel,
        ]
    }

    fn deactivate(&mut self, cx: &mut DomainContext<'_>) {
        if let Err(err) = self.force_commit(cx) {
            warn!(
                "event=tool_deactivate module=tool status=error tool=drag error={}",
                err
            );
        }
    }

    fn handle(
        &mut self,
        cx: &mut DomainContext<'_>,
        viewer: ViewerId,
        event: &InputEvent,
    ) -> Result<(), CoreError> {
        match event {
            InputEvent::Press(pointer) => {
                if self.gesture.is_some() {
                    self.force_commit(cx)?;
                }
                self.begin(cx, viewer, pointer)
            }
            InputEvent::Drag(pointer) => self.interact(cx, pointer),
            InputEvent::Release(pointer) => {
                self.interact(cx, pointer)?;
                self.finish(cx, CommitMode::Apply)
            }
            InputEvent::Cancel => self.finish(cx, CommitMode::Revert),
            InputEvent::Move(_) => Ok(()),
        }
    }
}
