//! Transactional content placement.

use super::{CommitMode, ProtocolViolation, Transaction, ViolationKind};
use crate::adapter::Adapter;
use crate::content::{ContentRef, ContentTransform};
use crate::error::CoreError;
use crate::geometry::{AffineTransform, Point};
use crate::operation::{Operation, UndoableOperation};
use crate::part::PartId;
use crate::viewer::Viewer;
use std::rc::Rc;

pub const SET_TRANSFORM_LABEL: &str = "Transform";

/// Writes `after` on execute and `before` on undo.
pub struct SetTransformOperation {
    accessor: Rc<dyn ContentTransform>,
    content: ContentRef,
    before: AffineTransform,
    after: AffineTransform,
}

impl SetTransformOperation {
    pub fn new(
        accessor: Rc<dyn ContentTransform>,
        content: ContentRef,
        before: AffineTransform,
        after: AffineTransform,
    ) -> Self {
        Self {
            accessor,
            content,
            before,
            after,
        }
    }
}

impl UndoableOperation for SetTransformOperation {
    fn execute(&self) -> bool {
        self.accessor.set_transform(&self.content, self.after)
    }

    fn undo(&self) -> bool {
        self.accessor.set_transform(&self.content, self.before)
    }

    fn is_no_op(&self) -> bool {
        self.before == self.after
    }
}

struct VisualFeedback {
    part: PartId,
    refresh_was: bool,
}

struct TransformSession {
    content: ContentRef,
    feedback: Option<VisualFeedback>,
    initial: AffineTransform,
    current: AffineTransform,
}

/// Snapshots a content transform at `init`, shows transient placement on
/// the host visual, and yields one `Transform` operation at commit.
///
/// Visual refresh of the host is suppressed while a transaction is open
/// and restored to its prior state afterwards.
pub struct TransformPolicy {
    host: Option<PartId>,
    accessor: Rc<dyn ContentTransform>,
    transaction: Transaction<TransformSession>,
}

impl TransformPolicy {
    pub const NAME: &'static str = "transform";

    pub fn new(accessor: Rc<dyn ContentTransform>) -> Self {
        Self {
            host: None,
            accessor,
            transaction: Transaction::new(Self::NAME),
        }
    }

    pub fn host(&self) -> Option<PartId> {
        self.host
    }

    pub fn is_active(&self) -> bool {
        self.transaction.is_active()
    }

    /// Opens a transaction for the host part's content.
    pub fn init(&mut self, viewer: &mut Viewer) -> Result<(), CoreError> {
        self.transaction.ensure_idle()?;
        let unattached = || ProtocolViolation::new(Self::NAME, ViolationKind::Unattached);
        let part = self.host.ok_or_else(unattached)?;
        let content = viewer.content_of(part).ok_or_else(unattached)?;
        let initial = self
            .accessor
            .transform(&content)
            .unwrap_or_else(AffineTransform::identity);
        let refresh_was = viewer.set_refresh_visual(part, false)?;
        self.transaction.begin(TransformSession {
            content,
            feedback: Some(VisualFeedback { part, refresh_was }),
            initial,
            current: initial,
        })?;
        Ok(())
    }

    /// Opens a transaction for `content` without visual feedback, e.g. for
    /// a content object that has no part yet.
    pub fn init_content(&mut self, content: ContentRef) -> Result<(), CoreError> {
        self.transaction.ensure_idle()?;
        let initial = self
            .accessor
            .transform(&content)
            .unwrap_or_else(AffineTransform::identity);
        self.transaction.begin(TransformSession {
            content,
            feedback: None,
            initial,
            current: initial,
        })?;
        Ok(())
    }

    pub fn initial_transform(&self) -> Result<AffineTransform, CoreError> {
        Ok(self.transaction.snapshot()?.initial)
    }

    pub fn current_transform(&self) -> Result<AffineTransform, CoreError> {
        Ok(self.transaction.snapshot()?.current)
    }

    /// Replaces the transient transform.
    pub fn set_transform(
        &mut self,
        viewer: &mut Viewer,
        transform: AffineTransform,
    ) -> Result<(), CoreError> {
        let session = self.transaction.snapshot_mut()?;
        session.current = transform;
        if let Some(feedback) = &session.feedback {
            viewer.set_visual_transform(feedback.part, &transform)?;
        }
        Ok(())
    }

    /// Sets the transient transform to the initial one moved by `delta`,
    /// given in the coordinate space the content is placed in.
    pub fn translate(&mut self, viewer: &mut Viewer, delta: Point) -> Result<(), CoreError> {
        let initial = self.transaction.snapshot()?.initial;
        let moved = AffineTransform::translation(delta.x, delta.y).concatenate(&initial);
        self.set_transform(viewer, moved)
    }

    /// Closes the transaction.
    ///
    /// Returns `None` when idle, when reverting, or when the transform did
    /// not change.
    pub fn commit(
        &mut self,
        viewer: &mut Viewer,
        mode: CommitMode,
    ) -> Result<Option<Operation>, CoreError> {
        let Some(session) = self.transaction.finish() else {
            return Ok(None);
        };
        if let Some(feedback) = &session.feedback {
            if mode == CommitMode::Revert {
                viewer.set_visual_transform(feedback.part, &session.initial)?;
            }
            viewer.set_refresh_visual(feedback.part, feedback.refresh_was)?;
        }
        if mode == CommitMode::Revert || session.current == session.initial {
            return Ok(None);
        }
        Ok(Some(Operation::primitive(
            SET_TRANSFORM_LABEL,
            SetTransformOperation::new(
                Rc::clone(&self.accessor),
                session.content,
                session.initial,
                session.current,
            ),
        )))
    }
}

impl Adapter<PartId> for TransformPolicy {
    fn adaptable_attached(&mut self, host: PartId) {
        self.host = Some(host);
    }

    fn adaptable_detached(&mut self, _host: PartId) {
        self.host = None;
    }
}
