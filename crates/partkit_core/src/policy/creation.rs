//! Transactional content creation.

use super::{CommitMode, Transaction};
use crate::adapter::Adapter;
use crate::content::{ContentContainer, ContentRef};
use crate::error::CoreError;
use crate::operation::{Operation, UndoableOperation};
use crate::part::PartId;
use std::rc::Rc;

pub const CREATE_CONTENT_LABEL: &str = "Create";

/// Inserts `child` under `parent` on execute and removes it on undo.
pub struct CreateContentOperation {
    container: Rc<dyn ContentContainer>,
    parent: ContentRef,
    index: usize,
    child: ContentRef,
}

impl CreateContentOperation {
    pub fn new(
        container: Rc<dyn ContentContainer>,
        parent: ContentRef,
        index: usize,
        child: ContentRef,
    ) -> Self {
        Self {
            container,
            parent,
            index,
            child,
        }
    }
}

impl UndoableOperation for CreateContentOperation {
    fn can_execute(&self) -> bool {
        !self.container.contains_child(&self.parent, &self.child)
    }

    fn can_undo(&self) -> bool {
        self.container.contains_child(&self.parent, &self.child)
    }

    fn execute(&self) -> bool {
        self.container
            .insert_child(&self.parent, self.index, &self.child)
    }

    fn undo(&self) -> bool {
        self.container
            .remove_child(&self.parent, &self.child)
            .is_some()
    }
}

struct PendingCreation {
    parent: ContentRef,
    index: usize,
    child: ContentRef,
}

/// Records one content insertion between `init` and `commit` and turns it
/// into a `Create` operation. Usually registered on the root part.
pub struct CreationPolicy {
    container: Rc<dyn ContentContainer>,
    transaction: Transaction<Option<PendingCreation>>,
}

impl CreationPolicy {
    pub const NAME: &'static str = "creation";

    pub fn new(container: Rc<dyn ContentContainer>) -> Self {
        Self {
            container,
            transaction: Transaction::new(Self::NAME),
        }
    }

    pub fn is_active(&self) -> bool {
        self.transaction.is_active()
    }

    pub fn init(&mut self) -> Result<(), CoreError> {
        self.transaction.begin(None)?;
        Ok(())
    }

    /// Records the insertion of `child` at `index` under `parent`. The model
    /// is not touched until the committed operation is executed.
    pub fn create(
        &mut self,
        parent: ContentRef,
        index: usize,
        child: ContentRef,
    ) -> Result<(), CoreError> {
        *self.transaction.snapshot_mut()? = Some(PendingCreation {
            parent,
            index,
            child,
        });
        Ok(())
    }

    pub fn commit(&mut self, mode: CommitMode) -> Result<Option<Operation>, CoreError> {
        let Some(pending) = self.transaction.finish().flatten() else {
            return Ok(None);
        };
        if mode == CommitMode::Revert {
            return Ok(None);
        }
        Ok(Some(Operation::primitive(
            CREATE_CONTENT_LABEL,
            CreateContentOperation::new(
                Rc::clone(&self.container),
                pending.parent,
                pending.index,
                pending.child,
            ),
        )))
    }
}

impl Adapter<PartId> for CreationPolicy {}
