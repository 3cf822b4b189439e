//! Undo/redo stacks.

use super::Operation;
use log::{debug, info};

/// Undo and redo stacks with an optional depth limit.
#[derive(Debug, Default)]
pub struct OperationHistory {
    undo: Vec<Operation>,
    redo: Vec<Operation>,
    limit: Option<usize>,
}

impl OperationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// History keeping at most `limit` undoable operations.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Executes `operation` and stacks it when it changed content.
    ///
    /// Returns whether the operation was applied. Stacking clears the redo
    /// stack.
    pub fn execute(&mut self, operation: Operation) -> bool {
        if !operation.can_execute() {
            info!(
                "event=operation_execute module=operation status=skipped reason=cannot_execute label={}",
                operation.label()
            );
            return false;
        }
        let applied = operation.execute();
        let stacked = applied && !operation.is_no_op() && operation.is_content_relevant();
        info!(
            "event=operation_execute module=operation status=ok label={} applied={} stacked={}",
            operation.label(),
            applied,
            stacked
        );
        if stacked {
            self.undo.push(operation);
            self.redo.clear();
            self.enforce_limit();
        }
        applied
    }

    /// Undoes the most recent operation. A no-op on an empty stack.
    pub fn undo(&mut self) -> bool {
        let Some(operation) = self.undo.pop() else {
            debug!("event=operation_undo module=operation status=skipped reason=empty");
            return false;
        };
        if !operation.can_undo() {
            info!(
                "event=operation_undo module=operation status=skipped reason=cannot_undo label={}",
                operation.label()
            );
            self.undo.push(operation);
            return false;
        }
        let applied = operation.undo();
        info!(
            "event=operation_undo module=operation status=ok label={} applied={}",
            operation.label(),
            applied
        );
        self.redo.push(operation);
        applied
    }

    /// Re-applies the most recently undone operation. A no-op on an empty
    /// stack.
    pub fn redo(&mut self) -> bool {
        let Some(operation) = self.redo.pop() else {
            debug!("event=operation_redo module=operation status=skipped reason=empty");
            return false;
        };
        if !operation.can_execute() {
            info!(
                "event=operation_redo module=operation status=skipped reason=cannot_execute label={}",
                operation.label()
            );
            self.redo.push(operation);
            return false;
        }
        let applied = operation.redo();
        info!(
            "event=operation_redo module=operation status=ok label={} applied={}",
            operation.label(),
            applied
        );
        self.undo.push(operation);
        applied
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.undo.last().map(Operation::label)
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.redo.last().map(Operation::label)
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    fn enforce_limit(&mut self) {
        if let Some(limit) = self.limit {
            let excess = self.undo.len().saturating_sub(limit);
            if excess > 0 {
                self.undo.drain(..excess);
            }
        }
    }
}
