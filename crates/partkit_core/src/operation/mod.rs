//! Undoable operations and their composition.
//!
//! # Responsibility
//! - Define the `UndoableOperation` contract implemented by model edits.
//! - Provide the immutable `Operation` value (primitive or composite) and
//!   `OperationBuilder` for chaining sub-operations.
//! - Keep undo/redo stacks in `OperationHistory`.
//!
//! # Invariants
//! - A composite checks every member's applicability before applying any.
//! - Composites undo their members in reverse order.
//! - Composition flattens: chaining a composite appends its members.

mod history;

pub use history::OperationHistory;

use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// One executable, undoable unit of model mutation.
///
/// Implementations mutate the model through interior mutability; every
/// method returns whether the model was actually changed.
pub trait UndoableOperation {
    fn can_execute(&self) -> bool {
        true
    }

    fn can_undo(&self) -> bool {
        true
    }

    fn execute(&self) -> bool;

    fn undo(&self) -> bool;

    fn redo(&self) -> bool {
        self.execute()
    }

    /// Operations that would not change anything are never stacked.
    fn is_no_op(&self) -> bool {
        false
    }

    /// Operations that only touch viewer state (selection, focus) return
    /// `false` and stay out of the undo history.
    fn is_content_relevant(&self) -> bool {
        true
    }
}

/// Closure-backed primitive operation.
pub struct FnOperation {
    execute: Box<dyn Fn() -> bool>,
    undo: Box<dyn Fn() -> bool>,
    content_relevant: bool,
}

impl FnOperation {
    pub fn new(execute: impl Fn() -> bool + 'static, undo: impl Fn() -> bool + 'static) -> Self {
        Self {
            execute: Box::new(execute),
            undo: Box::new(undo),
            content_relevant: true,
        }
    }

    pub fn content_relevant(mut self, relevant: bool) -> Self {
        self.content_relevant = relevant;
        self
    }
}

impl UndoableOperation for FnOperation {
    fn execute(&self) -> bool {
        (self.execute)()
    }

    fn undo(&self) -> bool {
        (self.undo)()
    }

    fn is_content_relevant(&self) -> bool {
        self.content_relevant
    }
}

#[derive(Clone)]
enum OperationBody {
    Primitive(Rc<dyn UndoableOperation>),
    Composite(Rc<[Operation]>),
}

/// Immutable operation value: a labelled primitive or an ordered
/// composite. Cloning is cheap and shares the underlying operations.
#[derive(Clone)]
pub struct Operation {
    label: Rc<str>,
    body: OperationBody,
}

impl Operation {
    pub fn primitive(label: &str, operation: impl UndoableOperation + 'static) -> Self {
        Self {
            label: Rc::from(label),
            body: OperationBody::Primitive(Rc::new(operation)),
        }
    }

    pub fn from_fns(
        label: &str,
        execute: impl Fn() -> bool + 'static,
        undo: impl Fn() -> bool + 'static,
    ) -> Self {
        Self::primitive(label, FnOperation::new(execute, undo))
    }

    /// Composite of `members`, flattening nested composites.
    pub fn composite(label: &str, members: impl IntoIterator<Item = Operation>) -> Self {
        members
            .into_iter()
            .fold(OperationBuilder::new(label), OperationBuilder::chain)
            .build()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.body, OperationBody::Composite(_))
    }

    /// Members of a composite; empty for primitives.
    pub fn members(&self) -> &[Operation] {
        match &self.body {
            OperationBody::Primitive(_) => &[],
            OperationBody::Composite(members) => &members[..],
        }
    }

    pub fn can_execute(&self) -> bool {
        match &self.body {
            OperationBody::Primitive(operation) => operation.can_execute(),
            OperationBody::Composite(members) => members.iter().all(Operation::can_execute),
        }
    }

    pub fn can_undo(&self) -> bool {
        match &self.body {
            OperationBody::Primitive(operation) => operation.can_undo(),
            OperationBody::Composite(members) => members.iter().all(Operation::can_undo),
        }
    }

    /// An empty composite is a no-op, as is one whose members all are.
    pub fn is_no_op(&self) -> bool {
        match &self.body {
            OperationBody::Primitive(operation) => operation.is_no_op(),
            OperationBody::Composite(members) => members.iter().all(Operation::is_no_op),
        }
    }

    pub fn is_content_relevant(&self) -> bool {
        match &self.body {
            OperationBody::Primitive(operation) => operation.is_content_relevant(),
            OperationBody::Composite(members) => {
                members.iter().any(Operation::is_content_relevant)
            }
        }
    }

    /// Applies the operation. Returns `false` without touching the model
    /// when any member cannot execute.
    pub fn execute(&self) -> bool {
        if !self.can_execute() {
            return false;
        }
        self.apply(|operation| operation.execute(), Self::execute_unchecked)
    }

    pub fn undo(&self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.undo_unchecked()
    }

    pub fn redo(&self) -> bool {
        if !self.can_execute() {
            return false;
        }
        self.apply(|operation| operation.redo(), Self::redo_unchecked)
    }

    fn execute_unchecked(&self) -> bool {
        self.apply(|operation| operation.execute(), Self::execute_unchecked)
    }

    fn redo_unchecked(&self) -> bool {
        self.apply(|operation| operation.redo(), Self::redo_unchecked)
    }

    fn undo_unchecked(&self) -> bool {
        match &self.body {
            OperationBody::Primitive(operation) => operation.undo(),
            OperationBody::Composite(members) => members
                .iter()
                .rev()
                .fold(false, |changed, member| member.undo_unchecked() || changed),
        }
    }

    fn apply(
        &self,
        primitive: impl Fn(&dyn UndoableOperation) -> bool,
        member: fn(&Operation) -> bool,
    ) -> bool {
        match &self.body {
            OperationBody::Primitive(operation) => primitive(operation.as_ref()),
            OperationBody::Composite(members) => members
                .iter()
                .fold(false, |changed, next| member(next) || changed),
        }
    }
}

impl Debug for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("label", &self.label)
            .field("members", &self.members().len())
            .finish()
    }
}

/// Immutable builder accumulating sub-operations into one composite.
#[derive(Debug, Clone)]
pub struct OperationBuilder {
    label: Rc<str>,
    members: Vec<Operation>,
}

impl OperationBuilder {
    pub fn new(label: &str) -> Self {
        Self {
            label: Rc::from(label),
            members: Vec::new(),
        }
    }

    /// Appends `operation`, or each member when it is a composite.
    pub fn chain(mut self, operation: Operation) -> Self {
        if operation.is_composite() {
            self.members.extend(operation.members().iter().cloned());
        } else {
            self.members.push(operation);
        }
        self
    }

    pub fn chain_opt(self, operation: Option<Operation>) -> Self {
        match operation {
            Some(operation) => self.chain(operation),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn build(self) -> Operation {
        Operation {
            label: self.label,
            body: OperationBody::Composite(Rc::from(self.members)),
        }
    }

    /// Like [`build`](Self::build) but `None` when nothing would change.
    pub fn build_non_empty(self) -> Option<Operation> {
        let operation = self.build();
        (!operation.is_no_op()).then_some(operation)
    }
}
