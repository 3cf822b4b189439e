//! Domain-model identity and the collaborator contracts the core queries.
//!
//! # Responsibility
//! - Give model objects a reference-identity handle (`ContentRef`).
//! - Define the model-query, part-factory and model-editing collaborators
//!   supplied by the embedding application.
//!
//! # Invariants
//! - Two `ContentRef`s are equal iff they point to the same allocation;
//!   structurally equal objects are different contents.
//! - `ContentModel::children` is the authoritative child order for
//!   synchronization.

use crate::geometry::AffineTransform;
use crate::part::VisualPart;
use std::any::Any;
use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Reference-identity handle to one domain-model object.
#[derive(Clone)]
pub struct ContentRef(Rc<dyn Any>);

impl ContentRef {
    /// Wraps a shared model object.
    pub fn new<T: Any>(object: Rc<T>) -> Self {
        Self(object)
    }

    /// Returns the model object when it has type `T`.
    pub fn downcast<T: Any>(&self) -> Option<Rc<T>> {
        Rc::clone(&self.0).downcast::<T>().ok()
    }

    /// Returns whether `object` is the model object behind this handle.
    pub fn is<T: Any>(&self, object: &Rc<T>) -> bool {
        self.address() == Rc::as_ptr(object) as *const () as usize
    }

    fn address(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl PartialEq for ContentRef {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl Eq for ContentRef {}

impl Hash for ContentRef {
    fn hash<S: Hasher>(&self, state: &mut S) {
        self.address().hash(state);
    }
}

impl Debug for ContentRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContentRef({:#x})", self.address())
    }
}

/// Model-query collaborator.
pub trait ContentModel {
    /// Ordered model children that the part representing `content` shows.
    fn children(&self, content: &ContentRef) -> Vec<ContentRef>;

    /// Model objects `content` is anchored to, each with its role.
    fn anchorages(&self, _content: &ContentRef) -> Vec<(ContentRef, String)> {
        Vec::new()
    }
}

/// Part-factory collaborator, invoked only by the synchronizer.
///
/// Implementations allocate an unbound part; they must not touch the viewer.
pub trait ContentPartFactory {
    fn create_content_part(&self, content: &ContentRef) -> VisualPart;
}

/// Model-editing collaborator for structural child changes.
pub trait ContentContainer {
    /// Inserts `child` at `index` under `parent`. Returns `false` when the
    /// model rejects the insertion.
    fn insert_child(&self, parent: &ContentRef, index: usize, child: &ContentRef) -> bool;

    /// Removes `child` from `parent`, returning its former index.
    fn remove_child(&self, parent: &ContentRef, child: &ContentRef) -> Option<usize>;

    /// Returns whether `child` is currently under `parent`.
    fn contains_child(&self, parent: &ContentRef, child: &ContentRef) -> bool;
}

/// Model-editing collaborator for content placement.
pub trait ContentTransform {
    /// Current model transform, `None` when `content` has no placement.
    fn transform(&self, content: &ContentRef) -> Option<AffineTransform>;

    /// Writes a model transform. Returns `false` when rejected.
    fn set_transform(&self, content: &ContentRef, transform: AffineTransform) -> bool;
}

/// Model-editing collaborator producing detached copies of contents.
pub trait ContentCloner {
    fn clone_content(&self, content: &ContentRef) -> Option<ContentRef>;
}
