//! Rendering collaborator contract and a headless scene implementation.
//!
//! # Responsibility
//! - Define the calls the core makes into a rendering toolkit.
//! - Provide `HeadlessRenderer`, an in-memory scene graph used by the CLI,
//!   tests and toolkit-less embeddings.
//!
//! # Invariants
//! - Visual handles are never reused within one renderer.
//! - `nodes_at` returns the topmost visual first.

use crate::content::ContentRef;
use crate::geometry::{AffineTransform, Point, Rect};
use crate::part::{PartId, PartKind};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::rc::Rc;

/// Opaque handle to one toolkit visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VisualHandle(pub u64);

impl Display for VisualHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Calls the core makes into the rendering toolkit.
pub trait Renderer {
    /// Creates the visual for a freshly adopted part.
    fn create_visual(&mut self, part: PartId, kind: PartKind) -> VisualHandle;

    /// Destroys a visual. The handle is not used afterwards.
    fn dispose_visual(&mut self, visual: VisualHandle);

    fn insert_visual_child(&mut self, parent: VisualHandle, index: usize, child: VisualHandle);

    fn remove_visual_child(&mut self, parent: VisualHandle, child: VisualHandle);

    /// Updates a visual from the current model state.
    fn refresh_visual(&mut self, _visual: VisualHandle, _content: Option<&ContentRef>) {}

    fn attach_to_anchorage_visual(
        &mut self,
        _anchored: VisualHandle,
        _anchorage: VisualHandle,
        _role: &str,
    ) {
    }

    fn detach_from_anchorage_visual(
        &mut self,
        _anchored: VisualHandle,
        _anchorage: VisualHandle,
        _role: &str,
    ) {
    }

    /// Applies transient (not yet committed) placement feedback.
    fn set_visual_transform(&mut self, _visual: VisualHandle, _transform: &AffineTransform) {}

    /// Transform from the visual's local coordinates to scene coordinates.
    fn local_to_scene(&self, _visual: VisualHandle) -> AffineTransform {
        AffineTransform::identity()
    }

    /// Hit-test: visuals under the scene point, topmost first.
    fn nodes_at(&self, point: Point) -> Vec<VisualHandle>;
}

/// One visual in the headless scene.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessVisual {
    pub part: PartId,
    pub kind: PartKind,
    pub parent: Option<VisualHandle>,
    pub children: Vec<VisualHandle>,
    pub transform: AffineTransform,
    pub bounds: Option<Rect>,
    pub anchorages: BTreeSet<(VisualHandle, String)>,
    pub refresh_count: usize,
}

#[derive(Debug, Default)]
struct HeadlessScene {
    next_handle: u64,
    visuals: BTreeMap<VisualHandle, HeadlessVisual>,
    disposed: usize,
}

/// In-memory renderer; clones share one scene.
#[derive(Debug, Clone, Default)]
pub struct HeadlessRenderer {
    scene: Rc<RefCell<HeadlessScene>>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one visual.
    pub fn visual(&self, visual: VisualHandle) -> Option<HeadlessVisual> {
        self.scene.borrow().visuals.get(&visual).cloned()
    }

    pub fn children_of(&self, visual: VisualHandle) -> Vec<VisualHandle> {
        self.scene
            .borrow()
            .visuals
            .get(&visual)
            .map(|entry| entry.children.clone())
            .unwrap_or_default()
    }

    pub fn live_visual_count(&self) -> usize {
        self.scene.borrow().visuals.len()
    }

    pub fn disposed_visual_count(&self) -> usize {
        self.scene.borrow().disposed
    }

    /// Sets local hit-test bounds for a visual.
    pub fn set_bounds(&self, visual: VisualHandle, bounds: Rect) {
        if let Some(entry) = self.scene.borrow_mut().visuals.get_mut(&visual) {
            entry.bounds = Some(bounds);
        }
    }

    fn scene_transform(scene: &HeadlessScene, visual: VisualHandle) -> AffineTransform {
        let mut transform = AffineTransform::identity();
        let mut cursor = Some(visual);
        while let Some(current) = cursor {
            let Some(entry) = scene.visuals.get(&current) else {
                break;
            };
            transform = transform.pre_concatenate(&entry.transform);
            cursor = entry.parent;
        }
        transform
    }

    fn collect_hits(
        scene: &HeadlessScene,
        visual: VisualHandle,
        point: Point,
        hits: &mut Vec<VisualHandle>,
    ) {
        let Some(entry) = scene.visuals.get(&visual) else {
            return;
        };
        for child in entry.children.iter().rev() {
            Self::collect_hits(scene, *child, point, hits);
        }
        if let Some(bounds) = entry.bounds {
            let local = crate::geometry::inverse_apply_or_identity(
                &Self::scene_transform(scene, visual),
                point,
            );
            if bounds.contains(local) {
                hits.push(visual);
            }
        }
    }
}

impl Renderer for HeadlessRenderer {
    fn create_visual(&mut self, part: PartId, kind: PartKind) -> VisualHandle {
        let mut scene = self.scene.borrow_mut();
        scene.next_handle += 1;
        let handle = VisualHandle(scene.next_handle);
        scene.visuals.insert(
            handle,
            HeadlessVisual {
                part,
                kind,
                parent: None,
                children: Vec::new(),
                transform: AffineTransform::identity(),
                bounds: None,
                anchorages: BTreeSet::new(),
                refresh_count: 0,
            },
        );
        handle
    }

    fn dispose_visual(&mut self, visual: VisualHandle) {
        let mut scene = self.scene.borrow_mut();
        let Some(entry) = scene.visuals.remove(&visual) else {
            return;
        };
        scene.disposed += 1;
        if let Some(parent) = entry.parent {
            if let Some(parent_entry) = scene.visuals.get_mut(&parent) {
                parent_entry.children.retain(|child| *child != visual);
            }
        }
        for child in entry.children {
            if let Some(child_entry) = scene.visuals.get_mut(&child) {
                child_entry.parent = None;
            }
        }
    }

    fn insert_visual_child(&mut self, parent: VisualHandle, index: usize, child: VisualHandle) {
        let mut scene = self.scene.borrow_mut();
        if let Some(parent_entry) = scene.visuals.get_mut(&parent) {
            let index = index.min(parent_entry.children.len());
            parent_entry.children.insert(index, child);
        }
        if let Some(child_entry) = scene.visuals.get_mut(&child) {
            child_entry.parent = Some(parent);
        }
    }

    fn remove_visual_child(&mut self, parent: VisualHandle, child: VisualHandle) {
        let mut scene = self.scene.borrow_mut();
        if let Some(parent_entry) = scene.visuals.get_mut(&parent) {
            parent_entry.children.retain(|existing| *existing != child);
        }
        if let Some(child_entry) = scene.visuals.get_mut(&child) {
            if child_entry.parent == Some(parent) {
                child_entry.parent = None;
            }
        }
    }

    fn refresh_visual(&mut self, visual: VisualHandle, _content: Option<&ContentRef>) {
        if let Some(entry) = self.scene.borrow_mut().visuals.get_mut(&visual) {
            entry.refresh_count += 1;
        }
    }

    fn attach_to_anchorage_visual(
        &mut self,
        anchored: VisualHandle,
        anchorage: VisualHandle,
        role: &str,
    ) {
        if let Some(entry) = self.scene.borrow_mut().visuals.get_mut(&anchored) {
            entry.anchorages.insert((anchorage, role.to_string()));
        }
    }

    fn detach_from_anchorage_visual(
        &mut self,
        anchored: VisualHandle,
        anchorage: VisualHandle,
        role: &str,
    ) {
        if let Some(entry) = self.scene.borrow_mut().visuals.get_mut(&anchored) {
            entry.anchorages.remove(&(anchorage, role.to_string()));
        }
    }

    fn set_visual_transform(&mut self, visual: VisualHandle, transform: &AffineTransform) {
        if let Some(entry) = self.scene.borrow_mut().visuals.get_mut(&visual) {
            entry.transform = *transform;
        }
    }

    fn local_to_scene(&self, visual: VisualHandle) -> AffineTransform {
        Self::scene_transform(&self.scene.borrow(), visual)
    }

    fn nodes_at(&self, point: Point) -> Vec<VisualHandle> {
        let scene = self.scene.borrow();
        let mut hits = Vec::new();
        let roots: Vec<VisualHandle> = scene
            .visuals
            .iter()
            .filter(|(_, entry)| entry.parent.is_none())
            .map(|(handle, _)| *handle)
            .collect();
        for root in roots.into_iter().rev() {
            Self::collect_hits(&scene, root, point, &mut hits);
        }
        hits
    }
}
