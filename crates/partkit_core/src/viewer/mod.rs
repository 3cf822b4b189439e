//! Viewer: one part tree bound to a renderer and a content model.
//!
//! # Responsibility
//! - Own the root part, the part arena and the model-to-part mapping.
//! - Run content synchronization and anchored-part replacement.
//! - Resolve hit-test results to parts and convert scene coordinates.
//! - Hold viewer-level models (selection, hover, focus) as adapters and
//!   run the selection feedback behavior when one is installed.
//!
//! # Invariants
//! - The content map is written only by synchronization.
//! - Every live part's visual is registered in the visual map.
//! - Disposed parts never remain in the viewer models.

mod integrity;
mod models;

pub use integrity::IntegrityError;
pub use models::{FocusModel, HoverModel, SelectionModel};

use crate::adapter::{shared, AdapterStore, Shared, DEFAULT_ROLE};
use crate::content::{ContentModel, ContentPartFactory, ContentRef};
use crate::geometry::{
    inverse_apply_delta_or_identity, inverse_apply_or_identity, AffineTransform, Point,
};
use crate::part::{DisposedPart, PartError, PartId, PartKind, PartTree, VisualPart};
use crate::policy::SelectionFeedbackBehavior;
use crate::render::{Renderer, VisualHandle};
use crate::sync::{replace_anchored_parts, ContentSynchronizer, SyncError, SyncStats};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

/// Handle assigned by the editing domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewerId(pub u32);

impl Display for ViewerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "viewer{}", self.0)
    }
}

pub struct Viewer {
    tree: PartTree,
    root: PartId,
    contents: HashMap<ContentRef, PartId>,
    visuals: HashMap<VisualHandle, PartId>,
    adapters: AdapterStore<ViewerId>,
    renderer: Box<dyn Renderer>,
    model: Rc<dyn ContentModel>,
    factory: Rc<dyn ContentPartFactory>,
    root_content: Option<ContentRef>,
}

impl Viewer {
    /// Creates a viewer with an empty root and the default selection,
    /// hover and focus models.
    pub fn new(
        renderer: impl Renderer + 'static,
        model: Rc<dyn ContentModel>,
        factory: Rc<dyn ContentPartFactory>,
    ) -> Self {
        let mut renderer: Box<dyn Renderer> = Box::new(renderer);
        let mut tree = PartTree::new();
        let root = tree.adopt(VisualPart::root(), renderer.as_mut());
        let mut visuals = HashMap::new();
        if let Some(visual) = tree.part(root).and_then(VisualPart::visual) {
            visuals.insert(visual, root);
        }

        let mut adapters = AdapterStore::new();
        adapters.set_adapter(shared(SelectionModel::default()));
        adapters.set_adapter(shared(HoverModel::default()));
        adapters.set_adapter(shared(FocusModel::default()));

        Self {
            tree,
            root,
            contents: HashMap::new(),
            visuals,
            adapters,
            renderer,
            model,
            factory,
            root_content: None,
        }
    }

    /// Id assigned by the editing domain, if the viewer was added to one.
    pub fn id(&self) -> Option<ViewerId> {
        self.adapters.host()
    }

    pub(crate) fn bind(&mut self, id: ViewerId) {
        self.adapters.bind(id);
    }

    pub(crate) fn unbind(&mut self) {
        self.adapters.unbind();
    }

    pub fn root(&self) -> PartId {
        self.root
    }

    pub fn tree(&self) -> &PartTree {
        &self.tree
    }

    pub fn part(&self, id: PartId) -> Option<&VisualPart> {
        self.tree.part(id)
    }

    pub fn part_mut(&mut self, id: PartId) -> Option<&mut VisualPart> {
        self.tree.part_mut(id)
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    pub fn renderer_mut(&mut self) -> &mut dyn Renderer {
        self.renderer.as_mut()
    }

    pub fn model(&self) -> Rc<dyn ContentModel> {
        Rc::clone(&self.model)
    }

    pub fn adapters(&self) -> &AdapterStore<ViewerId> {
        &self.adapters
    }

    pub fn adapters_mut(&mut self) -> &mut AdapterStore<ViewerId> {
        &mut self.adapters
    }

    pub fn selection_model(&self) -> Option<Shared<SelectionModel>> {
        self.adapters.get_adapter_with_role(DEFAULT_ROLE)
    }

    pub fn hover_model(&self) -> Option<Shared<HoverModel>> {
        self.adapters.get_adapter_with_role(DEFAULT_ROLE)
    }

    pub fn focus_model(&self) -> Option<Shared<FocusModel>> {
        self.adapters.get_adapter_with_role(DEFAULT_ROLE)
    }

    pub fn root_content(&self) -> Option<&ContentRef> {
        self.root_content.as_ref()
    }

    /// Replaces the root content and synchronizes the whole tree.
    pub fn set_root_content(
        &mut self,
        content: Option<ContentRef>,
    ) -> Result<SyncStats, SyncError> {
        self.root_content = content;
        self.synchronize()
    }

    /// Full synchronization pass from the root.
    pub fn synchronize(&mut self) -> Result<SyncStats, SyncError> {
        let result = ContentSynchronizer::new(
            &mut self.tree,
            &mut self.contents,
            &mut self.visuals,
            self.renderer.as_mut(),
            self.model.as_ref(),
            self.factory.as_ref(),
            self.root_content.as_ref(),
        )
        .synchronize_tree(self.root);
        self.prune_models();
        let stats = result?;
        self.update_selection_feedback()?;
        Ok(stats)
    }

    /// Synchronizes the direct content children of `part` only.
    pub fn synchronize_part(&mut self, part: PartId) -> Result<SyncStats, SyncError> {
        if !self.tree.contains(part) {
            return Err(SyncError::Part(PartError::PartNotFound(part)));
        }
        let result = ContentSynchronizer::new(
            &mut self.tree,
            &mut self.contents,
            &mut self.visuals,
            self.renderer.as_mut(),
            self.model.as_ref(),
            self.factory.as_ref(),
            self.root_content.as_ref(),
        )
        .synchronize_single(part);
        self.prune_models();
        let stats = result?;
        self.update_selection_feedback()?;
        Ok(stats)
    }

    /// Live content part representing `content`.
    pub fn content_part(&self, content: &ContentRef) -> Option<PartId> {
        self.contents
            .get(content)
            .copied()
            .filter(|part| self.tree.contains(*part))
    }

    pub fn content_of(&self, part: PartId) -> Option<ContentRef> {
        self.tree.part(part).and_then(VisualPart::content_ref).cloned()
    }

    /// Content the children of `part` are read from: the root content for
    /// the root part, the part's own content otherwise.
    pub fn container_content(&self, part: PartId) -> Option<ContentRef> {
        if part == self.root {
            return self.root_content.clone();
        }
        self.content_of(part)
    }

    pub fn part_for_visual(&self, visual: VisualHandle) -> Option<PartId> {
        self.visuals.get(&visual).copied()
    }

    /// Topmost part under `point`, ignoring feedback parts and parts not
    /// connected to the root.
    ///
    /// Falls back to the root part when nothing else is hit.
    pub fn part_at(&self, point: Point) -> PartId {
        self.renderer
            .nodes_at(point)
            .into_iter()
            .filter_map(|visual| self.part_for_visual(visual))
            .find(|part| {
                let hittable = self
                    .tree
                    .part(*part)
                    .is_some_and(|visual_part| visual_part.kind() != PartKind::Feedback);
                hittable && (*part == self.root || self.tree.is_ancestor(self.root, *part))
            })
            .unwrap_or(self.root)
    }

    /// Adopts `part` and inserts it at `index` under `parent`.
    pub fn add_child(
        &mut self,
        parent: PartId,
        index: usize,
        part: VisualPart,
    ) -> Result<PartId, PartError> {
        if !self.tree.contains(parent) {
            return Err(PartError::PartNotFound(parent));
        }
        let id = self.tree.adopt(part, self.renderer.as_mut());
        self.register_visual(id);
        if let Err(err) = self.tree.insert_child(parent, index, id, self.renderer.as_mut()) {
            let disposed = self.tree.dispose(id, self.renderer.as_mut())?;
            self.forget_disposed(&disposed);
            return Err(err);
        }
        Ok(id)
    }

    /// Disposes `part` and its subtree outside of synchronization.
    pub fn dispose_part(&mut self, part: PartId) -> Result<Vec<DisposedPart>, PartError> {
        let disposed = self.tree.dispose(part, self.renderer.as_mut())?;
        self.forget_disposed(&disposed);
        self.update_selection_feedback()?;
        Ok(disposed)
    }

    /// Runs the installed [`SelectionFeedbackBehavior`], if any.
    pub fn update_selection_feedback(&mut self) -> Result<bool, PartError> {
        let Some(behavior) = self
            .adapters
            .get_adapter_with_role::<SelectionFeedbackBehavior>(DEFAULT_ROLE)
        else {
            return Ok(false);
        };
        let updated = behavior.borrow_mut().update(self);
        updated
    }

    pub fn attach_anchorage(
        &mut self,
        anchored: PartId,
        anchorage: PartId,
        role: &str,
    ) -> Result<bool, PartError> {
        self.tree
            .attach_anchorage(anchored, anchorage, role, self.renderer.as_mut())
    }

    pub fn detach_anchorage(
        &mut self,
        anchored: PartId,
        anchorage: PartId,
        role: &str,
    ) -> Result<bool, PartError> {
        self.tree
            .detach_anchorage(anchored, anchorage, role, self.renderer.as_mut())
    }

    /// Full-replaces the `kind` parts anchored to `target` under `role`.
    ///
    /// New parts are placed under the root part.
    pub fn replace_anchored_parts(
        &mut self,
        target: PartId,
        kind: PartKind,
        role: &str,
        parts: Vec<VisualPart>,
    ) -> Result<Vec<PartId>, PartError> {
        let replacement = replace_anchored_parts(
            &mut self.tree,
            self.renderer.as_mut(),
            self.root,
            target,
            kind,
            role,
            parts,
        )?;
        self.forget_disposed(&replacement.disposed);
        for id in &replacement.added {
            self.register_visual(*id);
        }
        Ok(replacement.added)
    }

    /// Refreshes every live content visual from the model, dropping
    /// transient feedback nothing committed. Parts with suppressed refresh
    /// are skipped. Returns how many visuals were refreshed.
    pub fn refresh_content_visuals(&mut self) -> Result<usize, PartError> {
        let mut refreshed = 0;
        let mut pending = vec![self.root];
        while let Some(part) = pending.pop() {
            for (child, _) in self.tree.content_children(part) {
                if self.tree.refresh_visual(child, self.renderer.as_mut())? {
                    refreshed += 1;
                }
                pending.push(child);
            }
        }
        Ok(refreshed)
    }

    pub fn set_refresh_visual(&mut self, part: PartId, enabled: bool) -> Result<bool, PartError> {
        self.tree
            .set_refresh_visual(part, enabled, self.renderer.as_mut())
    }

    /// Applies transient placement feedback to the visual of `part`.
    pub fn set_visual_transform(
        &mut self,
        part: PartId,
        transform: &AffineTransform,
    ) -> Result<(), PartError> {
        let visual = self.visual_of(part)?;
        self.renderer.set_visual_transform(visual, transform);
        Ok(())
    }

    /// Transform from the local coordinates of `part` to scene coordinates.
    pub fn local_to_scene(&self, part: PartId) -> Result<AffineTransform, PartError> {
        let visual = self.visual_of(part)?;
        Ok(self.renderer.local_to_scene(visual))
    }

    /// Maps a scene point into the local coordinates of `part`.
    pub fn scene_to_local(&self, part: PartId, point: Point) -> Result<Point, PartError> {
        Ok(inverse_apply_or_identity(&self.local_to_scene(part)?, point))
    }

    /// Maps a scene-space delta into the coordinate space `part` is placed
    /// in, i.e. the local space of its parent.
    pub fn scene_delta_to_parent(&self, part: PartId, delta: Point) -> Result<Point, PartError> {
        let Some(parent) = self.tree.parent(part) else {
            return Ok(delta);
        };
        Ok(inverse_apply_delta_or_identity(
            &self.local_to_scene(parent)?,
            delta,
        ))
    }

    pub fn verify_integrity(&self) -> Result<(), IntegrityError> {
        integrity::verify(&self.tree, &self.contents)
    }

    fn visual_of(&self, part: PartId) -> Result<VisualHandle, PartError> {
        self.tree
            .part(part)
            .and_then(VisualPart::visual)
            .ok_or(PartError::PartNotFound(part))
    }

    fn register_visual(&mut self, part: PartId) {
        if let Some(visual) = self.tree.part(part).and_then(VisualPart::visual) {
            self.visuals.insert(visual, part);
        }
    }

    fn forget_disposed(&mut self, disposed: &[DisposedPart]) {
        for entry in disposed {
            if let Some(content) = &entry.content {
                if self.contents.get(content) == Some(&entry.id) {
                    self.contents.remove(content);
                }
            }
            if let Some(visual) = entry.visual {
                self.visuals.remove(&visual);
            }
        }
        self.prune_models();
    }

    fn prune_models(&mut self) {
        if let Some(selection) = self.selection_model() {
            selection.borrow_mut().prune(&self.tree);
        }
        if let Some(hover) = self.hover_model() {
            hover.borrow_mut().prune(&self.tree);
        }
        if let Some(focus) = self.focus_model() {
            focus.borrow_mut().prune(&self.tree);
        }
    }
}

impl std::fmt::Debug for Viewer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewer")
            .field("id", &self.id())
            .field("root", &self.root)
            .field("parts", &self.tree.len())
            .field("contents", &self.contents.len())
            .finish()
    }
}
