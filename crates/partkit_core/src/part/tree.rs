//! Arena owning every live part of one viewer.

use super::{AnchorageEdge, AnchorageGraph, PartId, PartKind, VisualPart};
use crate::content::ContentRef;
use crate::render::{Renderer, VisualHandle};
use log::debug;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Part tree errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartError {
    PartNotFound(PartId),
    /// The child already has a parent; remove it first.
    AlreadyParented { child: PartId, parent: PartId },
    NotAChild { parent: PartId, child: PartId },
    IndexOutOfBounds {
        parent: PartId,
        index: usize,
        len: usize,
    },
    /// Inserting would make a part its own ancestor.
    WouldCycle { parent: PartId, child: PartId },
    RootCannotBeAnchored(PartId),
}

impl Display for PartError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PartNotFound(id) => write!(f, "part not found: {id}"),
            Self::AlreadyParented { child, parent } => {
                write!(f, "part {child} already has parent {parent}")
            }
            Self::NotAChild { parent, child } => {
                write!(f, "part {child} is not a child of {parent}")
            }
            Self::IndexOutOfBounds { parent, index, len } => write!(
                f,
                "child index {index} out of bounds for {parent} with {len} children"
            ),
            Self::WouldCycle { parent, child } => {
                write!(f, "inserting {child} under {parent} would create a cycle")
            }
            Self::RootCannotBeAnchored(id) => {
                write!(f, "root part {id} cannot be anchored")
            }
        }
    }
}

impl Error for PartError {}

/// Summary of one part removed by [`PartTree::dispose`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisposedPart {
    pub id: PartId,
    pub kind: PartKind,
    pub content: Option<ContentRef>,
    pub visual: Option<VisualHandle>,
}

/// Part arena plus the anchorage relation between its parts.
#[derive(Debug, Default)]
pub struct PartTree {
    parts: HashMap<PartId, VisualPart>,
    next_id: u32,
    graph: AnchorageGraph,
}

impl PartTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of an unbound part: assigns its id, creates its
    /// visual and binds its adapters.
    pub fn adopt(&mut self, mut part: VisualPart, renderer: &mut dyn Renderer) -> PartId {
        let id = PartId(self.next_id);
        self.next_id += 1;
        part.parent = None;
        part.children.clear();
        part.mirrored_children.clear();
        part.visual = Some(renderer.create_visual(id, part.kind));
        part.adapters.bind(id);
        debug!(
            "event=part_adopt module=part status=ok part={} kind={}",
            id,
            part.kind.as_str()
        );
        self.parts.insert(id, part);
        id
    }

    pub fn contains(&self, id: PartId) -> bool {
        self.parts.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn part(&self, id: PartId) -> Option<&VisualPart> {
        self.parts.get(&id)
    }

    pub fn part_mut(&mut self, id: PartId) -> Option<&mut VisualPart> {
        self.parts.get_mut(&id)
    }

    /// Live part ids in ascending order.
    pub fn ids(&self) -> Vec<PartId> {
        let mut ids: Vec<PartId> = self.parts.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn parent(&self, id: PartId) -> Option<PartId> {
        self.parts.get(&id).and_then(|part| part.parent)
    }

    pub fn children(&self, id: PartId) -> &[PartId] {
        self.parts
            .get(&id)
            .map(|part| part.children.as_slice())
            .unwrap_or(&[])
    }

    /// Content children of `id`, in child order, with their content.
    pub fn content_children(&self, id: PartId) -> Vec<(PartId, ContentRef)> {
        self.children(id)
            .iter()
            .filter_map(|child| {
                let part = self.parts.get(child)?;
                match (part.kind, &part.content) {
                    (PartKind::Content, Some(content)) => Some((*child, content.clone())),
                    _ => None,
                }
            })
            .collect()
    }

    /// Returns whether `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: PartId, id: PartId) -> bool {
        let mut cursor = self.parent(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    pub fn graph(&self) -> &AnchorageGraph {
        &self.graph
    }

    pub fn anchorages(&self, anchored: PartId) -> Vec<AnchorageEdge> {
        self.graph.anchorages(anchored)
    }

    pub fn anchoreds(&self, anchorage: PartId) -> Vec<AnchorageEdge> {
        self.graph.anchoreds(anchorage)
    }

    /// Inserts the parentless `child` at `index` under `parent`.
    pub fn insert_child(
        &mut self,
        parent: PartId,
        index: usize,
        child: PartId,
        renderer: &mut dyn Renderer,
    ) -> Result<(), PartError> {
        let child_part = self.parts.get(&child).ok_or(PartError::PartNotFound(child))?;
        if let Some(existing) = child_part.parent {
            return Err(PartError::AlreadyParented {
                child,
                parent: existing,
            });
        }
        if parent == child || self.is_ancestor(child, parent) {
            return Err(PartError::WouldCycle { parent, child });
        }
        let parent_part = self
            .parts
            .get_mut(&parent)
            .ok_or(PartError::PartNotFound(parent))?;
        let len = parent_part.children.len();
        if index > len {
            return Err(PartError::IndexOutOfBounds { parent, index, len });
        }
        parent_part.children.insert(index, child);
        let refresh = parent_part.refresh_visual;
        if let Some(child_part) = self.parts.get_mut(&child) {
            child_part.parent = Some(parent);
        }
        if refresh {
            self.flush_visual_children(parent, renderer);
        }
        Ok(())
    }

    /// Removes `child` from `parent`, returning its former index.
    pub fn remove_child(
        &mut self,
        parent: PartId,
        child: PartId,
        renderer: &mut dyn Renderer,
    ) -> Result<usize, PartError> {
        let parent_part = self
            .parts
            .get_mut(&parent)
            .ok_or(PartError::PartNotFound(parent))?;
        let index = parent_part
            .children
            .iter()
            .position(|existing| *existing == child)
            .ok_or(PartError::NotAChild { parent, child })?;
        parent_part.children.remove(index);
        let refresh = parent_part.refresh_visual;
        if let Some(child_part) = self.parts.get_mut(&child) {
            child_part.parent = None;
        }
        if refresh {
            self.flush_visual_children(parent, renderer);
        }
        Ok(index)
    }

    /// Detaches `child` from its parent, if any.
    pub fn detach_from_parent(
        &mut self,
        child: PartId,
        renderer: &mut dyn Renderer,
    ) -> Result<Option<(PartId, usize)>, PartError> {
        let Some(parent) = self.parent(child) else {
            return Ok(None);
        };
        let index = self.remove_child(parent, child, renderer)?;
        Ok(Some((parent, index)))
    }

    /// Enables or suppresses visual mirroring for `id`, returning the
    /// previous flag. Lifting suppression flushes pending child changes
    /// and refreshes the visual once.
    pub fn set_refresh_visual(
        &mut self,
        id: PartId,
        enabled: bool,
        renderer: &mut dyn Renderer,
    ) -> Result<bool, PartError> {
        let part = self.parts.get_mut(&id).ok_or(PartError::PartNotFound(id))?;
        let previous = part.refresh_visual;
        part.refresh_visual = enabled;
        if enabled && !previous {
            self.flush_visual_children(id, renderer);
            self.refresh_visual(id, renderer)?;
        }
        Ok(previous)
    }

    /// Asks the renderer to update the visual of `id` from its content.
    ///
    /// Returns `false` while refresh is suppressed.
    pub fn refresh_visual(
        &mut self,
        id: PartId,
        renderer: &mut dyn Renderer,
    ) -> Result<bool, PartError> {
        let part = self.parts.get(&id).ok_or(PartError::PartNotFound(id))?;
        if !part.refresh_visual {
            return Ok(false);
        }
        if let Some(visual) = part.visual {
            renderer.refresh_visual(visual, part.content.as_ref());
        }
        Ok(true)
    }

    /// Anchors `anchored` to `anchorage` under `role`.
    ///
    /// Returns whether the graph changed; the renderer hook only runs when
    /// it did.
    pub fn attach_anchorage(
        &mut self,
        anchored: PartId,
        anchorage: PartId,
        role: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<bool, PartError> {
        let anchored_part = self
            .parts
            .get(&anchored)
            .ok_or(PartError::PartNotFound(anchored))?;
        if anchored_part.kind == PartKind::Root {
            return Err(PartError::RootCannotBeAnchored(anchored));
        }
        let anchored_visual = anchored_part.visual;
        let anchorage_visual = self
            .parts
            .get(&anchorage)
            .ok_or(PartError::PartNotFound(anchorage))?
            .visual;
        if !self.graph.attach(anchored, anchorage, role) {
            return Ok(false);
        }
        if let (Some(anchored_visual), Some(anchorage_visual)) = (anchored_visual, anchorage_visual)
        {
            renderer.attach_to_anchorage_visual(anchored_visual, anchorage_visual, role);
        }
        Ok(true)
    }

    pub fn detach_anchorage(
        &mut self,
        anchored: PartId,
        anchorage: PartId,
        role: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<bool, PartError> {
        let anchored_visual = self
            .parts
            .get(&anchored)
            .ok_or(PartError::PartNotFound(anchored))?
            .visual;
        let anchorage_visual = self
            .parts
            .get(&anchorage)
            .ok_or(PartError::PartNotFound(anchorage))?
            .visual;
        if !self.graph.detach(anchored, anchorage, role) {
            return Ok(false);
        }
        if let (Some(anchored_visual), Some(anchorage_visual)) = (anchored_visual, anchorage_visual)
        {
            renderer.detach_from_anchorage_visual(anchored_visual, anchorage_visual, role);
        }
        Ok(true)
    }

    /// Disposes `id` and its whole subtree.
    ///
    /// Every anchorage edge touching a disposed part is detached. Feedback
    /// and handle parts left without any anchorage are disposed as well.
    pub fn dispose(
        &mut self,
        id: PartId,
        renderer: &mut dyn Renderer,
    ) -> Result<Vec<DisposedPart>, PartError> {
        if !self.parts.contains_key(&id) {
            return Err(PartError::PartNotFound(id));
        }
        let mut disposed = Vec::new();
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if !self.parts.contains_key(&next) {
                continue;
            }
            self.detach_from_parent(next, renderer)?;
            self.dispose_subtree(next, renderer, &mut disposed, &mut pending);
        }
        Ok(disposed)
    }

    fn dispose_subtree(
        &mut self,
        id: PartId,
        renderer: &mut dyn Renderer,
        disposed: &mut Vec<DisposedPart>,
        orphans: &mut Vec<PartId>,
    ) {
        let children = self
            .parts
            .get(&id)
            .map(|part| part.children.clone())
            .unwrap_or_default();
        for child in children.into_iter().rev() {
            self.dispose_subtree(child, renderer, disposed, orphans);
        }

        for (anchored, anchorage, role) in self.graph.remove_part(id) {
            let anchored_visual = self.parts.get(&anchored).and_then(|part| part.visual);
            let anchorage_visual = self.parts.get(&anchorage).and_then(|part| part.visual);
            if let (Some(anchored_visual), Some(anchorage_visual)) =
                (anchored_visual, anchorage_visual)
            {
                renderer.detach_from_anchorage_visual(anchored_visual, anchorage_visual, &role);
            }
            if anchored != id && !self.graph.has_anchorages(anchored) {
                let ephemeral = self
                    .parts
                    .get(&anchored)
                    .is_some_and(|part| part.kind.is_ephemeral());
                if ephemeral {
                    orphans.push(anchored);
                }
            }
        }

        let Some(mut part) = self.parts.remove(&id) else {
            return;
        };
        if let Some(parent) = part.parent {
            if let Some(parent_part) = self.parts.get_mut(&parent) {
                parent_part.children.retain(|child| *child != id);
                if let Some(position) = parent_part
                    .mirrored_children
                    .iter()
                    .position(|(child, _)| *child == id)
                {
                    let (_, visual) = parent_part.mirrored_children.remove(position);
                    if let Some(parent_visual) = parent_part.visual {
                        renderer.remove_visual_child(parent_visual, visual);
                    }
                }
            }
        }
        part.adapters.unbind();
        if let Some(visual) = part.visual {
            renderer.dispose_visual(visual);
        }
        debug!(
            "event=part_dispose module=part status=ok part={} kind={}",
            id,
            part.kind.as_str()
        );
        disposed.push(DisposedPart {
            id,
            kind: part.kind,
            content: part.content,
            visual: part.visual,
        });
    }

    /// Brings the visual child list of `id` in line with its part children.
    fn flush_visual_children(&mut self, id: PartId, renderer: &mut dyn Renderer) {
        let Some(part) = self.parts.get(&id) else {
            return;
        };
        let Some(parent_visual) = part.visual else {
            return;
        };
        let target: Vec<(PartId, VisualHandle)> = part
            .children
            .iter()
            .filter_map(|child| {
                self.parts
                    .get(child)
                    .and_then(|child_part| child_part.visual)
                    .map(|visual| (*child, visual))
            })
            .collect();
        let Some(part) = self.parts.get_mut(&id) else {
            return;
        };
        let mirrored = &mut part.mirrored_children;

        mirrored.retain(|entry| {
            let keep = target.contains(entry);
            if !keep {
                renderer.remove_visual_child(parent_visual, entry.1);
            }
            keep
        });
        for (index, entry) in target.iter().enumerate() {
            if mirrored.get(index) == Some(entry) {
                continue;
            }
            if let Some(position) = mirrored.iter().position(|existing| existing == entry) {
                mirrored.remove(position);
                renderer.remove_visual_child(parent_visual, entry.1);
            }
            mirrored.insert(index, *entry);
            renderer.insert_visual_child(parent_visual, index, entry.1);
        }
    }
}
