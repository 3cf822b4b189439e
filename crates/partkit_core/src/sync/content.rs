//! Content synchronizer: LCS-by-identity child reconciliation.

use super::lcs::longest_increasing_subsequence;
use super::{SyncError, SyncStats};
use crate::content::{ContentModel, ContentPartFactory, ContentRef};
use crate::part::{DisposedPart, PartId, PartKind, PartTree, VisualPart};
use crate::render::{Renderer, VisualHandle};
use log::{debug, info};
use std::collections::{BTreeSet, HashMap, HashSet};

/// One synchronization run over a viewer's part tree.
///
/// Borrows the viewer state it mutates; parts removed during the run are
/// only disposed after the walk so that moves across subtrees reuse them.
/// A content object may be placed under one parent per run.
pub(crate) struct ContentSynchronizer<'a> {
    tree: &'a mut PartTree,
    contents: &'a mut HashMap<ContentRef, PartId>,
    visuals: &'a mut HashMap<VisualHandle, PartId>,
    renderer: &'a mut dyn Renderer,
    model: &'a dyn ContentModel,
    factory: &'a dyn ContentPartFactory,
    root_content: Option<&'a ContentRef>,
    detached: Vec<PartId>,
    placed: HashMap<ContentRef, PartId>,
    stats: SyncStats,
}

impl<'a> ContentSynchronizer<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        tree: &'a mut PartTree,
        contents: &'a mut HashMap<ContentRef, PartId>,
        visuals: &'a mut HashMap<VisualHandle, PartId>,
        renderer: &'a mut dyn Renderer,
        model: &'a dyn ContentModel,
        factory: &'a dyn ContentPartFactory,
        root_content: Option<&'a ContentRef>,
    ) -> Self {
        Self {
            tree,
            contents,
            visuals,
            renderer,
            model,
            factory,
            root_content,
            detached: Vec::new(),
            placed: HashMap::new(),
            stats: SyncStats::default(),
        }
    }

    /// Full pass: walk every content part below `root`, dispose what left
    /// the model, reconcile content anchorages, refresh content visuals.
    pub(crate) fn synchronize_tree(mut self, root: PartId) -> Result<SyncStats, SyncError> {
        let walked = self.walk(root);
        let orphans = self.orphaned_content_parts(root);
        self.detached.extend(orphans);
        self.dispose_detached()?;
        if let Err(err) = walked {
            info!(
                "event=sync_pass module=sync status=error root={} error={}",
                root, err
            );
            return Err(err);
        }
        self.synchronize_anchorages(root)?;
        for (id, _) in self.live_content_parts(root) {
            self.tree.refresh_visual(id, self.renderer)?;
        }
        info!(
            "event=sync_pass module=sync status=ok root={} created={} moved={} disposed={} anchorages_attached={} anchorages_detached={}",
            root,
            self.stats.created,
            self.stats.moved,
            self.stats.disposed,
            self.stats.anchorages_attached,
            self.stats.anchorages_detached
        );
        Ok(self.stats)
    }

    /// Single-level pass over the children of `part`.
    ///
    /// Removed children whose content the model still lists elsewhere are
    /// kept mapped without a parent; the next full pass re-homes them.
    pub(crate) fn synchronize_single(mut self, part: PartId) -> Result<SyncStats, SyncError> {
        let result = match self.model_children_of(part) {
            Some(children) => self.synchronize_children(part, &children),
            None => Ok(()),
        };
        self.retain_referenced();
        self.dispose_detached()?;
        result?;
        debug!(
            "event=sync_part module=sync status=ok part={} created={} moved={} disposed={}",
            part, self.stats.created, self.stats.moved, self.stats.disposed
        );
        Ok(self.stats)
    }

    fn walk(&mut self, root: PartId) -> Result<(), SyncError> {
        let mut pending = vec![root];
        while let Some(part) = pending.pop() {
            let Some(children) = self.model_children_of(part) else {
                continue;
            };
            self.synchronize_children(part, &children)?;
            pending.extend(
                self.tree
                    .content_children(part)
                    .into_iter()
                    .rev()
                    .map(|(id, _)| id),
            );
        }
        Ok(())
    }

    /// Model children `part` should show; `None` for parts that do not
    /// represent content.
    fn model_children_of(&self, part: PartId) -> Option<Vec<ContentRef>> {
        let visual_part = self.tree.part(part)?;
        match visual_part.kind() {
            PartKind::Root => Some(
                self.root_content
                    .map(|content| self.model.children(content))
                    .unwrap_or_default(),
            ),
            PartKind::Content => visual_part
                .content_ref()
                .map(|content| self.model.children(content)),
            PartKind::Feedback | PartKind::Handle => None,
        }
    }

    fn synchronize_children(
        &mut self,
        part: PartId,
        children: &[ContentRef],
    ) -> Result<(), SyncError> {
        let mut seen = HashSet::with_capacity(children.len());
        for child in children {
            if !seen.insert(child) {
                return Err(SyncError::DuplicateModelChild {
                    part,
                    content: child.clone(),
                });
            }
        }
        let lineage = self.lineage_contents(part);
        if let Some(child) = children.iter().find(|child| lineage.contains(child)) {
            return Err(SyncError::ContentCycle {
                part,
                content: child.clone(),
            });
        }
        for child in children {
            if let Some(owner) = self.placed.get(child).copied() {
                if owner != part {
                    return Err(SyncError::SharedModelChild {
                        part,
                        owner,
                        content: child.clone(),
                    });
                }
            }
        }

        let positions: HashMap<&ContentRef, usize> = children
            .iter()
            .enumerate()
            .map(|(index, child)| (child, index))
            .collect();
        let existing = self.tree.content_children(part);
        let matched: Vec<(PartId, usize)> = existing
            .iter()
            .filter_map(|(id, content)| positions.get(content).map(|position| (*id, *position)))
            .collect();
        let matched_positions: Vec<usize> = matched.iter().map(|(_, position)| *position).collect();
        let kept: HashSet<PartId> = longest_increasing_subsequence(&matched_positions)
            .into_iter()
            .map(|index| matched[index].0)
            .collect();

        for (id, content) in &existing {
            if kept.contains(id) {
                continue;
            }
            self.tree.remove_child(part, *id, self.renderer)?;
            if !positions.contains_key(content) {
                self.detached.push(*id);
            }
        }

        for (index, content) in children.iter().enumerate() {
            let (current, insert_at) = self.locate_content_slot(part, index);
            let in_place = current
                .and_then(|id| self.tree.part(id))
                .and_then(VisualPart::content_ref)
                .is_some_and(|existing| existing == content);
            if in_place {
                continue;
            }
            let child = self.part_for(content)?;
            self.tree.insert_child(part, insert_at, child, self.renderer)?;
        }
        self.placed.extend(children.iter().map(|child| (child.clone(), part)));
        Ok(())
    }

    /// Contents of `part` and all of its ancestors, plus the root content.
    fn lineage_contents(&self, part: PartId) -> Vec<ContentRef> {
        let mut lineage: Vec<ContentRef> = self.root_content.into_iter().cloned().collect();
        let mut cursor = Some(part);
        while let Some(current) = cursor {
            if let Some(content) = self.tree.part(current).and_then(VisualPart::content_ref) {
                lineage.push(content.clone());
            }
            cursor = self.tree.parent(current);
        }
        lineage
    }

    /// Finds the content child at `content_index` and the full child index
    /// a content part for that slot is inserted at.
    fn locate_content_slot(&self, part: PartId, content_index: usize) -> (Option<PartId>, usize) {
        let mut seen = 0;
        let mut after_last = 0;
        for (full_index, child) in self.tree.children(part).iter().enumerate() {
            let is_content = self
                .tree
                .part(*child)
                .is_some_and(|child_part| child_part.kind() == PartKind::Content);
            if !is_content {
                continue;
            }
            if seen == content_index {
                return (Some(*child), full_index);
            }
            seen += 1;
            after_last = full_index + 1;
        }
        (None, after_last)
    }

    /// Reuses the live part mapped to `content` or creates a new one.
    fn part_for(&mut self, content: &ContentRef) -> Result<PartId, SyncError> {
        if let Some(id) = self.contents.get(content).copied() {
            if self.tree.contains(id) {
                let previous = self.tree.detach_from_parent(id, self.renderer)?;
                if let Some((previous_parent, _)) = previous {
                    debug!(
                        "event=sync_move module=sync status=ok part={} from={}",
                        id, previous_parent
                    );
                }
                self.stats.moved += 1;
                return Ok(id);
            }
            self.contents.remove(content);
        }

        let part = self.factory.create_content_part(content);
        let id = self.tree.adopt(part, self.renderer);
        self.contents.insert(content.clone(), id);
        if let Some(visual) = self.tree.part(id).and_then(VisualPart::visual) {
            self.visuals.insert(visual, id);
        }
        self.stats.created += 1;
        Ok(id)
    }

    /// Drops detached parts from disposal while their content is still
    /// reachable from the root content.
    fn retain_referenced(&mut self) {
        if self.detached.is_empty() {
            return;
        }
        let reachable = self.reachable_contents();
        let tree = &*self.tree;
        self.detached.retain(|id| {
            let referenced = tree
                .part(*id)
                .and_then(VisualPart::content_ref)
                .is_some_and(|content| reachable.contains(content));
            if referenced {
                debug!(
                    "event=sync_retain module=sync status=ok part={} reason=referenced",
                    id
                );
            }
            !referenced
        });
    }

    /// Every content below the root content, following the model.
    fn reachable_contents(&self) -> HashSet<ContentRef> {
        let mut reachable = HashSet::new();
        let mut pending: Vec<ContentRef> = self.root_content.into_iter().cloned().collect();
        while let Some(content) = pending.pop() {
            for child in self.model.children(&content) {
                if reachable.insert(child.clone()) {
                    pending.push(child);
                }
            }
        }
        reachable
    }

    /// Mapped content parts left without a parent, e.g. by a single-level
    /// pass, and not re-adopted since.
    fn orphaned_content_parts(&self, root: PartId) -> Vec<PartId> {
        let mut orphans: Vec<PartId> = self
            .contents
            .values()
            .copied()
            .filter(|id| {
                *id != root && self.tree.contains(*id) && self.tree.parent(*id).is_none()
            })
            .collect();
        orphans.sort_unstable();
        orphans
    }

    fn dispose_detached(&mut self) -> Result<(), SyncError> {
        for id in std::mem::take(&mut self.detached) {
            if !self.tree.contains(id) || self.tree.parent(id).is_some() {
                continue;
            }
            for entry in self.tree.dispose(id, self.renderer)? {
                self.forget(&entry);
            }
        }
        Ok(())
    }

    fn forget(&mut self, entry: &DisposedPart) {
        self.stats.disposed += 1;
        if let Some(content) = &entry.content {
            if self.contents.get(content) == Some(&entry.id) {
                self.contents.remove(content);
            }
        }
        if let Some(visual) = entry.visual {
            self.visuals.remove(&visual);
        }
    }

    fn synchronize_anchorages(&mut self, root: PartId) -> Result<(), SyncError> {
        for (id, content) in self.live_content_parts(root) {
            let desired: BTreeSet<(PartId, String)> = self
                .model
                .anchorages(&content)
                .into_iter()
                .filter_map(|(target, role)| {
                    self.contents
                        .get(&target)
                        .copied()
                        .filter(|target_id| self.tree.contains(*target_id))
                        .map(|target_id| (target_id, role))
                })
                .collect();
            let current: BTreeSet<(PartId, String)> = self
                .tree
                .anchorages(id)
                .into_iter()
                .filter(|edge| {
                    self.tree
                        .part(edge.part)
                        .is_some_and(|part| part.kind() == PartKind::Content)
                })
                .map(|edge| (edge.part, edge.role))
                .collect();

            for (anchorage, role) in current.difference(&desired) {
                if self
                    .tree
                    .detach_anchorage(id, *anchorage, role, self.renderer)?
                {
                    self.stats.anchorages_detached += 1;
                }
            }
            for (anchorage, role) in desired.difference(&current) {
                if self
                    .tree
                    .attach_anchorage(id, *anchorage, role, self.renderer)?
                {
                    self.stats.anchorages_attached += 1;
                }
            }
        }
        Ok(())
    }

    /// Content parts reachable from `root`, depth first.
    fn live_content_parts(&self, root: PartId) -> Vec<(PartId, ContentRef)> {
        let mut found = Vec::new();
        let mut pending = vec![root];
        while let Some(part) = pending.pop() {
            let children = self.tree.content_children(part);
            for (id, _) in children.iter().rev() {
                pending.push(*id);
            }
            found.extend(children);
        }
        found
    }
}
