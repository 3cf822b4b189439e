//! Full-replace synchronization for feedback and handle parts.

use crate::part::{DisposedPart, PartError, PartId, PartKind, PartTree, VisualPart};
use crate::render::Renderer;
use log::{debug, warn};

/// Result of one anchored-part replacement.
#[derive(Debug, Default)]
pub(crate) struct AnchoredReplacement {
    pub added: Vec<PartId>,
    pub disposed: Vec<DisposedPart>,
}

/// Disposes every `kind` part anchored to `target` under `role`, then adopts
/// `parts` as children of `layer` and anchors them the same way.
///
/// Nothing is reused across calls.
#[allow(clippy::too_many_arguments)]
pub(crate) fn replace_anchored_parts(
    tree: &mut PartTree,
    renderer: &mut dyn Renderer,
    layer: PartId,
    target: PartId,
    kind: PartKind,
    role: &str,
    parts: Vec<VisualPart>,
) -> Result<AnchoredReplacement, PartError> {
    if !tree.contains(target) {
        return Err(PartError::PartNotFound(target));
    }
    let mut replacement = AnchoredReplacement::default();

    let stale: Vec<PartId> = tree
        .anchoreds(target)
        .into_iter()
        .filter(|edge| edge.role == role)
        .filter(|edge| tree.part(edge.part).is_some_and(|part| part.kind() == kind))
        .map(|edge| edge.part)
        .collect();
    for id in stale {
        if tree.contains(id) {
            replacement.disposed.extend(tree.dispose(id, renderer)?);
        }
    }

    for part in parts {
        if part.kind() != kind {
            warn!(
                "event=anchored_replace module=sync status=skipped reason=kind_mismatch expected={} actual={}",
                kind.as_str(),
                part.kind().as_str()
            );
            continue;
        }
        let id = tree.adopt(part, renderer);
        let index = tree.children(layer).len();
        tree.insert_child(layer, index, id, renderer)?;
        tree.attach_anchorage(id, target, role, renderer)?;
        replacement.added.push(id);
    }

    debug!(
        "event=anchored_replace module=sync status=ok target={} kind={} role={} added={} disposed={}",
        target,
        kind.as_str(),
        role,
        replacement.added.len(),
        replacement.disposed.len()
    );
    Ok(replacement)
}

#[cfg(test)]
mod tests {
    use super::replace_anchored_parts;
    use crate::part::{PartKind, PartTree, VisualPart};
    use crate::render::HeadlessRenderer;

    #[test]
    fn replacement_disposes_previous_handles() {
        let mut renderer = HeadlessRenderer::new();
        let mut tree = PartTree::new();
        let root = tree.adopt(VisualPart::root(), &mut renderer);
        let target = tree.adopt(VisualPart::feedback(), &mut renderer);
        tree.insert_child(root, 0, target, &mut renderer).expect("insert target");

        let first = replace_anchored_parts(
            &mut tree,
            &mut renderer,
            root,
            target,
            PartKind::Handle,
            "hover",
            vec![VisualPart::handle(), VisualPart::handle()],
        )
        .expect("first replacement");
        assert_eq!(first.added.len(), 2);

        let second = replace_anchored_parts(
            &mut tree,
            &mut renderer,
            root,
            target,
            PartKind::Handle,
            "hover",
            vec![VisualPart::handle()],
        )
        .expect("second replacement");

        assert_eq!(second.disposed.len(), 2);
        assert_eq!(tree.anchoreds(target).len(), 1);
        assert_eq!(tree.children(root).len(), 2);
        assert!(first.added.iter().all(|id| !tree.contains(*id)));
    }

    #[test]
    fn mismatched_kind_is_skipped() {
        let mut renderer = HeadlessRenderer::new();
        let mut tree = PartTree::new();
        let root = tree.adopt(VisualPart::root(), &mut renderer);
        let target = tree.adopt(VisualPart::feedback(), &mut renderer);

        let replacement = replace_anchored_parts(
            &mut tree,
            &mut renderer,
            root,
            target,
            PartKind::Handle,
            "selection",
            vec![VisualPart::feedback()],
        )
        .expect("replacement");
        assert!(replacement.added.is_empty());
        assert!(tree.anchoreds(target).is_empty());
    }
}
