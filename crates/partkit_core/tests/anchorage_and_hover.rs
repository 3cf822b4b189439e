mod support;

use partkit_core::policy::{
    AnchoredPartFactory, SelectionFeedbackBehavior, HOVER_ROLE, SELECTION_ROLE,
};
use partkit_core::{shared, Modifiers, PartId, PartKind, Shared, Viewer, VisualPart};
use std::rc::Rc;
use support::{Fixture, Node};

/// One outline part per selected part.
struct Outline;

impl AnchoredPartFactory for Outline {
    fn create_anchored_parts(&self, _viewer: &Viewer, _target: PartId) -> Vec<VisualPart> {
        vec![VisualPart::feedback()]
    }
}

fn with_selection_feedback(fixture: &mut Fixture) -> Shared<SelectionFeedbackBehavior> {
    let behavior = shared(SelectionFeedbackBehavior::new(Rc::new(Outline)));
    fixture
        .viewer_mut()
        .adapters_mut()
        .set_adapter(behavior.clone());
    behavior
}

fn selection_feedback(viewer: &Viewer, target: PartId) -> Vec<PartId> {
    viewer
        .tree()
        .anchoreds(target)
        .into_iter()
        .filter(|edge| edge.role == SELECTION_ROLE)
        .map(|edge| edge.part)
        .collect()
}

fn feedback_part_count(viewer: &Viewer) -> usize {
    viewer
        .tree()
        .ids()
        .into_iter()
        .filter(|id| viewer.part(*id).map(VisualPart::kind) == Some(PartKind::Feedback))
        .count()
}

fn anchorage_edges(viewer: &Viewer, part: PartId) -> Vec<(PartId, String)> {
    viewer
        .tree()
        .anchorages(part)
        .into_iter()
        .map(|edge| (edge.part, edge.role))
        .collect()
}

fn hover_handles(viewer: &Viewer, target: PartId) -> Vec<PartId> {
    viewer
        .tree()
        .anchoreds(target)
        .into_iter()
        .filter(|edge| edge.role == HOVER_ROLE)
        .map(|edge| edge.part)
        .collect()
}

fn hovered(viewer: &Viewer) -> Option<PartId> {
    let model = viewer.hover_model()?;
    let hovered = model.borrow().hover();
    hovered
}

#[test]
fn connection_is_anchored_to_both_ends() {
    let a = Node::shape("A", 0.0, 0.0);
    let b = Node::shape("B", 40.0, 0.0);
    let link = Node::connection("A->B", &a, &b);
    let fixture = Fixture::new(&[&a, &b, &link]);
    let part_a = fixture.part_of(&a);
    let part_b = fixture.part_of(&b);
    let part_link = fixture.part_of(&link);

    let mut edges = anchorage_edges(fixture.viewer(), part_link);
    edges.sort();
    let mut expected = vec![(part_a, "source".to_string()), (part_b, "target".to_string())];
    expected.sort();
    assert_eq!(edges, expected);

    let link_visual = fixture
        .viewer()
        .part(part_link)
        .and_then(VisualPart::visual)
        .expect("link visual");
    let anchorages = fixture
        .renderer
        .visual(link_visual)
        .expect("live link visual")
        .anchorages;
    assert_eq!(anchorages.len(), 2);
}

#[test]
fn removing_an_anchorage_end_detaches_only_that_edge() {
    let a = Node::shape("A", 0.0, 0.0);
    let b = Node::shape("B", 40.0, 0.0);
    let link = Node::connection("A->B", &a, &b);
    let mut fixture = Fixture::new(&[&a, &b, &link]);
    let part_a = fixture.part_of(&a);
    let part_b = fixture.part_of(&b);
    let part_link = fixture.part_of(&link);

    fixture.diagram.set_children(&[&a, &link]);
    fixture.viewer_mut().synchronize().expect("synchronize");

    let viewer = fixture.viewer();
    assert!(!viewer.tree().contains(part_b));
    assert!(viewer.tree().contains(part_link));
    assert_eq!(
        anchorage_edges(viewer, part_link),
        vec![(part_a, "source".to_string())]
    );
    assert!(viewer.tree().anchoreds(part_b).is_empty());
    viewer.verify_integrity().expect("no dangling edge");
}

#[test]
fn restoring_an_end_reattaches_the_edge() {
    let a = Node::shape("A", 0.0, 0.0);
    let b = Node::shape("B", 40.0, 0.0);
    let link = Node::connection("A->B", &a, &b);
    let mut fixture = Fixture::new(&[&a, &b, &link]);
    fixture.diagram.set_children(&[&a, &link]);
    fixture.viewer_mut().synchronize().expect("drop B");

    fixture.diagram.set_children(&[&a, &b, &link]);
    let stats = fixture.viewer_mut().synchronize().expect("restore B");

    assert_eq!(stats.created, 1);
    assert_eq!(stats.anchorages_attached, 1);
    let part_link = fixture.part_of(&link);
    assert_eq!(anchorage_edges(fixture.viewer(), part_link).len(), 2);
}

#[test]
fn hover_installs_one_handle_and_replaces_rather_than_accumulates() {
    let a = Node::shape("A", 10.0, 10.0);
    let mut fixture = Fixture::new(&[&a]);
    let part_a = fixture.part_of(&a);

    fixture.hover(15.0, 15.0).expect("hover A");
    let first = hover_handles(fixture.viewer(), part_a);
    assert_eq!(first.len(), 1);
    let handle = first[0];
    assert_eq!(
        fixture.viewer().part(handle).map(VisualPart::kind),
        Some(PartKind::Handle)
    );
    assert_eq!(hovered(fixture.viewer()), Some(part_a));

    fixture.hover(16.0, 16.0).expect("hover A again");
    assert_eq!(hover_handles(fixture.viewer(), part_a), vec![handle]);
    fixture.viewer().verify_integrity().expect("integrity while hovered");
}

#[test]
fn hovering_empty_space_clears_handles() {
    let a = Node::shape("A", 10.0, 10.0);
    let mut fixture = Fixture::new(&[&a]);
    let part_a = fixture.part_of(&a);
    fixture.hover(15.0, 15.0).expect("hover A");
    let handle = hover_handles(fixture.viewer(), part_a)[0];

    fixture.hover(200.0, 200.0).expect("hover background");

    let viewer = fixture.viewer();
    assert!(hover_handles(viewer, part_a).is_empty());
    assert!(!viewer.tree().contains(handle));
    assert_eq!(hovered(viewer), None);
}

#[test]
fn disposing_a_hovered_part_cascades_to_its_handles() {
    let a = Node::shape("A", 10.0, 10.0);
    let mut fixture = Fixture::new(&[&a]);
    let part_a = fixture.part_of(&a);
    fixture.hover(15.0, 15.0).expect("hover A");
    let handle = hover_handles(fixture.viewer(), part_a)[0];
    let live_before = fixture.renderer.live_visual_count();

    fixture.diagram.set_children(&[]);
    fixture.viewer_mut().synchronize().expect("synchronize");

    let viewer = fixture.viewer();
    assert!(!viewer.tree().contains(part_a));
    assert!(!viewer.tree().contains(handle));
    assert_eq!(fixture.renderer.live_visual_count(), live_before - 2);
    assert_eq!(hovered(viewer), None);
    viewer.verify_integrity().expect("integrity after cascade");
}

#[test]
fn selection_feedback_follows_the_selection() {
    let a = Node::shape("A", 10.0, 10.0);
    let b = Node::shape("B", 40.0, 10.0);
    let mut fixture = Fixture::new(&[&a, &b]);
    let behavior = with_selection_feedback(&mut fixture);
    let part_a = fixture.part_of(&a);
    let part_b = fixture.part_of(&b);

    fixture.press(15.0, 15.0).expect("select A");
    fixture.release(15.0, 15.0).expect("release");
    let outline_a = selection_feedback(fixture.viewer(), part_a);
    assert_eq!(outline_a.len(), 1);
    assert_eq!(
        fixture.viewer().part(outline_a[0]).map(VisualPart::kind),
        Some(PartKind::Feedback)
    );

    fixture.press(45.0, 15.0).expect("select B");
    fixture.release(45.0, 15.0).expect("release");
    let viewer = fixture.viewer();
    assert!(selection_feedback(viewer, part_a).is_empty());
    assert!(!viewer.tree().contains(outline_a[0]));
    assert_eq!(selection_feedback(viewer, part_b).len(), 1);
    assert_eq!(feedback_part_count(viewer), 1);

    let shift = Modifiers {
        shift: true,
        ..Modifiers::NONE
    };
    fixture.press_with(15.0, 15.0, shift).expect("add A");
    fixture.release(15.0, 15.0).expect("release");
    assert_eq!(feedback_part_count(fixture.viewer()), 2);
    assert_eq!(behavior.borrow().decorated(), &[part_b, part_a]);

    fixture.press(200.0, 200.0).expect("press background");
    fixture.release(200.0, 200.0).expect("release");
    assert_eq!(feedback_part_count(fixture.viewer()), 0);
    assert!(behavior.borrow().decorated().is_empty());
    fixture.viewer().verify_integrity().expect("integrity");
}

#[test]
fn disposing_a_selected_part_drops_its_selection_feedback() {
    let a = Node::shape("A", 10.0, 10.0);
    let b = Node::shape("B", 40.0, 10.0);
    let mut fixture = Fixture::new(&[&a, &b]);
    let behavior = with_selection_feedback(&mut fixture);
    fixture.press(15.0, 15.0).expect("select A");
    fixture.release(15.0, 15.0).expect("release");
    assert_eq!(feedback_part_count(fixture.viewer()), 1);

    fixture.diagram.set_children(&[&b]);
    fixture.viewer_mut().synchronize().expect("synchronize");

    let viewer = fixture.viewer();
    assert_eq!(feedback_part_count(viewer), 0);
    assert!(behavior.borrow().decorated().is_empty());
    viewer.verify_integrity().expect("integrity after disposal");
}
