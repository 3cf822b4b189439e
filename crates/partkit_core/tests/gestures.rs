mod support;

use partkit_core::policy::{CommitMode, DragPolicy, ProtocolViolation, ViolationKind};
use partkit_core::{
    shared, Adapter, CoreError, Modifiers, Operation, PartId, Point, PointerEvent, Shared, Viewer,
};
use support::{Fixture, Node};

/// Drag policy whose apply-commit always fails.
struct RejectOnApply;

impl Adapter<PartId> for RejectOnApply {}

impl DragPolicy for RejectOnApply {
    fn init(&mut self, _viewer: &mut Viewer, _event: &PointerEvent) -> Result<(), CoreError> {
        Ok(())
    }

    fn interact(&mut self, _viewer: &mut Viewer, _event: &PointerEvent) -> Result<(), CoreError> {
        Ok(())
    }

    fn commit(
        &mut self,
        _viewer: &mut Viewer,
        mode: CommitMode,
    ) -> Result<Option<Operation>, CoreError> {
        match mode {
            CommitMode::Apply => Err(ProtocolViolation::new(
                "reject_on_apply",
                ViolationKind::InteractWhileIdle,
            )
            .into()),
            CommitMode::Revert => Ok(None),
        }
    }
}

fn selection(viewer: &Viewer) -> Vec<PartId> {
    let Some(model) = viewer.selection_model() else {
        return Vec::new();
    };
    let selection = model.borrow().selection().to_vec();
    selection
}

fn focus(viewer: &Viewer) -> Option<PartId> {
    let model = viewer.focus_model()?;
    let focus = model.borrow().focus();
    focus
}

#[test]
fn drag_translates_content_through_one_undoable_operation() {
    let a = Node::shape("A", 10.0, 10.0);
    let mut fixture = Fixture::new(&[&a]);

    fixture.press(15.0, 15.0).expect("press");
    fixture.drag(20.0, 20.0).expect("drag");
    fixture.drag(25.0, 25.0).expect("drag");
    assert_eq!(fixture.visual_position(&a), Point::new(20.0, 20.0));
    assert_eq!(a.position(), Point::new(10.0, 10.0));

    fixture.release(25.0, 25.0).expect("release");
    assert_eq!(a.position(), Point::new(20.0, 20.0));
    assert_eq!(fixture.visual_position(&a), Point::new(20.0, 20.0));
    assert_eq!(fixture.domain.history().undo_len(), 1);
    assert_eq!(fixture.domain.history().undo_label(), Some("Drag"));

    assert!(fixture.domain.undo().expect("undo"));
    assert_eq!(a.position(), Point::new(10.0, 10.0));
    assert_eq!(fixture.visual_position(&a), Point::new(10.0, 10.0));

    assert!(fixture.domain.redo().expect("redo"));
    assert_eq!(a.position(), Point::new(20.0, 20.0));
    assert_eq!(fixture.visual_position(&a), Point::new(20.0, 20.0));
    fixture.viewer().verify_integrity().expect("integrity after redo");
}

#[test]
fn press_and_release_in_place_records_nothing() {
    let a = Node::shape("A", 10.0, 10.0);
    let mut fixture = Fixture::new(&[&a]);

    fixture.press(15.0, 15.0).expect("press");
    fixture.release(15.0, 15.0).expect("release");

    assert_eq!(fixture.domain.history().undo_len(), 0);
    let part_a = fixture.part_of(&a);
    assert_eq!(selection(fixture.viewer()), vec![part_a]);
    assert_eq!(focus(fixture.viewer()), Some(part_a));
}

#[test]
fn synchronization_during_drag_keeps_transient_feedback() {
    let a = Node::shape("A", 10.0, 10.0);
    let mut fixture = Fixture::new(&[&a]);
    let part_a = fixture.part_of(&a);

    fixture.press(15.0, 15.0).expect("press");
    fixture.drag(25.0, 25.0).expect("drag");
    assert!(!fixture
        .viewer()
        .part(part_a)
        .expect("part A")
        .is_refresh_visual());

    fixture.viewer_mut().synchronize().expect("synchronize mid-drag");
    assert_eq!(fixture.visual_position(&a), Point::new(20.0, 20.0));

    fixture.release(25.0, 25.0).expect("release");
    assert!(fixture
        .viewer()
        .part(part_a)
        .expect("part A")
        .is_refresh_visual());
}

#[test]
fn cancel_reverts_feedback_and_records_nothing() {
    let a = Node::shape("A", 10.0, 10.0);
    let mut fixture = Fixture::new(&[&a]);
    let part_a = fixture.part_of(&a);

    fixture.press(15.0, 15.0).expect("press");
    fixture.drag(35.0, 35.0).expect("drag");
    fixture.cancel().expect("cancel");

    assert_eq!(a.position(), Point::new(10.0, 10.0));
    assert_eq!(fixture.visual_position(&a), Point::new(10.0, 10.0));
    assert_eq!(fixture.domain.history().undo_len(), 0);
    assert!(fixture
        .viewer()
        .part(part_a)
        .expect("part A")
        .is_refresh_visual());
}

#[test]
fn press_during_open_gesture_commits_it_first() {
    let a = Node::shape("A", 10.0, 10.0);
    let mut fixture = Fixture::new(&[&a]);

    fixture.press(15.0, 15.0).expect("press");
    fixture.drag(25.0, 25.0).expect("drag");
    fixture.press(200.0, 200.0).expect("second press");

    assert_eq!(a.position(), Point::new(20.0, 20.0));
    assert_eq!(fixture.domain.history().undo_len(), 1);
}

#[test]
fn deactivating_the_domain_commits_open_gestures() {
    let a = Node::shape("A", 10.0, 10.0);
    let mut fixture = Fixture::new(&[&a]);

    fixture.press(15.0, 15.0).expect("press");
    fixture.drag(25.0, 25.0).expect("drag");
    fixture.domain.deactivate();

    assert_eq!(a.position(), Point::new(20.0, 20.0));
    assert_eq!(fixture.domain.history().undo_len(), 1);

    fixture.drag(40.0, 40.0).expect("ignored while inactive");
    assert_eq!(a.position(), Point::new(20.0, 20.0));
}

#[test]
fn dragging_a_selected_part_moves_the_whole_selection() {
    let a = Node::shape("A", 10.0, 10.0);
    let b = Node::shape("B", 40.0, 10.0);
    let mut fixture = Fixture::new(&[&a, &b]);
    let shift = Modifiers {
        shift: true,
        ..Modifiers::NONE
    };

    fixture.press(15.0, 15.0).expect("select A");
    fixture.release(15.0, 15.0).expect("release");
    fixture.press_with(45.0, 15.0, shift).expect("add B");
    assert_eq!(
        selection(fixture.viewer()),
        vec![fixture.part_of(&a), fixture.part_of(&b)]
    );
    fixture.drag(55.0, 25.0).expect("drag");
    fixture.release(55.0, 25.0).expect("release");

    assert_eq!(a.position(), Point::new(20.0, 20.0));
    assert_eq!(b.position(), Point::new(50.0, 20.0));
    assert_eq!(fixture.domain.history().undo_len(), 1);

    fixture.domain.undo().expect("undo");
    assert_eq!(a.position(), Point::new(10.0, 10.0));
    assert_eq!(b.position(), Point::new(40.0, 10.0));
}

#[test]
fn clicking_the_background_clears_selection_and_focus() {
    let a = Node::shape("A", 10.0, 10.0);
    let mut fixture = Fixture::new(&[&a]);
    fixture.press(15.0, 15.0).expect("select A");
    fixture.release(15.0, 15.0).expect("release");

    fixture.press(200.0, 200.0).expect("press background");
    fixture.release(200.0, 200.0).expect("release");

    assert!(selection(fixture.viewer()).is_empty());
    assert_eq!(focus(fixture.viewer()), None);
    assert_eq!(fixture.domain.history().undo_len(), 0);
}

#[test]
fn alt_click_clones_content_at_the_same_place() {
    let a = Node::shape("A", 10.0, 10.0);
    let mut fixture = Fixture::new(&[&a]);
    let alt = Modifiers {
        alt: true,
        ..Modifiers::NONE
    };

    fixture.press_with(15.0, 15.0, alt).expect("alt press");
    fixture.release(15.0, 15.0).expect("release");

    assert_eq!(fixture.model.clone_count(), 1);
    let children = fixture.diagram.children();
    assert_eq!(children.len(), 2);
    let copy = children[1].downcast::<Node>().expect("copy is a node");
    assert_eq!(copy.name, "A copy");
    assert_eq!(copy.position(), Point::new(10.0, 10.0));
    assert_eq!(fixture.domain.history().undo_label(), Some("Clone"));
    assert_eq!(fixture.viewer().tree().len(), 3);

    fixture.domain.undo().expect("undo clone");
    assert_eq!(fixture.diagram.children().len(), 1);
    assert_eq!(fixture.viewer().tree().len(), 2);

    fixture.domain.redo().expect("redo clone");
    assert_eq!(fixture.diagram.children().len(), 2);
    assert_eq!(copy.position(), Point::new(10.0, 10.0));
    fixture.viewer().verify_integrity().expect("integrity after redo");
}

#[test]
fn failed_commit_discards_feedback_of_the_other_policies() {
    let a = Node::shape("A", 10.0, 10.0);
    let mut fixture = Fixture::new(&[&a]);
    let part_a = fixture.part_of(&a);
    let rejecting: Shared<dyn DragPolicy> = shared(RejectOnApply);
    fixture
        .viewer_mut()
        .part_mut(part_a)
        .expect("part A")
        .adapters_mut()
        .set_adapter_with_role("rejecting", rejecting);

    fixture.press(15.0, 15.0).expect("press");
    fixture.drag(30.0, 30.0).expect("drag");
    assert_eq!(fixture.visual_position(&a), Point::new(25.0, 25.0));
    let err = fixture.release(30.0, 30.0).expect_err("commit fails");

    assert!(matches!(err, CoreError::Protocol(_)));
    assert_eq!(a.position(), Point::new(10.0, 10.0));
    assert_eq!(fixture.visual_position(&a), Point::new(10.0, 10.0));
    assert_eq!(fixture.domain.history().undo_len(), 0);
    assert!(fixture
        .viewer()
        .part(part_a)
        .expect("part A")
        .is_refresh_visual());
}
