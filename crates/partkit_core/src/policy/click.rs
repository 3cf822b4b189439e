//! Click policies: selection, focus and clone-on-click.

use super::{
    ClickPolicy, CommitMode, CreationPolicy, ProtocolViolation, TransformPolicy, ViolationKind,
};
use crate::adapter::Adapter;
use crate::content::{ContentCloner, ContentTransform};
use crate::error::CoreError;
use crate::operation::{FnOperation, Operation, OperationBuilder};
use crate::part::PartId;
use crate::tool::{Modifiers, PointerEvent};
use crate::viewer::Viewer;
use log::warn;
use std::rc::Rc;

const SELECT_LABEL: &str = "Select";
const FOCUS_LABEL: &str = "Focus";
const FOCUS_AND_SELECT_LABEL: &str = "Focus and Select";
const CLONE_LABEL: &str = "Clone";

/// Selection change for a click on `host`. Clicking the root clears the
/// selection; shift or ctrl toggles `host`.
fn selection_operation(viewer: &Viewer, host: PartId, modifiers: Modifiers) -> Option<Operation> {
    let model = viewer.selection_model()?;
    let before = model.borrow().selection().to_vec();
    let after = if host == viewer.root() {
        Vec::new()
    } else if modifiers.shift || modifiers.ctrl {
        let mut toggled = before.clone();
        if toggled.contains(&host) {
            toggled.retain(|part| *part != host);
        } else {
            toggled.push(host);
        }
        toggled
    } else {
        vec![host]
    };
    if before == after {
        return None;
    }

    let undo_model = Rc::clone(&model);
    let operation = FnOperation::new(
        move || {
            model.borrow_mut().set_selection(after.iter().copied());
            true
        },
        move || {
            undo_model.borrow_mut().set_selection(before.iter().copied());
            true
        },
    )
    .content_relevant(false);
    Some(Operation::primitive(SELECT_LABEL, operation))
}

fn focus_operation(viewer: &Viewer, host: PartId) -> Option<Operation> {
    let model = viewer.focus_model()?;
    let before = model.borrow().focus();
    let after = (host != viewer.root()).then_some(host);
    if before == after {
        return None;
    }

    let undo_model = Rc::clone(&model);
    let operation = FnOperation::new(
        move || {
            model.borrow_mut().set_focus(after);
            true
        },
        move || {
            undo_model.borrow_mut().set_focus(before);
            true
        },
    )
    .content_relevant(false);
    Some(Operation::primitive(FOCUS_LABEL, operation))
}

fn attached_host(host: Option<PartId>, policy: &'static str) -> Result<PartId, ProtocolViolation> {
    host.ok_or(ProtocolViolation::new(policy, ViolationKind::Unattached))
}

/// Selects the host part on click.
#[derive(Debug, Default)]
pub struct SelectOnClickPolicy {
    host: Option<PartId>,
}

impl SelectOnClickPolicy {
    pub const NAME: &'static str = "select_on_click";

    pub fn new() -> Self {
        Self::default()
    }
}

impl ClickPolicy for SelectOnClickPolicy {
    fn click(
        &mut self,
        viewer: &mut Viewer,
        event: &PointerEvent,
    ) -> Result<Option<Operation>, CoreError> {
        let host = attached_host(self.host, Self::NAME)?;
        Ok(selection_operation(viewer, host, event.modifiers))
    }
}

impl Adapter<PartId> for SelectOnClickPolicy {
    fn adaptable_attached(&mut self, host: PartId) {
        self.host = Some(host);
    }

    fn adaptable_detached(&mut self, _host: PartId) {
        self.host = None;
    }
}

/// Focuses and selects the host part on click.
#[derive(Debug, Default)]
pub struct FocusAndSelectOnClickPolicy {
    host: Option<PartId>,
}

impl FocusAndSelectOnClickPolicy {
    pub const NAME: &'static str = "focus_and_select_on_click";

    pub fn new() -> Self {
        Self::default()
    }
}

impl ClickPolicy for FocusAndSelectOnClickPolicy {
    fn click(
        &mut self,
        viewer: &mut Viewer,
        event: &PointerEvent,
    ) -> Result<Option<Operation>, CoreError> {
        let host = attached_host(self.host, Self::NAME)?;
        Ok(OperationBuilder::new(FOCUS_AND_SELECT_LABEL)
            .chain_opt(focus_operation(viewer, host))
            .chain_opt(selection_operation(viewer, host, event.modifiers))
            .build_non_empty())
    }
}

impl Adapter<PartId> for FocusAndSelectOnClickPolicy {
    fn adaptable_attached(&mut self, host: PartId) {
        self.host = Some(host);
    }

    fn adaptable_detached(&mut self, _host: PartId) {
        self.host = None;
    }
}

/// With the alt modifier, clones the host content next to it and copies
/// its transform, as one `Clone` operation. Otherwise focuses and selects.
///
/// The insertion goes through the `CreationPolicy` registered on the root
/// part.
pub struct CloneOrFocusAndSelectOnClickPolicy {
    host: Option<PartId>,
    fallback: FocusAndSelectOnClickPolicy,
    cloner: Rc<dyn ContentCloner>,
    transforms: Rc<dyn ContentTransform>,
}

impl CloneOrFocusAndSelectOnClickPolicy {
    pub const NAME: &'static str = "clone_or_focus_and_select_on_click";

    pub fn new(cloner: Rc<dyn ContentCloner>, transforms: Rc<dyn ContentTransform>) -> Self {
        Self {
            host: None,
            fallback: FocusAndSelectOnClickPolicy::new(),
            cloner,
            transforms,
        }
    }

    fn clone_host(
        &mut self,
        viewer: &mut Viewer,
        host: PartId,
    ) -> Result<Option<Operation>, CoreError> {
        let Some(original) = viewer.content_of(host) else {
            return Ok(None);
        };
        let container = viewer
            .tree()
            .parent(host)
            .and_then(|parent| viewer.container_content(parent));
        let Some(container) = container else {
            warn!(
                "event=clone_content module=policy status=skipped reason=no_container part={}",
                host
            );
            return Ok(None);
        };
        let root = viewer.root();
        let creation = match viewer.part(root) {
            Some(root_part) => root_part.adapters().get_adapter::<CreationPolicy>()?,
            None => None,
        };
        let Some(creation) = creation else {
            warn!(
                "event=clone_content module=policy status=skipped reason=no_creation_policy part={}",
                host
            );
            return Ok(None);
        };
        let Some(copy) = self.cloner.clone_content(&original) else {
            warn!(
                "event=clone_content module=policy status=skipped reason=not_cloneable part={}",
                host
            );
            return Ok(None);
        };

        let index = viewer.model().children(&container).len();
        let create = {
            let mut creation = creation.borrow_mut();
            creation.init()?;
            creation.create(container, index, copy.clone())?;
            creation.commit(CommitMode::Apply)?
        };

        let mut placement = TransformPolicy::new(Rc::clone(&self.transforms));
        placement.init_content(copy)?;
        if let Some(transform) = self.transforms.transform(&original) {
            placement.set_transform(viewer, transform)?;
        }
        let place = placement.commit(viewer, CommitMode::Apply)?;

        Ok(OperationBuilder::new(CLONE_LABEL)
            .chain_opt(create)
            .chain_opt(place)
            .build_non_empty())
    }
}

impl ClickPolicy for CloneOrFocusAndSelectOnClickPolicy {
    fn click(
        &mut self,
        viewer: &mut Viewer,
        event: &PointerEvent,
    ) -> Result<Option<Operation>, CoreError> {
        let host = attached_host(self.host, Self::NAME)?;
        if event.modifiers.alt && host != viewer.root() {
            return self.clone_host(viewer, host);
        }
        self.fallback.click(viewer, event)
    }
}

impl Adapter<PartId> for CloneOrFocusAndSelectOnClickPolicy {
    fn adaptable_attached(&mut self, host: PartId) {
        self.host = Some(host);
        self.fallback.adaptable_attached(host);
    }

    fn adaptable_detached(&mut self, host: PartId) {
        self.host = None;
        self.fallback.adaptable_detached(host);
    }
}
