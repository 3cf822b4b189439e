//! Editing domain: shared history, viewers and tools.
//!
//! # Responsibility
//! - Own the operation history shared by every viewer.
//! - Register viewers and tools; route input events to subscribed tools.
//! - Re-synchronize viewers after the model changes through the history.
//!
//! # Invariants
//! - Operations reach the model only through `execute`, `undo` and `redo`.
//! - Events dispatched while the domain is inactive are dropped.
//! - Deactivation closes every open gesture before returning.

use crate::adapter::AdapterStore;
use crate::config::CoreConfig;
use crate::error::CoreError;
use crate::operation::{Operation, OperationHistory};
use crate::tool::{InputEvent, Tool};
use crate::viewer::{Viewer, ViewerId};
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// Borrowed view of the domain handed to tools while they handle events.
pub struct DomainContext<'a> {
    history: &'a mut OperationHistory,
    viewers: &'a mut BTreeMap<ViewerId, Viewer>,
    synchronize_on_execute: bool,
}

impl DomainContext<'_> {
    pub fn viewer(&self, id: ViewerId) -> Result<&Viewer, CoreError> {
        self.viewers.get(&id).ok_or(CoreError::ViewerNotFound(id))
    }

    pub fn viewer_mut(&mut self, id: ViewerId) -> Result<&mut Viewer, CoreError> {
        self.viewers
            .get_mut(&id)
            .ok_or(CoreError::ViewerNotFound(id))
    }

    pub fn history(&self) -> &OperationHistory {
        self.history
    }

    /// Executes `operation` on the shared history.
    ///
    /// Returns `Ok(false)` when the operation was not applied.
    pub fn execute(&mut self, operation: Operation) -> Result<bool, CoreError> {
        let applied = self.history.execute(operation);
        if applied {
            refresh_viewers(self.viewers, self.synchronize_on_execute)?;
        }
        Ok(applied)
    }
}

/// Brings viewers in line with the model after a history change: a full
/// synchronization when configured, selection feedback in any case.
fn refresh_viewers(
    viewers: &mut BTreeMap<ViewerId, Viewer>,
    synchronize: bool,
) -> Result<(), CoreError> {
    if synchronize {
        return synchronize_all(viewers);
    }
    for viewer in viewers.values_mut() {
        viewer.update_selection_feedback()?;
    }
    Ok(())
}

fn synchronize_all(viewers: &mut BTreeMap<ViewerId, Viewer>) -> Result<(), CoreError> {
    for (id, viewer) in viewers.iter_mut() {
        let stats = viewer.synchronize()?;
        if !stats.is_empty() {
            debug!(
                "event=viewer_resync module=domain status=ok viewer={} created={} disposed={}",
                id, stats.created, stats.disposed
            );
        }
    }
    Ok(())
}

pub struct EditingDomain {
    history: OperationHistory,
    viewers: BTreeMap<ViewerId, Viewer>,
    next_viewer_id: u32,
    tools: Vec<Box<dyn Tool>>,
    adapters: AdapterStore<()>,
    synchronize_on_execute: bool,
    active: bool,
}

impl Default for EditingDomain {
    fn default() -> Self {
        Self::new()
    }
}

impl EditingDomain {
    pub fn new() -> Self {
        Self::with_config(&CoreConfig::default())
    }

    pub fn with_config(config: &CoreConfig) -> Self {
        let mut adapters = AdapterStore::new();
        adapters.bind(());
        Self {
            history: OperationHistory::with_limit(config.history.undo_limit),
            viewers: BTreeMap::new(),
            next_viewer_id: 1,
            tools: Vec::new(),
            adapters,
            synchronize_on_execute: config.synchronize_on_execute,
            active: false,
        }
    }

    pub fn add_viewer(&mut self, mut viewer: Viewer) -> ViewerId {
        let id = ViewerId(self.next_viewer_id);
        self.next_viewer_id += 1;
        viewer.bind(id);
        self.viewers.insert(id, viewer);
        info!("event=viewer_add module=domain status=ok viewer={}", id);
        id
    }

    pub fn remove_viewer(&mut self, id: ViewerId) -> Option<Viewer> {
        let mut viewer = self.viewers.remove(&id)?;
        viewer.unbind();
        info!("event=viewer_remove module=domain status=ok viewer={}", id);
        Some(viewer)
    }

    pub fn viewer(&self, id: ViewerId) -> Option<&Viewer> {
        self.viewers.get(&id)
    }

    pub fn viewer_mut(&mut self, id: ViewerId) -> Option<&mut Viewer> {
        self.viewers.get_mut(&id)
    }

    pub fn viewer_ids(&self) -> Vec<ViewerId> {
        self.viewers.keys().copied().collect()
    }

    /// Registers a tool; it is activated at once when the domain is active.
    pub fn add_tool(&mut self, mut tool: impl Tool + 'static) {
        if self.active {
            tool.activate();
        }
        debug!(
            "event=tool_add module=domain status=ok tool={}",
            tool.name()
        );
        self.tools.push(Box::new(tool));
    }

    pub fn tool_names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    pub fn adapters(&self) -> &AdapterStore<()> {
        &self.adapters
    }

    pub fn adapters_mut(&mut self) -> &mut AdapterStore<()> {
        &mut self.adapters
    }

    pub fn history(&self) -> &OperationHistory {
        &self.history
    }

    pub fn context(&mut self) -> DomainContext<'_> {
        DomainContext {
            history: &mut self.history,
            viewers: &mut self.viewers,
            synchronize_on_execute: self.synchronize_on_execute,
        }
    }

    pub fn execute(&mut self, operation: Operation) -> Result<bool, CoreError> {
        self.context().execute(operation)
    }

    pub fn undo(&mut self) -> Result<bool, CoreError> {
        let undone = self.history.undo();
        if undone {
            refresh_viewers(&mut self.viewers, self.synchronize_on_execute)?;
        }
        Ok(undone)
    }

    pub fn redo(&mut self) -> Result<bool, CoreError> {
        let redone = self.history.redo();
        if redone {
            refresh_viewers(&mut self.viewers, self.synchronize_on_execute)?;
        }
        Ok(redone)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn activate(&mut self) {
        if self.active {
            return;
        }
        self.active = true;
        for tool in &mut self.tools {
            tool.activate();
        }
        info!(
            "event=domain_activate module=domain status=ok tools={}",
            self.tools.len()
        );
    }

    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        let mut cx = DomainContext {
            history: &mut self.history,
            viewers: &mut self.viewers,
            synchronize_on_execute: self.synchronize_on_execute,
        };
        for tool in &mut self.tools {
            tool.deactivate(&mut cx);
        }
        self.active = false;
        info!("event=domain_deactivate module=domain status=ok");
    }

    /// Routes `event` to every tool subscribed to its kind, in
    /// registration order. All subscribed tools see the event; the first
    /// error is returned.
    pub fn dispatch(&mut self, viewer: ViewerId, event: &InputEvent) -> Result<(), CoreError> {
        let kind = event.kind();
        if !self.active {
            debug!(
                "event=dispatch module=domain status=skipped kind={} reason=inactive",
                kind.as_str()
            );
            return Ok(());
        }
        if !self.viewers.contains_key(&viewer) {
            return Err(CoreError::ViewerNotFound(viewer));
        }

        let mut cx = DomainContext {
            history: &mut self.history,
            viewers: &mut self.viewers,
            synchronize_on_execute: self.synchronize_on_execute,
        };
        let mut first_error = None;
        for tool in self
            .tools
            .iter_mut()
            .filter(|tool| tool.subscriptions().contains(&kind))
        {
            if let Err(err) = tool.handle(&mut cx, viewer, event) {
                warn!(
                    "event=dispatch module=domain status=error tool={} kind={} error={}",
                    tool.name(),
                    kind.as_str(),
                    err
                );
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EditingDomain;
    use crate::config::{CoreConfig, HistoryConfig};
    use crate::content::{ContentModel, ContentPartFactory, ContentRef};
    use crate::error::CoreError;
    use crate::operation::{FnOperation, Operation};
    use crate::part::VisualPart;
    use crate::render::HeadlessRenderer;
    use crate::tool::{InputEvent, PointerEvent};
    use crate::viewer::{Viewer, ViewerId};
    use std::cell::Cell;
    use std::rc::Rc;

    struct EmptyModel;

    impl ContentModel for EmptyModel {
        fn children(&self, _content: &ContentRef) -> Vec<ContentRef> {
            Vec::new()
        }
    }

    impl ContentPartFactory for EmptyModel {
        fn create_content_part(&self, content: &ContentRef) -> VisualPart {
            VisualPart::content(content.clone())
        }
    }

    fn empty_viewer() -> Viewer {
        Viewer::new(HeadlessRenderer::new(), Rc::new(EmptyModel), Rc::new(EmptyModel))
    }

    fn counter_operation(label: &str, counter: &Rc<Cell<i32>>) -> Operation {
        let up = Rc::clone(counter);
        let down = Rc::clone(counter);
        Operation::primitive(
            label,
            FnOperation::new(
                move || {
                    up.set(up.get() + 1);
                    true
                },
                move || {
                    down.set(down.get() - 1);
                    true
                },
            ),
        )
    }

    #[test]
    fn viewer_ids_are_assigned_in_order() {
        let mut domain = EditingDomain::new();
        let first = domain.add_viewer(empty_viewer());
        let second = domain.add_viewer(empty_viewer());

        assert_eq!(first, ViewerId(1));
        assert_eq!(second, ViewerId(2));
        assert_eq!(domain.viewer(first).and_then(Viewer::id), Some(first));

        let removed = domain.remove_viewer(first).expect("viewer removed");
        assert!(removed.id().is_none());
        assert_eq!(domain.viewer_ids(), vec![second]);
    }

    #[test]
    fn execute_undo_redo_go_through_shared_history() {
        let mut domain = EditingDomain::new();
        domain.add_viewer(empty_viewer());
        let counter = Rc::new(Cell::new(0));

        assert!(domain.execute(counter_operation("Bump", &counter)).expect("execute"));
        assert_eq!(counter.get(), 1);
        assert_eq!(domain.history().undo_label(), Some("Bump"));

        assert!(domain.undo().expect("undo"));
        assert_eq!(counter.get(), 0);
        assert!(domain.redo().expect("redo"));
        assert_eq!(counter.get(), 1);
        assert!(!domain.redo().expect("nothing to redo"));
    }

    #[test]
    fn configured_undo_limit_applies() {
        let config = CoreConfig {
            history: HistoryConfig {
                undo_limit: Some(1),
            },
            ..CoreConfig::default()
        };
        let mut domain = EditingDomain::with_config(&config);
        let counter = Rc::new(Cell::new(0));

        domain.execute(counter_operation("First", &counter)).expect("first");
        domain.execute(counter_operation("Second", &counter)).expect("second");

        assert_eq!(domain.history().undo_len(), 1);
        assert_eq!(domain.history().undo_label(), Some("Second"));
    }

    #[test]
    fn dispatch_is_dropped_while_inactive() {
        let mut domain = EditingDomain::new();
        let viewer = domain.add_viewer(empty_viewer());

        domain
            .dispatch(viewer, &InputEvent::Press(PointerEvent::at(1.0, 1.0)))
            .expect("inactive dispatch is ignored");
        assert!(!domain.is_active());
    }

    #[test]
    fn dispatch_to_unknown_viewer_fails() {
        let mut domain = EditingDomain::new();
        domain.activate();

        let err = domain
            .dispatch(ViewerId(9), &InputEvent::Cancel)
            .expect_err("unknown viewer");
        assert!(matches!(err, CoreError::ViewerNotFound(ViewerId(9))));
    }
}
