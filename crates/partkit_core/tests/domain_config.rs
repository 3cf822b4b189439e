mod support;

use partkit_core::policy::{CommitMode, CreationPolicy};
use partkit_core::{
    ContentContainer, CoreConfig, EditingDomain, HeadlessRenderer, ViewerId,
};
use std::rc::Rc;
use support::{content, diagram_viewer, DiagramModel, Node};

fn create_operation(
    model: &Rc<DiagramModel>,
    diagram: &Rc<Node>,
    child: &Rc<Node>,
) -> partkit_core::Operation {
    let container: Rc<dyn ContentContainer> = model.clone();
    let mut creation = CreationPolicy::new(container);
    creation.init().expect("init");
    creation
        .create(content(diagram), 0, content(child))
        .expect("create");
    creation
        .commit(CommitMode::Apply)
        .expect("commit")
        .expect("operation")
}

fn domain_with(config: &CoreConfig) -> (EditingDomain, ViewerId, Rc<DiagramModel>, Rc<Node>) {
    let model = Rc::new(DiagramModel::default());
    let diagram = Node::diagram("diagram");
    let mut viewer = diagram_viewer(&model, &HeadlessRenderer::new());
    viewer
        .set_root_content(Some(content(&diagram)))
        .expect("initial synchronization");
    let mut domain = EditingDomain::with_config(config);
    let viewer = domain.add_viewer(viewer);
    (domain, viewer, model, diagram)
}

#[test]
fn execute_resynchronizes_viewers_by_default() {
    let config = CoreConfig::from_json_str("{}").expect("default config");
    let (mut domain, viewer, model, diagram) = domain_with(&config);
    let a = Node::shape("A", 0.0, 0.0);

    domain
        .execute(create_operation(&model, &diagram, &a))
        .expect("execute");

    let viewer = domain.viewer(viewer).expect("viewer");
    assert!(viewer.content_part(&content(&a)).is_some());
}

#[test]
fn disabled_resynchronization_leaves_viewers_stale_until_asked() {
    let config = CoreConfig::from_json_str(r#"{ "synchronize_on_execute": false }"#)
        .expect("config");
    let (mut domain, viewer, model, diagram) = domain_with(&config);
    let a = Node::shape("A", 0.0, 0.0);

    domain
        .execute(create_operation(&model, &diagram, &a))
        .expect("execute");
    assert!(domain
        .viewer(viewer)
        .expect("viewer")
        .content_part(&content(&a))
        .is_none());

    let stats = domain
        .viewer_mut(viewer)
        .expect("viewer")
        .synchronize()
        .expect("synchronize");
    assert_eq!(stats.created, 1);
}

#[test]
fn unknown_config_keys_are_rejected() {
    let err = CoreConfig::from_json_str(r#"{ "undo": 3 }"#).expect_err("unknown key");

    assert!(err.to_string().contains("undo"));
}
