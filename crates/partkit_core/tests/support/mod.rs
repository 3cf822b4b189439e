#![allow(dead_code)]

//! In-memory diagram model shared by the integration tests.

use partkit_core::policy::{
    AnchoredPartFactory, ClickPolicy, CloneOrFocusAndSelectOnClickPolicy, CreationPolicy,
    DragPolicy, FocusAndSelectOnClickPolicy, HoverOnHoverPolicy, HoverPolicy,
    TransformPolicy, TranslateOnDragPolicy,
};
use partkit_core::{
    shared, AffineTransform, ClickTool, ContentCloner, ContentContainer, ContentModel,
    ContentPartFactory, ContentRef, ContentTransform, CoreError, DragTool, EditingDomain,
    HeadlessRenderer, HoverTool, InputEvent, Modifiers, PartId, PartKind, Point, PointerEvent,
    Rect, Renderer, Shared, Viewer, ViewerId, VisualHandle, VisualPart,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub const SHAPE_SIZE: f64 = 10.0;

/// Diagram node: the diagram itself, a shape, or a connection.
pub struct Node {
    pub name: String,
    children: RefCell<Vec<ContentRef>>,
    transform: Cell<AffineTransform>,
    size: Cell<Option<(f64, f64)>>,
    anchors: RefCell<Vec<(ContentRef, String)>>,
}

impl Node {
    pub fn diagram(name: &str) -> Rc<Self> {
        Rc::new(Self {
            name: name.to_string(),
            children: RefCell::new(Vec::new()),
            transform: Cell::new(AffineTransform::identity()),
            size: Cell::new(None),
            anchors: RefCell::new(Vec::new()),
        })
    }

    /// Square shape of `SHAPE_SIZE` placed at `(x, y)`.
    pub fn shape(name: &str, x: f64, y: f64) -> Rc<Self> {
        let node = Self::diagram(name);
        node.transform.set(AffineTransform::translation(x, y));
        node.size.set(Some((SHAPE_SIZE, SHAPE_SIZE)));
        node
    }

    pub fn connection(name: &str, source: &Rc<Node>, target: &Rc<Node>) -> Rc<Self> {
        let node = Self::diagram(name);
        node.anchors.borrow_mut().extend([
            (content(source), "source".to_string()),
            (content(target), "target".to_string()),
        ]);
        node
    }

    pub fn children(&self) -> Vec<ContentRef> {
        self.children.borrow().clone()
    }

    pub fn set_children(&self, children: &[&Rc<Node>]) {
        *self.children.borrow_mut() = children.iter().map(|node| content(node)).collect();
    }

    pub fn push_child(&self, child: &Rc<Node>) {
        self.children.borrow_mut().push(content(child));
    }

    pub fn remove(&self, child: &Rc<Node>) {
        let child = content(child);
        self.children.borrow_mut().retain(|existing| *existing != child);
    }

    pub fn transform(&self) -> AffineTransform {
        self.transform.get()
    }

    pub fn position(&self) -> Point {
        self.transform.get().translation_part()
    }

    pub fn anchor_count(&self) -> usize {
        self.anchors.borrow().len()
    }
}

pub fn content(node: &Rc<Node>) -> ContentRef {
    ContentRef::new(Rc::clone(node))
}

/// Content accessors over [`Node`] trees.
#[derive(Debug, Default)]
pub struct DiagramModel {
    clones: Cell<usize>,
}

impl DiagramModel {
    pub fn clone_count(&self) -> usize {
        self.clones.get()
    }
}

impl ContentModel for DiagramModel {
    fn children(&self, content: &ContentRef) -> Vec<ContentRef> {
        content
            .downcast::<Node>()
            .map(|node| node.children())
            .unwrap_or_default()
    }

    fn anchorages(&self, content: &ContentRef) -> Vec<(ContentRef, String)> {
        content
            .downcast::<Node>()
            .map(|node| node.anchors.borrow().clone())
            .unwrap_or_default()
    }
}

impl ContentContainer for DiagramModel {
    fn insert_child(&self, parent: &ContentRef, index: usize, child: &ContentRef) -> bool {
        let Some(parent) = parent.downcast::<Node>() else {
            return false;
        };
        let mut children = parent.children.borrow_mut();
        if children.contains(child) {
            return false;
        }
        let index = index.min(children.len());
        children.insert(index, child.clone());
        true
    }

    fn remove_child(&self, parent: &ContentRef, child: &ContentRef) -> Option<usize> {
        let parent = parent.downcast::<Node>()?;
        let mut children = parent.children.borrow_mut();
        let index = children.iter().position(|existing| existing == child)?;
        children.remove(index);
        Some(index)
    }

    fn contains_child(&self, parent: &ContentRef, child: &ContentRef) -> bool {
        parent
            .downcast::<Node>()
            .is_some_and(|parent| parent.children.borrow().contains(child))
    }
}

impl ContentTransform for DiagramModel {
    fn transform(&self, content: &ContentRef) -> Option<AffineTransform> {
        content.downcast::<Node>().map(|node| node.transform.get())
    }

    fn set_transform(&self, content: &ContentRef, transform: AffineTransform) -> bool {
        let Some(node) = content.downcast::<Node>() else {
            return false;
        };
        node.transform.set(transform);
        true
    }
}

impl ContentCloner for DiagramModel {
    fn clone_content(&self, content: &ContentRef) -> Option<ContentRef> {
        let node = content.downcast::<Node>()?;
        self.clones.set(self.clones.get() + 1);
        let copy = Node::diagram(&format!("{} copy", node.name));
        copy.size.set(node.size.get());
        Some(content_of(copy))
    }
}

fn content_of(node: Rc<Node>) -> ContentRef {
    ContentRef::new(node)
}

/// One square handle per hovered part.
pub struct HoverHandles;

impl AnchoredPartFactory for HoverHandles {
    fn create_anchored_parts(&self, _viewer: &Viewer, _target: PartId) -> Vec<VisualPart> {
        vec![VisualPart::handle()]
    }
}

/// Installs transform, drag, click and hover policies on content parts.
pub struct DiagramPartFactory {
    model: Rc<DiagramModel>,
}

impl DiagramPartFactory {
    pub fn new(model: Rc<DiagramModel>) -> Self {
        Self { model }
    }
}

impl ContentPartFactory for DiagramPartFactory {
    fn create_content_part(&self, content: &ContentRef) -> VisualPart {
        let transforms: Rc<dyn ContentTransform> = self.model.clone();
        let cloner: Rc<dyn ContentCloner> = self.model.clone();
        let drag: Shared<dyn DragPolicy> = shared(TranslateOnDragPolicy::new());
        let click: Shared<dyn ClickPolicy> = shared(CloneOrFocusAndSelectOnClickPolicy::new(
            cloner,
            Rc::clone(&transforms),
        ));
        let hover: Shared<dyn HoverPolicy> =
            shared(HoverOnHoverPolicy::with_handles(Rc::new(HoverHandles)));
        VisualPart::content(content.clone())
            .with_adapter(shared(TransformPolicy::new(transforms)))
            .with_adapter(drag)
            .with_adapter(click)
            .with_adapter(hover)
    }
}

/// Headless renderer that mirrors node geometry into visuals on refresh.
pub struct DiagramRenderer {
    inner: HeadlessRenderer,
}

impl DiagramRenderer {
    pub fn new(inner: HeadlessRenderer) -> Self {
        Self { inner }
    }
}

impl Renderer for DiagramRenderer {
    fn create_visual(&mut self, part: PartId, kind: PartKind) -> VisualHandle {
        self.inner.create_visual(part, kind)
    }

    fn dispose_visual(&mut self, visual: VisualHandle) {
        self.inner.dispose_visual(visual);
    }

    fn insert_visual_child(&mut self, parent: VisualHandle, index: usize, child: VisualHandle) {
        self.inner.insert_visual_child(parent, index, child);
    }

    fn remove_visual_child(&mut self, parent: VisualHandle, child: VisualHandle) {
        self.inner.remove_visual_child(parent, child);
    }

    fn refresh_visual(&mut self, visual: VisualHandle, content: Option<&ContentRef>) {
        self.inner.refresh_visual(visual, content);
        let Some(node) = content.and_then(ContentRef::downcast::<Node>) else {
            return;
        };
        self.inner.set_visual_transform(visual, &node.transform.get());
        if let Some((width, height)) = node.size.get() {
            self.inner
                .set_bounds(visual, Rect::new(0.0, 0.0, width, height));
        }
    }

    fn attach_to_anchorage_visual(
        &mut self,
        anchored: VisualHandle,
        anchorage: VisualHandle,
        role: &str,
    ) {
        self.inner
            .attach_to_anchorage_visual(anchored, anchorage, role);
    }

    fn detach_from_anchorage_visual(
        &mut self,
        anchored: VisualHandle,
        anchorage: VisualHandle,
        role: &str,
    ) {
        self.inner
            .detach_from_anchorage_visual(anchored, anchorage, role);
    }

    fn set_visual_transform(&mut self, visual: VisualHandle, transform: &AffineTransform) {
        self.inner.set_visual_transform(visual, transform);
    }

    fn local_to_scene(&self, visual: VisualHandle) -> AffineTransform {
        self.inner.local_to_scene(visual)
    }

    fn nodes_at(&self, point: Point) -> Vec<VisualHandle> {
        self.inner.nodes_at(point)
    }
}

/// A domain with one viewer over a diagram, plus the default tools.
pub struct Fixture {
    pub domain: EditingDomain,
    pub viewer: ViewerId,
    pub renderer: HeadlessRenderer,
    pub model: Rc<DiagramModel>,
    pub diagram: Rc<Node>,
}

impl Fixture {
    pub fn new(shapes: &[&Rc<Node>]) -> Self {
        let diagram = Node::diagram("diagram");
        diagram.set_children(shapes);
        let model = Rc::new(DiagramModel::default());
        let renderer = HeadlessRenderer::new();
        let mut viewer = diagram_viewer(&model, &renderer);
        viewer
            .set_root_content(Some(content(&diagram)))
            .expect("initial synchronization");

        let mut domain = EditingDomain::new();
        let viewer = domain.add_viewer(viewer);
        domain.add_tool(ClickTool::new());
        domain.add_tool(DragTool::new());
        domain.add_tool(HoverTool::new());
        domain.activate();

        Self {
            domain,
            viewer,
            renderer,
            model,
            diagram,
        }
    }

    pub fn viewer(&self) -> &Viewer {
        self.domain.viewer(self.viewer).expect("fixture viewer")
    }

    pub fn viewer_mut(&mut self) -> &mut Viewer {
        self.domain.viewer_mut(self.viewer).expect("fixture viewer")
    }

    pub fn part_of(&self, node: &Rc<Node>) -> PartId {
        self.viewer()
            .content_part(&content(node))
            .expect("node has a live part")
    }

    pub fn dispatch(&mut self, event: InputEvent) -> Result<(), CoreError> {
        self.domain.dispatch(self.viewer, &event)
    }

    pub fn press(&mut self, x: f64, y: f64) -> Result<(), CoreError> {
        self.dispatch(InputEvent::Press(PointerEvent::at(x, y)))
    }

    pub fn press_with(&mut self, x: f64, y: f64, modifiers: Modifiers) -> Result<(), CoreError> {
        self.dispatch(InputEvent::Press(
            PointerEvent::at(x, y).with_modifiers(modifiers),
        ))
    }

    pub fn drag(&mut self, x: f64, y: f64) -> Result<(), CoreError> {
        self.dispatch(InputEvent::Drag(PointerEvent::at(x, y)))
    }

    pub fn release(&mut self, x: f64, y: f64) -> Result<(), CoreError> {
        self.dispatch(InputEvent::Release(PointerEvent::at(x, y)))
    }

    pub fn hover(&mut self, x: f64, y: f64) -> Result<(), CoreError> {
        self.dispatch(InputEvent::Move(PointerEvent::at(x, y)))
    }

    pub fn cancel(&mut self) -> Result<(), CoreError> {
        self.dispatch(InputEvent::Cancel)
    }

    /// Scene-space translation currently shown by the visual of `node`.
    pub fn visual_position(&self, node: &Rc<Node>) -> Point {
        let part = self.part_of(node);
        let visual = self
            .viewer()
            .part(part)
            .and_then(VisualPart::visual)
            .expect("part has a visual");
        self.renderer
            .visual(visual)
            .expect("visual is live")
            .transform
            .translation_part()
    }
}

/// Viewer over `model` with creation, selection and hover policies on the
/// root part.
pub fn diagram_viewer(model: &Rc<DiagramModel>, renderer: &HeadlessRenderer) -> Viewer {
    let content_model: Rc<dyn ContentModel> = model.clone();
    let factory: Rc<dyn ContentPartFactory> = Rc::new(DiagramPartFactory::new(Rc::clone(model)));
    let mut viewer = Viewer::new(DiagramRenderer::new(renderer.clone()), content_model, factory);

    let container: Rc<dyn ContentContainer> = model.clone();
    let click: Shared<dyn ClickPolicy> = shared(FocusAndSelectOnClickPolicy::new());
    let hover: Shared<dyn HoverPolicy> = shared(HoverOnHoverPolicy::new());
    let root = viewer.root();
    let adapters = viewer
        .part_mut(root)
        .expect("root part")
        .adapters_mut();
    adapters.set_adapter(shared(CreationPolicy::new(container)));
    adapters.set_adapter(click);
    adapters.set_adapter(hover);
    viewer
}
