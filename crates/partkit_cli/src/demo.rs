//! Minimal shape board used by the scripted session.

use partkit_core::policy::{
    ClickPolicy, DragPolicy, FocusAndSelectOnClickPolicy, SelectOnClickPolicy, TransformPolicy,
    TranslateOnDragPolicy,
};
use partkit_core::{
    shared, AffineTransform, ContentModel, ContentPartFactory, ContentRef, ContentTransform,
    HeadlessRenderer, PartId, PartKind, Point, Rect, Renderer, Shared, Viewer, VisualHandle,
    VisualPart,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub const SHAPE_SIZE: f64 = 20.0;

pub struct Shape {
    pub label: String,
    transform: Cell<AffineTransform>,
}

impl Shape {
    pub fn new(label: &str, x: f64, y: f64) -> Rc<Self> {
        Rc::new(Self {
            label: label.to_string(),
            transform: Cell::new(AffineTransform::translation(x, y)),
        })
    }

    pub fn position(&self) -> Point {
        self.transform.get().translation_part()
    }
}

/// Flat board: the root content lists shapes, shapes have no children.
#[derive(Default)]
pub struct Board {
    shapes: RefCell<Vec<ContentRef>>,
}

impl Board {
    pub fn add(&self, shape: &Rc<Shape>) {
        self.shapes.borrow_mut().push(ContentRef::new(Rc::clone(shape)));
    }
}

impl ContentModel for Board {
    fn children(&self, content: &ContentRef) -> Vec<ContentRef> {
        if content.downcast::<Board>().is_some() {
            return self.shapes.borrow().clone();
        }
        Vec::new()
    }
}

impl ContentTransform for Board {
    fn transform(&self, content: &ContentRef) -> Option<AffineTransform> {
        content.downcast::<Shape>().map(|shape| shape.transform.get())
    }

    fn set_transform(&self, content: &ContentRef, transform: AffineTransform) -> bool {
        let Some(shape) = content.downcast::<Shape>() else {
            return false;
        };
        shape.transform.set(transform);
        true
    }
}

pub struct ShapeParts {
    board: Rc<Board>,
}

impl ContentPartFactory for ShapeParts {
    fn create_content_part(&self, content: &ContentRef) -> VisualPart {
        let transforms: Rc<dyn ContentTransform> = self.board.clone();
        let drag: Shared<dyn DragPolicy> = shared(TranslateOnDragPolicy::new());
        let click: Shared<dyn ClickPolicy> = shared(FocusAndSelectOnClickPolicy::new());
        VisualPart::content(content.clone())
            .with_adapter(shared(TransformPolicy::new(transforms)))
            .with_adapter(drag)
            .with_adapter(click)
    }
}

/// Applies shape placement and a fixed square hit area on refresh.
pub struct BoardRenderer {
    inner: HeadlessRenderer,
}

impl Renderer for BoardRenderer {
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
        if let Some(shape) = content.and_then(ContentRef::downcast::<Shape>) {
            self.inner.set_visual_transform(visual, &shape.transform.get());
            self.inner
                .set_bounds(visual, Rect::new(0.0, 0.0, SHAPE_SIZE, SHAPE_SIZE));
        }
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

/// Viewer over `board`; clicking the background clears the selection.
pub fn board_viewer(board: &Rc<Board>) -> Viewer {
    let model: Rc<dyn ContentModel> = board.clone();
    let factory: Rc<dyn ContentPartFactory> = Rc::new(ShapeParts {
        board: Rc::clone(board),
    });
    let renderer = BoardRenderer {
        inner: HeadlessRenderer::new(),
    };
    let mut viewer = Viewer::new(renderer, model, factory);
    let root = viewer.root();
    if let Some(root_part) = viewer.part_mut(root) {
        let click: Shared<dyn ClickPolicy> = shared(SelectOnClickPolicy::new());
        root_part.adapters_mut().set_adapter(click);
    }
    viewer
}
