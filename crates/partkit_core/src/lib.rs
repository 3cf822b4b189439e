//! Toolkit-agnostic core of a graphical editor.
//!
//! Content objects are mirrored into a tree of visual parts that carry
//! policies as typed adapters. Tools route input to those policies, and
//! every model change flows through one undoable operation history.

pub mod adapter;
pub mod config;
pub mod content;
pub mod domain;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod operation;
pub mod part;
pub mod policy;
pub mod render;
pub mod sync;
pub mod tool;
pub mod viewer;

pub use adapter::{shared, Adapter, AdapterError, AdapterStore, Shared, DEFAULT_ROLE};
pub use config::{ConfigError, CoreConfig, HistoryConfig, LoggingConfig};
pub use content::{
    ContentCloner, ContentContainer, ContentModel, ContentPartFactory, ContentRef,
    ContentTransform,
};
pub use domain::{DomainContext, EditingDomain};
pub use error::{CoreError, CoreResult};
pub use geometry::{AffineTransform, GeometryError, Point, Rect};
pub use logging::{default_log_level, init_logging, logging_status};
pub use operation::{FnOperation, Operation, OperationBuilder, OperationHistory, UndoableOperation};
pub use part::{AnchorageGraph, DisposedPart, PartError, PartId, PartKind, PartTree, VisualPart};
pub use render::{HeadlessRenderer, HeadlessVisual, Renderer, VisualHandle};
pub use sync::{SyncError, SyncStats};
pub use tool::{
    ClickTool, DragTool, EventKind, HoverTool, InputEvent, Modifiers, PointerButton,
    PointerEvent, Tool,
};
pub use viewer::{FocusModel, HoverModel, IntegrityError, SelectionModel, Viewer, ViewerId};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
