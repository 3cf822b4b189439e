//! Visual part family and the arena that owns it.
//!
//! # Responsibility
//! - Define `VisualPart` (Root / Content / Feedback / Handle).
//! - Keep the parent/child tree and its mirrored visual child lists.
//! - Keep the anchorage relation between parts symmetric.
//!
//! # Invariants
//! - A part has at most one parent; the parent exclusively owns it.
//! - Anchorage edges never affect lifetime.
//! - Every edge is stored on both sides or on neither.

mod anchorage;
mod tree;
mod visual_part;

pub use anchorage::{AnchorageEdge, AnchorageGraph};
pub use tree::{DisposedPart, PartError, PartTree};
pub use visual_part::{PartId, PartKind, VisualPart};
