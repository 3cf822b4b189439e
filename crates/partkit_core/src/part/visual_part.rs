//! Visual part record.

use crate::adapter::{Adapter, AdapterStore, Shared};
use crate::content::ContentRef;
use crate::render::VisualHandle;
use std::fmt::{Display, Formatter};

/// Stable arena handle for one part. Never reused within a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartId(pub u32);

impl Display for PartId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Part family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PartKind {
    /// Single tree root owned by a viewer.
    Root,
    /// Represents one domain-model object.
    Content,
    /// Transient visual feedback for an interaction.
    Feedback,
    /// Interactive handle for manipulating another part.
    Handle,
}

impl PartKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Content => "content",
            Self::Feedback => "feedback",
            Self::Handle => "handle",
        }
    }

    /// Feedback and handle parts only live while anchored to something.
    pub fn is_ephemeral(self) -> bool {
        matches!(self, Self::Feedback | Self::Handle)
    }
}

/// One node of the visual tree.
///
/// Parts are created unbound by factories and become live when a
/// [`PartTree`](super::PartTree) adopts them.
#[derive(Debug)]
pub struct VisualPart {
    pub(crate) kind: PartKind,
    pub(crate) content: Option<ContentRef>,
    pub(crate) parent: Option<PartId>,
    pub(crate) children: Vec<PartId>,
    pub(crate) visual: Option<VisualHandle>,
    pub(crate) mirrored_children: Vec<(PartId, VisualHandle)>,
    pub(crate) refresh_visual: bool,
    pub(crate) adapters: AdapterStore<PartId>,
}

impl VisualPart {
    fn with_kind(kind: PartKind, content: Option<ContentRef>) -> Self {
        Self {
            kind,
            content,
            parent: None,
            children: Vec::new(),
            visual: None,
            mirrored_children: Vec::new(),
            refresh_visual: true,
            adapters: AdapterStore::new(),
        }
    }

    pub(crate) fn root() -> Self {
        Self::with_kind(PartKind::Root, None)
    }

    pub fn content(content: ContentRef) -> Self {
        Self::with_kind(PartKind::Content, Some(content))
    }

    pub fn feedback() -> Self {
        Self::with_kind(PartKind::Feedback, None)
    }

    pub fn handle() -> Self {
        Self::with_kind(PartKind::Handle, None)
    }

    /// Builder-style default-role adapter registration.
    pub fn with_adapter<T>(mut self, adapter: Shared<T>) -> Self
    where
        T: ?Sized + Adapter<PartId> + 'static,
    {
        self.adapters.set_adapter(adapter);
        self
    }

    /// Builder-style adapter registration under `role`.
    pub fn with_adapter_role<T>(mut self, role: &str, adapter: Shared<T>) -> Self
    where
        T: ?Sized + Adapter<PartId> + 'static,
    {
        self.adapters.set_adapter_with_role(role, adapter);
        self
    }

    pub fn kind(&self) -> PartKind {
        self.kind
    }

    /// Represented model object; `Some` only for Content parts.
    pub fn content_ref(&self) -> Option<&ContentRef> {
        self.content.as_ref()
    }

    pub fn parent(&self) -> Option<PartId> {
        self.parent
    }

    pub fn children(&self) -> &[PartId] {
        &self.children
    }

    pub fn visual(&self) -> Option<VisualHandle> {
        self.visual
    }

    pub fn is_refresh_visual(&self) -> bool {
        self.refresh_visual
    }

    pub fn adapters(&self) -> &AdapterStore<PartId> {
        &self.adapters
    }

    pub fn adapters_mut(&mut self) -> &mut AdapterStore<PartId> {
        &mut self.adapters
    }

    /// Child ids currently present in the visual child list.
    pub fn mirrored_children(&self) -> Vec<PartId> {
        self.mirrored_children.iter().map(|(id, _)| *id).collect()
    }
}
