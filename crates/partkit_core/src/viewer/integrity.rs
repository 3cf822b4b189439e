//! Structural consistency checks over one viewer.

use crate::content::ContentRef;
use crate::part::{PartId, PartKind, PartTree};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    /// An anchorage edge is recorded on one side only.
    DanglingAnchorage {
        anchored: PartId,
        anchorage: PartId,
        role: String,
    },
    /// The content map points at a missing part or one showing other content.
    StaleMapping { content: ContentRef, part: PartId },
    /// A live content part is missing from the content map.
    UnmappedContent { part: PartId },
    /// Two live content parts represent the same model object.
    DuplicateContent {
        content: ContentRef,
        parts: (PartId, PartId),
    },
    /// Visual children do not mirror the part's children.
    VisualOrderMismatch { part: PartId },
}

impl Display for IntegrityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DanglingAnchorage {
                anchored,
                anchorage,
                role,
            } => write!(
                f,
                "anchorage {anchored} -> {anchorage} ({role}) is recorded on one side only"
            ),
            Self::StaleMapping { content, part } => {
                write!(f, "content {content:?} maps to stale part {part}")
            }
            Self::UnmappedContent { part } => {
                write!(f, "content part {part} is missing from the content map")
            }
            Self::DuplicateContent { content, parts } => write!(
                f,
                "content {content:?} is represented by both {} and {}",
                parts.0, parts.1
            ),
            Self::VisualOrderMismatch { part } => {
                write!(f, "visual children of {part} do not mirror its children")
            }
        }
    }
}

impl Error for IntegrityError {}

pub(crate) fn verify(
    tree: &PartTree,
    contents: &HashMap<ContentRef, PartId>,
) -> Result<(), IntegrityError> {
    if let Some((anchored, anchorage, role)) = tree.graph().dangling_edges().into_iter().next() {
        return Err(IntegrityError::DanglingAnchorage {
            anchored,
            anchorage,
            role,
        });
    }

    for (content, part) in contents {
        let represents = tree
            .part(*part)
            .and_then(|visual_part| visual_part.content_ref())
            .is_some_and(|shown| shown == content);
        if !represents {
            return Err(IntegrityError::StaleMapping {
                content: content.clone(),
                part: *part,
            });
        }
    }

    let mut seen: HashMap<ContentRef, PartId> = HashMap::new();
    for id in tree.ids() {
        let Some(part) = tree.part(id) else {
            continue;
        };
        if part.kind() == PartKind::Content {
            if let Some(content) = part.content_ref() {
                if let Some(other) = seen.insert(content.clone(), id) {
                    return Err(IntegrityError::DuplicateContent {
                        content: content.clone(),
                        parts: (other, id),
                    });
                }
                if contents.get(content) != Some(&id) {
                    return Err(IntegrityError::UnmappedContent { part: id });
                }
            }
        }

        if part.is_refresh_visual() {
            let expected: Vec<PartId> = part
                .children()
                .iter()
                .copied()
                .filter(|child| tree.part(*child).is_some_and(|c| c.visual().is_some()))
                .collect();
            if part.mirrored_children() != expected {
                return Err(IntegrityError::VisualOrderMismatch { part: id });
            }
        }
    }
    Ok(())
}
