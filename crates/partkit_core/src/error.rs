//! Crate-wide error umbrella.
//!
//! # Responsibility
//! - Unify module errors for tools, policies and the editing domain.
//!
//! # Invariants
//! - Every variant wraps a module error or names the missing handle;
//!   `source()` always reaches the module error.

use crate::adapter::AdapterError;
use crate::geometry::GeometryError;
use crate::part::PartError;
use crate::policy::ProtocolViolation;
use crate::sync::SyncError;
use crate::viewer::{IntegrityError, ViewerId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    Adapter(AdapterError),
    Part(PartError),
    Sync(SyncError),
    Protocol(ProtocolViolation),
    Geometry(GeometryError),
    Integrity(IntegrityError),
    ViewerNotFound(ViewerId),
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Adapter(err) => write!(f, "{err}"),
            Self::Part(err) => write!(f, "{err}"),
            Self::Sync(err) => write!(f, "{err}"),
            Self::Protocol(err) => write!(f, "{err}"),
            Self::Geometry(err) => write!(f, "{err}"),
            Self::Integrity(err) => write!(f, "{err}"),
            Self::ViewerNotFound(id) => write!(f, "viewer not found: {id}"),
        }
    }
}

impl Error for CoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Adapter(err) => Some(err),
            Self::Part(err) => Some(err),
            Self::Sync(err) => Some(err),
            Self::Protocol(err) => Some(err),
            Self::Geometry(err) => Some(err),
            Self::Integrity(err) => Some(err),
            Self::ViewerNotFound(_) => None,
        }
    }
}

impl From<AdapterError> for CoreError {
    fn from(value: AdapterError) -> Self {
        Self::Adapter(value)
    }
}

impl From<PartError> for CoreError {
    fn from(value: PartError) -> Self {
        Self::Part(value)
    }
}

impl From<SyncError> for CoreError {
    fn from(value: SyncError) -> Self {
        Self::Sync(value)
    }
}

impl From<ProtocolViolation> for CoreError {
    fn from(value: ProtocolViolation) -> Self {
        Self::Protocol(value)
    }
}

impl From<GeometryError> for CoreError {
    fn from(value: GeometryError) -> Self {
        Self::Geometry(value)
    }
}

impl From<IntegrityError> for CoreError {
    fn from(value: IntegrityError) -> Self {
        Self::Integrity(value)
    }
}
