//! Capability registry attached to parts, viewers and the editing domain.
//!
//! # Responsibility
//! - Map `(capability type, role)` keys to shared adapter instances.
//! - Notify adapters when they are attached to or detached from a host.
//!
//! # Invariants
//! - At most one adapter per exact `(type, role)` key.
//! - A role-less lookup with more than one registered role is ambiguous and
//!   is reported, never resolved by picking one.

mod store;

pub use store::{shared, Adapter, AdapterError, AdapterStore, Shared, DEFAULT_ROLE};
