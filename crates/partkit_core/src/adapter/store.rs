//! Typed adapter store keyed by capability type and role.

use log::{debug, warn};
use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

/// Role used when the caller does not name one.
pub const DEFAULT_ROLE: &str = "default";

/// Single-threaded shared handle used for every adapter instance.
pub type Shared<T> = Rc<RefCell<T>>;

/// Wraps a value into a [`Shared`] handle.
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// Attachment hooks for adapters.
///
/// Both hooks default to no-ops, so plain models only need an empty impl.
pub trait Adapter<H> {
    /// Called when the adapter becomes reachable from `host`.
    fn adaptable_attached(&mut self, _host: H) {}
    /// Called when the adapter is removed from `host`.
    fn adaptable_detached(&mut self, _host: H) {}
}

/// Adapter store errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// Role-less lookup matched more than one role.
    Ambiguous {
        type_name: &'static str,
        roles: Vec<String>,
    },
    /// Unique registration found a different instance in the slot.
    Conflict {
        type_name: &'static str,
        role: String,
    },
}

impl Display for AdapterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ambiguous { type_name, roles } => write!(
                f,
                "adapter lookup for `{type_name}` is ambiguous; registered roles: {}",
                roles.join(", ")
            ),
            Self::Conflict { type_name, role } => write!(
                f,
                "adapter slot `{type_name}` role `{role}` is already occupied"
            ),
        }
    }
}

impl Error for AdapterError {}

trait ErasedAdapter<H> {
    fn attached(&self, host: H);
    fn detached(&self, host: H);
    fn as_any(&self) -> &dyn Any;
    fn address(&self) -> *const ();
}

impl<H, T> ErasedAdapter<H> for Shared<T>
where
    T: ?Sized + Adapter<H> + 'static,
{
    fn attached(&self, host: H) {
        match self.try_borrow_mut() {
            Ok(mut adapter) => adapter.adaptable_attached(host),
            Err(_) => warn!(
                "event=adapter_attach module=adapter status=skipped reason=busy type={}",
                type_name::<T>()
            ),
        }
    }

    fn detached(&self, host: H) {
        match self.try_borrow_mut() {
            Ok(mut adapter) => adapter.adaptable_detached(host),
            Err(_) => warn!(
                "event=adapter_detach module=adapter status=skipped reason=busy type={}",
                type_name::<T>()
            ),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn address(&self) -> *const () {
        Rc::as_ptr(self) as *const ()
    }
}

struct Slot<H> {
    type_name: &'static str,
    roles: BTreeMap<String, Box<dyn ErasedAdapter<H>>>,
}

/// Per-host adapter registry.
///
/// A store starts unbound (no host); [`AdapterStore::bind`] attaches every
/// registered adapter at once. Adapters set on a bound store are attached
/// immediately.
pub struct AdapterStore<H> {
    host: Option<H>,
    slots: HashMap<TypeId, Slot<H>>,
}

impl<H> Default for AdapterStore<H> {
    fn default() -> Self {
        Self {
            host: None,
            slots: HashMap::new(),
        }
    }
}

impl<H: Debug> Debug for AdapterStore<H> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<(&'static str, &str)> = self
            .slots
            .values()
            .flat_map(|slot| slot.roles.keys().map(|role| (slot.type_name, role.as_str())))
            .collect();
        keys.sort_unstable();
        f.debug_struct("AdapterStore")
            .field("host", &self.host)
            .field("adapters", &keys)
            .finish()
    }
}

impl<H: Copy + Debug + 'static> AdapterStore<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(&self) -> Option<H> {
        self.host
    }

    /// Binds the store to `host` and attaches every registered adapter.
    ///
    /// Rebinding first detaches all adapters from the previous host.
    pub fn bind(&mut self, host: H) {
        if self.host.is_some() {
            self.unbind();
        }
        self.host = Some(host);
        for adapter in self.slots.values().flat_map(|slot| slot.roles.values()) {
            adapter.attached(host);
        }
    }

    /// Detaches every adapter from the current host, keeping registrations.
    pub fn unbind(&mut self) {
        let Some(host) = self.host.take() else {
            return;
        };
        for adapter in self.slots.values().flat_map(|slot| slot.roles.values()) {
            adapter.detached(host);
        }
    }

    /// Detaches and drops every adapter.
    pub fn clear(&mut self) {
        if let Some(host) = self.host {
            for adapter in self.slots.values().flat_map(|slot| slot.roles.values()) {
                adapter.detached(host);
            }
        }
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.values().map(|slot| slot.roles.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registers `adapter` under [`DEFAULT_ROLE`].
    pub fn set_adapter<T>(&mut self, adapter: Shared<T>) -> Option<Shared<T>>
    where
        T: ?Sized + Adapter<H> + 'static,
    {
        self.set_adapter_with_role(DEFAULT_ROLE, adapter)
    }

    /// Registers `adapter` under `role`, last write wins.
    ///
    /// Replacing a different instance detaches it, logs an
    /// `adapter_replaced` diagnostic and returns it. Registering the
    /// instance already held at `(T, role)` changes nothing and notifies
    /// nobody.
    pub fn set_adapter_with_role<T>(
        &mut self,
        role: impl Into<String>,
        adapter: Shared<T>,
    ) -> Option<Shared<T>>
    where
        T: ?Sized + Adapter<H> + 'static,
    {
        let role = role.into();
        if self.holds(&role, &adapter) {
            return Some(adapter);
        }
        let previous = self.take_slot_entry::<T>(&role);
        if previous.is_some() {
            warn!(
                "event=adapter_replaced module=adapter status=ok type={} role={}",
                type_name::<T>(),
                role
            );
        }
        self.insert_entry::<T>(role, adapter);
        previous
    }

    /// Registers `adapter` under `role` only when the slot is free or
    /// already holds the same instance.
    pub fn try_set_unique_adapter<T>(
        &mut self,
        role: impl Into<String>,
        adapter: Shared<T>,
    ) -> Result<(), AdapterError>
    where
        T: ?Sized + Adapter<H> + 'static,
    {
        let role = role.into();
        match self.get_adapter_with_role::<T>(&role) {
            Some(existing) if Rc::ptr_eq(&existing, &adapter) => Ok(()),
            Some(_) => Err(AdapterError::Conflict {
                type_name: type_name::<T>(),
                role,
            }),
            None => {
                self.insert_entry::<T>(role, adapter);
                Ok(())
            }
        }
    }

    /// Returns the adapter of type `T` when exactly one role is registered.
    ///
    /// # Errors
    /// - `AdapterError::Ambiguous` when more than one role is registered.
    pub fn get_adapter<T>(&self) -> Result<Option<Shared<T>>, AdapterError>
    where
        T: ?Sized + 'static,
    {
        let Some(slot) = self.slots.get(&TypeId::of::<T>()) else {
            return Ok(None);
        };
        if slot.roles.len() > 1 {
            return Err(AdapterError::Ambiguous {
                type_name: slot.type_name,
                roles: slot.roles.keys().cloned().collect(),
            });
        }
        Ok(slot.roles.values().next().and_then(|entry| downcast::<H, T>(entry.as_ref())))
    }

    pub fn get_adapter_with_role<T>(&self, role: &str) -> Option<Shared<T>>
    where
        T: ?Sized + 'static,
    {
        self.slots
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.roles.get(role))
            .and_then(|entry| downcast::<H, T>(entry.as_ref()))
    }

    /// Returns every adapter of type `T`, keyed by role.
    pub fn get_adapters<T>(&self) -> BTreeMap<String, Shared<T>>
    where
        T: ?Sized + 'static,
    {
        let Some(slot) = self.slots.get(&TypeId::of::<T>()) else {
            return BTreeMap::new();
        };
        slot.roles
            .iter()
            .filter_map(|(role, entry)| {
                downcast::<H, T>(entry.as_ref()).map(|adapter| (role.clone(), adapter))
            })
            .collect()
    }

    /// Removes and detaches the adapter at `(T, role)`.
    pub fn unset_adapter<T>(&mut self, role: &str) -> Option<Shared<T>>
    where
        T: ?Sized + Adapter<H> + 'static,
    {
        self.take_slot_entry::<T>(role)
    }

    fn take_slot_entry<T>(&mut self, role: &str) -> Option<Shared<T>>
    where
        T: ?Sized + Adapter<H> + 'static,
    {
        let type_id = TypeId::of::<T>();
        let slot = self.slots.get_mut(&type_id)?;
        let entry = slot.roles.remove(role)?;
        if slot.roles.is_empty() {
            self.slots.remove(&type_id);
        }
        if let Some(host) = self.host {
            entry.detached(host);
        }
        debug!(
            "event=adapter_unset module=adapter status=ok type={} role={}",
            type_name::<T>(),
            role
        );
        downcast::<H, T>(entry.as_ref())
    }

    fn insert_entry<T>(&mut self, role: String, adapter: Shared<T>)
    where
        T: ?Sized + Adapter<H> + 'static,
    {
        let entry: Box<dyn ErasedAdapter<H>> = Box::new(adapter);
        if let Some(host) = self.host {
            entry.attached(host);
        }
        self.slots
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Slot {
                type_name: type_name::<T>(),
                roles: BTreeMap::new(),
            })
            .roles
            .insert(role, entry);
    }

    /// Returns whether `adapter` is the exact instance registered at
    /// `(T, role)`.
    pub fn holds<T>(&self, role: &str, adapter: &Shared<T>) -> bool
    where
        T: ?Sized + 'static,
    {
        self.slots
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.roles.get(role))
            .is_some_and(|entry| entry.address() == Rc::as_ptr(adapter) as *const ())
    }
}

fn downcast<H, T>(entry: &dyn ErasedAdapter<H>) -> Option<Shared<T>>
where
    T: ?Sized + 'static,
{
    entry.as_any().downcast_ref::<Shared<T>>().cloned()
}
