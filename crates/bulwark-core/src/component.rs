//! Behavior components and the per-object component table.
//!
//! A [`Component`] is a behavior module owned by exactly one game object. The
//! object keeps its components in a [`ComponentTable`]: insertion-ordered, at
//! most one instance per Rust type, looked up by [`TypeId`].
//!
//! While a lifecycle hook runs, the world temporarily lifts that component out
//! of its slot so the hook can hold `&mut self` and a mutable
//! [`ObjectContext`] at the same time. Sibling lookups during the hook see
//! every other component normally; looking up the running component's own
//! type yields `None`.

use std::any::{Any, TypeId};

use crate::world::ObjectContext;

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// Upcast helper implemented for every `'static` type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Lifecycle hooks for a behavior attached to a game object.
///
/// All hooks default to no-ops.
pub trait Component: AsAny {
    /// Runs every time the owner is registered (including re-registration of
    /// a recycled object).
    fn create(&mut self, _ctx: &mut ObjectContext<'_>) {}

    /// Runs each frame before any [`update`](Self::update) of the same object.
    fn early_update(&mut self, _ctx: &mut ObjectContext<'_>) {}

    /// Runs each frame while the owner is live.
    fn update(&mut self, _ctx: &mut ObjectContext<'_>) {}

    /// Runs once when the owner is disposed.
    fn dispose(&mut self, _ctx: &mut ObjectContext<'_>) {}
}

// ---------------------------------------------------------------------------
// ComponentTable
// ---------------------------------------------------------------------------

struct ComponentSlot {
    type_id: TypeId,
    name: &'static str,
    component: Option<Box<dyn Component>>,
}

/// Insertion-ordered, type-keyed component storage.
#[derive(Default)]
pub struct ComponentTable {
    slots: Vec<ComponentSlot>,
}

impl ComponentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component. Returns the component back if one of the same type is
    /// already present.
    pub fn insert<C: Component>(&mut self, component: C) -> Result<(), C> {
        if self.contains::<C>() {
            return Err(component);
        }
        self.slots.push(ComponentSlot {
            type_id: TypeId::of::<C>(),
            name: std::any::type_name::<C>(),
            component: Some(Box::new(component)),
        });
        Ok(())
    }

    /// Add an already-boxed component keyed by `type_id`.
    pub(crate) fn insert_boxed(
        &mut self,
        type_id: TypeId,
        name: &'static str,
        component: Box<dyn Component>,
    ) -> bool {
        if self.slots.iter().any(|s| s.type_id == type_id) {
            return false;
        }
        self.slots.push(ComponentSlot {
            type_id,
            name,
            component: Some(component),
        });
        true
    }

    pub fn contains<C: Component>(&self) -> bool {
        self.slots.iter().any(|s| s.type_id == TypeId::of::<C>())
    }

    pub fn get<C: Component>(&self) -> Option<&C> {
        self.slots
            .iter()
            .find(|s| s.type_id == TypeId::of::<C>())
            .and_then(|s| s.component.as_deref())
            .and_then(|c| c.as_any().downcast_ref::<C>())
    }

    pub fn get_mut<C: Component>(&mut self) -> Option<&mut C> {
        self.slots
            .iter_mut()
            .find(|s| s.type_id == TypeId::of::<C>())
            .and_then(|s| s.component.as_deref_mut())
            .and_then(|c| c.as_any_mut().downcast_mut::<C>())
    }

    /// Number of component slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Type names of the stored components, in insertion order.
    pub fn names(&self) -> Vec<&'static str> {
        self.slots.iter().map(|s| s.name).collect()
    }

    /// Lift the component at `index` out of its slot.
    pub(crate) fn take(&mut self, index: usize) -> Option<Box<dyn Component>> {
        self.slots.get_mut(index).and_then(|s| s.component.take())
    }

    /// Put a lifted component back into its slot.
    pub(crate) fn restore(&mut self, index: usize, component: Box<dyn Component>) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.component = Some(component);
        }
    }
}

impl std::fmt::Debug for ComponentTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
