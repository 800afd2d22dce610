//! Game objects and their builder.

use std::any::TypeId;
use std::collections::BTreeSet;

use crate::body::Body;
use crate::component::{Component, ComponentTable};
use crate::event::EventBus;
use crate::id::ObjectId;
use crate::math::Vec2;

// ---------------------------------------------------------------------------
// ObjectState
// ---------------------------------------------------------------------------

/// Where an object sits in the registry lifecycle.
///
/// Disposed objects have no state: they are removed from the world entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectState {
    /// Created or obtained from a pool, not ticking yet.
    Unregistered,
    /// In the live list, ticking every frame.
    Live,
    /// Parked in exactly one pool, inert.
    Pooled,
    /// Teardown in progress.
    Disposing,
}

// ---------------------------------------------------------------------------
// GameObject
// ---------------------------------------------------------------------------

/// An identity with a transform, components, an optional body and an event bus.
#[derive(Debug)]
pub struct GameObject {
    id: ObjectId,
    name: String,
    position: Vec2,
    scale: Vec2,
    tags: BTreeSet<String>,
    pool_key: Option<String>,
    body: Option<Body>,
    pub(crate) components: ComponentTable,
    pub(crate) events: EventBus,
    pub(crate) state: ObjectState,
    pub(crate) epoch: u32,
}

impl GameObject {
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vec2) {
        self.scale = scale;
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn add_tag(&mut self, tag: &str) {
        self.tags.insert(tag.to_owned());
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.tags.remove(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Pool this object returns to when despawned without an explicit key.
    pub fn pool_key(&self) -> Option<&str> {
        self.pool_key.as_deref()
    }

    pub fn set_pool_key(&mut self, key: Option<&str>) {
        self.pool_key = key.map(str::to_owned);
    }

    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    pub fn body_mut(&mut self) -> Option<&mut Body> {
        self.body.as_mut()
    }

    pub fn component<C: Component>(&self) -> Option<&C> {
        self.components.get::<C>()
    }

    pub fn component_mut<C: Component>(&mut self) -> Option<&mut C> {
        self.components.get_mut::<C>()
    }

    pub fn has_component<C: Component>(&self) -> bool {
        self.components.contains::<C>()
    }

    pub fn component_names(&self) -> Vec<&'static str> {
        self.components.names()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.events.listener_count(event)
    }

    pub fn state(&self) -> ObjectState {
        self.state
    }

    /// Number of times this object has been registered.
    pub fn epoch(&self) -> u32 {
        self.epoch
    }
}

// ---------------------------------------------------------------------------
// ObjectBuilder
// ---------------------------------------------------------------------------

/// Describes an object to be created with
/// [`World::create`](crate::world::World::create).
///
/// Components run their hooks in the order they were added.
#[derive(Default)]
pub struct ObjectBuilder {
    name: String,
    position: Vec2,
    scale: Option<Vec2>,
    tags: BTreeSet<String>,
    pool_key: Option<String>,
    body: Option<Body>,
    components: Vec<(TypeId, &'static str, Box<dyn Component>)>,
}

impl ObjectBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn scale(mut self, scale: Vec2) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tags.insert(tag.to_owned());
        self
    }

    pub fn pool_key(mut self, key: &str) -> Self {
        self.pool_key = Some(key.to_owned());
        self
    }

    pub fn body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    pub fn component<C: Component>(mut self, component: C) -> Self {
        self.components.push((
            TypeId::of::<C>(),
            std::any::type_name::<C>(),
            Box::new(component),
        ));
        self
    }

    /// Type name of the first component whose type was added twice.
    pub(crate) fn duplicate_component(&self) -> Option<&'static str> {
        self.components
            .iter()
            .enumerate()
            .find(|(i, (type_id, _, _))| {
                self.components[..*i].iter().any(|(t, _, _)| t == type_id)
            })
            .map(|(_, (_, name, _))| *name)
    }

    pub(crate) fn build(self, id: ObjectId) -> GameObject {
        let mut components = ComponentTable::new();
        for (type_id, name, component) in self.components {
            components.insert_boxed(type_id, name, component);
        }
        GameObject {
            id,
            name: self.name,
            position: self.position,
            scale: self.scale.unwrap_or(Vec2::ONE),
            tags: self.tags,
            pool_key: self.pool_key,
            body: self.body,
            components,
            events: EventBus::new(),
            state: ObjectState::Unregistered,
            epoch: 0,
        }
    }
}
