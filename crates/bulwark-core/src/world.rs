//! The object registry: lifecycle, per-frame iteration, pooling, and the
//! deferred command queue.
//!
//! # Lifecycle
//!
//! ```text
//!            create()               register()                despawn(key)
//!  builder ───────────► Unregistered ─────────► Live ─────────────────────► Pooled
//!                           ▲                    │  ▲                          │
//!                           │    unregister()    │  └──── register() ──────────┤
//!                           └────────────────────┘                             │
//!                                                         obtain(key) ◄────────┘
//!  dispose() from any state removes the object and releases its id.
//! ```
//!
//! # Frame
//!
//! [`World::update`] iterates a snapshot of the live list taken when the
//! frame starts, calling every component's `early_update` and then every
//! component's `update` for one object before moving to the next. Objects
//! registered during the frame first tick on the following frame; objects that
//! leave the live list mid-frame are skipped for the rest of it. After the
//! iteration the [`CommandBuffer`] is flushed. Commands queued while flushing
//! wait for the next flush.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::body::{Body, CollisionStart, Surface};
use crate::command::{ApplyReport, Command, CommandBuffer, CommandKind};
use crate::component::Component;
use crate::event::{names, DispatchReport, EventPayload, ListenerError, ListenerId};
use crate::id::{ObjectAllocator, ObjectId};
use crate::math::Vec2;
use crate::object::{GameObject, ObjectBuilder, ObjectState};
use crate::time::{FrameTime, TimeSource};
use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Create,
    EarlyUpdate,
    Update,
    Dispose,
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Owns every game object and the registry built on top of them.
pub struct World {
    allocator: ObjectAllocator,
    objects: HashMap<ObjectId, GameObject>,
    /// Live objects in registration order.
    live: Vec<ObjectId>,
    pools: HashMap<String, Vec<ObjectId>>,
    commands: CommandBuffer,
    frame: Option<FrameTime>,
    frame_count: u64,
}

impl World {
    pub fn new() -> Self {
        Self {
            allocator: ObjectAllocator::new(),
            objects: HashMap::new(),
            live: Vec::new(),
            pools: HashMap::new(),
            commands: CommandBuffer::new(),
            frame: None,
            frame_count: 0,
        }
    }

    // -- creation -----------------------------------------------------------

    /// Create an unregistered object.
    pub fn create(&mut self, builder: ObjectBuilder) -> Result<ObjectId, CoreError> {
        if let Some(component) = builder.duplicate_component() {
            return Err(CoreError::DuplicateComponent { component });
        }
        let id = self.allocator.allocate();
        let object = builder.build(id);
        trace!(object = %id, name = %object.name(), "object created");
        self.objects.insert(id, object);
        Ok(id)
    }

    /// Attach a component to an existing object. It takes part in the next
    /// lifecycle phase that starts after this call.
    pub fn add_component<C: Component>(
        &mut self,
        id: ObjectId,
        component: C,
    ) -> Result<(), CoreError> {
        let object = self
            .objects
            .get_mut(&id)
            .ok_or(CoreError::UnknownObject { object: id })?;
        object
            .components
            .insert(component)
            .map_err(|_| CoreError::DuplicateComponent {
                component: std::any::type_name::<C>(),
            })
    }

    // -- registry -----------------------------------------------------------

    /// Add an object to the live list and run every component's `create`.
    ///
    /// Registering a pooled object takes it out of its pool first. Registering
    /// an object that is already live is ignored (and logged), so it can never
    /// tick twice per frame. Returns `true` if the object became live.
    pub fn register(&mut self, id: ObjectId) -> bool {
        let Some(state) = self.objects.get(&id).map(|o| o.state) else {
            warn!(object = %id, "register ignored: unknown object");
            return false;
        };
        match state {
            ObjectState::Live | ObjectState::Disposing => {
                warn!(object = %id, ?state, "register ignored");
                return false;
            }
            ObjectState::Pooled => self.remove_from_pools(id),
            ObjectState::Unregistered => {}
        }

        let Some(object) = self.objects.get_mut(&id) else {
            return false;
        };
        object.state = ObjectState::Live;
        object.epoch = object.epoch.wrapping_add(1);
        let epoch = object.epoch;
        if let Some(body) = object.body_mut() {
            body.issue_surface(Surface { owner: id, epoch });
        }
        self.live.push(id);
        debug!(object = %id, epoch, "object registered");

        self.run_phase(id, Phase::Create);
        true
    }

    /// Remove an object from the live list. No-op if it is not live.
    pub fn unregister(&mut self, id: ObjectId) -> bool {
        let Some(pos) = self.live.iter().position(|&o| o == id) else {
            return false;
        };
        self.live.remove(pos);
        if let Some(object) = self.objects.get_mut(&id) {
            if object.state == ObjectState::Live {
                object.state = ObjectState::Unregistered;
            }
        }
        debug!(object = %id, "object unregistered");
        true
    }

    /// Tear an object down: raise `dispose`, run every component's `dispose`,
    /// and remove it from the live list, every pool, and the world.
    ///
    /// Disposing an unknown or already-disposed object is a no-op and returns
    /// `false`, as is a re-entrant dispose from inside the teardown.
    pub fn dispose(&mut self, id: ObjectId) -> bool {
        let Some(object) = self.objects.get_mut(&id) else {
            return false;
        };
        if object.state == ObjectState::Disposing {
            return false;
        }
        object.state = ObjectState::Disposing;

        self.trigger(id, names::DISPOSE, &EventPayload::None);
        self.run_phase(id, Phase::Dispose);

        self.live.retain(|&o| o != id);
        self.remove_from_pools(id);
        self.objects.remove(&id);
        self.allocator.release(id);
        debug!(object = %id, "object disposed");
        true
    }

    /// Take a recycled object from the pool under `key`, or build a new one
    /// with `factory`.
    ///
    /// The returned object is unregistered either way; the caller configures
    /// and registers it. Freshly built objects adopt `key` as their pool key
    /// unless the factory set one.
    pub fn obtain<F, E>(&mut self, key: &str, factory: F) -> Result<ObjectId, E>
    where
        F: FnOnce(&mut World) -> Result<ObjectId, E>,
    {
        while let Some(id) = self.pools.get_mut(key).and_then(Vec::pop) {
            if let Some(object) = self.objects.get_mut(&id) {
                object.state = ObjectState::Unregistered;
                trace!(pool = key, object = %id, "reusing pooled object");
                return Ok(id);
            }
        }

        let id = factory(self)?;
        if let Some(object) = self.objects.get_mut(&id) {
            if object.pool_key().is_none() {
                object.set_pool_key(Some(key));
            }
        }
        debug!(pool = key, object = %id, "pool empty, built new object");
        Ok(id)
    }

    /// Move a live object into a pool.
    ///
    /// `key` overrides the object's own pool key. With no key at all the
    /// object is disposed instead so it cannot leak. The caller is expected to
    /// have made the object inert (body stopped) beforehand. Returns `false`
    /// if the object was not live.
    pub fn despawn(&mut self, id: ObjectId, key: Option<&str>) -> bool {
        let Some(object) = self.objects.get(&id) else {
            return false;
        };
        if object.state != ObjectState::Live {
            return false;
        }
        let key = key
            .map(str::to_owned)
            .or_else(|| object.pool_key().map(str::to_owned));

        let Some(key) = key else {
            debug!(object = %id, "despawn without pool key, disposing");
            return self.dispose(id);
        };
        self.live.retain(|&o| o != id);
        if let Some(object) = self.objects.get_mut(&id) {
            object.state = ObjectState::Pooled;
        }
        debug!(object = %id, pool = %key, "object returned to pool");
        self.pools.entry(key).or_default().push(id);
        true
    }

    fn remove_from_pools(&mut self, id: ObjectId) {
        for list in self.pools.values_mut() {
            list.retain(|&o| o != id);
        }
    }

    // -- frame --------------------------------------------------------------

    /// Capture timing for the coming frame.
    pub fn begin_frame(&mut self, source: &dyn TimeSource) {
        self.frame = Some(FrameTime::capture(source));
        self.frame_count += 1;
    }

    /// Run one frame: iterate live objects, then flush deferred commands.
    pub fn update(&mut self) -> ApplyReport {
        self.run_components();
        self.flush_commands()
    }

    /// Iterate a snapshot of the live list, running `early_update` then
    /// `update` on each object that is still live when its turn comes.
    pub fn run_components(&mut self) {
        let snapshot = self.live.clone();
        for id in snapshot {
            if !self.is_live(id) {
                continue;
            }
            self.run_phase(id, Phase::EarlyUpdate);
            self.run_phase(id, Phase::Update);
        }
    }

    /// Apply every queued command in FIFO order.
    pub fn flush_commands(&mut self) -> ApplyReport {
        let mut report = ApplyReport::default();
        for command in self.commands.drain() {
            let Command {
                target,
                kind,
                reason,
                command_index,
            } = command;
            let applied = match (kind, target) {
                (CommandKind::Deferred(f), _) => {
                    f(self);
                    true
                }
                (CommandKind::Register, Some(id)) => self.register(id),
                (CommandKind::Unregister, Some(id)) => self.unregister(id),
                (CommandKind::Despawn { pool_key }, Some(id)) => {
                    self.despawn(id, pool_key.as_deref())
                }
                (CommandKind::Dispose, Some(id)) => self.dispose(id),
                (_, None) => false,
            };
            if applied {
                report.applied += 1;
                trace!(command_index, ?target, ?reason, "command applied");
            } else {
                report.skipped += 1;
                debug!(command_index, ?target, ?reason, "command skipped");
            }
        }
        self.commands.set_last_apply_report(report);
        report
    }

    fn run_phase(&mut self, id: ObjectId, phase: Phase) {
        let Some(count) = self.objects.get(&id).map(|o| o.components.len()) else {
            return;
        };
        for index in 0..count {
            if matches!(phase, Phase::EarlyUpdate | Phase::Update) && !self.is_live(id) {
                break;
            }
            let Some(mut component) = self
                .objects
                .get_mut(&id)
                .and_then(|o| o.components.take(index))
            else {
                continue;
            };
            {
                let mut ctx = ObjectContext { world: self, id };
                match phase {
                    Phase::Create => component.create(&mut ctx),
                    Phase::EarlyUpdate => component.early_update(&mut ctx),
                    Phase::Update => component.update(&mut ctx),
                    Phase::Dispose => component.dispose(&mut ctx),
                }
            }
            if let Some(object) = self.objects.get_mut(&id) {
                object.components.restore(index, component);
            }
        }
    }

    // -- events -------------------------------------------------------------

    /// Register a listener on an object's bus. `None` if the object is gone.
    pub fn add_listener<F>(&mut self, id: ObjectId, name: &str, listener: F) -> Option<ListenerId>
    where
        F: Fn(&mut ObjectContext<'_>, &EventPayload) -> Result<(), ListenerError> + 'static,
    {
        let object = self.objects.get_mut(&id)?;
        Some(object.events.add_listener(name, Rc::new(listener)))
    }

    pub fn remove_listener(&mut self, id: ObjectId, listener: ListenerId) -> bool {
        self.objects
            .get_mut(&id)
            .is_some_and(|o| o.events.remove_listener(listener))
    }

    /// Raise `name` on one object's bus.
    ///
    /// Every listener registered when the call starts runs, in order, even if
    /// an earlier one fails.
    pub fn trigger(&mut self, id: ObjectId, name: &str, payload: &EventPayload) -> DispatchReport {
        let mut report = DispatchReport::default();
        let Some(listeners) = self.objects.get(&id).map(|o| o.events.snapshot(name)) else {
            return report;
        };
        for (listener_id, listener) in listeners {
            let mut ctx = ObjectContext { world: self, id };
            report.invoked += 1;
            if let Err(err) = listener(&mut ctx, payload) {
                report.failed += 1;
                warn!(object = %id, event = name, ?listener_id, error = %err, "event listener failed");
            }
        }
        report
    }

    /// Deliver a physics contact as `collisionStart` to each live participant.
    /// Returns the number of deliveries.
    pub fn dispatch_collision(&mut self, collision: &CollisionStart) -> usize {
        let mut delivered = 0;
        for contact in collision.contacts() {
            if self.is_live(contact.own.owner) {
                self.trigger(
                    contact.own.owner,
                    names::COLLISION_START,
                    &EventPayload::Contact(contact),
                );
                delivered += 1;
            }
        }
        delivered
    }

    /// Run `f` with a context for `id`, as a component hook would see it.
    pub fn with_context<R>(
        &mut self,
        id: ObjectId,
        f: impl FnOnce(&mut ObjectContext<'_>) -> R,
    ) -> Option<R> {
        if !self.contains(id) {
            return None;
        }
        let mut ctx = ObjectContext { world: self, id };
        Some(f(&mut ctx))
    }

    // -- accessors ----------------------------------------------------------

    /// Whether the object exists (in any state short of disposed).
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn is_live(&self, id: ObjectId) -> bool {
        self.state(id) == Some(ObjectState::Live)
    }

    pub fn state(&self, id: ObjectId) -> Option<ObjectState> {
        self.objects.get(&id).map(|o| o.state)
    }

    pub fn object(&self, id: ObjectId) -> Option<&GameObject> {
        self.objects.get(&id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        self.objects.get_mut(&id)
    }

    pub fn component<C: Component>(&self, id: ObjectId) -> Option<&C> {
        self.objects.get(&id).and_then(|o| o.component::<C>())
    }

    pub fn component_mut<C: Component>(&mut self, id: ObjectId) -> Option<&mut C> {
        self.objects.get_mut(&id).and_then(|o| o.component_mut::<C>())
    }

    pub fn position(&self, id: ObjectId) -> Option<Vec2> {
        self.objects.get(&id).map(|o| o.position())
    }

    pub fn body(&self, id: ObjectId) -> Option<&Body> {
        self.objects.get(&id).and_then(|o| o.body())
    }

    /// Live objects in registration order.
    pub fn live_ids(&self) -> &[ObjectId] {
        &self.live
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Objects in the world, whatever their state.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn pooled_ids(&self, key: &str) -> &[ObjectId] {
        self.pools.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn pooled_count(&self, key: &str) -> usize {
        self.pooled_ids(key).len()
    }

    /// Timing of the current frame, if one has begun.
    pub fn frame(&self) -> Option<FrameTime> {
        self.frame
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn commands(&self) -> &CommandBuffer {
        &self.commands
    }

    pub fn commands_mut(&mut self) -> &mut CommandBuffer {
        &mut self.commands
    }

    /// blake3 digest over the live list and positions, for determinism checks.
    pub fn state_digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for id in &self.live {
            hasher.update(&id.to_raw().to_le_bytes());
            if let Some(object) = self.objects.get(id) {
                hasher.update(&object.position().x.to_le_bytes());
                hasher.update(&object.position().y.to_le_bytes());
            }
        }
        hasher.finalize().to_hex().to_string()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// ObjectContext
// ---------------------------------------------------------------------------

/// The view a component hook or event listener gets of its owner and the
/// world around it.
pub struct ObjectContext<'w> {
    world: &'w mut World,
    id: ObjectId,
}

impl ObjectContext<'_> {
    /// The owning object.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn world(&self) -> &World {
        &*self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut *self.world
    }

    pub fn object(&self) -> Option<&GameObject> {
        self.world.object(self.id)
    }

    pub fn object_mut(&mut self) -> Option<&mut GameObject> {
        self.world.object_mut(self.id)
    }

    pub fn position(&self) -> Vec2 {
        self.object().map_or(Vec2::ZERO, GameObject::position)
    }

    pub fn set_position(&mut self, position: Vec2) {
        if let Some(object) = self.object_mut() {
            object.set_position(position);
        }
    }

    pub fn scale(&self) -> Vec2 {
        self.object().map_or(Vec2::ONE, GameObject::scale)
    }

    pub fn body(&self) -> Option<&Body> {
        self.object().and_then(GameObject::body)
    }

    pub fn body_mut(&mut self) -> Option<&mut Body> {
        self.object_mut().and_then(GameObject::body_mut)
    }

    /// A sibling component of the owner.
    pub fn component<C: Component>(&self) -> Option<&C> {
        self.world.component::<C>(self.id)
    }

    pub fn component_mut<C: Component>(&mut self) -> Option<&mut C> {
        self.world.component_mut::<C>(self.id)
    }

    pub fn frame(&self) -> Option<FrameTime> {
        self.world.frame()
    }

    pub fn commands(&mut self) -> &mut CommandBuffer {
        self.world.commands_mut()
    }

    /// Raise an event on the owner's bus.
    pub fn trigger(&mut self, name: &str, payload: &EventPayload) -> DispatchReport {
        let id = self.id;
        self.world.trigger(id, name, payload)
    }

    pub fn add_listener<F>(&mut self, name: &str, listener: F) -> Option<ListenerId>
    where
        F: Fn(&mut ObjectContext<'_>, &EventPayload) -> Result<(), ListenerError> + 'static,
    {
        let id = self.id;
        self.world.add_listener(id, name, listener)
    }

    pub fn remove_listener(&mut self, listener: ListenerId) -> bool {
        let id = self.id;
        self.world.remove_listener(id, listener)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::ColliderShape;
    use crate::command::CausalReason;
    use crate::time::ManualClock;
    use std::cell::RefCell;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Appends `<label>:<hook>` to a shared log for every lifecycle hook.
    struct Recorder {
        label: &'static str,
        log: Log,
    }

    impl Recorder {
        fn note(&self, hook: &str) {
            self.log.borrow_mut().push(format!("{}:{hook}", self.label));
        }
    }

    impl Component for Recorder {
        fn create(&mut self, _ctx: &mut ObjectContext<'_>) {
            self.note("create");
        }
        fn early_update(&mut self, _ctx: &mut ObjectContext<'_>) {
            self.note("early");
        }
        fn update(&mut self, _ctx: &mut ObjectContext<'_>) {
            self.note("update");
        }
        fn dispose(&mut self, _ctx: &mut ObjectContext<'_>) {
            self.note("dispose");
        }
    }

    /// Registers a fresh object from inside `update`.
    struct Spawner {
        spawned: Option<ObjectId>,
        log: Log,
    }

    impl Component for Spawner {
        fn update(&mut self, ctx: &mut ObjectContext<'_>) {
            if self.spawned.is_some() {
                return;
            }
            let child = ObjectBuilder::new("child").component(Recorder {
                label: "child",
                log: Rc::clone(&self.log),
            });
            if let Ok(id) = ctx.world_mut().create(child) {
                ctx.world_mut().register(id);
                self.spawned = Some(id);
            }
        }
    }

    fn recorder(label: &'static str, log: &Log) -> Recorder {
        Recorder {
            label,
            log: Rc::clone(log),
        }
    }

    fn entries(log: &Log) -> Vec<String> {
        log.borrow().clone()
    }

    #[test]
    fn register_runs_create_in_component_order() {
        let log = Log::default();
        let mut world = World::new();
        let id = world
            .create(
                ObjectBuilder::new("tower")
                    .component(recorder("a", &log))
                    .component(ArmorTag),
            )
            .unwrap();
        world.add_component(id, recorder("b", &log)).ok();
        assert_eq!(world.state(id), Some(ObjectState::Unregistered));

        assert!(world.register(id));
        assert!(world.is_live(id));
        assert_eq!(entries(&log), vec!["a:create", "b:create"]);
    }

    struct ArmorTag;
    impl Component for ArmorTag {}

    #[test]
    fn duplicate_component_is_rejected() {
        let mut world = World::new();
        let err = world
            .create(ObjectBuilder::new("x").component(ArmorTag).component(ArmorTag))
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateComponent { .. }));
        assert_eq!(world.object_count(), 0);

        let id = world.create(ObjectBuilder::new("y").component(ArmorTag)).unwrap();
        assert!(world.add_component(id, ArmorTag).is_err());
    }

    #[test]
    fn update_runs_early_then_update_per_object() {
        let log = Log::default();
        let mut world = World::new();
        let a = world
            .create(ObjectBuilder::new("a").component(recorder("a", &log)))
            .unwrap();
        let b = world
            .create(ObjectBuilder::new("b").component(recorder("b", &log)))
            .unwrap();
        world.register(a);
        world.register(b);
        log.borrow_mut().clear();

        world.update();
        assert_eq!(entries(&log), vec!["a:early", "a:update", "b:early", "b:update"]);
    }

    #[test]
    fn double_register_does_not_double_tick() {
        let log = Log::default();
        let mut world = World::new();
        let id = world
            .create(ObjectBuilder::new("a").component(recorder("a", &log)))
            .unwrap();
        assert!(world.register(id));
        assert!(!world.register(id));
        assert_eq!(world.live_count(), 1);
        log.borrow_mut().clear();

        world.update();
        assert_eq!(entries(&log), vec!["a:early", "a:update"]);
    }

    #[test]
    fn objects_registered_mid_frame_start_next_frame() {
        let log = Log::default();
        let mut world = World::new();
        let spawner = world
            .create(ObjectBuilder::new("spawner").component(Spawner {
                spawned: None,
                log: Rc::clone(&log),
            }))
            .unwrap();
        world.register(spawner);

        world.update();
        assert_eq!(entries(&log), vec!["child:create"]);

        world.update();
        assert_eq!(
            entries(&log),
            vec!["child:create", "child:early", "child:update"]
        );
    }

    #[test]
    fn dispose_is_idempotent_and_fires_teardown_once() {
        let log = Log::default();
        let mut world = World::new();
        let id = world
            .create(ObjectBuilder::new("a").component(recorder("a", &log)))
            .unwrap();
        world.register(id);

        let teardowns = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&teardowns);
        world.add_listener(id, names::DISPOSE, move |_ctx, _payload| {
            *counter.borrow_mut() += 1;
            Ok(())
        });

        assert!(world.dispose(id));
        assert!(!world.dispose(id));
        assert_eq!(*teardowns.borrow(), 1);
        assert_eq!(
            entries(&log).iter().filter(|e| *e == "a:dispose").count(),
            1
        );

        log.borrow_mut().clear();
        world.update();
        assert!(entries(&log).is_empty());
        assert!(!world.live_ids().contains(&id));
    }

    #[test]
    fn unregister_missing_is_noop() {
        let mut world = World::new();
        let id = world.create(ObjectBuilder::new("a")).unwrap();
        assert!(!world.unregister(id));
        world.register(id);
        assert!(world.unregister(id));
        assert_eq!(world.state(id), Some(ObjectState::Unregistered));
    }

    #[test]
    fn despawn_parks_in_pool_and_obtain_recycles() {
        let mut world = World::new();
        let id = world
            .create(ObjectBuilder::new("shell").pool_key("shell"))
            .unwrap();
        world.register(id);

        assert!(world.despawn(id, None));
        assert!(!world.is_live(id));
        assert_eq!(world.pooled_ids("shell"), &[id]);
        assert!(!world.despawn(id, None), "already pooled");

        let reused: Result<ObjectId, CoreError> =
            world.obtain("shell", |w| w.create(ObjectBuilder::new("fresh")));
        assert_eq!(reused.unwrap(), id);
        assert_eq!(world.pooled_count("shell"), 0);
        assert_eq!(world.state(id), Some(ObjectState::Unregistered));
    }

    #[test]
    fn obtain_builds_when_pool_is_empty_and_adopts_key() {
        let mut world = World::new();
        let id = world
            .obtain("flak", |w| w.create(ObjectBuilder::new("flak")))
            .unwrap();
        assert_eq!(world.object(id).unwrap().pool_key(), Some("flak"));

        world.register(id);
        world.despawn(id, None);
        assert_eq!(world.pooled_count("flak"), 1);
    }

    #[test]
    fn despawn_without_key_disposes() {
        let mut world = World::new();
        let id = world.create(ObjectBuilder::new("loose")).unwrap();
        world.register(id);
        assert!(world.despawn(id, None));
        assert!(!world.contains(id));
    }

    #[test]
    fn registering_pooled_object_leaves_pool() {
        let mut world = World::new();
        let id = world.create(ObjectBuilder::new("s")).unwrap();
        world.register(id);
        world.despawn(id, Some("s"));
        assert!(world.register(id));
        assert_eq!(world.pooled_count("s"), 0);
        assert_eq!(world.live_ids(), &[id]);
    }

    #[test]
    fn register_issues_new_surface_epoch() {
        let mut world = World::new();
        let id = world
            .create(ObjectBuilder::new("s").body(Body::new(ColliderShape::Circle { radius: 1.0 })))
            .unwrap();
        world.register(id);
        let first = world.body(id).unwrap().surface().unwrap();
        world.despawn(id, Some("s"));
        world.register(id);
        let second = world.body(id).unwrap().surface().unwrap();
        assert_eq!(first.owner, id);
        assert_ne!(first.epoch, second.epoch);
    }

    #[test]
    fn commands_apply_after_iteration() {
        let mut world = World::new();
        let id = world.create(ObjectBuilder::new("a").pool_key("a")).unwrap();
        world.register(id);

        world
            .commands_mut()
            .despawn(id, None, CausalReason::LifetimeExpired);
        world
            .commands_mut()
            .despawn(id, None, CausalReason::LifetimeExpired);
        let report = world.update();
        assert_eq!(report, ApplyReport { applied: 1, skipped: 1 });
        assert_eq!(world.pooled_count("a"), 1);
    }

    #[test]
    fn deferred_closure_runs_at_flush() {
        let mut world = World::new();
        let id = world.create(ObjectBuilder::new("a")).unwrap();
        world
            .commands_mut()
            .defer(CausalReason::GameRule("late".to_owned()), move |w| {
                w.register(id);
            });
        assert!(!world.is_live(id));
        world.flush_commands();
        assert!(world.is_live(id));
    }

    #[test]
    fn listener_failure_does_not_block_siblings() {
        let mut world = World::new();
        let id = world.create(ObjectBuilder::new("a")).unwrap();
        let hits = Rc::new(RefCell::new(Vec::new()));

        let first = Rc::clone(&hits);
        world.add_listener(id, "ping", move |_ctx, _payload| {
            first.borrow_mut().push(1);
            Err(ListenerError::new("boom"))
        });
        let second = Rc::clone(&hits);
        world.add_listener(id, "ping", move |_ctx, _payload| {
            second.borrow_mut().push(2);
            Ok(())
        });

        let report = world.trigger(id, "ping", &EventPayload::None);
        assert_eq!(report, DispatchReport { invoked: 2, failed: 1 });
        assert_eq!(*hits.borrow(), vec![1, 2]);
    }

    #[test]
    fn listener_added_during_dispatch_waits_for_next_trigger() {
        let mut world = World::new();
        let id = world.create(ObjectBuilder::new("a")).unwrap();
        let hits = Rc::new(RefCell::new(0));

        let outer = Rc::clone(&hits);
        world.add_listener(id, "ping", move |ctx, _payload| {
            *outer.borrow_mut() += 1;
            let inner = Rc::clone(&outer);
            ctx.add_listener("ping", move |_ctx, _payload| {
                *inner.borrow_mut() += 100;
                Ok(())
            });
            Ok(())
        });

        let report = world.trigger(id, "ping", &EventPayload::None);
        assert_eq!(report.invoked, 1);
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn events_do_not_cross_objects() {
        let mut world = World::new();
        let a = world.create(ObjectBuilder::new("a")).unwrap();
        let b = world.create(ObjectBuilder::new("b")).unwrap();
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        world.add_listener(b, "ping", move |_ctx, _payload| {
            *counter.borrow_mut() += 1;
            Ok(())
        });
        assert_eq!(world.trigger(a, "ping", &EventPayload::None).invoked, 0);
        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn frame_is_none_until_begun() {
        let mut world = World::new();
        assert!(world.frame().is_none());
        let clock = ManualClock::new(0.25);
        world.begin_frame(&clock);
        assert_eq!(world.frame().unwrap().scaled_delta(), 0.25);
        assert_eq!(world.frame_count(), 1);
    }

    #[test]
    fn state_digest_tracks_positions() {
        let mut world = World::new();
        let id = world
            .create(ObjectBuilder::new("a").at(Vec2::new(1.0, 2.0)))
            .unwrap();
        world.register(id);
        let before = world.state_digest();
        world.object_mut(id).unwrap().set_position(Vec2::new(1.5, 2.0));
        assert_ne!(before, world.state_digest());
    }
}
