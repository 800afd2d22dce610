//! Deferred registry mutations.
//!
//! Anything that would add to or remove from the live list while the world
//! is iterating it goes through the [`CommandBuffer`] instead: components and
//! event listeners queue a [`Command`], and
//! [`World::flush_commands`](crate::world::World::flush_commands) applies the
//! queue in FIFO order once the frame's iteration has returned.
//!
//! Commands are idempotent against the object's current state. Despawning an
//! object that is no longer live, or disposing one that is already gone, is
//! counted as skipped and logged at debug level; it is never an error.
//!
//! # Example
//!
//! ```
//! use bulwark_core::prelude::*;
//!
//! let mut world = World::new();
//! let id = world.create(ObjectBuilder::new("shell")).unwrap();
//! world.register(id);
//!
//! world.commands_mut().dispose(id, CausalReason::GameRule("demo".to_owned()));
//! assert!(world.is_live(id));
//!
//! let report = world.flush_commands();
//! assert_eq!(report.applied, 1);
//! assert!(!world.contains(id));
//! ```

use std::fmt;

use crate::id::ObjectId;
use crate::world::World;

// ---------------------------------------------------------------------------
// CausalReason
// ---------------------------------------------------------------------------

/// Why a command was issued. Carried into the trace output.
#[derive(Debug, Clone, PartialEq)]
pub enum CausalReason {
    /// A projectile ran out of lifetime.
    LifetimeExpired,
    /// A collision between the two objects.
    CollisionResponse(ObjectId, ObjectId),
    /// An interceptor (first) destroyed a hostile projectile (second).
    Interception(ObjectId, ObjectId),
    /// A spawner produced the object.
    Spawn(String),
    /// A named game rule.
    GameRule(String),
}

// ---------------------------------------------------------------------------
// CommandKind
// ---------------------------------------------------------------------------

/// A closure run against the world at flush time.
pub type DeferredFn = Box<dyn FnOnce(&mut World)>;

/// What a command does.
pub enum CommandKind {
    /// Add the target to the live list.
    Register,
    /// Remove the target from the live list without disposing it.
    Unregister,
    /// Park the target in a pool (or dispose it when no key applies).
    Despawn {
        /// Explicit pool key; `None` uses the object's own key.
        pool_key: Option<String>,
    },
    /// Tear the target down.
    Dispose,
    /// Run arbitrary code after iteration.
    Deferred(DeferredFn),
}

impl fmt::Debug for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::Register => write!(f, "Register"),
            CommandKind::Unregister => write!(f, "Unregister"),
            CommandKind::Despawn { pool_key } => {
                f.debug_struct("Despawn").field("pool_key", pool_key).finish()
            }
            CommandKind::Dispose => write!(f, "Dispose"),
            CommandKind::Deferred(_) => write!(f, "Deferred(..)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// A single deferred mutation.
#[derive(Debug)]
pub struct Command {
    /// Object the command acts on. `None` for [`CommandKind::Deferred`].
    pub target: Option<ObjectId>,
    pub kind: CommandKind,
    pub reason: CausalReason,
    /// Position within the frame's queue.
    pub command_index: u32,
}

// ---------------------------------------------------------------------------
// ApplyReport
// ---------------------------------------------------------------------------

/// Summary of one flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Commands that changed the world.
    pub applied: usize,
    /// Commands that found nothing to do (stale target, already pooled, ...).
    pub skipped: usize,
}

// ---------------------------------------------------------------------------
// CommandBuffer
// ---------------------------------------------------------------------------

/// FIFO queue of deferred mutations.
#[derive(Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
    next_index: u32,
    last_apply_report: ApplyReport,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, target: ObjectId, reason: CausalReason) {
        self.push(Some(target), CommandKind::Register, reason);
    }

    pub fn unregister(&mut self, target: ObjectId, reason: CausalReason) {
        self.push(Some(target), CommandKind::Unregister, reason);
    }

    /// Queue a pool return. `pool_key` overrides the object's own key.
    pub fn despawn(&mut self, target: ObjectId, pool_key: Option<&str>, reason: CausalReason) {
        self.push(
            Some(target),
            CommandKind::Despawn {
                pool_key: pool_key.map(str::to_owned),
            },
            reason,
        );
    }

    pub fn dispose(&mut self, target: ObjectId, reason: CausalReason) {
        self.push(Some(target), CommandKind::Dispose, reason);
    }

    /// Queue a closure to run after the current iteration.
    pub fn defer(&mut self, reason: CausalReason, f: impl FnOnce(&mut World) + 'static) {
        self.push(None, CommandKind::Deferred(Box::new(f)), reason);
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Report from the most recent flush.
    pub fn last_apply_report(&self) -> ApplyReport {
        self.last_apply_report
    }

    /// Take every queued command, leaving the buffer empty.
    pub(crate) fn drain(&mut self) -> Vec<Command> {
        self.next_index = 0;
        std::mem::take(&mut self.commands)
    }

    pub(crate) fn set_last_apply_report(&mut self, report: ApplyReport) {
        self.last_apply_report = report;
    }

    fn push(&mut self, target: Option<ObjectId>, kind: CommandKind, reason: CausalReason) {
        let command_index = self.next_index;
        self.next_index += 1;
        self.commands.push(Command {
            target,
            kind,
            reason,
            command_index,
        });
    }
}

impl fmt::Debug for CommandBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBuffer")
            .field("queued", &self.commands.len())
            .field("last_apply_report", &self.last_apply_report)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_keep_insertion_order() {
        let mut buf = CommandBuffer::new();
        let a = ObjectId::new(0, 0);
        let b = ObjectId::new(1, 0);
        buf.despawn(a, Some("shell"), CausalReason::LifetimeExpired);
        buf.dispose(b, CausalReason::CollisionResponse(b, a));
        buf.defer(CausalReason::GameRule("noop".to_owned()), |_world| {});

        let indices: Vec<u32> = buf.commands().iter().map(|c| c.command_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(buf.commands()[0].target, Some(a));
        assert!(buf.commands()[2].target.is_none());
    }

    #[test]
    fn drain_resets_indices() {
        let mut buf = CommandBuffer::new();
        let a = ObjectId::new(0, 0);
        buf.register(a, CausalReason::Spawn("test".to_owned()));
        assert_eq!(buf.drain().len(), 1);
        assert!(buf.is_empty());
        buf.unregister(a, CausalReason::GameRule("test".to_owned()));
        assert_eq!(buf.commands()[0].command_index, 0);
    }
}
