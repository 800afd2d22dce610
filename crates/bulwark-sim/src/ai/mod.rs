//! Priority-arbitrated tasks.
//!
//! A [`TaskScheduler`] is a component holding an ordered list of [`Task`]s.
//! Every tick it asks each task for its priority in the task's current
//! status, then either switches to a better task or keeps ticking the one
//! already running:
//!
//! 1. `best` is the highest non-negative priority; ties go to the task added
//!    first.
//! 2. If `best` is not the running task and nothing is running, or the
//!    running task has become ineligible, or `best` strictly outranks it, the
//!    running task is stopped and `best` is started.
//! 3. Otherwise the running task is updated. A running task that is
//!    ineligible with nothing to replace it is stopped; one that finishes on
//!    its own is released.
//!
//! Priorities may differ by status, which is how tasks express hysteresis
//! (see [`ChaseTask`](chase::ChaseTask)).

use bulwark_core::component::Component;
use bulwark_core::world::ObjectContext;
use tracing::debug;

pub mod chase;
pub mod movement;
pub mod path;
pub mod patrol;
pub mod waypoint;

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Inactive,
    Active,
    Finished,
}

/// Decision logic for one owner.
///
/// `start` moves a task from `Inactive` or `Finished` to `Active`, `update`
/// runs while `Active` and may finish the task, `stop` returns it to
/// `Inactive` and must release anything it holds.
pub trait Task {
    fn name(&self) -> &str;

    fn status(&self) -> TaskStatus;

    /// How much this task wants to run. Negative means "do not run". Called
    /// in every status.
    fn priority(&self, status: TaskStatus, ctx: &ObjectContext<'_>) -> i32;

    fn start(&mut self, ctx: &mut ObjectContext<'_>);

    fn update(&mut self, ctx: &mut ObjectContext<'_>);

    fn stop(&mut self, ctx: &mut ObjectContext<'_>);
}

// ---------------------------------------------------------------------------
// TaskScheduler
// ---------------------------------------------------------------------------

/// Runs the highest-priority eligible task of its owner.
#[derive(Default)]
pub struct TaskScheduler {
    tasks: Vec<Box<dyn Task>>,
    active: Option<usize>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`add_task`](Self::add_task).
    pub fn with_task(mut self, task: impl Task + 'static) -> Self {
        self.add_task(task);
        self
    }

    /// Append a task. Earlier tasks win priority ties.
    pub fn add_task(&mut self, task: impl Task + 'static) {
        self.tasks.push(Box::new(task));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Name of the running task, if any.
    pub fn active_task(&self) -> Option<&str> {
        self.active
            .and_then(|index| self.tasks.get(index))
            .map(|task| task.name())
    }

    /// Status of the first task called `name`.
    pub fn status_of(&self, name: &str) -> Option<TaskStatus> {
        self.tasks
            .iter()
            .find(|task| task.name() == name)
            .map(|task| task.status())
    }

    /// Run one arbitration round.
    pub fn schedule(&mut self, ctx: &mut ObjectContext<'_>) {
        let priorities: Vec<i32> = self
            .tasks
            .iter()
            .map(|task| task.priority(task.status(), &*ctx))
            .collect();

        let mut best: Option<usize> = None;
        for (index, &priority) in priorities.iter().enumerate() {
            if priority < 0 {
                continue;
            }
            if best.map_or(true, |b| priority > priorities[b]) {
                best = Some(index);
            }
        }

        let current = self.active;
        if let Some(b) = best {
            let switch = match current {
                None => true,
                Some(c) => c != b && (priorities[c] < 0 || priorities[b] > priorities[c]),
            };
            if switch {
                if let Some(c) = current {
                    self.tasks[c].stop(ctx);
                }
                debug!(
                    object = %ctx.id(),
                    from = current.map(|c| self.tasks[c].name()),
                    to = self.tasks[b].name(),
                    priority = priorities[b],
                    "task switch"
                );
                self.tasks[b].start(ctx);
                self.active = Some(b);
                return;
            }
        }

        let Some(c) = current else {
            return;
        };
        if priorities[c] < 0 {
            self.tasks[c].stop(ctx);
            self.active = None;
            debug!(object = %ctx.id(), task = self.tasks[c].name(), "task stopped, nothing eligible");
            return;
        }
        self.tasks[c].update(ctx);
        if self.tasks[c].status() == TaskStatus::Finished {
            self.active = None;
            debug!(object = %ctx.id(), task = self.tasks[c].name(), "task finished");
        }
    }
}

impl Component for TaskScheduler {
    fn update(&mut self, ctx: &mut ObjectContext<'_>) {
        self.schedule(ctx);
    }

    fn dispose(&mut self, ctx: &mut ObjectContext<'_>) {
        if let Some(c) = self.active.take() {
            self.tasks[c].stop(ctx);
        }
    }
}
