//! Tick-driven cooperative task scheduling
//!
//! Tasks are polled once per tick on the frame thread until they report
//! completion. Nothing blocks and nothing runs in parallel; a task that is
//! not done simply yields until the next tick.

use std::cell::{Cell, RefCell};

/// Result of polling a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Poll again next tick
    Pending,
    /// Drop the task
    Complete,
}

/// Per-tick information handed to tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickContext {
    /// Index of the tick being run, starting at 1
    pub tick: u64,
}

/// A unit of work resumed once per tick
pub trait TickTask {
    /// Advance the task by one tick
    fn poll(&mut self, ctx: &TickContext) -> TaskStatus;
}

impl<F> TickTask for F
where
    F: FnMut(&TickContext) -> TaskStatus,
{
    fn poll(&mut self, ctx: &TickContext) -> TaskStatus {
        self(ctx)
    }
}

/// Accepts tasks to be resumed once per tick
///
/// Takes `&self` so tasks may spawn further tasks while the scheduler is
/// running them.
pub trait Scheduler {
    /// Queue `task`; it is first polled on the next tick
    fn spawn(&self, task: Box<dyn TickTask>);
}

/// Single-threaded scheduler advanced by the frame loop
#[derive(Default)]
pub struct TickScheduler {
    tasks: RefCell<Vec<Box<dyn TickTask>>>,
    /// Spawned since the current (or last) tick started
    incoming: RefCell<Vec<Box<dyn TickTask>>>,
    tick: Cell<u64>,
}

impl TickScheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one tick: poll every task queued before this call exactly once
    ///
    /// Returns the number of tasks still pending afterwards.
    pub fn tick(&self) -> usize {
        let tick = self.tick.get() + 1;
        self.tick.set(tick);
        let ctx = TickContext { tick };

        let mut running = std::mem::take(&mut *self.tasks.borrow_mut());
        running.append(&mut self.incoming.borrow_mut());

        // No scheduler borrow is held here, so tasks may call `spawn`.
        running.retain_mut(|task| task.poll(&ctx) == TaskStatus::Pending);

        let mut tasks = self.tasks.borrow_mut();
        *tasks = running;
        let count = tasks.len() + self.incoming.borrow().len();
        log::trace!("tick {tick}: {count} task(s) pending");
        count
    }

    /// Number of tasks waiting to be polled
    pub fn pending(&self) -> usize {
        self.tasks.borrow().len() + self.incoming.borrow().len()
    }

    /// Index of the last tick run, 0 before the first
    pub fn current_tick(&self) -> u64 {
        self.tick.get()
    }

    /// Drop every task without polling it again
    pub fn clear(&self) {
        self.tasks.borrow_mut().clear();
        self.incoming.borrow_mut().clear();
    }
}

impl Scheduler for TickScheduler {
    fn spawn(&self, task: Box<dyn TickTask>) {
        self.incoming.borrow_mut().push(task);
    }
}

impl std::fmt::Debug for TickScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickScheduler")
            .field("tick", &self.tick.get())
            .field("pending", &self.pending())
            .finish()
    }
}
