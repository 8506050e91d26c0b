//! Completion watches
//!
//! One watch per checkout. Each tick it asks the pool whether its checkout is
//! still live and still playing. The pool does any auto-release inside that
//! call, so by the time the watch fires `on_end` the element is already idle.

use super::pool::{ElementId, EndCallback, PoolCore, WatchOutcome};
use super::scheduler::{TaskStatus, TickContext, TickTask};
use super::backend::SourceFactory;
use std::cell::RefCell;
use std::rc::Weak;

pub(super) struct CompletionWatch<F: SourceFactory> {
    core: Weak<RefCell<PoolCore<F>>>,
    element: ElementId,
    serial: u64,
    auto_remove: bool,
    on_end: Option<EndCallback>,
}

impl<F: SourceFactory> CompletionWatch<F> {
    pub(super) fn new(
        core: Weak<RefCell<PoolCore<F>>>,
        element: ElementId,
        serial: u64,
        auto_remove: bool,
        on_end: Option<EndCallback>,
    ) -> Self {
        Self { core, element, serial, auto_remove, on_end }
    }
}

impl<F: SourceFactory> TickTask for CompletionWatch<F> {
    fn poll(&mut self, ctx: &TickContext) -> TaskStatus {
        // Pool gone: teardown already stopped the source.
        let Some(core) = self.core.upgrade() else {
            return TaskStatus::Complete;
        };

        let outcome = core.borrow_mut().observe(self.element, self.serial, self.auto_remove);
        // The callback may re-enter (or drop) the pool.
        drop(core);

        match outcome {
            WatchOutcome::Playing => TaskStatus::Pending,
            WatchOutcome::Cancelled => {
                log::trace!("watch for {:?} cancelled at tick {}", self.element, ctx.tick);
                TaskStatus::Complete
            }
            WatchOutcome::Finished => {
                log::trace!("watch for {:?} finished at tick {}", self.element, ctx.tick);
                if let Some(on_end) = self.on_end.take() {
                    on_end();
                }
                TaskStatus::Complete
            }
        }
    }
}
