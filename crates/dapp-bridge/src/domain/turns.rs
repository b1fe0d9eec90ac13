//! Deferred work for the next scheduler turn.
//!
//! Page code expects some callbacks to run "later" even when the answer is
//! already known: listener replays after `on()` and legacy `send_async`
//! callbacks. Those are queued here and run when the host drives a turn.
//! Tasks queued while a turn is running wait for the following turn.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

type Task = Box<dyn FnOnce() + Send>;

struct Deferred {
    label: &'static str,
    task: Task,
}

/// FIFO of tasks for the next turn.
pub struct TurnQueue {
    queue: Mutex<VecDeque<Deferred>>,
}

impl TurnQueue {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
        }
    }

    /// Queue a task for the next turn.
    pub fn defer<F>(&self, label: &'static str, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.lock().push_back(Deferred {
            label,
            task: Box::new(task),
        });
        debug!(task = label, "Deferred task to next turn");
    }

    /// Run the tasks queued before this call. Returns how many ran.
    pub fn run_turn(&self) -> usize {
        let batch = std::mem::take(&mut *self.queue.lock());
        let count = batch.len();
        for Deferred { label, task } in batch {
            if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                warn!(task = label, "Deferred task panicked");
            }
        }
        count
    }

    /// Run turns until nothing is queued, up to `max_turns`.
    /// Returns the total number of tasks run.
    pub fn run_until_idle(&self, max_turns: usize) -> usize {
        let mut total = 0;
        for _ in 0..max_turns {
            let ran = self.run_turn();
            if ran == 0 {
                break;
            }
            total += ran;
        }
        total
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

impl Default for TurnQueue {
    fn default() -> Self {
        Self::new()
    }
}
