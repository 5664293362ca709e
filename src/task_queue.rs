//! Per-player FIFO of lazy async tasks with a drain-to-empty operation.
//!
//! A drain runs one *cycle*: tasks are popped and awaited one at a time until
//! the queue is empty. Callers that drain while a cycle is running join it and
//! receive the same result, which is the first failure of the cycle (later
//! tasks still run) or `Ok(())`.
//!
//! Tasks must not drain their own queue; joining the running cycle from inside
//! it never resolves.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::rc::{Rc, Weak};

use futures_util::future::{LocalBoxFuture, Shared};
use futures_util::FutureExt;
use tracing::{debug, warn};

use crate::error::Result;

pub type Task = LocalBoxFuture<'static, Result<()>>;
type Cycle = Shared<LocalBoxFuture<'static, Result<()>>>;

#[derive(Default)]
struct QueueState {
    pending: VecDeque<Task>,
    cycle: Option<Cycle>,
}

#[derive(Clone, Default)]
pub struct TaskQueue {
    state: Rc<RefCell<QueueState>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `task`. It does not start until a drain reaches it.
    pub fn enqueue<F>(&self, task: F)
    where
        F: Future<Output = Result<()>> + 'static,
    {
        self.state.borrow_mut().pending.push_back(task.boxed_local());
    }

    pub fn len(&self) -> usize {
        self.state.borrow().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().pending.is_empty()
    }

    pub fn is_draining(&self) -> bool {
        self.state.borrow().cycle.is_some()
    }

    /// Runs queued tasks in order until none remain.
    pub async fn drain(&self) -> Result<()> {
        let cycle = {
            let mut state = self.state.borrow_mut();
            if let Some(cycle) = state.cycle.clone() {
                Some(cycle)
            } else if state.pending.is_empty() {
                None
            } else {
                let cycle = run_cycle(Rc::downgrade(&self.state))
                    .boxed_local()
                    .shared();
                state.cycle = Some(cycle.clone());
                Some(cycle)
            }
        };

        match cycle {
            Some(cycle) => cycle.await,
            None => Ok(()),
        }
    }
}

async fn run_cycle(state: Weak<RefCell<QueueState>>) -> Result<()> {
    let mut outcome = Ok(());
    let mut completed = 0usize;

    loop {
        let Some(shared) = state.upgrade() else {
            break;
        };
        let next = {
            let mut state = shared.borrow_mut();
            let next = state.pending.pop_front();
            if next.is_none() {
                state.cycle = None;
            }
            next
        };
        let Some(task) = next else {
            break;
        };
        drop(shared);

        if let Err(err) = task.await {
            warn!(error = %err, "queued player task failed");
            if outcome.is_ok() {
                outcome = Err(err);
            }
        }
        completed += 1;
    }

    debug!(completed, ok = outcome.is_ok(), "task queue drained");
    outcome
}
