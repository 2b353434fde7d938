//! A process-wide worker pool: long-lived threads, one FIFO queue behind a
//! mutex + condition variable, and a shutdown broadcast on drop. Results
//! travel either through per-task handles or through a [`CompletionQueue`]
//! when completion order matters more than submission order.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("worker pool is shutting down")]
    ShuttingDown,
    #[error("task panicked: {0}")]
    TaskPanicked(String),
}

type Job = Box<dyn FnOnce() + Send + 'static>;

struct PoolState {
    jobs: VecDeque<Job>,
    shutdown: bool,
}

struct PoolShared {
    state: Mutex<PoolState>,
    available: Condvar,
}

pub struct WorkerPool {
    shared: Arc<PoolShared>,
    workers: Vec<JoinHandle<()>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl WorkerPool {
    pub fn new(threads: usize) -> Self {
        let threads = threads.max(1);
        let shared = Arc::new(PoolShared {
            state: Mutex::new(PoolState {
                jobs: VecDeque::new(),
                shutdown: false,
            }),
            available: Condvar::new(),
        });
        let workers = (0..threads)
            .map(|index| {
                let shared = Arc::clone(&shared);
                thread::Builder::new()
                    .name(format!("hearts-worker-{index}"))
                    .spawn(move || worker_loop(&shared))
                    .expect("spawn worker thread")
            })
            .collect();
        Self { shared, workers }
    }

    /// One worker per hardware thread, falling back to four when the count
    /// is unavailable.
    pub fn with_available_parallelism() -> Self {
        let threads = thread::available_parallelism().map(|n| n.get()).unwrap_or(4);
        Self::new(threads)
    }

    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }

    pub fn pending(&self) -> usize {
        lock(&self.shared.state).jobs.len()
    }

    /// Enqueues a task and returns a handle to its eventual result. Panics
    /// inside the task are caught and surfaced through the handle; they never
    /// take a worker down. Fails once shutdown has begun.
    pub fn submit<T, F>(&self, task: F) -> Result<TaskHandle<T>, PoolError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let slot = Arc::new(TaskSlot {
            value: Mutex::new(None),
            ready: Condvar::new(),
        });
        let filler = Arc::clone(&slot);
        let job: Job = Box::new(move || {
            let outcome = catch_unwind(AssertUnwindSafe(task)).map_err(|payload| {
                let message = panic_message(payload.as_ref());
                PoolError::TaskPanicked(message)
            });
            filler.fill(outcome);
        });

        {
            let mut state = lock(&self.shared.state);
            if state.shutdown {
                return Err(PoolError::ShuttingDown);
            }
            state.jobs.push_back(job);
        }
        self.shared.available.notify_one();
        Ok(TaskHandle { slot })
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        {
            let mut state = lock(&self.shared.state);
            state.shutdown = true;
        }
        self.shared.available.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn worker_loop(shared: &PoolShared) {
    loop {
        let job = {
            let mut state = lock(&shared.state);
            loop {
                if let Some(job) = state.jobs.pop_front() {
                    break job;
                }
                if state.shutdown {
                    return;
                }
                state = shared
                    .available
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };
        job();
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "worker task panicked".to_string()
    }
}

struct TaskSlot<T> {
    value: Mutex<Option<Result<T, PoolError>>>,
    ready: Condvar,
}

impl<T> TaskSlot<T> {
    fn fill(&self, outcome: Result<T, PoolError>) {
        let mut value = lock(&self.value);
        *value = Some(outcome);
        self.ready.notify_all();
    }
}

/// Completion handle for one submitted task.
pub struct TaskHandle<T> {
    slot: Arc<TaskSlot<T>>,
}

impl<T> TaskHandle<T> {
    /// Blocks until the task finishes.
    pub fn wait(self) -> Result<T, PoolError> {
        let mut value = lock(&self.slot.value);
        loop {
            if let Some(outcome) = value.take() {
                return outcome;
            }
            value = self
                .slot
                .ready
                .wait(value)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub fn is_ready(&self) -> bool {
        lock(&self.slot.value).is_some()
    }
}

struct QueueShared<T> {
    items: Mutex<VecDeque<T>>,
    ready: Condvar,
}

/// Unbounded MPMC queue used to collect world results as they finish.
pub struct CompletionQueue<T> {
    shared: Arc<QueueShared<T>>,
}

impl<T> Clone for CompletionQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Default for CompletionQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CompletionQueue<T> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(QueueShared {
                items: Mutex::new(VecDeque::new()),
                ready: Condvar::new(),
            }),
        }
    }

    pub fn push(&self, value: T) {
        let mut items = lock(&self.shared.items);
        items.push_back(value);
        self.shared.ready.notify_one();
    }

    /// Blocks until an item is available.
    pub fn pop(&self) -> T {
        let mut items = lock(&self.shared.items);
        loop {
            if let Some(value) = items.pop_front() {
                return value;
            }
            items = self
                .shared
                .ready
                .wait(items)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Blocks until an item is available or `deadline` passes.
    pub fn pop_until(&self, deadline: Instant) -> Option<T> {
        let mut items = lock(&self.shared.items);
        loop {
            if let Some(value) = items.pop_front() {
                return Some(value);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (guard, timeout) = self
                .shared
                .ready
                .wait_timeout(items, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            items = guard;
            if timeout.timed_out() && items.is_empty() {
                return None;
            }
        }
    }

    pub fn try_pop(&self) -> Option<T> {
        lock(&self.shared.items).pop_front()
    }

    pub fn len(&self) -> usize {
        lock(&self.shared.items).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.shared.items).is_empty()
    }
}
