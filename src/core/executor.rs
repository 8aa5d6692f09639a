//! Task executor with per-task deadlines.
//!
//! Generation tasks are independent units of work, but one of them can hang:
//! the placement engine retries forever on unfittable geometry. A rayon pool
//! cannot take a job back once it has started, so this executor hands each
//! task to a dedicated OS thread instead, keeps a bounded number of them in
//! flight, and collects results over a channel against per-task deadlines.
//!
//! A task that misses its deadline is abandoned: its slot is released, its
//! outcome is recorded as [`TaskOutcome::TimedOut`], and the orphaned thread
//! is left to run detached. Each task receives a [`TaskHandle`] whose
//! abandonment flag flips when the deadline passes, so a still-running
//! worker can notice at its next boundary and skip side effects; if it
//! finishes anyway, its late result is discarded. Panics inside a task are
//! caught at the thread boundary and surface as [`TaskOutcome::Failed`],
//! never as a batch abort.

use std::collections::{HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use super::errors::{DatagenError, DatagenResult};

/// Terminal state of one executed task.
#[derive(Debug)]
pub enum TaskOutcome {
    /// The task ran to completion.
    Completed,
    /// The task returned an error or panicked.
    Failed(DatagenError),
    /// The task missed its deadline and was abandoned.
    TimedOut,
}

impl TaskOutcome {
    /// Whether the task completed successfully.
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskOutcome::Completed)
    }
}

/// Handle the executor shares with a running task.
///
/// The abandonment flag flips once the task's deadline has passed. Workers
/// check it before committing side effects; an abandoned task's result is
/// discarded either way.
#[derive(Debug, Clone, Default)]
pub struct TaskHandle {
    abandoned: Arc<AtomicBool>,
}

impl TaskHandle {
    /// Whether the executor has abandoned this task.
    pub fn is_abandoned(&self) -> bool {
        self.abandoned.load(Ordering::Relaxed)
    }

    fn abandon(&self) {
        self.abandoned.store(true, Ordering::Relaxed);
    }
}

/// Runs labeled tasks on a bounded pool of worker threads, giving each task
/// the same deadline.
///
/// Results come back in task order, one [`TaskOutcome`] per input task,
/// regardless of the order workers finish in.
///
/// # Arguments
///
/// * `tasks` - `(label, payload)` pairs; the label names the task in logs
///   and thread names.
/// * `workers` - Maximum number of tasks in flight at once.
/// * `timeout` - Per-task deadline, measured from dispatch.
/// * `job` - The work to run for each payload.
pub fn run_tasks<T, F>(
    tasks: Vec<(String, T)>,
    workers: usize,
    timeout: Duration,
    job: F,
) -> Vec<TaskOutcome>
where
    T: Send + 'static,
    F: Fn(T, &TaskHandle) -> DatagenResult<()> + Send + Sync + 'static,
{
    let total = tasks.len();
    let workers = workers.max(1);
    let job = Arc::new(job);

    let (sender, receiver) = mpsc::channel::<(usize, DatagenResult<()>)>();

    let mut outcomes: Vec<Option<TaskOutcome>> = Vec::with_capacity(total);
    outcomes.resize_with(total, || None);

    let mut queue: VecDeque<(usize, String, T)> = tasks
        .into_iter()
        .enumerate()
        .map(|(index, (label, payload))| (index, label, payload))
        .collect();
    let mut in_flight: HashMap<usize, (String, Instant, TaskHandle)> = HashMap::new();

    while !queue.is_empty() || !in_flight.is_empty() {
        // Fill free worker slots from the queue.
        while in_flight.len() < workers {
            let Some((index, label, payload)) = queue.pop_front() else {
                break;
            };

            debug!(task = %label, "dispatching task");
            let handle = TaskHandle::default();
            let sender = sender.clone();
            let job = Arc::clone(&job);
            let worker_handle = handle.clone();
            let spawned = thread::Builder::new()
                .name(format!("datagen-{label}"))
                .spawn(move || {
                    let result =
                        panic::catch_unwind(AssertUnwindSafe(|| job(payload, &worker_handle)))
                            .unwrap_or_else(|panic_payload| {
                                Err(DatagenError::worker_panic(panic_payload.as_ref()))
                            });
                    // The receiver ignores results from abandoned tasks, and
                    // may already be gone entirely.
                    let _ = sender.send((index, result));
                });

            match spawned {
                Ok(_) => {
                    in_flight.insert(index, (label, Instant::now() + timeout, handle));
                }
                Err(error) => {
                    outcomes[index] = Some(TaskOutcome::Failed(DatagenError::Io(error)));
                }
            }
        }

        let Some(earliest) = in_flight
            .values()
            .map(|(_, deadline, _)| *deadline)
            .min()
        else {
            continue;
        };

        match receiver.recv_timeout(earliest.saturating_duration_since(Instant::now())) {
            Ok((index, result)) => {
                if let Some((label, _, _)) = in_flight.remove(&index) {
                    debug!(task = %label, "task finished");
                    outcomes[index] = Some(match result {
                        Ok(()) => TaskOutcome::Completed,
                        Err(error) => TaskOutcome::Failed(error),
                    });
                }
                // A result without an in-flight entry belongs to a task
                // that already timed out; drop it.
            }
            Err(RecvTimeoutError::Timeout) => {
                let now = Instant::now();
                let overdue: Vec<usize> = in_flight
                    .iter()
                    .filter(|(_, (_, deadline, _))| *deadline <= now)
                    .map(|(&index, _)| index)
                    .collect();
                for index in overdue {
                    if let Some((label, _, handle)) = in_flight.remove(&index) {
                        debug!(task = %label, "task missed its deadline, abandoning worker");
                        handle.abandon();
                        outcomes[index] = Some(TaskOutcome::TimedOut);
                    }
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    outcomes
        .into_iter()
        .map(|outcome| outcome.unwrap_or(TaskOutcome::TimedOut))
        .collect()
}
