//! Asynchronous routing jobs: submission, worker execution and polling.
//!
//! Only coordinates and indices ever cross the queue or land in the store.
//! Callers keep their own labels and remap the returned indices themselves
//! (see [`crate::adapter::remap`]).

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::audit::AuditEntry;
use crate::error::{Error, Result};
use crate::model::{SolveResult, validate_coordinate};
use crate::solver::{self, SolveOptions};
use crate::traits::{AuditSink, TaskStore, WorkQueue};

/// Serializable unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub task_id: Uuid,
    pub locations: Vec<(f64, f64)>,
    pub depot_index: usize,
    /// Stops the caller asked for, excluding an explicit depot. Audit only.
    pub input_stops_count: usize,
}

impl Job {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskState {
    Pending,
    Running,
    Succeeded(SolveResult),
    Failed(String),
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed(_))
    }
}

/// Outcome of a worker claiming a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Begin {
    /// Pending -> Running.
    Started,
    /// Another delivery already claimed it and has not finished.
    Redelivered,
    /// Already terminal; nothing to do.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskHandle {
    pub id: Uuid,
}

// ============================================================================
// In-process collaborators
// ============================================================================

/// Queue backed by a crossbeam channel of JSON-encoded jobs.
#[derive(Debug, Clone)]
pub struct ChannelQueue {
    sender: Sender<Vec<u8>>,
}

/// Consuming side of a [`ChannelQueue`]; cloneable across workers.
#[derive(Debug, Clone)]
pub struct JobReceiver {
    receiver: Receiver<Vec<u8>>,
}

pub fn channel_queue() -> (ChannelQueue, JobReceiver) {
    let (sender, receiver) = crossbeam_channel::unbounded();
    (ChannelQueue { sender }, JobReceiver { receiver })
}

impl WorkQueue for ChannelQueue {
    fn publish(&self, job: &Job) -> Result<()> {
        let payload = job.to_bytes()?;
        self.sender
            .send(payload)
            .map_err(|_| Error::Queue("all workers have shut down".to_string()))
    }
}

/// Default retention of finished tasks, matching a one-day result backend expiry.
pub const DEFAULT_RESULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug)]
struct StoredTask {
    state: TaskState,
    /// Set once the task reaches a terminal state.
    finished_at: Option<Instant>,
}

impl StoredTask {
    fn expired(&self, ttl: Duration, now: Instant) -> bool {
        self.finished_at
            .is_some_and(|finished| now.saturating_duration_since(finished) >= ttl)
    }
}

/// In-memory result backend. Finished tasks are kept for `ttl` and then
/// forgotten; pending and running tasks never expire.
#[derive(Debug)]
pub struct MemoryTaskStore {
    tasks: RwLock<HashMap<Uuid, StoredTask>>,
    ttl: Duration,
}

impl Default for MemoryTaskStore {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_RESULT_TTL)
    }
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of tasks currently held, expired ones included until the next
    /// sweep.
    pub fn len(&self) -> usize {
        self.tasks.read().map(|tasks| tasks.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired task. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize> {
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        Ok(sweep(&mut tasks, self.ttl))
    }
}

fn sweep(tasks: &mut HashMap<Uuid, StoredTask>, ttl: Duration) -> usize {
    let now = Instant::now();
    let before = tasks.len();
    tasks.retain(|_, task| !task.expired(ttl, now));
    let removed = before - tasks.len();
    if removed > 0 {
        debug!(removed, "expired task results purged");
    }
    removed
}

fn poisoned<T>(_: T) -> Error {
    Error::other("task store lock poisoned")
}

impl TaskStore for MemoryTaskStore {
    fn insert_pending(&self, id: Uuid) -> Result<()> {
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        sweep(&mut tasks, self.ttl);
        if tasks.contains_key(&id) {
            return Err(Error::invalid_input(format!("task {id} already exists")));
        }
        tasks.insert(
            id,
            StoredTask {
                state: TaskState::Pending,
                finished_at: None,
            },
        );
        Ok(())
    }

    fn begin(&self, id: Uuid) -> Result<Begin> {
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        let task = tasks.get_mut(&id).ok_or(Error::TaskNotFound(id))?;
        Ok(match task.state {
            TaskState::Pending => {
                task.state = TaskState::Running;
                Begin::Started
            }
            TaskState::Running => Begin::Redelivered,
            TaskState::Succeeded(_) | TaskState::Failed(_) => Begin::Finished,
        })
    }

    fn finish(&self, id: Uuid, outcome: TaskState) -> Result<bool> {
        if !outcome.is_terminal() {
            return Err(Error::invalid_input("finish requires a terminal state"));
        }
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        let task = tasks.get_mut(&id).ok_or(Error::TaskNotFound(id))?;
        if task.state.is_terminal() {
            return Ok(false);
        }
        task.state = outcome;
        task.finished_at = Some(Instant::now());
        Ok(true)
    }

    fn get(&self, id: Uuid) -> Result<Option<TaskState>> {
        let tasks = self.tasks.read().map_err(poisoned)?;
        Ok(tasks
            .get(&id)
            .filter(|task| !task.expired(self.ttl, Instant::now()))
            .map(|task| task.state.clone()))
    }

    fn discard(&self, id: Uuid) -> Result<()> {
        self.tasks.write().map_err(poisoned)?.remove(&id);
        Ok(())
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Submit/poll front of the task lifecycle.
#[derive(Clone)]
pub struct Orchestrator {
    queue: Arc<dyn WorkQueue>,
    store: Arc<dyn TaskStore>,
}

impl Orchestrator {
    pub fn new(queue: Arc<dyn WorkQueue>, store: Arc<dyn TaskStore>) -> Self {
        Self { queue, store }
    }

    /// Validate and enqueue a job. Returns as soon as the job is published.
    pub fn submit(&self, locations: Vec<(f64, f64)>, depot_index: usize) -> Result<TaskHandle> {
        let stops = locations.len();
        self.submit_stops(locations, depot_index, stops)
    }

    /// [`submit`](Self::submit) for a request whose depot was given
    /// separately from its `input_stops_count` stops.
    pub fn submit_stops(
        &self,
        locations: Vec<(f64, f64)>,
        depot_index: usize,
        input_stops_count: usize,
    ) -> Result<TaskHandle> {
        if !locations.is_empty() && depot_index >= locations.len() {
            return Err(Error::DepotOutOfRange {
                index: depot_index,
                len: locations.len(),
            });
        }
        for (index, location) in locations.iter().enumerate() {
            validate_coordinate(index, *location)?;
        }

        let id = Uuid::new_v4();
        let job = Job {
            task_id: id,
            locations,
            depot_index,
            input_stops_count,
        };

        self.store.insert_pending(id)?;
        if let Err(err) = self.queue.publish(&job) {
            error!(task_id = %id, error = %err, "failed to publish job");
            if let Err(discard_err) = self.store.discard(id) {
                warn!(task_id = %id, error = %discard_err, "failed to discard unpublished task");
            }
            return Err(err);
        }

        info!(task_id = %id, points = job.locations.len(), "task submitted");
        Ok(TaskHandle { id })
    }

    /// Current state of a task. Never blocks on a running solve.
    pub fn poll(&self, id: Uuid) -> Result<TaskState> {
        self.store.get(id)?.ok_or(Error::TaskNotFound(id))
    }
}

// ============================================================================
// Workers
// ============================================================================

/// Shared context every worker thread runs with.
#[derive(Clone)]
pub struct WorkerContext {
    pub store: Arc<dyn TaskStore>,
    pub audit: Arc<dyn AuditSink>,
    pub options: SolveOptions,
}

pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Start `workers` threads consuming from `receiver`. Threads exit once
    /// every queue handle has been dropped and the channel is drained.
    pub fn spawn(workers: usize, receiver: JobReceiver, context: WorkerContext) -> Result<Self> {
        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let receiver = receiver.clone();
            let context = context.clone();
            let handle = thread::Builder::new()
                .name(format!("route-worker-{worker}"))
                .spawn(move || {
                    debug!(worker, "worker started");
                    for payload in receiver.receiver.iter() {
                        process_payload(&payload, &context);
                    }
                    debug!(worker, "worker stopped");
                })?;
            handles.push(handle);
        }
        Ok(Self { handles })
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for all workers to drain the queue and exit.
    pub fn join(self) {
        for handle in self.handles {
            if handle.join().is_err() {
                error!("worker thread panicked");
            }
        }
    }
}

/// Handle one delivery. Safe to call repeatedly with the same payload.
pub fn process_payload(payload: &[u8], context: &WorkerContext) {
    let job = match Job::from_bytes(payload) {
        Ok(job) => job,
        Err(err) => {
            error!(error = %err, "dropping undecodable job");
            return;
        }
    };
    let id = job.task_id;

    match context.store.begin(id) {
        Ok(Begin::Started) => info!(task_id = %id, "task running"),
        Ok(Begin::Redelivered) => warn!(task_id = %id, "task redelivered while running"),
        Ok(Begin::Finished) => {
            debug!(task_id = %id, "duplicate delivery of finished task");
            return;
        }
        Err(err) => {
            warn!(task_id = %id, error = %err, "cannot claim task");
            return;
        }
    }

    let outcome = match run_job(&job, &context.options) {
        Ok(result) => TaskState::Succeeded(result),
        Err(err) => {
            error!(task_id = %id, error = %err, "task failed");
            TaskState::Failed(err.to_string())
        }
    };

    let audit_entry = match &outcome {
        TaskState::Succeeded(result) => {
            Some(AuditEntry::for_task(id, job.input_stops_count, result))
        }
        _ => None,
    };

    match context.store.finish(id, outcome) {
        Ok(true) => {
            info!(task_id = %id, "task finished");
            if let Some(entry) = audit_entry {
                if let Err(err) = context.audit.record(&entry) {
                    error!(task_id = %id, error = %err, "audit log write failed");
                }
            }
        }
        Ok(false) => debug!(task_id = %id, "task already finished by another delivery"),
        Err(err) => error!(task_id = %id, error = %err, "failed to store task outcome"),
    }
}

/// Run the solver, turning panics into worker faults.
pub fn run_job(job: &Job, options: &SolveOptions) -> Result<SolveResult> {
    match panic::catch_unwind(AssertUnwindSafe(|| {
        solver::solve(&job.locations, job.depot_index, options)
    })) {
        Ok(result) => result,
        Err(payload) => Err(Error::WorkerFault(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "solver panicked".to_string()
    }
}
