//! Collaborator seams for the routing service.
//!
//! These are intentionally minimal. The crate ships in-process
//! implementations; an external broker, result backend or log store can be
//! plugged in by implementing the same traits.

use uuid::Uuid;

use crate::audit::AuditEntry;
use crate::error::Result;
use crate::model::DistanceMatrix;
use crate::tasks::{Begin, Job, TaskState};

/// Provides a distance matrix for a set of locations.
///
/// The matrix is indexed by the provided location order.
pub trait DistanceMatrixProvider {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> DistanceMatrix;
}

/// At-least-once work distribution. Consumers must tolerate redelivery.
pub trait WorkQueue: Send + Sync {
    fn publish(&self, job: &Job) -> Result<()>;
}

/// Result backend holding task state by id.
pub trait TaskStore: Send + Sync {
    /// Record a freshly submitted task as pending.
    fn insert_pending(&self, id: Uuid) -> Result<()>;

    /// Move a task to running when a worker picks it up.
    fn begin(&self, id: Uuid) -> Result<Begin>;

    /// Store a terminal state. Returns false if the task was already
    /// terminal, in which case the stored state is left untouched.
    fn finish(&self, id: Uuid, state: TaskState) -> Result<bool>;

    fn get(&self, id: Uuid) -> Result<Option<TaskState>>;

    /// Forget a task whose job never made it onto the queue.
    fn discard(&self, id: Uuid) -> Result<()>;
}

/// Append-only record of produced routes.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: &AuditEntry) -> Result<()>;
}
