//! Bulk bookkeeping for the remote imagery service's export queue.
//!
//! The service itself is an external collaborator; only the slice of
//! its task surface needed to cancel everything still active is
//! modeled here.

use log::info;
use rayon::prelude::*;

use crate::errors::Result;

/// Lifecycle states a remote export task can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Ready,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskState {
    /// Whether a task in this state can still be cancelled.
    pub fn is_active(self) -> bool {
        matches!(self, TaskState::Ready | TaskState::Running)
    }
}

/// A task as listed by the remote service.
#[derive(Debug, Clone)]
pub struct RemoteTask {
    pub id: String,
    pub state: TaskState,
}

/// The slice of the remote service needed for bulk cancellation.
pub trait TaskService: Sync {
    fn tasks(&self) -> Result<Vec<RemoteTask>>;
    fn cancel(&self, task_id: &str) -> Result<()>;
}

/// Per item outcomes of a bulk cancellation.
#[derive(Debug, Default)]
pub struct CancelReport {
    /// Tasks that were active and got cancelled.
    pub cancelled: Vec<String>,
    /// Tasks skipped because they were no longer active.
    pub skipped: Vec<String>,
    /// Tasks whose cancel call failed, with the failure rendered.
    pub failed: Vec<(String, String)>,
}

enum Outcome {
    Cancelled,
    Skipped,
    Failed(String),
}

/// Visit every listed task once and cancel the active ones.
///
/// A failing cancel is recorded in the report instead of aborting the
/// rest of the batch; only the initial task listing can fail the call.
pub fn cancel_active_tasks<S: TaskService>(service: &S) -> Result<CancelReport> {
    let tasks = service.tasks()?;
    let outcomes: Vec<(String, Outcome)> = tasks
        .into_par_iter()
        .map(|task| {
            let outcome = if !task.state.is_active() {
                Outcome::Skipped
            } else {
                match service.cancel(&task.id) {
                    Ok(()) => Outcome::Cancelled,
                    Err(error) => Outcome::Failed(error.to_string()),
                }
            };
            (task.id, outcome)
        })
        .collect();

    let mut report = CancelReport::default();
    for (id, outcome) in outcomes {
        match outcome {
            Outcome::Cancelled => report.cancelled.push(id),
            Outcome::Skipped => report.skipped.push(id),
            Outcome::Failed(error) => report.failed.push((id, error)),
        }
    }
    info!(
        "cancelled {} tasks ({} skipped, {} failed)",
        report.cancelled.len(),
        report.skipped.len(),
        report.failed.len()
    );
    Ok(report)
}
