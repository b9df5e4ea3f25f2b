//! Fan-out/fan-in over a shared cancellable scope
//!
//! One tokio task is spawned per work item. A task checks the scope exactly
//! once, before it starts; a task that fails cancels the scope so that tasks
//! which have not started yet short-circuit. Running tasks are never
//! interrupted. Each task returns its own partial result and the results are
//! merged after every task has been joined.

use crate::error::{Result, ScrapeError};
use std::collections::HashMap;
use std::future::Future;
use tokio::task::{Id, JoinSet};
use tokio_util::sync::CancellationToken;

/// Result of one spawned task
#[derive(Debug)]
pub struct TaskOutcome<T> {
    /// Position of the work item in the input
    pub index: usize,
    pub label: String,
    pub result: Result<T>,
}

/// Spawn `task` once per item and join them all.
///
/// Outcomes are returned in completion order.
pub async fn spawn_all<I, T, L, F, Fut>(
    scope: &CancellationToken,
    items: impl IntoIterator<Item = I>,
    describe: L,
    task: F,
) -> Vec<TaskOutcome<T>>
where
    L: Fn(&I) -> String,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let mut set = JoinSet::new();
    let mut spawned: HashMap<Id, (usize, String)> = HashMap::new();

    for (index, item) in items.into_iter().enumerate() {
        let label = describe(&item);
        let scope = scope.clone();
        let work = task(item);
        let task_label = label.clone();

        let handle = set.spawn(async move {
            if scope.is_cancelled() {
                tracing::debug!("{} skipped, scope already cancelled", label);
                let result = Err(ScrapeError::Cancelled(label.clone()));
                return TaskOutcome {
                    index,
                    label,
                    result,
                };
            }

            let result = work.await;
            if let Err(e) = &result {
                tracing::debug!("{} failed, cancelling scope: {}", label, e);
                scope.cancel();
            }

            TaskOutcome {
                index,
                label,
                result,
            }
        });
        spawned.insert(handle.id(), (index, task_label));
    }

    let mut outcomes = Vec::with_capacity(set.len());
    while let Some(joined) = set.join_next_with_id().await {
        match joined {
            Ok((_, outcome)) => outcomes.push(outcome),
            Err(e) => {
                scope.cancel();
                let (index, label) = spawned
                    .remove(&e.id())
                    .unwrap_or((usize::MAX, "enumeration task".to_string()));
                tracing::debug!("{} did not complete: {}", label, e);
                let result = Err(ScrapeError::Task(e).context(label.clone()));
                outcomes.push(TaskOutcome {
                    index,
                    label,
                    result,
                });
            }
        }
    }

    outcomes
}

/// Merge joined outcomes into one result.
///
/// Successful partial results are concatenated in input order. On failure the
/// first error observed wins, preferring a real failure over the `Cancelled`
/// errors it caused.
pub fn merge<T>(outcomes: Vec<TaskOutcome<Vec<T>>>) -> Result<Vec<T>> {
    let mut parts = Vec::with_capacity(outcomes.len());
    let mut cancelled = None;

    for outcome in outcomes {
        match outcome.result {
            Ok(items) => parts.push((outcome.index, items)),
            Err(e) if e.is_cancelled() => {
                cancelled.get_or_insert(e);
            }
            Err(e) => return Err(e),
        }
    }

    if let Some(e) = cancelled {
        return Err(e);
    }

    parts.sort_by_key(|(index, _)| *index);
    Ok(parts.into_iter().flat_map(|(_, items)| items).collect())
}
