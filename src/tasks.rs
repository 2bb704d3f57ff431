//! Parallel fan-out over independent work items.
//!
//! Every stage of a build that touches many files (loading sources, copying
//! media, rendering pages) runs its items through [`run_group`]. The group
//! waits for every item and hands back one outcome per item, so a single bad
//! file never cancels its siblings and the caller decides what a failure
//! means.
//!
//! Items run on the global rayon pool, which `main` sizes from
//! `processing.maxThreads`. Outcomes come back in input order, keeping logs
//! and reports deterministic regardless of scheduling.

use rayon::prelude::*;

/// A failed work item: its label and the error it produced.
#[derive(Debug)]
pub struct TaskFailure<E> {
    pub item: String,
    pub error: E,
}

/// Outcomes of one task group, split by success.
#[derive(Debug)]
pub struct TaskOutcomes<T, E> {
    pub completed: Vec<T>,
    pub failed: Vec<TaskFailure<E>>,
}

impl<T, E> TaskOutcomes<T, E> {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.completed.len() + self.failed.len()
    }
}

/// Run `work` over every item in parallel and collect all outcomes.
///
/// `label` names an item in failure records (usually its relative path).
pub fn run_group<I, T, E>(
    items: &[I],
    label: impl Fn(&I) -> String + Sync,
    work: impl Fn(&I) -> Result<T, E> + Sync,
) -> TaskOutcomes<T, E>
where
    I: Sync,
    T: Send,
    E: Send,
{
    let results: Vec<Result<T, TaskFailure<E>>> = items
        .par_iter()
        .map(|item| {
            work(item).map_err(|error| TaskFailure {
                item: label(item),
                error,
            })
        })
        .collect();

    let mut outcomes = TaskOutcomes {
        completed: Vec::with_capacity(results.len()),
        failed: Vec::new(),
    };
    for result in results {
        match result {
            Ok(value) => outcomes.completed.push(value),
            Err(failure) => outcomes.failed.push(failure),
        }
    }
    outcomes
}
