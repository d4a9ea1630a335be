//! Bounded fan-out over a batch of work items
//!
//! A pool never runs more than `concurrency` futures at once. The ordered
//! variant yields results in input order, so a pool of size 1 is fully
//! sequential and deterministic.

use futures::StreamExt;
use futures::stream;
use std::future::Future;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct WorkerPool {
    name: &'static str,
    concurrency: usize,
}

impl WorkerPool {
    pub fn new(name: &'static str, concurrency: usize) -> Self {
        Self {
            name,
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run `task` over every item; results come back in input order
    pub async fn run_ordered<I, F, Fut, T>(&self, items: I, task: F) -> Vec<T>
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Fut,
        Fut: Future<Output = T>,
    {
        trace!("{} pool: ordered batch, {} workers", self.name, self.concurrency);
        stream::iter(items)
            .map(task)
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// Run `task` over every item; results come back in completion order
    pub async fn run_unordered<I, F, Fut, T>(&self, items: I, task: F) -> Vec<T>
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Fut,
        Fut: Future<Output = T>,
    {
        trace!("{} pool: unordered batch, {} workers", self.name, self.concurrency);
        stream::iter(items)
            .map(task)
            .buffer_unordered(self.concurrency)
            .collect()
            .await
    }
}
