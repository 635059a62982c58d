use super::CancellableTask;
use crate::types::Result;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Manages background tasks with proper lifecycle handling
#[derive(Debug, Default)]
pub struct TaskManager {
    parent: CancellationToken,
    tasks: Vec<(&'static str, CancellableTask)>,
}

impl TaskManager {
    /// Create a new empty task manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Tasks spawned by this manager also stop when `parent` is cancelled
    pub fn with_parent(parent: CancellationToken) -> Self {
        Self {
            parent,
            tasks: Vec::new(),
        }
    }

    /// Spawn a cancellable task and track it under `name`
    pub fn spawn<F, Fut>(&mut self, name: &'static str, action: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        tracing::debug!("Starting {} task", name);
        let task = CancellableTask::run_with_token(self.parent.child_token(), action);
        self.tasks.push((name, task));
    }

    /// Move the tracked tasks into a new manager, leaving this one empty
    pub fn take(&mut self) -> Self {
        Self {
            parent: self.parent.clone(),
            tasks: std::mem::take(&mut self.tasks),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.iter().any(|(task_name, _)| *task_name == name)
    }

    /// Cancel all tracked tasks and wait until every one has stopped.
    ///
    /// Every task is awaited even if one fails; the first non-cancellation
    /// failure is returned.
    pub async fn shutdown(mut self) -> Result<()> {
        let tasks = std::mem::take(&mut self.tasks);
        for (_, task) in &tasks {
            task.cancel();
        }

        let outcomes = futures::future::join_all(tasks.into_iter().map(|(name, task)| async move {
            let outcome = task.cancel_and_wait().await;
            match &outcome {
                Ok(()) => tracing::debug!("{} task stopped", name),
                Err(e) => tracing::error!("{} task failed while stopping: {}", name, e),
            }
            outcome
        }))
        .await;

        outcomes.into_iter().collect()
    }

    /// Cancel all tasks without waiting
    pub fn abort_all(&mut self) {
        for (_, task) in &self.tasks {
            task.cancel();
        }
        self.tasks.clear();
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        self.abort_all();
    }
}
