//! Handles to running test tasks.

use core_types::{EasyTestsError, EasyTestsResult};
use tokio::task::JoinHandle;

/// One task per started test, in declaration order
#[derive(Debug, Default)]
pub struct ExecutionHandle {
    tasks: Vec<JoinHandle<EasyTestsResult<()>>>,
}

impl ExecutionHandle {
    /// Handle for a single task
    pub fn single(task: JoinHandle<EasyTestsResult<()>>) -> Self {
        Self { tasks: vec![task] }
    }

    /// Append another handle's tasks
    pub fn extend(&mut self, other: ExecutionHandle) {
        self.tasks.extend(other.tasks);
    }

    /// Number of tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Check if no task was started
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Check if every task has finished
    pub fn is_finished(&self) -> bool {
        self.tasks.iter().all(JoinHandle::is_finished)
    }

    /// Wait for every task to settle.
    ///
    /// # Errors
    /// The first error in declaration order, after all tasks are done.
    /// A panicking task resumes its panic here.
    pub async fn wait(self) -> EasyTestsResult<()> {
        let mut first = None;
        for task in self.tasks {
            let error = match task.await {
                Ok(Ok(())) => continue,
                Ok(Err(error)) => error,
                Err(join) if join.is_panic() => std::panic::resume_unwind(join.into_panic()),
                Err(join) => EasyTestsError::evaluation(format!("test task stopped: {join}")),
            };
            if first.is_none() {
                first = Some(error);
            }
        }
        first.map_or(Ok(()), Err)
    }
}
