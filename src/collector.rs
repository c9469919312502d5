use crate::deadline::Deadline;
use std::fmt::{Debug, Formatter};
use thiserror::Error;
use tokio::sync::oneshot::Sender;
use tokio::task::JoinHandle;

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("The collector task could not be joined/terminated: {0}")]
    TaskJoin(#[source] tokio::task::JoinError),
}

pub trait Sink: Debug + Send + Sync + 'static {}

impl<T> Sink for T where T: Debug + Send + Sync + 'static {}

/// A collector for stream output, running in its own tokio task.
///
/// For proper cleanup, call
/// - `wait()`, which waits for the collecting task to reach EOF on its stream.
/// - `cancel()`, which sends a termination signal and then waits for the task to hand back
///   whatever it collected so far.
///
/// If dropped without either, the termination signal is sent as well, but the task is aborted
/// (forceful, not waiting for completion) and its data is lost.
pub struct Collector<T: Sink> {
    pub(crate) task: Option<JoinHandle<T>>,
    pub(crate) task_termination_sender: Option<Sender<()>>,
}

impl<T: Sink> Collector<T> {
    /// Checks if the collecting task has finished.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map(|t| t.is_finished()).unwrap_or(true)
    }

    /// Wait for the collector to terminate naturally, which happens once its stream is closed.
    ///
    /// If the write side of the stream is never closed, this will hang forever!
    pub async fn wait(mut self) -> Result<T, CollectorError> {
        // Drop the `task_termination_sender`, so that we do not try to use it on `Drop`.
        let _ = self.task_termination_sender.take();
        self.join().await
    }

    /// Sends a cancellation event to the collector, letting it return the partially collected
    /// data.
    pub async fn cancel(mut self) -> Result<T, CollectorError> {
        if let Some(task_termination_sender) = self.task_termination_sender.take() {
            // Sending fails when the task already terminated by reaching EOF, which in turn
            // dropped the receiver end. Joining still yields the collected data.
            let _res = task_termination_sender.send(());
        }
        self.join().await
    }

    /// Waits for the collector to terminate naturally, cancelling it once `deadline` expires.
    ///
    /// The returned flag tells whether the collector had to be cancelled, in which case the
    /// collected data may be incomplete.
    pub async fn wait_or_cancel_at(
        mut self,
        deadline: &Deadline,
    ) -> Result<(T, bool), CollectorError> {
        let Some(mut task) = self.task.take() else {
            unreachable!("The collector task was already joined");
        };

        let joined = tokio::select! {
            biased;
            joined = &mut task => Some(joined),
            () = deadline.expired() => None,
        };

        match joined {
            Some(joined) => {
                let _ = self.task_termination_sender.take();
                joined
                    .map(|sink| (sink, false))
                    .map_err(CollectorError::TaskJoin)
            }
            None => {
                self.task = Some(task);
                self.cancel().await.map(|sink| (sink, true))
            }
        }
    }

    async fn join(&mut self) -> Result<T, CollectorError> {
        match self.task.take() {
            Some(task) => task.await.map_err(CollectorError::TaskJoin),
            None => unreachable!("The collector task was already joined"),
        }
    }
}

impl<T: Sink> Debug for Collector<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("task", &"non-debug < JoinHandle<T> >")
            .field("is_finished", &self.is_finished())
            .finish()
    }
}

impl<T: Sink> Drop for Collector<T> {
    fn drop(&mut self) {
        if let Some(task_termination_sender) = self.task_termination_sender.take() {
            let _res = task_termination_sender.send(());
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
