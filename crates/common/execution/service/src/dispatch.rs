use futures::future::BoxFuture;
use tokio::sync::{mpsc, oneshot};

use crate::errors::ExecutionServiceError;

/// A single-worker FIFO work queue.
///
/// Units of work submitted through [`sync`](Self::sync) run to completion on
/// one worker task in strict submission order, never interleaved. The
/// submitting caller blocks only until its own unit finishes.
/// Submission buffer depth. Submitters block in [`sync`](SerialDispatchQueue::sync)
/// until their unit completes, so the queue never grows past the number of
/// concurrent submitters; past this depth, submission itself waits.
const DISPATCH_QUEUE_DEPTH: usize = 16;

pub struct SerialDispatchQueue {
    sender: mpsc::Sender<BoxFuture<'static, ()>>,
}

impl SerialDispatchQueue {
    /// Spawn the worker task and return the submission handle.
    pub fn spawn() -> Self {
        let (sender, mut receiver) = mpsc::channel::<BoxFuture<'static, ()>>(DISPATCH_QUEUE_DEPTH);
        tokio::spawn(async move {
            while let Some(work) = receiver.recv().await {
                work.await;
            }
        });
        SerialDispatchQueue { sender }
    }

    /// Run `work` on the queue worker and wait for its output.
    pub async fn sync<T, F>(&self, work: F) -> Result<T, ExecutionServiceError>
    where
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
    {
        let (completion_sender, completion) = oneshot::channel();
        let unit = Box::pin(async move {
            // The receiver is only dropped if the submitter gave up; the
            // work itself has already run by then.
            let _ = completion_sender.send(work.await);
        });
        self.sender
            .send(unit)
            .await
            .map_err(|_| ExecutionServiceError::DispatchClosed)?;
        completion
            .await
            .map_err(|_| ExecutionServiceError::DispatchClosed)
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use parking_lot::Mutex;

    use super::*;

    #[tokio::test]
    async fn units_run_in_submission_order() {
        let queue = SerialDispatchQueue::spawn();
        let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(vec![]));

        let first_order = order.clone();
        let first = queue.sync(async move {
            // Give the second unit every chance to overtake if the queue
            // allowed interleaving.
            tokio::time::sleep(Duration::from_millis(50)).await;
            first_order.lock().push("first");
        });
        let second_order = order.clone();
        let second = queue.sync(async move {
            second_order.lock().push("second");
        });

        let (first_result, second_result) = tokio::join!(first, second);
        assert_eq!(first_result, Ok(()));
        assert_eq!(second_result, Ok(()));
        assert_eq!(*order.lock(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn order_holds_past_the_submission_buffer() {
        let queue = SerialDispatchQueue::spawn();
        let order: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(vec![]));

        // More concurrent submitters than the buffer holds.
        let units = (0..3 * DISPATCH_QUEUE_DEPTH).map(|index| {
            let order = order.clone();
            queue.sync(async move {
                order.lock().push(index);
            })
        });
        let results = futures::future::join_all(units).await;

        assert!(results.iter().all(|result| result.is_ok()));
        assert_eq!(*order.lock(), (0..3 * DISPATCH_QUEUE_DEPTH).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn sync_returns_the_unit_output() {
        let queue = SerialDispatchQueue::spawn();
        assert_eq!(queue.sync(async { 21 * 2 }).await, Ok(42));
    }
}
