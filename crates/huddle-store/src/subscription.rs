use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::query::Document;

/// Handle to a live query.
///
/// Snapshots arrive in order, one at a time.  An `Err` item means the query
/// failed mid-stream; nothing follows it.  Dropping the handle (or calling
/// [`Subscription::cancel`]) stops the feeding task.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<Result<Vec<Document>>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Wrap a snapshot channel fed by `task`.
    pub fn new(rx: mpsc::UnboundedReceiver<Result<Vec<Document>>>, task: JoinHandle<()>) -> Self {
        Self {
            rx,
            task: Some(task),
        }
    }

    /// Wait for the next snapshot.  `None` once the feed has ended.
    pub async fn next(&mut self) -> Option<Result<Vec<Document>>> {
        self.rx.recv().await
    }

    /// Unsubscribe.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.rx.close();
    }
}
