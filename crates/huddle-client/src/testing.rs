//! A local backend with switchable failures, for unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use huddle_store::{
    Document, DocumentStore, Fields, LocalBackend, Query, Result, StoreError, Subscription,
    WriteBatch,
};

#[derive(Default)]
struct Faults {
    writes: AtomicBool,
    sets: AtomicBool,
    next_subscribe: AtomicBool,
}

#[derive(Clone)]
pub(crate) struct FaultyStore {
    inner: LocalBackend,
    faults: Arc<Faults>,
}

impl FaultyStore {
    pub(crate) fn new() -> Self {
        Self {
            inner: LocalBackend::open_in_memory().unwrap(),
            faults: Arc::new(Faults::default()),
        }
    }

    /// Fail every write.
    pub(crate) fn fail_writes(&self, on: bool) {
        self.faults.writes.store(on, Ordering::SeqCst);
    }

    /// Fail point `set`s only; deletes and batches still go through.
    pub(crate) fn fail_sets(&self, on: bool) {
        self.faults.sets.store(on, Ordering::SeqCst);
    }

    /// The next subscription delivers a single error and ends.
    pub(crate) fn fail_next_subscribe(&self) {
        self.faults.next_subscribe.store(true, Ordering::SeqCst);
    }

    fn check_write(&self) -> Result<()> {
        if self.faults.writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("offline".into()));
        }
        Ok(())
    }
}

impl DocumentStore for FaultyStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        self.inner.get(collection, id).await
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        self.check_write()?;
        if self.faults.sets.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("offline".into()));
        }
        self.inner.set(collection, id, fields).await
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<String> {
        self.check_write()?;
        self.inner.add(collection, fields).await
    }

    async fn update(&self, collection: &str, id: &str, partial: Fields) -> Result<()> {
        self.check_write()?;
        self.inner.update(collection, id, partial).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.check_write()?;
        self.inner.delete(collection, id).await
    }

    async fn list(&self, query: &Query) -> Result<Vec<Document>> {
        self.inner.list(query).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        self.check_write()?;
        self.inner.commit(batch).await
    }

    fn subscribe(&self, query: Query) -> Result<Subscription> {
        if !self.faults.next_subscribe.swap(false, Ordering::SeqCst) {
            return self.inner.subscribe(query);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            let _ = tx.send(Err(StoreError::Unavailable("boom".into())));
        });
        Ok(Subscription::new(rx, task))
    }
}
