use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use rickshaw_core::{DomainError, DomainResult};
use rickshaw_inventory::StockSnapshot;

use super::StockStore;

/// In-memory stock store for tests/dev.
///
/// Writes can be switched to fail, to exercise rollback paths.
#[derive(Debug, Default)]
pub struct InMemoryStockStore {
    inner: RwLock<Option<StockSnapshot>>,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: StockSnapshot) -> Self {
        Self {
            inner: RwLock::new(Some(snapshot)),
            ..Self::default()
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Last successfully saved snapshot.
    pub fn persisted(&self) -> Option<StockSnapshot> {
        self.inner.read().ok()?.clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl StockStore for InMemoryStockStore {
    fn load(&self) -> DomainResult<Option<StockSnapshot>> {
        let guard = self
            .inner
            .read()
            .map_err(|_| DomainError::io("in-memory store lock poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, snapshot: &StockSnapshot) -> DomainResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::io("in-memory store is refusing writes"));
        }
        let mut guard = self
            .inner
            .write()
            .map_err(|_| DomainError::io("in-memory store lock poisoned"))?;
        *guard = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
