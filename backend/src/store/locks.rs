use super::TableRef;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per tab. Every read-modify-write cycle holds the locks of
/// all tabs it touches so concurrent requests cannot overwrite each other.
#[derive(Clone, Default)]
pub struct TableLocks {
    inner: Arc<Mutex<HashMap<TableRef, Arc<AsyncMutex<()>>>>>,
}

/// Held locks; released on drop.
pub struct TableGuard {
    guards: Vec<OwnedMutexGuard<()>>,
}

impl TableGuard {
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

impl TableLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, table: &TableRef) -> Arc<AsyncMutex<()>> {
        let mut registry = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        registry
            .entry(table.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Acquire the locks for `tables`. Refs are sorted and deduplicated first,
    /// so two callers asking for overlapping sets cannot deadlock.
    pub async fn acquire(&self, mut tables: Vec<TableRef>) -> TableGuard {
        tables.sort();
        tables.dedup();

        let mut guards = Vec::with_capacity(tables.len());
        for table in &tables {
            guards.push(self.lock_for(table).lock_owned().await);
        }
        TableGuard { guards }
    }
}
