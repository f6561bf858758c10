use super::{Table, TableRef, TableStore};
use crate::error::AppError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Tabs held in process memory as raw cell grids, the way a spreadsheet
/// would hold them: every cell is text.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tabs: Arc<RwLock<HashMap<TableRef, Vec<Vec<String>>>>>,
    offline: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a tab's raw grid (header row first).
    pub async fn seed(&self, table: &TableRef, values: Vec<Vec<String>>) {
        self.tabs.write().await.insert(table.clone(), values);
    }

    /// Raw grid currently stored for a tab.
    pub async fn snapshot(&self, table: &TableRef) -> Vec<Vec<String>> {
        self.tabs
            .read()
            .await
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Make every read and write fail as if the backend were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), AppError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Connectivity("memory store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn read(&self, table: &TableRef) -> Result<Table, AppError> {
        self.check_online()?;
        let tabs = self.tabs.read().await;
        Ok(tabs
            .get(table)
            .cloned()
            .map(Table::from_values)
            .unwrap_or_default())
    }

    async fn write(&self, data: &Table, table: &TableRef) -> Result<(), AppError> {
        self.check_online()?;
        self.tabs.write().await.insert(table.clone(), data.to_values());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
