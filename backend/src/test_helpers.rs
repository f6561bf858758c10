//! Fixtures for tests: a workbook of in-memory tabs wired into a [`Store`].

use crate::config::TableUrls;
use crate::store::{MemoryStore, Row, Store, Table, TableKind, TableRef, TableStore};
use std::sync::Arc;

pub const TEST_SPREADSHEET_ID: &str = "test-workbook";

fn tab_id(kind: TableKind) -> i64 {
    match kind {
        TableKind::Inventory => 0,
        TableKind::SoldItems => 1,
        TableKind::Invoices => 2,
        TableKind::Customers => 3,
        TableKind::UsedFreebie => 4,
        TableKind::Index => 5,
    }
}

pub fn sheet_url(kind: TableKind) -> String {
    format!(
        "https://docs.google.com/spreadsheets/d/{}/edit#gid={}",
        TEST_SPREADSHEET_ID,
        tab_id(kind)
    )
}

pub fn table_ref(kind: TableKind) -> TableRef {
    TableRef::new(TEST_SPREADSHEET_ID, tab_id(kind))
}

pub fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect()
}

/// In-memory workbook with a configurable set of tabs.
#[derive(Clone)]
pub struct TestBook {
    pub memory: MemoryStore,
    pub store: Store,
}

impl TestBook {
    /// Every table configured.
    pub fn new() -> Self {
        Self::with_tables(&TableKind::ALL)
    }

    pub fn with_tables(kinds: &[TableKind]) -> Self {
        let url = |kind: TableKind| kinds.contains(&kind).then(|| sheet_url(kind));
        let urls = TableUrls {
            inventory: url(TableKind::Inventory),
            sold_items: url(TableKind::SoldItems),
            invoices: url(TableKind::Invoices),
            customers: url(TableKind::Customers),
            used_freebie: url(TableKind::UsedFreebie),
            index: url(TableKind::Index),
        };
        let memory = MemoryStore::new();
        let store = Store::new(Arc::new(memory.clone()), urls);
        Self { memory, store }
    }

    pub async fn seed(&self, kind: TableKind, rows: &[&[&str]]) {
        self.memory.seed(&table_ref(kind), grid(rows)).await;
    }

    /// Rows as currently stored, without reconciliation.
    pub async fn rows(&self, kind: TableKind) -> Vec<Row> {
        self.memory
            .read(&table_ref(kind))
            .await
            .map(|t: Table| t.rows().to_vec())
            .unwrap_or_default()
    }

    pub async fn raw(&self, kind: TableKind) -> Vec<Vec<String>> {
        self.memory.snapshot(&table_ref(kind)).await
    }
}

impl Default for TestBook {
    fn default() -> Self {
        Self::new()
    }
}
