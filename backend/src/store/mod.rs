//! Record store adapter.
//!
//! Every table lives in one tab of an external spreadsheet. Tables are read in
//! full and written back in full; there is no append or partial update at the
//! storage level. [`TableStore`] is the seam between the business services
//! and whichever backend holds the tabs.

pub mod locks;
pub mod memory;
pub mod sheets;

use crate::config::{AppConfig, StoreBackend, TableUrls};
use crate::error::AppError;
use crate::schema::{self, ReconcileReport, TableSchema};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

pub use locks::{TableGuard, TableLocks};
pub use memory::MemoryStore;
pub use sheets::SheetsStore;

/// One data row: column name to cell text.
pub type Row = HashMap<String, String>;

/// An in-memory copy of one tab: ordered header plus data rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from a raw value grid whose first row is the header.
    ///
    /// Rows with no content at all are skipped. A column without a header
    /// name is kept as `column_<n>` (its 1-based position) when any row has
    /// data in it, and repeated header names get a `_2`, `_3`... suffix, so
    /// writing the table back never loses a cell.
    pub fn from_values(values: Vec<Vec<String>>) -> Self {
        let mut grid = values.into_iter();
        let header = match grid.next() {
            Some(header) => header,
            None => return Self::default(),
        };
        let body: Vec<Vec<String>> = grid
            .filter(|cells| cells.iter().any(|c| !c.trim().is_empty()))
            .collect();
        let width = body.iter().map(Vec::len).fold(header.len(), usize::max);

        let mut named: Vec<(usize, String)> = Vec::with_capacity(width);
        for index in 0..width {
            let name = header.get(index).map(|h| h.trim()).unwrap_or_default();
            let base = if name.is_empty() {
                let has_data = body
                    .iter()
                    .any(|cells| cells.get(index).map_or(false, |c| !c.trim().is_empty()));
                if !has_data {
                    continue;
                }
                format!("column_{}", index + 1)
            } else {
                name.to_string()
            };
            let name = unique_column_name(base, &named);
            named.push((index, name));
        }

        let rows = body
            .into_iter()
            .map(|cells| {
                named
                    .iter()
                    .map(|(i, name)| (name.clone(), cells.get(*i).cloned().unwrap_or_default()))
                    .collect::<Row>()
            })
            .collect();

        Self {
            columns: named.into_iter().map(|(_, name)| name).collect(),
            rows,
        }
    }

    /// Header row followed by every data row, all cells stringified.
    pub fn to_values(&self) -> Vec<Vec<String>> {
        let mut values = Vec::with_capacity(self.rows.len() + 1);
        values.push(self.columns.clone());
        for row in &self.rows {
            values.push(
                self.columns
                    .iter()
                    .map(|col| row.get(col).cloned().unwrap_or_default())
                    .collect(),
            );
        }
        values
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn row_mut(&mut self, index: usize) -> Option<&mut Row> {
        self.rows.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Add a column if absent; existing rows get `fill` in that column.
    pub fn add_column(&mut self, name: &str, fill: impl Fn(&Row) -> String) {
        if self.has_column(name) {
            return;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            let value = fill(row);
            row.insert(name.to_string(), value);
        }
    }

    pub fn rename_column(&mut self, from: &str, to: &str) {
        if from == to || self.has_column(to) {
            return;
        }
        if let Some(col) = self.columns.iter_mut().find(|c| *c == from) {
            *col = to.to_string();
            for row in &mut self.rows {
                if let Some(value) = row.remove(from) {
                    row.insert(to.to_string(), value);
                }
            }
        }
    }

    /// Reorder the header so `leading` columns come first, in that order;
    /// remaining columns keep their relative order.
    pub fn reorder_columns(&mut self, leading: &[&str]) {
        let mut ordered: Vec<String> = leading
            .iter()
            .filter(|name| self.has_column(name))
            .map(|name| name.to_string())
            .collect();
        for col in &self.columns {
            if !ordered.contains(col) {
                ordered.push(col.clone());
            }
        }
        self.columns = ordered;
    }

    /// Append a row. Keys not yet in the header are added as new columns.
    pub fn push_row(&mut self, row: Row) {
        let mut new_columns: Vec<&String> = row.keys().filter(|k| !self.has_column(k)).collect();
        new_columns.sort();
        let new_columns: Vec<String> = new_columns.into_iter().cloned().collect();
        for col in new_columns {
            self.add_column(&col, |_| String::new());
        }
        self.rows.push(row);
    }

    pub fn retain_rows(&mut self, keep: impl FnMut(&Row) -> bool) {
        self.rows.retain(keep);
    }

    /// Non-blank cell value.
    pub fn cell<'a>(row: &'a Row, column: &str) -> Option<&'a str> {
        row.get(column)
            .map(|v| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }
}

fn unique_column_name(base: String, taken: &[(usize, String)]) -> String {
    let is_taken = |candidate: &str| taken.iter().any(|(_, name)| name == candidate);
    if !is_taken(&base) {
        return base;
    }
    let mut suffix = 2;
    loop {
        let candidate = format!("{}_{}", base, suffix);
        if !is_taken(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

/// A concrete tab: spreadsheet id plus tab (`gid`) id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableRef {
    pub spreadsheet_id: String,
    pub tab_id: i64,
}

impl TableRef {
    pub fn new(spreadsheet_id: impl Into<String>, tab_id: i64) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            tab_id,
        }
    }

    /// Resolve a spreadsheet URL such as
    /// `https://docs.google.com/spreadsheets/d/<id>/edit#gid=<tab>`.
    /// The tab comes from the fragment, then the query string, then defaults to 0.
    pub fn parse(url: &str) -> Result<Self, AppError> {
        let parsed = reqwest::Url::parse(url.trim())
            .map_err(|e| AppError::Connectivity(format!("invalid sheet URL '{}': {}", url, e)))?;

        let segments: Vec<&str> = parsed.path_segments().map(|s| s.collect()).unwrap_or_default();
        let spreadsheet_id = segments
            .iter()
            .position(|s| *s == "d")
            .and_then(|i| segments.get(i + 1))
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                AppError::Connectivity(format!("could not extract spreadsheet id from '{}'", url))
            })?;

        let gid_from = |params: &str| {
            params
                .split('&')
                .filter_map(|pair| pair.split_once('='))
                .find(|(key, _)| *key == "gid")
                .map(|(_, value)| value.to_string())
        };

        let gid = parsed
            .fragment()
            .and_then(gid_from)
            .or_else(|| parsed.query().and_then(gid_from))
            .unwrap_or_else(|| "0".to_string());

        let tab_id = gid
            .parse::<i64>()
            .map_err(|_| AppError::Connectivity(format!("invalid tab id '{}' in '{}'", gid, url)))?;

        Ok(Self::new(*spreadsheet_id, tab_id))
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#gid={}", self.spreadsheet_id, self.tab_id)
    }
}

/// Full-read / full-overwrite access to tabs.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Load every row of the tab. A tab without data rows yields an empty table.
    async fn read(&self, table: &TableRef) -> Result<Table, AppError>;

    /// Replace the tab's entire contents with `data`: header, then all rows.
    async fn write(&self, data: &Table, table: &TableRef) -> Result<(), AppError>;

    fn backend_name(&self) -> &'static str;
}

/// The logical tables the application keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Inventory,
    SoldItems,
    Invoices,
    Customers,
    UsedFreebie,
    Index,
}

impl TableKind {
    pub const ALL: [TableKind; 6] = [
        TableKind::Inventory,
        TableKind::SoldItems,
        TableKind::Invoices,
        TableKind::Customers,
        TableKind::UsedFreebie,
        TableKind::Index,
    ];

    /// Tab title used in the spreadsheet.
    pub fn tab_name(&self) -> &'static str {
        self.schema().tab_name
    }

    pub fn schema(&self) -> &'static TableSchema {
        match self {
            TableKind::Inventory => &schema::INVENTORY,
            TableKind::SoldItems => &schema::SOLD_ITEMS,
            TableKind::Invoices => &schema::INVOICES,
            TableKind::Customers => &schema::CUSTOMERS,
            TableKind::UsedFreebie => &schema::USED_FREEBIE,
            TableKind::Index => &schema::INDEX,
        }
    }

    fn url(&self, urls: &TableUrls) -> Option<String> {
        match self {
            TableKind::Inventory => urls.inventory.clone(),
            TableKind::SoldItems => urls.sold_items.clone(),
            TableKind::Invoices => urls.invoices.clone(),
            TableKind::Customers => urls.customers.clone(),
            TableKind::UsedFreebie => urls.used_freebie.clone(),
            TableKind::Index => urls.index.clone(),
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tab_name())
    }
}

/// A table read through [`Store::load`], already reconciled to its schema.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table_ref: TableRef,
    pub table: Table,
    pub report: ReconcileReport,
}

/// Store handle passed to every service: backend, table locations and locks.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn TableStore>,
    urls: Arc<TableUrls>,
    locks: TableLocks,
}

impl Store {
    pub fn new(backend: Arc<dyn TableStore>, urls: TableUrls) -> Self {
        Self {
            backend,
            urls: Arc::new(urls),
            locks: TableLocks::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let backend: Arc<dyn TableStore> = match config.store_backend {
            StoreBackend::Sheets => Arc::new(SheetsStore::new(
                config.sheets_api_base.clone(),
                config.google_access_token.clone(),
            )),
            StoreBackend::Memory => {
                warn!("Using the in-memory store; data is lost on restart");
                Arc::new(MemoryStore::new())
            }
        };
        Self::new(backend, config.table_urls())
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    /// Where `kind` lives, or `None` when no sheet is configured for it.
    pub fn table_ref(&self, kind: TableKind) -> Result<Option<TableRef>, AppError> {
        kind.url(&self.urls).map(|url| TableRef::parse(&url)).transpose()
    }

    /// Like [`Store::table_ref`] but an unconfigured table is an error.
    pub fn require(&self, kind: TableKind) -> Result<TableRef, AppError> {
        self.table_ref(kind)?.ok_or_else(|| {
            AppError::Connectivity(format!("no sheet URL configured for {}", kind))
        })
    }

    /// Hold the write locks of every configured table in `kinds` until the
    /// guard drops.
    pub async fn lock(&self, kinds: &[TableKind]) -> Result<TableGuard, AppError> {
        let mut refs = Vec::new();
        for kind in kinds {
            if let Some(table_ref) = self.table_ref(*kind)? {
                refs.push(table_ref);
            }
        }
        Ok(self.locks.acquire(refs).await)
    }

    /// Read `kind` in full and reconcile it to the current schema.
    /// Returns `None` when the table is not configured.
    pub async fn load(&self, kind: TableKind) -> Result<Option<LoadedTable>, AppError> {
        let table_ref = match self.table_ref(kind)? {
            Some(table_ref) => table_ref,
            None => return Ok(None),
        };
        self.load_at(kind, table_ref).await.map(Some)
    }

    pub async fn load_required(&self, kind: TableKind) -> Result<LoadedTable, AppError> {
        let table_ref = self.require(kind)?;
        self.load_at(kind, table_ref).await
    }

    async fn load_at(&self, kind: TableKind, table_ref: TableRef) -> Result<LoadedTable, AppError> {
        let mut table = self.backend.read(&table_ref).await?;
        let report = schema::reconcile(&mut table, kind.schema());
        if report.changed() {
            debug!("Reconciled {}: {}", kind, report);
        }
        debug!("Loaded {} rows from {}", table.len(), kind);
        Ok(LoadedTable {
            table_ref,
            table,
            report,
        })
    }

    pub async fn save(&self, kind: TableKind, loaded: &LoadedTable) -> Result<(), AppError> {
        self.backend.write(&loaded.table, &loaded.table_ref).await?;
        debug!("Wrote {} rows to {}", loaded.table.len(), kind);
        Ok(())
    }

    /// Raw read without reconciliation.
    pub async fn read_raw(&self, table_ref: &TableRef) -> Result<Table, AppError> {
        self.backend.read(table_ref).await
    }

    pub async fn write_raw(&self, table: &Table, table_ref: &TableRef) -> Result<(), AppError> {
        self.backend.write(table, table_ref).await
    }
}
