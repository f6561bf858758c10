use crate::error::AppError;
use crate::schema::{self, ReconcileReport};
use crate::store::{Store, TableKind, TableRef};
use serde::Serialize;
use tracing::{info, warn};

/// Result of rewriting one tab into canonical column order.
#[derive(Debug, Clone, Serialize)]
pub struct RestructureOutcome {
    pub kind: String,
    pub rows: usize,
    pub report: ReconcileReport,
    /// Columns kept after the canonical ones because no schema names them.
    pub extra_columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableStatus {
    pub kind: String,
    pub table_ref: Option<String>,
    pub rows: usize,
    pub missing_columns: Vec<String>,
    pub error: Option<String>,
}

impl TableStatus {
    pub fn is_healthy(&self) -> bool {
        self.error.is_none() && self.missing_columns.is_empty()
    }
}

/// Maintenance operations over whole tabs.
#[derive(Clone)]
pub struct RestructureService {
    store: Store,
}

impl RestructureService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Reconcile `kind` and write it back with the canonical columns first.
    /// Data and unknown columns are preserved. `None` when the tab is not
    /// configured.
    pub async fn apply(&self, kind: TableKind) -> Result<Option<RestructureOutcome>, AppError> {
        let table_ref = match self.store.table_ref(kind)? {
            Some(table_ref) => table_ref,
            None => {
                warn!("Skipping {}: no sheet URL configured", kind);
                return Ok(None);
            }
        };

        let _guard = self.store.lock(&[kind]).await?;
        let mut table = self.store.read_raw(&table_ref).await?;
        let report = schema::reconcile(&mut table, kind.schema());
        let canonical = kind.schema().column_names();
        table.reorder_columns(&canonical);
        self.store.write_raw(&table, &table_ref).await?;

        let extra_columns = table
            .columns()
            .iter()
            .filter(|c| !canonical.iter().any(|name| *name == c.as_str()))
            .cloned()
            .collect();

        info!("Restructured {} ({} rows): {}", kind, table.len(), report);
        Ok(Some(RestructureOutcome {
            kind: kind.to_string(),
            rows: table.len(),
            report,
            extra_columns,
        }))
    }

    pub async fn apply_all(&self) -> Result<Vec<RestructureOutcome>, AppError> {
        let mut outcomes = Vec::new();
        for kind in TableKind::ALL {
            if let Some(outcome) = self.apply(kind).await? {
                outcomes.push(outcome);
            }
        }
        Ok(outcomes)
    }

    /// Read-only check of one tab: reachable, row count and missing columns.
    pub async fn status(&self, kind: TableKind) -> TableStatus {
        let mut status = TableStatus {
            kind: kind.to_string(),
            table_ref: None,
            rows: 0,
            missing_columns: Vec::new(),
            error: None,
        };

        let table_ref: TableRef = match self.store.table_ref(kind) {
            Ok(Some(table_ref)) => table_ref,
            Ok(None) => {
                status.error = Some("no sheet URL configured".to_string());
                return status;
            }
            Err(e) => {
                status.error = Some(e.to_string());
                return status;
            }
        };
        status.table_ref = Some(table_ref.to_string());

        match self.store.read_raw(&table_ref).await {
            Ok(table) => {
                status.rows = table.len();
                status.missing_columns = schema::missing_columns(&table, kind.schema())
                    .into_iter()
                    .map(str::to_string)
                    .collect();
            }
            Err(e) => status.error = Some(e.to_string()),
        }
        status
    }

    pub async fn status_all(&self) -> Vec<TableStatus> {
        let mut statuses = Vec::new();
        for kind in TableKind::ALL {
            statuses.push(self.status(kind).await);
        }
        statuses
    }
}
