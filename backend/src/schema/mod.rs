//! Schema reconciliation.
//!
//! Tabs are edited by hand and have drifted over time: columns were added,
//! renamed, or never created. Every table is reconciled right after it is
//! read so the typed models can rely on their columns being present.
//! Columns this module does not know about are never touched.

pub mod coerce;

use crate::store::{Row, Table};
use serde::Serialize;
use std::fmt;
use tracing::warn;
use uuid::Uuid;

/// How a missing cell is filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnDefault {
    Zero,
    Blank,
    False,
    /// First non-blank value among these columns of the same row, else `0`.
    CopyOf(&'static [&'static str]),
    /// Fresh UUID for every row where the cell is blank.
    NewId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub default: ColumnDefault,
}

const fn col(name: &'static str, default: ColumnDefault) -> ColumnSpec {
    ColumnSpec { name, default }
}

#[derive(Debug, PartialEq, Eq)]
pub struct TableSchema {
    pub tab_name: &'static str,
    pub columns: &'static [ColumnSpec],
}

impl TableSchema {
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }
}

use ColumnDefault::*;

pub const INVENTORY: TableSchema = TableSchema {
    tab_name: "Inventory",
    columns: &[
        col("id", NewId),
        col("product_name", Blank),
        col("total_price", Zero),
        col("shipping_admin_fee", Zero),
        col("total_cost_per_unit", Zero),
        col("quantity", Zero),
        col("total_bought_quantity", CopyOf(&["quantity"])),
        col("remaining_qty", CopyOf(&["total_bought_quantity", "quantity"])),
        col("status", Blank),
        col("supplier", Blank),
        col("remarks", Blank),
        col("date_added", Blank),
        col("selling_price", Blank),
        col("profit", Blank),
        col("tithe", Blank),
        col("profit_after_tithe", Blank),
        col("date_sold", Blank),
    ],
};

pub const SOLD_ITEMS: TableSchema = TableSchema {
    tab_name: "Sold Items",
    columns: &[
        col("id", NewId),
        col("product_name", Blank),
        col("quantity", Zero),
        col("total_cost_per_unit", Zero),
        col("selling_price", Zero),
        col("total_cost", Zero),
        col("profit", Zero),
        col("tithe", Zero),
        col("profit_after_tithe", Zero),
        col("tithe_kept", False),
        col("remarks", Blank),
        col("date_sold", Blank),
    ],
};

pub const INVOICES: TableSchema = TableSchema {
    tab_name: "Invoices",
    columns: &[
        col("invoice_number", Blank),
        col("customer_name", Blank),
        col("products_summary", Blank),
        col("product_name", Blank),
        col("price_sold", Zero),
        col("quantity", Zero),
        col("line_total", Zero),
        col("shipment_fee", Zero),
        col("total_amount", Zero),
        col("invoice_date", Blank),
        col("created_at", Blank),
    ],
};

pub const CUSTOMERS: TableSchema = TableSchema {
    tab_name: "Customers",
    columns: &[
        col("customer_name", Blank),
        col("total_orders", Zero),
        col("total_spent", Zero),
        col("first_order_date", Blank),
        col("last_order_date", Blank),
        col("products_purchased", Blank),
    ],
};

pub const USED_FREEBIE: TableSchema = TableSchema {
    tab_name: "Used Freebie",
    columns: &[
        col("id", NewId),
        col("product_name", Blank),
        col("quantity", Zero),
        col("total_cost_per_unit", Zero),
        col("status", Blank),
        col("remarks", Blank),
        col("date_used", Blank),
    ],
};

pub const INDEX: TableSchema = TableSchema {
    tab_name: "INDEX",
    columns: &[col("product_name", Blank)],
};

/// Old header names and the columns that replaced them.
/// Where an id that is not a UUID is kept once the row gets a fresh id.
pub const LEGACY_ID_COLUMN: &str = "legacy_id";

pub const LEGACY_RENAMES: &[(&str, &str)] = &[
    ("base_price", "total_price"),
    ("procurement_fees", "shipping_admin_fee"),
];

/// What [`reconcile`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub renamed: Vec<(String, String)>,
    pub added: Vec<String>,
    pub cells_filled: usize,
}

impl ReconcileReport {
    pub fn changed(&self) -> bool {
        !self.renamed.is_empty() || !self.added.is_empty() || self.cells_filled > 0
    }
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let renamed: Vec<String> = self
            .renamed
            .iter()
            .map(|(from, to)| format!("{} -> {}", from, to))
            .collect();
        write!(
            f,
            "renamed [{}], added [{}], filled {} cells",
            renamed.join(", "),
            self.added.join(", "),
            self.cells_filled
        )
    }
}

fn fill_value(row: &Row, default: ColumnDefault) -> String {
    match default {
        Zero => "0".to_string(),
        Blank => String::new(),
        False => coerce::format_flag(false),
        CopyOf(sources) => sources
            .iter()
            .find_map(|source| Table::cell(row, source))
            .unwrap_or("0")
            .to_string(),
        NewId => Uuid::new_v4().to_string(),
    }
}

/// Bring `table` in line with `schema`:
/// 1. headers matching a schema column case-insensitively take its spelling;
/// 2. legacy headers are renamed to their replacement;
/// 3. still-missing columns are added with their default;
/// 4. blank or non-UUID id cells get fresh ids and blank derived cells are
///    re-derived.
pub fn reconcile(table: &mut Table, schema: &TableSchema) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for spec in schema.columns {
        if table.has_column(spec.name) {
            continue;
        }
        let case_match = table
            .columns()
            .iter()
            .find(|c| c.eq_ignore_ascii_case(spec.name))
            .cloned();
        let legacy = LEGACY_RENAMES
            .iter()
            .find(|&&(old, new)| new == spec.name && table.has_column(old))
            .map(|&(old, _)| old.to_string());

        if let Some(from) = case_match.or(legacy) {
            table.rename_column(&from, spec.name);
            report.renamed.push((from, spec.name.to_string()));
        }
    }

    for spec in schema.columns {
        if !table.has_column(spec.name) {
            table.add_column(spec.name, |row| fill_value(row, spec.default));
            report.added.push(spec.name.to_string());
        }
    }

    for spec in schema.columns {
        match spec.default {
            NewId => {
                fill_ids(table, spec.name, &mut report);
                continue;
            }
            CopyOf(_) => {}
            _ => continue,
        }
        for row in table.rows_mut() {
            if Table::cell(row, spec.name).is_none() {
                let value = fill_value(row, spec.default);
                row.insert(spec.name.to_string(), value);
                report.cells_filled += 1;
            }
        }
    }

    report
}

fn is_foreign_id(row: &Row, column: &str) -> bool {
    Table::cell(row, column).map_or(false, |id| Uuid::parse_str(id.trim()).is_err())
}

/// Give every row a UUID in `column`. A non-blank value that is not a UUID
/// moves to [`LEGACY_ID_COLUMN`] before being replaced.
fn fill_ids(table: &mut Table, column: &str, report: &mut ReconcileReport) {
    if table.rows().iter().any(|row| is_foreign_id(row, column))
        && !table.has_column(LEGACY_ID_COLUMN)
    {
        table.add_column(LEGACY_ID_COLUMN, |_| String::new());
        report.added.push(LEGACY_ID_COLUMN.to_string());
    }

    for row in table.rows_mut() {
        let current = Table::cell(row, column).map(|id| id.trim().to_string());
        match current {
            Some(id) if Uuid::parse_str(&id).is_ok() => continue,
            Some(id) => {
                warn!("Replacing non-UUID {} '{}' with a fresh id", column, id);
                row.insert(LEGACY_ID_COLUMN.to_string(), id);
            }
            None => {}
        }
        row.insert(column.to_string(), Uuid::new_v4().to_string());
        report.cells_filled += 1;
    }
}

/// Schema columns that are absent from `table`, before any reconciliation.
pub fn missing_columns(table: &Table, schema: &TableSchema) -> Vec<&'static str> {
    schema
        .columns
        .iter()
        .map(|c| c.name)
        .filter(|name| !table.columns().iter().any(|c| c.eq_ignore_ascii_case(name)))
        .filter(|name| {
            !LEGACY_RENAMES
                .iter()
                .any(|&(old, new)| new == *name && table.has_column(old))
        })
        .collect()
}
