//! Typed records for each table.
//!
//! Each model reads itself from a reconciled [`Row`] and writes its fields
//! back into a row in place, so columns the model does not know about are
//! carried through untouched.

pub mod customer;
pub mod disposition;
pub mod invoice;
pub mod lot;
pub mod sold_item;

pub use customer::{Customer, ProductPurchase};
pub use disposition::DispositionItem;
pub use invoice::{Invoice, InvoiceLine, InvoiceRow};
pub use lot::{Lot, NewLot};
pub use sold_item::SoldItem;

use crate::error::AppError;
use crate::schema::coerce;
use crate::store::{Row, Table};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use stockbook_shared::RecordRef;
use tracing::warn;
use uuid::Uuid;

pub(crate) fn text(row: &Row, column: &str) -> Option<String> {
    Table::cell(row, column).map(|v| v.trim().to_string())
}

pub(crate) fn text_or_empty(row: &Row, column: &str) -> String {
    text(row, column).unwrap_or_default()
}

/// The cell exactly as stored, surrounding whitespace included.
pub(crate) fn raw_text(row: &Row, column: &str) -> String {
    row.get(column).cloned().unwrap_or_default()
}

/// `total + value`. A sum that does not fit in a `Decimal` is logged and the
/// value counts as zero.
pub(crate) fn add_amount(total: Decimal, value: Decimal, what: &str) -> Decimal {
    total.checked_add(value).unwrap_or_else(|| {
        warn!("{} overflowed adding {} to {}; ignoring the value", what, value, total);
        total
    })
}

pub(crate) fn money(row: &Row, column: &str) -> Decimal {
    Table::cell(row, column)
        .map(coerce::parse_decimal)
        .unwrap_or(Decimal::ZERO)
}

pub(crate) fn optional_money(row: &Row, column: &str) -> Option<Decimal> {
    coerce::parse_optional_decimal(Table::cell(row, column))
}

pub(crate) fn quantity(row: &Row, column: &str) -> Option<i64> {
    Table::cell(row, column).map(coerce::parse_quantity)
}

pub(crate) fn timestamp(row: &Row, column: &str) -> Option<NaiveDateTime> {
    Table::cell(row, column).and_then(coerce::parse_timestamp)
}

/// The row's id cell. Reconciliation fills blank ids, so a missing or
/// unreadable id means the table was not reconciled.
pub(crate) fn record_id(table: &str, row: &Row) -> Result<Uuid, AppError> {
    Table::cell(row, "id")
        .and_then(|id| Uuid::parse_str(id.trim()).ok())
        .ok_or_else(|| AppError::schema(table, "id"))
}

pub(crate) fn require_column(table: &str, row: &Row, column: &str) -> Result<(), AppError> {
    if row.contains_key(column) {
        Ok(())
    } else {
        Err(AppError::schema(table, column))
    }
}

pub(crate) fn set(row: &mut Row, column: &str, value: impl Into<String>) {
    row.insert(column.to_string(), value.into());
}

pub(crate) fn set_money(row: &mut Row, column: &str, value: Decimal) {
    set(row, column, coerce::format_decimal(value));
}

pub(crate) fn set_optional_money(row: &mut Row, column: &str, value: Option<Decimal>) {
    set(row, column, value.map(coerce::format_decimal).unwrap_or_default());
}

/// Position of the row `reference` points at. Positions index the table as
/// just read; ids are matched against the `id` column.
pub fn locate(table: &Table, reference: RecordRef) -> Option<usize> {
    match reference {
        RecordRef::Position(position) => (position < table.len()).then_some(position),
        RecordRef::Id(id) => table.rows().iter().position(|row| {
            Table::cell(row, "id")
                .and_then(|cell| Uuid::parse_str(cell.trim()).ok())
                .map_or(false, |row_id| row_id == id)
        }),
    }
}
