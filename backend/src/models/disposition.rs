use super::*;
use serde::{Deserialize, Serialize};
use stockbook_shared::DispositionStatus;
use tracing::warn;

/// Units taken out of stock without a sale: used in-house or given away.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispositionItem {
    pub id: Uuid,
    pub product_name: String,
    pub quantity: i64,
    pub total_cost_per_unit: Decimal,
    /// `None` when the sheet holds a status other than used/freebie.
    pub status: Option<DispositionStatus>,
    pub remarks: Option<String>,
    pub date_used: Option<NaiveDateTime>,
}

impl DispositionItem {
    pub const TABLE: &'static str = "Used Freebie";

    pub fn from_row(row: &Row) -> Result<Self, AppError> {
        require_column(Self::TABLE, row, "status")?;

        Ok(Self {
            id: record_id(Self::TABLE, row)?,
            product_name: text_or_empty(row, "product_name"),
            quantity: quantity(row, "quantity").unwrap_or(0),
            total_cost_per_unit: money(row, "total_cost_per_unit"),
            status: text(row, "status").and_then(|s| s.parse().ok()),
            remarks: text(row, "remarks"),
            date_used: timestamp(row, "date_used"),
        })
    }

    pub fn write_to(&self, row: &mut Row) {
        set(row, "id", self.id.to_string());
        set(row, "product_name", self.product_name.clone());
        set(row, "quantity", self.quantity.to_string());
        set_money(row, "total_cost_per_unit", self.total_cost_per_unit);
        set(
            row,
            "status",
            self.status.map(|s| s.as_str()).unwrap_or_default(),
        );
        set(row, "remarks", self.remarks.clone().unwrap_or_default());
        set(
            row,
            "date_used",
            self.date_used.map(coerce::format_timestamp).unwrap_or_default(),
        );
    }

    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        self.write_to(&mut row);
        row
    }

    /// Cost basis of the units disposed of, zero when out of range.
    pub fn total_cost(&self) -> Decimal {
        self.total_cost_per_unit
            .checked_mul(Decimal::from(self.quantity))
            .unwrap_or_else(|| {
                warn!("Cost of disposition {} is out of range; reporting zero", self.id);
                Decimal::ZERO
            })
    }
}
