use super::*;
use serde::{Deserialize, Serialize};

/// A sale recorded when units of a lot are sold. Only `tithe_kept` changes
/// after the record is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoldItem {
    pub id: Uuid,
    pub product_name: String,
    pub quantity: i64,
    pub total_cost_per_unit: Decimal,
    pub selling_price: Decimal,
    pub total_cost: Decimal,
    pub profit: Decimal,
    pub tithe: Decimal,
    pub profit_after_tithe: Decimal,
    pub tithe_kept: bool,
    pub remarks: Option<String>,
    pub date_sold: Option<NaiveDateTime>,
}

impl SoldItem {
    pub const TABLE: &'static str = "Sold Items";

    pub fn from_row(row: &Row) -> Result<Self, AppError> {
        require_column(Self::TABLE, row, "product_name")?;
        require_column(Self::TABLE, row, "tithe")?;

        Ok(Self {
            id: record_id(Self::TABLE, row)?,
            product_name: text_or_empty(row, "product_name"),
            quantity: quantity(row, "quantity").unwrap_or(0),
            total_cost_per_unit: money(row, "total_cost_per_unit"),
            selling_price: money(row, "selling_price"),
            total_cost: money(row, "total_cost"),
            profit: money(row, "profit"),
            tithe: money(row, "tithe"),
            profit_after_tithe: money(row, "profit_after_tithe"),
            tithe_kept: Table::cell(row, "tithe_kept").map_or(false, coerce::parse_flag),
            remarks: text(row, "remarks"),
            date_sold: timestamp(row, "date_sold"),
        })
    }

    pub fn write_to(&self, row: &mut Row) {
        set(row, "id", self.id.to_string());
        set(row, "product_name", self.product_name.clone());
        set(row, "quantity", self.quantity.to_string());
        set_money(row, "total_cost_per_unit", self.total_cost_per_unit);
        set_money(row, "selling_price", self.selling_price);
        set_money(row, "total_cost", self.total_cost);
        set_money(row, "profit", self.profit);
        set_money(row, "tithe", self.tithe);
        set_money(row, "profit_after_tithe", self.profit_after_tithe);
        set(row, "tithe_kept", coerce::format_flag(self.tithe_kept));
        set(row, "remarks", self.remarks.clone().unwrap_or_default());
        set(
            row,
            "date_sold",
            self.date_sold.map(coerce::format_timestamp).unwrap_or_default(),
        );
    }

    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        self.write_to(&mut row);
        row
    }
}
