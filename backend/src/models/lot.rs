use super::*;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use stockbook_shared::{LotStatus, COST_PER_UNIT_SCALE, DUPLICATE_SUBMISSION_WINDOW, MONEY_MATCH_TOLERANCE};
use tracing::warn;

/// One purchase batch of a product with its own cost basis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    pub id: Uuid,
    pub product_name: String,
    pub total_price: Decimal,
    pub shipping_admin_fee: Decimal,
    pub total_cost_per_unit: Decimal,
    /// Legacy column mirroring `remaining_qty` once units have been disposed of.
    pub quantity: i64,
    pub total_bought_quantity: i64,
    pub remaining_qty: i64,
    pub status: LotStatus,
    pub supplier: Option<String>,
    pub remarks: Option<String>,
    pub date_added: Option<NaiveDateTime>,
    pub selling_price: Option<Decimal>,
    pub profit: Option<Decimal>,
    pub tithe: Option<Decimal>,
    pub profit_after_tithe: Option<Decimal>,
    pub date_sold: Option<NaiveDateTime>,
}

/// Fields supplied when a lot is added.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLot {
    pub product_name: String,
    pub total_price: Decimal,
    pub shipping_admin_fee: Decimal,
    pub quantity: i64,
    pub supplier: Option<String>,
    pub remarks: Option<String>,
    pub status: LotStatus,
}

fn trimmed(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or("")
}

fn within_tolerance(a: Decimal, b: Decimal) -> bool {
    a.checked_sub(b)
        .map_or(false, |diff| diff.abs() <= MONEY_MATCH_TOLERANCE)
}

impl Lot {
    pub const TABLE: &'static str = "Inventory";

    /// `(total_price + shipping_admin_fee) / quantity`, or zero for an empty lot.
    pub fn cost_per_unit(total_price: Decimal, shipping_admin_fee: Decimal, quantity: i64) -> Decimal {
        if quantity <= 0 {
            return Decimal::ZERO;
        }
        total_price
            .checked_add(shipping_admin_fee)
            .and_then(|total| total.checked_div(Decimal::from(quantity)))
            .map(|cost| cost.round_dp(COST_PER_UNIT_SCALE))
            .unwrap_or(Decimal::ZERO)
    }

    pub fn create(new: NewLot, now: NaiveDateTime) -> Self {
        let quantity = new.quantity.max(0);
        Self {
            id: Uuid::new_v4(),
            total_cost_per_unit: Self::cost_per_unit(new.total_price, new.shipping_admin_fee, quantity),
            product_name: new.product_name.trim().to_string(),
            total_price: new.total_price,
            shipping_admin_fee: new.shipping_admin_fee,
            quantity,
            total_bought_quantity: quantity,
            remaining_qty: quantity,
            status: new.status,
            supplier: new.supplier.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            remarks: new.remarks.filter(|r| !r.trim().is_empty()),
            date_added: Some(now),
            selling_price: None,
            profit: None,
            tithe: None,
            profit_after_tithe: None,
            date_sold: None,
        }
    }

    pub fn from_row(row: &Row) -> Result<Self, AppError> {
        require_column(Self::TABLE, row, "product_name")?;

        let legacy_quantity = quantity(row, "quantity").unwrap_or(0);
        let total_bought_quantity = quantity(row, "total_bought_quantity").unwrap_or(legacy_quantity);
        let remaining_qty = quantity(row, "remaining_qty")
            .or_else(|| quantity(row, "total_bought_quantity"))
            .unwrap_or(legacy_quantity);

        let status = match text(row, "status") {
            Some(raw) => raw.parse::<LotStatus>().unwrap_or_else(|e| {
                warn!("Inventory row has {}; treating it as in_stock", e);
                LotStatus::InStock
            }),
            None => LotStatus::InStock,
        };

        Ok(Self {
            id: record_id(Self::TABLE, row)?,
            product_name: text_or_empty(row, "product_name"),
            total_price: money(row, "total_price"),
            shipping_admin_fee: money(row, "shipping_admin_fee"),
            total_cost_per_unit: money(row, "total_cost_per_unit"),
            quantity: legacy_quantity,
            total_bought_quantity,
            remaining_qty,
            status,
            supplier: text(row, "supplier"),
            remarks: text(row, "remarks"),
            date_added: timestamp(row, "date_added"),
            selling_price: optional_money(row, "selling_price"),
            profit: optional_money(row, "profit"),
            tithe: optional_money(row, "tithe"),
            profit_after_tithe: optional_money(row, "profit_after_tithe"),
            date_sold: timestamp(row, "date_sold"),
        })
    }

    pub fn write_to(&self, row: &mut Row) {
        set(row, "id", self.id.to_string());
        set(row, "product_name", self.product_name.clone());
        set_money(row, "total_price", self.total_price);
        set_money(row, "shipping_admin_fee", self.shipping_admin_fee);
        set_money(row, "total_cost_per_unit", self.total_cost_per_unit);
        set(row, "quantity", self.quantity.to_string());
        set(row, "total_bought_quantity", self.total_bought_quantity.to_string());
        set(row, "remaining_qty", self.remaining_qty.to_string());
        set(row, "status", self.status.as_str());
        set(row, "supplier", self.supplier.clone().unwrap_or_default());
        set(row, "remarks", self.remarks.clone().unwrap_or_default());
        set(
            row,
            "date_added",
            self.date_added.map(coerce::format_timestamp).unwrap_or_default(),
        );
        set_optional_money(row, "selling_price", self.selling_price);
        set_optional_money(row, "profit", self.profit);
        set_optional_money(row, "tithe", self.tithe);
        set_optional_money(row, "profit_after_tithe", self.profit_after_tithe);
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

    /// Take `units` out of the lot. Remaining stock never drops below zero
    /// and never exceeds what was bought; the legacy `quantity` column
    /// mirrors the new remaining count.
    pub fn dispose(&mut self, units: i64) -> i64 {
        let ceiling = self.total_bought_quantity.max(0);
        let current = self.remaining_qty.clamp(0, ceiling);
        let remaining = current.saturating_sub(units.max(0)).max(0);
        self.remaining_qty = remaining;
        self.quantity = remaining;
        remaining
    }

    /// Whether `candidate` looks like a resubmission of this lot: added within
    /// the duplicate window with the same name, amounts, quantity and supplier.
    /// A lot stamped later than `now` is never treated as recent.
    pub fn is_probable_duplicate_of(&self, candidate: &NewLot, now: NaiveDateTime) -> bool {
        let window = Duration::from_std(DUPLICATE_SUBMISSION_WINDOW).unwrap_or_else(|_| Duration::minutes(2));
        let recent = self.date_added.map_or(false, |added| {
            let elapsed = now.signed_duration_since(added);
            elapsed >= Duration::zero() && elapsed <= window
        });

        recent
            && self.product_name.trim() == candidate.product_name.trim()
            && within_tolerance(self.total_price, candidate.total_price)
            && within_tolerance(self.shipping_admin_fee, candidate.shipping_admin_fee)
            && self.total_bought_quantity == candidate.quantity
            && trimmed(&self.supplier) == trimmed(&candidate.supplier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn new_lot(quantity: i64) -> NewLot {
        NewLot {
            product_name: "Candle".to_string(),
            total_price: Decimal::from(100),
            shipping_admin_fee: Decimal::from(20),
            quantity,
            supplier: Some(" Wax Co ".to_string()),
            remarks: None,
            status: LotStatus::InStock,
        }
    }

    #[test]
    fn cost_per_unit_spreads_price_and_fees() {
        let lot = Lot::create(new_lot(3), now());
        assert_eq!(lot.total_cost_per_unit, Decimal::from(40));
        assert_eq!(lot.remaining_qty, 3);
        assert_eq!(lot.total_bought_quantity, 3);
        assert_eq!(lot.supplier.as_deref(), Some("Wax Co"));
    }

    #[test]
    fn zero_quantity_has_zero_cost_per_unit() {
        let lot = Lot::create(new_lot(0), now());
        assert_eq!(lot.total_cost_per_unit, Decimal::ZERO);
        assert_eq!(Lot::cost_per_unit(Decimal::from(5), Decimal::ZERO, -1), Decimal::ZERO);
    }

    #[test]
    fn dispose_clamps_at_zero_and_mirrors_quantity() {
        let mut lot = Lot::create(new_lot(5), now());
        assert_eq!(lot.dispose(2), 3);
        assert_eq!(lot.quantity, 3);
        assert_eq!(lot.dispose(10), 0);
        assert_eq!(lot.remaining_qty, 0);
        assert_eq!(lot.dispose(1), 0);
    }

    #[test]
    fn dispose_never_exceeds_bought_quantity() {
        let mut lot = Lot::create(new_lot(4), now());
        lot.remaining_qty = 9;
        assert_eq!(lot.dispose(1), 3);
    }

    #[test]
    fn row_round_trip_preserves_fields() {
        let lot = Lot::create(new_lot(3), now());
        let parsed = Lot::from_row(&lot.to_row()).unwrap();
        assert_eq!(parsed, lot);
    }

    #[test]
    fn remaining_falls_back_to_bought_then_quantity() {
        let id = Uuid::new_v4().to_string();
        let mut row: Row = [("id", id.as_str()), ("product_name", "Soap"), ("quantity", "2")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(Lot::from_row(&row).unwrap().remaining_qty, 2);

        row.insert("total_bought_quantity".to_string(), "7".to_string());
        assert_eq!(Lot::from_row(&row).unwrap().remaining_qty, 7);

        row.insert("remaining_qty".to_string(), "4".to_string());
        assert_eq!(Lot::from_row(&row).unwrap().remaining_qty, 4);
    }

    #[test]
    fn missing_product_column_is_a_schema_error() {
        let row = Row::new();
        assert!(matches!(Lot::from_row(&row), Err(AppError::Schema { .. })));
    }

    #[test]
    fn duplicate_detection_uses_window_and_tolerance() {
        let lot = Lot::create(new_lot(3), now());

        let mut candidate = new_lot(3);
        candidate.total_price = Decimal::new(10001, 2);
        candidate.supplier = Some("Wax Co".to_string());
        assert!(lot.is_probable_duplicate_of(&candidate, now() + Duration::seconds(90)));
        assert!(!lot.is_probable_duplicate_of(&candidate, now() + Duration::seconds(121)));

        candidate.total_price = Decimal::new(10002, 2);
        assert!(!lot.is_probable_duplicate_of(&candidate, now()));

        let mut other_supplier = new_lot(3);
        other_supplier.supplier = None;
        assert!(!lot.is_probable_duplicate_of(&other_supplier, now()));

        assert!(!lot.is_probable_duplicate_of(&new_lot(4), now()));
    }

    #[test]
    fn lots_dated_in_the_future_are_not_recent() {
        let mut candidate = new_lot(3);
        candidate.supplier = Some("Wax Co".to_string());
        let future = Lot::create(new_lot(3), now() + Duration::days(1));

        assert!(!future.is_probable_duplicate_of(&candidate, now()));
        assert!(future.is_probable_duplicate_of(&candidate, now() + Duration::days(1)));
    }

    #[test]
    fn extreme_amounts_do_not_overflow() {
        assert_eq!(Lot::cost_per_unit(Decimal::MAX, Decimal::MAX, 3), Decimal::ZERO);
        assert!(!within_tolerance(Decimal::MAX, Decimal::MIN));

        let mut lot = Lot::create(new_lot(3), now());
        assert_eq!(lot.dispose(i64::MAX), 0);
    }
}
