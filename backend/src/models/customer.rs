use super::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use stockbook_shared::InvoiceLineItem;
use tracing::warn;

/// Running totals for one product bought by one customer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductPurchase {
    pub qty: i64,
    pub total_amount: Decimal,
}

impl ProductPurchase {
    /// Per-product quantity and amount (price × quantity) for a set of line
    /// items. Lines without a product name are skipped. Amounts too large to
    /// add up are a validation error.
    pub fn summarize(items: &[InvoiceLineItem]) -> Result<BTreeMap<String, ProductPurchase>, AppError> {
        let out_of_range = || AppError::Validation("line item amounts out of range".to_string());

        let mut summary: BTreeMap<String, ProductPurchase> = BTreeMap::new();
        for item in items.iter().filter(|i| !i.name.trim().is_empty()) {
            let amount = item
                .price
                .checked_mul(Decimal::from(item.quantity))
                .ok_or_else(out_of_range)?;
            let entry = summary.entry(item.name.clone()).or_default();
            entry.qty = entry.qty.checked_add(item.quantity).ok_or_else(out_of_range)?;
            entry.total_amount = entry.total_amount.checked_add(amount).ok_or_else(out_of_range)?;
        }
        Ok(summary)
    }
}

/// Aggregate purchase history, keyed by the exact customer name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_name: String,
    pub total_orders: i64,
    pub total_spent: Decimal,
    pub first_order_date: String,
    pub last_order_date: String,
    pub products_purchased: BTreeMap<String, ProductPurchase>,
}

impl Customer {
    pub const TABLE: &'static str = "Customers";

    /// A customer seen for the first time on an invoice.
    pub fn first_invoice(
        customer_name: &str,
        total_amount: Decimal,
        invoice_date: &str,
        purchases: BTreeMap<String, ProductPurchase>,
    ) -> Self {
        Self {
            customer_name: customer_name.to_string(),
            total_orders: 1,
            total_spent: total_amount,
            first_order_date: invoice_date.to_string(),
            last_order_date: invoice_date.to_string(),
            products_purchased: purchases,
        }
    }

    /// Fold another invoice into the totals. Product entries are summed on
    /// name collision.
    pub fn record_invoice(
        &mut self,
        total_amount: Decimal,
        invoice_date: &str,
        purchases: BTreeMap<String, ProductPurchase>,
    ) {
        self.total_orders = self.total_orders.saturating_add(1);
        self.total_spent = add_amount(self.total_spent, total_amount, "total_spent");
        self.last_order_date = invoice_date.to_string();
        if self.first_order_date.is_empty() {
            self.first_order_date = invoice_date.to_string();
        }
        for (product, purchase) in purchases {
            let entry = self.products_purchased.entry(product).or_default();
            entry.qty = entry.qty.saturating_add(purchase.qty);
            entry.total_amount = add_amount(entry.total_amount, purchase.total_amount, "products_purchased");
        }
    }

    pub fn from_row(row: &Row) -> Result<Self, AppError> {
        require_column(Self::TABLE, row, "customer_name")?;

        let customer_name = raw_text(row, "customer_name");
        let products_purchased = match Table::cell(row, "products_purchased") {
            Some(raw) => serde_json::from_str(raw).unwrap_or_else(|e| {
                warn!("Unreadable products_purchased for '{}': {}", customer_name, e);
                BTreeMap::new()
            }),
            None => BTreeMap::new(),
        };

        Ok(Self {
            total_orders: quantity(row, "total_orders").unwrap_or(0),
            total_spent: money(row, "total_spent"),
            first_order_date: text_or_empty(row, "first_order_date"),
            last_order_date: text_or_empty(row, "last_order_date"),
            products_purchased,
            customer_name,
        })
    }

    pub fn write_to(&self, row: &mut Row) -> Result<(), AppError> {
        set(row, "customer_name", self.customer_name.clone());
        set(row, "total_orders", self.total_orders.to_string());
        set_money(row, "total_spent", self.total_spent);
        set(row, "first_order_date", self.first_order_date.clone());
        set(row, "last_order_date", self.last_order_date.clone());
        set(row, "products_purchased", serde_json::to_string(&self.products_purchased)?);
        Ok(())
    }

    pub fn to_row(&self) -> Result<Row, AppError> {
        let mut row = Row::new();
        self.write_to(&mut row)?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, price: i64, quantity: i64) -> InvoiceLineItem {
        InvoiceLineItem {
            name: name.to_string(),
            price: Decimal::from(price),
            quantity,
            subtotal: None,
        }
    }

    #[test]
    fn summarize_merges_repeated_products_and_skips_blank_names() {
        let summary = ProductPurchase::summarize(&[
            line("Soap", 2, 3),
            line("", 5, 1),
            line("Soap", 2, 1),
        ])
        .unwrap();

        assert_eq!(summary.len(), 1);
        assert_eq!(summary["Soap"].qty, 4);
        assert_eq!(summary["Soap"].total_amount, Decimal::from(8));
    }

    #[test]
    fn summarize_rejects_amounts_that_overflow() {
        let huge = InvoiceLineItem {
            name: "Soap".to_string(),
            price: "100000000000000000000".parse().unwrap(),
            quantity: 10_000_000_000,
            subtotal: None,
        };
        assert!(matches!(ProductPurchase::summarize(&[huge]), Err(AppError::Validation(_))));
    }

    #[test]
    fn oversized_stored_totals_do_not_panic() {
        let mut customer = Customer::first_invoice("Ana", Decimal::MAX, "2024-05-01", BTreeMap::new());
        customer.record_invoice(Decimal::from(5), "2024-05-09", BTreeMap::new());

        assert_eq!(customer.total_spent, Decimal::MAX);
        assert_eq!(customer.total_orders, 2);
    }

    #[test]
    fn customer_names_are_read_exactly() {
        let row: Row = [("customer_name", " Ana ")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(Customer::from_row(&row).unwrap().customer_name, " Ana ");
    }

    #[test]
    fn record_invoice_accumulates_and_merges() {
        let mut customer = Customer::first_invoice(
            "Ana",
            Decimal::from(10),
            "2024-05-01",
            ProductPurchase::summarize(&[line("Soap", 2, 5)]).unwrap(),
        );

        customer.record_invoice(
            Decimal::from(7),
            "2024-05-09",
            ProductPurchase::summarize(&[line("Soap", 2, 1), line("Wax", 5, 1)]).unwrap(),
        );

        assert_eq!(customer.total_orders, 2);
        assert_eq!(customer.total_spent, Decimal::from(17));
        assert_eq!(customer.first_order_date, "2024-05-01");
        assert_eq!(customer.last_order_date, "2024-05-09");
        assert_eq!(customer.products_purchased["Soap"].qty, 6);
        assert_eq!(customer.products_purchased["Soap"].total_amount, Decimal::from(12));
        assert_eq!(customer.products_purchased["Wax"].qty, 1);
    }

    #[test]
    fn products_purchased_round_trips_through_the_sheet_cell() {
        let customer = Customer::first_invoice(
            "Ana",
            Decimal::from(10),
            "2024-05-01",
            ProductPurchase::summarize(&[line("Soap", 2, 5)]).unwrap(),
        );
        let parsed = Customer::from_row(&customer.to_row().unwrap()).unwrap();
        assert_eq!(parsed, customer);
    }

    #[test]
    fn reads_legacy_python_json() {
        let row: Row = [
            ("customer_name", "Ana"),
            ("total_orders", "2"),
            ("total_spent", "30.5"),
            ("products_purchased", r#"{"Soap": {"qty": 3, "total_amount": 7.5}}"#),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let customer = Customer::from_row(&row).unwrap();
        assert_eq!(customer.products_purchased["Soap"].total_amount, Decimal::new(75, 1));
    }

    #[test]
    fn garbage_products_cell_reads_as_empty() {
        let row: Row = [("customer_name", "Ana"), ("products_purchased", "{'Soap': 1}")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert!(Customer::from_row(&row).unwrap().products_purchased.is_empty());
    }
}
