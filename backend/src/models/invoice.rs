use super::*;
use serde::{Deserialize, Serialize};

/// One stored invoice row: the shared invoice header plus a single line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRow {
    pub invoice_number: String,
    pub customer_name: String,
    pub products_summary: String,
    pub product_name: String,
    pub price_sold: Decimal,
    pub quantity: i64,
    pub line_total: Decimal,
    pub shipment_fee: Decimal,
    pub total_amount: Decimal,
    pub invoice_date: String,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub product_name: String,
    pub price_sold: Decimal,
    pub quantity: i64,
    pub line_total: Decimal,
}

/// A logical invoice rebuilt from all rows sharing its number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_number: String,
    pub customer_name: String,
    pub products_summary: String,
    pub shipment_fee: Decimal,
    pub total_amount: Decimal,
    pub invoice_date: String,
    pub created_at: Option<NaiveDateTime>,
    pub lines: Vec<InvoiceLine>,
}

impl InvoiceRow {
    pub const TABLE: &'static str = "Invoices";

    pub fn from_row(row: &Row) -> Result<Self, AppError> {
        require_column(Self::TABLE, row, "invoice_number")?;

        Ok(Self {
            invoice_number: text_or_empty(row, "invoice_number"),
            customer_name: raw_text(row, "customer_name"),
            products_summary: text_or_empty(row, "products_summary"),
            product_name: text_or_empty(row, "product_name"),
            price_sold: money(row, "price_sold"),
            quantity: quantity(row, "quantity").unwrap_or(0),
            line_total: money(row, "line_total"),
            shipment_fee: money(row, "shipment_fee"),
            total_amount: money(row, "total_amount"),
            invoice_date: text_or_empty(row, "invoice_date"),
            created_at: timestamp(row, "created_at"),
        })
    }

    pub fn write_to(&self, row: &mut Row) {
        set(row, "invoice_number", self.invoice_number.clone());
        set(row, "customer_name", self.customer_name.clone());
        set(row, "products_summary", self.products_summary.clone());
        set(row, "product_name", self.product_name.clone());
        set_money(row, "price_sold", self.price_sold);
        set(row, "quantity", self.quantity.to_string());
        set_money(row, "line_total", self.line_total);
        set_money(row, "shipment_fee", self.shipment_fee);
        set_money(row, "total_amount", self.total_amount);
        set(row, "invoice_date", self.invoice_date.clone());
        set(
            row,
            "created_at",
            self.created_at.map(coerce::format_timestamp).unwrap_or_default(),
        );
    }

    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        self.write_to(&mut row);
        row
    }

    /// Rows written for invoices without line items carry no product.
    pub fn is_placeholder(&self) -> bool {
        self.product_name.is_empty() && self.quantity == 0
    }
}

impl Invoice {
    /// Group rows by invoice number, keeping the order in which each number
    /// first appears and the row order of its lines. Header fields come from
    /// the first row of each group.
    pub fn group(rows: Vec<InvoiceRow>) -> Vec<Invoice> {
        let mut invoices: Vec<Invoice> = Vec::new();

        for row in rows {
            let line = (!row.is_placeholder()).then(|| InvoiceLine {
                product_name: row.product_name.clone(),
                price_sold: row.price_sold,
                quantity: row.quantity,
                line_total: row.line_total,
            });

            match invoices
                .iter_mut()
                .find(|inv| inv.invoice_number == row.invoice_number)
            {
                Some(invoice) => invoice.lines.extend(line),
                None => invoices.push(Invoice {
                    invoice_number: row.invoice_number,
                    customer_name: row.customer_name,
                    products_summary: row.products_summary,
                    shipment_fee: row.shipment_fee,
                    total_amount: row.total_amount,
                    invoice_date: row.invoice_date,
                    created_at: row.created_at,
                    lines: line.into_iter().collect(),
                }),
            }
        }

        invoices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(number: &str, product: &str, quantity: i64) -> InvoiceRow {
        InvoiceRow {
            invoice_number: number.to_string(),
            customer_name: "Ana".to_string(),
            products_summary: String::new(),
            product_name: product.to_string(),
            price_sold: Decimal::from(2),
            quantity,
            line_total: Decimal::from(2 * quantity),
            shipment_fee: Decimal::ZERO,
            total_amount: Decimal::from(10),
            invoice_date: "2024-05-01".to_string(),
            created_at: None,
        }
    }

    #[test]
    fn groups_rows_by_number_in_first_seen_order() {
        let invoices = Invoice::group(vec![
            row("INV-B", "Soap", 1),
            row("INV-A", "Candle", 2),
            row("INV-B", "Wax", 3),
        ]);

        assert_eq!(invoices.len(), 2);
        assert_eq!(invoices[0].invoice_number, "INV-B");
        assert_eq!(
            invoices[0].lines.iter().map(|l| l.product_name.as_str()).collect::<Vec<_>>(),
            vec!["Soap", "Wax"]
        );
        assert_eq!(invoices[1].lines.len(), 1);
    }

    #[test]
    fn placeholder_rows_produce_invoices_without_lines() {
        let invoices = Invoice::group(vec![row("INV-C", "", 0)]);
        assert_eq!(invoices.len(), 1);
        assert!(invoices[0].lines.is_empty());
    }
}
