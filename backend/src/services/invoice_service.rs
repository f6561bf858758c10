use crate::error::AppError;
use crate::models::{Customer, Invoice, InvoiceRow, ProductPurchase};
use std::collections::BTreeMap;
use crate::schema::coerce;
use crate::services::catalog_service::CatalogService;
use crate::services::sales_service::parse_rows;
use crate::store::{Store, Table, TableKind};
use chrono::{Local, NaiveDate, NaiveDateTime};
use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashSet;
use stockbook_shared::{
    CreateInvoiceRequest, InvoiceLineItem, INVOICE_DATE_STAMP_FORMAT, INVOICE_NUMBER_PREFIX, INVOICE_SUFFIX_LEN,
    MAX_INVOICE_LINE_ITEMS,
};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceCreated {
    pub invoice_number: String,
    pub rows_written: usize,
    /// The customer's aggregate after this invoice, when a customers tab is configured.
    pub customer: Option<Customer>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InvoicesOverview {
    pub invoices: Vec<Invoice>,
    pub customers: Vec<Customer>,
    pub product_names: Vec<String>,
    pub today: String,
}

/// Invoice and customer ledger.
#[derive(Clone)]
pub struct InvoiceService {
    store: Store,
    catalog: CatalogService,
}

impl InvoiceService {
    pub fn new(store: Store) -> Self {
        Self {
            catalog: CatalogService::new(store.clone()),
            store,
        }
    }

    pub async fn create_invoice(&self, request: CreateInvoiceRequest) -> Result<InvoiceCreated, AppError> {
        self.create_invoice_at(request, Local::now().naive_local()).await
    }

    pub(crate) async fn create_invoice_at(
        &self,
        request: CreateInvoiceRequest,
        now: NaiveDateTime,
    ) -> Result<InvoiceCreated, AppError> {
        if request.items.len() > MAX_INVOICE_LINE_ITEMS {
            return Err(AppError::Validation(format!(
                "invoice has {} line items, at most {} allowed",
                request.items.len(),
                MAX_INVOICE_LINE_ITEMS
            )));
        }

        let customer_name = request.customer_name.clone();
        let lines = priced_lines(&request.items)?;
        let purchases = ProductPurchase::summarize(&request.items)?;
        let invoice_date = coerce::format_date(request.invoice_date.unwrap_or_else(|| now.date()));

        let _guard = self.store.lock(&[TableKind::Invoices, TableKind::Customers]).await?;
        let mut invoices = self.store.load_required(TableKind::Invoices).await?;

        let existing: HashSet<String> = invoices
            .table
            .rows()
            .iter()
            .filter_map(|row| Table::cell(row, "invoice_number"))
            .map(|number| number.trim().to_string())
            .collect();
        let invoice_number = next_invoice_number(now.date(), request.items.len(), &existing);

        let header = InvoiceRow {
            invoice_number: invoice_number.clone(),
            customer_name: customer_name.clone(),
            products_summary: products_summary(&lines),
            product_name: String::new(),
            price_sold: Decimal::ZERO,
            quantity: 0,
            line_total: Decimal::ZERO,
            shipment_fee: request.shipment_fee,
            total_amount: request.total_amount,
            invoice_date: invoice_date.clone(),
            created_at: Some(now),
        };

        let rows = invoice_rows(&header, &lines);
        let rows_written = rows.len();
        for row in rows {
            invoices.table.push_row(row.to_row());
        }
        self.store.save(TableKind::Invoices, &invoices).await?;

        info!(
            "Created invoice {} for '{}' with {} line items, total {}",
            invoice_number,
            customer_name,
            request.items.len(),
            request.total_amount
        );

        let customer = self
            .upsert_customer(&customer_name, request.total_amount, &invoice_date, purchases)
            .await?;

        Ok(InvoiceCreated {
            invoice_number,
            rows_written,
            customer,
        })
    }

    /// Fold an invoice into the customer's aggregate. The caller holds the
    /// customers lock. Names are matched exactly, whitespace included.
    async fn upsert_customer(
        &self,
        customer_name: &str,
        total_amount: Decimal,
        invoice_date: &str,
        purchases: BTreeMap<String, ProductPurchase>,
    ) -> Result<Option<Customer>, AppError> {
        let mut loaded = match self.store.load(TableKind::Customers).await? {
            Some(loaded) => loaded,
            None => {
                warn!("No customers sheet configured; '{}' not updated", customer_name);
                return Ok(None);
            }
        };

        let position = loaded
            .table
            .rows()
            .iter()
            .position(|row| Table::cell(row, "customer_name") == Some(customer_name));

        let customer = match position {
            Some(index) => {
                let row = loaded
                    .table
                    .row_mut(index)
                    .ok_or_else(|| AppError::Internal(format!("customer row {} vanished", index)))?;
                let mut customer = Customer::from_row(row)?;
                customer.record_invoice(total_amount, invoice_date, purchases);
                customer.write_to(row)?;
                debug!("Customer '{}' now has {} orders", customer_name, customer.total_orders);
                customer
            }
            None => {
                let customer = Customer::first_invoice(customer_name, total_amount, invoice_date, purchases);
                loaded.table.push_row(customer.to_row()?);
                debug!("New customer '{}'", customer_name);
                customer
            }
        };

        self.store.save(TableKind::Customers, &loaded).await?;
        Ok(Some(customer))
    }

    /// Remove every row of an invoice. Returns the number of rows removed.
    pub async fn delete_invoice(&self, invoice_number: &str) -> Result<usize, AppError> {
        let target = invoice_number.trim();

        let _guard = self.store.lock(&[TableKind::Invoices]).await?;
        let mut loaded = self.store.load_required(TableKind::Invoices).await?;

        let before = loaded.table.len();
        loaded
            .table
            .retain_rows(|row| Table::cell(row, "invoice_number").map(str::trim) != Some(target));
        let removed = before - loaded.table.len();

        if removed == 0 {
            return Err(AppError::NotFound(format!("Invoice {} not found.", target)));
        }

        self.store.save(TableKind::Invoices, &loaded).await?;
        info!("Deleted invoice {} ({} rows)", target, removed);
        warn!(
            "Customer totals are not reversed when invoice {} is deleted",
            target
        );
        Ok(removed)
    }

    pub async fn invoices(&self) -> Result<Vec<Invoice>, AppError> {
        match self.store.load(TableKind::Invoices).await? {
            Some(loaded) => Ok(Invoice::group(parse_rows(&loaded.table, InvoiceRow::from_row)?)),
            None => Ok(Vec::new()),
        }
    }

    pub async fn customers(&self) -> Result<Vec<Customer>, AppError> {
        match self.store.load(TableKind::Customers).await? {
            Some(loaded) => parse_rows(&loaded.table, Customer::from_row),
            None => Ok(Vec::new()),
        }
    }

    pub async fn invoices_overview(&self) -> Result<InvoicesOverview, AppError> {
        Ok(InvoicesOverview {
            invoices: self.invoices().await?,
            customers: self.customers().await?,
            product_names: self.catalog.product_names().await?,
            today: coerce::format_date(Local::now().date_naive()),
        })
    }
}

/// `INV-YYYYMMDD-<item count>-<hex suffix>`.
pub fn invoice_number(date: NaiveDate, item_count: usize, suffix: u32) -> String {
    let suffix = format!("{:0width$x}", suffix, width = INVOICE_SUFFIX_LEN);
    format!(
        "{}-{}-{}-{}",
        INVOICE_NUMBER_PREFIX,
        date.format(INVOICE_DATE_STAMP_FORMAT),
        item_count,
        &suffix[suffix.len() - INVOICE_SUFFIX_LEN..]
    )
}

/// A fresh invoice number that does not collide with `existing`.
pub fn next_invoice_number(date: NaiveDate, item_count: usize, existing: &HashSet<String>) -> String {
    let mut rng = rand::thread_rng();
    let bound = 1u32 << (4 * INVOICE_SUFFIX_LEN as u32);
    loop {
        let candidate = invoice_number(date, item_count, rng.gen_range(0..bound));
        if !existing.contains(&candidate) {
            return candidate;
        }
        debug!("Invoice number {} already taken, drawing another", candidate);
    }
}

/// A line item together with its total.
#[derive(Debug, Clone, Copy)]
pub struct PricedLine<'a> {
    pub item: &'a InvoiceLineItem,
    pub total: Decimal,
}

/// Price every line item. A total that does not fit in a `Decimal` rejects
/// the whole invoice.
pub fn priced_lines(items: &[InvoiceLineItem]) -> Result<Vec<PricedLine<'_>>, AppError> {
    items
        .iter()
        .map(|item| {
            item.line_total()
                .map(|total| PricedLine { item, total })
                .ok_or_else(|| AppError::Validation(format!("line total for '{}' is out of range", item.name.trim())))
        })
        .collect()
}

/// One line per item: `name xQTY @ PRICE = TOTAL`, joined with `; `.
pub fn products_summary(lines: &[PricedLine<'_>]) -> String {
    lines
        .iter()
        .map(|line| {
            format!(
                "{} x{} @ {:.2} = {:.2}",
                line.item.name.trim(),
                line.item.quantity,
                line.item.price,
                line.total
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// The rows that materialize an invoice: one per line item, or a single
/// placeholder row when there are none.
pub fn invoice_rows(header: &InvoiceRow, lines: &[PricedLine<'_>]) -> Vec<InvoiceRow> {
    if lines.is_empty() {
        return vec![header.clone()];
    }
    lines
        .iter()
        .map(|line| InvoiceRow {
            product_name: line.item.name.trim().to_string(),
            price_sold: line.item.price,
            quantity: line.item.quantity,
            line_total: line.total,
            ..header.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests;
