use super::*;
use crate::test_helpers::TestBook;

fn dec(value: &str) -> Decimal {
    value.parse().unwrap()
}

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(15, 45, 0)
        .unwrap()
}

fn item(name: &str, price: &str, quantity: i64) -> InvoiceLineItem {
    InvoiceLineItem {
        name: name.to_string(),
        price: dec(price),
        quantity,
        subtotal: None,
    }
}

fn request(customer: &str, items: Vec<InvoiceLineItem>, total: &str) -> CreateInvoiceRequest {
    CreateInvoiceRequest {
        customer_name: customer.to_string(),
        items,
        shipment_fee: dec("5"),
        total_amount: dec(total),
        invoice_date: NaiveDate::from_ymd_opt(2024, 4, 30),
    }
}

#[test]
fn formats_invoice_numbers() {
    let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

    assert_eq!(invoice_number(date, 3, 0xab12), "INV-20240501-3-00ab12");
    assert_eq!(invoice_number(date, 0, 0xffffff), "INV-20240501-0-ffffff");
}

#[test]
fn draws_numbers_outside_the_taken_set() {
    let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let mut taken = HashSet::new();

    for _ in 0..50 {
        let number = next_invoice_number(date, 2, &taken);
        assert!(number.starts_with("INV-20240501-2-"));
        assert_eq!(number.len(), "INV-20240501-2-".len() + INVOICE_SUFFIX_LEN);
        assert!(taken.insert(number));
    }
}

#[test]
fn summarizes_line_items() {
    let mut boxed = item("Candle", "3", 2);
    boxed.subtotal = Some(dec("5.5"));

    let items = [item("Soap", "2.5", 2), boxed];
    let summary = products_summary(&priced_lines(&items).unwrap());

    assert_eq!(summary, "Soap x2 @ 2.50 = 5.00; Candle x2 @ 3.00 = 5.50");
}

#[tokio::test]
async fn writes_one_row_per_line_item() {
    let book = TestBook::new();
    let service = InvoiceService::new(book.store.clone());

    let created = service
        .create_invoice_at(request("Ana", vec![item("Soap", "2.5", 2), item("Candle", "3", 1)], "13"), now())
        .await
        .unwrap();

    assert_eq!(created.rows_written, 2);
    let rows = book.rows(TableKind::Invoices).await;
    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert_eq!(row.get("invoice_number"), Some(&created.invoice_number));
        assert_eq!(row.get("customer_name").map(String::as_str), Some("Ana"));
        assert_eq!(row.get("invoice_date").map(String::as_str), Some("2024-04-30"));
        assert_eq!(row.get("created_at").map(String::as_str), Some("2024-05-01 15:45:00"));
    }

    let invoices = service.invoices().await.unwrap();
    assert_eq!(invoices.len(), 1);
    let lines: Vec<_> = invoices[0].lines.iter().map(|l| (l.product_name.as_str(), l.quantity)).collect();
    assert_eq!(lines, vec![("Soap", 2), ("Candle", 1)]);
    assert_eq!(invoices[0].total_amount, dec("13"));
    assert_eq!(invoices[0].shipment_fee, dec("5"));
}

#[tokio::test]
async fn invoice_without_items_keeps_a_placeholder_row() {
    let book = TestBook::new();
    let service = InvoiceService::new(book.store.clone());

    let created = service.create_invoice_at(request("Ana", vec![], "20"), now()).await.unwrap();

    assert_eq!(created.rows_written, 1);
    assert!(created.invoice_number.starts_with("INV-20240501-0-"));
    let invoices = service.invoices().await.unwrap();
    assert_eq!(invoices.len(), 1);
    assert!(invoices[0].lines.is_empty());
    assert_eq!(invoices[0].total_amount, dec("20"));
}

#[tokio::test]
async fn date_defaults_to_today() {
    let book = TestBook::new();
    let service = InvoiceService::new(book.store.clone());
    let mut no_date = request("Ana", vec![item("Soap", "1", 1)], "1");
    no_date.invoice_date = None;

    service.create_invoice_at(no_date, now()).await.unwrap();

    let invoices = service.invoices().await.unwrap();
    assert_eq!(invoices[0].invoice_date, "2024-05-01");
}

#[tokio::test]
async fn repeat_customer_accumulates() {
    let book = TestBook::new();
    let service = InvoiceService::new(book.store.clone());

    service
        .create_invoice_at(request("Ana", vec![item("Soap", "2.5", 2), item("Candle", "3", 1)], "13"), now())
        .await
        .unwrap();
    let second = service
        .create_invoice_at(request("Ana", vec![item("Soap", "2.5", 4)], "15"), now())
        .await
        .unwrap();

    let customer = second.customer.unwrap();
    assert_eq!(customer.total_orders, 2);
    assert_eq!(customer.total_spent, dec("28"));
    assert_eq!(customer.products_purchased["Soap"].qty, 6);
    assert_eq!(customer.products_purchased["Soap"].total_amount, dec("15"));
    assert_eq!(customer.products_purchased["Candle"].qty, 1);

    let customers = service.customers().await.unwrap();
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0], customer);
}

#[tokio::test]
async fn customer_names_are_case_sensitive() {
    let book = TestBook::new();
    let service = InvoiceService::new(book.store.clone());

    service.create_invoice_at(request("Ana", vec![], "1"), now()).await.unwrap();
    service.create_invoice_at(request("ana", vec![], "1"), now()).await.unwrap();

    assert_eq!(service.customers().await.unwrap().len(), 2);
}

#[tokio::test]
async fn surrounding_whitespace_makes_a_different_customer() {
    let book = TestBook::new();
    let service = InvoiceService::new(book.store.clone());

    service.create_invoice_at(request("Ana", vec![], "1"), now()).await.unwrap();
    let padded = service.create_invoice_at(request(" Ana ", vec![], "2"), now()).await.unwrap();
    let again = service.create_invoice_at(request(" Ana ", vec![], "3"), now()).await.unwrap();

    assert_eq!(padded.customer.unwrap().total_orders, 1);
    assert_eq!(again.customer.unwrap().total_orders, 2);
    let customers = service.customers().await.unwrap();
    let names: Vec<_> = customers.iter().map(|c| c.customer_name.as_str()).collect();
    assert_eq!(names, vec!["Ana", " Ana "]);
    assert_eq!(customers[1].total_spent, dec("5"));

    let rows = book.rows(TableKind::Invoices).await;
    assert_eq!(rows[1].get("customer_name").map(String::as_str), Some(" Ana "));
}

#[tokio::test]
async fn overflowing_line_totals_are_rejected_before_writing() {
    let book = TestBook::new();
    let service = InvoiceService::new(book.store.clone());
    let huge = item("Soap", "100000000000000000000", 10_000_000_000);

    let result = service.create_invoice_at(request("Ana", vec![huge], "1"), now()).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(book.rows(TableKind::Invoices).await.is_empty());
    assert!(book.rows(TableKind::Customers).await.is_empty());
}

#[test]
fn prices_lines_with_checked_totals() {
    let mut boxed = item("Candle", "3", 2);
    boxed.subtotal = Some(dec("5.5"));
    let items = [item("Soap", "2.5", 2), boxed];

    let lines = priced_lines(&items).unwrap();
    assert_eq!(lines.iter().map(|l| l.total).collect::<Vec<_>>(), vec![dec("5"), dec("5.5")]);

    let overflow = [item("Soap", "79228162514264337593543950335", 2)];
    assert!(matches!(priced_lines(&overflow), Err(AppError::Validation(_))));
}

#[tokio::test]
async fn invoices_are_kept_without_a_customers_tab() {
    let book = TestBook::with_tables(&[TableKind::Invoices]);
    let service = InvoiceService::new(book.store.clone());

    let created = service
        .create_invoice_at(request("Ana", vec![item("Soap", "1", 1)], "1"), now())
        .await
        .unwrap();

    assert!(created.customer.is_none());
    assert_eq!(service.invoices().await.unwrap().len(), 1);
    assert!(service.customers().await.unwrap().is_empty());
}

#[tokio::test]
async fn rejects_oversized_invoices() {
    let book = TestBook::new();
    let service = InvoiceService::new(book.store.clone());
    let items = vec![item("Soap", "1", 1); MAX_INVOICE_LINE_ITEMS + 1];

    let result = service.create_invoice_at(request("Ana", items, "1"), now()).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(book.rows(TableKind::Invoices).await.is_empty());
}

#[tokio::test]
async fn deletes_every_row_of_an_invoice() {
    let book = TestBook::new();
    let service = InvoiceService::new(book.store.clone());
    let first = service
        .create_invoice_at(request("Ana", vec![item("Soap", "1", 1), item("Candle", "2", 1)], "3"), now())
        .await
        .unwrap();
    let second = service
        .create_invoice_at(request("Ben", vec![item("Soap", "1", 1)], "1"), now())
        .await
        .unwrap();

    let removed = service.delete_invoice(&first.invoice_number).await.unwrap();

    assert_eq!(removed, 2);
    let invoices = service.invoices().await.unwrap();
    assert_eq!(invoices.len(), 1);
    assert_eq!(invoices[0].invoice_number, second.invoice_number);

    // Customer totals stay as they were.
    let customers = service.customers().await.unwrap();
    assert_eq!(customers.iter().find(|c| c.customer_name == "Ana").unwrap().total_orders, 1);
}

#[tokio::test]
async fn deleting_an_unknown_invoice_leaves_the_table_alone() {
    let book = TestBook::new();
    let service = InvoiceService::new(book.store.clone());
    service
        .create_invoice_at(request("Ana", vec![item("Soap", "1", 1)], "1"), now())
        .await
        .unwrap();
    let before = book.raw(TableKind::Invoices).await;

    let result = service.delete_invoice("INV-19990101-1-000000").await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert_eq!(book.raw(TableKind::Invoices).await, before);
}

#[tokio::test]
async fn overview_reports_today() {
    let book = TestBook::new();
    book.seed(TableKind::Index, &[&["product_name"], &["Soap"]]).await;
    let service = InvoiceService::new(book.store.clone());

    let overview = service.invoices_overview().await.unwrap();

    assert!(overview.invoices.is_empty());
    assert_eq!(overview.product_names, vec!["Soap".to_string()]);
    assert_eq!(overview.today, Local::now().date_naive().format("%Y-%m-%d").to_string());
}
