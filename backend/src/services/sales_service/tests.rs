use super::*;
use crate::store::TableKind;
use crate::test_helpers::TestBook;
use chrono::NaiveDate;

fn dec(value: &str) -> Decimal {
    value.parse().unwrap()
}

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
}

fn lot(cost_per_unit: &str) -> Lot {
    let mut lot = Lot::create(
        crate::models::NewLot {
            product_name: "Soap".to_string(),
            total_price: dec("100"),
            shipping_admin_fee: Decimal::ZERO,
            quantity: 5,
            supplier: None,
            remarks: None,
            status: stockbook_shared::LotStatus::InStock,
        },
        now(),
    );
    lot.total_cost_per_unit = dec(cost_per_unit);
    lot
}

fn sold(tithe: &str, kept: bool) -> SoldItem {
    let mut item = SalesService::sold_item_for(&lot("1"), 1, dec("10"), "", now()).unwrap();
    item.tithe = dec(tithe);
    item.tithe_kept = kept;
    item
}

#[test]
fn computes_sale_economics() {
    let economics = SaleEconomics::compute(dec("40"), 2, dec("150")).unwrap();

    assert_eq!(economics.total_cost, dec("80"));
    assert_eq!(economics.profit, dec("70"));
    assert_eq!(economics.tithe, dec("7.0"));
    assert_eq!(economics.profit_after_tithe, dec("63.0"));
}

#[test]
fn tithe_is_negative_for_a_loss() {
    let economics = SaleEconomics::compute(dec("40"), 2, dec("50")).unwrap();

    assert_eq!(economics.profit, dec("-30"));
    assert_eq!(economics.tithe, dec("-3"));
    assert_eq!(economics.profit_after_tithe, dec("-27"));
}

#[test]
fn out_of_range_sales_are_rejected() {
    let result = SaleEconomics::compute(dec("100000000000000000000"), 10_000_000_000, dec("1"));
    assert!(matches!(result, Err(AppError::Validation(_))));

    let result = SalesService::sold_item_for(&lot("100000000000000000000"), 10_000_000_000, dec("1"), "", now());
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[test]
fn totals_ignore_sums_that_overflow() {
    let mut huge = sold("0", false);
    huge.profit = Decimal::MAX;
    let mut more = sold("0", false);
    more.profit = dec("5");

    let totals = SalesTotals::from_items(&[huge, more]);

    assert_eq!(totals.total_profit, Decimal::MAX);
}

#[test]
fn sold_item_copies_the_lot_cost_basis() {
    let item = SalesService::sold_item_for(&lot("40"), 2, dec("150"), "  ", now()).unwrap();

    assert_eq!(item.product_name, "Soap");
    assert_eq!(item.quantity, 2);
    assert_eq!(item.total_cost_per_unit, dec("40"));
    assert_eq!(item.profit, dec("70"));
    assert!(!item.tithe_kept);
    assert_eq!(item.remarks, None);
    assert_eq!(item.date_sold, Some(now()));
}

#[test]
fn totals_split_kept_and_unkept_tithe() {
    let items = vec![sold("7", true), sold("3", false), sold("-1", true)];

    let totals = SalesTotals::from_items(&items);

    assert_eq!(totals.total_tithe, dec("9"));
    assert_eq!(totals.tithe_kept_total, dec("6"));
    assert_eq!(totals.tithe_unkept_total, dec("3"));
}

#[tokio::test]
async fn appends_sold_items_to_an_empty_tab() {
    let book = TestBook::new();
    let service = SalesService::new(book.store.clone());
    let item = SalesService::sold_item_for(&lot("40"), 2, dec("150"), "gift wrap", now()).unwrap();

    assert!(service.append_sold_item(&item).await.unwrap());

    let stored = service.sold_items().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, item.id);
    assert_eq!(stored[0].profit_after_tithe, dec("63"));
    assert_eq!(stored[0].remarks.as_deref(), Some("gift wrap"));
}

#[tokio::test]
async fn skips_sale_record_without_a_sold_items_tab() {
    let book = TestBook::with_tables(&[TableKind::Inventory]);
    let service = SalesService::new(book.store.clone());
    let item = SalesService::sold_item_for(&lot("40"), 1, dec("60"), "", now()).unwrap();

    assert!(!service.append_sold_item(&item).await.unwrap());
    assert!(service.sold_items().await.unwrap().is_empty());
}

#[tokio::test]
async fn toggling_tithe_kept_is_idempotent() {
    let book = TestBook::new();
    let service = SalesService::new(book.store.clone());
    let first = SalesService::sold_item_for(&lot("40"), 2, dec("150"), "", now()).unwrap();
    let second = SalesService::sold_item_for(&lot("10"), 1, dec("30"), "", now()).unwrap();
    service.append_sold_item(&first).await.unwrap();
    service.append_sold_item(&second).await.unwrap();

    for kept in [true, false, true, false] {
        service.set_tithe_kept(RecordRef::Id(first.id), kept).await.unwrap();
    }
    service.set_tithe_kept(RecordRef::Position(1), true).await.unwrap();
    service.set_tithe_kept(RecordRef::Position(1), true).await.unwrap();

    let overview = service.sold_overview().await.unwrap();
    assert!(!overview.items[0].tithe_kept);
    assert!(overview.items[1].tithe_kept);
    assert_eq!(overview.totals.tithe_kept_total, dec("2"));
    assert_eq!(overview.totals.tithe_unkept_total, dec("7"));
}

#[tokio::test]
async fn unknown_sold_item_is_not_found() {
    let book = TestBook::new();
    let service = SalesService::new(book.store.clone());

    let result = service.set_tithe_kept(RecordRef::Position(0), true).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn splits_dispositions_by_status() {
    let book = TestBook::new();
    book.seed(
        TableKind::UsedFreebie,
        &[
            &["id", "product_name", "quantity", "total_cost_per_unit", "status", "remarks", "date_used"],
            &["", "Soap", "1", "2", "used", "", ""],
            &["", "Candle", "2", "3", "Freebie", "promo", ""],
            &["", "Towel", "1", "4", "used", "", ""],
        ],
    )
    .await;
    let service = SalesService::new(book.store.clone());

    let overview = service.disposition_overview().await.unwrap();

    let used: Vec<_> = overview.used_items.iter().map(|i| i.product_name.as_str()).collect();
    assert_eq!(used, vec!["Soap", "Towel"]);
    assert_eq!(overview.freebie_items.len(), 1);
    assert_eq!(overview.freebie_items[0].remarks.as_deref(), Some("promo"));
}
