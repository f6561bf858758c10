#![allow(dead_code)]

use stockbook_backend::test_helpers::TestBook;
use stockbook_backend::AppServices;

/// Initialize the full app over an in-memory workbook.
macro_rules! test_app {
    ($book:expr) => {{
        let services = stockbook_backend::AppServices::new($book.store.clone());
        actix_web::test::init_service(
            actix_web::App::new()
                .configure(move |cfg| services.register(cfg))
                .configure(stockbook_backend::configure_routes),
        )
        .await
    }};
}

pub fn services(book: &TestBook) -> AppServices {
    AppServices::new(book.store.clone())
}

pub fn inventory_header() -> &'static [&'static str] {
    &[
        "id",
        "product_name",
        "total_price",
        "shipping_admin_fee",
        "total_cost_per_unit",
        "quantity",
        "total_bought_quantity",
        "remaining_qty",
        "status",
        "supplier",
        "date_added",
    ]
}
