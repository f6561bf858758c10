//! Inventory, sales and invoicing backed by spreadsheet tabs.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod schema;
pub mod services;
pub mod store;
pub mod test_helpers;
pub mod utils;

use actix_web::web;
use services::{InventoryService, InvoiceService, SalesService};
use store::Store;

/// Every service the HTTP layer needs, built around one shared [`Store`].
#[derive(Clone)]
pub struct AppServices {
    pub store: Store,
    pub inventory: InventoryService,
    pub sales: SalesService,
    pub invoices: InvoiceService,
}

impl AppServices {
    pub fn new(store: Store) -> Self {
        Self {
            inventory: InventoryService::new(store.clone()),
            sales: SalesService::new(store.clone()),
            invoices: InvoiceService::new(store.clone()),
            store,
        }
    }

    /// Register the services as app data.
    pub fn register(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.store.clone()))
            .app_data(web::Data::new(self.inventory.clone()))
            .app_data(web::Data::new(self.sales.clone()))
            .app_data(web::Data::new(self.invoices.clone()))
            .app_data(utils::validation::json_config());
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::index)
        .service(handlers::health::health_check)
        .service(handlers::inventory::inventory_page)
        .service(handlers::sales::sold_page)
        .service(handlers::sales::used_freebie_page)
        .service(handlers::invoices::invoices_page)
        .service(
            web::scope("/api")
                .service(handlers::inventory::add_product)
                .service(handlers::inventory::update_status)
                .service(handlers::sales::update_tithe_status)
                .service(handlers::invoices::create_invoice)
                .service(handlers::invoices::delete_invoice),
        );
}
