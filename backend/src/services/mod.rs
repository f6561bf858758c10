pub mod catalog_service;
pub mod inventory_service;
pub mod invoice_service;
pub mod restructure_service;
pub mod sales_service;

pub use catalog_service::CatalogService;
pub use inventory_service::InventoryService;
pub use invoice_service::InvoiceService;
pub use restructure_service::RestructureService;
pub use sales_service::SalesService;
