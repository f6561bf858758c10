use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sheets,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store_backend: StoreBackend,
    pub sheets_api_base: String,
    pub google_access_token: Option<String>,
    pub cors_allowed_origin: Option<String>,
    pub inventory_sheet_url: Option<String>,
    pub sold_items_sheet_url: Option<String>,
    pub invoices_sheet_url: Option<String>,
    pub customers_sheet_url: Option<String>,
    pub used_freebie_sheet_url: Option<String>,
    pub index_sheet_url: Option<String>,
}

/// Sheet URLs for each table, as configured. A missing URL disables that table.
#[derive(Debug, Clone, Default)]
pub struct TableUrls {
    pub inventory: Option<String>,
    pub sold_items: Option<String>,
    pub invoices: Option<String>,
    pub customers: Option<String>,
    pub used_freebie: Option<String>,
    pub index: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080)?
            .set_default("store_backend", "sheets")?
            .set_default("sheets_api_base", "https://sheets.googleapis.com/v4")?
            .add_source(config::Environment::default())
            .build()?;

        config.try_deserialize()
    }

    pub fn table_urls(&self) -> TableUrls {
        fn non_blank(url: &Option<String>) -> Option<String> {
            url.as_ref()
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty())
        }

        TableUrls {
            inventory: non_blank(&self.inventory_sheet_url),
            sold_items: non_blank(&self.sold_items_sheet_url),
            invoices: non_blank(&self.invoices_sheet_url),
            customers: non_blank(&self.customers_sheet_url),
            used_freebie: non_blank(&self.used_freebie_sheet_url),
            index: non_blank(&self.index_sheet_url),
        }
    }
}
