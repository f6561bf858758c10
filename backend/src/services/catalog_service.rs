use crate::error::AppError;
use crate::store::{Store, TableKind};
use std::collections::HashSet;
use tracing::debug;

/// Product choices offered by the forms, read from the INDEX tab.
#[derive(Clone)]
pub struct CatalogService {
    store: Store,
}

impl CatalogService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Names from the first column of the index tab in sheet order, trimmed,
    /// deduplicated and without blanks. Empty when no index is configured.
    pub async fn product_names(&self) -> Result<Vec<String>, AppError> {
        let loaded = match self.store.load(TableKind::Index).await? {
            Some(loaded) => loaded,
            None => return Ok(Vec::new()),
        };

        let first_column = match loaded.table.columns().first() {
            Some(column) => column.clone(),
            None => return Ok(Vec::new()),
        };

        let mut seen = HashSet::new();
        let names: Vec<String> = loaded
            .table
            .rows()
            .iter()
            .filter_map(|row| row.get(&first_column))
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .filter(|name| seen.insert(name.to_string()))
            .map(str::to_string)
            .collect();

        debug!("Loaded {} product names from the index", names.len());
        Ok(names)
    }
}
