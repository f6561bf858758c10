use crate::error::AppError;
use crate::models::{self, Lot, NewLot};
use crate::services::catalog_service::CatalogService;
use crate::services::sales_service::{parse_rows, SalesService};
use crate::store::{Store, TableKind};
use chrono::{Local, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use stockbook_shared::{AddProductRequest, DispositionStatus, LotStatus, UpdateStatusRequest};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Stock position of one product across all of its lots.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductStock {
    pub product_name: String,
    pub lots: usize,
    pub total_bought: i64,
    pub remaining: i64,
    pub stock_value: Decimal,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InventoryOverview {
    pub lots: Vec<Lot>,
    pub products: Vec<ProductStock>,
    pub product_names: Vec<String>,
}

/// What a status transition changed.
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdated {
    pub lot: Lot,
    pub sold_item_id: Option<Uuid>,
    pub disposition_id: Option<Uuid>,
}

/// Inventory ledger: lots, their remaining stock and status transitions.
#[derive(Clone)]
pub struct InventoryService {
    store: Store,
    sales: SalesService,
    catalog: CatalogService,
}

impl InventoryService {
    pub fn new(store: Store) -> Self {
        Self {
            sales: SalesService::new(store.clone()),
            catalog: CatalogService::new(store.clone()),
            store,
        }
    }

    pub async fn add_lot(&self, request: AddProductRequest) -> Result<Lot, AppError> {
        self.add_lot_at(request, Local::now().naive_local()).await
    }

    pub(crate) async fn add_lot_at(&self, request: AddProductRequest, now: NaiveDateTime) -> Result<Lot, AppError> {
        let candidate = NewLot {
            product_name: request.product_name,
            total_price: request.total_price,
            shipping_admin_fee: request.shipping_admin_fee,
            quantity: request.quantity,
            supplier: request.supplier,
            remarks: request.remarks,
            status: request.status.unwrap_or(LotStatus::InStock),
        };

        let _guard = self.store.lock(&[TableKind::Inventory]).await?;
        let mut loaded = self.store.load_required(TableKind::Inventory).await?;

        let lots = parse_rows(&loaded.table, Lot::from_row)?;
        if let Some(existing) = lots.iter().find(|lot| lot.is_probable_duplicate_of(&candidate, now)) {
            warn!(
                "Rejected probable duplicate of lot {} ('{}')",
                existing.id, existing.product_name
            );
            return Err(AppError::Duplicate(
                "This looks like a duplicate submission. The same product was added less than 2 minutes ago."
                    .to_string(),
            ));
        }

        let lot = Lot::create(candidate, now);
        loaded.table.push_row(lot.to_row());
        self.store.save(TableKind::Inventory, &loaded).await?;

        info!(
            "Added lot {} for '{}': {} units at {} per unit",
            lot.id, lot.product_name, lot.total_bought_quantity, lot.total_cost_per_unit
        );
        Ok(lot)
    }

    /// Move a lot to a new status, taking units out of stock for
    /// sold/used/freebie and recording the matching sale or disposition.
    pub async fn transition_status(&self, request: UpdateStatusRequest) -> Result<StatusUpdated, AppError> {
        self.transition_status_at(request, Local::now().naive_local()).await
    }

    pub(crate) async fn transition_status_at(
        &self,
        request: UpdateStatusRequest,
        now: NaiveDateTime,
    ) -> Result<StatusUpdated, AppError> {
        let _guard = self
            .store
            .lock(&[TableKind::Inventory, TableKind::SoldItems, TableKind::UsedFreebie])
            .await?;
        let mut loaded = self.store.load_required(TableKind::Inventory).await?;

        let index = models::locate(&loaded.table, request.product_id)
            .ok_or_else(|| AppError::NotFound("Product not found. Please refresh and try again.".to_string()))?;
        let row = loaded
            .table
            .row_mut(index)
            .ok_or_else(|| AppError::Internal(format!("inventory row {} vanished", index)))?;
        let mut lot = Lot::from_row(row)?;

        let quantity_used = request.quantity_used.max(0);
        if request.status.consumes_stock() {
            let before = lot.remaining_qty;
            let after = lot.dispose(quantity_used);
            debug!("Lot {} remaining {} -> {}", lot.id, before, after);
        }
        lot.status = request.status;
        lot.remarks = Some(request.remarks.clone()).filter(|r| !r.trim().is_empty());

        let mut sold_item_id = None;
        let mut disposition_id = None;

        match (request.status, request.selling_price) {
            (LotStatus::Sold, Some(selling_price)) => {
                let item = SalesService::sold_item_for(&lot, quantity_used, selling_price, &request.remarks, now)?;
                lot.selling_price = Some(item.selling_price);
                lot.profit = Some(item.profit);
                lot.tithe = Some(item.tithe);
                lot.profit_after_tithe = Some(item.profit_after_tithe);
                lot.date_sold = Some(now);
                if self.sales.append_sold_item(&item).await? {
                    sold_item_id = Some(item.id);
                }
            }
            (LotStatus::Used | LotStatus::Freebie, _) => {
                let status = DispositionStatus::try_from(request.status)
                    .map_err(|e| AppError::Internal(e.to_string()))?;
                let item = SalesService::disposition_for(&lot, status, quantity_used, &request.remarks, now);
                if self.sales.append_disposition(&item).await? {
                    disposition_id = Some(item.id);
                }
            }
            _ => {}
        }

        lot.write_to(row);
        self.store.save(TableKind::Inventory, &loaded).await?;

        info!(
            "Lot {} ('{}') moved to {} with {} remaining",
            lot.id, lot.product_name, lot.status, lot.remaining_qty
        );
        Ok(StatusUpdated {
            lot,
            sold_item_id,
            disposition_id,
        })
    }

    pub async fn lots(&self) -> Result<Vec<Lot>, AppError> {
        match self.store.load(TableKind::Inventory).await? {
            Some(loaded) => parse_rows(&loaded.table, Lot::from_row),
            None => Ok(Vec::new()),
        }
    }

    pub async fn inventory_overview(&self) -> Result<InventoryOverview, AppError> {
        let lots = self.lots().await?;
        let products = product_stock(&lots);
        let product_names = self.catalog.product_names().await?;
        Ok(InventoryOverview {
            lots,
            products,
            product_names,
        })
    }
}

/// Per-product totals, ordered by product name.
pub fn product_stock(lots: &[Lot]) -> Vec<ProductStock> {
    let mut by_name: BTreeMap<&str, ProductStock> = BTreeMap::new();
    for lot in lots {
        let entry = by_name
            .entry(lot.product_name.as_str())
            .or_insert_with(|| ProductStock {
                product_name: lot.product_name.clone(),
                ..ProductStock::default()
            });
        let remaining = lot.remaining_qty.max(0);
        entry.lots += 1;
        entry.total_bought = entry.total_bought.saturating_add(lot.total_bought_quantity);
        entry.remaining = entry.remaining.saturating_add(remaining);
        let value = lot
            .total_cost_per_unit
            .checked_mul(Decimal::from(remaining))
            .unwrap_or_else(|| {
                warn!("Stock value of lot {} is out of range; counting it as zero", lot.id);
                Decimal::ZERO
            });
        entry.stock_value = models::add_amount(entry.stock_value, value, "stock_value");
    }
    by_name.into_values().collect()
}
