use crate::error::AppError;
use crate::models::{self, DispositionItem, Lot, SoldItem};
use crate::store::{Store, Table, TableKind};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use stockbook_shared::{DispositionStatus, RecordRef, TITHE_RATE};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Unit economics of one sale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SaleEconomics {
    pub total_cost: Decimal,
    pub profit: Decimal,
    pub tithe: Decimal,
    pub profit_after_tithe: Decimal,
}

impl SaleEconomics {
    /// Cost is the lot's per-unit cost times the units sold in this sale.
    /// The tithe is always 10% of profit, negative for a sale at a loss.
    /// Figures that do not fit in a `Decimal` are a validation error.
    pub fn compute(total_cost_per_unit: Decimal, quantity: i64, selling_price: Decimal) -> Result<Self, AppError> {
        let out_of_range = || {
            AppError::Validation(format!(
                "sale of {} units at {} per unit for {} is out of range",
                quantity, total_cost_per_unit, selling_price
            ))
        };

        let total_cost = total_cost_per_unit
            .checked_mul(Decimal::from(quantity))
            .ok_or_else(out_of_range)?;
        let profit = selling_price.checked_sub(total_cost).ok_or_else(out_of_range)?;
        let tithe = profit.checked_mul(TITHE_RATE).ok_or_else(out_of_range)?;
        let profit_after_tithe = profit.checked_sub(tithe).ok_or_else(out_of_range)?;
        Ok(Self {
            total_cost,
            profit,
            tithe,
            profit_after_tithe,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SalesTotals {
    pub total_profit: Decimal,
    pub total_tithe: Decimal,
    pub total_profit_after_tithe: Decimal,
    pub tithe_kept_total: Decimal,
    pub tithe_unkept_total: Decimal,
}

impl SalesTotals {
    pub fn from_items(items: &[SoldItem]) -> Self {
        let mut totals = SalesTotals::default();
        for item in items {
            totals.total_profit = models::add_amount(totals.total_profit, item.profit, "total_profit");
            totals.total_tithe = models::add_amount(totals.total_tithe, item.tithe, "total_tithe");
            totals.total_profit_after_tithe = models::add_amount(
                totals.total_profit_after_tithe,
                item.profit_after_tithe,
                "total_profit_after_tithe",
            );
            if item.tithe_kept {
                totals.tithe_kept_total = models::add_amount(totals.tithe_kept_total, item.tithe, "tithe_kept_total");
            }
        }
        totals.tithe_unkept_total = totals
            .total_tithe
            .checked_sub(totals.tithe_kept_total)
            .unwrap_or_else(|| {
                warn!("tithe_unkept_total overflowed; reporting zero");
                Decimal::ZERO
            });
        totals
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SoldOverview {
    pub items: Vec<SoldItem>,
    pub totals: SalesTotals,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DispositionOverview {
    pub used_items: Vec<DispositionItem>,
    pub freebie_items: Vec<DispositionItem>,
}

/// Records sales and dispositions and maintains the tithe ledger.
#[derive(Clone)]
pub struct SalesService {
    store: Store,
}

impl SalesService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Sale record for `quantity` units of `lot` sold for `selling_price` in total.
    pub fn sold_item_for(
        lot: &Lot,
        quantity: i64,
        selling_price: Decimal,
        remarks: &str,
        now: NaiveDateTime,
    ) -> Result<SoldItem, AppError> {
        let economics = SaleEconomics::compute(lot.total_cost_per_unit, quantity, selling_price)?;
        Ok(SoldItem {
            id: Uuid::new_v4(),
            product_name: lot.product_name.clone(),
            quantity,
            total_cost_per_unit: lot.total_cost_per_unit,
            selling_price,
            total_cost: economics.total_cost,
            profit: economics.profit,
            tithe: economics.tithe,
            profit_after_tithe: economics.profit_after_tithe,
            tithe_kept: false,
            remarks: Some(remarks.to_string()).filter(|r| !r.trim().is_empty()),
            date_sold: Some(now),
        })
    }

    pub fn disposition_for(
        lot: &Lot,
        status: DispositionStatus,
        quantity: i64,
        remarks: &str,
        now: NaiveDateTime,
    ) -> DispositionItem {
        DispositionItem {
            id: Uuid::new_v4(),
            product_name: lot.product_name.clone(),
            quantity,
            total_cost_per_unit: lot.total_cost_per_unit,
            status: Some(status),
            remarks: Some(remarks.to_string()).filter(|r| !r.trim().is_empty()),
            date_used: Some(now),
        }
    }

    /// Append a sale to the sold-items tab. The caller must hold that tab's
    /// lock. Returns `false` when no sold-items tab is configured.
    pub async fn append_sold_item(&self, item: &SoldItem) -> Result<bool, AppError> {
        let mut loaded = match self.store.load(TableKind::SoldItems).await? {
            Some(loaded) => loaded,
            None => {
                warn!("No sold items sheet configured; sale of '{}' not recorded", item.product_name);
                return Ok(false);
            }
        };
        loaded.table.push_row(item.to_row());
        self.store.save(TableKind::SoldItems, &loaded).await?;
        debug!("Recorded sale {} of {} x '{}'", item.id, item.quantity, item.product_name);
        Ok(true)
    }

    /// Append a used/freebie record. The caller must hold that tab's lock.
    pub async fn append_disposition(&self, item: &DispositionItem) -> Result<bool, AppError> {
        let mut loaded = match self.store.load(TableKind::UsedFreebie).await? {
            Some(loaded) => loaded,
            None => {
                warn!("No used/freebie sheet configured; '{}' not recorded", item.product_name);
                return Ok(false);
            }
        };
        loaded.table.push_row(item.to_row());
        self.store.save(TableKind::UsedFreebie, &loaded).await?;
        debug!("Recorded disposition {} of {} x '{}'", item.id, item.quantity, item.product_name);
        Ok(true)
    }

    /// Mark whether the tithe of a sale has been set aside.
    pub async fn set_tithe_kept(&self, reference: RecordRef, tithe_kept: bool) -> Result<SoldItem, AppError> {
        let _guard = self.store.lock(&[TableKind::SoldItems]).await?;
        let mut loaded = self.store.load_required(TableKind::SoldItems).await?;

        let index = models::locate(&loaded.table, reference)
            .ok_or_else(|| AppError::NotFound("Sold item not found. Please refresh and try again.".to_string()))?;
        let row = loaded
            .table
            .row_mut(index)
            .ok_or_else(|| AppError::Internal(format!("sold item row {} vanished", index)))?;

        let mut item = SoldItem::from_row(row)?;
        item.tithe_kept = tithe_kept;
        item.write_to(row);

        self.store.save(TableKind::SoldItems, &loaded).await?;
        info!("Updated tithe status for sold item {} to {}", item.id, tithe_kept);
        Ok(item)
    }

    pub async fn sold_items(&self) -> Result<Vec<SoldItem>, AppError> {
        match self.store.load(TableKind::SoldItems).await? {
            Some(loaded) => parse_rows(&loaded.table, SoldItem::from_row),
            None => Ok(Vec::new()),
        }
    }

    pub async fn sold_overview(&self) -> Result<SoldOverview, AppError> {
        let items = self.sold_items().await?;
        let totals = SalesTotals::from_items(&items);
        Ok(SoldOverview { items, totals })
    }

    pub async fn disposition_overview(&self) -> Result<DispositionOverview, AppError> {
        let items = match self.store.load(TableKind::UsedFreebie).await? {
            Some(loaded) => parse_rows(&loaded.table, DispositionItem::from_row)?,
            None => Vec::new(),
        };

        let (used_items, others): (Vec<_>, Vec<_>) = items
            .into_iter()
            .partition(|item| item.status == Some(DispositionStatus::Used));
        let freebie_items = others
            .into_iter()
            .filter(|item| item.status == Some(DispositionStatus::Freebie))
            .collect();

        Ok(DispositionOverview {
            used_items,
            freebie_items,
        })
    }
}

pub(crate) fn parse_rows<T>(
    table: &Table,
    parse: impl Fn(&crate::store::Row) -> Result<T, AppError>,
) -> Result<Vec<T>, AppError> {
    table.rows().iter().map(parse).collect()
}

#[cfg(test)]
mod tests;
