//! # Repository Traits
//!
//! The storage capabilities the sale service depends on.
//!
//! ## One Trait Per Aggregate
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SaleService ──► Arc<dyn SaleRepository>                               │
//! │                     │                                                   │
//! │                     ├── storehub-db::SqliteSaleRepository (SQLite)      │
//! │                     └── in-memory fakes (service tests)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Implementations provide reads, `create`, `update` and `delete`. The
//! lifecycle helpers (`cancel`, `complete`, `mark_returned`, `activate`) are
//! provided methods built on `get_by_id` + `update`, so every status change
//! goes through the state machine and the optimistic version check.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreResult;
use crate::filter::{SaleFilter, SaleItemFilter};
use crate::status::SaleTransition;
use crate::types::{NewSale, NewSaleItem, Sale, SaleItem, SaleStatus};

#[async_trait]
pub trait SaleRepository: Send + Sync {
    /// Inserts a sale and returns it with its storage-assigned id,
    /// `version = 1` and server timestamps.
    async fn create(&self, sale: &NewSale) -> StoreResult<Sale>;

    async fn get_by_id(&self, id: i64) -> StoreResult<Sale>;

    /// Current version of a sale, for callers retrying after a conflict.
    async fn get_version_by_id(&self, id: i64) -> StoreResult<i32>;

    async fn get_by_client(&self, client_id: i64) -> StoreResult<Vec<Sale>>;

    async fn get_by_user(&self, user_id: i64) -> StoreResult<Vec<Sale>>;

    async fn get_by_status(&self, status: SaleStatus) -> StoreResult<Vec<Sale>>;

    /// Sales whose `sale_date` lies in `[start, end]`.
    async fn get_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<Sale>>;

    /// Sales matching an already validated filter.
    async fn filter(&self, filter: &SaleFilter) -> StoreResult<Vec<Sale>>;

    /// Writes `sale` if the stored version still equals `sale.version`.
    ///
    /// On success `sale.version` and `sale.updated_at` are refreshed from
    /// storage. Fails with `NotFound` when the row is gone and with
    /// `VersionConflict` when another writer got there first.
    async fn update(&self, sale: &mut Sale) -> StoreResult<()>;

    async fn delete(&self, id: i64) -> StoreResult<()>;

    /// Loads the sale, applies `transition` and persists it.
    async fn transition(&self, id: i64, transition: SaleTransition) -> StoreResult<Sale> {
        let mut sale = self.get_by_id(id).await?;
        sale.transition(transition)?;
        self.update(&mut sale).await?;
        Ok(sale)
    }

    async fn cancel(&self, id: i64) -> StoreResult<Sale> {
        self.transition(id, SaleTransition::Cancel).await
    }

    async fn complete(&self, id: i64) -> StoreResult<Sale> {
        self.transition(id, SaleTransition::Complete).await
    }

    async fn mark_returned(&self, id: i64) -> StoreResult<Sale> {
        self.transition(id, SaleTransition::Return).await
    }

    async fn activate(&self, id: i64) -> StoreResult<Sale> {
        self.transition(id, SaleTransition::Activate).await
    }
}

#[async_trait]
pub trait SaleItemRepository: Send + Sync {
    async fn create(&self, item: &NewSaleItem) -> StoreResult<SaleItem>;

    async fn get_by_id(&self, id: i64) -> StoreResult<SaleItem>;

    async fn get_by_sale(&self, sale_id: i64) -> StoreResult<Vec<SaleItem>>;

    async fn filter(&self, filter: &SaleItemFilter) -> StoreResult<Vec<SaleItem>>;

    /// Overwrites the item's amounts; `updated_at` is refreshed in place.
    async fn update(&self, item: &mut SaleItem) -> StoreResult<()>;

    async fn delete(&self, id: i64) -> StoreResult<()>;

    /// Removes every item of a sale and returns how many were removed.
    async fn delete_by_sale(&self, sale_id: i64) -> StoreResult<u64>;
}
