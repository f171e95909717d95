//! # Sale Item Service
//!
//! Line items go through the same two validation passes as sales. The
//! subtotal must already equal `quantity × unit_price − discount + tax`;
//! use [`NewSaleItem::priced`] to build one that does.

use std::sync::Arc;

use tracing::{debug, info};

use storehub_core::validation::{validate_item, validate_new_item};
use storehub_core::{
    NewSaleItem, SaleItem, SaleItemFilter, SaleItemRepository, StoreError, StoreResult,
    ValidationErrors,
};

use crate::require_id;

const SALE_ITEM: &str = "sale item";

#[derive(Clone)]
pub struct SaleItemService {
    repo: Arc<dyn SaleItemRepository>,
}

impl SaleItemService {
    pub fn new(repo: Arc<dyn SaleItemRepository>) -> Self {
        SaleItemService { repo }
    }

    pub async fn create(&self, new: &NewSaleItem) -> StoreResult<SaleItem> {
        validate_new_item(new).map_err(invalid)?;

        let item = self.repo.create(new).await?;
        info!(
            id = item.id,
            sale_id = item.sale_id,
            subtotal = %item.subtotal,
            "Sale item added"
        );
        Ok(item)
    }

    pub async fn get_by_id(&self, id: i64) -> StoreResult<SaleItem> {
        require_id(SALE_ITEM, id)?;
        self.repo.get_by_id(id).await
    }

    pub async fn get_by_sale(&self, sale_id: i64) -> StoreResult<Vec<SaleItem>> {
        require_id("sale", sale_id)?;
        self.repo.get_by_sale(sale_id).await
    }

    pub async fn filter(&self, filter: &SaleItemFilter) -> StoreResult<Vec<SaleItem>> {
        filter.validate()?;
        let filter = filter.normalized();
        debug!(?filter, "Filtering sale items");
        self.repo.filter(&filter).await
    }

    pub async fn update(&self, item: &mut SaleItem) -> StoreResult<()> {
        require_id(SALE_ITEM, item.id)?;
        validate_item(item).map_err(invalid)?;

        self.repo.update(item).await?;
        info!(id = item.id, subtotal = %item.subtotal, "Sale item updated");
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        require_id(SALE_ITEM, id)?;
        self.repo.delete(id).await
    }

    /// Removes every item of a sale; returns how many went.
    pub async fn delete_by_sale(&self, sale_id: i64) -> StoreResult<u64> {
        require_id("sale", sale_id)?;
        let removed = self.repo.delete_by_sale(sale_id).await?;
        info!(sale_id, removed, "Sale items removed");
        Ok(removed)
    }
}

fn invalid(errors: ValidationErrors) -> StoreError {
    StoreError::InvalidData {
        entity: SALE_ITEM,
        errors,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
