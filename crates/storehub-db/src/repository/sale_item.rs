//! # Sale Item Repository
//!
//! Database operations for sale line items.
//!
//! Items have no version column: the service recomputes the subtotal before
//! every write and the parent sale carries the concurrency token. Deleting a
//! sale removes its items through `ON DELETE CASCADE`.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use storehub_core::{
    NewSaleItem, SaleItem, SaleItemFilter, SaleItemRepository, SortDirection, StorageOp,
    StoreError, StoreResult,
};

use super::decode_rows;
use crate::error::classify;
use crate::query::{sale_item_query, BuiltQuery, Cmp, SelectBuilder, SortPolicy, SALE_ITEM_COLUMNS};

const SALE_ITEM: &str = "sale item";

/// SQLite-backed [`SaleItemRepository`].
#[derive(Debug, Clone)]
pub struct SqliteSaleItemRepository {
    pool: SqlitePool,
    sort_policy: SortPolicy,
}

impl SqliteSaleItemRepository {
    pub fn new(pool: SqlitePool, sort_policy: SortPolicy) -> Self {
        SqliteSaleItemRepository { pool, sort_policy }
    }

    async fn list(&self, query: BuiltQuery) -> StoreResult<Vec<SaleItem>> {
        let rows = query
            .query()
            .fetch_all(&self.pool)
            .await
            .map_err(classify(StorageOp::Iterate, SALE_ITEM))?;

        decode_rows(&rows, SALE_ITEM)
    }
}

#[async_trait]
impl SaleItemRepository for SqliteSaleItemRepository {
    async fn create(&self, new: &NewSaleItem) -> StoreResult<SaleItem> {
        let now = Utc::now();

        debug!(
            sale_id = new.sale_id,
            product_id = new.product_id,
            quantity = new.quantity,
            "Adding sale item"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO sale_items (
                sale_id, product_id, quantity,
                unit_price, discount, tax, subtotal,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5, ?6, ?7,
                ?8, ?8
            )
            "#,
        )
        .bind(new.sale_id)
        .bind(new.product_id)
        .bind(new.quantity)
        .bind(new.unit_price)
        .bind(new.discount)
        .bind(new.tax)
        .bind(new.subtotal)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(classify(StorageOp::Create, SALE_ITEM))?;

        Ok(SaleItem::from_new(result.last_insert_rowid(), new, now))
    }

    async fn get_by_id(&self, id: i64) -> StoreResult<SaleItem> {
        let row = sqlx::query(&format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify(StorageOp::Get, SALE_ITEM))?
        .ok_or(StoreError::NotFound {
            entity: SALE_ITEM,
            id,
        })?;

        SaleItem::from_row(&row).map_err(|e| StoreError::storage(StorageOp::Scan, SALE_ITEM, e))
    }

    async fn get_by_sale(&self, sale_id: i64) -> StoreResult<Vec<SaleItem>> {
        let mut builder = SelectBuilder::new("sale_items", SALE_ITEM_COLUMNS);
        builder
            .and("sale_id", Cmp::Eq, sale_id)
            .order_by("id", SortDirection::Asc);

        self.list(builder.build()).await
    }

    async fn filter(&self, filter: &SaleItemFilter) -> StoreResult<Vec<SaleItem>> {
        let query = sale_item_query(filter, self.sort_policy)?;
        debug!(sql = %query.sql, args = query.args.len(), "Filtering sale items");
        self.list(query).await
    }

    async fn update(&self, item: &mut SaleItem) -> StoreResult<()> {
        let now = Utc::now();

        debug!(id = item.id, sale_id = item.sale_id, "Updating sale item");

        let result = sqlx::query(
            r#"
            UPDATE sale_items SET
                product_id = ?1,
                quantity = ?2,
                unit_price = ?3,
                discount = ?4,
                tax = ?5,
                subtotal = ?6,
                updated_at = ?7
            WHERE id = ?8
            "#,
        )
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.discount)
        .bind(item.tax)
        .bind(item.subtotal)
        .bind(now)
        .bind(item.id)
        .execute(&self.pool)
        .await
        .map_err(classify(StorageOp::Update, SALE_ITEM))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: SALE_ITEM,
                id: item.id,
            });
        }

        item.updated_at = now;
        Ok(())
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM sale_items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(classify(StorageOp::Delete, SALE_ITEM))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: SALE_ITEM,
                id,
            });
        }

        Ok(())
    }

    async fn delete_by_sale(&self, sale_id: i64) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM sale_items WHERE sale_id = ?1")
            .bind(sale_id)
            .execute(&self.pool)
            .await
            .map_err(classify(StorageOp::Delete, SALE_ITEM))?;

        debug!(sale_id, removed = result.rows_affected(), "Deleted sale items");
        Ok(result.rows_affected())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
