//! # Sale Repository
//!
//! Database operations for sales.
//!
//! ## Optimistic Update
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE sales SET …, version = version + 1, updated_at = ?now          │
//! │  WHERE id = ?id AND version = ?read_version                            │
//! │       │                                                                 │
//! │       ├── 1 row  ──► sale.version += 1, sale.updated_at = now          │
//! │       │                                                                 │
//! │       └── 0 rows ──► SELECT 1 FROM sales WHERE id = ?id                │
//! │                        ├── none ──► NotFound                            │
//! │                        └── some ──► VersionConflict                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The compare-and-set is one statement, so two writers holding the same
//! version can never both succeed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, warn};

use storehub_core::{
    NewSale, Sale, SaleFilter, SaleRepository, SaleStatus, SortDirection, StorageOp, StoreError,
    StoreResult,
};

use super::decode_rows;
use crate::error::classify;
use crate::query::{sale_query, BuiltQuery, Cmp, SelectBuilder, SortPolicy, SALE_COLUMNS};

const SALE: &str = "sale";

/// SQLite-backed [`SaleRepository`].
#[derive(Debug, Clone)]
pub struct SqliteSaleRepository {
    pool: SqlitePool,
    sort_policy: SortPolicy,
}

impl SqliteSaleRepository {
    /// Creates a new SqliteSaleRepository.
    pub fn new(pool: SqlitePool, sort_policy: SortPolicy) -> Self {
        SqliteSaleRepository { pool, sort_policy }
    }

    async fn list(&self, query: BuiltQuery) -> StoreResult<Vec<Sale>> {
        let rows = query
            .query()
            .fetch_all(&self.pool)
            .await
            .map_err(classify(StorageOp::Iterate, SALE))?;

        decode_rows(&rows, SALE)
    }

    /// Lookup ordered by sale date, for the single-column reads.
    fn by_column(column: &'static str, value: impl Into<crate::query::SqlArg>) -> BuiltQuery {
        let mut builder = SelectBuilder::new("sales", SALE_COLUMNS);
        builder
            .and(column, Cmp::Eq, value)
            .order_by("sale_date", SortDirection::Asc);
        builder.build()
    }

    /// Tells a vanished row apart from a stale version after an update
    /// matched nothing.
    async fn missing_or_conflict(&self, id: i64, expected: i32) -> StoreError {
        let exists = sqlx::query("SELECT 1 FROM sales WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await;

        match exists {
            Err(e) => classify(StorageOp::Get, SALE)(e),
            Ok(None) => StoreError::NotFound { entity: SALE, id },
            Ok(Some(_)) => {
                warn!(id, expected, "Sale version conflict");
                StoreError::VersionConflict {
                    entity: SALE,
                    id,
                    expected,
                }
            }
        }
    }
}

#[async_trait]
impl SaleRepository for SqliteSaleRepository {
    async fn create(&self, new: &NewSale) -> StoreResult<Sale> {
        let now = Utc::now();
        let sale_date = new.sale_date.unwrap_or(now);

        debug!(user_id = new.user_id, total = %new.total_amount, "Inserting sale");

        let result = sqlx::query(
            r#"
            INSERT INTO sales (
                client_id, user_id, sale_date,
                total_amount, total_discount, payment_type,
                status, notes, version,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5, ?6,
                ?7, ?8, 1,
                ?9, ?9
            )
            "#,
        )
        .bind(new.client_id)
        .bind(new.user_id)
        .bind(sale_date)
        .bind(new.total_amount)
        .bind(new.total_discount)
        .bind(&new.payment_type)
        .bind(SaleStatus::Active)
        .bind(&new.notes)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(classify(StorageOp::Create, SALE))?;

        Ok(Sale::from_new(result.last_insert_rowid(), new, now))
    }

    async fn get_by_id(&self, id: i64) -> StoreResult<Sale> {
        let row = sqlx::query(&format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify(StorageOp::Get, SALE))?
            .ok_or(StoreError::NotFound { entity: SALE, id })?;

        Sale::from_row(&row).map_err(|e| StoreError::storage(StorageOp::Scan, SALE, e))
    }

    async fn get_version_by_id(&self, id: i64) -> StoreResult<i32> {
        sqlx::query_scalar::<_, i32>("SELECT version FROM sales WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify(StorageOp::Get, SALE))?
            .ok_or(StoreError::NotFound { entity: SALE, id })
    }

    async fn get_by_client(&self, client_id: i64) -> StoreResult<Vec<Sale>> {
        self.list(Self::by_column("client_id", client_id)).await
    }

    async fn get_by_user(&self, user_id: i64) -> StoreResult<Vec<Sale>> {
        self.list(Self::by_column("user_id", user_id)).await
    }

    async fn get_by_status(&self, status: SaleStatus) -> StoreResult<Vec<Sale>> {
        self.list(Self::by_column("status", status.as_str())).await
    }

    async fn get_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<Sale>> {
        let mut builder = SelectBuilder::new("sales", SALE_COLUMNS);
        builder
            .and("sale_date", Cmp::Gte, start)
            .and("sale_date", Cmp::Lte, end)
            .order_by("sale_date", SortDirection::Asc);

        self.list(builder.build()).await
    }

    async fn filter(&self, filter: &SaleFilter) -> StoreResult<Vec<Sale>> {
        let query = sale_query(filter, self.sort_policy)?;
        debug!(sql = %query.sql, args = query.args.len(), "Filtering sales");
        self.list(query).await
    }

    async fn update(&self, sale: &mut Sale) -> StoreResult<()> {
        let now = Utc::now();

        debug!(id = sale.id, version = sale.version, status = %sale.status, "Updating sale");

        let result = sqlx::query(
            r#"
            UPDATE sales SET
                client_id = ?1,
                user_id = ?2,
                sale_date = ?3,
                total_amount = ?4,
                total_discount = ?5,
                payment_type = ?6,
                status = ?7,
                notes = ?8,
                version = version + 1,
                updated_at = ?9
            WHERE id = ?10 AND version = ?11
            "#,
        )
        .bind(sale.client_id)
        .bind(sale.user_id)
        .bind(sale.sale_date)
        .bind(sale.total_amount)
        .bind(sale.total_discount)
        .bind(&sale.payment_type)
        .bind(sale.status)
        .bind(&sale.notes)
        .bind(now)
        .bind(sale.id)
        .bind(sale.version)
        .execute(&self.pool)
        .await
        .map_err(classify(StorageOp::Update, SALE))?;

        if result.rows_affected() == 0 {
            return Err(self.missing_or_conflict(sale.id, sale.version).await);
        }

        sale.version += 1;
        sale.updated_at = now;
        Ok(())
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        debug!(id, "Deleting sale");

        let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(classify(StorageOp::Delete, SALE))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: SALE, id });
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
