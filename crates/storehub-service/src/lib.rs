//! # storehub-service: Sale Lifecycle Orchestration
//!
//! The boundary every caller goes through. Each operation runs the same
//! pipeline and returns a [`StoreError`](storehub_core::StoreError) whose
//! [`kind`](storehub_core::StoreError::kind) is stable.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  caller                                                                 │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  id > 0 ? ───────────────── no ──► ZeroId                              │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  structural pass ────────── fail ─► InvalidData { every field }         │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  business rules ─────────── fail ─► InvalidData { every field }         │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  state machine (transitions) ─ illegal ─► InvalidData (nothing written) │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  repository ─► NotFound / VersionConflict / InvalidForeignKey /         │
//! │                Get / Create / Update / Delete / Scan / Iterate          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here retries. On `VersionConflict` re-read the sale (or ask for
//! [`SaleService::get_version_by_id`]), reapply the change and submit again.

pub mod sale;
pub mod sale_item;

pub use sale::SaleService;
pub use sale_item::SaleItemService;

use storehub_core::{StoreError, StoreResult};

/// Rejects non-positive identifiers before they reach storage.
pub(crate) fn require_id(entity: &'static str, id: i64) -> StoreResult<()> {
    if id <= 0 {
        return Err(StoreError::ZeroId { entity, id });
    }
    Ok(())
}

// =============================================================================
// End-to-End Tests (in-memory SQLite)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use storehub_core::{ErrorKind, Money, NewSale, NewSaleItem, SaleFilter, SaleStatus};
    use storehub_db::{Database, DbConfig};

    async fn services() -> (SaleService, SaleItemService) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for sql in [
            "INSERT INTO users (username) VALUES ('ana')",
            "INSERT INTO products (name, price) VALUES ('Coffee', 250)",
        ] {
            sqlx::query(sql).execute(db.pool()).await.unwrap();
        }
        (
            SaleService::new(Arc::new(db.sales())),
            SaleItemService::new(Arc::new(db.sale_items())),
        )
    }

    #[tokio::test]
    async fn test_sale_lifecycle_against_sqlite() {
        let (sales, items) = services().await;

        let new = NewSale {
            user_id: 1,
            total_amount: Money::from_cents(100),
            payment_type: "cash".to_string(),
            ..Default::default()
        };
        let sale = sales.create(&new).await.unwrap();
        assert!(sale.id > 0);
        assert_eq!(sale.version, 1);
        assert_eq!(sale.status, SaleStatus::Active);

        let line = NewSaleItem::priced(
            sale.id,
            1,
            1,
            Money::from_cents(100),
            Money::zero(),
            Money::zero(),
        );
        items.create(&line).await.unwrap();

        let mut stale = sale.clone();
        sales.complete(sale.id).await.unwrap();
        stale.notes = "late edit".to_string();
        let err = sales.update(&mut stale).await.unwrap_err();
        assert!(err.is(ErrorKind::VersionConflict), "{err}");

        let err = sales.cancel(sale.id).await.unwrap_err();
        assert!(err.is(ErrorKind::InvalidData));

        let returned = sales.mark_returned(sale.id).await.unwrap();
        assert_eq!(returned.status, SaleStatus::Returned);
        assert_eq!(returned.version, 3);

        let filter = SaleFilter {
            status: Some("COMPLETED".to_string()),
            ..Default::default()
        };
        assert!(sales.filter(&filter).await.unwrap_err().is(ErrorKind::InvalidFilter));

        let filter = SaleFilter {
            status: Some("returned".to_string()),
            ..Default::default()
        };
        assert_eq!(sales.filter(&filter).await.unwrap().len(), 1);

        sales.delete(sale.id).await.unwrap();
        assert!(items.get_by_sale(sale.id).await.unwrap().is_empty());
    }
}
