//! # Repository Module
//!
//! SQLite implementations of the storehub-core repository traits.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SaleService                                                            │
//! │       │  Arc<dyn SaleRepository>                                        │
//! │       ▼                                                                 │
//! │  SqliteSaleRepository                                                  │
//! │  ├── create / get_by_id / get_version_by_id                            │
//! │  ├── get_by_client / get_by_user / get_by_status / get_by_date_range   │
//! │  ├── filter          (query::sale_query)                               │
//! │  ├── update          (WHERE id = ? AND version = ?)                    │
//! │  └── delete                                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`SqliteSaleRepository`] - Sale CRUD, lookups and optimistic updates
//! - [`SqliteSaleItemRepository`] - Sale line items

pub mod sale;
pub mod sale_item;

pub use sale::SqliteSaleRepository;
pub use sale_item::SqliteSaleItemRepository;

use sqlx::sqlite::SqliteRow;
use sqlx::FromRow;

use storehub_core::{StorageOp, StoreError, StoreResult};

/// Decodes fetched rows, reporting the first bad row as a `Scan` failure.
pub(crate) fn decode_rows<T>(rows: &[SqliteRow], entity: &'static str) -> StoreResult<Vec<T>>
where
    T: for<'r> FromRow<'r, SqliteRow>,
{
    rows.iter()
        .map(|row| T::from_row(row).map_err(|e| StoreError::storage(StorageOp::Scan, entity, e)))
        .collect()
}
