//! # storehub-db: Database Layer for StoreHub
//!
//! SQLite storage for the sale aggregate, built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        StoreHub Data Flow                               │
//! │                                                                         │
//! │  SaleService::cancel(id)                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   storehub-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  sale.rs      │    │  (embedded)  │  │   │
//! │  │   │               │◄───│  sale_item.rs │    │ 001_init.sql │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │                                │   │
//! │  │   ┌───────────────┐    ┌───────▼───────┐    ┌──────────────┐  │   │
//! │  │   │   config.rs   │    │   query.rs    │    │   error.rs   │  │   │
//! │  │   │  env → pool   │    │ safe SELECTs  │    │ sqlx → kinds │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (STOREHUB_DB_PATH, default ./storehub.db)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Environment-driven configuration
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Pool errors and sqlx error classification
//! - [`query`] - Filter-to-SQL builder with sort allow-maps
//! - [`repository`] - Repository implementations (sale, sale item)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use storehub_db::{Database, StoreConfig};
//! use storehub_core::SaleRepository;
//!
//! let db = Database::new(StoreConfig::load()?.db_config()).await?;
//! let sale = db.sales().complete(42).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod query;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, StoreConfig};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use query::SortPolicy;

// Repository re-exports for convenience
pub use repository::{SqliteSaleItemRepository, SqliteSaleRepository};
