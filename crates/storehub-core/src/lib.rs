//! # storehub-core: Pure Sale Lifecycle Logic for StoreHub
//!
//! This crate is the **heart** of StoreHub. It contains the sale aggregate,
//! its state machine, validation and the filter model, with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        StoreHub Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                HTTP handlers (not in this workspace)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    storehub-service                             │   │
//! │  │        validate ──► state machine ──► repository call           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ storehub-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌──────────┐ ┌─────────┐ ┌────────┐ ┌──────────┐ │   │
//! │  │   │  types  │ │validation│ │ status  │ │ filter │ │repository│ │   │
//! │  │   │  Sale   │ │ two-pass │ │ machine │ │ shapes │ │  traits  │ │   │
//! │  │   └─────────┘ └──────────┘ └─────────┘ └────────┘ └──────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    storehub-db (Database Layer)                 │   │
//! │  │         SQLite queries, migrations, repository impls            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Sale, SaleItem, SaleStatus and their write-side inputs
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - StoreError, ErrorKind and validation errors
//! - [`validation`] - Structural and business-rule validation
//! - [`status`] - The sale status state machine
//! - [`filter`] - Filter shapes and their validation
//! - [`repository`] - Storage capability traits

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod filter;
pub mod money;
pub mod repository;
pub mod status;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{
    BoxError, ErrorKind, StorageOp, StoreError, StoreResult, ValidationError, ValidationErrors,
};
pub use filter::{BaseFilter, SaleFilter, SaleItemFilter, SortDirection};
pub use money::Money;
pub use repository::{SaleItemRepository, SaleRepository};
pub use status::SaleTransition;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Page size used when a filter does not set one.
pub const DEFAULT_LIMIT: i64 = 20;

/// Largest page a filter may request; larger values are clamped.
pub const MAX_LIMIT: i64 = 100;

/// Deepest offset a filter may request.
pub const MAX_OFFSET: i64 = 1_000_000;

pub const MAX_PAYMENT_TYPE_LEN: usize = 50;

pub const MAX_NOTES_LEN: usize = 500;

/// Payment types accepted by sale filters.
pub const PAYMENT_TYPES: &[&str] = &[
    "cash",
    "card",
    "credit_card",
    "debit_card",
    "transfer",
    "check",
    "voucher",
    "mixed",
];
