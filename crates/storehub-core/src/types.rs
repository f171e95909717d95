//! # Domain Types
//!
//! The Sale aggregate and its line items.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐        ┌─────────────────────┐                │
//! │  │   Sale (root)       │ 1    * │     SaleItem        │                │
//! │  │  ─────────────────  │───────►│  ─────────────────  │                │
//! │  │  id (i64)           │        │  sale_id (FK)       │                │
//! │  │  user_id / client_id│        │  product_id (FK)    │                │
//! │  │  total_amount       │        │  quantity           │                │
//! │  │  total_discount     │        │  unit_price         │                │
//! │  │  status             │        │  discount / tax     │                │
//! │  │  version            │        │  subtotal (derived) │                │
//! │  └─────────────────────┘        └─────────────────────┘                │
//! │                                                                         │
//! │  NewSale / NewSaleItem: write-side input before storage assigns ids    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{ValidationError, ValidationErrors};
use crate::money::Money;

// =============================================================================
// Sale Status
// =============================================================================

/// The lifecycle status of a sale. See [`crate::status`] for the transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    /// Freshly recorded sale. Initial state.
    Active,
    /// Sale was settled.
    Completed,
    /// Sale was called off before completion.
    Canceled,
    /// Goods from a completed sale came back.
    Returned,
}

impl SaleStatus {
    pub const ALL: [SaleStatus; 4] = [
        SaleStatus::Active,
        SaleStatus::Completed,
        SaleStatus::Canceled,
        SaleStatus::Returned,
    ];

    /// Stored/wire representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Active => "active",
            SaleStatus::Completed => "completed",
            SaleStatus::Canceled => "canceled",
            SaleStatus::Returned => "returned",
        }
    }

    /// The allowed wire values, for error messages.
    pub fn allowed() -> Vec<String> {
        SaleStatus::ALL.iter().map(|s| s.as_str().to_string()).collect()
    }
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Active
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the exact lowercase form. `"COMPLETED"` is rejected rather than
/// normalized so that a mistyped filter fails loudly.
impl FromStr for SaleStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SaleStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: SaleStatus::allowed(),
            })
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale (aggregate root).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    /// Surrogate key, assigned by storage.
    pub id: i64,
    pub client_id: Option<i64>,
    /// Operator who recorded the sale.
    pub user_id: i64,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
    pub total_amount: Money,
    pub total_discount: Money,
    pub payment_type: String,
    pub status: SaleStatus,
    pub notes: String,
    /// Optimistic concurrency token. 1 on creation, +1 per update.
    pub version: i32,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Builds the stored form of `new` once storage has assigned an id.
    ///
    /// An unset sale date becomes `now`; the status is always
    /// [`SaleStatus::Active`] and the version starts at 1.
    pub fn from_new(id: i64, new: &NewSale, now: DateTime<Utc>) -> Self {
        Sale {
            id,
            client_id: new.client_id,
            user_id: new.user_id,
            sale_date: new.sale_date.unwrap_or(now),
            total_amount: new.total_amount,
            total_discount: new.total_discount,
            payment_type: new.payment_type.clone(),
            status: SaleStatus::Active,
            notes: new.notes.clone(),
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Amount actually charged.
    #[inline]
    pub fn net_amount(&self) -> Money {
        self.total_amount - self.total_discount
    }
}

/// Input for recording a sale.
///
/// There is no status field: every sale starts `active` and only moves
/// through the lifecycle operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSale {
    pub client_id: Option<i64>,
    pub user_id: i64,
    /// Defaults to the creation time when unset.
    pub sale_date: Option<DateTime<Utc>>,
    pub total_amount: Money,
    pub total_discount: Money,
    pub payment_type: String,
    pub notes: String,
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line of a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
    pub discount: Money,
    pub tax: Money,
    /// Always `quantity × unit_price − discount + tax`.
    pub subtotal: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl SaleItem {
    /// Builds the stored form of `new` once storage has assigned an id.
    pub fn from_new(id: i64, new: &NewSaleItem, now: DateTime<Utc>) -> Self {
        SaleItem {
            id,
            sale_id: new.sale_id,
            product_id: new.product_id,
            quantity: new.quantity,
            unit_price: new.unit_price,
            discount: new.discount,
            tax: new.tax,
            subtotal: new.subtotal,
            created_at: now,
            updated_at: now,
        }
    }

    /// The subtotal implied by the other amounts, `None` if it overflows.
    #[inline]
    pub fn expected_subtotal(&self) -> Option<Money> {
        line_subtotal(self.quantity, self.unit_price, self.discount, self.tax)
    }
}

/// Input for adding a line to a sale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSaleItem {
    pub sale_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
    pub discount: Money,
    pub tax: Money,
    pub subtotal: Money,
}

impl NewSaleItem {
    /// Builds an item whose subtotal is computed from the other amounts.
    ///
    /// Amounts too large for the subtotal leave it at zero; validation then
    /// rejects the item.
    pub fn priced(
        sale_id: i64,
        product_id: i64,
        quantity: i64,
        unit_price: Money,
        discount: Money,
        tax: Money,
    ) -> Self {
        NewSaleItem {
            sale_id,
            product_id,
            quantity,
            unit_price,
            discount,
            tax,
            subtotal: line_subtotal(quantity, unit_price, discount, tax).unwrap_or_default(),
        }
    }

    /// The subtotal implied by the other amounts, `None` if it overflows.
    #[inline]
    pub fn expected_subtotal(&self) -> Option<Money> {
        line_subtotal(self.quantity, self.unit_price, self.discount, self.tax)
    }
}

/// `quantity × unit_price − discount + tax`, exact in cents.
///
/// `None` when any step overflows.
#[inline]
pub fn line_subtotal(
    quantity: i64,
    unit_price: Money,
    discount: Money,
    tax: Money,
) -> Option<Money> {
    unit_price
        .checked_multiply_quantity(quantity)?
        .checked_sub(discount)?
        .checked_add(tax)
}

/// Parses an optional raw status, reporting the allowed values on failure.
pub(crate) fn parse_status(raw: &str, errors: &mut ValidationErrors) -> Option<SaleStatus> {
    match raw.parse::<SaleStatus>() {
        Ok(status) => Some(status),
        Err(err) => {
            errors.push(err);
            None
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sale_status_default() {
        assert_eq!(SaleStatus::default(), SaleStatus::Active);
    }

    #[test]
    fn test_sale_status_parse_is_exact() {
        assert_eq!("completed".parse::<SaleStatus>(), Ok(SaleStatus::Completed));
        assert!("COMPLETED".parse::<SaleStatus>().is_err());
        assert!(" active".parse::<SaleStatus>().is_err());
        assert!("voided".parse::<SaleStatus>().is_err());
    }

    #[test]
    fn test_from_new_defaults() {
        let now = Utc::now();
        let new = NewSale {
            user_id: 1,
            total_amount: Money::from_major_minor(100, 0),
            payment_type: "cash".to_string(),
            ..Default::default()
        };

        let sale = Sale::from_new(42, &new, now);
        assert_eq!(sale.id, 42);
        assert_eq!(sale.version, 1);
        assert_eq!(sale.status, SaleStatus::Active);
        assert_eq!(sale.sale_date, now);
        assert_eq!(sale.created_at, sale.updated_at);
    }

    #[test]
    fn test_priced_item_subtotal() {
        // 3 × $2.50 − $1.00 + $0.60 = $7.10
        let item = NewSaleItem::priced(
            1,
            7,
            3,
            Money::from_cents(250),
            Money::from_cents(100),
            Money::from_cents(60),
        );
        assert_eq!(item.subtotal.cents(), 710);
        assert_eq!(Some(item.subtotal), item.expected_subtotal());
    }

    #[test]
    fn test_line_subtotal_overflow() {
        assert_eq!(
            line_subtotal(i64::MAX / 2, Money::from_cents(3), Money::zero(), Money::zero()),
            None
        );
        assert_eq!(
            line_subtotal(1, Money::from_cents(i64::MAX), Money::zero(), Money::from_cents(1)),
            None
        );
    }
}
