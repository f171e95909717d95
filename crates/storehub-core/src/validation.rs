//! # Validation Module
//!
//! Structural and business-rule validation for sales and sale items.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Passes                                  │
//! │                                                                         │
//! │  Pass 1: Structural                                                    │
//! │  ├── Required fields, positive ids                                     │
//! │  ├── Non-negative amounts                                              │
//! │  └── Length caps                                                       │
//! │           │ (stops here if anything failed)                            │
//! │           ▼                                                             │
//! │  Pass 2: Business rules                                                │
//! │  ├── total_discount ≤ total_amount                                     │
//! │  └── subtotal == quantity × unit_price − discount + tax                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Write reaches the repository                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every pass collects all violations instead of stopping at the first one.
//!
//! ## Usage
//! ```rust
//! use storehub_core::validation::validate_new_sale;
//! use storehub_core::{Money, NewSale};
//!
//! let sale = NewSale {
//!     user_id: 1,
//!     total_amount: Money::from_cents(10_000),
//!     payment_type: "cash".to_string(),
//!     ..Default::default()
//! };
//! assert!(validate_new_sale(&sale).is_ok());
//! ```

use crate::error::{ValidationError, ValidationErrors};
use crate::money::Money;
use crate::types::{NewSale, NewSaleItem, Sale, SaleItem};
use crate::{MAX_NOTES_LEN, MAX_PAYMENT_TYPE_LEN};

/// Result type for validation operations.
pub type ValidationResult = Result<(), ValidationErrors>;

// =============================================================================
// Field Checks
// =============================================================================

pub(crate) fn check_positive_id(errors: &mut ValidationErrors, field: &str, id: i64) {
    if id <= 0 {
        errors.push(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
}

pub(crate) fn check_non_negative(errors: &mut ValidationErrors, field: &str, amount: Money) {
    if amount.is_negative() {
        errors.push(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
}

fn check_max_len(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.push(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
}

fn check_payment_type(errors: &mut ValidationErrors, payment_type: &str) {
    if payment_type.trim().is_empty() {
        errors.push(ValidationError::Required {
            field: "payment_type".to_string(),
        });
    } else {
        check_max_len(errors, "payment_type", payment_type, MAX_PAYMENT_TYPE_LEN);
    }
}

/// Checks shared by [`NewSale`] and [`Sale`].
fn check_sale_fields(
    errors: &mut ValidationErrors,
    client_id: Option<i64>,
    user_id: i64,
    total_amount: Money,
    total_discount: Money,
    payment_type: &str,
    notes: &str,
) {
    check_positive_id(errors, "user_id", user_id);
    if let Some(client_id) = client_id {
        check_positive_id(errors, "client_id", client_id);
    }
    check_non_negative(errors, "total_amount", total_amount);
    check_non_negative(errors, "total_discount", total_discount);
    check_payment_type(errors, payment_type);
    check_max_len(errors, "notes", notes, MAX_NOTES_LEN);
}

fn check_discount(errors: &mut ValidationErrors, total_amount: Money, total_discount: Money) {
    if total_discount > total_amount {
        errors.push(ValidationError::Exceeds {
            field: "total_discount".to_string(),
            bound: "total_amount".to_string(),
        });
    }
}

// =============================================================================
// Sale Validators
// =============================================================================

/// Structural checks for a sale about to be created.
pub fn validate_new_sale_structure(sale: &NewSale) -> ValidationResult {
    let mut errors = ValidationErrors::new();
    check_sale_fields(
        &mut errors,
        sale.client_id,
        sale.user_id,
        sale.total_amount,
        sale.total_discount,
        &sale.payment_type,
        &sale.notes,
    );
    errors.into_result()
}

/// Business rules for a sale about to be created.
pub fn validate_new_sale_rules(sale: &NewSale) -> ValidationResult {
    let mut errors = ValidationErrors::new();
    check_discount(&mut errors, sale.total_amount, sale.total_discount);
    errors.into_result()
}

/// Both passes, in order.
pub fn validate_new_sale(sale: &NewSale) -> ValidationResult {
    validate_new_sale_structure(sale)?;
    validate_new_sale_rules(sale)
}

/// Structural checks for a stored sale about to be updated.
pub fn validate_sale_structure(sale: &Sale) -> ValidationResult {
    let mut errors = ValidationErrors::new();
    check_sale_fields(
        &mut errors,
        sale.client_id,
        sale.user_id,
        sale.total_amount,
        sale.total_discount,
        &sale.payment_type,
        &sale.notes,
    );
    if sale.version < 1 {
        errors.push(ValidationError::MustBePositive {
            field: "version".to_string(),
        });
    }
    errors.into_result()
}

/// Business rules for a stored sale about to be updated.
pub fn validate_sale_rules(sale: &Sale) -> ValidationResult {
    let mut errors = ValidationErrors::new();
    check_discount(&mut errors, sale.total_amount, sale.total_discount);
    errors.into_result()
}

/// Both passes, in order.
pub fn validate_sale(sale: &Sale) -> ValidationResult {
    validate_sale_structure(sale)?;
    validate_sale_rules(sale)
}

// =============================================================================
// Sale Item Validators
// =============================================================================

fn check_item_fields(
    errors: &mut ValidationErrors,
    sale_id: i64,
    product_id: i64,
    quantity: i64,
    amounts: [(&str, Money); 4],
) {
    check_positive_id(errors, "sale_id", sale_id);
    check_positive_id(errors, "product_id", product_id);
    if quantity <= 0 {
        errors.push(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    for (field, amount) in amounts {
        check_non_negative(errors, field, amount);
    }
}

fn check_subtotal(errors: &mut ValidationErrors, expected: Option<Money>, actual: Money) {
    let Some(expected) = expected else {
        errors.push(ValidationError::Overflow {
            field: "subtotal".to_string(),
        });
        return;
    };
    if expected != actual {
        errors.push(ValidationError::Mismatch {
            field: "subtotal".to_string(),
            expected: expected.cents(),
            actual: actual.cents(),
        });
    }
}

/// Structural checks for a new sale item.
pub fn validate_new_item_structure(item: &NewSaleItem) -> ValidationResult {
    let mut errors = ValidationErrors::new();
    check_item_fields(
        &mut errors,
        item.sale_id,
        item.product_id,
        item.quantity,
        [
            ("unit_price", item.unit_price),
            ("discount", item.discount),
            ("tax", item.tax),
            ("subtotal", item.subtotal),
        ],
    );
    errors.into_result()
}

/// Business rules for a new sale item.
pub fn validate_new_item_rules(item: &NewSaleItem) -> ValidationResult {
    let mut errors = ValidationErrors::new();
    check_subtotal(&mut errors, item.expected_subtotal(), item.subtotal);
    errors.into_result()
}

/// Both passes, in order.
pub fn validate_new_item(item: &NewSaleItem) -> ValidationResult {
    validate_new_item_structure(item)?;
    validate_new_item_rules(item)
}

/// Both passes for a stored item about to be updated.
pub fn validate_item(item: &SaleItem) -> ValidationResult {
    let mut errors = ValidationErrors::new();
    check_item_fields(
        &mut errors,
        item.sale_id,
        item.product_id,
        item.quantity,
        [
            ("unit_price", item.unit_price),
            ("discount", item.discount),
            ("tax", item.tax),
            ("subtotal", item.subtotal),
        ],
    );
    errors.into_result()?;

    let mut errors = ValidationErrors::new();
    check_subtotal(&mut errors, item.expected_subtotal(), item.subtotal);
    errors.into_result()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn cash_sale(total: i64, discount: i64) -> NewSale {
        NewSale {
            user_id: 1,
            total_amount: Money::from_cents(total),
            total_discount: Money::from_cents(discount),
            payment_type: "cash".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_new_sale() {
        assert!(validate_new_sale(&cash_sale(10_000, 500)).is_ok());
        assert!(validate_new_sale(&cash_sale(0, 0)).is_ok());
    }

    #[test]
    fn test_structure_reports_every_field() {
        let sale = NewSale {
            client_id: Some(0),
            user_id: 0,
            total_amount: Money::from_cents(-1),
            total_discount: Money::from_cents(-1),
            payment_type: "   ".to_string(),
            notes: "n".repeat(501),
            ..Default::default()
        };

        let errors = validate_new_sale(&sale).unwrap_err();
        for field in [
            "user_id",
            "client_id",
            "total_amount",
            "total_discount",
            "payment_type",
            "notes",
        ] {
            assert!(errors.has_field(field), "missing error for {field}");
        }
        assert_eq!(errors.len(), 6);
    }

    #[test]
    fn test_payment_type_length_cap() {
        let mut sale = cash_sale(100, 0);
        sale.payment_type = "x".repeat(50);
        assert!(validate_new_sale(&sale).is_ok());

        sale.payment_type = "x".repeat(51);
        let errors = validate_new_sale(&sale).unwrap_err();
        assert!(errors.has_field("payment_type"));
    }

    #[test]
    fn test_discount_exceeding_total_rejected() {
        let errors = validate_new_sale(&cash_sale(100, 101)).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.has_field("total_discount"));
    }

    #[test]
    fn test_structure_runs_before_rules() {
        // Discount > total would fail the rules pass, but the structural
        // failure is reported alone.
        let mut sale = cash_sale(100, 200);
        sale.user_id = 0;
        let errors = validate_new_sale(&sale).unwrap_err();
        assert!(errors.has_field("user_id"));
        assert!(!errors.has_field("total_discount"));
    }

    #[test]
    fn test_stored_sale_requires_version() {
        let mut sale = Sale::from_new(1, &cash_sale(100, 0), Utc::now());
        assert!(validate_sale(&sale).is_ok());

        sale.version = 0;
        assert!(validate_sale(&sale).unwrap_err().has_field("version"));
    }

    #[test]
    fn test_item_subtotal_mismatch() {
        let mut item = NewSaleItem::priced(
            1,
            2,
            2,
            Money::from_cents(500),
            Money::zero(),
            Money::zero(),
        );
        assert!(validate_new_item(&item).is_ok());

        item.subtotal = Money::from_cents(999);
        let errors = validate_new_item(&item).unwrap_err();
        assert_eq!(
            errors.iter().next(),
            Some(&ValidationError::Mismatch {
                field: "subtotal".to_string(),
                expected: 1000,
                actual: 999,
            })
        );
    }

    #[test]
    fn test_item_structure() {
        let item = NewSaleItem {
            sale_id: 0,
            product_id: -1,
            quantity: 0,
            unit_price: Money::from_cents(-5),
            ..Default::default()
        };
        let errors = validate_new_item(&item).unwrap_err();
        for field in ["sale_id", "product_id", "quantity", "unit_price"] {
            assert!(errors.has_field(field), "missing error for {field}");
        }
    }

    #[test]
    fn test_item_subtotal_overflow_is_rejected() {
        let item = NewSaleItem {
            sale_id: 1,
            product_id: 1,
            quantity: i64::MAX / 2,
            unit_price: Money::from_cents(3),
            ..Default::default()
        };
        assert!(validate_new_item_structure(&item).is_ok());

        let errors = validate_new_item(&item).unwrap_err();
        assert_eq!(
            errors.iter().next(),
            Some(&ValidationError::Overflow {
                field: "subtotal".to_string(),
            })
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 500,
            ..ProptestConfig::default()
        })]

        /// Property: a sale validates iff its discount does not exceed its total.
        #[test]
        fn discount_never_exceeds_total(total in 0i64..10_000_000, discount in 0i64..10_000_000) {
            let result = validate_new_sale(&cash_sale(total, discount));
            prop_assert_eq!(result.is_ok(), discount <= total);
        }

        /// Property: priced items always satisfy the subtotal invariant.
        #[test]
        fn priced_items_hold_subtotal_invariant(
            quantity in 1i64..1_000,
            unit_price in 0i64..1_000_000,
            discount in 0i64..100_000,
            tax in 0i64..100_000,
        ) {
            let item = NewSaleItem::priced(
                1,
                1,
                quantity,
                Money::from_cents(unit_price),
                Money::from_cents(discount),
                Money::from_cents(tax),
            );
            prop_assert_eq!(
                item.subtotal.cents(),
                quantity * unit_price - discount + tax
            );
            prop_assert!(validate_new_item_rules(&item).is_ok());
        }
    }
}
