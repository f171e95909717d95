//! # Filter Model
//!
//! Query-shape descriptors for listing sales and sale items.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Request ──► SaleFilter { .. } ──► validate() ──► normalized() ──►     │
//! │                                        │              repository.filter │
//! │                                        ▼                                │
//! │                            InvalidFilter / InvalidLimit / InvalidOffset │
//! │                            (no query is ever built)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Filters are never persisted. Every `min_*`/`max_*` and date pair is
//! independent and optional; only present fields become SQL predicates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult, ValidationError, ValidationErrors};
use crate::money::Money;
use crate::types::{parse_status, SaleStatus};
use crate::validation::{check_non_negative, check_positive_id};
use crate::{DEFAULT_LIMIT, MAX_LIMIT, MAX_OFFSET, PAYMENT_TYPES};

// =============================================================================
// Sort Direction
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Case-insensitive parse of `asc`/`desc`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub const fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

// =============================================================================
// Base Filter
// =============================================================================

/// Pagination and sort shared by every filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseFilter {
    /// Page size. Unset or zero means [`DEFAULT_LIMIT`]; capped at [`MAX_LIMIT`].
    pub limit: Option<i64>,
    /// Rows to skip. Negative values clamp to zero.
    pub offset: Option<i64>,
    /// Public sort key; resolved against the repository's allow-map.
    pub sort_by: Option<String>,
    /// `asc` or `desc`, any case. Defaults to ascending.
    pub sort_order: Option<String>,
}

impl BaseFilter {
    /// Rejects pagination values that cannot be clamped into shape.
    pub fn validate(&self) -> StoreResult<()> {
        if let Some(limit) = self.limit {
            if limit < 0 {
                return Err(StoreError::InvalidLimit(limit));
            }
        }
        if let Some(offset) = self.offset {
            if offset > MAX_OFFSET {
                return Err(StoreError::InvalidOffset {
                    offset,
                    max: MAX_OFFSET,
                });
            }
        }
        Ok(())
    }

    pub fn effective_limit(&self) -> i64 {
        match self.limit {
            None => DEFAULT_LIMIT,
            Some(limit) if limit <= 0 => DEFAULT_LIMIT,
            Some(limit) => limit.min(MAX_LIMIT),
        }
    }

    pub fn effective_offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    /// Applies defaults and clamps in place. Sort values are only trimmed
    /// and lowercased here; whether they are allowed is the builder's call.
    pub fn normalize(&mut self) {
        self.limit = Some(self.effective_limit());
        self.offset = Some(self.effective_offset());
        self.sort_by = self
            .sort_by
            .take()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self.sort_order = Some(
            self.sort_order
                .take()
                .map(|s| s.trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "asc".to_string()),
        );
    }
}

// =============================================================================
// Range Checks
// =============================================================================

fn check_money_range(
    errors: &mut ValidationErrors,
    (min_field, min): (&str, Option<Money>),
    (max_field, max): (&str, Option<Money>),
) {
    if let Some(min) = min {
        check_non_negative(errors, min_field, min);
    }
    if let Some(max) = max {
        check_non_negative(errors, max_field, max);
    }
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            errors.push(ValidationError::RangeInverted {
                field: min_field.to_string(),
                max_field: max_field.to_string(),
            });
        }
    }
}

fn check_count_range(
    errors: &mut ValidationErrors,
    (min_field, min): (&str, Option<i64>),
    (max_field, max): (&str, Option<i64>),
) {
    for (field, value) in [(min_field, min), (max_field, max)] {
        if matches!(value, Some(v) if v < 0) {
            errors.push(ValidationError::MustNotBeNegative {
                field: field.to_string(),
            });
        }
    }
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            errors.push(ValidationError::RangeInverted {
                field: min_field.to_string(),
                max_field: max_field.to_string(),
            });
        }
    }
}

fn check_date_range(
    errors: &mut ValidationErrors,
    now: DateTime<Utc>,
    (from_field, from): (&str, Option<DateTime<Utc>>),
    (to_field, to): (&str, Option<DateTime<Utc>>),
) {
    for (field, value) in [(from_field, from), (to_field, to)] {
        if matches!(value, Some(v) if v > now) {
            errors.push(ValidationError::InFuture {
                field: field.to_string(),
            });
        }
    }
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            errors.push(ValidationError::RangeInverted {
                field: from_field.to_string(),
                max_field: to_field.to_string(),
            });
        }
    }
}

// =============================================================================
// Sale Filter
// =============================================================================

/// Open-ended filter for listing sales.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleFilter {
    #[serde(flatten)]
    pub base: BaseFilter,
    pub client_id: Option<i64>,
    pub user_id: Option<i64>,
    pub min_total_amount: Option<Money>,
    pub max_total_amount: Option<Money>,
    pub min_total_discount: Option<Money>,
    pub max_total_discount: Option<Money>,
    /// One of [`PAYMENT_TYPES`].
    pub payment_type: Option<String>,
    /// Exact lowercase status name.
    pub status: Option<String>,
    /// Inclusive lower bound on `sale_date`.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `sale_date`.
    pub end_date: Option<DateTime<Utc>>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub updated_from: Option<DateTime<Utc>>,
    pub updated_to: Option<DateTime<Utc>>,
}

impl SaleFilter {
    /// Validates against the current clock.
    pub fn validate(&self) -> StoreResult<()> {
        self.validate_at(Utc::now())
    }

    /// Validates with an explicit clock for the "not in the future" checks.
    pub fn validate_at(&self, now: DateTime<Utc>) -> StoreResult<()> {
        self.base.validate()?;

        let mut errors = ValidationErrors::new();

        if let Some(client_id) = self.client_id {
            check_positive_id(&mut errors, "client_id", client_id);
        }
        if let Some(user_id) = self.user_id {
            check_positive_id(&mut errors, "user_id", user_id);
        }
        if let Some(payment_type) = &self.payment_type {
            if !PAYMENT_TYPES.contains(&payment_type.as_str()) {
                errors.push(ValidationError::NotAllowed {
                    field: "payment_type".to_string(),
                    allowed: PAYMENT_TYPES.iter().map(|p| p.to_string()).collect(),
                });
            }
        }
        if let Some(status) = &self.status {
            parse_status(status, &mut errors);
        }

        check_money_range(
            &mut errors,
            ("min_total_amount", self.min_total_amount),
            ("max_total_amount", self.max_total_amount),
        );
        check_money_range(
            &mut errors,
            ("min_total_discount", self.min_total_discount),
            ("max_total_discount", self.max_total_discount),
        );
        check_date_range(
            &mut errors,
            now,
            ("start_date", self.start_date),
            ("end_date", self.end_date),
        );
        check_date_range(
            &mut errors,
            now,
            ("created_from", self.created_from),
            ("created_to", self.created_to),
        );
        check_date_range(
            &mut errors,
            now,
            ("updated_from", self.updated_from),
            ("updated_to", self.updated_to),
        );

        // No sale can carry more discount than its total, so this filter
        // could never match anything.
        if let (Some(min_discount), Some(max_total)) =
            (self.min_total_discount, self.max_total_amount)
        {
            if min_discount > max_total {
                errors.push(ValidationError::Exceeds {
                    field: "min_total_discount".to_string(),
                    bound: "max_total_amount".to_string(),
                });
            }
        }

        errors.into_result().map_err(StoreError::InvalidFilter)
    }

    /// Parsed status predicate. `None` when absent or not a known status.
    pub fn status(&self) -> Option<SaleStatus> {
        self.status.as_deref().and_then(|s| s.parse().ok())
    }

    /// Returns a copy with pagination defaults applied.
    pub fn normalized(&self) -> Self {
        let mut filter = self.clone();
        filter.base.normalize();
        filter
    }
}

// =============================================================================
// Sale Item Filter
// =============================================================================

/// Filter for listing sale items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItemFilter {
    #[serde(flatten)]
    pub base: BaseFilter,
    pub sale_id: Option<i64>,
    pub product_id: Option<i64>,
    pub min_quantity: Option<i64>,
    pub max_quantity: Option<i64>,
    pub min_subtotal: Option<Money>,
    pub max_subtotal: Option<Money>,
}

impl SaleItemFilter {
    pub fn validate(&self) -> StoreResult<()> {
        self.base.validate()?;

        let mut errors = ValidationErrors::new();
        if let Some(sale_id) = self.sale_id {
            check_positive_id(&mut errors, "sale_id", sale_id);
        }
        if let Some(product_id) = self.product_id {
            check_positive_id(&mut errors, "product_id", product_id);
        }
        check_count_range(
            &mut errors,
            ("min_quantity", self.min_quantity),
            ("max_quantity", self.max_quantity),
        );
        check_money_range(
            &mut errors,
            ("min_subtotal", self.min_subtotal),
            ("max_subtotal", self.max_subtotal),
        );

        errors.into_result().map_err(StoreError::InvalidFilter)
    }

    pub fn normalized(&self) -> Self {
        let mut filter = self.clone();
        filter.base.normalize();
        filter
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
