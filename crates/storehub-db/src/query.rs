//! # Query Builder
//!
//! Injection-safe `SELECT` construction for the filtered list reads.
//!
//! ## Shape of a Built Query
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SELECT <columns> FROM <table> WHERE 1=1                               │
//! │    AND client_id = ?1            ← one clause per present filter field │
//! │    AND total_amount >= ?2          pushed together with its argument   │
//! │    AND status = ?3                                                     │
//! │  ORDER BY created_at ASC, id ASC ← column from the allow-map only      │
//! │  LIMIT ?4 OFFSET ?5              ← bound, never formatted              │
//! │                                                                         │
//! │  args: [Int(1), Int(10000), Text("completed"), Int(20), Int(0)]        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only `&'static str` column names and operator keywords ever reach the SQL
//! text. Everything that came from a caller is a bound [`SqlArg`].

use chrono::{DateTime, Utc};
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::Sqlite;

use storehub_core::{
    BaseFilter, Money, SaleFilter, SaleItemFilter, SortDirection, StoreError, StoreResult,
};

/// Columns read into [`storehub_core::Sale`].
pub const SALE_COLUMNS: &str = "id, client_id, user_id, sale_date, total_amount, total_discount, \
     payment_type, status, notes, version, created_at, updated_at";

/// Columns read into [`storehub_core::SaleItem`].
pub const SALE_ITEM_COLUMNS: &str = "id, sale_id, product_id, quantity, unit_price, discount, \
     tax, subtotal, created_at, updated_at";

// =============================================================================
// Arguments
// =============================================================================

/// A positional argument, bound in push order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlArg {
    Int(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl From<i64> for SqlArg {
    fn from(v: i64) -> Self {
        SqlArg::Int(v)
    }
}

impl From<Money> for SqlArg {
    fn from(v: Money) -> Self {
        SqlArg::Int(v.cents())
    }
}

impl From<String> for SqlArg {
    fn from(v: String) -> Self {
        SqlArg::Text(v)
    }
}

impl From<&str> for SqlArg {
    fn from(v: &str) -> Self {
        SqlArg::Text(v.to_string())
    }
}

impl From<DateTime<Utc>> for SqlArg {
    fn from(v: DateTime<Utc>) -> Self {
        SqlArg::Timestamp(v)
    }
}

/// Comparison operators a predicate may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Eq,
    Gte,
    Lte,
}

impl Cmp {
    const fn as_sql(self) -> &'static str {
        match self {
            Cmp::Eq => "=",
            Cmp::Gte => ">=",
            Cmp::Lte => "<=",
        }
    }
}

// =============================================================================
// Sort Resolution
// =============================================================================

/// What to do with a sort field or direction that is not recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortPolicy {
    /// Silently use the default column / ascending.
    #[default]
    Fallback,
    /// Fail with `InvalidOrderField` / `InvalidOrderDirection`.
    Strict,
}

/// Allow-map from public sort keys to trusted column names.
#[derive(Debug, Clone, Copy)]
pub struct SortFields {
    entries: &'static [(&'static str, &'static str)],
    default_column: &'static str,
}

impl SortFields {
    pub const fn new(
        entries: &'static [(&'static str, &'static str)],
        default_column: &'static str,
    ) -> Self {
        SortFields {
            entries,
            default_column,
        }
    }

    pub const fn default_column(&self) -> &'static str {
        self.default_column
    }

    /// Trusted column for a public key, matched case-insensitively.
    pub fn column(&self, key: &str) -> Option<&'static str> {
        let key = key.trim();
        self.entries
            .iter()
            .find(|(public, _)| public.eq_ignore_ascii_case(key))
            .map(|(_, column)| *column)
    }

    /// Resolves the sort of `base` to a column and direction.
    pub fn resolve(
        &self,
        base: &BaseFilter,
        policy: SortPolicy,
    ) -> StoreResult<(&'static str, SortDirection)> {
        let column = match base.sort_by.as_deref().map(str::trim) {
            None | Some("") => self.default_column,
            Some(key) => match (self.column(key), policy) {
                (Some(column), _) => column,
                (None, SortPolicy::Fallback) => self.default_column,
                (None, SortPolicy::Strict) => {
                    return Err(StoreError::InvalidOrderField(key.to_string()))
                }
            },
        };

        let direction = match base.sort_order.as_deref().map(str::trim) {
            None | Some("") => SortDirection::Asc,
            Some(raw) => match (SortDirection::parse(raw), policy) {
                (Some(direction), _) => direction,
                (None, SortPolicy::Fallback) => SortDirection::Asc,
                (None, SortPolicy::Strict) => {
                    return Err(StoreError::InvalidOrderDirection(raw.to_string()))
                }
            },
        };

        Ok((column, direction))
    }
}

pub const SALE_SORT_FIELDS: SortFields = SortFields::new(
    &[
        ("id", "id"),
        ("client_id", "client_id"),
        ("user_id", "user_id"),
        ("sale_date", "sale_date"),
        ("date", "sale_date"),
        ("total_amount", "total_amount"),
        ("total", "total_amount"),
        ("total_discount", "total_discount"),
        ("discount", "total_discount"),
        ("payment_type", "payment_type"),
        ("status", "status"),
        ("created_at", "created_at"),
        ("updated_at", "updated_at"),
    ],
    "created_at",
);

pub const SALE_ITEM_SORT_FIELDS: SortFields = SortFields::new(
    &[
        ("id", "id"),
        ("sale_id", "sale_id"),
        ("product_id", "product_id"),
        ("quantity", "quantity"),
        ("unit_price", "unit_price"),
        ("subtotal", "subtotal"),
        ("created_at", "created_at"),
        ("updated_at", "updated_at"),
    ],
    "id",
);

// =============================================================================
// Builder
// =============================================================================

/// Incremental `SELECT … WHERE 1=1 [AND …]*` builder.
#[derive(Debug)]
pub struct SelectBuilder {
    sql: String,
    args: Vec<SqlArg>,
}

impl SelectBuilder {
    pub fn new(table: &'static str, columns: &'static str) -> Self {
        SelectBuilder {
            sql: format!("SELECT {columns} FROM {table} WHERE 1=1"),
            args: Vec::new(),
        }
    }

    fn push_arg(&mut self, arg: SqlArg) -> usize {
        self.args.push(arg);
        self.args.len()
    }

    /// Appends `AND column op ?N` and its argument.
    pub fn and(&mut self, column: &'static str, cmp: Cmp, value: impl Into<SqlArg>) -> &mut Self {
        let n = self.push_arg(value.into());
        self.sql
            .push_str(&format!(" AND {column} {} ?{n}", cmp.as_sql()));
        self
    }

    /// [`and`](Self::and) when `value` is present; no-op otherwise.
    pub fn and_opt<T: Into<SqlArg>>(
        &mut self,
        column: &'static str,
        cmp: Cmp,
        value: Option<T>,
    ) -> &mut Self {
        if let Some(value) = value {
            self.and(column, cmp, value);
        }
        self
    }

    /// Appends `ORDER BY column dir`, with `id` as tie-breaker so pages are
    /// stable.
    pub fn order_by(&mut self, column: &'static str, direction: SortDirection) -> &mut Self {
        let dir = direction.as_sql();
        self.sql.push_str(&format!(" ORDER BY {column} {dir}"));
        if column != "id" {
            self.sql.push_str(&format!(", id {dir}"));
        }
        self
    }

    pub fn page(&mut self, limit: i64, offset: i64) -> &mut Self {
        let l = self.push_arg(SqlArg::Int(limit));
        let o = self.push_arg(SqlArg::Int(offset));
        self.sql.push_str(&format!(" LIMIT ?{l} OFFSET ?{o}"));
        self
    }

    pub fn build(self) -> BuiltQuery {
        BuiltQuery {
            sql: self.sql,
            args: self.args,
        }
    }
}

/// SQL text plus its arguments in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltQuery {
    pub sql: String,
    pub args: Vec<SqlArg>,
}

impl BuiltQuery {
    /// An executable query with every argument bound.
    pub fn query(&self) -> Query<'_, Sqlite, SqliteArguments<'_>> {
        self.args
            .iter()
            .fold(sqlx::query(&self.sql), |query, arg| match arg {
                SqlArg::Int(v) => query.bind(*v),
                SqlArg::Text(v) => query.bind(v.clone()),
                SqlArg::Timestamp(v) => query.bind(*v),
            })
    }
}

// =============================================================================
// Filter Queries
// =============================================================================

/// Builds the list query for a validated sale filter.
pub fn sale_query(filter: &SaleFilter, policy: SortPolicy) -> StoreResult<BuiltQuery> {
    let (column, direction) = SALE_SORT_FIELDS.resolve(&filter.base, policy)?;

    let mut builder = SelectBuilder::new("sales", SALE_COLUMNS);
    builder
        .and_opt("client_id", Cmp::Eq, filter.client_id)
        .and_opt("user_id", Cmp::Eq, filter.user_id)
        .and_opt("total_amount", Cmp::Gte, filter.min_total_amount)
        .and_opt("total_amount", Cmp::Lte, filter.max_total_amount)
        .and_opt("total_discount", Cmp::Gte, filter.min_total_discount)
        .and_opt("total_discount", Cmp::Lte, filter.max_total_discount)
        .and_opt("payment_type", Cmp::Eq, filter.payment_type.clone())
        .and_opt("status", Cmp::Eq, filter.status.clone())
        .and_opt("sale_date", Cmp::Gte, filter.start_date)
        .and_opt("sale_date", Cmp::Lte, filter.end_date)
        .and_opt("created_at", Cmp::Gte, filter.created_from)
        .and_opt("created_at", Cmp::Lte, filter.created_to)
        .and_opt("updated_at", Cmp::Gte, filter.updated_from)
        .and_opt("updated_at", Cmp::Lte, filter.updated_to)
        .order_by(column, direction)
        .page(
            filter.base.effective_limit(),
            filter.base.effective_offset(),
        );

    Ok(builder.build())
}

/// Builds the list query for a validated sale item filter.
pub fn sale_item_query(filter: &SaleItemFilter, policy: SortPolicy) -> StoreResult<BuiltQuery> {
    let (column, direction) = SALE_ITEM_SORT_FIELDS.resolve(&filter.base, policy)?;

    let mut builder = SelectBuilder::new("sale_items", SALE_ITEM_COLUMNS);
    builder
        .and_opt("sale_id", Cmp::Eq, filter.sale_id)
        .and_opt("product_id", Cmp::Eq, filter.product_id)
        .and_opt("quantity", Cmp::Gte, filter.min_quantity)
        .and_opt("quantity", Cmp::Lte, filter.max_quantity)
        .and_opt("subtotal", Cmp::Gte, filter.min_subtotal)
        .and_opt("subtotal", Cmp::Lte, filter.max_subtotal)
        .order_by(column, direction)
        .page(
            filter.base.effective_limit(),
            filter.base.effective_offset(),
        );

    Ok(builder.build())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use storehub_core::{ErrorKind, DEFAULT_LIMIT, MAX_LIMIT};

    fn sorted(sort_by: &str, sort_order: Option<&str>) -> SaleFilter {
        SaleFilter {
            base: BaseFilter {
                sort_by: Some(sort_by.to_string()),
                sort_order: sort_order.map(str::to_string),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn tail(sql: &str) -> &str {
        let idx = sql.find(" ORDER BY").unwrap();
        &sql[idx..]
    }

    #[test]
    fn test_empty_filter() {
        let built = sale_query(&SaleFilter::default(), SortPolicy::Fallback).unwrap();
        assert!(built.sql.starts_with("SELECT id, client_id"));
        assert!(built.sql.contains("FROM sales WHERE 1=1 ORDER BY"));
        assert_eq!(
            tail(&built.sql),
            " ORDER BY created_at ASC, id ASC LIMIT ?1 OFFSET ?2"
        );
        assert_eq!(built.args, vec![SqlArg::Int(DEFAULT_LIMIT), SqlArg::Int(0)]);
    }

    #[test]
    fn test_clause_order_matches_argument_order() {
        let filter = SaleFilter {
            client_id: Some(3),
            min_total_amount: Some(Money::from_cents(100)),
            max_total_amount: Some(Money::from_cents(500)),
            status: Some("completed".to_string()),
            base: BaseFilter {
                limit: Some(500),
                offset: Some(40),
                ..Default::default()
            },
            ..Default::default()
        };

        let built = sale_query(&filter, SortPolicy::Fallback).unwrap();
        assert!(built.sql.contains(
            "WHERE 1=1 AND client_id = ?1 AND total_amount >= ?2 \
             AND total_amount <= ?3 AND status = ?4 ORDER BY"
        ));
        assert!(built.sql.ends_with("LIMIT ?5 OFFSET ?6"));
        assert_eq!(
            built.args,
            vec![
                SqlArg::Int(3),
                SqlArg::Int(100),
                SqlArg::Int(500),
                SqlArg::Text("completed".to_string()),
                SqlArg::Int(MAX_LIMIT),
                SqlArg::Int(40),
            ]
        );
    }

    #[test]
    fn test_injected_sort_falls_back() {
        let evil = "'; DROP TABLE sales;--";
        let built = sale_query(&sorted(evil, None), SortPolicy::Fallback).unwrap();
        assert!(!built.sql.contains("DROP"));
        assert!(!built.sql.contains('\''));
        assert!(built.sql.contains("ORDER BY created_at ASC"));

        let built = sale_query(&sorted("total", Some("1; DELETE")), SortPolicy::Fallback).unwrap();
        assert!(!built.sql.contains("DELETE"));
        assert!(built.sql.contains("ORDER BY total_amount ASC"));
    }

    #[test]
    fn test_injected_sort_rejected_when_strict() {
        let err = sale_query(&sorted("'; DROP TABLE sales;--", None), SortPolicy::Strict)
            .unwrap_err();
        assert!(err.is(ErrorKind::InvalidOrderField));

        let err = sale_query(&sorted("total_amount", Some("sideways")), SortPolicy::Strict)
            .unwrap_err();
        assert!(err.is(ErrorKind::InvalidOrderDirection));
    }

    #[test]
    fn test_sort_keys_and_direction_case_insensitive() {
        let built = sale_query(&sorted(" Sale_Date ", Some("DESC")), SortPolicy::Strict).unwrap();
        assert!(built.sql.contains("ORDER BY sale_date DESC, id DESC"));

        let built = sale_query(&sorted("id", Some("asc")), SortPolicy::Strict).unwrap();
        assert!(built.sql.contains("ORDER BY id ASC LIMIT"));
    }

    #[test]
    fn test_item_query() {
        let filter = SaleItemFilter {
            sale_id: Some(9),
            min_quantity: Some(2),
            max_subtotal: Some(Money::from_cents(1_000)),
            ..Default::default()
        };
        let built = sale_item_query(&filter, SortPolicy::Fallback).unwrap();
        assert!(built.sql.contains("FROM sale_items WHERE 1=1 AND sale_id = ?1"));
        assert!(built.sql.contains("AND quantity >= ?2 AND subtotal <= ?3"));
        assert!(built.sql.contains("ORDER BY id ASC LIMIT ?4 OFFSET ?5"));
        assert_eq!(built.args.len(), 5);
    }
}
