//! # Sale Service
//!
//! Validation, state machine and repository calls for the sale aggregate.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use storehub_core::validation::{validate_new_sale, validate_sale};
use storehub_core::{
    ErrorKind, NewSale, Sale, SaleFilter, SaleRepository, SaleStatus, SaleTransition, StoreError,
    StoreResult, ValidationError, ValidationErrors,
};

use crate::require_id;

const SALE: &str = "sale";

/// Entry point for every sale operation.
///
/// ## Example
/// ```rust,ignore
/// let service = SaleService::new(Arc::new(db.sales()));
/// let sale = service.create(&new_sale).await?;
/// let sale = service.complete(sale.id).await?;
/// ```
#[derive(Clone)]
pub struct SaleService {
    repo: Arc<dyn SaleRepository>,
}

impl SaleService {
    pub fn new(repo: Arc<dyn SaleRepository>) -> Self {
        SaleService { repo }
    }

    /// Records a new sale. It always starts `active` at version 1.
    pub async fn create(&self, new: &NewSale) -> StoreResult<Sale> {
        validate_new_sale(new).map_err(invalid)?;

        let sale = self.repo.create(new).await?;
        info!(
            id = sale.id,
            user_id = sale.user_id,
            total = %sale.total_amount,
            "Sale recorded"
        );
        Ok(sale)
    }

    pub async fn get_by_id(&self, id: i64) -> StoreResult<Sale> {
        require_id(SALE, id)?;
        self.repo.get_by_id(id).await
    }

    /// Current version of a sale, for retrying after a `VersionConflict`.
    pub async fn get_version_by_id(&self, id: i64) -> StoreResult<i32> {
        require_id(SALE, id)?;
        self.repo.get_version_by_id(id).await
    }

    pub async fn get_by_client(&self, client_id: i64) -> StoreResult<Vec<Sale>> {
        require_id("client", client_id)?;
        self.repo.get_by_client(client_id).await
    }

    pub async fn get_by_user(&self, user_id: i64) -> StoreResult<Vec<Sale>> {
        require_id("user", user_id)?;
        self.repo.get_by_user(user_id).await
    }

    /// Sales in `status`, given by its exact lowercase name.
    pub async fn get_by_status(&self, status: &str) -> StoreResult<Vec<Sale>> {
        let status: SaleStatus = status
            .parse()
            .map_err(|e: ValidationError| invalid(e.into()))?;
        self.repo.get_by_status(status).await
    }

    /// Sales whose date lies in `[start, end]`.
    pub async fn get_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<Sale>> {
        if start > end {
            return Err(invalid(
                ValidationError::RangeInverted {
                    field: "start".to_string(),
                    max_field: "end".to_string(),
                }
                .into(),
            ));
        }
        self.repo.get_by_date_range(start, end).await
    }

    /// Validates `filter` and runs it with pagination defaults applied.
    ///
    /// A filter that fails validation never reaches the repository.
    pub async fn filter(&self, filter: &SaleFilter) -> StoreResult<Vec<Sale>> {
        filter.validate()?;
        let filter = filter.normalized();
        debug!(?filter, "Filtering sales");
        self.repo.filter(&filter).await
    }

    /// Writes changed fields of `sale`, guarded by `sale.version`.
    ///
    /// The status cannot change here; use the lifecycle operations. On
    /// success `sale.version` is incremented. On `VersionConflict` nothing
    /// was written: re-read, reapply and retry.
    pub async fn update(&self, sale: &mut Sale) -> StoreResult<()> {
        require_id(SALE, sale.id)?;
        validate_sale(sale).map_err(invalid)?;

        // A stale copy is a conflict even when its status also differs; the
        // repository's compare-and-set still catches writes racing this read.
        let stored = self.repo.get_by_id(sale.id).await?;
        if stored.version != sale.version {
            warn!(id = sale.id, version = sale.version, current = stored.version, "Stale sale update");
            return Err(StoreError::VersionConflict {
                entity: SALE,
                id: sale.id,
                expected: sale.version,
            });
        }
        if stored.status != sale.status {
            warn!(
                id = sale.id,
                from = %stored.status,
                to = %sale.status,
                "Rejected status change through update"
            );
            return Err(invalid(
                ValidationError::ReadOnly {
                    field: "status".to_string(),
                }
                .into(),
            ));
        }

        let (id, version) = (sale.id, sale.version);
        self.repo.update(sale).await.inspect_err(|err| {
            if err.is(ErrorKind::VersionConflict) {
                warn!(id, version, "Stale sale update");
            }
        })?;
        info!(id = sale.id, version = sale.version, "Sale updated");
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        require_id(SALE, id)?;
        self.repo.delete(id).await?;
        info!(id, "Sale deleted");
        Ok(())
    }

    pub async fn cancel(&self, id: i64) -> StoreResult<Sale> {
        self.transition(id, SaleTransition::Cancel).await
    }

    pub async fn complete(&self, id: i64) -> StoreResult<Sale> {
        self.transition(id, SaleTransition::Complete).await
    }

    pub async fn mark_returned(&self, id: i64) -> StoreResult<Sale> {
        self.transition(id, SaleTransition::Return).await
    }

    pub async fn activate(&self, id: i64) -> StoreResult<Sale> {
        self.transition(id, SaleTransition::Activate).await
    }

    async fn transition(&self, id: i64, transition: SaleTransition) -> StoreResult<Sale> {
        require_id(SALE, id)?;

        match self.repo.transition(id, transition).await {
            Ok(sale) => {
                info!(id, %transition, status = %sale.status, version = sale.version, "Sale status changed");
                Ok(sale)
            }
            Err(err) => {
                if matches!(
                    err,
                    StoreError::InvalidTransition { .. } | StoreError::VersionConflict { .. }
                ) {
                    warn!(id, %transition, error = %err, "Sale status change rejected");
                }
                Err(err)
            }
        }
    }
}

fn invalid(errors: ValidationErrors) -> StoreError {
    StoreError::InvalidData {
        entity: SALE,
        errors,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use storehub_core::{BaseFilter, Money, DEFAULT_LIMIT};

    /// In-memory [`SaleRepository`] that counts writes.
    #[derive(Default)]
    struct FakeSales {
        rows: Mutex<BTreeMap<i64, Sale>>,
        updates: AtomicUsize,
        filters: Mutex<Vec<SaleFilter>>,
    }

    impl FakeSales {
        fn updates(&self) -> usize {
            self.updates.load(Ordering::SeqCst)
        }

        fn filter_calls(&self) -> Vec<SaleFilter> {
            self.filters.lock().unwrap().clone()
        }

        fn matching(&self, pred: impl Fn(&Sale) -> bool) -> Vec<Sale> {
            self.rows
                .lock()
                .unwrap()
                .values()
                .filter(|s| pred(s))
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl SaleRepository for FakeSales {
        async fn create(&self, new: &NewSale) -> StoreResult<Sale> {
            let mut rows = self.rows.lock().unwrap();
            let id = rows.len() as i64 + 1;
            let sale = Sale::from_new(id, new, Utc::now());
            rows.insert(id, sale.clone());
            Ok(sale)
        }

        async fn get_by_id(&self, id: i64) -> StoreResult<Sale> {
            self.rows
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .ok_or(StoreError::NotFound { entity: "sale", id })
        }

        async fn get_version_by_id(&self, id: i64) -> StoreResult<i32> {
            Ok(self.get_by_id(id).await?.version)
        }

        async fn get_by_client(&self, client_id: i64) -> StoreResult<Vec<Sale>> {
            Ok(self.matching(|s| s.client_id == Some(client_id)))
        }

        async fn get_by_user(&self, user_id: i64) -> StoreResult<Vec<Sale>> {
            Ok(self.matching(|s| s.user_id == user_id))
        }

        async fn get_by_status(&self, status: SaleStatus) -> StoreResult<Vec<Sale>> {
            Ok(self.matching(|s| s.status == status))
        }

        async fn get_by_date_range(
            &self,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> StoreResult<Vec<Sale>> {
            Ok(self.matching(|s| s.sale_date >= start && s.sale_date <= end))
        }

        async fn filter(&self, filter: &SaleFilter) -> StoreResult<Vec<Sale>> {
            self.filters.lock().unwrap().push(filter.clone());
            Ok(self.matching(|_| true))
        }

        async fn update(&self, sale: &mut Sale) -> StoreResult<()> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            let mut rows = self.rows.lock().unwrap();
            let stored = rows.get_mut(&sale.id).ok_or(StoreError::NotFound {
                entity: "sale",
                id: sale.id,
            })?;
            if stored.version != sale.version {
                return Err(StoreError::VersionConflict {
                    entity: "sale",
                    id: sale.id,
                    expected: sale.version,
                });
            }
            sale.version += 1;
            sale.updated_at = Utc::now();
            *stored = sale.clone();
            Ok(())
        }

        async fn delete(&self, id: i64) -> StoreResult<()> {
            self.rows
                .lock()
                .unwrap()
                .remove(&id)
                .map(|_| ())
                .ok_or(StoreError::NotFound { entity: "sale", id })
        }
    }

    fn service() -> (SaleService, Arc<FakeSales>) {
        let repo = Arc::new(FakeSales::default());
        (SaleService::new(repo.clone()), repo)
    }

    fn cash_sale() -> NewSale {
        NewSale {
            user_id: 1,
            total_amount: Money::from_cents(100),
            payment_type: "cash".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_starts_active_at_version_one() {
        let (service, _) = service();

        let sale = service.create(&cash_sale()).await.unwrap();
        assert!(sale.id > 0);
        assert_eq!(sale.version, 1);
        assert_eq!(sale.status, SaleStatus::Active);
        assert_eq!(sale.created_at, sale.updated_at);
    }

    #[tokio::test]
    async fn test_create_reports_every_structural_error() {
        let (service, repo) = service();
        let new = NewSale {
            user_id: 0,
            total_amount: Money::from_cents(-5),
            payment_type: "   ".to_string(),
            notes: "x".repeat(501),
            ..Default::default()
        };

        let err = service.create(&new).await.unwrap_err();
        assert!(err.is(ErrorKind::InvalidData));
        let errors = err.validation_errors().unwrap();
        for field in ["user_id", "total_amount", "payment_type", "notes"] {
            assert!(errors.has_field(field), "missing {field}");
        }
        assert!(repo.matching(|_| true).is_empty());
    }

    #[tokio::test]
    async fn test_structural_errors_short_circuit_rules() {
        let (service, _) = service();
        let new = NewSale {
            user_id: 0,
            total_discount: Money::from_cents(500),
            ..cash_sale()
        };

        let err = service.create(&new).await.unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert!(errors.has_field("user_id"));
        assert!(!errors.has_field("total_discount"));
    }

    #[tokio::test]
    async fn test_discount_above_total_rejected() {
        let (service, _) = service();
        let new = NewSale {
            total_discount: Money::from_cents(101),
            ..cash_sale()
        };

        let err = service.create(&new).await.unwrap_err();
        assert!(err.is(ErrorKind::InvalidData));
        assert!(err.validation_errors().unwrap().has_field("total_discount"));
    }

    #[tokio::test]
    async fn test_zero_ids_rejected() {
        let (service, _) = service();

        assert!(service.get_by_id(0).await.unwrap_err().is(ErrorKind::ZeroId));
        assert!(service.get_version_by_id(-3).await.unwrap_err().is(ErrorKind::ZeroId));
        assert!(service.get_by_client(0).await.unwrap_err().is(ErrorKind::ZeroId));
        assert!(service.get_by_user(0).await.unwrap_err().is(ErrorKind::ZeroId));
        assert!(service.cancel(0).await.unwrap_err().is(ErrorKind::ZeroId));
        assert!(service.delete(0).await.unwrap_err().is(ErrorKind::ZeroId));
    }

    #[tokio::test]
    async fn test_cancel_completed_sale_is_rejected() {
        let (service, repo) = service();
        let id = service.create(&cash_sale()).await.unwrap().id;
        service.complete(id).await.unwrap();
        let writes = repo.updates();

        let err = service.cancel(id).await.unwrap_err();
        assert!(err.is(ErrorKind::InvalidData));
        assert!(err.to_string().starts_with("only active sales can be canceled"));

        assert_eq!(repo.updates(), writes);
        assert_eq!(service.get_by_id(id).await.unwrap().status, SaleStatus::Completed);
    }

    #[tokio::test]
    async fn test_complete_then_return() {
        let (service, _) = service();
        let id = service.create(&cash_sale()).await.unwrap().id;

        service.complete(id).await.unwrap();
        let sale = service.mark_returned(id).await.unwrap();

        assert_eq!(sale.status, SaleStatus::Returned);
        assert_eq!(sale.version, 3);
        assert_eq!(service.get_version_by_id(id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_illegal_transitions_never_write() {
        let (service, repo) = service();

        // Drive one sale into each status
        let mut ids = BTreeMap::new();
        for status in SaleStatus::ALL {
            let id = service.create(&cash_sale()).await.unwrap().id;
            match status {
                SaleStatus::Active => {}
                SaleStatus::Completed => {
                    service.complete(id).await.unwrap();
                }
                SaleStatus::Canceled => {
                    service.cancel(id).await.unwrap();
                }
                SaleStatus::Returned => {
                    service.complete(id).await.unwrap();
                    service.mark_returned(id).await.unwrap();
                }
            }
            ids.insert(status.as_str(), id);
        }

        for status in SaleStatus::ALL {
            for transition in SaleTransition::ALL {
                if transition.allows(status) {
                    continue;
                }
                let id = ids[status.as_str()];
                let writes = repo.updates();

                let err = service.transition(id, transition).await.unwrap_err();
                assert!(err.is(ErrorKind::InvalidData), "{transition} from {status}");
                assert_eq!(repo.updates(), writes);
                assert_eq!(service.get_by_id(id).await.unwrap().status, status);
            }
        }
    }

    #[tokio::test]
    async fn test_update_cannot_change_status() {
        let (service, repo) = service();
        let mut sale = service.create(&cash_sale()).await.unwrap();

        sale.status = SaleStatus::Completed;
        let err = service.update(&mut sale).await.unwrap_err();
        assert!(err.is(ErrorKind::InvalidData));
        assert!(err.validation_errors().unwrap().has_field("status"));
        assert_eq!(repo.updates(), 0);
    }

    #[tokio::test]
    async fn test_stale_copy_after_status_change_is_a_conflict() {
        let (service, repo) = service();
        let mut stale = service.create(&cash_sale()).await.unwrap();
        service.complete(stale.id).await.unwrap();
        let writes = repo.updates();

        stale.notes = "edited before completion".to_string();
        let err = service.update(&mut stale).await.unwrap_err();
        assert!(err.is(ErrorKind::VersionConflict), "{err}");
        assert_eq!(stale.version, 1);
        assert_eq!(repo.updates(), writes);

        let mut fresh = service.get_by_id(stale.id).await.unwrap();
        fresh.notes = "edited after completion".to_string();
        service.update(&mut fresh).await.unwrap();
        assert_eq!(fresh.version, 3);
        assert_eq!(fresh.status, SaleStatus::Completed);
    }

    #[tokio::test]
    async fn test_update_bumps_version_and_detects_stale_copies() {
        let (service, _) = service();
        let mut first = service.create(&cash_sale()).await.unwrap();
        let mut second = first.clone();

        first.notes = "gift wrap".to_string();
        service.update(&mut first).await.unwrap();
        assert_eq!(first.version, 2);

        second.payment_type = "card".to_string();
        let err = service.update(&mut second).await.unwrap_err();
        assert!(err.is(ErrorKind::VersionConflict));

        let stored = service.get_by_id(first.id).await.unwrap();
        assert_eq!(stored.version, 2);
        assert_eq!(stored.payment_type, "cash");
    }

    #[tokio::test]
    async fn test_update_validates_first() {
        let (service, repo) = service();
        let mut sale = service.create(&cash_sale()).await.unwrap();

        sale.total_discount = Money::from_cents(1_000);
        let err = service.update(&mut sale).await.unwrap_err();
        assert!(err.is(ErrorKind::InvalidData));
        assert_eq!(repo.updates(), 0);

        let mut ghost = Sale::from_new(77, &cash_sale(), Utc::now());
        assert!(service.update(&mut ghost).await.unwrap_err().is(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_get_by_status_is_exact() {
        let (service, _) = service();
        let id = service.create(&cash_sale()).await.unwrap().id;
        service.complete(id).await.unwrap();

        assert_eq!(service.get_by_status("completed").await.unwrap().len(), 1);
        assert!(service.get_by_status("active").await.unwrap().is_empty());

        let err = service.get_by_status("COMPLETED").await.unwrap_err();
        assert!(err.is(ErrorKind::InvalidData));
    }

    #[tokio::test]
    async fn test_date_range_must_be_ordered() {
        let (service, _) = service();
        let now = Utc::now();

        let err = service
            .get_by_date_range(now, now - chrono::Duration::days(1))
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::InvalidData));
        assert!(service.get_by_date_range(now, now).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_filter_never_reaches_repository() {
        let (service, repo) = service();
        service.create(&cash_sale()).await.unwrap();

        let filter = SaleFilter {
            status: Some("COMPLETED".to_string()),
            ..Default::default()
        };
        let err = service.filter(&filter).await.unwrap_err();
        assert!(err.is(ErrorKind::InvalidFilter));

        let swapped = SaleFilter {
            min_total_amount: Some(Money::from_cents(500)),
            max_total_amount: Some(Money::from_cents(100)),
            ..Default::default()
        };
        let err = service.filter(&swapped).await.unwrap_err();
        assert!(err.validation_errors().unwrap().has_field("min_total_amount"));

        assert!(repo.filter_calls().is_empty());
    }

    #[tokio::test]
    async fn test_filter_is_normalized() {
        let (service, repo) = service();
        let filter = SaleFilter {
            min_total_amount: Some(Money::from_cents(100)),
            max_total_amount: Some(Money::from_cents(500)),
            base: BaseFilter {
                offset: Some(-10),
                sort_order: Some("DESC".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        service.filter(&filter).await.unwrap();

        let calls = repo.filter_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].base.limit, Some(DEFAULT_LIMIT));
        assert_eq!(calls[0].base.offset, Some(0));
        assert_eq!(calls[0].base.sort_order.as_deref(), Some("desc"));
    }

    #[tokio::test]
    async fn test_delete() {
        let (service, _) = service();
        let id = service.create(&cash_sale()).await.unwrap().id;

        service.delete(id).await.unwrap();
        assert!(service.get_by_id(id).await.unwrap_err().is(ErrorKind::NotFound));
        assert!(service.delete(id).await.unwrap_err().is(ErrorKind::NotFound));
    }
}
