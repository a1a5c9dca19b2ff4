use std::collections::BTreeMap;

use sqlx::PgPool;
use time::OffsetDateTime;

use crate::db::queries;
use crate::domain::{MonthlyEnergy, Service, Tariff};
use crate::error::StoreError;

/// The two measured quantities on a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Consumption,
    Injection,
}

impl Metric {
    pub(crate) fn column(self) -> &'static str {
        match self {
            Self::Consumption => "consumption_kwh",
            Self::Injection => "injection_kwh",
        }
    }
}

/// Read-only storage surface the billing engine computes against. The
/// engine stays free of query syntax; `PgStore` carries the production
/// implementation and tests substitute an in-memory one.
#[async_trait::async_trait]
pub trait BillingStore: Send + Sync {
    async fn find_service(&self, service_id: i64) -> Result<Option<Service>, StoreError>;

    /// `demand_class = None` means the dimension is ignored in the
    /// lookup. The caller decides which case applies; the store never
    /// inspects voltage-level policy.
    async fn find_tariff(
        &self,
        market_id: i64,
        voltage_level: i32,
        demand_class: Option<i32>,
    ) -> Result<Option<Tariff>, StoreError>;

    /// Sum of one metric over the inclusive window. 0 when no rows
    /// match; absent cell values are excluded rather than zeroed.
    async fn sum_metric(
        &self,
        service_id: i64,
        metric: Metric,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<f64, StoreError>;

    /// Per hour-of-day sums of one metric over the inclusive window,
    /// collapsed across dates.
    async fn bucket_metric_by_hour(
        &self,
        service_id: i64,
        metric: Metric,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<BTreeMap<u8, f64>, StoreError>;

    /// Market price for the half-open slot [slot_start, slot_end), or
    /// None when market data has not yet landed for that hour.
    async fn market_hourly_price(
        &self,
        slot_start: OffsetDateTime,
        slot_end: OffsetDateTime,
    ) -> Result<Option<f64>, StoreError>;

    /// A service's full reading history grouped by (year, month).
    async fn monthly_energy(&self, service_id: i64) -> Result<Vec<MonthlyEnergy>, StoreError>;

    /// Consumption per hour across all services, inclusive window.
    async fn system_consumption_by_hour(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<BTreeMap<u8, f64>, StoreError>;
}

/// Production store backed by Postgres via sqlx.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl BillingStore for PgStore {
    async fn find_service(&self, service_id: i64) -> Result<Option<Service>, StoreError> {
        queries::find_service(&self.pool, service_id)
            .await
            .map_err(StoreError::from)
    }

    async fn find_tariff(
        &self,
        market_id: i64,
        voltage_level: i32,
        demand_class: Option<i32>,
    ) -> Result<Option<Tariff>, StoreError> {
        queries::find_tariff(&self.pool, market_id, voltage_level, demand_class)
            .await
            .map_err(StoreError::from)
    }

    async fn sum_metric(
        &self,
        service_id: i64,
        metric: Metric,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<f64, StoreError> {
        queries::sum_metric(&self.pool, service_id, metric, start, end)
            .await
            .map_err(StoreError::from)
    }

    async fn bucket_metric_by_hour(
        &self,
        service_id: i64,
        metric: Metric,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<BTreeMap<u8, f64>, StoreError> {
        queries::bucket_metric_by_hour(&self.pool, service_id, metric, start, end)
            .await
            .map_err(StoreError::from)
    }

    async fn market_hourly_price(
        &self,
        slot_start: OffsetDateTime,
        slot_end: OffsetDateTime,
    ) -> Result<Option<f64>, StoreError> {
        queries::market_hourly_price(&self.pool, slot_start, slot_end)
            .await
            .map_err(StoreError::from)
    }

    async fn monthly_energy(&self, service_id: i64) -> Result<Vec<MonthlyEnergy>, StoreError> {
        queries::monthly_energy(&self.pool, service_id)
            .await
            .map_err(StoreError::from)
    }

    async fn system_consumption_by_hour(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<BTreeMap<u8, f64>, StoreError> {
        queries::system_consumption_by_hour(&self.pool, start, end)
            .await
            .map_err(StoreError::from)
    }
}
