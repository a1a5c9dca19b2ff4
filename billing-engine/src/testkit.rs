//! In-memory `BillingStore` used by the engine tests. Mirrors the SQL
//! semantics of the Postgres queries over plain vectors.

use std::collections::BTreeMap;

use time::OffsetDateTime;

use crate::domain::{MarketHourlyPrice, MonthlyEnergy, Reading, Service, Tariff};
use crate::error::StoreError;
use crate::store::{BillingStore, Metric};

#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    pub services: Vec<Service>,
    pub tariffs: Vec<Tariff>,
    pub readings: Vec<Reading>,
    pub market_prices: Vec<MarketHourlyPrice>,
}

pub(crate) fn reading(
    service_id: i64,
    ts: OffsetDateTime,
    consumption_kwh: Option<f64>,
    injection_kwh: Option<f64>,
) -> Reading {
    Reading {
        ts,
        service_id,
        consumption_kwh,
        injection_kwh,
    }
}

/// Tariff fixture where only the rates the calculators read (CU and C)
/// are meaningful.
pub(crate) fn tariff_with_rates(
    market_id: i64,
    demand_class: i32,
    voltage_level: i32,
    unit_commercialization_rate: f64,
    excess_commercialization_rate: f64,
) -> Tariff {
    Tariff {
        market_id,
        demand_class,
        voltage_level,
        generation_rate: 0.0,
        transmission_rate: 0.0,
        distribution_rate: 0.0,
        retail_margin: 0.0,
        excess_commercialization_rate,
        excess_penalty_rate: 0.0,
        unit_commercialization_rate,
    }
}

fn metric_value(r: &Reading, metric: Metric) -> Option<f64> {
    match metric {
        Metric::Consumption => r.consumption_kwh,
        Metric::Injection => r.injection_kwh,
    }
}

#[async_trait::async_trait]
impl BillingStore for MemoryStore {
    async fn find_service(&self, service_id: i64) -> Result<Option<Service>, StoreError> {
        Ok(self
            .services
            .iter()
            .find(|s| s.service_id == service_id)
            .cloned())
    }

    async fn find_tariff(
        &self,
        market_id: i64,
        voltage_level: i32,
        demand_class: Option<i32>,
    ) -> Result<Option<Tariff>, StoreError> {
        Ok(self
            .tariffs
            .iter()
            .filter(|t| t.market_id == market_id && t.voltage_level == voltage_level)
            .filter(|t| demand_class.map_or(true, |dc| t.demand_class == dc))
            .min_by_key(|t| t.demand_class)
            .cloned())
    }

    async fn sum_metric(
        &self,
        service_id: i64,
        metric: Metric,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<f64, StoreError> {
        Ok(self
            .readings
            .iter()
            .filter(|r| r.service_id == service_id && r.ts >= start && r.ts <= end)
            .filter_map(|r| metric_value(r, metric))
            .sum())
    }

    async fn bucket_metric_by_hour(
        &self,
        service_id: i64,
        metric: Metric,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<BTreeMap<u8, f64>, StoreError> {
        let mut buckets = BTreeMap::new();
        for r in self
            .readings
            .iter()
            .filter(|r| r.service_id == service_id && r.ts >= start && r.ts <= end)
        {
            if let Some(value) = metric_value(r, metric) {
                *buckets.entry(r.ts.hour()).or_insert(0.0) += value;
            }
        }
        Ok(buckets)
    }

    async fn market_hourly_price(
        &self,
        slot_start: OffsetDateTime,
        slot_end: OffsetDateTime,
    ) -> Result<Option<f64>, StoreError> {
        Ok(self
            .market_prices
            .iter()
            .filter(|p| p.ts >= slot_start && p.ts < slot_end)
            .min_by_key(|p| p.ts)
            .map(|p| p.price))
    }

    async fn monthly_energy(&self, service_id: i64) -> Result<Vec<MonthlyEnergy>, StoreError> {
        let mut groups: BTreeMap<(i32, i32), (f64, f64)> = BTreeMap::new();
        for r in self.readings.iter().filter(|r| r.service_id == service_id) {
            let key = (r.ts.year(), u8::from(r.ts.month()) as i32);
            let entry = groups.entry(key).or_insert((0.0, 0.0));
            entry.0 += r.consumption_kwh.unwrap_or(0.0);
            entry.1 += r.injection_kwh.unwrap_or(0.0);
        }

        Ok(groups
            .into_iter()
            .map(|((year, month), (consumption_kwh, injection_kwh))| MonthlyEnergy {
                year,
                month,
                consumption_kwh,
                injection_kwh,
            })
            .collect())
    }

    async fn system_consumption_by_hour(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<BTreeMap<u8, f64>, StoreError> {
        let mut buckets = BTreeMap::new();
        for r in self.readings.iter().filter(|r| r.ts >= start && r.ts <= end) {
            if let Some(value) = r.consumption_kwh {
                *buckets.entry(r.ts.hour()).or_insert(0.0) += value;
            }
        }
        Ok(buckets)
    }
}
