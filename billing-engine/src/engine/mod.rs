pub mod calendar;
mod concepts;
mod statistics;

pub use calendar::month_window;

use time::Date;

use crate::domain::{ClientStatistics, Concept, ConceptLine, Invoice, Service, SystemLoad};
use crate::error::BillingError;
use crate::store::BillingStore;

/// Request-scoped billing computation over a read-only store. Holds no
/// mutable state of its own; concurrent invocations need no
/// coordination.
#[derive(Debug, Clone)]
pub struct BillingEngine<S> {
    store: S,
}

impl<S: BillingStore> BillingEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn service(&self, service_id: i64) -> Result<Service, BillingError> {
        self.store
            .find_service(service_id)
            .await?
            .ok_or(BillingError::CustomerNotFound(service_id))
    }

    /// Compute a single concept line for one customer-month.
    pub async fn concept(
        &self,
        concept: Concept,
        service_id: i64,
        year: i32,
        month: u8,
    ) -> Result<ConceptLine, BillingError> {
        match concept {
            Concept::Ea => concepts::active_energy(&self.store, service_id, year, month).await,
            Concept::Ec => {
                concepts::excess_commercialization(&self.store, service_id, year, month).await
            }
            Concept::Ee1 => concepts::first_tier_excess(&self.store, service_id, year, month).await,
            Concept::Ee2 => {
                concepts::second_tier_excess(&self.store, service_id, year, month).await
            }
        }
    }

    /// Assemble the full invoice for one customer-month. The four
    /// concepts are independent of each other; any failure aborts the
    /// whole invoice, never yielding a partial one.
    pub async fn invoice(
        &self,
        service_id: i64,
        year: i32,
        month: u8,
    ) -> Result<Invoice, BillingError> {
        let ea = concepts::active_energy(&self.store, service_id, year, month).await?;
        let ec = concepts::excess_commercialization(&self.store, service_id, year, month).await?;
        let ee1 = concepts::first_tier_excess(&self.store, service_id, year, month).await?;
        let ee2 = concepts::second_tier_excess(&self.store, service_id, year, month).await?;

        let total = ea.total + ec.total + ee1.total + ee2.total;

        Ok(Invoice {
            service_id,
            year,
            month,
            ea,
            ec,
            ee1,
            ee2,
            total,
        })
    }

    pub async fn client_statistics(
        &self,
        service_id: i64,
    ) -> Result<ClientStatistics, BillingError> {
        statistics::client_statistics(&self.store, service_id).await
    }

    pub async fn system_load(&self, date: Date) -> Result<SystemLoad, BillingError> {
        statistics::system_load(&self.store, date).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MarketHourlyPrice;
    use crate::testkit::{reading, tariff_with_rates, MemoryStore};
    use time::macros::datetime;

    fn engine_with_fixture() -> BillingEngine<MemoryStore> {
        let mut store = MemoryStore::default();
        store.services.push(crate::domain::Service {
            service_id: 7,
            market_id: 1,
            demand_class: 5,
            voltage_level: 3,
        });
        store.tariffs.push(tariff_with_rates(1, 9, 3, 200.0, 50.0));
        store
            .readings
            .push(reading(7, datetime!(2024-03-05 01:00:00 UTC), Some(1000.0), None));
        store
            .readings
            .push(reading(7, datetime!(2024-03-10 10:00:00 UTC), None, Some(600.0)));
        store
            .readings
            .push(reading(7, datetime!(2024-03-10 11:00:00 UTC), None, Some(500.0)));
        store
            .readings
            .push(reading(7, datetime!(2024-03-11 12:00:00 UTC), None, Some(400.0)));
        store.market_prices.push(MarketHourlyPrice {
            ts: datetime!(2024-03-01 11:00:00 UTC),
            price: 3.0,
        });
        BillingEngine::new(store)
    }

    #[tokio::test]
    async fn invoice_total_is_the_exact_sum_of_the_four_concepts() {
        let engine = engine_with_fixture();
        let invoice = engine.invoice(7, 2024, 3).await.unwrap();

        assert_eq!(invoice.ea.total, 200_000.0);
        assert_eq!(invoice.ec.total, 75_000.0);
        assert_eq!(invoice.ee1.total, -200_000.0);
        assert_eq!(invoice.ee2.total, 300.0);
        assert_eq!(
            invoice.total,
            invoice.ea.total + invoice.ec.total + invoice.ee1.total + invoice.ee2.total
        );
    }

    #[tokio::test]
    async fn invoice_aborts_when_the_tariff_is_missing() {
        let mut store = MemoryStore::default();
        store.services.push(crate::domain::Service {
            service_id: 1,
            market_id: 1,
            demand_class: 1,
            voltage_level: 1,
        });
        let engine = BillingEngine::new(store);

        let res = engine.invoice(1, 2024, 3).await;
        assert!(matches!(res, Err(BillingError::TariffNotFound { .. })));
    }

    #[tokio::test]
    async fn invoice_rejects_an_out_of_range_month() {
        let engine = engine_with_fixture();
        let res = engine.invoice(7, 2024, 13).await;
        assert!(matches!(res, Err(BillingError::InvalidCalendarInput(_))));
    }

    #[tokio::test]
    async fn concept_dispatch_matches_direct_calculation() {
        let engine = engine_with_fixture();
        let ea = engine.concept(Concept::Ea, 7, 2024, 3).await.unwrap();
        assert_eq!(ea.concept, Concept::Ea);
        assert_eq!(ea.total, 200_000.0);
    }

    #[tokio::test]
    async fn service_lookup_surfaces_customer_not_found() {
        let engine = BillingEngine::new(MemoryStore::default());
        let res = engine.service(123).await;
        assert!(matches!(res, Err(BillingError::CustomerNotFound(123))));
    }
}
