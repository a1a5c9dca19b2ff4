use std::collections::BTreeMap;

use crate::domain::{Concept, ConceptLine, Service, Tariff};
use crate::engine::calendar::{market_hour_slot, month_window};
use crate::error::BillingError;
use crate::store::{BillingStore, Metric};

/// Voltage levels billed without demand-class discrimination.
const WILDCARD_VOLTAGE_LEVELS: [i32; 2] = [2, 3];

pub(crate) async fn require_service<S: BillingStore>(
    store: &S,
    service_id: i64,
) -> Result<Service, BillingError> {
    store
        .find_service(service_id)
        .await?
        .ok_or(BillingError::CustomerNotFound(service_id))
}

/// Resolve the single tariff row applicable to a service. Levels 2 and
/// 3 ignore the declared demand class; every other level requires an
/// exact match on it.
pub(crate) async fn resolve_tariff<S: BillingStore>(
    store: &S,
    service: &Service,
) -> Result<Tariff, BillingError> {
    let demand_class = if WILDCARD_VOLTAGE_LEVELS.contains(&service.voltage_level) {
        None
    } else {
        Some(service.demand_class)
    };

    store
        .find_tariff(service.market_id, service.voltage_level, demand_class)
        .await?
        .ok_or(BillingError::TariffNotFound {
            market_id: service.market_id,
            voltage_level: service.voltage_level,
            demand_class,
        })
}

/// EA: monthly consumption billed at the tariff's CU rate.
pub(crate) async fn active_energy<S: BillingStore>(
    store: &S,
    service_id: i64,
    year: i32,
    month: u8,
) -> Result<ConceptLine, BillingError> {
    let (start, end) = month_window(year, month)?;
    let service = require_service(store, service_id).await?;

    let quantity = store
        .sum_metric(service_id, Metric::Consumption, start, end)
        .await?;
    let tariff = resolve_tariff(store, &service).await?;

    let rate = tariff.unit_commercialization_rate;
    Ok(ConceptLine {
        concept: Concept::Ea,
        quantity,
        rate,
        total: quantity * rate,
    })
}

/// EC: monthly injection billed at the tariff's C rate.
pub(crate) async fn excess_commercialization<S: BillingStore>(
    store: &S,
    service_id: i64,
    year: i32,
    month: u8,
) -> Result<ConceptLine, BillingError> {
    let (start, end) = month_window(year, month)?;
    let service = require_service(store, service_id).await?;

    let quantity = store
        .sum_metric(service_id, Metric::Injection, start, end)
        .await?;
    let tariff = resolve_tariff(store, &service).await?;

    let rate = tariff.excess_commercialization_rate;
    Ok(ConceptLine {
        concept: Concept::Ec,
        quantity,
        rate,
        total: quantity * rate,
    })
}

/// EE1: the injection directly offset by the customer's own
/// consumption, credited at the negative of the CU rate.
pub(crate) async fn first_tier_excess<S: BillingStore>(
    store: &S,
    service_id: i64,
    year: i32,
    month: u8,
) -> Result<ConceptLine, BillingError> {
    let (start, end) = month_window(year, month)?;
    let service = require_service(store, service_id).await?;

    let consumption = store
        .sum_metric(service_id, Metric::Consumption, start, end)
        .await?;
    let injection = store
        .sum_metric(service_id, Metric::Injection, start, end)
        .await?;
    let tariff = resolve_tariff(store, &service).await?;

    let quantity = injection.min(consumption);
    let rate = -tariff.unit_commercialization_rate;
    Ok(ConceptLine {
        concept: Concept::Ee1,
        quantity,
        rate,
        total: quantity * rate,
    })
}

/// EE2: injection beyond total monthly consumption, priced hour by
/// hour at the system market rate instead of the customer's tariff.
///
/// The reported quantity is the full monthly surplus. When sparse
/// hourly data leaves part of it unallocated the reported rate
/// (total / quantity) reflects only the priced portion; that
/// divergence is deliberate and kept as-is.
pub(crate) async fn second_tier_excess<S: BillingStore>(
    store: &S,
    service_id: i64,
    year: i32,
    month: u8,
) -> Result<ConceptLine, BillingError> {
    let (start, end) = month_window(year, month)?;

    let consumption = store
        .sum_metric(service_id, Metric::Consumption, start, end)
        .await?;
    let injection = store
        .sum_metric(service_id, Metric::Injection, start, end)
        .await?;

    if injection <= consumption {
        return Ok(ConceptLine {
            concept: Concept::Ee2,
            quantity: 0.0,
            rate: 0.0,
            total: 0.0,
        });
    }

    let excess_target = injection - consumption;

    let injection_by_hour = store
        .bucket_metric_by_hour(service_id, Metric::Injection, start, end)
        .await?;
    let allocation = allocate_hourly_excess(&injection_by_hour, consumption);

    let mut total = 0.0;
    for (hour, excess) in allocation {
        let (slot_start, slot_end) = market_hour_slot(year, month, hour)?;
        // Missing market data degrades to a zero rate for the hour.
        let rate = store
            .market_hourly_price(slot_start, slot_end)
            .await?
            .unwrap_or(0.0);
        total += excess * rate;
    }

    let rate = if excess_target > 0.0 {
        total / excess_target
    } else {
        0.0
    };

    Ok(ConceptLine {
        concept: Concept::Ee2,
        quantity: excess_target,
        rate,
        total,
    })
}

/// Walk injection hour buckets in ascending hour-of-day order,
/// attributing surplus to hours once accumulated injection crosses a
/// running consumption threshold. The threshold advances by exactly
/// each recorded excess, so no surplus quantity is counted twice and
/// no hour is ever assigned more than its own injection.
pub(crate) fn allocate_hourly_excess(
    injection_by_hour: &BTreeMap<u8, f64>,
    total_consumption: f64,
) -> Vec<(u8, f64)> {
    let mut allocated = Vec::new();
    let mut accumulated_injection = 0.0;
    let mut consumption_threshold = total_consumption;

    for (&hour, &hour_injection) in injection_by_hour {
        accumulated_injection += hour_injection;

        if accumulated_injection > consumption_threshold {
            let excess = hour_injection.min(accumulated_injection - consumption_threshold);
            if excess > 0.0 {
                allocated.push((hour, excess));
                consumption_threshold += excess;
            }
        }
    }

    allocated
}
