use std::collections::BTreeMap;

use anyhow::Result;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::domain::{MonthlyEnergy, Service, Tariff};
use crate::store::Metric;

/// Fetch a single service row by id.
pub async fn find_service(pool: &PgPool, service_id: i64) -> Result<Option<Service>> {
    let row = sqlx::query_as::<_, Service>(
        r#"
        SELECT service_id, market_id, demand_class, voltage_level
        FROM services
        WHERE service_id = $1
        "#,
    )
    .bind(service_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Fetch the tariff row for a (market, voltage level) pair. A `None`
/// demand class omits that predicate entirely; the composite primary
/// key makes exact lookups unique, and the ORDER BY keeps wildcard
/// lookups deterministic should a data set carry several rows.
pub async fn find_tariff(
    pool: &PgPool,
    market_id: i64,
    voltage_level: i32,
    demand_class: Option<i32>,
) -> Result<Option<Tariff>> {
    let base = r#"
        SELECT market_id, demand_class, voltage_level,
               generation_rate, transmission_rate, distribution_rate,
               retail_margin, excess_commercialization_rate,
               excess_penalty_rate, unit_commercialization_rate
        FROM tariffs
        WHERE market_id = $1
          AND voltage_level = $2
    "#;

    let row = match demand_class {
        Some(dc) => {
            let sql = format!("{base} AND demand_class = $3 ORDER BY demand_class LIMIT 1");
            sqlx::query_as::<_, Tariff>(&sql)
                .bind(market_id)
                .bind(voltage_level)
                .bind(dc)
                .fetch_optional(pool)
                .await?
        }
        None => {
            let sql = format!("{base} ORDER BY demand_class LIMIT 1");
            sqlx::query_as::<_, Tariff>(&sql)
                .bind(market_id)
                .bind(voltage_level)
                .fetch_optional(pool)
                .await?
        }
    };

    Ok(row)
}

/// Sum one metric for a service over an inclusive window. NULL cells
/// are skipped by SUM; a service with no matching rows sums to 0.
pub async fn sum_metric(
    pool: &PgPool,
    service_id: i64,
    metric: Metric,
    start: OffsetDateTime,
    end: OffsetDateTime,
) -> Result<f64> {
    let sql = format!(
        r#"
        SELECT COALESCE(SUM({col}), 0)
        FROM readings
        WHERE service_id = $1
          AND ts >= $2
          AND ts <= $3
        "#,
        col = metric.column(),
    );

    let total: f64 = sqlx::query_scalar(&sql)
        .bind(service_id)
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await?;

    Ok(total)
}

/// Sum one metric per hour-of-day over an inclusive window, collapsing
/// hours across dates.
pub async fn bucket_metric_by_hour(
    pool: &PgPool,
    service_id: i64,
    metric: Metric,
    start: OffsetDateTime,
    end: OffsetDateTime,
) -> Result<BTreeMap<u8, f64>> {
    let sql = format!(
        r#"
        SELECT CAST(EXTRACT(HOUR FROM ts AT TIME ZONE 'UTC') AS INT4) AS hour,
               SUM({col}) AS total
        FROM readings
        WHERE service_id = $1
          AND ts >= $2
          AND ts <= $3
          AND {col} IS NOT NULL
        GROUP BY 1
        ORDER BY 1
        "#,
        col = metric.column(),
    );

    let rows: Vec<(i32, f64)> = sqlx::query_as(&sql)
        .bind(service_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|(h, v)| (h as u8, v)).collect())
}

/// Look up the system market price whose timestamp falls in the
/// half-open slot [slot_start, slot_end).
pub async fn market_hourly_price(
    pool: &PgPool,
    slot_start: OffsetDateTime,
    slot_end: OffsetDateTime,
) -> Result<Option<f64>> {
    let price: Option<f64> = sqlx::query_scalar(
        r#"
        SELECT price
        FROM market_hourly_prices
        WHERE ts >= $1
          AND ts <  $2
        ORDER BY ts
        LIMIT 1
        "#,
    )
    .bind(slot_start)
    .bind(slot_end)
    .fetch_optional(pool)
    .await?;

    Ok(price)
}

/// Group a service's readings by (year, month), summing both metrics.
pub async fn monthly_energy(pool: &PgPool, service_id: i64) -> Result<Vec<MonthlyEnergy>> {
    let rows = sqlx::query_as::<_, MonthlyEnergy>(
        r#"
        SELECT CAST(EXTRACT(YEAR FROM ts AT TIME ZONE 'UTC') AS INT4) AS year,
               CAST(EXTRACT(MONTH FROM ts AT TIME ZONE 'UTC') AS INT4) AS month,
               COALESCE(SUM(consumption_kwh), 0) AS consumption_kwh,
               COALESCE(SUM(injection_kwh), 0) AS injection_kwh
        FROM readings
        WHERE service_id = $1
        GROUP BY 1, 2
        ORDER BY 1, 2
        "#,
    )
    .bind(service_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Sum consumption per hour across every service within an inclusive
/// window (one calendar date for the system-load query).
pub async fn system_consumption_by_hour(
    pool: &PgPool,
    start: OffsetDateTime,
    end: OffsetDateTime,
) -> Result<BTreeMap<u8, f64>> {
    let rows: Vec<(i32, f64)> = sqlx::query_as(
        r#"
        SELECT CAST(EXTRACT(HOUR FROM ts AT TIME ZONE 'UTC') AS INT4) AS hour,
               SUM(consumption_kwh) AS total
        FROM readings
        WHERE ts >= $1
          AND ts <= $2
          AND consumption_kwh IS NOT NULL
        GROUP BY 1
        ORDER BY 1
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(h, v)| (h as u8, v)).collect())
}
