//! One-shot CSV seed loader.
//!
//! Reads `services.csv`, `tariffs.csv`, `readings.csv` and
//! `market_prices.csv` from a directory and inserts them into
//! Postgres in batches. Schema is expected to be applied out-of-band
//! via `sql/schema/*.sql`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use billing_engine::domain::{MarketHourlyPrice, Reading, Service, Tariff};
use billing_service::{config::AppConfig, observability};
use csv::StringRecord;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;

const INSERT_CHUNK: usize = 500;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        bail!("usage: load_seed_data <csv_directory>");
    }
    let dir = PathBuf::from(&args[1]);

    let cfg = AppConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(cfg.database.max_connections)
        .connect(&cfg.database.uri)
        .await?;

    load_services(&pool, &dir.join("services.csv")).await?;
    load_tariffs(&pool, &dir.join("tariffs.csv")).await?;
    load_readings(&pool, &dir.join("readings.csv")).await?;
    load_market_prices(&pool, &dir.join("market_prices.csv")).await?;

    Ok(())
}

fn field<'a>(headers: &StringRecord, record: &'a StringRecord, name: &str) -> Result<&'a str> {
    headers
        .iter()
        .position(|h| h == name)
        .and_then(|idx| record.get(idx))
        .with_context(|| format!("missing column '{name}' in CSV record"))
}

fn parse_optional_f64(s: &str) -> Result<Option<f64>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        trimmed
            .parse::<f64>()
            .map(Some)
            .with_context(|| format!("invalid numeric value '{trimmed}'"))
    }
}

fn parse_f64(s: &str) -> Result<f64> {
    s.trim()
        .parse()
        .with_context(|| format!("invalid numeric value '{s}'"))
}

fn parse_ts(s: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(s.trim(), &time::format_description::well_known::Rfc3339)
        .with_context(|| format!("invalid ts '{s}'"))
}

fn read_records(path: &Path) -> Result<(StringRecord, Vec<StringRecord>)> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open CSV file {}", path.display()))?;
    let headers = rdr.headers()?.clone();
    let records = rdr.records().collect::<Result<Vec<_>, _>>()?;
    Ok((headers, records))
}

async fn load_services(pool: &PgPool, path: &Path) -> Result<()> {
    let (headers, records) = read_records(path)?;

    let mut rows = Vec::with_capacity(records.len());
    for record in &records {
        rows.push(Service {
            service_id: field(&headers, record, "service_id")?.trim().parse()?,
            market_id: field(&headers, record, "market_id")?.trim().parse()?,
            demand_class: field(&headers, record, "demand_class")?.trim().parse()?,
            voltage_level: field(&headers, record, "voltage_level")?.trim().parse()?,
        });
    }

    for chunk in rows.chunks(INSERT_CHUNK) {
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO services (service_id, market_id, demand_class, voltage_level) ",
        );
        builder.push_values(chunk, |mut b, s| {
            b.push_bind(s.service_id)
                .push_bind(s.market_id)
                .push_bind(s.demand_class)
                .push_bind(s.voltage_level);
        });
        builder.build().execute(pool).await?;
    }

    metrics::counter!("seed_rows_loaded_total").increment(rows.len() as u64);
    tracing::info!(rows = rows.len(), "services loaded");
    Ok(())
}

async fn load_tariffs(pool: &PgPool, path: &Path) -> Result<()> {
    let (headers, records) = read_records(path)?;

    let mut rows = Vec::with_capacity(records.len());
    for record in &records {
        // An empty demand-class cell marks a wildcard-level row; it is
        // keyed as class 0.
        let demand_class = match field(&headers, record, "demand_class")?.trim() {
            "" => 0,
            s => s.parse()?,
        };

        rows.push(Tariff {
            market_id: field(&headers, record, "market_id")?.trim().parse()?,
            demand_class,
            voltage_level: field(&headers, record, "voltage_level")?.trim().parse()?,
            generation_rate: parse_f64(field(&headers, record, "generation_rate")?)?,
            transmission_rate: parse_f64(field(&headers, record, "transmission_rate")?)?,
            distribution_rate: parse_f64(field(&headers, record, "distribution_rate")?)?,
            retail_margin: parse_f64(field(&headers, record, "retail_margin")?)?,
            excess_commercialization_rate: parse_f64(field(
                &headers,
                record,
                "excess_commercialization_rate",
            )?)?,
            excess_penalty_rate: parse_f64(field(&headers, record, "excess_penalty_rate")?)?,
            unit_commercialization_rate: parse_f64(field(
                &headers,
                record,
                "unit_commercialization_rate",
            )?)?,
        });
    }

    for chunk in rows.chunks(INSERT_CHUNK) {
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO tariffs (market_id, demand_class, voltage_level, generation_rate, \
             transmission_rate, distribution_rate, retail_margin, \
             excess_commercialization_rate, excess_penalty_rate, unit_commercialization_rate) ",
        );
        builder.push_values(chunk, |mut b, t| {
            b.push_bind(t.market_id)
                .push_bind(t.demand_class)
                .push_bind(t.voltage_level)
                .push_bind(t.generation_rate)
                .push_bind(t.transmission_rate)
                .push_bind(t.distribution_rate)
                .push_bind(t.retail_margin)
                .push_bind(t.excess_commercialization_rate)
                .push_bind(t.excess_penalty_rate)
                .push_bind(t.unit_commercialization_rate);
        });
        builder.build().execute(pool).await?;
    }

    metrics::counter!("seed_rows_loaded_total").increment(rows.len() as u64);
    tracing::info!(rows = rows.len(), "tariffs loaded");
    Ok(())
}

async fn load_readings(pool: &PgPool, path: &Path) -> Result<()> {
    let (headers, records) = read_records(path)?;

    let mut rows = Vec::with_capacity(records.len());
    for record in &records {
        rows.push(Reading {
            ts: parse_ts(field(&headers, record, "ts")?)?,
            service_id: field(&headers, record, "service_id")?.trim().parse()?,
            consumption_kwh: parse_optional_f64(field(&headers, record, "consumption_kwh")?)?,
            injection_kwh: parse_optional_f64(field(&headers, record, "injection_kwh")?)?,
        });
    }

    for chunk in rows.chunks(INSERT_CHUNK) {
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO readings (ts, service_id, consumption_kwh, injection_kwh) ",
        );
        builder.push_values(chunk, |mut b, r| {
            b.push_bind(r.ts)
                .push_bind(r.service_id)
                .push_bind(r.consumption_kwh)
                .push_bind(r.injection_kwh);
        });
        builder.build().execute(pool).await?;
    }

    metrics::counter!("seed_rows_loaded_total").increment(rows.len() as u64);
    tracing::info!(rows = rows.len(), "readings loaded");
    Ok(())
}

async fn load_market_prices(pool: &PgPool, path: &Path) -> Result<()> {
    let (headers, records) = read_records(path)?;

    let mut rows = Vec::with_capacity(records.len());
    for record in &records {
        rows.push(MarketHourlyPrice {
            ts: parse_ts(field(&headers, record, "ts")?)?,
            price: parse_f64(field(&headers, record, "price")?)?,
        });
    }

    for chunk in rows.chunks(INSERT_CHUNK) {
        let mut builder =
            QueryBuilder::<Postgres>::new("INSERT INTO market_hourly_prices (ts, price) ");
        builder.push_values(chunk, |mut b, p| {
            b.push_bind(p.ts).push_bind(p.price);
        });
        builder.build().execute(pool).await?;
    }

    metrics::counter!("seed_rows_loaded_total").increment(rows.len() as u64);
    tracing::info!(rows = rows.len(), "market prices loaded");
    Ok(())
}
