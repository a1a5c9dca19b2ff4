use serde::Serialize;

/// One tariff schedule row, keyed by (market, demand class, voltage
/// level). At most one row exists per key.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Tariff {
    pub market_id: i64,
    pub demand_class: i32,
    pub voltage_level: i32,
    pub generation_rate: f64,
    pub transmission_rate: f64,
    pub distribution_rate: f64,
    pub retail_margin: f64,
    /// C: rate applied to commercialized excess (EC).
    pub excess_commercialization_rate: f64,
    /// P: penalty-related rate component.
    pub excess_penalty_rate: f64,
    /// CU: unit commercialization rate (EA charge, EE1 credit).
    pub unit_commercialization_rate: f64,
}
