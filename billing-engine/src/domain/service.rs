use serde::Serialize;

/// A billed connection point. `demand_class` is the customer-declared
/// classification; it only participates in tariff lookup for voltage
/// levels outside {2, 3}.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Service {
    pub service_id: i64,
    pub market_id: i64,
    pub demand_class: i32,
    pub voltage_level: i32,
}
