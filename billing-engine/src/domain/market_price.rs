use time::OffsetDateTime;

/// System-wide hourly market rate, one row per hour. Consulted only by
/// the second-tier excess calculation.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MarketHourlyPrice {
    pub ts: OffsetDateTime,
    pub price: f64,
}
