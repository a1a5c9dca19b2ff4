use serde::Deserialize;
use time::OffsetDateTime;

/// One metered instant for one service. Consumption and injection are
/// independent measurements; either, both, or neither may be present.
#[derive(Debug, Clone, sqlx::FromRow, Deserialize)]
pub struct Reading {
    pub ts: OffsetDateTime,
    pub service_id: i64,
    pub consumption_kwh: Option<f64>,
    pub injection_kwh: Option<f64>,
}
