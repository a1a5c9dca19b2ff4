use serde::Serialize;

/// One (year, month) aggregation row for a service, as grouped by the
/// store.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct MonthlyEnergy {
    pub year: i32,
    pub month: i32,
    pub consumption_kwh: f64,
    pub injection_kwh: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyStatistics {
    pub year: i32,
    pub month: i32,
    pub consumption_kwh: f64,
    pub injection_kwh: f64,
    pub net_kwh: f64,
}

/// Per-month history plus unweighted averages across the returned
/// months. All averages are 0 for an empty history.
#[derive(Debug, Clone, Serialize)]
pub struct ClientStatistics {
    pub service_id: i64,
    pub monthly: Vec<MonthlyStatistics>,
    pub average_consumption_kwh: f64,
    pub average_injection_kwh: f64,
    pub average_net_kwh: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HourlyLoad {
    pub hour: u8,
    pub load_kwh: f64,
}

/// System-wide consumption by hour for one calendar date.
#[derive(Debug, Clone, Serialize)]
pub struct SystemLoad {
    pub date: String,
    pub hourly: Vec<HourlyLoad>,
}
