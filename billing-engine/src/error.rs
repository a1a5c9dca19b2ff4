/// Failure raised by a storage implementation. Opaque to the engine:
/// any store error surfaces as `BillingError::Computation` rather than
/// being swallowed.
#[derive(Debug, thiserror::Error)]
#[error("storage query failed: {0}")]
pub struct StoreError(pub String);

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        Self(e.to_string())
    }
}

impl From<anyhow::Error> for StoreError {
    fn from(e: anyhow::Error) -> Self {
        Self(e.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    #[error("invalid calendar input: {0}")]
    InvalidCalendarInput(String),
    #[error("client {0} not found")]
    CustomerNotFound(i64),
    #[error("no tariff for market {market_id}, voltage level {voltage_level}, demand class {demand_class:?}")]
    TariffNotFound {
        market_id: i64,
        voltage_level: i32,
        demand_class: Option<i32>,
    },
    #[error("billing computation failed: {0}")]
    Computation(#[from] StoreError),
}
