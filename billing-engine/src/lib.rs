pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod store;

#[cfg(test)]
pub(crate) mod testkit;

pub use engine::BillingEngine;
pub use error::{BillingError, StoreError};
pub use store::{BillingStore, Metric, PgStore};
