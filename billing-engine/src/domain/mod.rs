pub mod invoice;
pub mod market_price;
pub mod reading;
pub mod service;
pub mod statistics;
pub mod tariff;

pub use invoice::{Concept, ConceptLine, Invoice};
pub use market_price::MarketHourlyPrice;
pub use reading::Reading;
pub use service::Service;
pub use statistics::{ClientStatistics, HourlyLoad, MonthlyEnergy, MonthlyStatistics, SystemLoad};
pub use tariff::Tariff;
