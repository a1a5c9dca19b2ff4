use time::Date;

use crate::domain::{ClientStatistics, HourlyLoad, MonthlyStatistics, SystemLoad};
use crate::engine::calendar::day_window;
use crate::error::BillingError;
use crate::store::BillingStore;

/// Full reading history for one service grouped by month, with
/// unweighted averages across the returned months.
pub(crate) async fn client_statistics<S: BillingStore>(
    store: &S,
    service_id: i64,
) -> Result<ClientStatistics, BillingError> {
    let rows = store.monthly_energy(service_id).await?;

    let mut monthly = Vec::with_capacity(rows.len());
    let mut total_consumption = 0.0;
    let mut total_injection = 0.0;

    for row in &rows {
        let net = row.consumption_kwh - row.injection_kwh;
        total_consumption += row.consumption_kwh;
        total_injection += row.injection_kwh;
        monthly.push(MonthlyStatistics {
            year: row.year,
            month: row.month,
            consumption_kwh: row.consumption_kwh,
            injection_kwh: row.injection_kwh,
            net_kwh: net,
        });
    }

    let months = monthly.len() as f64;
    let (average_consumption_kwh, average_injection_kwh, average_net_kwh) = if monthly.is_empty() {
        (0.0, 0.0, 0.0)
    } else {
        (
            total_consumption / months,
            total_injection / months,
            (total_consumption - total_injection) / months,
        )
    };

    Ok(ClientStatistics {
        service_id,
        monthly,
        average_consumption_kwh,
        average_injection_kwh,
        average_net_kwh,
    })
}

/// System-wide consumption per hour for one calendar date, across all
/// services and independent of any tariff.
pub(crate) async fn system_load<S: BillingStore>(
    store: &S,
    date: Date,
) -> Result<SystemLoad, BillingError> {
    let (start, end) = day_window(date);
    let by_hour = store.system_consumption_by_hour(start, end).await?;

    let hourly = by_hour
        .into_iter()
        .map(|(hour, load_kwh)| HourlyLoad { hour, load_kwh })
        .collect();

    Ok(SystemLoad {
        date: date.to_string(),
        hourly,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{reading, MemoryStore};
    use time::macros::{date, datetime};

    #[tokio::test]
    async fn statistics_group_history_by_month_with_net() {
        let mut store = MemoryStore::default();
        store
            .readings
            .push(reading(1, datetime!(2024-01-10 06:00:00 UTC), Some(100.0), Some(40.0)));
        store
            .readings
            .push(reading(1, datetime!(2024-01-20 18:00:00 UTC), Some(50.0), None));
        store
            .readings
            .push(reading(1, datetime!(2024-02-02 12:00:00 UTC), Some(30.0), Some(90.0)));
        // Another service's readings never leak in.
        store
            .readings
            .push(reading(2, datetime!(2024-01-05 09:00:00 UTC), Some(999.0), None));

        let stats = client_statistics(&store, 1).await.unwrap();

        assert_eq!(stats.monthly.len(), 2);
        let january = &stats.monthly[0];
        assert_eq!((january.year, january.month), (2024, 1));
        assert_eq!(january.consumption_kwh, 150.0);
        assert_eq!(january.injection_kwh, 40.0);
        assert_eq!(january.net_kwh, 110.0);

        let february = &stats.monthly[1];
        assert_eq!(february.net_kwh, -60.0);

        assert_eq!(stats.average_consumption_kwh, 90.0);
        assert_eq!(stats.average_injection_kwh, 65.0);
        assert_eq!(stats.average_net_kwh, 25.0);
    }

    #[tokio::test]
    async fn empty_history_yields_zero_averages() {
        let store = MemoryStore::default();
        let stats = client_statistics(&store, 42).await.unwrap();

        assert!(stats.monthly.is_empty());
        assert_eq!(stats.average_consumption_kwh, 0.0);
        assert_eq!(stats.average_injection_kwh, 0.0);
        assert_eq!(stats.average_net_kwh, 0.0);
    }

    #[tokio::test]
    async fn system_load_sums_all_services_within_the_date() {
        let mut store = MemoryStore::default();
        store
            .readings
            .push(reading(1, datetime!(2024-06-15 08:00:00 UTC), Some(10.0), None));
        store
            .readings
            .push(reading(2, datetime!(2024-06-15 08:30:00 UTC), Some(5.0), Some(2.0)));
        store
            .readings
            .push(reading(1, datetime!(2024-06-15 20:00:00 UTC), Some(7.0), None));
        // Outside the date.
        store
            .readings
            .push(reading(1, datetime!(2024-06-16 08:00:00 UTC), Some(100.0), None));

        let load = system_load(&store, date!(2024-06-15)).await.unwrap();

        assert_eq!(load.date, "2024-06-15");
        assert_eq!(load.hourly.len(), 2);
        assert_eq!((load.hourly[0].hour, load.hourly[0].load_kwh), (8, 15.0));
        assert_eq!((load.hourly[1].hour, load.hourly[1].load_kwh), (20, 7.0));
    }
}
