use std::sync::Arc;

use tracing::debug;

use crate::{
    model::FeeQuery,
    rules::{FeeDecision, compute_fee},
    station,
    store::ObservationStore,
};

/// Expected outcomes of a fee query that do not produce a fee.
///
/// The messages are the ones returned to API clients.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeError {
    #[error("City not found")]
    CityUnknown,
    #[error("Weather data not available")]
    NoWeatherData,
    #[error("Usage of selected vehicle type is forbidden")]
    VehicleProhibited,
    #[error("Unknown vehicle type")]
    VehicleUnknown,
}

/// Answers fee queries from the observations currently in the store.
#[derive(Debug, Clone)]
pub struct FeeService {
    store: Arc<dyn ObservationStore>,
}

impl FeeService {
    pub fn new(store: Arc<dyn ObservationStore>) -> Self {
        Self { store }
    }

    /// Calculate the fee for a query.
    ///
    /// Without a timestamp the latest observation of the city's station is
    /// used; with one, only an observation at exactly that timestamp counts.
    pub fn get_fee(&self, query: &FeeQuery) -> Result<f64, FeeError> {
        let station = station::resolve(&query.city).ok_or(FeeError::CityUnknown)?;

        let observation = match query.timestamp {
            None => self.store.latest(station),
            Some(timestamp) => self.store.at_timestamp(station, timestamp),
        }
        .ok_or(FeeError::NoWeatherData)?;

        let decision = compute_fee(
            &query.city,
            &query.vehicle,
            observation.air_temperature,
            observation.wind_speed,
            &observation.phenomenon,
        );
        debug!(
            city = %query.city,
            vehicle = %query.vehicle,
            %station,
            timestamp = observation.timestamp,
            ?decision,
            "Fee calculated"
        );

        match decision {
            FeeDecision::Fee(fee) => Ok(fee),
            FeeDecision::Prohibited => Err(FeeError::VehicleProhibited),
            FeeDecision::InvalidInput => Err(FeeError::VehicleUnknown),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{Observation, StationId},
        store::InMemoryStore,
    };

    const T: i64 = 1_742_135_859;

    fn observation(station: StationId, timestamp: i64, temp: f64, wind: f64, phenomenon: &str) -> Observation {
        Observation {
            station,
            timestamp,
            air_temperature: temp,
            wind_speed: wind,
            phenomenon: phenomenon.into(),
            wmo_code: "00000".into(),
        }
    }

    fn service_with(observations: Vec<Observation>) -> FeeService {
        let store = Arc::new(InMemoryStore::new());
        for obs in observations {
            store.ingest(obs);
        }
        FeeService::new(store)
    }

    fn one_batch(timestamp: i64) -> Vec<Observation> {
        vec![
            observation(StationId::TallinnHarku, timestamp, -2.0, 4.0, "Light rain"),
            observation(StationId::TartuToravere, timestamp, -2.1, 4.7, "Light snow shower"),
            observation(StationId::Parnu, timestamp, 5.0, 22.0, "Clear"),
        ]
    }

    #[test]
    fn latest_and_exact_timestamp_agree() {
        let service = service_with(one_batch(T));

        let latest = service.get_fee(&FeeQuery::new("Tartu", "Car"));
        let exact = service.get_fee(&FeeQuery::new("Tartu", "Car").at(T));
        assert_eq!(latest, Ok(3.5));
        assert_eq!(exact, latest);
    }

    #[test]
    fn timestamp_off_by_one_has_no_weather_data() {
        let service = service_with(one_batch(T));

        assert_eq!(
            service.get_fee(&FeeQuery::new("Tartu", "Car").at(T - 1)),
            Err(FeeError::NoWeatherData)
        );
        assert_eq!(
            service.get_fee(&FeeQuery::new("Tartu", "Car").at(T + 1)),
            Err(FeeError::NoWeatherData)
        );
    }

    #[test]
    fn unknown_city_regardless_of_store() {
        assert_eq!(
            service_with(one_batch(T)).get_fee(&FeeQuery::new("Narva", "Car")),
            Err(FeeError::CityUnknown)
        );
        assert_eq!(
            service_with(Vec::new()).get_fee(&FeeQuery::new("Narva", "Car")),
            Err(FeeError::CityUnknown)
        );
    }

    #[test]
    fn empty_store_has_no_weather_data() {
        assert_eq!(
            service_with(Vec::new()).get_fee(&FeeQuery::new("Tallinn", "Car")),
            Err(FeeError::NoWeatherData)
        );
    }

    #[test]
    fn surcharges_come_from_the_station_observation() {
        let service = service_with(one_batch(T));

        assert_eq!(service.get_fee(&FeeQuery::new("Tartu", "Bike")), Ok(4.0));
        assert_eq!(service.get_fee(&FeeQuery::new("tallinn", "SCOOTER")), Ok(4.5));
    }

    #[test]
    fn weather_prohibition_is_reported() {
        let service = service_with(one_batch(T));

        assert_eq!(
            service.get_fee(&FeeQuery::new("Pärnu", "Bike")),
            Err(FeeError::VehicleProhibited)
        );
        assert_eq!(service.get_fee(&FeeQuery::new("Pärnu", "Scooter")), Ok(2.5));
    }

    #[test]
    fn unknown_vehicle_is_not_a_prohibition() {
        let service = service_with(one_batch(T));

        assert_eq!(
            service.get_fee(&FeeQuery::new("Tallinn", "Truck")),
            Err(FeeError::VehicleUnknown)
        );
    }

    #[test]
    fn historical_batches_stay_queryable() {
        let mut observations = one_batch(T);
        observations.push(observation(StationId::TartuToravere, T + 3_600, 12.0, 1.0, "Clear"));
        let service = service_with(observations);

        assert_eq!(service.get_fee(&FeeQuery::new("Tartu", "Bike")), Ok(2.5));
        assert_eq!(service.get_fee(&FeeQuery::new("Tartu", "Bike").at(T)), Ok(4.0));
    }
}
