use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

/// Lower-case and trim a user supplied name before matching it.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Weather stations whose observations are imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StationId {
    #[serde(rename = "Tallinn-Harku")]
    TallinnHarku,
    #[serde(rename = "Tartu-Tõravere")]
    TartuToravere,
    #[serde(rename = "Pärnu")]
    Parnu,
}

impl StationId {
    /// Station name exactly as it appears in the upstream feed.
    pub fn as_str(&self) -> &'static str {
        match self {
            StationId::TallinnHarku => "Tallinn-Harku",
            StationId::TartuToravere => "Tartu-Tõravere",
            StationId::Parnu => "Pärnu",
        }
    }

    pub const fn all() -> &'static [StationId] {
        &[StationId::TallinnHarku, StationId::TartuToravere, StationId::Parnu]
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Feed names are matched exactly; anything else is not on the allow-list.
impl TryFrom<&str> for StationId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        StationId::all()
            .iter()
            .copied()
            .find(|station| station.as_str() == value)
            .ok_or_else(|| anyhow::anyhow!("Station '{value}' is not on the import allow-list"))
    }
}

/// Cities where deliveries are priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum City {
    Tallinn,
    Tartu,
    Parnu,
}

impl City {
    /// Parse a city name, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<City> {
        match normalize(value).as_str() {
            "tallinn" => Some(City::Tallinn),
            "tartu" => Some(City::Tartu),
            "pärnu" => Some(City::Parnu),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            City::Tallinn => "tallinn",
            City::Tartu => "tartu",
            City::Parnu => "pärnu",
        }
    }

    /// The weather station that reports conditions for this city.
    pub fn station(self) -> StationId {
        match self {
            City::Tallinn => StationId::TallinnHarku,
            City::Tartu => StationId::TartuToravere,
            City::Parnu => StationId::Parnu,
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vehicle types a courier can deliver with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vehicle {
    Car,
    Scooter,
    Bike,
}

impl Vehicle {
    /// Parse a vehicle type, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Vehicle> {
        match normalize(value).as_str() {
            "car" => Some(Vehicle::Car),
            "scooter" => Some(Vehicle::Scooter),
            "bike" => Some(Vehicle::Bike),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Vehicle::Car => "car",
            Vehicle::Scooter => "scooter",
            Vehicle::Bike => "bike",
        }
    }
}

impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One weather snapshot reported by one station at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub station: StationId,
    /// Seconds since epoch, shared by every station of one feed snapshot.
    pub timestamp: i64,
    pub air_temperature: f64,
    pub wind_speed: f64,
    /// Free-text description; empty means no phenomenon was reported.
    pub phenomenon: String,
    pub wmo_code: String,
}

impl Observation {
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}

/// A fee lookup for a city and vehicle, optionally pinned to a feed timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeQuery {
    pub city: String,
    pub vehicle: String,
    /// `None` means the latest observation is used.
    pub timestamp: Option<i64>,
}

impl FeeQuery {
    pub fn new(city: impl Into<String>, vehicle: impl Into<String>) -> Self {
        Self { city: city.into(), vehicle: vehicle.into(), timestamp: None }
    }

    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn station_id_as_str_roundtrip() {
        for id in StationId::all() {
            let parsed = StationId::try_from(id.as_str()).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn station_names_are_matched_exactly() {
        let err = StationId::try_from("tallinn-harku").unwrap_err();
        assert!(err.to_string().contains("not on the import allow-list"));
        assert!(StationId::try_from("Kuressaare linn").is_err());
    }

    #[test]
    fn city_and_vehicle_parsing_ignores_case_and_whitespace() {
        assert_eq!(City::parse("  TaLLinn "), Some(City::Tallinn));
        assert_eq!(City::parse("PÄRNU"), Some(City::Parnu));
        assert_eq!(City::parse("Narva"), None);
        assert_eq!(Vehicle::parse("ScOOter"), Some(Vehicle::Scooter));
        assert_eq!(Vehicle::parse("\tbike\n"), Some(Vehicle::Bike));
        assert_eq!(Vehicle::parse("truck"), None);
    }

    #[test]
    fn station_serializes_with_feed_name() {
        let json = serde_json::to_string(&StationId::TartuToravere).unwrap();
        assert_eq!(json, "\"Tartu-Tõravere\"");
    }

    #[test]
    fn observed_at_converts_epoch_seconds() {
        let obs = Observation {
            station: StationId::Parnu,
            timestamp: 1_742_135_859,
            air_temperature: 1.1,
            wind_speed: 2.0,
            phenomenon: "Clear".into(),
            wmo_code: "41803".into(),
        };
        let at = obs.observed_at().expect("valid timestamp");
        assert_eq!(at.timestamp(), 1_742_135_859);
    }

    #[test]
    fn fee_query_builder_sets_timestamp() {
        let query = FeeQuery::new("Tartu", "Car").at(42);
        assert_eq!(query.timestamp, Some(42));
        assert_eq!(FeeQuery::new("Tartu", "Car").timestamp, None);
    }
}
