//! Delivery fee rules: a base fee per city and vehicle plus weather surcharges.
//!
//! Three surcharges are added on top of the base fee:
//! - air temperature (ATEF), for scooters and bikes
//! - wind speed (WSEF), for bikes only
//! - weather phenomenon (WPEF), for scooters and bikes
//!
//! Strong wind and glaze, hail or thunder prohibit the vehicle outright. Cars
//! only ever pay the base fee.

use crate::model::{City, Vehicle, normalize};

/// Outcome of a fee calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeeDecision {
    /// Total fee in euros.
    Fee(f64),
    /// The weather forbids using the vehicle.
    Prohibited,
    /// City or vehicle is outside the priced sets.
    InvalidInput,
}

/// A single surcharge rule result.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Surcharge {
    Extra(f64),
    Prohibited,
}

const PROHIBITING_PHENOMENA: [&str; 3] = ["glaze", "hail", "thunder"];
const SNOW_PHENOMENA: [&str; 2] = ["snow", "sleet"];
const RAIN_PHENOMENON: &str = "rain";

/// Calculate the delivery fee from raw request and observation values.
///
/// Strings are trimmed and lower-cased before matching.
pub fn compute_fee(
    city: &str,
    vehicle: &str,
    air_temperature: f64,
    wind_speed: f64,
    phenomenon: &str,
) -> FeeDecision {
    let (Some(city), Some(vehicle)) = (City::parse(city), Vehicle::parse(vehicle)) else {
        return FeeDecision::InvalidInput;
    };

    let surcharges = [
        air_temperature_extra(vehicle, air_temperature),
        wind_speed_extra(vehicle, wind_speed),
        phenomenon_extra(vehicle, &normalize(phenomenon)),
    ];

    let mut total = base_fee(city, vehicle);
    for surcharge in surcharges {
        match surcharge {
            Surcharge::Extra(extra) => total += extra,
            Surcharge::Prohibited => return FeeDecision::Prohibited,
        }
    }
    FeeDecision::Fee(total)
}

/// Regional base fee.
pub fn base_fee(city: City, vehicle: Vehicle) -> f64 {
    match (city, vehicle) {
        (City::Tallinn, Vehicle::Car) => 4.0,
        (City::Tallinn, Vehicle::Scooter) => 3.5,
        (City::Tallinn, Vehicle::Bike) => 3.0,
        (City::Tartu, Vehicle::Car) => 3.5,
        (City::Tartu, Vehicle::Scooter) => 3.0,
        (City::Tartu, Vehicle::Bike) => 2.5,
        (City::Parnu, Vehicle::Car) => 3.0,
        (City::Parnu, Vehicle::Scooter) => 2.5,
        (City::Parnu, Vehicle::Bike) => 2.0,
    }
}

fn air_temperature_extra(vehicle: Vehicle, air_temperature: f64) -> Surcharge {
    if vehicle == Vehicle::Car {
        return Surcharge::Extra(0.0);
    }

    if air_temperature < -10.0 {
        Surcharge::Extra(1.0)
    } else if air_temperature <= 0.0 {
        Surcharge::Extra(0.5)
    } else {
        Surcharge::Extra(0.0)
    }
}

fn wind_speed_extra(vehicle: Vehicle, wind_speed: f64) -> Surcharge {
    if vehicle != Vehicle::Bike {
        return Surcharge::Extra(0.0);
    }

    if wind_speed > 20.0 {
        Surcharge::Prohibited
    } else if wind_speed >= 10.0 {
        Surcharge::Extra(0.5)
    } else {
        Surcharge::Extra(0.0)
    }
}

/// `phenomenon` must already be normalized.
fn phenomenon_extra(vehicle: Vehicle, phenomenon: &str) -> Surcharge {
    if vehicle == Vehicle::Car {
        return Surcharge::Extra(0.0);
    }

    let mentions = |words: &[&str]| words.iter().any(|word| phenomenon.contains(word));

    if mentions(&PROHIBITING_PHENOMENA) {
        Surcharge::Prohibited
    } else if mentions(&SNOW_PHENOMENA) {
        Surcharge::Extra(1.0)
    } else if phenomenon.contains(RAIN_PHENOMENON) {
        Surcharge::Extra(0.5)
    } else {
        Surcharge::Extra(0.0)
    }
}
