use crate::model::{City, StationId};

/// Map a city name to the station that observes its weather.
///
/// The name is trimmed and lower-cased first; unknown cities yield `None`.
pub fn resolve(city: &str) -> Option<StationId> {
    City::parse(city).map(City::station)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_cities() {
        assert_eq!(resolve("tallinn"), Some(StationId::TallinnHarku));
        assert_eq!(resolve("tartu"), Some(StationId::TartuToravere));
        assert_eq!(resolve("pärnu"), Some(StationId::Parnu));
    }

    #[test]
    fn resolve_normalizes_input() {
        assert_eq!(resolve(" Tartu "), Some(StationId::TartuToravere));
        assert_eq!(resolve("PÄRNU"), Some(StationId::Parnu));
    }

    #[test]
    fn unknown_city_is_a_miss() {
        assert_eq!(resolve("Narva"), None);
        assert_eq!(resolve(""), None);
        assert_eq!(resolve("Tallinn-Harku"), None);
    }
}
