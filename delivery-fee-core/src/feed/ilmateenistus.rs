use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};
use xmltree::{Element, XMLNode};

use crate::model::{Observation, StationId};

use super::{FeedError, FeedSnapshot, ObservationFeed};

pub const DEFAULT_FEED_URL: &str = "https://www.ilmateenistus.ee/ilma_andmed/xml/observations.php";

/// Observations published by the Estonian Environment Agency.
#[derive(Debug, Clone)]
pub struct IlmateenistusFeed {
    url: String,
    http: Client,
}

impl IlmateenistusFeed {
    pub fn new(url: String, timeout: Duration) -> Result<Self, FeedError> {
        let http = Client::builder()
            .user_agent(concat!("delivery-fee/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { url, http })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ObservationFeed for IlmateenistusFeed {
    async fn fetch(&self) -> Result<FeedSnapshot, FeedError> {
        debug!(url = %self.url, "Fetching observations feed");

        let res = self.http.get(&self.url).send().await?;
        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FeedError::Status { status: status.as_u16(), body: truncate_body(&body) });
        }

        parse_observations(&body)
    }
}

/// Decode an `<observations timestamp="...">` document, keeping only the
/// allow-listed stations.
///
/// A malformed reading on an allow-listed station fails the whole snapshot so
/// that a run is either imported completely or not at all.
pub fn parse_observations(xml: &str) -> Result<FeedSnapshot, FeedError> {
    let root = Element::parse(xml.as_bytes())?;

    let raw_timestamp = root.attributes.get("timestamp").ok_or(FeedError::MissingTimestamp)?;
    let timestamp = raw_timestamp
        .trim()
        .parse::<i64>()
        .map_err(|_| FeedError::InvalidTimestamp(raw_timestamp.clone()))?;

    let mut observations = Vec::new();
    for node in &root.children {
        let XMLNode::Element(station) = node else { continue };
        if station.name != "station" {
            continue;
        }

        let name = child_text(station, "name");
        let Ok(station_id) = StationId::try_from(name.as_str()) else {
            continue;
        };

        observations.push(Observation {
            station: station_id,
            timestamp,
            air_temperature: number(station, station_id, "airtemperature")?,
            wind_speed: wind_speed(station, station_id)?,
            phenomenon: child_text(station, "phenomenon"),
            wmo_code: child_text(station, "wmocode"),
        });
    }

    for station in StationId::all() {
        if !observations.iter().any(|obs| obs.station == *station) {
            warn!(%station, timestamp, "Station missing from observations feed");
        }
    }

    Ok(FeedSnapshot { timestamp, observations })
}

/// Trimmed text of a child element; empty when the child is absent.
fn child_text(element: &Element, tag: &str) -> String {
    element
        .get_child(tag)
        .and_then(Element::get_text)
        .map(|text| text.trim().to_owned())
        .unwrap_or_default()
}

fn number(element: &Element, station: StationId, field: &'static str) -> Result<f64, FeedError> {
    let value = child_text(element, field);
    value.parse::<f64>().ok().filter(|v| v.is_finite()).ok_or_else(|| FeedError::InvalidField {
        station: station.to_string(),
        field,
        value,
    })
}

fn wind_speed(element: &Element, station: StationId) -> Result<f64, FeedError> {
    let speed = number(element, station, "windspeed")?;
    if speed < 0.0 {
        return Err(FeedError::InvalidField {
            station: station.to_string(),
            field: "windspeed",
            value: child_text(element, "windspeed"),
        });
    }
    Ok(speed)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station_xml(name: &str, wmo: &str, temp: &str, wind: &str, phenomenon: &str) -> String {
        format!(
            "<station>\n\
             <name>{name}</name>\n\
             <wmocode>{wmo}</wmocode>\n\
             <longitude>24.602891666624284</longitude>\n\
             <latitude>59.398122222355134</latitude>\n\
             <phenomenon>{phenomenon}</phenomenon>\n\
             <visibility>35.0</visibility>\n\
             <airtemperature>{temp}</airtemperature>\n\
             <windspeed>{wind}</windspeed>\n\
             <waterlevel/>\n\
             </station>"
        )
    }

    fn document(timestamp: &str, stations: &[String]) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<observations timestamp=\"{timestamp}\">{}</observations>",
            stations.concat()
        )
    }

    #[test]
    fn parses_allow_listed_station() {
        let xml = document(
            "1742135859",
            &[station_xml("Tallinn-Harku", "26038", "1.1", "2", "Clear")],
        );

        let snapshot = parse_observations(&xml).expect("valid feed");
        assert_eq!(snapshot.timestamp, 1_742_135_859);
        assert_eq!(
            snapshot.observations,
            vec![Observation {
                station: StationId::TallinnHarku,
                timestamp: 1_742_135_859,
                air_temperature: 1.1,
                wind_speed: 2.0,
                phenomenon: "Clear".into(),
                wmo_code: "26038".into(),
            }]
        );
    }

    #[test]
    fn keeps_only_allow_listed_stations_with_shared_timestamp() {
        let xml = document(
            "1700000000",
            &[
                station_xml("Kuressaare linn", "", "3.0", "1.0", ""),
                station_xml("Tartu-Tõravere", "26242", "-2.1", "4.7", "Light snow shower"),
                station_xml("Pärnu", "41803", "-0.5", "12.3", "Light sleet"),
                station_xml("Tallinn-Harku", "26038", "-1.0", "5.0", ""),
                station_xml("Narva", "26058", "bad", "bad", ""),
            ],
        );

        let snapshot = parse_observations(&xml).expect("valid feed");
        let stations: Vec<StationId> = snapshot.observations.iter().map(|o| o.station).collect();
        assert_eq!(
            stations,
            vec![StationId::TartuToravere, StationId::Parnu, StationId::TallinnHarku]
        );
        assert!(snapshot.observations.iter().all(|o| o.timestamp == 1_700_000_000));
    }

    #[test]
    fn empty_phenomenon_is_allowed() {
        let xml = "<observations timestamp=\"1\"><station><name>Pärnu</name><wmocode>41803</wmocode>\
                   <phenomenon/><airtemperature>4</airtemperature><windspeed>0</windspeed></station></observations>";
        let snapshot = parse_observations(xml).expect("valid feed");
        assert_eq!(snapshot.observations[0].phenomenon, "");
    }

    #[test]
    fn invalid_reading_fails_the_snapshot() {
        let xml = document(
            "1700000000",
            &[
                station_xml("Tallinn-Harku", "26038", "1.0", "2.0", "Clear"),
                station_xml("Pärnu", "41803", "", "2.0", "Clear"),
            ],
        );

        let err = parse_observations(&xml).unwrap_err();
        assert!(matches!(
            err,
            FeedError::InvalidField { field: "airtemperature", .. }
        ));
    }

    #[test]
    fn negative_wind_speed_fails_the_snapshot() {
        let xml = document(
            "1700000000",
            &[station_xml("Tartu-Tõravere", "26242", "1.0", "-0.5", "Clear")],
        );

        let err = parse_observations(&xml).unwrap_err();
        assert!(matches!(
            err,
            FeedError::InvalidField { field: "windspeed", ref value, .. } if value == "-0.5"
        ));
    }

    #[test]
    fn calm_wind_is_accepted() {
        let xml = document(
            "1700000000",
            &[station_xml("Tartu-Tõravere", "26242", "1.0", "0.0", "Clear")],
        );

        let snapshot = parse_observations(&xml).expect("parse should succeed");
        assert_eq!(snapshot.observations[0].wind_speed, 0.0);
    }

    #[test]
    fn missing_or_invalid_timestamp() {
        let missing = "<observations><station><name>Pärnu</name></station></observations>";
        assert!(matches!(parse_observations(missing), Err(FeedError::MissingTimestamp)));

        let invalid = "<observations timestamp=\"soon\"></observations>";
        assert!(matches!(parse_observations(invalid), Err(FeedError::InvalidTimestamp(_))));
    }

    #[test]
    fn malformed_xml() {
        assert!(matches!(parse_observations("<observations"), Err(FeedError::Xml(_))));
    }

    #[test]
    fn truncate_body_is_char_safe() {
        let body = "õ".repeat(300);
        let truncated = truncate_body(&body);
        assert_eq!(truncated.chars().count(), 203);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate_body("short"), "short");
    }
}
