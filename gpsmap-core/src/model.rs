use serde::{Deserialize, Deserializer, Serialize};

use crate::error::RecordError;

/// One reported position sample, as delivered by the location API.
///
/// Coordinates and timestamp are kept in their raw string form; parsing
/// happens when a record is filtered or plotted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    #[serde(rename = "user name", alias = "username", default)]
    pub username: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub latitude: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub longitude: String,
    #[serde(default)]
    pub timestamp: String,
}

impl LocationRecord {
    pub fn new(
        username: impl Into<String>,
        latitude: impl Into<String>,
        longitude: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            latitude: latitude.into(),
            longitude: longitude.into(),
            timestamp: timestamp.into(),
        }
    }

    pub fn position(&self) -> Result<Coordinates, RecordError> {
        Ok(Coordinates {
            latitude: parse_coordinate("latitude", &self.latitude)?,
            longitude: parse_coordinate("longitude", &self.longitude)?,
        })
    }
}

impl AsRef<LocationRecord> for LocationRecord {
    fn as_ref(&self) -> &LocationRecord {
        self
    }
}

/// Envelope returned by `GET <endpoint>`.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationsResponse {
    pub data: Vec<LocationRecord>,
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const ORIGIN: Coordinates = Coordinates { latitude: 0.0, longitude: 0.0 };

    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

fn parse_coordinate(field: &'static str, raw: &str) -> Result<f64, RecordError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RecordError::InvalidCoordinate { field, value: raw.to_string() })
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Null,
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
        Raw::Null => String::new(),
    })
}
