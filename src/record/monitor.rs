//! Monitor identities
//!
//! A monitor is the `(site, monitor, station)` triple that produced a
//! record. Location, website and coordinates ride along for display but
//! never take part in equality.

use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use regex::Regex;
use serde::ser::{Serialize, SerializeStruct, Serializer};

use super::record::Record;

/// Separator used in the string identifier
pub const IDENTIFIER_SEPARATOR: char = '$';

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A distinct measurement source
#[derive(Debug, Clone)]
pub struct MonitorIdentity {
    site: String,
    monitor_id: String,
    station_id: String,
    location: Option<String>,
    website: Option<String>,
    coordinates: Option<Coordinates>,
}

impl MonitorIdentity {
    /// Identity with no location details
    pub fn new(
        site: impl Into<String>,
        monitor_id: impl Into<String>,
        station_id: impl Into<String>,
    ) -> Self {
        Self {
            site: site.into(),
            monitor_id: monitor_id.into(),
            station_id: station_id.into(),
            location: None,
            website: None,
            coordinates: None,
        }
    }

    /// Identity derived from a record and its `Latitude`, `Longitude`,
    /// `Location` and `Website` metadata
    pub fn from_record(record: &Record) -> Self {
        let coordinates = match (
            record.metadata_value("Latitude").and_then(parse_angle),
            record.metadata_value("Longitude").and_then(parse_angle),
        ) {
            (Some(latitude), Some(longitude)) => Coordinates::checked(latitude, longitude),
            _ => None,
        };

        Self {
            site: record.site().to_string(),
            monitor_id: record.monitor_id().to_string(),
            station_id: record.station_id().to_string(),
            location: record.metadata_value("Location").map(str::to_string),
            website: record.metadata_value("Website").map(str::to_string),
            coordinates,
        }
    }

    /// Parse a `monitor$site$station` or `monitor$site` identifier
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        let parts: Vec<&str> = identifier.split(IDENTIFIER_SEPARATOR).collect();
        match parts.as_slice() {
            [monitor, site, station] => Some(Self::new(*site, *monitor, *station)),
            [monitor, site] => Some(Self::new(*site, *monitor, "")),
            _ => None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.coordinates = Coordinates::checked(latitude, longitude);
        self
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn monitor_id(&self) -> &str {
        &self.monitor_id
    }

    pub fn station_id(&self) -> &str {
        &self.station_id
    }

    /// Location text, empty when unknown
    pub fn location(&self) -> &str {
        self.location.as_deref().unwrap_or("")
    }

    /// Website, only when it is an absolute http(s) URL
    pub fn website(&self) -> Option<&str> {
        self.website.as_deref().filter(|w| is_absolute_http_url(w))
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    /// Stable string form: `monitor$site$station`
    pub fn identifier(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            self.monitor_id,
            self.site,
            self.station_id,
            sep = IDENTIFIER_SEPARATOR
        )
    }

    /// Whether `identifier` names this monitor.
    ///
    /// The two-part `monitor$site` form matches only a monitor whose
    /// station is empty.
    pub fn matches_identifier(&self, identifier: &str) -> bool {
        Self::from_identifier(identifier).map_or(false, |other| other == *self)
    }
}

impl PartialEq for MonitorIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.site == other.site
            && self.monitor_id == other.monitor_id
            && self.station_id == other.station_id
    }
}

impl Eq for MonitorIdentity {}

impl Hash for MonitorIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.site.hash(state);
        self.monitor_id.hash(state);
        self.station_id.hash(state);
    }
}

impl Serialize for MonitorIdentity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("MonitorIdentity", 7)?;
        state.serialize_field("identifier", &self.identifier())?;
        state.serialize_field("site", &self.site)?;
        state.serialize_field("monitor", &self.monitor_id)?;
        state.serialize_field("station", &self.station_id)?;
        state.serialize_field("location", self.location())?;
        state.serialize_field("website", &self.website())?;
        state.serialize_field(
            "coordinates",
            &self.coordinates.map(|c| [c.latitude, c.longitude]),
        )?;
        state.end()
    }
}

impl Coordinates {
    /// A pair at exactly (0, 0) is treated as "not recorded"
    fn checked(latitude: f64, longitude: f64) -> Option<Self> {
        if latitude == 0.0 && longitude == 0.0 {
            None
        } else {
            Some(Self { latitude, longitude })
        }
    }
}

fn angle_regex() -> &'static Regex {
    static ANGLE: OnceLock<Regex> = OnceLock::new();
    ANGLE.get_or_init(|| {
        Regex::new(r#"^([NSEW])([0-9]+) ([0-9]+)' ([0-9]*\.?[0-9]+)"$"#)
            .expect("angle pattern is valid")
    })
}

/// Parse a decimal angle or the `N32 16' 21.38"` degree/minute/second form.
///
/// South and west are negative.
pub fn parse_angle(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Some(caps) = angle_regex().captures(text) {
        let degrees: f64 = caps[2].parse().ok()?;
        let minutes: f64 = caps[3].parse().ok()?;
        let seconds: f64 = caps[4].parse().ok()?;
        let value = degrees + (minutes + seconds / 60.0) / 60.0;
        return Some(match &caps[1] {
            "S" | "W" => -value,
            _ => value,
        });
    }
    text.parse().ok()
}

fn is_absolute_http_url(text: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        text.strip_prefix(scheme)
            .map_or(false, |rest| !rest.is_empty() && !rest.starts_with('/'))
    })
}
