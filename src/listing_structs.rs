use std::fmt;
use std::ops::AddAssign;

use chrono::{DateTime, Local};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Property-type value meaning "no filter".
pub const ANY_PROPERTY_TYPE: &str = "any";

fn default_listing_type() -> String {
    String::from("for_sale")
}

fn default_past_days() -> i64 {
    7
}

fn default_exclude_pending() -> bool {
    true
}

/// One unit of scrape work. Identity is its position in the preset list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Preset {
    pub location: String,
    #[serde(default = "default_listing_type", deserialize_with = "listing_type_or_default")]
    pub listing_type: String,
    #[serde(default = "default_past_days", deserialize_with = "lenient_days")]
    pub past_days: i64,
    #[serde(default = "default_exclude_pending", deserialize_with = "lenient_flag")]
    pub exclude_pending: bool,
    #[serde(default)]
    pub property_type: Option<String>,
}

impl Preset {
    pub fn new(location: impl Into<String>) -> Self {
        Preset {
            location: location.into(),
            listing_type: default_listing_type(),
            past_days: default_past_days(),
            exclude_pending: default_exclude_pending(),
            property_type: None,
        }
    }

    pub fn with_property_type(mut self, property_type: impl Into<String>) -> Self {
        self.property_type = Some(property_type.into());
        self
    }

    /// Property type to filter on, if any. Empty and "any" mean unrestricted.
    pub fn property_filter(&self) -> Option<&str> {
        self.property_type
            .as_deref()
            .filter(|t| !t.is_empty() && *t != ANY_PROPERTY_TYPE)
    }
}

fn listing_type_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_else(default_listing_type))
}

fn lenient_days<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(default_past_days()),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .ok_or_else(|| de::Error::custom(format!("past_days out of range: {n}"))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| de::Error::custom(format!("past_days is not an integer: {s:?}"))),
        other => Err(de::Error::custom(format!("past_days is not an integer: {other}"))),
    }
}

fn lenient_flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(default_exclude_pending()),
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_f64().map(|f| f != 0.0).unwrap_or(true)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" | "" => Ok(false),
            _ => Err(de::Error::custom(format!("exclude_pending is not a boolean: {s:?}"))),
        },
        other => Err(de::Error::custom(format!("exclude_pending is not a boolean: {other}"))),
    }
}

/// Parameters handed to the scraper for one preset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapeParams {
    pub location: String,
    pub listing_type: String,
    pub past_days: i64,
    pub exclude_pending: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<Vec<String>>,
    pub return_type: &'static str,
}

impl From<&Preset> for ScrapeParams {
    fn from(preset: &Preset) -> Self {
        ScrapeParams {
            location: preset.location.clone(),
            listing_type: preset.listing_type.clone(),
            past_days: preset.past_days,
            exclude_pending: preset.exclude_pending,
            property_type: preset.property_filter().map(|t| vec![t.to_string()]),
            return_type: "pandas",
        }
    }
}

/// Flattened listing sent to ingestion. Absent fields serialize as null.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub property_url: Option<String>,
    pub property_id: Option<String>,
    pub listing_id: Option<String>,
    pub mls_id: Option<String>,
    pub formatted_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub list_price: Option<Value>,
    pub list_date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestBatch<'a> {
    pub source: &'a str,
    pub items: &'a [NormalizedRecord],
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunTotals {
    pub received: i64,
    pub inserted: i64,
    pub updated: i64,
}

impl RunTotals {
    /// Reads the counters out of an ingestion response, other keys are ignored.
    /// Float counters are truncated; missing or non-numeric ones count as zero.
    pub fn from_response(body: &Value) -> Self {
        let count = |key: &str| match body.get(key) {
            None | Some(Value::Null) => 0,
            Some(value) => value
                .as_i64()
                .or_else(|| value.as_f64().map(|f| f.trunc() as i64))
                .unwrap_or_else(|| {
                    warn!("Ignoring non-numeric {} counter: {}", key, value);
                    0
                }),
        };
        RunTotals {
            received: count("received"),
            inserted: count("inserted"),
            updated: count("updated"),
        }
    }
}

impl AddAssign for RunTotals {
    fn add_assign(&mut self, rhs: Self) {
        self.received += rhs.received;
        self.inserted += rhs.inserted;
        self.updated += rhs.updated;
    }
}

impl fmt::Display for RunTotals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "received={}, inserted={}, updated={}",
            self.received, self.inserted, self.updated
        )
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub totals: RunTotals,
    pub presets: usize,
    pub started_at: DateTime<Local>,
}
