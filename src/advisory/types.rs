//! Field, sensor, and advice types.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A registered field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldProfile {
    pub id: String,
    pub name: String,
    pub location: String,
    pub area_hectares: f64,
    pub soil_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_crop: Option<String>,
}

/// What a sensor measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Moisture,
    Temperature,
    Humidity,
    Ph,
    Nitrogen,
    Phosphorus,
    Potassium,
    Light,
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SensorKind::Moisture => "soil moisture",
            SensorKind::Temperature => "temperature",
            SensorKind::Humidity => "humidity",
            SensorKind::Ph => "soil pH",
            SensorKind::Nitrogen => "nitrogen",
            SensorKind::Phosphorus => "phosphorus",
            SensorKind::Potassium => "potassium",
            SensorKind::Light => "light intensity",
        };
        f.write_str(label)
    }
}

/// One reading from a field sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub sensor_id: String,
    pub field_id: String,
    pub kind: SensorKind,
    pub value: f64,
    pub unit: String,
    pub recorded_at: DateTime<Utc>,
}

/// A suggested crop for a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRecommendation {
    pub crop: String,
    /// 0-100
    #[serde(deserialize_with = "deserialize_percent")]
    pub suitability: u8,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planting_window: Option<String>,
}

/// Soil condition summary for a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilHealthReport {
    /// 0-100
    #[serde(deserialize_with = "deserialize_percent")]
    pub score: u8,
    pub summary: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Read any JSON number and clamp it into 0-100
///
/// Models drift outside the requested range (300, -5, 72.5).
fn deserialize_percent<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() {
        return Err(D::Error::custom("percentage must be a finite number"));
    }
    Ok(raw.clamp(0.0, 100.0).round() as u8)
}

/// Where a piece of advice came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdviceSource {
    Generated,
    /// Static placeholder; carries the reason generation was skipped
    Fallback(String),
}

/// Advice plus its provenance
#[derive(Debug, Clone, PartialEq)]
pub struct Advice<T> {
    pub value: T,
    pub source: AdviceSource,
}

impl<T> Advice<T> {
    pub fn generated(value: T) -> Self {
        Self {
            value,
            source: AdviceSource::Generated,
        }
    }

    pub fn fallback(value: T, reason: impl Into<String>) -> Self {
        Self {
            value,
            source: AdviceSource::Fallback(reason.into()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.source, AdviceSource::Fallback(_))
    }
}
