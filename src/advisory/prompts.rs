//! Prompt Builders
//!
//! Turn a field and its sensor readings into generation envelopes with a
//! declared response schema.

use crate::advisory::types::{FieldProfile, SensorKind, SensorReading};
use crate::api::Envelope;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt::Write;

const SYSTEM_INSTRUCTION: &str = "You are an agronomist advising smallholder and commercial \
farmers. Base every recommendation on the supplied field profile and sensor readings. \
Answer with JSON only.";

const TEMPERATURE: f32 = 0.4;

/// Latest reading of each kind for one field, in kind order
pub fn latest_readings<'a>(
    field_id: &str,
    readings: &'a [SensorReading],
) -> Vec<&'a SensorReading> {
    let mut latest: BTreeMap<SensorKind, &SensorReading> = BTreeMap::new();

    for reading in readings.iter().filter(|r| r.field_id == field_id) {
        latest
            .entry(reading.kind)
            .and_modify(|current| {
                if reading.recorded_at > current.recorded_at {
                    *current = reading;
                }
            })
            .or_insert(reading);
    }

    latest.into_values().collect()
}

/// Plain-text description of a field and its current conditions
pub fn describe_field(field: &FieldProfile, readings: &[SensorReading]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Field: {} ({})", field.name, field.location);
    let _ = writeln!(out, "Area: {:.2} ha", field.area_hectares);
    let _ = writeln!(out, "Soil type: {}", field.soil_type);
    if let Some(crop) = &field.current_crop {
        let _ = writeln!(out, "Current crop: {}", crop);
    }

    let latest = latest_readings(&field.id, readings);
    if latest.is_empty() {
        out.push_str("Sensor readings: none available\n");
    } else {
        out.push_str("Sensor readings (latest per sensor type):\n");
        for reading in latest {
            let _ = writeln!(
                out,
                "- {}: {} {} (at {})",
                reading.kind,
                reading.value,
                reading.unit,
                reading.recorded_at.format("%Y-%m-%d %H:%M UTC")
            );
        }
    }
    out
}

/// Envelope asking for ranked crop recommendations
pub fn crop_recommendation_envelope(
    model: &str,
    field: &FieldProfile,
    readings: &[SensorReading],
) -> Envelope {
    let prompt = format!(
        "{}\nRecommend up to 5 crops suited to these conditions, best first. \
         For each give a suitability score from 0 to 100, a one-sentence reason \
         and the planting window.",
        describe_field(field, readings)
    );

    Envelope::new(model, prompt)
        .with_system_instruction(SYSTEM_INSTRUCTION)
        .with_temperature(TEMPERATURE)
        .with_schema(crop_recommendation_schema())
}

/// Envelope asking for a soil health summary
pub fn soil_health_envelope(
    model: &str,
    field: &FieldProfile,
    readings: &[SensorReading],
) -> Envelope {
    let prompt = format!(
        "{}\nAssess the soil health of this field. Give an overall score from 0 to 100, \
         a short summary and up to 5 concrete management actions.",
        describe_field(field, readings)
    );

    Envelope::new(model, prompt)
        .with_system_instruction(SYSTEM_INSTRUCTION)
        .with_temperature(TEMPERATURE)
        .with_schema(soil_health_schema())
}

fn crop_recommendation_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "crop": { "type": "STRING" },
                "suitability": { "type": "INTEGER" },
                "reason": { "type": "STRING" },
                "planting_window": { "type": "STRING" }
            },
            "required": ["crop", "suitability", "reason"]
        }
    })
}

fn soil_health_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "score": { "type": "INTEGER" },
            "summary": { "type": "STRING" },
            "recommendations": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": ["score", "summary", "recommendations"]
    })
}
