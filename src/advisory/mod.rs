//! Advisory Module
//!
//! Crop and soil advice for registered fields. Requests go through the shared
//! [`Dispatcher`]; when it gives up, or the answer cannot be decoded, a static
//! conservative placeholder is returned instead of an error.

pub mod prompts;
pub mod types;

pub use types::{
    Advice, AdviceSource, CropRecommendation, FieldProfile, SensorKind, SensorReading,
    SoilHealthReport,
};

use crate::api::{parse_json, Envelope};
use crate::client::ClientFactory;
use crate::error::Result;
use crate::router::Dispatcher;
use futures::future::join_all;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Field advisor backed by a shared dispatcher
pub struct Advisor<F: ClientFactory> {
    dispatcher: Arc<Dispatcher<F>>,
    model: String,
}

impl<F: ClientFactory> Advisor<F> {
    pub fn new(dispatcher: Arc<Dispatcher<F>>, model: impl Into<String>) -> Self {
        Self {
            dispatcher,
            model: model.into(),
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher<F>> {
        &self.dispatcher
    }

    /// Ranked crop suggestions for one field
    pub async fn recommend_crops(
        &self,
        field: &FieldProfile,
        readings: &[SensorReading],
    ) -> Advice<Vec<CropRecommendation>> {
        let envelope = prompts::crop_recommendation_envelope(&self.model, field, readings);

        match self.ask::<Vec<CropRecommendation>>(&envelope).await {
            Ok(crops) if !crops.is_empty() => Advice::generated(crops),
            Ok(_) => {
                tracing::warn!(field = %field.id, "model returned no crop recommendations");
                Advice::fallback(fallback_crops(), "empty recommendation list")
            }
            Err(err) => {
                tracing::warn!(
                    field = %field.id,
                    error = %err,
                    "using fallback crop recommendations"
                );
                Advice::fallback(fallback_crops(), err.to_string())
            }
        }
    }

    /// Soil health summary for one field
    pub async fn soil_health(
        &self,
        field: &FieldProfile,
        readings: &[SensorReading],
    ) -> Advice<SoilHealthReport> {
        let envelope = prompts::soil_health_envelope(&self.model, field, readings);

        match self.ask::<SoilHealthReport>(&envelope).await {
            Ok(report) => Advice::generated(report),
            Err(err) => {
                tracing::warn!(field = %field.id, error = %err, "using fallback soil report");
                Advice::fallback(fallback_soil_report(), err.to_string())
            }
        }
    }

    /// Crop suggestions for several fields, requested concurrently
    ///
    /// Results are in the same order as `fields`.
    pub async fn recommend_for_fields(
        &self,
        fields: &[FieldProfile],
        readings: &[SensorReading],
    ) -> Vec<(String, Advice<Vec<CropRecommendation>>)> {
        let requests = fields.iter().map(|field| async move {
            let advice = self.recommend_crops(field, readings).await;
            (field.id.clone(), advice)
        });
        join_all(requests).await
    }

    async fn ask<T: DeserializeOwned>(&self, envelope: &Envelope) -> Result<T> {
        let text = self.dispatcher.dispatch(envelope).await?;
        parse_json(&text)
    }
}

/// Crops that tolerate a wide range of conditions
pub fn fallback_crops() -> Vec<CropRecommendation> {
    vec![
        CropRecommendation {
            crop: "Sorghum".to_string(),
            suitability: 60,
            reason: "Drought tolerant and forgiving of variable soil fertility.".to_string(),
            planting_window: Some("Start of the rainy season".to_string()),
        },
        CropRecommendation {
            crop: "Cowpea".to_string(),
            suitability: 55,
            reason: "Fixes nitrogen and performs on low-input soils.".to_string(),
            planting_window: Some("Early rainy season".to_string()),
        },
        CropRecommendation {
            crop: "Pearl millet".to_string(),
            suitability: 50,
            reason: "Short cycle crop suited to low rainfall.".to_string(),
            planting_window: None,
        },
    ]
}

pub fn fallback_soil_report() -> SoilHealthReport {
    SoilHealthReport {
        score: 50,
        summary: "Soil analysis is unavailable right now; showing a conservative baseline."
            .to_string(),
        recommendations: vec![
            "Send a soil sample for laboratory pH and nutrient testing.".to_string(),
            "Incorporate compost or crop residue to build organic matter.".to_string(),
            "Check moisture sensors before the next irrigation cycle.".to_string(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::CredentialSet;
    use crate::test_support::{credentials, Outcome, ScriptedFactory};
    use chrono::Utc;

    const KEY_A: &str = "key-alpha-0001";
    const KEY_B: &str = "key-bravo-0002";

    fn field(id: &str) -> FieldProfile {
        FieldProfile {
            id: id.to_string(),
            name: format!("Field {}", id),
            location: "Eldoret".to_string(),
            area_hectares: 4.0,
            soil_type: "clay loam".to_string(),
            current_crop: None,
        }
    }

    fn readings() -> Vec<SensorReading> {
        vec![SensorReading {
            sensor_id: "s-1".to_string(),
            field_id: "f-1".to_string(),
            kind: SensorKind::Moisture,
            value: 28.0,
            unit: "%".to_string(),
            recorded_at: Utc::now(),
        }]
    }

    fn advisor(factory: ScriptedFactory, keys: &[&str]) -> Advisor<ScriptedFactory> {
        Advisor::new(
            Arc::new(Dispatcher::new(factory, credentials(keys))),
            "gemini-2.0-flash",
        )
    }

    #[tokio::test]
    async fn test_generated_crops_are_decoded() {
        let factory = ScriptedFactory::new().always(
            KEY_A,
            Outcome::Text(
                "```json\n[{\"crop\":\"Beans\",\"suitability\":140,\"reason\":\"Good moisture\"}]\n```"
                    .to_string(),
            ),
        );

        let advice = advisor(factory, &[KEY_A])
            .recommend_crops(&field("f-1"), &readings())
            .await;

        assert_eq!(advice.source, AdviceSource::Generated);
        assert_eq!(advice.value.len(), 1);
        assert_eq!(advice.value[0].crop, "Beans");
        assert_eq!(advice.value[0].suitability, 100);
    }

    #[tokio::test]
    async fn test_out_of_range_scores_keep_the_whole_answer() {
        let factory = ScriptedFactory::new().always(
            KEY_A,
            Outcome::Text(
                r#"[{"crop":"Beans","suitability":300,"reason":"Wet season"},
                    {"crop":"Teff","suitability":80,"reason":"Well drained"},
                    {"crop":"Rice","suitability":-4,"reason":"Too dry"}]"#
                    .to_string(),
            ),
        );

        let advice = advisor(factory, &[KEY_A])
            .recommend_crops(&field("f-1"), &readings())
            .await;

        assert_eq!(advice.source, AdviceSource::Generated);
        let crops: Vec<_> = advice
            .value
            .iter()
            .map(|c| (c.crop.as_str(), c.suitability))
            .collect();
        assert_eq!(crops, vec![("Beans", 100), ("Teff", 80), ("Rice", 0)]);
    }

    #[tokio::test]
    async fn test_negative_soil_score_is_generated() {
        let factory = ScriptedFactory::new().always(
            KEY_A,
            Outcome::Text(
                r#"{"score":-5,"summary":"Compacted","recommendations":[]}"#.to_string(),
            ),
        );

        let advice = advisor(factory, &[KEY_A])
            .soil_health(&field("f-1"), &readings())
            .await;

        assert_eq!(advice.source, AdviceSource::Generated);
        assert_eq!(advice.value.score, 0);
    }

    #[tokio::test]
    async fn test_exhausted_dispatch_falls_back() {
        let factory = ScriptedFactory::new()
            .always(KEY_A, Outcome::RateLimited)
            .always(KEY_B, Outcome::RateLimited);

        let advice = advisor(factory.clone(), &[KEY_A, KEY_B])
            .recommend_crops(&field("f-1"), &readings())
            .await;

        assert!(advice.is_fallback());
        assert_eq!(advice.value, fallback_crops());
        assert_eq!(factory.contacted().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_keys_fall_back() {
        let advisor = Advisor::new(
            Arc::new(Dispatcher::new(ScriptedFactory::new(), CredentialSet::default())),
            "gemini-2.0-flash",
        );

        let advice = advisor.soil_health(&field("f-1"), &[]).await;

        assert_eq!(advice.value, fallback_soil_report());
        match advice.source {
            AdviceSource::Fallback(reason) => assert!(reason.contains("No usable API keys")),
            other => panic!("expected fallback, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_undecodable_answer_falls_back() {
        let factory = ScriptedFactory::new()
            .always(KEY_A, Outcome::Text("I think loam is nice.".to_string()));

        let advice = advisor(factory, &[KEY_A])
            .soil_health(&field("f-1"), &readings())
            .await;

        assert!(advice.is_fallback());
    }

    #[tokio::test]
    async fn test_empty_recommendations_fall_back() {
        let factory = ScriptedFactory::new().always(KEY_A, Outcome::Text("[]".to_string()));

        let advice = advisor(factory, &[KEY_A])
            .recommend_crops(&field("f-1"), &readings())
            .await;

        assert_eq!(
            advice.source,
            AdviceSource::Fallback("empty recommendation list".to_string())
        );
    }

    #[tokio::test]
    async fn test_soil_report_decoded() {
        let factory = ScriptedFactory::new().always(
            KEY_A,
            Outcome::Text(
                r#"{"score":72,"summary":"Adequate moisture","recommendations":["Mulch"]}"#
                    .to_string(),
            ),
        );

        let advice = advisor(factory, &[KEY_A])
            .soil_health(&field("f-1"), &readings())
            .await;

        assert_eq!(
            advice,
            Advice::generated(SoilHealthReport {
                score: 72,
                summary: "Adequate moisture".to_string(),
                recommendations: vec!["Mulch".to_string()],
            })
        );
    }

    #[tokio::test]
    async fn test_fan_out_keeps_field_order() {
        let factory = ScriptedFactory::new().always(
            KEY_A,
            Outcome::Text(r#"[{"crop":"Teff","suitability":70,"reason":"Fits"}]"#.to_string()),
        );
        let fields = vec![field("f-1"), field("f-2"), field("f-3")];

        let results = advisor(factory.clone(), &[KEY_A])
            .recommend_for_fields(&fields, &readings())
            .await;

        let ids: Vec<_> = results.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["f-1", "f-2", "f-3"]);
        assert!(results.iter().all(|(_, advice)| !advice.is_fallback()));
        assert_eq!(factory.contacted().len(), 3);
        assert_eq!(factory.connects(), 1);
    }
}
