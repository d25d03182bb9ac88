use image::GenericImageView;
use std::sync::Arc;

use crate::error::AnalysisError;
use crate::models::NutritionReport;
use crate::services::preprocess::{self, ImagePayload};
use crate::services::{extract_json, VisionModel};

pub const ANALYSIS_PROMPT: &str = concat!(
    "Analyze this food image and return JSON only:\n",
    "{",
    r#""items":[{"#,
    r#""name":"...", "calories":..., "carbs":..., "#,
    r#""protein":..., "fat":..., "portion_size":"...""#,
    "}],",
    r#""total_calories":...,"#,
    r#""health_rating":...,"#,
    r#""micronutrients":{"vitamins":[...],"minerals":[...]}"#,
    "}"
);

/// Upload bytes in, nutrition report out
pub struct FoodAnalyzer {
    model: Arc<dyn VisionModel>,
    max_dimension: u32,
}

impl FoodAnalyzer {
    pub fn new(model: Arc<dyn VisionModel>, max_dimension: u32) -> Self {
        Self {
            model,
            max_dimension,
        }
    }

    pub async fn analyze(&self, upload: Vec<u8>) -> Result<NutritionReport, AnalysisError> {
        log::info!("📸 Starting food image analysis ({} bytes)", upload.len());

        let max_dimension = self.max_dimension;
        let payload = tokio::task::spawn_blocking(move || prepare_image(&upload, max_dimension))
            .await
            .map_err(|e| AnalysisError::Internal(e.to_string()))??;

        let text = self.model.generate(ANALYSIS_PROMPT, &payload).await?;
        log::debug!("💬 Model reply: {}", text);

        let report = extract_json(&text);
        match report.summary() {
            Some(summary) => {
                let (carbs, protein, fat) = summary.macro_totals();
                log::info!(
                    "🍽️ Analysis complete: {} items, total {} kcal (C {}g / P {}g / F {}g), health rating {}",
                    summary.items.len(),
                    summary.total_calories.unwrap_or_else(|| summary.items_calories()),
                    carbs,
                    protein,
                    fat,
                    summary.health_rating_label().unwrap_or_else(|| "n/a".to_string())
                );
                for item in &summary.items {
                    log::debug!("  • {}", item.label());
                }
                let micros = &summary.micronutrients;
                log::debug!(
                    "  vitamins: [{}], minerals: [{}]",
                    micros.vitamins.iter().map(|v| v.name()).collect::<Vec<_>>().join(", "),
                    micros.minerals.iter().map(|m| m.name()).collect::<Vec<_>>().join(", ")
                );
            }
            None if report.is_error() => log::warn!("⚠️ Model reply held no usable nutrition data"),
            None => log::warn!("⚠️ Model reply parsed but does not follow the nutrition schema"),
        }

        Ok(report)
    }
}

/// Decode, bound and re-encode an upload
fn prepare_image(upload: &[u8], max_dimension: u32) -> Result<ImagePayload, AnalysisError> {
    let image = preprocess::decode_upload(upload)?;
    let (width, height) = image.dimensions();

    let image = preprocess::resize_bounded(image, max_dimension)?;
    let (new_w, new_h) = image.dimensions();
    log::info!("🖼️ Image {}x{} prepared as {}x{}", width, height, new_w, new_h);

    preprocess::encode_jpeg(&image)
}
