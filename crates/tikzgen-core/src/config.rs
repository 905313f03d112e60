use crate::pipeline::Stage;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PRO_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_FAST_MODEL: &str = "gemini-3-flash-preview";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Pro,
    Fast,
}

/// Sampling parameters of one pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSettings {
    pub tier: ModelTier,
    pub temperature: f32,
    /// Temperature used when extended reasoning is on.
    pub deep_temperature: f32,
    /// Thinking budget requested when extended reasoning is on.
    pub thinking_budget: Option<u32>,
}

impl StageSettings {
    const fn new(
        tier: ModelTier,
        temperature: f32,
        deep_temperature: f32,
        thinking_budget: Option<u32>,
    ) -> Self {
        Self {
            tier,
            temperature,
            deep_temperature,
            thinking_budget,
        }
    }

    pub fn temperature(&self, deep: bool) -> f32 {
        if deep {
            self.deep_temperature
        } else {
            self.temperature
        }
    }

    pub fn thinking_budget(&self, deep: bool) -> Option<u32> {
        if deep { self.thinking_budget } else { None }
    }
}

/// Models and sampling parameters for every stage.
///
/// Loaded from JSON; missing keys fall back to [`GenerationSettings::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationSettings {
    pub pro_model: String,
    pub fast_model: String,
    /// Extended reasoning toggle.
    pub deep_reasoning: bool,
    pub describe: StageSettings,
    pub image_description: StageSettings,
    pub compile: StageSettings,
    pub photo: StageSettings,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            pro_model: DEFAULT_PRO_MODEL.to_string(),
            fast_model: DEFAULT_FAST_MODEL.to_string(),
            deep_reasoning: true,
            describe: StageSettings::new(ModelTier::Pro, 0.1, 0.2, Some(10_000)),
            image_description: StageSettings::new(ModelTier::Pro, 0.1, 0.1, None),
            compile: StageSettings::new(ModelTier::Fast, 0.0, 0.0, Some(15_000)),
            photo: StageSettings::new(ModelTier::Pro, 0.0, 0.0, Some(16_000)),
        }
    }
}

impl GenerationSettings {
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn model(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Pro => &self.pro_model,
            ModelTier::Fast => &self.fast_model,
        }
    }

    pub fn stage(&self, stage: Stage) -> &StageSettings {
        match stage {
            Stage::DescriptionToMarkup => &self.describe,
            Stage::ImageToDescription => &self.image_description,
            Stage::MarkupToVector => &self.compile,
            Stage::ImageToMarkup => &self.photo,
        }
    }
}
