//! Generation parameters shared by every turn.

use super::model_name::ModelName;
use crate::error::{NeurobotError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "You are NEUROBOT, a helpful and smart artificial intelligence.";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_TOP_K: u32 = 40;
pub const DEFAULT_TOP_P: f64 = 0.95;

pub const MAX_TEMPERATURE: f64 = 2.0;

/// Process-wide generation parameters and the maintenance flag.
///
/// Serialized as the camelCase JSON blob
/// `{systemInstruction, modelName, temperature, topK, topP, isSystemActive}`.
/// Missing fields fall back to their defaults when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationConfig {
    /// Instruction sent alongside every request.
    pub system_instruction: String,
    /// Provider model id (usually one of [`ModelName`]).
    pub model_name: String,
    /// Sampling temperature in `[0, 2]`.
    pub temperature: f64,
    /// Top-k sampling, strictly positive.
    pub top_k: u32,
    /// Nucleus sampling in `(0, 1]`.
    pub top_p: f64,
    /// `false` puts the chat in maintenance mode for non-administrators.
    pub is_system_active: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            model_name: ModelName::default().to_string(),
            temperature: DEFAULT_TEMPERATURE,
            top_k: DEFAULT_TOP_K,
            top_p: DEFAULT_TOP_P,
            is_system_active: true,
        }
    }
}

impl GenerationConfig {
    /// Checks every parameter against its allowed range.
    pub fn validate(&self) -> Result<()> {
        if self.model_name.trim().is_empty() {
            return Err(NeurobotError::invalid_config("modelName must not be empty"));
        }
        if !self.temperature.is_finite() || !(0.0..=MAX_TEMPERATURE).contains(&self.temperature) {
            return Err(NeurobotError::invalid_config(format!(
                "temperature must be within [0, {MAX_TEMPERATURE}], got {}",
                self.temperature
            )));
        }
        if self.top_k == 0 {
            return Err(NeurobotError::invalid_config("topK must be greater than 0"));
        }
        if !self.top_p.is_finite() || self.top_p <= 0.0 || self.top_p > 1.0 {
            return Err(NeurobotError::invalid_config(format!(
                "topP must be within (0, 1], got {}",
                self.top_p
            )));
        }
        Ok(())
    }

    /// The selected model if it is one of the known ones.
    pub fn model(&self) -> Option<ModelName> {
        ModelName::from_str(&self.model_name).ok()
    }

    pub fn with_model(mut self, model: ModelName) -> Self {
        self.model_name = model.to_string();
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    /// Returns a copy with a new temperature, rejecting out-of-range values.
    pub fn with_temperature(mut self, temperature: f64) -> Result<Self> {
        self.temperature = temperature;
        self.validate()?;
        Ok(self)
    }

    /// Returns a copy with a new top-k, rejecting zero.
    pub fn with_top_k(mut self, top_k: u32) -> Result<Self> {
        self.top_k = top_k;
        self.validate()?;
        Ok(self)
    }

    /// Returns a copy with a new top-p, rejecting out-of-range values.
    pub fn with_top_p(mut self, top_p: f64) -> Result<Self> {
        self.top_p = top_p;
        self.validate()?;
        Ok(self)
    }

    pub fn with_system_active(mut self, active: bool) -> Self {
        self.is_system_active = active;
        self
    }
}
