//! Model input definitions
//!
//! Environment categories, the 11 measured features and their slider ranges,
//! and the fixed-order encoding handed to the scaler/classifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of measured features entered in step 2
pub const MEASURED_FEATURES: usize = 11;

/// Width of the model input: measured features + encoded category
pub const MODEL_INPUT_WIDTH: usize = MEASURED_FEATURES + 1;

/// Plant growing context chosen in step 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnvironmentCategory {
    Desert,
    Agricultural,
    Shade,
}

impl EnvironmentCategory {
    pub const ALL: [EnvironmentCategory; 3] = [
        EnvironmentCategory::Desert,
        EnvironmentCategory::Agricultural,
        EnvironmentCategory::Shade,
    ];

    /// Integer code the classifier was trained with
    pub fn encode(self) -> u8 {
        match self {
            EnvironmentCategory::Desert => 0,
            EnvironmentCategory::Agricultural => 1,
            EnvironmentCategory::Shade => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EnvironmentCategory::Desert => "Desert",
            EnvironmentCategory::Agricultural => "Agricultural",
            EnvironmentCategory::Shade => "Shade",
        }
    }
}

impl fmt::Display for EnvironmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown environment category '{0}' (expected Desert, Agricultural or Shade)")]
pub struct UnknownCategory(pub String);

impl FromStr for EnvironmentCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Desert" | "desert" => Ok(EnvironmentCategory::Desert),
            "Agricultural" | "agricultural" => Ok(EnvironmentCategory::Agricultural),
            "Shade" | "shade" => Ok(EnvironmentCategory::Shade),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// Slider definition for one measured feature
#[derive(Debug, Clone, Copy)]
pub struct FeatureSpec {
    /// Form field / JSON key
    pub key: &'static str,
    /// Column name in the health dataset
    pub column: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub step: f64,
}

impl FeatureSpec {
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.default;
        }
        value.clamp(self.min, self.max)
    }
}

/// Sliders in model input order
pub const FEATURE_SPECS: [FeatureSpec; MEASURED_FEATURES] = [
    FeatureSpec { key: "soil_moisture", column: "Soil_Moisture", label: "Soil Moisture", min: 0.0, max: 100.0, default: 25.0, step: 0.1 },
    FeatureSpec { key: "ambient_temperature", column: "Ambient_Temperature", label: "Ambient Temperature", min: 0.0, max: 50.0, default: 25.0, step: 0.1 },
    FeatureSpec { key: "soil_temperature", column: "Soil_Temperature", label: "Soil Temperature", min: 0.0, max: 50.0, default: 25.0, step: 0.1 },
    FeatureSpec { key: "humidity", column: "Humidity", label: "Humidity", min: 0.0, max: 100.0, default: 50.0, step: 0.1 },
    FeatureSpec { key: "light_intensity", column: "Light_Intensity", label: "Light Intensity", min: 0.0, max: 1000.0, default: 400.0, step: 1.0 },
    FeatureSpec { key: "soil_ph", column: "Soil_pH", label: "Soil pH", min: 3.0, max: 9.0, default: 6.5, step: 0.01 },
    FeatureSpec { key: "nitrogen", column: "Nitrogen_Level", label: "Nitrogen Level", min: 0.0, max: 50.0, default: 15.0, step: 0.1 },
    FeatureSpec { key: "phosphorus", column: "Phosphorus_Level", label: "Phosphorus Level", min: 0.0, max: 50.0, default: 15.0, step: 0.1 },
    FeatureSpec { key: "potassium", column: "Potassium_Level", label: "Potassium Level", min: 0.0, max: 50.0, default: 15.0, step: 0.1 },
    FeatureSpec { key: "chlorophyll", column: "Chlorophyll_Content", label: "Chlorophyll Content", min: 0.0, max: 100.0, default: 30.0, step: 0.1 },
    FeatureSpec { key: "electrochemical_signal", column: "Electrochemical_Signal", label: "Electrochemical Signal", min: 0.0, max: 2.0, default: 1.0, step: 0.01 },
];

/// Measured values entered in step 2
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub soil_moisture: f64,
    pub ambient_temperature: f64,
    pub soil_temperature: f64,
    pub humidity: f64,
    pub light_intensity: f64,
    pub soil_ph: f64,
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub chlorophyll: f64,
    pub electrochemical_signal: f64,
}

impl Default for FeatureVector {
    /// Slider defaults
    fn default() -> Self {
        Self::from_array(FEATURE_SPECS.map(|spec| spec.default))
    }
}

impl FeatureVector {
    pub fn from_array(values: [f64; MEASURED_FEATURES]) -> Self {
        let [soil_moisture, ambient_temperature, soil_temperature, humidity, light_intensity, soil_ph, nitrogen, phosphorus, potassium, chlorophyll, electrochemical_signal] =
            values;
        Self {
            soil_moisture,
            ambient_temperature,
            soil_temperature,
            humidity,
            light_intensity,
            soil_ph,
            nitrogen,
            phosphorus,
            potassium,
            chlorophyll,
            electrochemical_signal,
        }
    }

    /// Measured values in model input order
    pub fn to_array(&self) -> [f64; MEASURED_FEATURES] {
        [
            self.soil_moisture,
            self.ambient_temperature,
            self.soil_temperature,
            self.humidity,
            self.light_intensity,
            self.soil_ph,
            self.nitrogen,
            self.phosphorus,
            self.potassium,
            self.chlorophyll,
            self.electrochemical_signal,
        ]
    }

    /// Apply the slider range of every field
    pub fn clamped(&self) -> Self {
        let values = self.to_array();
        let mut out = [0.0; MEASURED_FEATURES];
        for (i, spec) in FEATURE_SPECS.iter().enumerate() {
            out[i] = spec.clamp(values[i]);
        }
        Self::from_array(out)
    }

    /// Build the 12-element classifier input, category encoded last
    pub fn to_model_input(&self, category: EnvironmentCategory) -> [f64; MODEL_INPUT_WIDTH] {
        let mut input = [0.0; MODEL_INPUT_WIDTH];
        input[..MEASURED_FEATURES].copy_from_slice(&self.to_array());
        input[MEASURED_FEATURES] = f64::from(category.encode());
        input
    }
}
