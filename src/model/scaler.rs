//! Feature scaler artifacts
//!
//! The training side exports its fitted scaler as JSON; only the fitted
//! parameters are needed to reproduce `transform`.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::FeatureScaler;

/// Fitted scaler, tagged by `kind`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerArtifact {
    Standard(StandardScaler),
    MinMax(MinMaxScaler),
}

/// `(x - mean) / scale`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// `x * scale + min`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MinMaxScaler {
    pub min: Vec<f64>,
    pub scale: Vec<f64>,
}

impl ScalerArtifact {
    /// Load scaler from JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scaler file: {:?}", path))?;

        let scaler: ScalerArtifact = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse scaler JSON: {:?}", path))?;

        scaler
            .validate()
            .with_context(|| format!("Invalid scaler artifact: {:?}", path))?;

        Ok(scaler)
    }

    fn validate(&self) -> Result<()> {
        let (name, a, b) = match self {
            ScalerArtifact::Standard(s) => ("mean", &s.mean, &s.scale),
            ScalerArtifact::MinMax(s) => ("min", &s.min, &s.scale),
        };

        if a.is_empty() {
            bail!("scaler has no features");
        }
        if a.len() != b.len() {
            bail!("{} has {} entries but scale has {}", name, a.len(), b.len());
        }
        if a.iter().chain(b.iter()).any(|v| !v.is_finite()) {
            bail!("scaler parameters must be finite");
        }
        Ok(())
    }
}

impl FeatureScaler for ScalerArtifact {
    fn n_features(&self) -> usize {
        match self {
            ScalerArtifact::Standard(s) => s.mean.len(),
            ScalerArtifact::MinMax(s) => s.min.len(),
        }
    }

    fn transform(&self, input: &[f64]) -> Result<Vec<f64>> {
        if input.len() != self.n_features() {
            bail!(
                "scaler expects {} features, got {}",
                self.n_features(),
                input.len()
            );
        }

        let out = match self {
            ScalerArtifact::Standard(s) => input
                .iter()
                .zip(s.mean.iter().zip(&s.scale))
                .map(|(x, (mean, scale))| {
                    // zero-variance columns are left unscaled
                    let scale = if *scale == 0.0 { 1.0 } else { *scale };
                    (x - mean) / scale
                })
                .collect(),
            ScalerArtifact::MinMax(s) => input
                .iter()
                .zip(s.min.iter().zip(&s.scale))
                .map(|(x, (min, scale))| x * scale + min)
                .collect(),
        };

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_standard_transform() {
        let scaler = ScalerArtifact::Standard(StandardScaler {
            mean: vec![50.0, 10.0, 3.0],
            scale: vec![25.0, 2.0, 0.0],
        });

        let out = scaler.transform(&[30.0, 14.0, 5.0]).unwrap();
        assert_relative_eq!(out[0], -0.8);
        assert_relative_eq!(out[1], 2.0);
        assert_relative_eq!(out[2], 2.0);
    }

    #[test]
    fn test_min_max_transform() {
        let scaler = ScalerArtifact::MinMax(MinMaxScaler {
            min: vec![0.0, -0.5],
            scale: vec![0.01, 0.1],
        });

        let out = scaler.transform(&[50.0, 10.0]).unwrap();
        assert_relative_eq!(out[0], 0.5);
        assert_relative_eq!(out[1], 0.5);
    }

    #[test]
    fn test_width_mismatch() {
        let scaler = ScalerArtifact::Standard(StandardScaler {
            mean: vec![0.0; 12],
            scale: vec![1.0; 12],
        });
        assert!(scaler.transform(&[1.0; 11]).is_err());
    }

    #[test]
    fn test_parse_tagged_json() {
        let json = r#"{"kind": "standard", "mean": [1.0, 2.0], "scale": [1.0, 4.0]}"#;
        let scaler: ScalerArtifact = serde_json::from_str(json).unwrap();
        assert_eq!(scaler.n_features(), 2);
        assert!(scaler.validate().is_ok());

        let bad = r#"{"kind": "standard", "mean": [1.0, 2.0], "scale": [1.0]}"#;
        let scaler: ScalerArtifact = serde_json::from_str(bad).unwrap();
        assert!(scaler.validate().is_err());
    }
}
