//! Health Dataset Loading
//!
//! Loads the static plant health CSV with Polars. The dataset only feeds the
//! visualization panel; wizard predictions never touch it.

use anyhow::{bail, Context, Result};
use polars::prelude::*;
use std::path::Path;

use crate::prediction::HealthStatus;
use crate::visualization::ChartFeature;

/// Outcome column of the dataset (textual or numeric)
pub const STATUS_COLUMN: &str = "Plant_Health_Status";

/// Static dataset of recorded measurements and health outcomes
pub struct HealthDataset {
    frame: DataFrame,
}

impl HealthDataset {
    /// Load dataset CSV
    ///
    /// Fails if the file is missing or unreadable, or if the status column or
    /// any chartable feature column is absent.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::info!("Loading health dataset: {:?}", path);

        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .with_context(|| format!("Failed to create CSV reader: {:?}", path))?
            .finish()
            .with_context(|| format!("Failed to load dataset CSV: {:?}", path))?;

        let dataset = Self::from_frame(frame)?;
        for feature in ChartFeature::ALL {
            if dataset.frame.column(feature.column()).is_err() {
                bail!("Dataset {:?} has no '{}' column", path, feature.column());
            }
        }

        tracing::info!("  Rows: {}", dataset.height());
        Ok(dataset)
    }

    /// Wrap an in-memory frame (must carry the status column)
    pub fn from_frame(frame: DataFrame) -> Result<Self> {
        if frame.column(STATUS_COLUMN).is_err() {
            bail!("Dataset has no '{}' column", STATUS_COLUMN);
        }
        Ok(Self { frame })
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Health status per row
    ///
    /// Textual labels are mapped through the status table; numeric columns
    /// are used as codes. Unmapped labels and codes become `None`.
    pub fn statuses(&self) -> Result<Vec<Option<HealthStatus>>> {
        let column = self.frame.column(STATUS_COLUMN)?;

        if matches!(column.dtype(), DataType::String) {
            let labels = column
                .str()
                .with_context(|| format!("Column '{}' is not string type", STATUS_COLUMN))?;
            return Ok(labels
                .into_iter()
                .map(|label| label.and_then(status_from_label))
                .collect());
        }

        let codes = column
            .cast(&DataType::Float64)
            .with_context(|| format!("Column '{}' is neither text nor numeric", STATUS_COLUMN))?;
        let codes = codes.f64()?;
        Ok(codes
            .into_iter()
            .map(|code| code.and_then(status_from_code))
            .collect())
    }

    /// Numeric values of a column, nulls preserved
    pub fn numeric_column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let column = self
            .frame
            .column(name)
            .with_context(|| format!("Column '{}' not found", name))?
            .cast(&DataType::Float64)
            .with_context(|| format!("Column '{}' is not numeric", name))?;

        Ok(column.f64()?.into_iter().collect())
    }
}

fn status_from_label(label: &str) -> Option<HealthStatus> {
    match label.trim() {
        "Healthy" => Some(HealthStatus::Healthy),
        "Moderate Stress" => Some(HealthStatus::ModerateStress),
        "High Stress" => Some(HealthStatus::HighStress),
        _ => None,
    }
}

fn status_from_code(code: f64) -> Option<HealthStatus> {
    if code.fract() != 0.0 {
        return None;
    }
    HealthStatus::from_code(code as i64).ok()
}
