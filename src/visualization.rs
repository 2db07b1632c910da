//! Visualization Panel
//!
//! Per-status means of a whitelisted feature over the static dataset, and the
//! SVG bar chart that displays them.

use anyhow::Result;
use plotters::coord::ranged1d::{IntoSegmentedCoord, SegmentValue};
use plotters::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::data::HealthDataset;
use crate::prediction::{ContractError, HealthStatus};

/// Features offered in the chart selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartFeature {
    #[serde(rename = "Soil_Moisture")]
    SoilMoisture,
    #[serde(rename = "Nitrogen_Level")]
    NitrogenLevel,
}

impl ChartFeature {
    pub const ALL: [ChartFeature; 2] = [ChartFeature::SoilMoisture, ChartFeature::NitrogenLevel];

    /// Dataset column name
    pub fn column(self) -> &'static str {
        match self {
            ChartFeature::SoilMoisture => "Soil_Moisture",
            ChartFeature::NitrogenLevel => "Nitrogen_Level",
        }
    }

    pub fn note_icon(self) -> &'static str {
        match self {
            ChartFeature::SoilMoisture => "💧",
            ChartFeature::NitrogenLevel => "🌱",
        }
    }

    /// Interpretation hint shown under the chart
    pub fn note(self) -> &'static str {
        match self {
            ChartFeature::SoilMoisture => "Dry soil often indicates high stress.",
            ChartFeature::NitrogenLevel => "Low nitrogen = weak growth.",
        }
    }
}

impl fmt::Display for ChartFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for ChartFeature {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChartFeature::ALL
            .into_iter()
            .find(|feature| feature.column() == s)
            .ok_or_else(|| ContractError::UnsupportedFeature(s.to_string()))
    }
}

/// Mean of the selected feature for one status group
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusMean {
    pub status: HealthStatus,
    pub label: &'static str,
    pub mean: f64,
    pub count: usize,
}

/// Mean of `feature` per health status, in Healthy → Moderate → High Stress
/// order. Empty groups are omitted.
pub fn aggregate(dataset: &HealthDataset, feature: ChartFeature) -> Result<Vec<StatusMean>> {
    let statuses = dataset.statuses()?;
    let values = dataset.numeric_column(feature.column())?;

    let mut groups: FxHashMap<HealthStatus, (f64, usize)> = FxHashMap::default();
    for (status, value) in statuses.into_iter().zip(values) {
        if let (Some(status), Some(value)) = (status, value) {
            if value.is_nan() {
                continue;
            }
            let entry = groups.entry(status).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }

    let means = HealthStatus::ALL
        .into_iter()
        .filter_map(|status| {
            groups.get(&status).map(|&(sum, count)| StatusMean {
                status,
                label: status.short_label(),
                mean: sum / count as f64,
                count,
            })
        })
        .collect();

    Ok(means)
}

// ============================================================================
// Bar Chart
// ============================================================================

const BAR_COLOR: RGBColor = RGBColor(0x4C, 0xAF, 0x50);
const CHART_SIZE: (u32, u32) = (680, 360);

/// Bar chart of per-status means with the three fixed status ticks
#[derive(Debug, Clone)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<StatusMean>,
}

impl BarChart {
    pub fn for_feature(feature: ChartFeature, bars: Vec<StatusMean>) -> Self {
        Self {
            title: format!("Average {} per Plant Health Status", feature.column()),
            x_label: "Health Status".to_string(),
            y_label: format!("Avg {}", feature.column()),
            bars,
        }
    }

    /// Render as inline SVG
    pub fn to_svg(&self) -> Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
            root.fill(&WHITE)?;

            let max_value = self.bars.iter().map(|b| b.mean).fold(0.0_f64, f64::max);
            let y_max = if max_value > 0.0 { max_value * 1.1 } else { 1.0 };
            let last_slot = HealthStatus::ALL.len() as u32 - 1;

            let mut chart = ChartBuilder::on(&root)
                .caption(&self.title, ("sans-serif", 20))
                .margin(10)
                .x_label_area_size(40)
                .y_label_area_size(60)
                .build_cartesian_2d((0u32..last_slot).into_segmented(), 0f64..y_max)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(HealthStatus::ALL.len())
                .x_label_formatter(&tick_label)
                .x_desc(self.x_label.as_str())
                .y_desc(self.y_label.as_str())
                .draw()?;

            // Statuses with no rows keep their tick but get no bar
            chart.draw_series(self.bars.iter().map(|bar| {
                let slot = bar.status.code() as u32;
                let mut rect = Rectangle::new(
                    [
                        (SegmentValue::Exact(slot), 0.0),
                        (SegmentValue::Exact(slot + 1), bar.mean.max(0.0)),
                    ],
                    BAR_COLOR.filled(),
                );
                rect.set_margin(0, 0, 24, 24);
                rect
            }))?;

            root.present()?;
        }
        Ok(svg)
    }
}

fn tick_label(slot: &SegmentValue<u32>) -> String {
    match slot {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => HealthStatus::ALL
            .get(*i as usize)
            .map(|status| status.short_label().to_string())
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    }
}
