//! Advisory rules for stressed plants
//!
//! Each rule is an independent threshold check on the raw (unscaled)
//! measurements. Rules never look at the environment category or at each
//! other; every matching rule fires, in table order.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::features::FeatureVector;
use crate::prediction::HealthStatus;

/// Which threshold fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryRule {
    LowSoilMoisture,
    LowNitrogen,
    SoilPhOutOfRange,
    LowLight,
    TemperatureOutOfRange,
}

/// Recommendation card shown under a stress prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryMessage {
    pub rule: AdvisoryRule,
    pub icon: String,
    pub message: String,
}

pub type Advisories = SmallVec<[AdvisoryMessage; 5]>;

struct RuleDef {
    rule: AdvisoryRule,
    icon: &'static str,
    message: &'static str,
    fires: fn(&FeatureVector) -> bool,
}

const RULES: [RuleDef; 5] = [
    RuleDef {
        rule: AdvisoryRule::LowSoilMoisture,
        icon: "💧",
        message: "Increase watering: Soil moisture is too low.",
        fires: |f| f.soil_moisture < 30.0,
    },
    RuleDef {
        rule: AdvisoryRule::LowNitrogen,
        icon: "🌱",
        message: "Apply nitrogen-rich fertilizer: Nitrogen level is insufficient.",
        fires: |f| f.nitrogen < 10.0,
    },
    RuleDef {
        rule: AdvisoryRule::SoilPhOutOfRange,
        icon: "🧪",
        message: "Adjust soil pH: Ideal range is 5.5 to 7.5.",
        fires: |f| f.soil_ph < 5.5 || f.soil_ph > 7.5,
    },
    RuleDef {
        rule: AdvisoryRule::LowLight,
        icon: "🔆",
        message: "Increase light exposure: Light intensity is lower than optimal.",
        fires: |f| f.light_intensity < 300.0,
    },
    RuleDef {
        rule: AdvisoryRule::TemperatureOutOfRange,
        icon: "🌡️",
        message: "Temperature adjustment: Keep ambient temperature between 15°C and 35°C.",
        fires: |f| f.ambient_temperature < 15.0 || f.ambient_temperature > 35.0,
    },
];

/// Every rule whose threshold is crossed, regardless of prediction
pub fn evaluate_rules(features: &FeatureVector) -> Advisories {
    RULES
        .iter()
        .filter(|def| (def.fires)(features))
        .map(|def| AdvisoryMessage {
            rule: def.rule,
            icon: def.icon.to_string(),
            message: def.message.to_string(),
        })
        .collect()
}

/// Recommendations for a prediction; empty for healthy plants
pub fn advise(features: &FeatureVector, status: HealthStatus) -> Advisories {
    if !status.is_stressed() {
        return Advisories::new();
    }
    evaluate_rules(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Inside every healthy range
    fn comfortable() -> FeatureVector {
        FeatureVector {
            soil_moisture: 80.0,
            ambient_temperature: 25.0,
            nitrogen: 20.0,
            soil_ph: 6.5,
            light_intensity: 500.0,
            ..FeatureVector::default()
        }
    }

    fn rules(advisories: &Advisories) -> Vec<AdvisoryRule> {
        advisories.iter().map(|a| a.rule).collect()
    }

    #[test]
    fn test_healthy_gets_no_advice() {
        let mut features = comfortable();
        features.soil_moisture = 5.0;
        assert!(advise(&features, HealthStatus::Healthy).is_empty());
    }

    #[test]
    fn test_all_thresholds_crossed() {
        let features = FeatureVector {
            soil_moisture: 10.0,
            nitrogen: 5.0,
            soil_ph: 8.0,
            light_intensity: 200.0,
            ambient_temperature: 40.0,
            ..FeatureVector::default()
        };

        for status in [HealthStatus::ModerateStress, HealthStatus::HighStress] {
            let advice = advise(&features, status);
            assert_eq!(
                rules(&advice),
                vec![
                    AdvisoryRule::LowSoilMoisture,
                    AdvisoryRule::LowNitrogen,
                    AdvisoryRule::SoilPhOutOfRange,
                    AdvisoryRule::LowLight,
                    AdvisoryRule::TemperatureOutOfRange,
                ]
            );
        }
    }

    #[test]
    fn test_stressed_but_comfortable_gets_nothing() {
        assert!(advise(&comfortable(), HealthStatus::HighStress).is_empty());
    }

    #[test]
    fn test_single_threshold_adds_single_message() {
        let base = comfortable();
        let cases: [(fn(&mut FeatureVector), AdvisoryRule); 7] = [
            (|f| f.soil_moisture = 25.0, AdvisoryRule::LowSoilMoisture),
            (|f| f.nitrogen = 9.9, AdvisoryRule::LowNitrogen),
            (|f| f.soil_ph = 5.4, AdvisoryRule::SoilPhOutOfRange),
            (|f| f.soil_ph = 7.6, AdvisoryRule::SoilPhOutOfRange),
            (|f| f.light_intensity = 299.0, AdvisoryRule::LowLight),
            (|f| f.ambient_temperature = 14.0, AdvisoryRule::TemperatureOutOfRange),
            (|f| f.ambient_temperature = 36.0, AdvisoryRule::TemperatureOutOfRange),
        ];

        for (mutate, expected) in cases {
            let mut features = base;
            mutate(&mut features);
            assert_eq!(
                rules(&advise(&features, HealthStatus::ModerateStress)),
                vec![expected]
            );
        }
    }

    #[test]
    fn test_rules_are_independent_of_other_fields() {
        // Dropping moisture adds exactly the watering message, whatever else fired
        let mut dry_everything = FeatureVector {
            soil_moisture: 35.0,
            nitrogen: 5.0,
            soil_ph: 4.0,
            light_intensity: 100.0,
            ambient_temperature: 5.0,
            ..FeatureVector::default()
        };
        let before = rules(&evaluate_rules(&dry_everything));
        dry_everything.soil_moisture = 25.0;
        let after = rules(&evaluate_rules(&dry_everything));

        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(after[0], AdvisoryRule::LowSoilMoisture);
        assert_eq!(&after[1..], &before[..]);
    }

    #[test]
    fn test_boundaries_do_not_fire() {
        let features = FeatureVector {
            soil_moisture: 30.0,
            nitrogen: 10.0,
            soil_ph: 5.5,
            light_intensity: 300.0,
            ambient_temperature: 35.0,
            ..FeatureVector::default()
        };
        assert!(evaluate_rules(&features).is_empty());

        let features = FeatureVector { soil_ph: 7.5, ambient_temperature: 15.0, ..features };
        assert!(evaluate_rules(&features).is_empty());
    }
}
