//! Classifier artifacts
//!
//! Tree ensembles are stored in flattened node-array form: node `i` has
//! children `children_left[i]` / `children_right[i]` (`-1` on leaves), splits
//! on `feature[i] <= threshold[i]`, and carries per-class weights `value[i]`.

use anyhow::{anyhow, bail, Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::StressClassifier;

const LEAF: i64 = -1;

/// Fitted classifier, tagged by `kind`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierArtifact {
    DecisionTree(DecisionTreeClassifier),
    RandomForest(RandomForestClassifier),
    LogisticRegression(LogisticRegression),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DecisionTreeClassifier {
    pub n_features: usize,
    pub classes: Vec<i64>,
    pub tree: DecisionTree,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RandomForestClassifier {
    pub n_features: usize,
    pub classes: Vec<i64>,
    pub estimators: Vec<DecisionTree>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogisticRegression {
    pub n_features: usize,
    pub classes: Vec<i64>,
    /// One row per class, or a single row for a binary model
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

impl DecisionTree {
    fn validate(&self, n_features: usize, n_classes: usize) -> Result<()> {
        let n = self.children_left.len();
        if n == 0 {
            bail!("tree has no nodes");
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            bail!("tree node arrays have inconsistent lengths");
        }

        for i in 0..n {
            let (left, right) = (self.children_left[i], self.children_right[i]);
            if self.value[i].len() != n_classes {
                bail!("node {} has {} class weights, expected {}", i, self.value[i].len(), n_classes);
            }
            if left == LEAF {
                continue;
            }
            for child in [left, right] {
                if child <= i as i64 || child >= n as i64 {
                    bail!("node {} has invalid child index {}", i, child);
                }
            }
            let feature = self.feature[i];
            if feature < 0 || feature as usize >= n_features {
                bail!("node {} splits on feature {} outside 0..{}", i, feature, n_features);
            }
        }
        Ok(())
    }

    /// Class weights of the leaf reached by `input`
    ///
    /// Children always have larger indices than their parent (checked at
    /// load), so the walk terminates.
    fn leaf_value(&self, input: &[f64]) -> &[f64] {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            let feature = self.feature[node] as usize;
            node = if input[feature] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        &self.value[node]
    }
}

fn normalized(weights: &[f64]) -> Vec<f64> {
    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        weights.iter().map(|w| w / total).collect()
    } else {
        weights.to_vec()
    }
}

/// Index of the first maximum (ties resolve to the lowest index)
fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if v <= b => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

fn class_at(classes: &[i64], index: Option<usize>) -> Result<i64> {
    index
        .and_then(|i| classes.get(i).copied())
        .ok_or_else(|| anyhow!("classifier produced no class"))
}

impl ClassifierArtifact {
    /// Load classifier from JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read model file: {:?}", path))?;

        let model: ClassifierArtifact = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse model JSON: {:?}", path))?;

        model
            .validate()
            .with_context(|| format!("Invalid model artifact: {:?}", path))?;

        Ok(model)
    }

    pub fn classes(&self) -> &[i64] {
        match self {
            ClassifierArtifact::DecisionTree(m) => &m.classes,
            ClassifierArtifact::RandomForest(m) => &m.classes,
            ClassifierArtifact::LogisticRegression(m) => &m.classes,
        }
    }

    fn validate(&self) -> Result<()> {
        let n_features = self.n_features();
        let n_classes = self.classes().len();
        if n_features == 0 {
            bail!("model declares no input features");
        }
        if n_classes < 2 {
            bail!("model needs at least two classes, has {}", n_classes);
        }

        match self {
            ClassifierArtifact::DecisionTree(m) => m.tree.validate(n_features, n_classes),
            ClassifierArtifact::RandomForest(m) => {
                if m.estimators.is_empty() {
                    bail!("random forest has no estimators");
                }
                for (i, tree) in m.estimators.iter().enumerate() {
                    tree.validate(n_features, n_classes)
                        .with_context(|| format!("estimator {}", i))?;
                }
                Ok(())
            }
            ClassifierArtifact::LogisticRegression(m) => {
                let expected_rows = if n_classes == 2 { 1 } else { n_classes };
                if m.coef.len() != expected_rows || m.intercept.len() != expected_rows {
                    bail!(
                        "logistic regression needs {} coefficient rows and intercepts, has {} and {}",
                        expected_rows,
                        m.coef.len(),
                        m.intercept.len()
                    );
                }
                if m.coef.iter().any(|row| row.len() != n_features) {
                    bail!("coefficient rows must have {} entries", n_features);
                }
                Ok(())
            }
        }
    }
}

impl StressClassifier for ClassifierArtifact {
    fn n_features(&self) -> usize {
        match self {
            ClassifierArtifact::DecisionTree(m) => m.n_features,
            ClassifierArtifact::RandomForest(m) => m.n_features,
            ClassifierArtifact::LogisticRegression(m) => m.n_features,
        }
    }

    fn predict(&self, input: &[f64]) -> Result<i64> {
        if input.len() != self.n_features() {
            bail!(
                "model expects {} features, got {}",
                self.n_features(),
                input.len()
            );
        }

        match self {
            ClassifierArtifact::DecisionTree(m) => {
                class_at(&m.classes, argmax(m.tree.leaf_value(input)))
            }
            ClassifierArtifact::RandomForest(m) => {
                // Average per-tree class probabilities
                let votes = m
                    .estimators
                    .par_iter()
                    .map(|tree| normalized(tree.leaf_value(input)))
                    .reduce(
                        || vec![0.0; m.classes.len()],
                        |mut acc, proba| {
                            acc.iter_mut().zip(proba).for_each(|(a, p)| *a += p);
                            acc
                        },
                    );
                class_at(&m.classes, argmax(&votes))
            }
            ClassifierArtifact::LogisticRegression(m) => {
                let scores: Vec<f64> = m
                    .coef
                    .iter()
                    .zip(&m.intercept)
                    .map(|(row, b)| row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + b)
                    .collect();

                if scores.len() == 1 {
                    let index = if scores[0] > 0.0 { 1 } else { 0 };
                    class_at(&m.classes, Some(index))
                } else {
                    class_at(&m.classes, argmax(&scores))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// x0 <= 0.5 → class 1, else class 0
    fn stump() -> DecisionTree {
        DecisionTree {
            children_left: vec![1, -1, -1],
            children_right: vec![2, -1, -1],
            feature: vec![0, -2, -2],
            threshold: vec![0.5, -2.0, -2.0],
            value: vec![vec![5.0, 5.0], vec![1.0, 4.0], vec![4.0, 1.0]],
        }
    }

    #[test]
    fn test_decision_tree_predict() {
        let model = ClassifierArtifact::DecisionTree(DecisionTreeClassifier {
            n_features: 2,
            classes: vec![0, 1],
            tree: stump(),
        });
        assert!(model.validate().is_ok());

        assert_eq!(model.predict(&[0.2, 9.0]).unwrap(), 1);
        assert_eq!(model.predict(&[0.5, 9.0]).unwrap(), 1);
        assert_eq!(model.predict(&[0.7, 9.0]).unwrap(), 0);
        assert!(model.predict(&[0.7]).is_err());
    }

    #[test]
    fn test_random_forest_averages_probabilities() {
        // Second tree always votes class 0 with full confidence
        let constant = DecisionTree {
            children_left: vec![-1],
            children_right: vec![-1],
            feature: vec![-2],
            threshold: vec![-2.0],
            value: vec![vec![10.0, 0.0]],
        };
        let model = ClassifierArtifact::RandomForest(RandomForestClassifier {
            n_features: 1,
            classes: vec![0, 1],
            estimators: vec![stump(), stump(), constant],
        });
        assert!(model.validate().is_ok());

        // stump: [0.2, 0.8] twice + [1.0, 0.0] → [1.4, 1.6]
        assert_eq!(model.predict(&[0.1]).unwrap(), 1);
        // stump: [0.8, 0.2] twice + [1.0, 0.0]
        assert_eq!(model.predict(&[0.9]).unwrap(), 0);
    }

    #[test]
    fn test_logistic_regression_multiclass() {
        let model = ClassifierArtifact::LogisticRegression(LogisticRegression {
            n_features: 2,
            classes: vec![0, 1, 2],
            coef: vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![-1.0, -1.0]],
            intercept: vec![0.0, 0.0, 0.0],
        });
        assert!(model.validate().is_ok());

        assert_eq!(model.predict(&[3.0, 1.0]).unwrap(), 0);
        assert_eq!(model.predict(&[1.0, 3.0]).unwrap(), 1);
        assert_eq!(model.predict(&[-3.0, -3.0]).unwrap(), 2);
    }

    #[test]
    fn test_logistic_regression_binary() {
        let model = ClassifierArtifact::LogisticRegression(LogisticRegression {
            n_features: 1,
            classes: vec![0, 2],
            coef: vec![vec![1.0]],
            intercept: vec![-1.0],
        });
        assert!(model.validate().is_ok());
        assert_eq!(model.predict(&[2.0]).unwrap(), 2);
        assert_eq!(model.predict(&[0.5]).unwrap(), 0);
    }

    #[test]
    fn test_rejects_malformed_tree() {
        let mut tree = stump();
        tree.children_left[0] = 0; // self loop
        let model = ClassifierArtifact::DecisionTree(DecisionTreeClassifier {
            n_features: 2,
            classes: vec![0, 1],
            tree,
        });
        assert!(model.validate().is_err());

        let mut tree = stump();
        tree.feature[0] = 7;
        let model = ClassifierArtifact::DecisionTree(DecisionTreeClassifier {
            n_features: 2,
            classes: vec![0, 1],
            tree,
        });
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_argmax_first_wins() {
        assert_eq!(argmax(&[0.5, 0.5, 0.1]), Some(0));
        assert_eq!(argmax(&[]), None);
    }
}
