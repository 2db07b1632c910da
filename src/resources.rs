//! Resource Loader
//!
//! Lazily reads the classifier, scaler and dataset once per process and hands
//! out shared read-only handles afterwards.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use crate::data::HealthDataset;
use crate::model::{ClassifierArtifact, ScalerArtifact};
use crate::prediction::Predictor;

pub const DEFAULT_MODEL_FILE: &str = "plant_model_balanced.json";
pub const DEFAULT_SCALER_FILE: &str = "plant_scaler.json";
pub const DEFAULT_DATASET_FILE: &str = "updated_plant_health_data.csv";

/// Locations of the three static inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
    pub dataset: PathBuf,
}

impl ResourcePaths {
    /// Default file names inside `data_dir`
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        let dir = data_dir.as_ref();
        Self {
            model: dir.join(DEFAULT_MODEL_FILE),
            scaler: dir.join(DEFAULT_SCALER_FILE),
            dataset: dir.join(DEFAULT_DATASET_FILE),
        }
    }
}

/// Memoized loader; each resource is read from disk at most once
pub struct ResourceLoader {
    paths: ResourcePaths,
    model: OnceLock<Arc<ClassifierArtifact>>,
    scaler: OnceLock<Arc<ScalerArtifact>>,
    dataset: OnceLock<Arc<HealthDataset>>,
    // Serializes first loads so a racing caller waits instead of re-reading
    init_lock: Mutex<()>,
}

impl ResourceLoader {
    pub fn new(paths: ResourcePaths) -> Self {
        Self {
            paths,
            model: OnceLock::new(),
            scaler: OnceLock::new(),
            dataset: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    pub fn load_model(&self) -> Result<Arc<ClassifierArtifact>> {
        self.get_or_load(&self.model, || {
            tracing::info!("Loading classifier: {:?}", self.paths.model);
            ClassifierArtifact::load(&self.paths.model)
        })
    }

    pub fn load_scaler(&self) -> Result<Arc<ScalerArtifact>> {
        self.get_or_load(&self.scaler, || {
            tracing::info!("Loading scaler: {:?}", self.paths.scaler);
            ScalerArtifact::load(&self.paths.scaler)
        })
    }

    pub fn load_dataset(&self) -> Result<Arc<HealthDataset>> {
        self.get_or_load(&self.dataset, || HealthDataset::load(&self.paths.dataset))
    }

    /// Scaler + classifier bundled for the wizard
    pub fn predictor(&self) -> Result<Predictor> {
        Predictor::new(self.load_scaler()?, self.load_model()?)
    }

    fn get_or_load<T>(
        &self,
        cell: &OnceLock<Arc<T>>,
        load: impl FnOnce() -> Result<T>,
    ) -> Result<Arc<T>> {
        if let Some(value) = cell.get() {
            return Ok(Arc::clone(value));
        }

        let _guard = self
            .init_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(value) = cell.get() {
            return Ok(Arc::clone(value));
        }

        let value = Arc::new(load()?);
        Ok(Arc::clone(cell.get_or_init(|| value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_default_paths() {
        let paths = ResourcePaths::in_dir("/srv/plants");
        assert_eq!(paths.model, PathBuf::from("/srv/plants/plant_model_balanced.json"));
        assert_eq!(paths.scaler, PathBuf::from("/srv/plants/plant_scaler.json"));
        assert_eq!(
            paths.dataset,
            PathBuf::from("/srv/plants/updated_plant_health_data.csv")
        );
    }

    #[test]
    fn test_get_or_load_runs_once() {
        let loader = ResourceLoader::new(ResourcePaths::in_dir("unused"));
        let cell: OnceLock<Arc<u32>> = OnceLock::new();
        let calls = Cell::new(0);

        let first = loader
            .get_or_load(&cell, || {
                calls.set(calls.get() + 1);
                Ok(7)
            })
            .unwrap();
        let second = loader
            .get_or_load(&cell, || {
                calls.set(calls.get() + 1);
                Ok(8)
            })
            .unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(*second, 7);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let loader = ResourceLoader::new(ResourcePaths::in_dir("unused"));
        let cell: OnceLock<Arc<u32>> = OnceLock::new();

        assert!(loader
            .get_or_load(&cell, || anyhow::bail!("corrupt"))
            .is_err());
        assert!(cell.get().is_none());
    }

    #[test]
    fn test_missing_files_fail() {
        let loader = ResourceLoader::new(ResourcePaths::in_dir("no/such/dir"));
        assert!(loader.load_model().is_err());
        assert!(loader.load_scaler().is_err());
        assert!(loader.load_dataset().is_err());
    }

    #[test]
    fn test_fixture_artifacts_load_once() {
        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");
        let loader = ResourceLoader::new(ResourcePaths::in_dir(dir));

        let dataset = loader.load_dataset().unwrap();
        assert_eq!(dataset.height(), 5);
        assert!(Arc::ptr_eq(&dataset, &loader.load_dataset().unwrap()));
        assert!(Arc::ptr_eq(&loader.load_model().unwrap(), &loader.load_model().unwrap()));

        let predictor = loader.predictor().unwrap();
        let stressed = crate::features::FeatureVector {
            soil_moisture: 10.0,
            nitrogen: 5.0,
            ..Default::default()
        };
        let status = predictor
            .classify(crate::features::EnvironmentCategory::Desert, &stressed)
            .unwrap();
        assert_eq!(status, crate::prediction::HealthStatus::HighStress);
    }
}
