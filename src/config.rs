//! Runtime configuration from environment variables
//!
//! - `DATA_DIR`: directory holding the artifacts (default: current directory)
//! - `MODEL_FILE`, `SCALER_FILE`, `DATASET_FILE`: override individual paths
//!   (relative values resolve against `DATA_DIR`)
//! - `PORT`: listen port (default 8501)
//! - `SESSION_TTL_SECS`: idle time before a wizard session is dropped

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::resources::ResourcePaths;

pub const DEFAULT_PORT: u16 = 8501;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub data_dir: PathBuf,
    pub paths: ResourcePaths,
    pub port: u16,
    pub session_ttl: Duration,
}

impl DashboardConfig {
    /// Defaults rooted at `data_dir`
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            paths: ResourcePaths::in_dir(&data_dir),
            data_dir,
            port: DEFAULT_PORT,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source (environment in production)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = lookup("DATA_DIR").unwrap_or_else(|| ".".to_string());
        let mut config = Self::with_data_dir(&data_dir);

        let base = config.data_dir.clone();
        let resolve = |value: String| -> PathBuf {
            let path = Path::new(&value);
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                base.join(path)
            }
        };

        if let Some(model) = lookup("MODEL_FILE") {
            config.paths.model = resolve(model);
        }
        if let Some(scaler) = lookup("SCALER_FILE") {
            config.paths.scaler = resolve(scaler);
        }
        if let Some(dataset) = lookup("DATASET_FILE") {
            config.paths.dataset = resolve(dataset);
        }

        config.port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        config.session_ttl = lookup("SESSION_TTL_SECS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(config.session_ttl);

        config
    }
}
