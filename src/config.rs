use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DatasetError;
use crate::types::ImageSize;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Maximum pixel offset for random translation
    pub max_offset: u32,
    pub batch_size: usize,
    pub img_size: ImageSize,
    pub learning_rate: f64,
    pub dataset_dir: PathBuf,
    pub output_dir: PathBuf,
    pub epochs: usize,
    pub test_split: f64,
    pub val_split: f64,
    pub seed: u64,
    pub callbacks: CallbackConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbackConfig {
    pub lr_factor: f64,
    pub lr_patience: usize,
    pub min_lr: f64,
    pub early_stopping_patience: usize,
    pub restore_best_weights: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            max_offset: 10,
            batch_size: 32,
            img_size: ImageSize::default(),
            learning_rate: 0.002,
            dataset_dir: PathBuf::from("./dataset"),
            output_dir: PathBuf::from("./res"),
            epochs: 30,
            test_split: 0.2,
            val_split: 0.1,
            seed: 42,
            callbacks: CallbackConfig::default(),
        }
    }
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            lr_factor: 0.5,
            lr_patience: 6,
            min_lr: 1e-6,
            early_stopping_patience: 3,
            restore_best_weights: true,
        }
    }
}

impl TrainConfig {
    /// Loads the config at `path`, falling back to defaults, and writes the
    /// resolved values back so new fields show up in the file.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = fs::read_to_string(path)?;
            match serde_json::from_str::<TrainConfig>(&content) {
                Ok(c) => {
                    tracing::info!(path = %path.display(), "loaded configuration");
                    c
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "error parsing config, loading defaults");
                    Self::default()
                }
            }
        } else {
            tracing::info!(path = %path.display(), "configuration file not found, creating default");
            Self::default()
        };

        config.save(path)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Model input shape as (height, width, channels)
    pub fn input_shape(&self) -> (usize, usize, usize) {
        (
            self.img_size.height as usize,
            self.img_size.combined_width() as usize,
            1,
        )
    }

    pub fn gaze_dataset_dir(&self) -> PathBuf {
        self.dataset_dir.join("gaze")
    }

    pub fn validate(&self) -> std::result::Result<(), DatasetError> {
        if self.batch_size == 0 {
            return Err(DatasetError::Config("batch_size must be positive".into()));
        }
        if self.epochs == 0 {
            return Err(DatasetError::Config("epochs must be positive".into()));
        }
        if self.img_size.width == 0 || self.img_size.height == 0 {
            return Err(DatasetError::Config("img_size must be non-zero".into()));
        }
        let max_shift = self.img_size.height.min(self.img_size.combined_width());
        if self.max_offset >= max_shift {
            return Err(DatasetError::Config(format!(
                "max_offset must be below {} for a {}x{} eye crop",
                max_shift, self.img_size.width, self.img_size.height
            )));
        }
        if !(0.0..1.0).contains(&self.test_split) || !(0.0..1.0).contains(&self.val_split) {
            return Err(DatasetError::Config("splits must lie in [0, 1)".into()));
        }
        let factor = self.callbacks.lr_factor;
        if !(factor > 0.0 && factor < 1.0) {
            return Err(DatasetError::Config("lr_factor must lie in (0, 1)".into()));
        }
        if self.learning_rate <= 0.0 {
            return Err(DatasetError::Config("learning_rate must be positive".into()));
        }
        Ok(())
    }
}
