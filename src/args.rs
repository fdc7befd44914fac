use clap::Parser;
use std::path::PathBuf;

use crate::config::{TrainConfig, DEFAULT_CONFIG_PATH};
use crate::types::ImageSize;

/// Train the combined pitch/yaw gaze model
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct TrainArgs {
    /// Training settings file (created with defaults if missing)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Dataset root containing `gaze/labels.csv`
    #[arg(long)]
    pub dataset_dir: Option<PathBuf>,

    /// Where the model and history are written
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    #[arg(long)]
    pub epochs: Option<usize>,

    #[arg(long)]
    pub batch_size: Option<usize>,

    #[arg(long)]
    pub learning_rate: Option<f64>,

    /// Seed for the train/test split, shuffling and augmentation
    #[arg(long)]
    pub seed: Option<u64>,

    /// Force CPU even if an accelerator is available
    #[arg(long, default_value_t = false)]
    pub cpu: bool,
}

impl TrainArgs {
    /// Command-line values take precedence over the config file
    pub fn apply(&self, mut config: TrainConfig) -> TrainConfig {
        if let Some(dir) = &self.dataset_dir {
            config.dataset_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(epochs) = self.epochs {
            config.epochs = epochs;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(lr) = self.learning_rate {
            config.learning_rate = lr;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config
    }
}

/// Export gaze and openness datasets from SQLite DB to folders with images and CSV labels.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct ExportArgs {
    /// Path to the SQLite database file
    #[arg(long, alias = "db_path")]
    pub db_path: PathBuf,

    /// Output directory for images and CSV
    #[arg(long, alias = "output_dir", default_value = "./dataset")]
    pub output_dir: PathBuf,

    /// Image size as two integers (width height)
    #[arg(long, alias = "img_size", num_args = 2, value_names = ["WIDTH", "HEIGHT"], default_values_t = [128u32, 128])]
    pub img_size: Vec<u32>,

    /// Clear output directory before exporting
    #[arg(long, default_value_t = false)]
    pub clear: bool,
}

impl ExportArgs {
    pub fn image_size(&self) -> ImageSize {
        match self.img_size.as_slice() {
            [w, h] => ImageSize::new(*w, *h),
            _ => ImageSize::default(),
        }
    }
}

/// Preview random samples from the eye tracking dataset.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct PreviewArgs {
    /// Path to the SQLite database file
    #[arg(long, alias = "db_path")]
    pub db_path: PathBuf,

    /// Number of samples to preview
    #[arg(long, alias = "num_samples", default_value_t = 8)]
    pub num_samples: usize,

    /// Write the preview sheet to this PNG instead of opening a window
    #[arg(long)]
    pub save: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_defaults() {
        let args = ExportArgs::try_parse_from(["export_dataset", "--db-path", "capture.db"]).unwrap();
        assert_eq!(args.output_dir, PathBuf::from("./dataset"));
        assert_eq!(args.image_size(), ImageSize::new(128, 128));
        assert!(!args.clear);
    }

    #[test]
    fn export_accepts_underscore_flags() {
        let args = ExportArgs::try_parse_from([
            "export_dataset",
            "--db_path",
            "capture.db",
            "--img_size",
            "64",
            "32",
            "--clear",
        ])
        .unwrap();
        assert_eq!(args.image_size(), ImageSize::new(64, 32));
        assert!(args.clear);
    }

    #[test]
    fn db_path_is_required() {
        assert!(PreviewArgs::try_parse_from(["preview_dataset"]).is_err());
    }

    #[test]
    fn overrides_replace_config_values() {
        let args = TrainArgs::try_parse_from(["gaze_trainer", "--epochs", "3", "--output-dir", "out"]).unwrap();
        let cfg = args.apply(TrainConfig::default());
        assert_eq!(cfg.epochs, 3);
        assert_eq!(cfg.output_dir, PathBuf::from("out"));
        assert_eq!(cfg.batch_size, 32);
    }
}
