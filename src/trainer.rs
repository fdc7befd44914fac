//! Fit / evaluate / save loop for [`GazeNet`].

use anyhow::{anyhow, bail, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{AdamW, Module, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use chrono::prelude::*;
use colored::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::augment::RandomTranslation;
use crate::callbacks::{EarlyStopping, EarlyStoppingAction, ReduceLrOnPlateau};
use crate::config::TrainConfig;
use crate::generator::{EyeBatch, EyeDataGenerator};
use crate::labels::load_labels;
use crate::model::GazeNet;
use crate::split::split_rows;

pub const MODEL_FILE: &str = "combined_pitchyaw.safetensors";
pub const HISTORY_FILE: &str = "history.json";

/// Metal, then CUDA, then CPU
pub fn select_device(force_cpu: bool) -> Device {
    if force_cpu {
        return Device::Cpu;
    }
    Device::new_metal(0)
        .or_else(|_| Device::new_cuda(0))
        .unwrap_or(Device::Cpu)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub loss: f64,
    pub mae: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochRecord {
    pub epoch: usize,
    pub loss: f64,
    pub mae: f64,
    pub val_loss: Option<f64>,
    pub val_mae: Option<f64>,
    pub lr: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    pub epochs: Vec<EpochRecord>,
    pub best_epoch: Option<usize>,
    pub stopped_epoch: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub run_id: String,
    pub timestamp: String,
    pub config: TrainConfig,
    pub train_samples: usize,
    pub val_samples: usize,
    pub test_samples: usize,
    pub history: History,
    pub test: Option<Metrics>,
    pub model_path: PathBuf,
}

/// Running sample-weighted means of loss and MAE
#[derive(Default)]
struct MetricAccumulator {
    loss_sum: f64,
    mae_sum: f64,
    count: usize,
}

impl MetricAccumulator {
    fn add(&mut self, loss: f64, mae: f64, samples: usize) {
        self.loss_sum += loss * samples as f64;
        self.mae_sum += mae * samples as f64;
        self.count += samples;
    }

    fn finish(&self) -> Option<Metrics> {
        (self.count > 0).then(|| Metrics {
            loss: self.loss_sum / self.count as f64,
            mae: self.mae_sum / self.count as f64,
        })
    }
}

pub struct Trainer {
    varmap: VarMap,
    model: GazeNet,
    optimizer: AdamW,
    device: Device,
    augment: RandomTranslation,
    callbacks: crate::config::CallbackConfig,
    rng: StdRng,
}

impl Trainer {
    pub fn new(config: &TrainConfig, device: Device) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let (h, w, _) = config.input_shape();
        let model = GazeNet::new(vb, (h, w))?;

        let params = ParamsAdamW {
            lr: config.learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-7,
            weight_decay: 0.0,
        };
        let optimizer = AdamW::new(varmap.all_vars(), params)?;

        Ok(Self {
            varmap,
            model,
            optimizer,
            device,
            augment: RandomTranslation::new(config.max_offset),
            callbacks: config.callbacks.clone(),
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    pub fn model(&self) -> &GazeNet {
        &self.model
    }

    pub fn learning_rate(&self) -> f64 {
        self.optimizer.learning_rate()
    }

    fn to_tensors(&self, batch: &EyeBatch) -> Result<(Tensor, Tensor)> {
        let images = Tensor::from_slice(&batch.images, batch.image_dims(), &self.device)?;
        let labels = Tensor::from_slice(&batch.labels, (batch.len, 2), &self.device)?;
        Ok((images, labels))
    }

    fn loss_and_mae(&self, images: &Tensor, labels: &Tensor) -> Result<(Tensor, f64)> {
        let preds = self.model.forward(images)?;
        let loss = candle_nn::loss::mse(&preds, labels)?;
        let mae = (&preds - labels)?.abs()?.mean_all()?.to_scalar::<f32>()? as f64;
        Ok((loss, mae))
    }

    /// One pass over `gen` with augmentation and weight updates
    pub fn train_epoch(&mut self, gen: &mut EyeDataGenerator) -> Result<Metrics> {
        let mut acc = MetricAccumulator::default();
        for idx in 0..gen.len() {
            let mut batch = gen.batch(idx)?;
            self.augment.apply(&mut batch, &mut self.rng);
            let (images, labels) = self.to_tensors(&batch)?;
            let (loss, mae) = self.loss_and_mae(&images, &labels)?;
            self.optimizer.backward_step(&loss)?;

            let loss = loss.to_scalar::<f32>()? as f64;
            tracing::debug!(batch = idx, loss, mae, "train step");
            acc.add(loss, mae, batch.len);
        }
        gen.on_epoch_end();
        acc.finish().ok_or_else(|| anyhow!("Training generator produced no samples"))
    }

    /// Sample-weighted mean MSE and MAE, `None` for an empty generator
    pub fn evaluate(&self, gen: &EyeDataGenerator) -> Result<Option<Metrics>> {
        let mut acc = MetricAccumulator::default();
        for idx in 0..gen.len() {
            let batch = gen.batch(idx)?;
            let (images, labels) = self.to_tensors(&batch)?;
            let (loss, mae) = self.loss_and_mae(&images, &labels)?;
            acc.add(loss.to_scalar::<f32>()? as f64, mae, batch.len);
        }
        Ok(acc.finish())
    }

    fn snapshot(&self) -> Result<HashMap<String, Tensor>> {
        let vars = self.varmap.data().lock().map_err(|_| anyhow!("Weight store lock poisoned"))?;
        let mut weights = HashMap::with_capacity(vars.len());
        for (name, var) in vars.iter() {
            weights.insert(name.clone(), var.as_tensor().copy()?);
        }
        Ok(weights)
    }

    fn restore(&self, weights: &HashMap<String, Tensor>) -> Result<()> {
        let vars = self.varmap.data().lock().map_err(|_| anyhow!("Weight store lock poisoned"))?;
        for (name, var) in vars.iter() {
            if let Some(saved) = weights.get(name) {
                var.set(saved)?;
            }
        }
        Ok(())
    }

    pub fn fit(
        &mut self,
        train: &mut EyeDataGenerator,
        val: &EyeDataGenerator,
        epochs: usize,
    ) -> Result<History> {
        let (h, w) = self.model.input_shape();
        for gen in [&*train, val] {
            let size = gen.img_size();
            if (size.height as usize, size.combined_width() as usize) != (h, w) {
                bail!(
                    "Generator yields {}x{} pairs but the model expects {}x{}",
                    size.height,
                    size.combined_width(),
                    h,
                    w
                );
            }
        }
        tracing::info!(train = train.num_samples(), val = val.num_samples(), epochs, "starting fit");

        let cb = self.callbacks.clone();
        let mut lr_scheduler = ReduceLrOnPlateau::new(cb.lr_factor, cb.lr_patience, cb.min_lr);
        let mut early_stopping = EarlyStopping::new(cb.early_stopping_patience);
        let mut best_weights = None;
        let mut history = History::default();

        if val.is_empty() {
            tracing::warn!("validation split is empty, callbacks will monitor training loss");
        }

        for epoch in 0..epochs {
            let lr = self.learning_rate();
            let train_metrics = self.train_epoch(train)?;
            let val_metrics = self.evaluate(val)?;

            let mut line = format!(
                "Epoch {}/{} - loss: {:.4} - mae: {:.4}",
                epoch + 1,
                epochs,
                train_metrics.loss,
                train_metrics.mae
            );
            if let Some(v) = val_metrics {
                line.push_str(&format!(" - val_loss: {:.4} - val_mae: {:.4}", v.loss, v.mae));
            }
            line.push_str(&format!(" - lr: {:.2e}", lr));
            println!("{}", line);

            history.epochs.push(EpochRecord {
                epoch: epoch + 1,
                loss: train_metrics.loss,
                mae: train_metrics.mae,
                val_loss: val_metrics.map(|m| m.loss),
                val_mae: val_metrics.map(|m| m.mae),
                lr,
            });

            let monitored = val_metrics.map_or(train_metrics.loss, |m| m.loss);
            if let Some(new_lr) = lr_scheduler.on_epoch_end(epoch, monitored, lr) {
                println!("{}", format!("Epoch {}: reducing learning rate to {:.2e}", epoch + 1, new_lr).yellow());
                self.optimizer.set_learning_rate(new_lr);
            }

            match early_stopping.on_epoch_end(epoch, monitored) {
                EarlyStoppingAction::Improved => {
                    if cb.restore_best_weights {
                        best_weights = Some(self.snapshot()?);
                    }
                }
                EarlyStoppingAction::Continue => {}
                EarlyStoppingAction::Stop => {
                    println!("{}", format!("Epoch {}: early stopping", epoch + 1).yellow());
                    break;
                }
            }
        }

        history.best_epoch = early_stopping.best().map(|(e, _)| e + 1);
        history.stopped_epoch = early_stopping.stopped_epoch().map(|e| e + 1);

        if let (Some(weights), Some(best)) = (&best_weights, history.best_epoch) {
            println!("Restoring model weights from the end of the best epoch: {}", best);
            self.restore(weights)?;
        }
        Ok(history)
    }

    pub fn save(&self, output_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(output_dir)?;
        let path = output_dir.join(MODEL_FILE);
        self.varmap
            .save(&path)
            .with_context(|| format!("Failed to save model to {}", path.display()))?;
        Ok(path)
    }

    /// Loads weights previously written by [`Trainer::save`]
    pub fn load_weights(&mut self, path: &Path) -> Result<()> {
        self.varmap
            .load(path)
            .with_context(|| format!("Failed to load weights from {}", path.display()))?;
        Ok(())
    }
}

/// Full run: load labels, split, train, evaluate on the held-out set, save model and history.
pub fn run(config: &TrainConfig, device: Device) -> Result<TrainingReport> {
    config.validate()?;
    let dataset_dir = config.gaze_dataset_dir();
    let all_rows = load_labels(&dataset_dir.join("labels.csv"))
        .with_context(|| format!("Failed to load labels from {}", dataset_dir.display()))?;
    if all_rows.is_empty() {
        bail!("No labelled samples in {}", dataset_dir.display());
    }

    let splits = split_rows(&all_rows, config.test_split, config.val_split, config.seed);

    let mut train_gen = EyeDataGenerator::new(
        splits.train,
        &dataset_dir,
        config.batch_size,
        config.img_size,
        true,
        config.seed,
    )?;
    let val_gen = EyeDataGenerator::new(splits.val, &dataset_dir, config.batch_size, config.img_size, false, config.seed)?;
    let test_gen = EyeDataGenerator::new(splits.test, &dataset_dir, config.batch_size, config.img_size, false, config.seed)?;

    let (train_n, val_n, test_n) = (train_gen.num_samples(), val_gen.num_samples(), test_gen.num_samples());
    println!("Samples: {} train, {} validation, {} test", train_n, val_n, test_n);

    let mut trainer = Trainer::new(config, device)?;
    println!("{}", trainer.model().summary());

    let history = trainer.fit(&mut train_gen, &val_gen, config.epochs)?;

    let test = trainer.evaluate(&test_gen)?;
    match test {
        Some(m) => println!("{}", format!("Test loss and MAE: [{:.4}, {:.4}]", m.loss, m.mae).green()),
        None => println!("{}", "Test split is empty, skipping evaluation".yellow()),
    }

    let model_path = trainer.save(&config.output_dir)?;
    println!("{}", format!("Model saved to {}", model_path.display()).green());

    let now = Local::now();
    let report = TrainingReport {
        run_id: now.format("%Y%m%d_%H%M%S").to_string(),
        timestamp: now.to_rfc3339(),
        config: config.clone(),
        train_samples: train_n,
        val_samples: val_n,
        test_samples: test_n,
        history,
        test,
        model_path,
    };
    let history_path = config.output_dir.join(HISTORY_FILE);
    fs::write(&history_path, serde_json::to_string_pretty(&report)?)?;
    tracing::info!(path = %history_path.display(), "wrote training history");

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulator_weights_by_samples() {
        let mut acc = MetricAccumulator::default();
        acc.add(1.0, 2.0, 3);
        acc.add(5.0, 6.0, 1);
        let m = acc.finish().unwrap();
        assert!((m.loss - 2.0).abs() < 1e-12);
        assert!((m.mae - 3.0).abs() < 1e-12);
        assert!(MetricAccumulator::default().finish().is_none());
    }

    #[test]
    fn snapshot_restore_round_trips_weights() {
        let cfg = TrainConfig::default();
        let trainer = Trainer::new(&cfg, Device::Cpu).unwrap();
        let before = trainer.snapshot().unwrap();

        {
            let vars = trainer.varmap.data().lock().unwrap();
            for var in vars.values() {
                let zeros = var.as_tensor().zeros_like().unwrap();
                var.set(&zeros).unwrap();
            }
        }
        trainer.restore(&before).unwrap();

        let after = trainer.snapshot().unwrap();
        for (name, t) in &before {
            let diff = (t - &after[name]).unwrap().abs().unwrap().sum_all().unwrap().to_scalar::<f32>().unwrap();
            assert_eq!(diff, 0.0, "{} changed", name);
        }
    }

    #[test]
    fn fit_rejects_mismatched_image_size() {
        let cfg = TrainConfig::default();
        let mut trainer = Trainer::new(&cfg, Device::Cpu).unwrap();
        let small = crate::types::ImageSize::new(64, 64);
        let mut train = EyeDataGenerator::new(Vec::new(), ".", 4, small, false, 0).unwrap();
        let val = EyeDataGenerator::new(Vec::new(), ".", 4, small, false, 0).unwrap();

        let err = trainer.fit(&mut train, &val, 1).unwrap_err();
        assert!(err.to_string().contains("model expects 128x256"));
    }

    #[test]
    fn learning_rate_starts_from_config() {
        let cfg = TrainConfig { learning_rate: 0.01, ..TrainConfig::default() };
        let trainer = Trainer::new(&cfg, Device::Cpu).unwrap();
        assert!((trainer.learning_rate() - 0.01).abs() < 1e-12);
    }
}
