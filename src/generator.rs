//! Batch generator over an exported gaze dataset.
//!
//! Each sample is the left and right eye crop, grayscale and normalized,
//! laid side by side into one `H x 2W` single-channel image.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::PathBuf;

use crate::error::{DatasetError, Result};
use crate::frame::{combine_pair, eye_from_path, normalize};
use crate::types::{GazeLabelRow, ImageSize};

/// One batch in channels-first layout: images `[len, 1, height, width]`, labels `[len, 2]`
#[derive(Debug, Clone)]
pub struct EyeBatch {
    pub images: Vec<f32>,
    pub labels: Vec<f32>,
    pub len: usize,
    pub height: usize,
    pub width: usize,
}

impl EyeBatch {
    pub fn image_dims(&self) -> (usize, usize, usize, usize) {
        (self.len, 1, self.height, self.width)
    }

    pub fn sample_pixels(&self) -> usize {
        self.height * self.width
    }
}

pub struct EyeDataGenerator {
    rows: Vec<GazeLabelRow>,
    dataset_dir: PathBuf,
    batch_size: usize,
    img_size: ImageSize,
    shuffle: bool,
    indices: Vec<usize>,
    rng: StdRng,
}

impl EyeDataGenerator {
    pub fn new(
        rows: Vec<GazeLabelRow>,
        dataset_dir: impl Into<PathBuf>,
        batch_size: usize,
        img_size: ImageSize,
        shuffle: bool,
        seed: u64,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(DatasetError::Config("batch_size must be positive".into()));
        }
        let indices = (0..rows.len()).collect();
        let mut generator = Self {
            rows,
            dataset_dir: dataset_dir.into(),
            batch_size,
            img_size,
            shuffle,
            indices,
            rng: StdRng::seed_from_u64(seed),
        };
        generator.on_epoch_end();
        Ok(generator)
    }

    /// Number of batches per epoch; the last one may be short
    pub fn len(&self) -> usize {
        self.rows.len().div_ceil(self.batch_size)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn num_samples(&self) -> usize {
        self.rows.len()
    }

    pub fn img_size(&self) -> ImageSize {
        self.img_size
    }

    pub fn batch(&self, idx: usize) -> Result<EyeBatch> {
        let len = self.len();
        if idx >= len {
            return Err(DatasetError::BatchOutOfRange { index: idx, len });
        }
        let start = idx * self.batch_size;
        let end = (start + self.batch_size).min(self.rows.len());
        let batch_indices = &self.indices[start..end];

        let pixels = self.img_size.pixels() * 2;
        let mut images = Vec::with_capacity(batch_indices.len() * pixels);
        let mut labels = Vec::with_capacity(batch_indices.len() * 2);

        for &i in batch_indices {
            let row = &self.rows[i];
            let left = eye_from_path(&self.dataset_dir.join(&row.left_image), self.img_size)?;
            let right = eye_from_path(&self.dataset_dir.join(&row.right_image), self.img_size)?;
            let combined = combine_pair(&normalize(&left), &normalize(&right), self.img_size);
            images.extend_from_slice(&combined);
            labels.push(row.theta1);
            labels.push(row.theta2);
        }

        Ok(EyeBatch {
            images,
            labels,
            len: batch_indices.len(),
            height: self.img_size.height as usize,
            width: self.img_size.combined_width() as usize,
        })
    }

    /// Reshuffles the sample order when shuffling is enabled
    pub fn on_epoch_end(&mut self) {
        if self.shuffle {
            self.indices.shuffle(&mut self.rng);
        }
    }
}
