//! Converts the capture database into image folders with CSV label tables.
//!
//! Layout per dataset kind (`gaze`, `openness`):
//!
//! ```text
//! <out>/<kind>/labels.csv
//! <out>/<kind>/left_eye/left_<rowid>.png
//! <out>/<kind>/right_eye/right_<rowid>.png
//! ```

use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::database::CaptureDatabase;
use crate::frame::eye_from_data_url;
use crate::types::ImageSize;

pub struct DatasetDirs {
    pub root: PathBuf,
    pub left: PathBuf,
    pub right: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub gaze_samples: usize,
    pub openness_samples: usize,
}

pub fn setup_directories(base_dir: &Path, dataset_type: &str) -> Result<DatasetDirs> {
    let root = base_dir.join(dataset_type);
    let left = root.join("left_eye");
    let right = root.join("right_eye");
    fs::create_dir_all(&left)?;
    fs::create_dir_all(&right)?;
    Ok(DatasetDirs { root, left, right })
}

/// Decodes, resizes and writes one eye pair. Returns the label-table paths.
fn write_pair(
    dirs: &DatasetDirs,
    rowid: i64,
    left_frame: &str,
    right_frame: &str,
    img_size: ImageSize,
) -> Result<(String, String)> {
    let left_img = eye_from_data_url(left_frame, img_size)
        .with_context(|| format!("Row {}: bad left eye frame", rowid))?;
    let right_img = eye_from_data_url(right_frame, img_size)
        .with_context(|| format!("Row {}: bad right eye frame", rowid))?;

    let left_name = format!("left_{}.png", rowid);
    let right_name = format!("right_{}.png", rowid);
    left_img.save(dirs.left.join(&left_name))?;
    right_img.save(dirs.right.join(&right_name))?;

    Ok((
        format!("left_eye/{}", left_name),
        format!("right_eye/{}", right_name),
    ))
}

/// Angles keep their decimal point (`1.0`, not `1`)
fn label_field(value: Option<f64>) -> String {
    value.map(|v| format!("{:?}", v)).unwrap_or_default()
}

pub fn export_gaze_dataset(db: &CaptureDatabase, output_dir: &Path, img_size: ImageSize) -> Result<usize> {
    let dirs = setup_directories(output_dir, "gaze")?;
    let csv_path = dirs.root.join("labels.csv");
    let rows = db.gaze_rows()?;

    let mut writer = csv::Writer::from_path(&csv_path)
        .with_context(|| format!("Failed to create {}", csv_path.display()))?;
    writer.write_record(["left_image", "right_image", "theta1", "theta2"])?;

    for row in &rows {
        let (left, right) = write_pair(&dirs, row.rowid, &row.left_frame, &row.right_frame, img_size)?;
        writer.write_record([
            left,
            right,
            label_field(row.theta1),
            label_field(row.theta2),
        ])?;
        tracing::debug!(rowid = row.rowid, "exported gaze sample");
    }
    writer.flush()?;
    Ok(rows.len())
}

pub fn export_openness_dataset(db: &CaptureDatabase, output_dir: &Path, img_size: ImageSize) -> Result<usize> {
    let dirs = setup_directories(output_dir, "openness")?;
    let csv_path = dirs.root.join("labels.csv");
    let rows = db.openness_rows()?;

    let mut writer = csv::Writer::from_path(&csv_path)
        .with_context(|| format!("Failed to create {}", csv_path.display()))?;
    writer.write_record(["left_image", "right_image", "openness"])?;

    for row in &rows {
        let (left, right) = write_pair(&dirs, row.rowid, &row.left_frame, &row.right_frame, img_size)?;
        writer.write_record([left, right, label_field(row.openness)])?;
        tracing::debug!(rowid = row.rowid, "exported openness sample");
    }
    writer.flush()?;
    Ok(rows.len())
}

pub fn export_dataset(
    db_path: &Path,
    output_dir: &Path,
    img_size: ImageSize,
    clear_folder: bool,
) -> Result<ExportSummary> {
    if clear_folder && output_dir.exists() {
        println!("{}", format!("Clearing output directory: {}", output_dir.display()).yellow());
        fs::remove_dir_all(output_dir)
            .with_context(|| format!("Failed to clear {}", output_dir.display()))?;
    }
    fs::create_dir_all(output_dir)?;

    tracing::info!(db = %db_path.display(), out = %output_dir.display(), "exporting datasets");
    let db = CaptureDatabase::open(db_path)?;
    export_from(&db, output_dir, img_size)
}

/// Exports both datasets from an already opened database
pub fn export_from(db: &CaptureDatabase, output_dir: &Path, img_size: ImageSize) -> Result<ExportSummary> {
    let gaze_samples = export_gaze_dataset(db, output_dir, img_size)?;
    let openness_samples = export_openness_dataset(db, output_dir, img_size)?;

    println!(
        "{}",
        format!("Exported {} gaze samples to {}", gaze_samples, output_dir.join("gaze").display()).green()
    );
    println!(
        "{}",
        format!(
            "Exported {} openness samples to {}",
            openness_samples,
            output_dir.join("openness").display()
        )
        .green()
    );

    Ok(ExportSummary { gaze_samples, openness_samples })
}
