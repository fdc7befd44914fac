use std::path::Path;

use crate::error::{DatasetError, Result};
use crate::types::GazeLabelRow;

/// Reads every row of a gaze `labels.csv`, keyed by header name.
pub fn load_labels(csv_path: &Path) -> Result<Vec<GazeLabelRow>> {
    let mut reader = csv::Reader::from_path(csv_path).map_err(|e| label_error(0, e))?;
    let mut rows = Vec::new();
    for record in reader.deserialize::<GazeLabelRow>() {
        match record {
            Ok(row) => rows.push(row),
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                return Err(label_error(line, e));
            }
        }
    }
    tracing::info!(path = %csv_path.display(), rows = rows.len(), "loaded labels");
    Ok(rows)
}

fn label_error(line: u64, err: csv::Error) -> DatasetError {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(io) => DatasetError::Io(io),
        _ => DatasetError::Label { line, message },
    }
}
