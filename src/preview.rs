//! Random-sample preview of the capture database.

use anyhow::{Context, Result};
use image::{GrayImage, Rgb, RgbImage};
use std::path::Path;

use crate::database::CaptureDatabase;
use crate::font::{draw_text_line, line_height, measure_text_width};
use crate::frame::{combine_gray, eye_from_data_url};
use crate::types::{GazeAngles, ImageSize};

const PREVIEW_EYE: ImageSize = ImageSize { width: 128, height: 128 };
const PADDING: u32 = 8;
const TEXT_SCALE: usize = 2;

pub struct PreviewSample {
    pub rowid: i64,
    /// Left and right eye side by side, `128 x 256`
    pub image: GrayImage,
    pub angles: GazeAngles,
}

pub fn random_samples(db: &CaptureDatabase, num_samples: usize) -> Result<Vec<PreviewSample>> {
    db.random_gaze_rows(num_samples)?
        .into_iter()
        .map(|row| {
            let left = eye_from_data_url(&row.left_frame, PREVIEW_EYE)
                .with_context(|| format!("Row {}: bad left eye frame", row.rowid))?;
            let right = eye_from_data_url(&row.right_frame, PREVIEW_EYE)
                .with_context(|| format!("Row {}: bad right eye frame", row.rowid))?;
            Ok(PreviewSample {
                rowid: row.rowid,
                image: combine_gray(&left, &right),
                angles: GazeAngles::new(
                    row.theta1.unwrap_or(f64::NAN) as f32,
                    row.theta2.unwrap_or(f64::NAN) as f32,
                ),
            })
        })
        .collect()
}

pub fn caption(angles: &GazeAngles) -> [String; 2] {
    [
        format!("θ1: {:.2}", angles.theta1),
        format!("θ2: {:.2}", angles.theta2),
    ]
}

/// Lays the samples out in a single row, each with a two-line caption above it.
pub fn render_sheet(samples: &[PreviewSample]) -> RgbImage {
    let tile_w = samples.iter().map(|s| s.image.width()).max().unwrap_or(0);
    let tile_h = samples.iter().map(|s| s.image.height()).max().unwrap_or(0);
    let caption_h = (line_height(TEXT_SCALE) * 2) as u32;

    let n = samples.len() as u32;
    let width = (n * (tile_w + PADDING) + PADDING).max(1);
    let height = (tile_h + caption_h + PADDING * 3).max(1);
    let mut sheet = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));

    for (i, sample) in samples.iter().enumerate() {
        let x0 = PADDING + i as u32 * (tile_w + PADDING);
        let y0 = PADDING * 2 + caption_h;
        for (x, y, p) in sample.image.enumerate_pixels() {
            sheet.put_pixel(x0 + x, y0 + y, Rgb([p[0], p[0], p[0]]));
        }

        let (w, h) = (width as usize, height as usize);
        let buffer: &mut [u8] = &mut sheet;
        for (line_no, text) in caption(&sample.angles).iter().enumerate() {
            let text_w = measure_text_width(text, TEXT_SCALE) as u32;
            let tx = x0 + tile_w.saturating_sub(text_w) / 2;
            let ty = PADDING as usize + line_no * line_height(TEXT_SCALE);
            draw_text_line(buffer, w, h, tx as usize, ty, text, (0, 0, 0), TEXT_SCALE);
        }
    }
    sheet
}

pub fn save_sheet(sheet: &RgbImage, path: &Path) -> Result<()> {
    sheet
        .save(path)
        .with_context(|| format!("Failed to write preview to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::*;
    use crate::frame::test_support::solid_data_url;
    use rusqlite::Connection;

    #[test]
    fn caption_rounds_to_two_decimals() {
        let [a, b] = caption(&GazeAngles::new(0.126, -1.0));
        assert_eq!(a, "θ1: 0.13");
        assert_eq!(b, "θ2: -1.00");
    }

    #[test]
    fn samples_are_combined_pairs() {
        let conn = Connection::open_in_memory().unwrap();
        create(&conn);
        let left = solid_data_url(30, 20, [0, 0, 0]);
        let right = solid_data_url(30, 20, [255, 255, 255]);
        for _ in 0..3 {
            insert_gaze(&conn, &left, &right, 0.5, 0.25);
        }
        let db = CaptureDatabase::from_connection(conn);

        let samples = random_samples(&db, 2).unwrap();
        assert_eq!(samples.len(), 2);
        let img = &samples[0].image;
        assert_eq!(img.dimensions(), (256, 128));
        assert_eq!(img.get_pixel(10, 10)[0], 0);
        assert_eq!(img.get_pixel(200, 10)[0], 255);
        assert_eq!(samples[0].angles, GazeAngles::new(0.5, 0.25));
    }

    #[test]
    fn sheet_has_one_tile_per_sample() {
        let samples: Vec<PreviewSample> = (0..3)
            .map(|i| PreviewSample {
                rowid: i,
                image: GrayImage::from_pixel(256, 128, image::Luma([100])),
                angles: GazeAngles::new(0.0, 0.0),
            })
            .collect();
        let sheet = render_sheet(&samples);
        assert_eq!(sheet.width(), 3 * (256 + PADDING) + PADDING);
        let y = sheet.height() - PADDING - 1;
        assert_eq!(sheet.get_pixel(PADDING, y)[0], 100);
        assert_eq!(sheet.get_pixel(PADDING + 256 + 1, y)[0], 255);
    }

    #[test]
    fn empty_sheet_is_still_a_valid_image() {
        let sheet = render_sheet(&[]);
        assert!(sheet.width() >= 1 && sheet.height() >= 1);
    }
}
