//! Eye-frame decoding and preprocessing.
//!
//! Frames arrive either as `data:image/...;base64,...` URLs from the capture
//! database or as PNG files in an exported dataset. Both end up as fixed-size
//! grayscale crops normalized to `[0, 1]`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{imageops::FilterType, DynamicImage, GrayImage, ImageReader, Luma};
use std::path::Path;

use crate::error::{DatasetError, Result};
use crate::types::ImageSize;

/// Decodes the image carried by a data URL. Everything before the first ',' is ignored.
pub fn decode_data_url(data_url: &str) -> Result<DynamicImage> {
    let (_header, encoded) = data_url
        .split_once(',')
        .ok_or(DatasetError::MalformedDataUrl)?;
    let bytes = STANDARD.decode(encoded.trim())?;
    Ok(image::load_from_memory(&bytes)?)
}

/// ITU-R 601 luma, integer rounded the same way as the capture tooling (alpha ignored)
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    let rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();
    let mut gray = GrayImage::new(w, h);
    for (x, y, px) in rgb.enumerate_pixels() {
        let luma = (px[0] as u32 * 299 + px[1] as u32 * 587 + px[2] as u32 * 114 + 500) / 1000;
        gray.put_pixel(x, y, Luma([luma as u8]));
    }
    gray
}

/// Grayscale + bicubic resize to `size`
pub fn prepare_eye(img: &DynamicImage, size: ImageSize) -> GrayImage {
    let gray = to_grayscale(img);
    if gray.dimensions() == (size.width, size.height) {
        return gray;
    }
    image::imageops::resize(&gray, size.width, size.height, FilterType::CatmullRom)
}

pub fn eye_from_data_url(data_url: &str, size: ImageSize) -> Result<GrayImage> {
    let img = decode_data_url(data_url)?;
    Ok(prepare_eye(&img, size))
}

pub fn eye_from_path(path: &Path, size: ImageSize) -> Result<GrayImage> {
    let img = ImageReader::open(path)?.decode()?;
    Ok(prepare_eye(&img, size))
}

/// Row-major pixel values scaled to `[0, 1]`
pub fn normalize(gray: &GrayImage) -> Vec<f32> {
    gray.as_raw().iter().map(|&p| p as f32 / 255.0).collect()
}

/// Lays two equally sized eyes side by side, left eye first.
/// Output is `height x 2*width`, row-major.
pub fn combine_pair(left: &[f32], right: &[f32], size: ImageSize) -> Vec<f32> {
    let w = size.width as usize;
    let h = size.height as usize;
    debug_assert_eq!(left.len(), w * h);
    debug_assert_eq!(right.len(), w * h);

    let mut out = Vec::with_capacity(w * h * 2);
    for y in 0..h {
        out.extend_from_slice(&left[y * w..(y + 1) * w]);
        out.extend_from_slice(&right[y * w..(y + 1) * w]);
    }
    out
}

/// Same as [`combine_pair`] but keeps the 8-bit image, for display
pub fn combine_gray(left: &GrayImage, right: &GrayImage) -> GrayImage {
    let (w, h) = left.dimensions();
    let mut out = GrayImage::new(w + right.width(), h.max(right.height()));
    image::imageops::replace(&mut out, left, 0, 0);
    image::imageops::replace(&mut out, right, w as i64, 0);
    out
}


#[cfg(test)]
mod tests {
    use super::test_support::solid_data_url;
    use super::*;

    #[test]
    fn decodes_png_data_url() {
        let url = solid_data_url(20, 10, [255, 0, 0]);
        let img = decode_data_url(&url).unwrap();
        assert_eq!((img.width(), img.height()), (20, 10));
    }

    #[test]
    fn data_url_without_separator_is_rejected() {
        let err = decode_data_url("data:image/png;base64").unwrap_err();
        assert!(matches!(err, DatasetError::MalformedDataUrl));
    }

    #[test]
    fn bad_base64_is_reported() {
        let err = decode_data_url("data:image/png;base64,@@@").unwrap_err();
        assert!(matches!(err, DatasetError::Base64(_)));
    }

    #[test]
    fn grayscale_uses_bt601_weights() {
        let url = solid_data_url(2, 2, [255, 0, 0]);
        let gray = to_grayscale(&decode_data_url(&url).unwrap());
        // 255 * 0.299 = 76.2
        assert_eq!(gray.get_pixel(0, 0)[0], 76);

        let url = solid_data_url(2, 2, [0, 255, 0]);
        let gray = to_grayscale(&decode_data_url(&url).unwrap());
        assert_eq!(gray.get_pixel(1, 1)[0], 150);
    }

    #[test]
    fn eye_is_resized_to_target() {
        let url = solid_data_url(60, 40, [10, 10, 10]);
        let eye = eye_from_data_url(&url, ImageSize::new(128, 128)).unwrap();
        assert_eq!(eye.dimensions(), (128, 128));
    }

    #[test]
    fn normalize_scales_to_unit_range() {
        let gray = GrayImage::from_raw(2, 1, vec![0, 255]).unwrap();
        assert_eq!(normalize(&gray), vec![0.0, 1.0]);
    }

    #[test]
    fn combine_places_left_eye_first() {
        let size = ImageSize::new(2, 2);
        let left = vec![0.1, 0.2, 0.3, 0.4];
        let right = vec![0.5, 0.6, 0.7, 0.8];
        let combined = combine_pair(&left, &right, size);
        assert_eq!(combined, vec![0.1, 0.2, 0.5, 0.6, 0.3, 0.4, 0.7, 0.8]);
    }

    #[test]
    fn combine_gray_doubles_width() {
        let left = GrayImage::from_pixel(3, 2, Luma([10]));
        let right = GrayImage::from_pixel(3, 2, Luma([200]));
        let out = combine_gray(&left, &right);
        assert_eq!(out.dimensions(), (6, 2));
        assert_eq!(out.get_pixel(2, 1)[0], 10);
        assert_eq!(out.get_pixel(3, 0)[0], 200);
    }
}
