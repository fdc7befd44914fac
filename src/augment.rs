use rand::Rng;

use crate::generator::EyeBatch;

/// Training-time random translation with zero fill.
/// Offsets are whole pixels; there is no sub-pixel interpolation.
#[derive(Debug, Clone, Copy)]
pub struct RandomTranslation {
    pub max_dy: i32,
    pub max_dx: i32,
}

impl RandomTranslation {
    /// Both axes allow shifts up to `max_offset` pixels
    pub fn new(max_offset: u32) -> Self {
        let max = i32::try_from(max_offset).unwrap_or(i32::MAX);
        Self { max_dy: max, max_dx: max }
    }

    /// Shifts every image in the batch by its own random offset
    pub fn apply<R: Rng>(&self, batch: &mut EyeBatch, rng: &mut R) {
        if self.max_dx == 0 && self.max_dy == 0 {
            return;
        }
        let pixels = batch.sample_pixels();
        for sample in batch.images.chunks_mut(pixels) {
            let dy = rng.gen_range(-self.max_dy..=self.max_dy);
            let dx = rng.gen_range(-self.max_dx..=self.max_dx);
            translate(sample, batch.height, batch.width, dy, dx);
        }
    }
}

/// Moves content by (dy, dx); pixels shifted in from outside are 0
pub fn translate(img: &mut [f32], height: usize, width: usize, dy: i32, dx: i32) {
    if dy == 0 && dx == 0 {
        return;
    }
    let src = img.to_vec();
    let (h, w) = (height as i32, width as i32);
    for y in 0..h {
        let sy = y - dy;
        for x in 0..w {
            let sx = x - dx;
            let value = if (0..h).contains(&sy) && (0..w).contains(&sx) {
                src[(sy * w + sx) as usize]
            } else {
                0.0
            };
            img[(y * w + x) as usize] = value;
        }
    }
}
