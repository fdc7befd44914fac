use anyhow::{anyhow, Result};
use image::RgbImage;

/// A fixed-size window that displays one RGB image until closed.
pub struct PreviewWindow {
    window: minifb::Window,
    buffer: Vec<u32>,
    width: usize,
    height: usize,
}

impl PreviewWindow {
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let mut window = minifb::Window::new(
            title,
            width,
            height,
            minifb::WindowOptions {
                resize: true,
                ..minifb::WindowOptions::default()
            },
        )
        .map_err(|e| anyhow!("Failed to create window: {}", e))?;

        window.limit_update_rate(Some(std::time::Duration::from_micros(16600))); // ~60 FPS

        Ok(Self {
            window,
            buffer: vec![0; width * height],
            width,
            height,
        })
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(minifb::Key::Escape)
    }

    pub fn show(&mut self, img: &RgbImage) -> Result<()> {
        pack_argb(img, &mut self.buffer);
        self.window
            .update_with_buffer(&self.buffer, self.width, self.height)
            .map_err(|e| anyhow!("Window update failed: {}", e))
    }

    /// Redraws `img` until the window is closed or Escape is pressed
    pub fn run(&mut self, img: &RgbImage) -> Result<()> {
        while self.is_open() {
            self.show(img)?;
        }
        Ok(())
    }
}

/// RGB8 pixels to minifb's 0RGB u32 layout
fn pack_argb(img: &RgbImage, out: &mut Vec<u32>) {
    out.clear();
    out.extend(img.pixels().map(|p| ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32));
}
