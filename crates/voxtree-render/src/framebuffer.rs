//! RGB image buffer with PNG output.

use std::path::Path;

use thiserror::Error;

/// Failure while encoding or writing a rendered frame.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The PNG encoder or the underlying file I/O failed.
    #[error("failed to write image: {0}")]
    Image(#[from] image::ImageError),
}

/// Tightly packed RGB8 pixels, row-major from the top-left.
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Framebuffer {
        Framebuffer {
            width,
            height,
            pixels: vec![0; (width * height * 3) as usize],
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Write one pixel.
    #[inline]
    pub fn put(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let index = ((y * self.width + x) * 3) as usize;
        self.pixels[index..index + 3].copy_from_slice(&rgb);
    }

    /// Read one pixel.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> [u8; 3] {
        let index = ((y * self.width + x) * 3) as usize;
        [self.pixels[index], self.pixels[index + 1], self.pixels[index + 2]]
    }

    /// The raw pixel bytes, `width * height * 3` long.
    pub fn data(&self) -> &[u8] {
        &self.pixels
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Encode as PNG at `path`.
    pub fn save_png(&self, path: &Path) -> Result<(), RenderError> {
        image::save_buffer(
            path,
            &self.pixels,
            self.width,
            self.height,
            image::ExtendedColorType::Rgb8,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Framebuffer;

    #[test]
    fn starts_black() {
        let frame = Framebuffer::new(4, 3);
        assert_eq!(frame.data().len(), 4 * 3 * 3);
        assert!(frame.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn put_get_round_trips() {
        let mut frame = Framebuffer::new(8, 8);
        frame.put(3, 5, [10, 20, 30]);
        assert_eq!(frame.get(3, 5), [10, 20, 30]);
        assert_eq!(frame.get(5, 3), [0, 0, 0]);
    }

    #[test]
    fn save_png_writes_a_file() {
        let mut frame = Framebuffer::new(2, 2);
        frame.put(0, 0, [255, 0, 0]);
        let path = std::env::temp_dir().join("voxtree_framebuffer_test.png");
        frame.save_png(&path).unwrap();
        assert!(path.exists());
        let _ = std::fs::remove_file(&path);
    }
}
