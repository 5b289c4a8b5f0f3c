use sdl2::pixels::Color;

use crate::error::{Error, Result};
use crate::format::BYTES_PER_PIXEL;

/// Value every cell holds right after allocation
pub const CLEAR: Color = Color::RGBA(0, 0, 0, 0);

// ============================================================================
// Image
// ============================================================================

/// Borrowed row-major RGBA image used as a bulk-copy source.
///
/// Bytes are R, G, B, A per pixel. `pitch` is the byte length of one row and
/// may exceed `width * 4` when the producer pads rows.
#[derive(Debug, Clone, Copy)]
pub struct Image<'a> {
    width: u32,
    height: u32,
    pitch: usize,
    bytes: &'a [u8],
}

impl<'a> Image<'a> {
    /// Wrap a padded image. Returns None if `bytes` is too short for the
    /// stated geometry or the pitch cannot hold one row.
    pub fn new(width: u32, height: u32, pitch: usize, bytes: &'a [u8]) -> Option<Self> {
        let row_bytes = width as usize * BYTES_PER_PIXEL;
        if pitch < row_bytes {
            return None;
        }
        let needed = match height {
            0 => 0,
            h => (h as usize - 1) * pitch + row_bytes,
        };
        (bytes.len() >= needed).then_some(Self {
            width,
            height,
            pitch,
            bytes,
        })
    }

    /// Wrap a tightly packed image (pitch = width * 4)
    pub fn from_rgba(width: u32, height: u32, bytes: &'a [u8]) -> Option<Self> {
        Self::new(width, height, width as usize * BYTES_PER_PIXEL, bytes)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel at (x, y). Caller guarantees the coordinates are inside the image.
    #[inline]
    fn pixel(&self, x: u32, y: u32) -> Color {
        let idx = y as usize * self.pitch + x as usize * BYTES_PER_PIXEL;
        let px = &self.bytes[idx..idx + BYTES_PER_PIXEL];
        Color::RGBA(px[0], px[1], px[2], px[3])
    }
}

// ============================================================================
// PixelBuffer
// ============================================================================

/// The logical pixel grid: what should be on screen, before upscaling.
///
/// One contiguous allocation of `width * height` cells, row-major, indexed
/// `y * width + x`.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    pixels: Vec<Color>,
    width: u32,
    height: u32,
}

impl PixelBuffer {
    /// Allocate a zeroed grid. Both dimensions must be positive.
    pub fn try_new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::Config(format!(
                "logical bitmap must be at least 1x1, got {}x{}",
                width, height
            )));
        }

        let len = width as usize * height as usize;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| Error::OutOfMemory { width, height })?;
        pixels.resize(len, CLEAR);

        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// All cells, row-major
    #[inline]
    pub fn as_slice(&self) -> &[Color] {
        &self.pixels
    }

    /// One logical row
    #[inline]
    pub fn row(&self, y: u32) -> &[Color] {
        let start = y as usize * self.width as usize;
        &self.pixels[start..start + self.width as usize]
    }

    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && (x as u32) < self.width && y >= 0 && (y as u32) < self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Read a cell (bounds checked)
    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        self.in_bounds(x, y)
            .then(|| self.pixels[self.index(x as u32, y as u32)])
    }

    /// Set a single cell. Out-of-range coordinates are ignored.
    #[inline]
    pub fn write_pixel(&mut self, color: Color, x: i32, y: i32) {
        if !self.in_bounds(x, y) {
            return;
        }
        let idx = self.index(x as u32, y as u32);
        let cell = &mut self.pixels[idx];
        if *cell != color {
            *cell = color;
        }
    }

    /// Write `color` to every cell
    pub fn fill(&mut self, color: Color) {
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                self.write_pixel(color, x, y);
            }
        }
    }

    /// Copy an image of any size onto the grid, anchored at the origin.
    /// Source pixels that fall outside the grid are clipped.
    pub fn bulk_copy_from(&mut self, image: &Image) {
        for y in 0..image.height() {
            for x in 0..image.width() {
                self.write_pixel(image.pixel(x, y), x as i32, y as i32);
            }
        }
    }
}
