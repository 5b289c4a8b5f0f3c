//! Streaming texture targets the synchronizer writes into.

use sdl2::render::{Texture, TextureCreator};
use sdl2::video::WindowContext;
use thiserror::Error;

use crate::error::{Error, Result};
use crate::format::{PixelFormat, BYTES_PER_PIXEL};
use crate::scale::Size;

/// The texture could not be locked this frame. Expected while the window is
/// being resized; the caller skips the frame and tries again next time.
#[derive(Debug, Clone, Error)]
#[error("texture lock failed: {0}")]
pub struct LockError(pub String);

/// A texture with exclusive, scoped write access to its memory.
pub trait StreamingTarget {
    /// Destroy the current texture (if any) and allocate a new one
    fn recreate(&mut self, size: Size, format: PixelFormat) -> Result<()>;

    /// Lock the whole texture and hand its bytes and row pitch to `write`.
    /// The lock is released before this returns, whatever `write` does.
    fn with_lock(
        &mut self,
        write: &mut dyn FnMut(&mut [u8], usize),
    ) -> std::result::Result<(), LockError>;

    /// Size of the current texture, None before the first `recreate`
    fn size(&self) -> Option<Size>;
}

// ============================================================================
// SDL
// ============================================================================

/// SDL2 streaming texture
pub struct SdlTarget<'a> {
    creator: &'a TextureCreator<WindowContext>,
    texture: Option<Texture<'a>>,
    size: Option<Size>,
}

impl<'a> SdlTarget<'a> {
    pub fn new(creator: &'a TextureCreator<WindowContext>) -> Self {
        Self {
            creator,
            texture: None,
            size: None,
        }
    }

    /// Current texture, ready to be copied onto the canvas
    pub fn texture(&self) -> Option<&Texture<'a>> {
        self.texture.as_ref()
    }
}

impl StreamingTarget for SdlTarget<'_> {
    fn recreate(&mut self, size: Size, format: PixelFormat) -> Result<()> {
        // Dropping the old texture destroys it before the new one is allocated
        self.texture = None;
        self.size = None;

        let texture = self
            .creator
            .create_texture_streaming(format.sdl_format(), size.width, size.height)
            .map_err(|e| Error::Texture {
                width: size.width,
                height: size.height,
                reason: e.to_string(),
            })?;
        self.texture = Some(texture);
        self.size = Some(size);
        Ok(())
    }

    fn with_lock(
        &mut self,
        write: &mut dyn FnMut(&mut [u8], usize),
    ) -> std::result::Result<(), LockError> {
        let texture = self
            .texture
            .as_mut()
            .ok_or_else(|| LockError("no texture allocated".to_string()))?;
        texture
            .with_lock(None, |bytes: &mut [u8], pitch: usize| write(bytes, pitch))
            .map_err(LockError)
    }

    fn size(&self) -> Option<Size> {
        self.size
    }
}

// ============================================================================
// Memory
// ============================================================================

/// Texture kept in process memory.
///
/// Rows are padded up to `row_alignment` bytes, the way GPU drivers pad
/// texture rows, and lock failures can be injected to exercise the
/// frame-skip path. Used for headless runs and tests.
#[derive(Debug, Clone)]
pub struct MemoryTarget {
    bytes: Vec<u8>,
    size: Option<Size>,
    pitch: usize,
    row_alignment: usize,
    format: PixelFormat,
    failing_locks: usize,
    recreations: usize,
    locks: usize,
}

impl MemoryTarget {
    /// Tightly packed rows
    pub fn new() -> Self {
        Self::with_row_alignment(BYTES_PER_PIXEL)
    }

    /// Rows padded to a multiple of `alignment` bytes
    pub fn with_row_alignment(alignment: usize) -> Self {
        Self {
            bytes: Vec::new(),
            size: None,
            pitch: 0,
            row_alignment: alignment.max(1),
            format: PixelFormat::default(),
            failing_locks: 0,
            recreations: 0,
            locks: 0,
        }
    }

    /// Make the next `count` lock attempts fail
    pub fn fail_next_locks(&mut self, count: usize) {
        self.failing_locks = count;
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Number of times the texture has been (re)allocated
    #[inline]
    pub fn recreations(&self) -> usize {
        self.recreations
    }

    /// Number of successful locks
    #[inline]
    pub fn locks(&self) -> usize {
        self.locks
    }

    /// Texel bytes at (x, y) of the current texture
    pub fn texel(&self, x: u32, y: u32) -> Option<[u8; BYTES_PER_PIXEL]> {
        let size = self.size?;
        if x >= size.width || y >= size.height {
            return None;
        }
        let idx = y as usize * self.pitch + x as usize * BYTES_PER_PIXEL;
        let mut texel = [0; BYTES_PER_PIXEL];
        texel.copy_from_slice(&self.bytes[idx..idx + BYTES_PER_PIXEL]);
        Some(texel)
    }
}

impl Default for MemoryTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingTarget for MemoryTarget {
    fn recreate(&mut self, size: Size, format: PixelFormat) -> Result<()> {
        let pitch = (size.width as usize * BYTES_PER_PIXEL).next_multiple_of(self.row_alignment);
        let len = pitch * size.height as usize;

        let mut bytes = Vec::new();
        bytes.try_reserve_exact(len).map_err(|e| Error::Texture {
            width: size.width,
            height: size.height,
            reason: e.to_string(),
        })?;
        bytes.resize(len, 0);

        self.bytes = bytes;
        self.pitch = pitch;
        self.size = Some(size);
        self.format = format;
        self.recreations += 1;
        Ok(())
    }

    fn with_lock(
        &mut self,
        write: &mut dyn FnMut(&mut [u8], usize),
    ) -> std::result::Result<(), LockError> {
        if self.failing_locks > 0 {
            self.failing_locks -= 1;
            return Err(LockError("simulated lock failure".to_string()));
        }
        if self.size.is_none() {
            return Err(LockError("no texture allocated".to_string()));
        }
        write(&mut self.bytes, self.pitch);
        self.locks += 1;
        Ok(())
    }

    fn size(&self) -> Option<Size> {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_target_pitch_alignment() {
        let mut target = MemoryTarget::with_row_alignment(64);
        target.recreate(Size::new(3, 2), PixelFormat::Rgba32).unwrap();
        assert_eq!(target.pitch(), 64);
        assert_eq!(target.bytes().len(), 128);

        let mut tight = MemoryTarget::new();
        tight.recreate(Size::new(3, 2), PixelFormat::Rgba32).unwrap();
        assert_eq!(tight.pitch(), 12);
    }

    #[test]
    fn test_lock_before_recreate_fails() {
        let mut target = MemoryTarget::new();
        assert!(target.with_lock(&mut |_, _| {}).is_err());
    }

    #[test]
    fn test_injected_lock_failures() {
        let mut target = MemoryTarget::new();
        target.recreate(Size::new(1, 1), PixelFormat::Rgba32).unwrap();
        target.fail_next_locks(2);

        let mut calls = 0;
        assert!(target.with_lock(&mut |_, _| calls += 1).is_err());
        assert!(target.with_lock(&mut |_, _| calls += 1).is_err());
        assert!(target.with_lock(&mut |_, _| calls += 1).is_ok());
        assert_eq!(calls, 1);
        assert_eq!(target.locks(), 1);
    }

    #[test]
    fn test_texel_reads_through_pitch() {
        let mut target = MemoryTarget::with_row_alignment(32);
        target.recreate(Size::new(2, 2), PixelFormat::Rgba32).unwrap();
        target
            .with_lock(&mut |bytes, pitch| bytes[pitch + 4..pitch + 8].copy_from_slice(&[1, 2, 3, 4]))
            .unwrap();
        assert_eq!(target.texel(1, 1), Some([1, 2, 3, 4]));
        assert_eq!(target.texel(0, 1), Some([0, 0, 0, 0]));
        assert_eq!(target.texel(2, 0), None);
    }
}
