//! Texture synchronizer: keeps the streaming texture sized to the current
//! scale factors and refills it from the pixel buffer once per frame.

use serde::{Deserialize, Serialize};

use crate::buffer::PixelBuffer;
use crate::convert::Converter;
use crate::error::Result;
use crate::format::PixelFormat;
use crate::scale::{ScaleFactors, Size};
use crate::target::StreamingTarget;

/// When the streaming texture is destroyed and reallocated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecreatePolicy {
    /// Every cycle, even if the scale factors did not change
    #[default]
    EveryFrame,
    /// Only when the scale factors change, no texture exists yet, or the
    /// previous cycle could not lock the texture
    OnChange,
}

/// What a synchronization cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The texture now holds the upscaled buffer
    Presented(ScaleFactors),
    /// The lock failed; nothing was written, retry next frame
    Skipped,
    /// No bitmap has been initialized, nothing to do
    Inactive,
}

pub struct TextureSynchronizer<T> {
    target: T,
    converter: Converter,
    format: PixelFormat,
    policy: RecreatePolicy,
    scale: Option<ScaleFactors>,
    lock_failed: bool,
}

impl<T: StreamingTarget> TextureSynchronizer<T> {
    pub fn new(target: T, converter: Converter, format: PixelFormat, policy: RecreatePolicy) -> Self {
        Self {
            target,
            converter,
            format,
            policy,
            scale: None,
            lock_failed: false,
        }
    }

    #[inline]
    pub fn target(&self) -> &T {
        &self.target
    }

    #[inline]
    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    #[inline]
    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    pub fn set_converter(&mut self, converter: Converter) {
        self.converter = converter;
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    #[inline]
    pub fn policy(&self) -> RecreatePolicy {
        self.policy
    }

    /// Scale factors the current texture was created for
    #[inline]
    pub fn scale(&self) -> Option<ScaleFactors> {
        self.scale
    }

    fn needs_recreate(&self, scale: ScaleFactors) -> bool {
        match self.policy {
            RecreatePolicy::EveryFrame => true,
            RecreatePolicy::OnChange => {
                self.lock_failed || self.scale != Some(scale) || self.target.size().is_none()
            },
        }
    }

    /// Run one cycle: rescale, recreate, lock, convert, unlock.
    ///
    /// A failed lock is not an error: the cycle returns `Skipped` without
    /// touching texture memory. Texture allocation failures and malformed
    /// views are returned as errors.
    pub fn sync(&mut self, buffer: &PixelBuffer, physical: Size) -> Result<SyncOutcome> {
        let logical = Size::new(buffer.width(), buffer.height());
        let scale = ScaleFactors::compute(physical, logical);

        if self.needs_recreate(scale) {
            let size = scale.target_size(logical);
            if self.scale != Some(scale) {
                log::debug!(
                    "scale {}x{} -> texture {}x{} for surface {}x{}",
                    scale.x,
                    scale.y,
                    size.width,
                    size.height,
                    physical.width,
                    physical.height
                );
            }
            self.scale = None;
            self.target.recreate(size, self.format)?;
            self.scale = Some(scale);
        }

        let format = self.format;
        let converter = &self.converter;
        let mut converted = Ok(());
        let locked = self.target.with_lock(&mut |bytes, pitch| {
            converted = converter.convert(buffer, scale, format, bytes, pitch);
        });

        if let Err(e) = locked {
            log::trace!("{}, skipping frame", e);
            self.lock_failed = true;
            return Ok(SyncOutcome::Skipped);
        }
        self.lock_failed = false;
        converted?;

        Ok(SyncOutcome::Presented(scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::target::MemoryTarget;
    use sdl2::pixels::Color;

    const RED: Color = Color::RGBA(255, 0, 0, 255);

    fn synchronizer(target: MemoryTarget, policy: RecreatePolicy) -> TextureSynchronizer<MemoryTarget> {
        TextureSynchronizer::new(target, Converter::sequential(), PixelFormat::Rgba32, policy)
    }

    fn filled(w: u32, h: u32, color: Color) -> PixelBuffer {
        let mut buf = PixelBuffer::try_new(w, h).unwrap();
        buf.fill(color);
        buf
    }

    #[test]
    fn test_uniform_block_is_replicated() {
        let buf = filled(4, 4, RED);
        let mut sync = synchronizer(MemoryTarget::new(), RecreatePolicy::EveryFrame);
        let outcome = sync.sync(&buf, Size::new(8, 8)).unwrap();

        assert_eq!(outcome, SyncOutcome::Presented(ScaleFactors { x: 2, y: 2 }));
        let target = sync.target();
        assert_eq!(target.size(), Some(Size::new(8, 8)));
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(target.texel(x, y), Some([255, 0, 0, 255]));
            }
        }
    }

    #[test]
    fn test_non_multiple_surface_truncates() {
        let mut buf = PixelBuffer::try_new(3, 3).unwrap();
        buf.write_pixel(RED, 2, 2);
        let mut sync = synchronizer(MemoryTarget::new(), RecreatePolicy::EveryFrame);
        let outcome = sync.sync(&buf, Size::new(10, 10)).unwrap();

        assert_eq!(outcome, SyncOutcome::Presented(ScaleFactors { x: 3, y: 3 }));
        assert_eq!(sync.target().size(), Some(Size::new(9, 9)));
        assert_eq!(sync.target().texel(8, 8), Some([255, 0, 0, 255]));
        assert_eq!(sync.target().texel(5, 5), Some([0, 0, 0, 0]));
        assert_eq!(sync.target().texel(9, 9), None);
    }

    #[test_log::test]
    fn test_lock_failure_skips_frame() {
        let buf = filled(2, 2, RED);
        let mut sync = synchronizer(MemoryTarget::new(), RecreatePolicy::OnChange);
        sync.sync(&buf, Size::new(4, 4)).unwrap();
        let before = sync.target().bytes().to_vec();

        let other = filled(2, 2, Color::RGBA(0, 0, 255, 255));
        sync.target_mut().fail_next_locks(1);
        let outcome = sync.sync(&other, Size::new(4, 4)).unwrap();

        assert_eq!(outcome, SyncOutcome::Skipped);
        assert_eq!(sync.target().bytes(), before.as_slice());
        assert_eq!(sync.target().locks(), 1);
    }

    #[test]
    fn test_lock_failure_every_frame_writes_nothing() {
        let buf = filled(2, 2, RED);
        let mut target = MemoryTarget::new();
        target.fail_next_locks(1);
        let mut sync = synchronizer(target, RecreatePolicy::EveryFrame);

        assert_eq!(sync.sync(&buf, Size::new(4, 4)).unwrap(), SyncOutcome::Skipped);
        assert!(sync.target().bytes().iter().all(|&b| b == 0));

        // next frame retries and succeeds
        assert!(matches!(
            sync.sync(&buf, Size::new(4, 4)).unwrap(),
            SyncOutcome::Presented(_)
        ));
        assert_eq!(sync.target().texel(3, 3), Some([255, 0, 0, 255]));
    }

    #[test]
    fn test_every_frame_policy_always_recreates() {
        let buf = filled(2, 2, RED);
        let mut sync = synchronizer(MemoryTarget::new(), RecreatePolicy::EveryFrame);
        for _ in 0..3 {
            sync.sync(&buf, Size::new(4, 4)).unwrap();
        }
        assert_eq!(sync.target().recreations(), 3);
    }

    #[test]
    fn test_on_change_policy() {
        let buf = filled(2, 2, RED);
        let mut sync = synchronizer(MemoryTarget::new(), RecreatePolicy::OnChange);

        sync.sync(&buf, Size::new(4, 4)).unwrap();
        sync.sync(&buf, Size::new(5, 5)).unwrap(); // floor keeps 2x2
        assert_eq!(sync.target().recreations(), 1);

        sync.sync(&buf, Size::new(6, 4)).unwrap();
        assert_eq!(sync.target().recreations(), 2);
        assert_eq!(sync.scale(), Some(ScaleFactors { x: 3, y: 2 }));

        // a skipped frame forces a fresh texture on the next cycle
        sync.target_mut().fail_next_locks(1);
        assert_eq!(sync.sync(&buf, Size::new(6, 4)).unwrap(), SyncOutcome::Skipped);
        sync.sync(&buf, Size::new(6, 4)).unwrap();
        assert_eq!(sync.target().recreations(), 3);
    }

    #[test]
    fn test_padded_rows() {
        let buf = filled(3, 2, RED);
        let mut sync = synchronizer(MemoryTarget::with_row_alignment(256), RecreatePolicy::EveryFrame);
        sync.sync(&buf, Size::new(6, 6)).unwrap();

        let target = sync.target();
        assert_eq!(target.pitch(), 256);
        for row in target.bytes().chunks_exact(256) {
            assert!(row[..24].chunks_exact(4).all(|t| t == [255, 0, 0, 255]));
            assert!(row[24..].iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn test_parallel_synchronizer_matches_sequential() {
        let mut buf = PixelBuffer::try_new(9, 7).unwrap();
        for y in 0..7 {
            for x in 0..9 {
                buf.write_pixel(Color::RGBA(x as u8 * 20, y as u8 * 30, 7, 255), x, y);
            }
        }
        let physical = Size::new(40, 30);

        let mut seq = synchronizer(MemoryTarget::with_row_alignment(64), RecreatePolicy::EveryFrame);
        let mut par = TextureSynchronizer::new(
            MemoryTarget::with_row_alignment(64),
            Converter::parallel(3).unwrap(),
            PixelFormat::Rgba32,
            RecreatePolicy::EveryFrame,
        );
        seq.sync(&buf, physical).unwrap();
        par.sync(&buf, physical).unwrap();
        assert_eq!(seq.target().bytes(), par.target().bytes());
    }

    /// Target that hands out a view smaller than the texture it claims to be
    struct ShortTarget;

    impl StreamingTarget for ShortTarget {
        fn recreate(&mut self, _size: Size, _format: PixelFormat) -> Result<()> {
            Ok(())
        }

        fn with_lock(
            &mut self,
            write: &mut dyn FnMut(&mut [u8], usize),
        ) -> std::result::Result<(), crate::target::LockError> {
            write(&mut [0; 4], 4);
            Ok(())
        }

        fn size(&self) -> Option<Size> {
            Some(Size::new(1, 1))
        }
    }

    #[test]
    fn test_short_view_is_an_error() {
        let buf = filled(2, 2, RED);
        let mut sync = TextureSynchronizer::new(
            ShortTarget,
            Converter::sequential(),
            PixelFormat::Rgba32,
            RecreatePolicy::EveryFrame,
        );
        assert!(matches!(
            sync.sync(&buf, Size::new(2, 2)),
            Err(Error::ViewTooSmall { .. })
        ));
    }
}
