//! The bitmap context: one logical framebuffer and the texture it is shown through.

use sdl2::pixels::Color;
use sdl2::surface::Surface;

use crate::buffer::{Image, PixelBuffer};
use crate::config::RenderConfig;
use crate::convert::{default_workers, Converter};
use crate::error::Result;
use crate::format::PixelFormat;
use crate::scale::Size;
use crate::state::BitmapState;
use crate::sync::{SyncOutcome, TextureSynchronizer};
use crate::target::StreamingTarget;

struct Grid {
    state: BitmapState,
    buffer: PixelBuffer,
}

/// Owns the physical surface size, the bitmap state, the pixel buffer and the
/// texture synchronizer.
///
/// The buffer is allocated once by [`Bitmap::initialize`] and never resized.
/// Pixel writes before that are a usage error and panic.
pub struct Bitmap<T> {
    physical: Size,
    grid: Option<Grid>,
    sync: TextureSynchronizer<T>,
}

impl<T: StreamingTarget> Bitmap<T> {
    pub fn new(sync: TextureSynchronizer<T>, physical: Size) -> Self {
        Self {
            physical,
            grid: None,
            sync,
        }
    }

    /// Build the synchronizer from render settings
    pub fn with_config(target: T, physical: Size, config: &RenderConfig) -> Result<Self> {
        let workers = config.workers.unwrap_or_else(default_workers);
        let converter = Converter::for_flag(config.multithreading, workers)?;
        let sync = TextureSynchronizer::new(target, converter, config.format, config.recreate);
        Ok(Self::new(sync, physical))
    }

    /// Allocate the logical grid.
    ///
    /// A zero dimension falls back to the physical surface on that axis.
    /// Only the first call has any effect; later calls log a warning.
    pub fn initialize(&mut self, width: u32, height: u32) -> Result<()> {
        if let Some(grid) = &self.grid {
            log::warn!(
                "bitmap already initialized at {}x{}, ignoring repeated initialize({}, {})",
                grid.buffer.width(),
                grid.buffer.height(),
                width,
                height
            );
            return Ok(());
        }

        let logical = Size::new(
            if width > 0 { width } else { self.physical.width },
            if height > 0 { height } else { self.physical.height },
        );
        let buffer = PixelBuffer::try_new(logical.width, logical.height)?;
        let state = BitmapState::new(logical, self.physical);
        log::info!(
            "bitmap {}x{} on {}x{} surface",
            logical.width,
            logical.height,
            self.physical.width,
            self.physical.height
        );

        self.grid = Some(Grid { state, buffer });
        Ok(())
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.grid.is_some()
    }

    /// Record a new physical surface size. Takes effect at the next sync.
    pub fn resize(&mut self, physical: Size) {
        self.physical = physical;
    }

    #[inline]
    pub fn physical_size(&self) -> Size {
        self.physical
    }

    pub fn state(&self) -> Option<&BitmapState> {
        self.grid.as_ref().map(|g| &g.state)
    }

    pub fn state_mut(&mut self) -> Option<&mut BitmapState> {
        self.grid.as_mut().map(|g| &mut g.state)
    }

    pub fn buffer(&self) -> Option<&PixelBuffer> {
        self.grid.as_ref().map(|g| &g.buffer)
    }

    #[track_caller]
    fn buffer_mut(&mut self) -> &mut PixelBuffer {
        match self.grid.as_mut() {
            Some(grid) => &mut grid.buffer,
            None => {
                log::error!("pixel buffer written before Bitmap::initialize");
                panic!("pixel buffer not initialized; call Bitmap::initialize before drawing");
            },
        }
    }

    /// Logical pixel at (x, y), None when out of range or uninitialized
    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        self.buffer()?.pixel(x, y)
    }

    /// Set one logical pixel. Coordinates outside the grid are ignored.
    #[track_caller]
    pub fn write_pixel(&mut self, color: Color, x: i32, y: i32) {
        self.buffer_mut().write_pixel(color, x, y);
    }

    #[track_caller]
    pub fn fill(&mut self, color: Color) {
        self.buffer_mut().fill(color);
    }

    /// Copy an RGBA image onto the grid from the origin, clipping the overflow
    #[track_caller]
    pub fn bulk_copy_from(&mut self, image: &Image) {
        self.buffer_mut().bulk_copy_from(image);
    }

    /// Copy an SDL surface of any format onto the grid from the origin
    #[track_caller]
    pub fn bulk_copy_from_surface(&mut self, surface: &Surface) -> Result<()> {
        let rgba = surface.convert_format(PixelFormat::Rgba32.sdl_format())?;
        let (width, height, pitch) = (rgba.width(), rgba.height(), rgba.pitch() as usize);
        let buffer = self.buffer_mut();
        rgba.with_lock(|bytes| {
            if let Some(image) = Image::new(width, height, pitch, bytes) {
                buffer.bulk_copy_from(&image);
            }
        });
        Ok(())
    }

    /// Size the blit rectangle to a percentage of the physical surface
    pub fn scale_to_percent(&mut self, width_percent: u32, height_percent: u32) {
        let physical = self.physical;
        match self.state_mut() {
            Some(state) => state.scale(physical, width_percent, height_percent),
            None => log::warn!("scale_to_percent called before initialize, ignoring"),
        }
    }

    /// Switch between sequential and parallel conversion
    pub fn set_multithreading(&mut self, enabled: bool, workers: usize) -> Result<()> {
        self.sync.set_converter(Converter::for_flag(enabled, workers)?);
        Ok(())
    }

    #[inline]
    pub fn synchronizer(&self) -> &TextureSynchronizer<T> {
        &self.sync
    }

    #[inline]
    pub fn target(&self) -> &T {
        self.sync.target()
    }

    #[inline]
    pub fn target_mut(&mut self) -> &mut T {
        self.sync.target_mut()
    }

    /// Push the buffer to the texture for this frame
    pub fn sync(&mut self) -> Result<SyncOutcome> {
        match &self.grid {
            Some(grid) => self.sync.sync(&grid.buffer, self.physical),
            None => Ok(SyncOutcome::Inactive),
        }
    }
}
