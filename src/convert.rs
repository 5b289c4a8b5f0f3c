//! Conversion pipeline: expands the logical grid into locked texture memory.
//!
//! Each logical pixel is packed once and replicated into an `sx * sy` block of
//! texels. Destination rows are always addressed through the pitch reported by
//! the texture lock, never an assumed tight stride.
//!
//! Both strategies run the same band kernel. The parallel one only decides
//! which contiguous run of logical rows each worker gets; since a logical row
//! `i` owns physical rows `[i * sy, i * sy + sy)`, bands never overlap.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use sdl2::pixels::Color;

use crate::buffer::PixelBuffer;
use crate::error::{Error, Result};
use crate::format::{PixelFormat, BYTES_PER_PIXEL};
use crate::scale::ScaleFactors;

// ============================================================================
// Band kernel
// ============================================================================

/// Expand whole logical rows into `dst`, which begins at the first physical
/// row of the band. `src.len()` must be a multiple of `width`.
fn expand_band(
    src: &[Color],
    width: usize,
    dst: &mut [u8],
    pitch: usize,
    scale: ScaleFactors,
    format: PixelFormat,
) {
    let sx = scale.x as usize;
    let sy = scale.y as usize;
    let block_bytes = sx * BYTES_PER_PIXEL;

    for (i, row) in src.chunks_exact(width).enumerate() {
        for (j, &color) in row.iter().enumerate() {
            let texel = format.texel(color);
            for dy in 0..sy {
                let start = (i * sy + dy) * pitch + j * block_bytes;
                for out in dst[start..start + block_bytes].chunks_exact_mut(BYTES_PER_PIXEL) {
                    out.copy_from_slice(&texel);
                }
            }
        }
    }
}

/// Bytes a view must hold for the upscaled grid. The last row needs no padding.
pub fn required_len(buffer: &PixelBuffer, scale: ScaleFactors, pitch: usize) -> usize {
    let rows = buffer.height() as usize * scale.y as usize;
    let row_bytes = buffer.width() as usize * scale.x as usize * BYTES_PER_PIXEL;
    (rows - 1) * pitch + row_bytes
}

fn check_view(buffer: &PixelBuffer, scale: ScaleFactors, dst: &[u8], pitch: usize) -> Result<()> {
    let row_bytes = buffer.width() as usize * scale.x as usize * BYTES_PER_PIXEL;
    let needed = required_len(buffer, scale, pitch);
    if pitch < row_bytes || dst.len() < needed {
        return Err(Error::ViewTooSmall {
            needed,
            pitch,
            len: dst.len(),
        });
    }
    Ok(())
}

// ============================================================================
// Strategies
// ============================================================================

/// Single pass over every logical row
pub fn expand_sequential(
    buffer: &PixelBuffer,
    scale: ScaleFactors,
    format: PixelFormat,
    dst: &mut [u8],
    pitch: usize,
) -> Result<()> {
    check_view(buffer, scale, dst, pitch)?;
    expand_band(
        buffer.as_slice(),
        buffer.width() as usize,
        dst,
        pitch,
        scale,
        format,
    );
    Ok(())
}

/// Split the logical rows into `workers` contiguous chunks and expand them on
/// `pool`. Returns once every chunk is written.
pub fn expand_parallel(
    pool: &ThreadPool,
    workers: usize,
    buffer: &PixelBuffer,
    scale: ScaleFactors,
    format: PixelFormat,
    dst: &mut [u8],
    pitch: usize,
) -> Result<()> {
    check_view(buffer, scale, dst, pitch)?;

    let width = buffer.width() as usize;
    let rows_per_chunk = (buffer.height() as usize).div_ceil(workers.max(1));
    let band_bytes = rows_per_chunk * scale.y as usize * pitch;

    pool.install(|| {
        dst.par_chunks_mut(band_bytes)
            .zip(buffer.as_slice().par_chunks(rows_per_chunk * width))
            .for_each(|(band, rows)| expand_band(rows, width, band, pitch, scale, format));
    });
    Ok(())
}

// ============================================================================
// Converter
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Sequential,
    Parallel { workers: usize },
}

/// Runs the selected strategy. The parallel one keeps its worker pool alive
/// across frames; each call still forks and joins before returning.
pub struct Converter {
    strategy: Strategy,
    pool: Option<ThreadPool>,
}

impl Converter {
    pub fn sequential() -> Self {
        Self {
            strategy: Strategy::Sequential,
            pool: None,
        }
    }

    /// Build a fixed-size pool of `workers` threads (at least one)
    pub fn parallel(workers: usize) -> Result<Self> {
        let workers = workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("pixelgrid-convert-{}", i))
            .build()?;
        log::debug!("conversion pool started with {} workers", workers);
        Ok(Self {
            strategy: Strategy::Parallel { workers },
            pool: Some(pool),
        })
    }

    /// Pick a strategy from the multithreading capability flag
    pub fn for_flag(multithreaded: bool, workers: usize) -> Result<Self> {
        if multithreaded {
            Self::parallel(workers)
        } else {
            Ok(Self::sequential())
        }
    }

    #[inline]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn convert(
        &self,
        buffer: &PixelBuffer,
        scale: ScaleFactors,
        format: PixelFormat,
        dst: &mut [u8],
        pitch: usize,
    ) -> Result<()> {
        match (self.strategy, &self.pool) {
            (Strategy::Parallel { workers }, Some(pool)) => {
                expand_parallel(pool, workers, buffer, scale, format, dst, pitch)
            },
            _ => expand_sequential(buffer, scale, format, dst, pitch),
        }
    }
}

/// Worker count when none is configured
pub fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}
