//! Error type shared by the bitmap, synchronizer and display layers.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The pixel grid could not be allocated. There is no partial-buffer mode.
    #[error("failed to allocate {width}x{height} pixel buffer")]
    OutOfMemory { width: u32, height: u32 },

    /// Creating the streaming texture failed (window too small, device lost, ...).
    #[error("failed to create {width}x{height} streaming texture: {reason}")]
    Texture {
        width: u32,
        height: u32,
        reason: String,
    },

    /// A locked texture view is smaller than the upscaled grid it must hold.
    #[error("texture view too small: need {needed} bytes at pitch {pitch}, got {len}")]
    ViewTooSmall {
        needed: usize,
        pitch: usize,
        len: usize,
    },

    /// Anything SDL reports as a plain string.
    #[error("SDL error: {0}")]
    Sdl(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to build conversion worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<String> for Error {
    fn from(reason: String) -> Self {
        Self::Sdl(reason)
    }
}
