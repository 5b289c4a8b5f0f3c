//! Resolution-independent software bitmap.
//!
//! Applications draw into a small logical grid ([`PixelBuffer`]) held by a
//! [`Bitmap`] context. Once per frame the grid is upscaled by integer pixel
//! replication into a streaming texture sized to the largest whole multiple
//! that fits the window, optionally spreading the work over a worker pool.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod bitmap;
pub mod buffer;
pub mod config;
pub mod convert;
pub mod display;
pub mod error;
pub mod format;
pub mod scale;
pub mod state;
pub mod sync;
pub mod target;
pub mod util;

pub use bitmap::Bitmap;
pub use buffer::{Image, PixelBuffer};
pub use config::{Command, Config};
pub use convert::{Converter, Strategy};
pub use display::{Display, InputEvent};
pub use error::{Error, Result};
pub use format::PixelFormat;
pub use scale::{ScaleFactors, Size};
pub use state::{BitmapState, Transform};
pub use sync::{RecreatePolicy, SyncOutcome, TextureSynchronizer};
pub use target::{LockError, MemoryTarget, SdlTarget, StreamingTarget};
