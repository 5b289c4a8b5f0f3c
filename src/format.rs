//! Destination pixel formats for the streaming texture.

use sdl2::pixels::{Color, PixelFormatEnum};
use serde::{Deserialize, Serialize};

/// Bytes per texel in every supported format.
pub const BYTES_PER_PIXEL: usize = 4;

/// Texel layout the conversion pipeline packs colors into.
///
/// This is the format descriptor handed to the texture when it is created and
/// used once per logical pixel to produce the 32-bit value that gets
/// replicated across its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// Bytes in memory are R, G, B, A on every platform
    #[default]
    Rgba32,
    /// Packed 0xRRGGBBAA
    Rgba8888,
    /// Packed 0xAARRGGBB
    Argb8888,
}

impl PixelFormat {
    /// Pack a color into its 32-bit texel value
    #[inline]
    pub fn pack(self, color: Color) -> u32 {
        let Color { r, g, b, a } = color;
        match self {
            Self::Rgba32 => u32::from_ne_bytes([r, g, b, a]),
            Self::Rgba8888 => u32::from_be_bytes([r, g, b, a]),
            Self::Argb8888 => u32::from_be_bytes([a, r, g, b]),
        }
    }

    /// Bytes of a packed texel as they land in texture memory
    #[inline]
    pub fn texel(self, color: Color) -> [u8; BYTES_PER_PIXEL] {
        self.pack(color).to_ne_bytes()
    }

    /// Matching SDL format for `create_texture_streaming`
    pub fn sdl_format(self) -> PixelFormatEnum {
        match self {
            // SDL_PIXELFORMAT_RGBA32 is an alias resolved by endianness
            Self::Rgba32 if cfg!(target_endian = "little") => PixelFormatEnum::ABGR8888,
            Self::Rgba32 | Self::Rgba8888 => PixelFormatEnum::RGBA8888,
            Self::Argb8888 => PixelFormatEnum::ARGB8888,
        }
    }
}
