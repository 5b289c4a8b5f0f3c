//! Plain bitmap state: dimensions, drawing colors and the blit transform.

use sdl2::pixels::Color;

use crate::scale::Size;

/// Upper bound for percentage scaling
pub const MAX_SCALE_PERCENT: u32 = 500;

/// Destination rectangle for the final blit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transform {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BitmapState {
    pub width: u32,
    pub height: u32,
    pub tint: Color,
    pub stroke_fill: Color,
    pub shape_fill: Color,
    /// Clear color for `begin_frame`. None clears to transparent black.
    pub background: Option<Color>,
    pub transform: Transform,
    /// Degrees, always in [0, 360)
    pub rotation: u32,
}

/// Keep the destination's alpha, take r, g, b from `src`
#[inline]
fn copy_rgb(dst: &mut Color, src: Color) {
    dst.r = src.r;
    dst.g = src.g;
    dst.b = src.b;
}

impl BitmapState {
    /// Default state for a `logical` grid shown on a `physical` surface
    pub fn new(logical: Size, physical: Size) -> Self {
        Self {
            width: logical.width,
            height: logical.height,
            tint: Color::RGB(255, 255, 255),
            stroke_fill: Color::RGB(0, 0, 0),
            shape_fill: Color::RGB(255, 255, 255),
            background: None,
            transform: Transform {
                x: 0,
                y: 0,
                w: physical.width,
                h: physical.height,
            },
            rotation: 0,
        }
    }

    #[inline]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn set_tint(&mut self, color: Color) {
        copy_rgb(&mut self.tint, color);
    }

    pub fn set_stroke_fill(&mut self, color: Color) {
        copy_rgb(&mut self.stroke_fill, color);
    }

    pub fn set_shape_fill(&mut self, color: Color) {
        copy_rgb(&mut self.shape_fill, color);
    }

    pub fn set_background(&mut self, color: Option<Color>) {
        self.background = color;
    }

    pub fn rotate_deg(&mut self, degrees: u32) {
        self.rotation = degrees % 360;
    }

    /// Negative angles wrap around to [0, 360)
    pub fn rotate_rad(&mut self, radians: f64) {
        self.rotation = (radians.to_degrees() as i64).rem_euclid(360) as u32;
    }

    pub fn shift(&mut self, x: i32, y: i32) {
        self.transform.x = x;
        self.transform.y = y;
    }

    /// Size the destination rectangle to a percentage of the physical surface.
    ///
    /// The rectangle is `physical * 100 / percent` on each axis. Percentages
    /// above 500 are clamped; a zero percentage is rejected and leaves the
    /// transform untouched.
    pub fn scale(&mut self, physical: Size, width_percent: u32, height_percent: u32) {
        if width_percent == 0 || height_percent == 0 {
            log::warn!("scale factor of 0 percent not allowed, ignoring");
            return;
        }
        let wp = width_percent.min(MAX_SCALE_PERCENT) as f32;
        let hp = height_percent.min(MAX_SCALE_PERCENT) as f32;

        self.transform.w = (physical.width as f32 * (100.0 / wp)) as u32;
        self.transform.h = (physical.height as f32 * (100.0 / hp)) as u32;
    }
}
