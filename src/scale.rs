//! Integer replication factors between the logical grid and the physical surface.

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// How many physical pixels one logical pixel covers on each axis. Always >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScaleFactors {
    pub x: u32,
    pub y: u32,
}

impl ScaleFactors {
    pub const IDENTITY: Self = Self { x: 1, y: 1 };

    /// Floor division of physical by logical size, clamped to 1 when the
    /// surface is smaller than the grid.
    pub fn compute(physical: Size, logical: Size) -> Self {
        Self {
            x: axis_scale(physical.width, logical.width),
            y: axis_scale(physical.height, logical.height),
        }
    }

    /// Physical size of the upscaled grid
    pub fn target_size(self, logical: Size) -> Size {
        Size::new(logical.width * self.x, logical.height * self.y)
    }
}

impl Default for ScaleFactors {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[inline]
fn axis_scale(physical: u32, logical: u32) -> u32 {
    physical.checked_div(logical).unwrap_or(0).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_multiple() {
        let s = ScaleFactors::compute(Size::new(8, 8), Size::new(4, 4));
        assert_eq!(s, ScaleFactors { x: 2, y: 2 });
    }

    #[test]
    fn test_floor_truncates_remainder() {
        let s = ScaleFactors::compute(Size::new(10, 10), Size::new(3, 3));
        assert_eq!(s, ScaleFactors { x: 3, y: 3 });
        assert_eq!(s.target_size(Size::new(3, 3)), Size::new(9, 9));
    }

    #[test]
    fn test_axes_are_independent() {
        let s = ScaleFactors::compute(Size::new(1920, 1080), Size::new(320, 240));
        assert_eq!(s, ScaleFactors { x: 6, y: 4 });
    }

    #[test]
    fn test_clamped_to_one() {
        let s = ScaleFactors::compute(Size::new(100, 0), Size::new(320, 240));
        assert_eq!(s, ScaleFactors::IDENTITY);
    }

    #[test]
    fn test_matches_floor_division() {
        let logical = Size::new(7, 5);
        for w in 0..64 {
            for h in 0..64 {
                let s = ScaleFactors::compute(Size::new(w, h), logical);
                assert_eq!(s.x, (w / 7).max(1));
                assert_eq!(s.y, (h / 5).max(1));
            }
        }
    }
}
