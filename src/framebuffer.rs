//! The monochrome display as the machine sees it: 32 rows of 64 pixels, one
//! `u64` per row, bit 63 being the leftmost column. Pixels only ever change by
//! XOR, which is what gives sprite drawing its collision flag.

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    rows: [u64; DISPLAY_HEIGHT],
}

impl FrameBuffer {
    pub fn new() -> Self {
        FrameBuffer {
            rows: [0; DISPLAY_HEIGHT],
        }
    }

    pub fn clear(&mut self) {
        self.rows = [0; DISPLAY_HEIGHT];
    }

    pub fn rows(&self) -> &[u64; DISPLAY_HEIGHT] {
        &self.rows
    }

    /// is the pixel at column `x`, row `y` lit
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.rows[y % DISPLAY_HEIGHT] & (1 << (63 - x % DISPLAY_WIDTH)) != 0
    }

    /// XOR an 8 pixel wide sprite onto the screen with its top-left corner at
    /// (`x`, `y`), both already reduced into range. Returns whether any lit
    /// pixel was turned off.
    ///
    /// With `wrap` set, pixels falling off the right edge reappear on the left
    /// of the same row and rows falling off the bottom continue from the top;
    /// otherwise they are clipped.
    pub fn draw_sprite(&mut self, x: usize, y: usize, sprite: &[u8], wrap: bool) -> bool {
        let mut collision = false;
        for (i, &line) in sprite.iter().enumerate() {
            let mut row = y + i;
            if row >= DISPLAY_HEIGHT {
                if !wrap {
                    break;
                }
                row %= DISPLAY_HEIGHT;
            }
            let placed = (line as u64) << 56;
            let mask = if wrap {
                placed.rotate_right(x as u32)
            } else {
                placed >> x
            };
            if self.rows[row] & mask != 0 {
                collision = true;
            }
            self.rows[row] ^= mask;
        }
        collision
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_blank() {
        let fb = FrameBuffer::new();
        assert!(fb.rows().iter().all(|r| *r == 0));
    }

    #[test]
    fn test_draw_top_left() {
        let mut fb = FrameBuffer::new();
        assert!(!fb.draw_sprite(0, 0, &[0xf0, 0x90], false));
        assert_eq!(fb.rows()[0], 0xf000_0000_0000_0000);
        assert_eq!(fb.rows()[1], 0x9000_0000_0000_0000);
        assert!(fb.pixel(0, 0));
        assert!(fb.pixel(3, 0));
        assert!(!fb.pixel(4, 0));
        assert!(!fb.pixel(1, 1));
    }

    #[test]
    fn test_draw_twice_erases_with_collision() {
        let mut fb = FrameBuffer::new();
        assert!(!fb.draw_sprite(10, 5, &[0xff], false));
        assert!(fb.draw_sprite(10, 5, &[0xff], false));
        assert_eq!(fb, FrameBuffer::new());
    }

    #[test]
    fn test_collision_sticky_across_rows() {
        let mut fb = FrameBuffer::new();
        fb.draw_sprite(0, 0, &[0x80], false);
        // first row collides, second doesn't; flag must survive
        assert!(fb.draw_sprite(0, 0, &[0x80, 0x80], false));
        assert!(!fb.pixel(0, 0));
        assert!(fb.pixel(0, 1));
    }

    #[test]
    fn test_clip_right_edge() {
        let mut fb = FrameBuffer::new();
        fb.draw_sprite(60, 0, &[0xff], false);
        assert_eq!(fb.rows()[0], 0x0000_0000_0000_000f);
    }

    #[test]
    fn test_wrap_right_edge() {
        let mut fb = FrameBuffer::new();
        fb.draw_sprite(60, 0, &[0xff], true);
        assert_eq!(fb.rows()[0], 0xf000_0000_0000_000f);
    }

    #[test]
    fn test_clip_bottom_edge() {
        let mut fb = FrameBuffer::new();
        fb.draw_sprite(0, 30, &[0x80, 0x80, 0x80, 0x80], false);
        assert!(fb.pixel(0, 30));
        assert!(fb.pixel(0, 31));
        assert!(!fb.pixel(0, 0));
        assert!(!fb.pixel(0, 1));
    }

    #[test]
    fn test_wrap_bottom_edge() {
        let mut fb = FrameBuffer::new();
        fb.draw_sprite(0, 30, &[0x80, 0x80, 0x80], true);
        assert!(fb.pixel(0, 30));
        assert!(fb.pixel(0, 31));
        assert!(fb.pixel(0, 0));
        assert!(!fb.pixel(0, 1));
    }

    #[test]
    fn test_clear() {
        let mut fb = FrameBuffer::new();
        fb.draw_sprite(3, 3, &[0xaa, 0x55], false);
        fb.clear();
        assert_eq!(fb, FrameBuffer::default());
    }
}
