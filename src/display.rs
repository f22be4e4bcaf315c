//! Monochrome 64x32 framebuffer.
pub const DISPLAY_WIDTH_PIXELS: usize = 64;
pub const DISPLAY_HEIGHT_PIXELS: usize = 32;
pub const DISPLAY_PIXELS: usize = DISPLAY_WIDTH_PIXELS * DISPLAY_HEIGHT_PIXELS;
/// Sprites are always one byte, i.e. eight pixels, wide.
pub const SPRITE_WIDTH_PIXELS: usize = 8;

/// Pixel `(x, y)` lives at index `x + y * DISPLAY_WIDTH_PIXELS`.
pub struct Framebuffer {
    pixels: [bool; DISPLAY_PIXELS],
    damaged: bool,
}

impl Framebuffer {
    pub fn new() -> Self {
        Self {
            pixels: [false; DISPLAY_PIXELS],
            damaged: false,
        }
    }

    pub fn pixels(&self) -> &[bool; DISPLAY_PIXELS] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        x < DISPLAY_WIDTH_PIXELS
            && y < DISPLAY_HEIGHT_PIXELS
            && self.pixels[x + y * DISPLAY_WIDTH_PIXELS]
    }

    pub fn is_damaged(&self) -> bool {
        self.damaged
    }

    /// Hand out the pixels if anything changed since the last call, clearing
    /// the damage flag.
    pub fn take_damaged(&mut self) -> Option<&[bool; DISPLAY_PIXELS]> {
        if std::mem::take(&mut self.damaged) {
            Some(&self.pixels)
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.pixels = [false; DISPLAY_PIXELS];
        self.damaged = true;
    }

    /// XOR an 8 pixel wide sprite onto the screen with its top left corner at
    /// `(x, y)`. Each byte of `rows` is one row, most significant bit leftmost.
    /// Pixels falling off the right or bottom edge are dropped, not wrapped.
    ///
    /// Returns `true` if any lit pixel was turned off.
    pub fn draw_sprite(&mut self, x: usize, y: usize, rows: &[u8]) -> bool {
        let mut collision = false;
        for (dy, row) in rows.iter().enumerate() {
            let py = y + dy;
            if py >= DISPLAY_HEIGHT_PIXELS {
                break;
            }
            for dx in 0..SPRITE_WIDTH_PIXELS {
                let px = x + dx;
                if px >= DISPLAY_WIDTH_PIXELS {
                    break;
                }
                if row & (0x80 >> dx) == 0 {
                    continue;
                }
                let pixel = &mut self.pixels[px + py * DISPLAY_WIDTH_PIXELS];
                collision |= *pixel;
                *pixel ^= true;
            }
        }
        self.damaged = true;
        collision
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Framebuffer {
    /// Text rendering, one line per scanline.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.pixels.chunks(DISPLAY_WIDTH_PIXELS) {
            let line: String = row.iter().map(|&p| if p { '#' } else { '.' }).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
