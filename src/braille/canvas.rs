/// Off-screen Braille raster. Each character cell packs a 2x4 dot grid,
/// so a canvas of `width` x `height` cells has `2*width` x `4*height` pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct BrailleCanvas {
    width: usize,
    height: usize,
    /// Dot bits per cell, row major
    cells: Vec<u8>,
}

/// Dot bit for a pixel position inside its cell:
/// ```text
/// (0,0) (1,0)   0x01 0x08
/// (0,1) (1,1)   0x02 0x10
/// (0,2) (1,2)   0x04 0x20
/// (0,3) (1,3)   0x40 0x80
/// ```
const DOTS: [[u8; 4]; 2] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];

impl BrailleCanvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    /// Size in cells
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Size in pixels
    pub fn pixel_size(&self) -> (i32, i32) {
        (self.width as i32 * 2, self.height as i32 * 4)
    }

    /// Set a pixel; anything outside the canvas is ignored
    #[inline(always)]
    pub fn set(&mut self, x: i32, y: i32) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        let (cx, cy) = (x / 2, y / 4);
        if cx >= self.width || cy >= self.height {
            return;
        }
        self.cells[cy * self.width + cx] |= DOTS[x % 2][y % 4];
    }

    /// Braille glyph for a cell, `None` when no dot is set or out of range
    pub fn glyph(&self, col: usize, row: usize) -> Option<char> {
        if col >= self.width || row >= self.height {
            return None;
        }
        match self.cells[row * self.width + col] {
            0 => None,
            bits => char::from_u32(0x2800 + bits as u32),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|&b| b == 0)
    }

    /// One string per cell row, blank cells as U+2800
    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        self.cells.chunks(self.width.max(1)).take(self.height).map(|row| {
            row.iter()
                .map(|&b| char::from_u32(0x2800 + b as u32).unwrap_or(' '))
                .collect()
        })
    }
}
