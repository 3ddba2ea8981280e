use std::fmt;

use model::{BYTES_PER_PIXEL, ScreenRect, Vec2i};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterBufferError {
    OutOfBounds { requested: Vec2i, max: Vec2i },
    TileOutOfBounds { rect: ScreenRect },
    TileSizeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for RasterBufferError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RasterBufferError::OutOfBounds { requested, max } => write!(
                formatter,
                "raster size {}x{} exceeds capacity {}x{}",
                requested.x, requested.y, max.x, max.y
            ),
            RasterBufferError::TileOutOfBounds { rect } => write!(
                formatter,
                "tile [{}, {})x[{}, {}) lies outside the screen",
                rect.left, rect.right, rect.top, rect.bottom
            ),
            RasterBufferError::TileSizeMismatch { expected, actual } => write!(
                formatter,
                "tile carries {actual} bytes, expected {expected}"
            ),
        }
    }
}

impl std::error::Error for RasterBufferError {}

/// Read-only view of one output buffer, row-major RGBA8 with `size.x * 4` stride.
#[derive(Debug, Clone, Copy)]
pub struct RasterFrame<'a> {
    pub index: usize,
    pub size: Vec2i,
    pub pixels: &'a [u8],
}

impl RasterFrame<'_> {
    pub fn pixel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        if x < 0 || y < 0 || x >= self.size.x || y >= self.size.y {
            return None;
        }
        let offset = (y as usize * self.size.x as usize + x as usize) * BYTES_PER_PIXEL;
        let bytes = self.pixels.get(offset..offset + BYTES_PER_PIXEL)?;
        Some([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

/// Two screen-sized buffers: one active for display, one written by the render.
///
/// Both are allocated once at the maximum screen size. Only the prefix
/// `size.x * size.y * 4` of each is meaningful.
#[derive(Debug)]
pub struct RasterBuffers {
    max_size: Vec2i,
    size: Vec2i,
    buffers: [Vec<u8>; 2],
    active_index: usize,
}

impl RasterBuffers {
    pub fn new(max_size: Vec2i) -> Self {
        let max_size = Vec2i::new(max_size.x.max(0), max_size.y.max(0));
        let capacity = max_size.x as usize * max_size.y as usize * BYTES_PER_PIXEL;
        Self {
            max_size,
            size: Vec2i::ZERO,
            buffers: [vec![u8::MAX; capacity], vec![u8::MAX; capacity]],
            active_index: 0,
        }
    }

    pub fn max_size(&self) -> Vec2i {
        self.max_size
    }

    pub fn size(&self) -> Vec2i {
        self.size
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn back_index(&self) -> usize {
        1 - self.active_index
    }

    pub fn set_size(&mut self, size: Vec2i) -> Result<(), RasterBufferError> {
        if size.x < 0 || size.y < 0 || size.x > self.max_size.x || size.y > self.max_size.y {
            return Err(RasterBufferError::OutOfBounds {
                requested: size,
                max: self.max_size,
            });
        }
        self.size = size;
        Ok(())
    }

    pub fn active(&self) -> RasterFrame<'_> {
        self.frame(self.active_index)
    }

    pub fn back(&self) -> RasterFrame<'_> {
        self.frame(self.back_index())
    }

    /// Seeds the back buffer with the displayed image before a partial redraw.
    pub fn copy_active_to_back(&mut self) {
        let len = self.used_len();
        let [first, second] = &mut self.buffers;
        let (active, back) = if self.active_index == 0 {
            (first, second)
        } else {
            (second, first)
        };
        back[..len].copy_from_slice(&active[..len]);
    }

    /// Copies tile-local RGBA8 `pixels` into the back buffer at `rect`.
    pub fn write_tile(&mut self, rect: ScreenRect, pixels: &[u8]) -> Result<(), RasterBufferError> {
        if rect.is_empty() {
            return Ok(());
        }
        if rect.left < 0 || rect.top < 0 || rect.right > self.size.x || rect.bottom > self.size.y {
            return Err(RasterBufferError::TileOutOfBounds { rect });
        }
        let expected = rect.area() * BYTES_PER_PIXEL;
        if pixels.len() != expected {
            return Err(RasterBufferError::TileSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }

        let stride = self.size.x as usize * BYTES_PER_PIXEL;
        let row_len = rect.width() as usize * BYTES_PER_PIXEL;
        let back_index = self.back_index();
        let back = &mut self.buffers[back_index];
        for (row, source) in pixels.chunks_exact(row_len).enumerate() {
            let start = (rect.top as usize + row) * stride + rect.left as usize * BYTES_PER_PIXEL;
            back[start..start + row_len].copy_from_slice(source);
        }
        Ok(())
    }

    /// Makes the back buffer the active one.
    pub fn flip(&mut self) {
        self.active_index = self.back_index();
    }

    fn used_len(&self) -> usize {
        self.size.x as usize * self.size.y as usize * BYTES_PER_PIXEL
    }

    fn frame(&self, index: usize) -> RasterFrame<'_> {
        RasterFrame {
            index,
            size: self.size,
            pixels: &self.buffers[index][..self.used_len()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_tile(rect: ScreenRect, value: u8) -> Vec<u8> {
        vec![value; rect.area() * BYTES_PER_PIXEL]
    }

    #[test]
    fn flip_swaps_active_and_back() {
        let mut buffers = RasterBuffers::new(Vec2i::new(4, 4));
        buffers.set_size(Vec2i::new(4, 4)).expect("size");
        assert_eq!((buffers.active_index(), buffers.back_index()), (0, 1));

        let rect = ScreenRect::new(0, 0, 4, 4);
        buffers
            .write_tile(rect, &solid_tile(rect, 7))
            .expect("write tile");
        assert_eq!(buffers.active().pixel(0, 0), Some([u8::MAX; 4]));

        buffers.flip();
        assert_eq!(buffers.active_index(), 1);
        assert_eq!(buffers.active().pixel(3, 3), Some([7; 4]));
    }

    #[test]
    fn write_tile_lands_at_its_screen_offset() {
        let mut buffers = RasterBuffers::new(Vec2i::new(8, 8));
        buffers.set_size(Vec2i::new(6, 5)).expect("size");
        let rect = ScreenRect::new(2, 1, 4, 3);
        buffers
            .write_tile(rect, &solid_tile(rect, 0))
            .expect("write tile");
        buffers.flip();

        let frame = buffers.active();
        assert_eq!(frame.pixels.len(), 6 * 5 * 4);
        assert_eq!(frame.pixel(2, 1), Some([0; 4]));
        assert_eq!(frame.pixel(3, 2), Some([0; 4]));
        assert_eq!(frame.pixel(1, 1), Some([u8::MAX; 4]));
        assert_eq!(frame.pixel(4, 2), Some([u8::MAX; 4]));
        assert_eq!(frame.pixel(2, 3), Some([u8::MAX; 4]));
        assert_eq!(frame.pixel(6, 0), None);
    }

    #[test]
    fn copy_active_to_back_preserves_untouched_pixels() {
        let mut buffers = RasterBuffers::new(Vec2i::new(4, 4));
        buffers.set_size(Vec2i::new(4, 4)).expect("size");
        let full = ScreenRect::new(0, 0, 4, 4);
        buffers
            .write_tile(full, &solid_tile(full, 3))
            .expect("write tile");
        buffers.flip();

        buffers.copy_active_to_back();
        let corner = ScreenRect::new(0, 0, 1, 1);
        buffers
            .write_tile(corner, &solid_tile(corner, 9))
            .expect("write tile");
        buffers.flip();

        let frame = buffers.active();
        assert_eq!(frame.pixel(0, 0), Some([9; 4]));
        assert_eq!(frame.pixel(3, 3), Some([3; 4]));
    }

    #[test]
    fn rejects_sizes_and_tiles_past_capacity() {
        let mut buffers = RasterBuffers::new(Vec2i::new(4, 4));
        assert_eq!(
            buffers.set_size(Vec2i::new(5, 4)),
            Err(RasterBufferError::OutOfBounds {
                requested: Vec2i::new(5, 4),
                max: Vec2i::new(4, 4),
            })
        );
        buffers.set_size(Vec2i::new(2, 2)).expect("size");
        let rect = ScreenRect::new(0, 0, 3, 1);
        assert_eq!(
            buffers.write_tile(rect, &solid_tile(rect, 0)),
            Err(RasterBufferError::TileOutOfBounds { rect })
        );
        let rect = ScreenRect::new(0, 0, 2, 2);
        assert_eq!(
            buffers.write_tile(rect, &[0; 4]),
            Err(RasterBufferError::TileSizeMismatch {
                expected: 16,
                actual: 4,
            })
        );
    }
}
