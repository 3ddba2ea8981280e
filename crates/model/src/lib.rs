pub mod color;
pub mod geometry;

use bitvec::prelude::{BitVec, Lsb0};

pub use color::{Hsv, Rgb, hsv_to_rgb, linear_to_srgb8};
pub use geometry::{CanvasBounds, CanvasPoint, ScreenRect, Vec2i};

pub const BYTES_PER_PIXEL: usize = 4;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TilePos {
    pub x: u32,
    pub y: u32,
}

/// Partition of the screen into render tiles.
///
/// A tile is `blocks_per_tile` blocks wide and each block is `block_width`
/// pixels wide. Tiles on the right and bottom edges are cut to the screen.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TileLayout {
    screen_size: Vec2i,
    block_width: u32,
    blocks_per_tile: u32,
    tiles_per_row: u32,
    tiles_per_column: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileLayoutError {
    ZeroBlockWidth,
    ZeroBlocksPerTile,
    NegativeScreenSize,
    TileWidthOverflow,
    TileIndexOutOfBounds,
}

impl std::fmt::Display for TileLayoutError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TileLayoutError::ZeroBlockWidth => write!(formatter, "block width must be at least 1"),
            TileLayoutError::ZeroBlocksPerTile => {
                write!(formatter, "a tile must hold at least one block")
            }
            TileLayoutError::NegativeScreenSize => {
                write!(formatter, "screen size cannot be negative")
            }
            TileLayoutError::TileWidthOverflow => write!(formatter, "tile width overflows u32"),
            TileLayoutError::TileIndexOutOfBounds => write!(formatter, "tile index out of bounds"),
        }
    }
}

impl std::error::Error for TileLayoutError {}

impl TileLayout {
    pub fn new(
        screen_size: Vec2i,
        block_width: u32,
        blocks_per_tile: u32,
    ) -> Result<Self, TileLayoutError> {
        if block_width == 0 {
            return Err(TileLayoutError::ZeroBlockWidth);
        }
        if blocks_per_tile == 0 {
            return Err(TileLayoutError::ZeroBlocksPerTile);
        }
        if screen_size.x < 0 || screen_size.y < 0 {
            return Err(TileLayoutError::NegativeScreenSize);
        }
        let tile_width = block_width
            .checked_mul(blocks_per_tile)
            .ok_or(TileLayoutError::TileWidthOverflow)?;
        Ok(Self {
            screen_size,
            block_width,
            blocks_per_tile,
            tiles_per_row: (screen_size.x as u32).div_ceil(tile_width),
            tiles_per_column: (screen_size.y as u32).div_ceil(tile_width),
        })
    }

    pub fn screen_size(&self) -> Vec2i {
        self.screen_size
    }

    pub fn block_width(&self) -> u32 {
        self.block_width
    }

    pub fn blocks_per_tile(&self) -> u32 {
        self.blocks_per_tile
    }

    pub fn tile_width(&self) -> u32 {
        self.block_width * self.blocks_per_tile
    }

    pub fn tiles_per_row(&self) -> u32 {
        self.tiles_per_row
    }

    pub fn tiles_per_column(&self) -> u32 {
        self.tiles_per_column
    }

    pub const fn max_tiles(&self) -> usize {
        self.tiles_per_row as usize * self.tiles_per_column as usize
    }

    pub fn tile_index(&self, tile: TilePos) -> Result<usize, TileLayoutError> {
        if tile.x >= self.tiles_per_row || tile.y >= self.tiles_per_column {
            Err(TileLayoutError::TileIndexOutOfBounds)
        } else {
            Ok((tile.y * self.tiles_per_row + tile.x) as usize)
        }
    }

    pub fn tile_pos(&self, index: usize) -> Result<TilePos, TileLayoutError> {
        if index >= self.max_tiles() {
            Err(TileLayoutError::TileIndexOutOfBounds)
        } else {
            let x = index % self.tiles_per_row as usize;
            let y = index / self.tiles_per_row as usize;
            Ok(TilePos {
                x: x as u32,
                y: y as u32,
            })
        }
    }

    /// Screen rectangle covered by `tile`, cut to the screen edges.
    pub fn tile_rect(&self, tile: TilePos) -> Result<ScreenRect, TileLayoutError> {
        self.tile_index(tile)?;
        let width = self.tile_width() as i32;
        let left = tile.x as i32 * width;
        let top = tile.y as i32 * width;
        Ok(ScreenRect::new(
            left,
            top,
            (left + width).min(self.screen_size.x),
            (top + width).min(self.screen_size.y),
        ))
    }

    pub fn iter_tiles(&self) -> impl Iterator<Item = (TilePos, ScreenRect)> + '_ {
        (0..self.max_tiles()).map(move |index| {
            let tile = self
                .tile_pos(index)
                .unwrap_or_else(|error| panic!("tile index {index} within layout: {error}"));
            let rect = self
                .tile_rect(tile)
                .unwrap_or_else(|error| panic!("tile rect within layout: {error}"));
            (tile, rect)
        })
    }
}

/// Set of tiles that need to be rasterized this cycle.
#[derive(Debug, Clone)]
pub struct TileMask {
    // bits.len() == layout.max_tiles()
    layout: TileLayout,
    bits: BitVec<usize, Lsb0>,
    marked_count: usize,
}

impl TileMask {
    pub fn empty(layout: TileLayout) -> Self {
        Self {
            layout,
            bits: BitVec::repeat(false, layout.max_tiles()),
            marked_count: 0,
        }
    }

    pub fn full(layout: TileLayout) -> Self {
        Self {
            layout,
            bits: BitVec::repeat(true, layout.max_tiles()),
            marked_count: layout.max_tiles(),
        }
    }

    pub fn layout(&self) -> &TileLayout {
        &self.layout
    }

    pub fn mark(&mut self, tile: TilePos) -> Result<(), TileLayoutError> {
        let index = self.layout.tile_index(tile)?;
        let was_marked = self.bits[index];
        self.bits.set(index, true);
        self.marked_count += !was_marked as usize;
        Ok(())
    }

    /// Marks every tile that `rect` touches. Parts outside the screen are ignored.
    pub fn mark_rect(&mut self, rect: ScreenRect) {
        let rect = rect.intersection(&ScreenRect::from_size(self.layout.screen_size));
        if rect.is_empty() {
            return;
        }
        let width = self.layout.tile_width() as i32;
        let first_x = (rect.left / width) as u32;
        let first_y = (rect.top / width) as u32;
        let last_x = ((rect.right - 1) / width) as u32;
        let last_y = ((rect.bottom - 1) / width) as u32;
        for y in first_y..=last_y {
            for x in first_x..=last_x {
                self.mark(TilePos { x, y })
                    .unwrap_or_else(|error| panic!("clamped rect tile out of layout: {error}"));
            }
        }
    }

    pub fn is_marked(&self, tile: TilePos) -> bool {
        self.layout
            .tile_index(tile)
            .map(|index| self.bits[index])
            .unwrap_or(false)
    }

    pub fn marked_count(&self) -> usize {
        self.marked_count
    }

    pub fn is_empty(&self) -> bool {
        self.marked_count == 0
    }

    pub fn iter_marked(&self) -> impl Iterator<Item = (TilePos, ScreenRect)> + '_ {
        self.bits.iter_ones().map(|index| {
            let tile = self
                .layout
                .tile_pos(index)
                .unwrap_or_else(|error| panic!("marked tile index {index}: {error}"));
            let rect = self
                .layout
                .tile_rect(tile)
                .unwrap_or_else(|error| panic!("marked tile rect: {error}"));
            (tile, rect)
        })
    }
}
