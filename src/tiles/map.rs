//! Tile map: the tile grid of one image
//!
//! A `TileMap` owns the IFD describing one image together with a flat
//! arena of tiles, addressed by `TileIndex`. The map resolves the grid
//! geometry from the IFD, creates tiles on demand during writing, and
//! can expand its dimensions in resizable mode until the final IFD is
//! emitted.

use std::collections::HashMap;

use log::debug;

use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::Ifd;
use crate::tiles::index::TileIndex;
use crate::tiles::tile::TiffTile;

/// The tile grid of one image, owning its IFD and tiles
#[derive(Debug)]
pub struct TileMap {
    /// The directory describing this image
    ifd: Ifd,
    /// Tile arena; the lookup maps grid coordinates to positions here
    tiles: Vec<TiffTile>,
    /// Index lookup into the arena
    lookup: HashMap<TileIndex, usize>,
    /// Nominal tile width in pixels
    tile_width: u32,
    /// Nominal tile height in pixels
    tile_height: u32,
    /// Image width; grows in resizable mode
    dim_x: u32,
    /// Image height; grows in resizable mode
    dim_y: u32,
    /// Separated plane count (1 for chunky images)
    planes: u32,
    /// Samples per pixel across all planes
    samples_per_pixel: u32,
    /// Samples per pixel stored inside one tile
    tile_samples: u32,
    /// Bytes per sample
    bytes_per_sample: u32,
    /// True tile layout (vs strips)
    tiled: bool,
    /// Whether the grid may still grow
    resizable: bool,
}

impl TileMap {
    /// Builds the tile map for an image described by `ifd`
    ///
    /// Resizable maps start with whatever dimensions the IFD already
    /// declares (possibly none) and expand as tiles are updated; they
    /// require a true tiled layout, because a stripped image has no
    /// defined row stride until its final width is known.
    pub fn new(ifd: Ifd, resizable: bool) -> TiffResult<Self> {
        let tiled = ifd.is_tiled();
        if resizable && !tiled {
            return Err(TiffError::FormatError(
                "a resizable tile map requires TileWidth/TileLength".to_string(),
            ));
        }

        let (dim_x, dim_y) = if resizable {
            (
                ifd.image_width().unwrap_or(0),
                ifd.image_length().unwrap_or(0),
            )
        } else {
            (ifd.image_width()?, ifd.image_length()?)
        };

        let tile_width = ifd.tile_size_x()?;
        let tile_height = ifd.tile_size_y()?;

        let planes = ifd.separated_plane_count()?;
        let samples_per_pixel = ifd.samples_per_pixel();
        let tile_samples = ifd.samples_per_tile_pixel()?;
        let bytes_per_sample = ifd.bytes_per_sample()?;

        debug!(
            "Tile map: {}x{} pixels, {}x{} tiles of {}x{}, {} plane(s)",
            dim_x,
            dim_y,
            (dim_x + tile_width - 1) / tile_width.max(1),
            (dim_y + tile_height - 1) / tile_height.max(1),
            tile_width,
            tile_height,
            planes
        );

        Ok(TileMap {
            ifd,
            tiles: Vec::new(),
            lookup: HashMap::new(),
            tile_width,
            tile_height,
            dim_x,
            dim_y,
            planes,
            samples_per_pixel,
            tile_samples,
            bytes_per_sample,
            tiled,
            resizable,
        })
    }

    /// The directory this map belongs to
    pub fn ifd(&self) -> &Ifd {
        &self.ifd
    }

    /// Mutable access to the directory
    pub fn ifd_mut(&mut self) -> &mut Ifd {
        &mut self.ifd
    }

    /// Nominal tile width
    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    /// Nominal tile height
    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    /// Current image width
    pub fn dim_x(&self) -> u32 {
        self.dim_x
    }

    /// Current image height
    pub fn dim_y(&self) -> u32 {
        self.dim_y
    }

    /// Separated plane count
    pub fn planes(&self) -> u32 {
        self.planes
    }

    /// Samples per pixel across all planes
    pub fn samples_per_pixel(&self) -> u32 {
        self.samples_per_pixel
    }

    /// Samples per pixel stored in one tile
    pub fn tile_samples(&self) -> u32 {
        self.tile_samples
    }

    /// Bytes per sample
    pub fn bytes_per_sample(&self) -> u32 {
        self.bytes_per_sample
    }

    /// Whether the layout is true tiles (vs strips)
    pub fn is_tiled(&self) -> bool {
        self.tiled
    }

    /// Whether the grid may still grow
    pub fn is_resizable(&self) -> bool {
        self.resizable
    }

    /// Number of tile columns covering the current width
    pub fn tiles_per_row(&self) -> u32 {
        if self.dim_x == 0 {
            0
        } else {
            (self.dim_x + self.tile_width - 1) / self.tile_width
        }
    }

    /// Number of tile rows covering the current height
    pub fn tiles_per_column(&self) -> u32 {
        if self.dim_y == 0 {
            0
        } else {
            (self.dim_y + self.tile_height - 1) / self.tile_height
        }
    }

    /// Total number of grid cells: columns × rows × planes
    pub fn number_of_grid_tiles(&self) -> u64 {
        self.tiles_per_row() as u64 * self.tiles_per_column() as u64 * self.planes as u64
    }

    /// Position of a tile inside the flat offset/byte-count arrays
    pub fn linear_index(&self, index: TileIndex) -> u64 {
        index.linear_index(self.tiles_per_row(), self.tiles_per_column())
    }

    /// Validates a tile index against the current grid
    pub fn validate_index(&self, index: TileIndex) -> TiffResult<()> {
        let cols = self.tiles_per_row();
        let rows = self.tiles_per_column();
        if index.plane >= self.planes || index.col >= cols || index.row >= rows {
            return Err(TiffError::TileIndexOutOfBounds {
                plane: index.plane,
                col: index.col,
                row: index.row,
                planes: self.planes,
                cols,
                rows,
            });
        }
        Ok(())
    }

    /// Size in bytes of the decoded buffer for one tile
    pub fn tile_buffer_size(&self, tile: &TiffTile) -> usize {
        tile.width() as usize
            * tile.height() as usize
            * self.tile_samples as usize
            * self.bytes_per_sample as usize
    }

    /// Effective height of a tile in the given grid row
    ///
    /// Only the bottom strip of a stripped image is truncated; truly
    /// tiled images keep nominal dimensions everywhere, matching what
    /// libtiff-style readers require.
    pub fn effective_tile_height(&self, row: u32) -> u32 {
        if !self.tiled && self.dim_y > 0 && row == self.tiles_per_column().saturating_sub(1) {
            let remaining = self.dim_y - row * self.tile_height;
            remaining.min(self.tile_height)
        } else {
            self.tile_height
        }
    }

    /// Looks up a tile if it was ever created
    pub fn get(&self, index: TileIndex) -> Option<&TiffTile> {
        self.lookup.get(&index).map(|&i| &self.tiles[i])
    }

    /// Looks up a tile mutably if it was ever created
    pub fn get_mut(&mut self, index: TileIndex) -> Option<&mut TiffTile> {
        match self.lookup.get(&index) {
            Some(&i) => Some(&mut self.tiles[i]),
            None => None,
        }
    }

    /// Gets a tile, creating an empty one on demand
    ///
    /// Non-resizable maps reject indices outside the grid; resizable maps
    /// accept any column/row and leave dimension growth to
    /// [`TileMap::expand_to`].
    pub fn get_or_new(&mut self, index: TileIndex) -> TiffResult<&mut TiffTile> {
        if index.plane >= self.planes {
            return Err(TiffError::TileIndexOutOfBounds {
                plane: index.plane,
                col: index.col,
                row: index.row,
                planes: self.planes,
                cols: self.tiles_per_row(),
                rows: self.tiles_per_column(),
            });
        }
        if !self.resizable {
            self.validate_index(index)?;
        }
        if let Some(&position) = self.lookup.get(&index) {
            return Ok(&mut self.tiles[position]);
        }
        let height = self.effective_tile_height(index.row);
        let tile = TiffTile::new(index, self.tile_width, height);
        let position = self.tiles.len();
        self.tiles.push(tile);
        self.lookup.insert(index, position);
        Ok(&mut self.tiles[position])
    }

    /// Expands the image dimensions to cover the given pixel extent
    pub fn expand_to(&mut self, x_end: u32, y_end: u32) -> TiffResult<()> {
        if !self.resizable {
            return Err(TiffError::GenericError(
                "tile map is not resizable".to_string(),
            ));
        }
        if x_end > self.dim_x {
            self.dim_x = x_end;
        }
        if y_end > self.dim_y {
            self.dim_y = y_end;
        }
        Ok(())
    }

    /// Settles the final grid dimensions of a resizable map
    ///
    /// The dimensions are the exact union of everything updated so far;
    /// the tile grid covering them is rounded up by construction.
    pub fn complete_image_grid(&mut self) -> (u32, u32) {
        debug!(
            "Final grid: {}x{} pixels, {}x{} tiles",
            self.dim_x,
            self.dim_y,
            self.tiles_per_row(),
            self.tiles_per_column()
        );
        (self.dim_x, self.dim_y)
    }

    /// Fixes the last-row tile heights of a stripped image
    pub fn crop_all(&mut self, truncate_edges: bool) {
        if !truncate_edges || self.tiled || self.dim_y == 0 {
            return;
        }
        let last_row = self.tiles_per_column().saturating_sub(1);
        let height = self.effective_tile_height(last_row);
        for tile in &mut self.tiles {
            if tile.index().row == last_row {
                tile.crop_height(height);
            }
        }
    }

    /// All grid cells in flush order: plane-major, then row, then column
    pub fn grid_indices(&self) -> Vec<TileIndex> {
        let cols = self.tiles_per_row();
        let rows = self.tiles_per_column();
        let mut indices =
            Vec::with_capacity(self.planes as usize * rows as usize * cols as usize);
        for plane in 0..self.planes {
            for row in 0..rows {
                for col in 0..cols {
                    indices.push(TileIndex::new(plane, col, row));
                }
            }
        }
        indices
    }

    /// All tiles created so far, in creation order
    pub fn tiles(&self) -> &[TiffTile] {
        &self.tiles
    }

    /// All tiles created so far, mutably
    pub fn tiles_mut(&mut self) -> &mut [TiffTile] {
        &mut self.tiles
    }
}
