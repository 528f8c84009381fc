use crate::types::{CellPos, Position};

/// Merged view of both grid layers, as seen by callers and renderers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    Wall,
    Corridor,
    Point,
    PowerPellet,
    GhostDen,
}

/// Structural layer. Fixed once a level is generated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tile {
    Wall,
    Corridor,
    GhostDen,
}

/// Collectible layer. Only the arbiter mutates it, on pickup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collectible {
    Empty,
    Point,
    PowerPellet,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DenLayout {
    /// Inclusive bounds of the walled rectangle, perimeter included.
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    /// The single corridor breach in the top wall.
    pub door: CellPos,
    /// Spawn and return point for eaten ghosts.
    pub home: CellPos,
}

impl DenLayout {
    pub fn is_perimeter(&self, col: i32, row: i32) -> bool {
        let inside_box = col >= self.left && col <= self.right && row >= self.top && row <= self.bottom;
        inside_box && (col == self.left || col == self.right || row == self.top || row == self.bottom)
    }

    pub fn contains(&self, col: i32, row: i32) -> bool {
        col > self.left && col < self.right && row > self.top && row < self.bottom
    }
}

#[derive(Clone, Debug)]
pub struct Grid {
    width: i32,
    height: i32,
    tile_size: f32,
    tiles: Vec<Tile>,
    collectibles: Vec<Collectible>,
    den: Option<DenLayout>,
    portal_rows: Vec<i32>,
    remaining: usize,
}

impl Grid {
    pub(crate) fn from_layers(
        width: i32,
        height: i32,
        tile_size: f32,
        tiles: Vec<Tile>,
        collectibles: Vec<Collectible>,
        den: Option<DenLayout>,
        portal_rows: Vec<i32>,
    ) -> Self {
        let collectibles: Vec<Collectible> = tiles
            .iter()
            .zip(collectibles)
            .map(|(tile, item)| if *tile == Tile::Corridor { item } else { Collectible::Empty })
            .collect();
        let remaining = collectibles
            .iter()
            .filter(|item| **item != Collectible::Empty)
            .count();
        Self {
            width,
            height,
            tile_size,
            tiles,
            collectibles,
            den,
            portal_rows,
            remaining,
        }
    }

    /// Builds a grid from text rows using the same alphabet as `render_rows`:
    /// `#` wall, `.` point, `o` power-pellet, ` ` corridor, `=` den.
    /// Short rows are padded with walls. The den layout is inferred from the
    /// `=` cells and their top-wall breach.
    pub fn from_rows(rows: &[&str], tile_size: f32) -> Self {
        let height = rows.len() as i32;
        let width = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0) as i32;
        let mut tiles = vec![Tile::Wall; (width * height) as usize];
        let mut collectibles = vec![Collectible::Empty; (width * height) as usize];
        let mut den_cells = Vec::new();

        for (row, line) in rows.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                let idx = row * width as usize + col;
                match ch {
                    '.' => {
                        tiles[idx] = Tile::Corridor;
                        collectibles[idx] = Collectible::Point;
                    }
                    'o' => {
                        tiles[idx] = Tile::Corridor;
                        collectibles[idx] = Collectible::PowerPellet;
                    }
                    ' ' => tiles[idx] = Tile::Corridor,
                    '=' => {
                        tiles[idx] = Tile::GhostDen;
                        den_cells.push(CellPos::new(col as i32, row as i32));
                    }
                    _ => {}
                }
            }
        }

        let den = infer_den(&tiles, width, &den_cells);
        let portal_rows = (0..height)
            .filter(|row| {
                let left = tiles[(row * width) as usize];
                let right = tiles[(row * width + width - 1) as usize];
                left != Tile::Wall && right != Tile::Wall
            })
            .collect();
        Self::from_layers(width, height, tile_size, tiles, collectibles, den, portal_rows)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn pixel_width(&self) -> f32 {
        self.width as f32 * self.tile_size
    }

    pub fn pixel_height(&self) -> f32 {
        self.height as f32 * self.tile_size
    }

    pub fn in_bounds(&self, col: i32, row: i32) -> bool {
        col >= 0 && row >= 0 && col < self.width && row < self.height
    }

    fn index(&self, col: i32, row: i32) -> Option<usize> {
        if !self.in_bounds(col, row) {
            return None;
        }
        Some((row * self.width + col) as usize)
    }

    pub fn tile_at(&self, col: i32, row: i32) -> Option<Tile> {
        self.index(col, row).map(|idx| self.tiles[idx])
    }

    pub fn collectible_at(&self, col: i32, row: i32) -> Collectible {
        self.index(col, row)
            .map(|idx| self.collectibles[idx])
            .unwrap_or(Collectible::Empty)
    }

    /// `None` outside the grid: portal space.
    pub fn cell_at(&self, col: i32, row: i32) -> Option<Cell> {
        let idx = self.index(col, row)?;
        let cell = match (self.tiles[idx], self.collectibles[idx]) {
            (Tile::Wall, _) => Cell::Wall,
            (Tile::GhostDen, _) => Cell::GhostDen,
            (Tile::Corridor, Collectible::PowerPellet) => Cell::PowerPellet,
            (Tile::Corridor, Collectible::Point) => Cell::Point,
            (Tile::Corridor, Collectible::Empty) => Cell::Corridor,
        };
        Some(cell)
    }

    pub fn is_wall(&self, col: i32, row: i32) -> bool {
        self.tile_at(col, row) == Some(Tile::Wall)
    }

    /// Non-wall, or outside the grid along a portal row.
    pub fn is_open(&self, col: i32, row: i32) -> bool {
        if self.in_bounds(col, row) {
            !self.is_wall(col, row)
        } else {
            self.is_portal_row(row)
        }
    }

    pub fn is_den(&self, col: i32, row: i32) -> bool {
        self.tile_at(col, row) == Some(Tile::GhostDen)
    }

    /// Cell containing the agent's geometric center.
    pub fn to_cell(&self, position: Position) -> CellPos {
        let half = self.tile_size / 2.0;
        CellPos::new(
            ((position.x + half) / self.tile_size).floor() as i32,
            ((position.y + half) / self.tile_size).floor() as i32,
        )
    }

    /// Top-left pixel of an agent centered on `cell`.
    pub fn to_pixel(&self, cell: CellPos) -> Position {
        Position::new(
            cell.col as f32 * self.tile_size,
            cell.row as f32 * self.tile_size,
        )
    }

    pub fn den(&self) -> Option<&DenLayout> {
        self.den.as_ref()
    }

    pub fn portal_rows(&self) -> &[i32] {
        &self.portal_rows
    }

    pub fn is_portal_row(&self, row: i32) -> bool {
        self.portal_rows.contains(&row)
    }

    pub fn remaining_collectibles(&self) -> usize {
        self.remaining
    }

    pub fn take_collectible(&mut self, cell: CellPos) -> Option<Collectible> {
        let idx = self.index(cell.col, cell.row)?;
        let item = self.collectibles[idx];
        if item == Collectible::Empty {
            return None;
        }
        self.collectibles[idx] = Collectible::Empty;
        self.remaining = self.remaining.saturating_sub(1);
        Some(item)
    }

    pub fn render_rows(&self) -> Vec<String> {
        (0..self.height)
            .map(|row| {
                (0..self.width)
                    .map(|col| match self.cell_at(col, row) {
                        Some(Cell::Wall) => '#',
                        Some(Cell::Point) => '.',
                        Some(Cell::PowerPellet) => 'o',
                        Some(Cell::GhostDen) => '=',
                        Some(Cell::Corridor) | None => ' ',
                    })
                    .collect()
            })
            .collect()
    }

    /// Bottom-center start cell, searched outward when the preferred row is
    /// blocked, then the middle portal row, then any corridor.
    pub fn player_start(&self) -> CellPos {
        let preferred_row = self.height * 3 / 4;
        let center_col = self.width / 2;
        let is_corridor = |col: i32, row: i32| self.tile_at(col, row) == Some(Tile::Corridor);

        if is_corridor(center_col, preferred_row) {
            return CellPos::new(center_col, preferred_row);
        }
        for offset in 1..5 {
            if is_corridor(center_col, preferred_row - offset) {
                return CellPos::new(center_col, preferred_row - offset);
            }
            if is_corridor(center_col, preferred_row + offset) {
                return CellPos::new(center_col, preferred_row + offset);
            }
        }

        let middle = self.height / 2;
        let portal_cols = (0..3).chain((self.width - 3)..self.width);
        for col in portal_cols {
            if is_corridor(col, middle) {
                return CellPos::new(col, middle);
            }
        }

        (0..self.height)
            .flat_map(|row| (0..self.width).map(move |col| (col, row)))
            .find(|(col, row)| is_corridor(*col, *row))
            .map(|(col, row)| CellPos::new(col, row))
            .unwrap_or(CellPos::new(1, 1))
    }
}

fn infer_den(tiles: &[Tile], width: i32, den_cells: &[CellPos]) -> Option<DenLayout> {
    let left = den_cells.iter().map(|cell| cell.col).min()? - 1;
    let right = den_cells.iter().map(|cell| cell.col).max()? + 1;
    let top = den_cells.iter().map(|cell| cell.row).min()? - 1;
    let bottom = den_cells.iter().map(|cell| cell.row).max()? + 1;
    let door_col = (left + 1..right)
        .find(|col| top >= 0 && tiles[(top * width + col) as usize] == Tile::Corridor)
        .unwrap_or((left + right) / 2);
    let center = CellPos::new(door_col, top + (bottom - top) / 2);
    let home = if den_cells.contains(&center) {
        center
    } else {
        den_cells[0]
    };
    Some(DenLayout {
        left,
        top,
        right,
        bottom,
        door: CellPos::new(door_col, top),
        home,
    })
}
