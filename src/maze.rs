use std::collections::VecDeque;

use crate::constants::{LEVEL_SEED_STRIDE, MIN_MAZE_HEIGHT, MIN_MAZE_WIDTH, TILE_SIZE};
use crate::grid::{Collectible, DenLayout, Grid, Tile};
use crate::rng::Rng;
use crate::types::{CellPos, Direction};

const PORTAL_DEPTH: i32 = 3;
const CENTER_BREAK_CHANCE: f32 = 0.7;
const DEN_PILLAR_CHANCE: f32 = 0.3;
const SECOND_PORTAL_CHANCE: f32 = 0.4;
const QUADRANT_WINDOW: i32 = 5;

pub fn level_seed(level: u32, offset: u32) -> u32 {
    level.wrapping_mul(LEVEL_SEED_STRIDE).wrapping_add(offset)
}

/// Draws a level seed offset in `0..LEVEL_SEED_STRIDE`.
pub fn random_seed_offset(rng: &mut Rng) -> u32 {
    rng.next_u32() % LEVEL_SEED_STRIDE
}

/// Generates a bordered, left/right symmetric maze with a ghost den, points,
/// power-pellets and portals. The result always forms one connected region.
pub fn generate_maze(block_width: i32, block_height: i32, level: u32, seed_offset: u32) -> Grid {
    let (width, height) = maze_dimensions(block_width, block_height);
    let seed = level_seed(level, seed_offset);
    let mut rng = Rng::new(seed);
    let mut layout = Layout::new(width, height);

    carve_symmetric_walls(&mut layout, level, &mut rng);
    let den = build_den(&mut layout, level, &mut rng);
    let portal_rows = carve_portals(&mut layout, level, &den, &mut rng);
    layout.fill_points();
    place_power_pellets(&mut layout, level, &mut rng);
    let repairs = ensure_connected(&mut layout, &den, &mut rng);

    log::debug!(
        "maze generated: level={level} seed={seed} size={width}x{height} portals={portal_rows:?} repairs={repairs}"
    );

    Grid::from_layers(
        width,
        height,
        TILE_SIZE,
        layout.tiles,
        layout.collectibles,
        Some(den),
        portal_rows,
    )
}

fn maze_dimensions(block_width: i32, block_height: i32) -> (i32, i32) {
    let width = MIN_MAZE_WIDTH.max(block_width * 4 + 1);
    let height = MIN_MAZE_HEIGHT.max(block_height * 4 + 1);
    let width = if width % 2 == 1 { width } else { width + 1 };
    let height = if height % 2 == 0 { height } else { height + 1 };
    (width, height)
}

struct Layout {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    collectibles: Vec<Collectible>,
    /// Portal cells, which never hold a collectible.
    reserved: Vec<bool>,
}

impl Layout {
    fn new(width: i32, height: i32) -> Self {
        let mut tiles = vec![Tile::Corridor; (width * height) as usize];
        for y in 0..height {
            for x in 0..width {
                if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
                    tiles[(y * width + x) as usize] = Tile::Wall;
                }
            }
        }
        Self {
            width,
            height,
            tiles,
            collectibles: vec![Collectible::Empty; (width * height) as usize],
            reserved: vec![false; (width * height) as usize],
        }
    }

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    fn tile(&self, x: i32, y: i32) -> Tile {
        if !self.in_bounds(x, y) {
            return Tile::Wall;
        }
        self.tiles[(y * self.width + x) as usize]
    }

    fn set_tile(&mut self, x: i32, y: i32, tile: Tile) {
        if self.in_bounds(x, y) {
            self.tiles[(y * self.width + x) as usize] = tile;
        }
    }

    fn collectible(&self, x: i32, y: i32) -> Collectible {
        if !self.in_bounds(x, y) {
            return Collectible::Empty;
        }
        self.collectibles[(y * self.width + x) as usize]
    }

    fn set_collectible(&mut self, x: i32, y: i32, item: Collectible) {
        if self.in_bounds(x, y) {
            self.collectibles[(y * self.width + x) as usize] = item;
        }
    }

    fn reserve(&mut self, x: i32, y: i32) {
        if self.in_bounds(x, y) {
            self.reserved[(y * self.width + x) as usize] = true;
        }
    }

    fn is_reserved(&self, x: i32, y: i32) -> bool {
        self.in_bounds(x, y) && self.reserved[(y * self.width + x) as usize]
    }

    fn fill_points(&mut self) {
        for idx in 0..self.tiles.len() {
            if self.tiles[idx] == Tile::Corridor && !self.reserved[idx] {
                self.collectibles[idx] = Collectible::Point;
            }
        }
    }

    fn is_border(&self, x: i32, y: i32) -> bool {
        x == 0 || y == 0 || x == self.width - 1 || y == self.height - 1
    }
}

/// Pillars on the left half, mirrored onto the right, then center-column breaks.
fn carve_symmetric_walls(layout: &mut Layout, level: u32, rng: &mut Rng) {
    let (width, height) = (layout.width, layout.height);
    let half = width / 2;
    let extensions = 1 + level / 5;

    for y in (2..height - 2).step_by(2) {
        for x in (2..half).step_by(2) {
            let from_center = (y - height / 2).abs() as f32;
            let chance = 0.7 + (from_center / height as f32) * 0.2;
            if !rng.bool(chance) {
                continue;
            }
            layout.set_tile(x, y, Tile::Wall);

            for _ in 0..extensions {
                let dir = rng.pick(&Direction::ALL).copied().unwrap_or(Direction::Up);
                let length = rng.int(1, 2);
                for step in 1..=length {
                    let (ex, ey) = match dir {
                        Direction::Up if y - step > 2 => (x, y - step),
                        Direction::Down if y + step < height - 3 => (x, y + step),
                        Direction::Left if x - step > 2 => (x - step, y),
                        Direction::Right if x + step < half - 1 => (x + step, y),
                        _ => continue,
                    };
                    layout.set_tile(ex, ey, Tile::Wall);
                }
            }
        }
    }

    for y in 0..height {
        for x in 1..half {
            let tile = layout.tile(x, y);
            layout.set_tile(width - 1 - x, y, tile);
        }
    }

    let center_x = width / 2;
    for y in (2..height - 2).step_by(4) {
        if !rng.bool(CENTER_BREAK_CHANCE) {
            continue;
        }
        layout.set_tile(center_x, y, Tile::Corridor);
        if y > 2 && y < height - 3 {
            layout.set_tile(center_x, y - 1, Tile::Corridor);
            layout.set_tile(center_x, y + 1, Tile::Corridor);
        }
    }
}

fn build_den(layout: &mut Layout, level: u32, rng: &mut Rng) -> DenLayout {
    let (width, height) = (layout.width, layout.height);
    let center_x = width / 2;
    let center_y = height / 2 - height / 10;

    let base_width = 7.min(width / 3);
    let base_height = 5.min(height / 5);
    let mut den_width = base_width + rng.int(-1, 1) * 2;
    let mut den_height = base_height + rng.int(-1, 1);
    if den_width % 2 == 0 {
        den_width += 1;
    }
    if den_height % 2 == 0 {
        den_height += 1;
    }

    let left = center_x - den_width / 2;
    let top = center_y - den_height / 2;
    let right = left + den_width - 1;
    let bottom = top + den_height - 1;

    for y in top..=bottom {
        for x in left..=right {
            let perimeter = y == top || y == bottom || x == left || x == right;
            layout.set_tile(x, y, if perimeter { Tile::Wall } else { Tile::GhostDen });
        }
    }

    layout.set_tile(center_x, top, Tile::Corridor);
    layout.set_tile(center_x, top - 1, Tile::Corridor);

    if level >= 2 && rng.bool(DEN_PILLAR_CHANCE) {
        let pillar_x = center_x + rng.pick(&[-1, 1]).copied().unwrap_or(1);
        let pillar_y = center_y + rng.pick(&[-1, 0, 1]).copied().unwrap_or(0);
        if left < pillar_x && pillar_x < right && top < pillar_y && pillar_y < bottom {
            layout.set_tile(pillar_x, pillar_y, Tile::Wall);
        }
    }

    DenLayout {
        left,
        top,
        right,
        bottom,
        door: CellPos::new(center_x, top),
        home: CellPos::new(center_x, center_y),
    }
}

fn place_power_pellets(layout: &mut Layout, level: u32, rng: &mut Rng) {
    let (width, height) = (layout.width, layout.height);
    let corners = [
        (2, 2),
        (width - 3, 2),
        (2, height - 3),
        (width - 3, height - 3),
    ];

    for &(x, y) in &corners {
        if layout.tile(x, y) == Tile::Corridor {
            layout.set_collectible(x, y, Collectible::PowerPellet);
            continue;
        }
        let nearby = (-2..=2)
            .flat_map(|dy| (-2..=2).map(move |dx| (x + dx, y + dy)))
            .find(|&(nx, ny)| layout.tile(nx, ny) == Tile::Corridor && !layout.is_reserved(nx, ny));
        if let Some((nx, ny)) = nearby {
            layout.set_collectible(nx, ny, Collectible::PowerPellet);
        }
    }

    let extras = 4.min(level / 3) as usize;
    if extras == 0 {
        return;
    }

    let quadrants = [
        (width / 4, height / 4),
        (width - width / 4, height / 4),
        (width / 4, height - height / 4),
        (width - width / 4, height - height / 4),
    ];
    let mut pools: Vec<Vec<(i32, i32)>> = quadrants
        .iter()
        .map(|&(qx, qy)| {
            let mut pool: Vec<(i32, i32)> = (-QUADRANT_WINDOW..=QUADRANT_WINDOW)
                .flat_map(|dy| (-QUADRANT_WINDOW..=QUADRANT_WINDOW).map(move |dx| (qx + dx, qy + dy)))
                .filter(|&(x, y)| {
                    layout.tile(x, y) == Tile::Corridor
                        && !layout.is_reserved(x, y)
                        && !corners.contains(&(x, y))
                })
                .collect();
            rng.shuffle(&mut pool);
            pool
        })
        .collect();

    let mut placed = 0;
    let mut turn = 0;
    while placed < extras && pools.iter().any(|pool| !pool.is_empty()) {
        let len = pools.len();
        let pool = &mut pools[turn % len];
        turn += 1;
        let Some((x, y)) = pool.pop() else {
            continue;
        };
        if layout.collectible(x, y) == Collectible::PowerPellet {
            continue;
        }
        layout.set_collectible(x, y, Collectible::PowerPellet);
        placed += 1;
    }
}

fn carve_portals(layout: &mut Layout, level: u32, den: &DenLayout, rng: &mut Rng) -> Vec<i32> {
    let height = layout.height;
    let spread = (height / 6).max(1);
    let level = level as i32;
    let shift = (rng.int(-spread, spread) * level)
        .div_euclid(10)
        .rem_euclid(spread);
    let first = (height / 2 + shift) % (height - 4) + 2;
    carve_portal_row(layout, first, den);
    let mut rows = vec![first];

    if level > 5 && rng.bool(SECOND_PORTAL_CHANCE) {
        let second = (first + height / 2) % (height - 4) + 2;
        if (second - first).abs() > height / 4 {
            carve_portal_row(layout, second, den);
            rows.push(second);
        }
    }
    rows
}

fn carve_portal_row(layout: &mut Layout, row: i32, den: &DenLayout) {
    let width = layout.width;
    let center_x = width / 2;
    let open = |layout: &mut Layout, x: i32| {
        layout.set_tile(x, row, Tile::Corridor);
        layout.reserve(x, row);
    };

    for x in 0..PORTAL_DEPTH {
        open(layout, x);
        open(layout, width - 1 - x);
    }

    // Tunnel inward until the portal meets the maze.
    let mut x = PORTAL_DEPTH;
    while x < center_x && layout.tile(x, row) == Tile::Wall && !den.is_perimeter(x, row) {
        open(layout, x);
        open(layout, width - 1 - x);
        x += 1;
    }
}

/// Labels every non-wall cell with a region id. Walls stay `-1`.
fn label_regions(layout: &Layout) -> (Vec<i32>, i32) {
    let (width, height) = (layout.width, layout.height);
    let mut labels = vec![-1; (width * height) as usize];
    let mut count = 0;

    for y in 0..height {
        for x in 0..width {
            let idx = (y * width + x) as usize;
            if layout.tile(x, y) == Tile::Wall || labels[idx] != -1 {
                continue;
            }
            labels[idx] = count;
            let mut queue = VecDeque::new();
            queue.push_back((x, y));
            while let Some((cx, cy)) = queue.pop_front() {
                for (nx, ny) in [(cx - 1, cy), (cx + 1, cy), (cx, cy - 1), (cx, cy + 1)] {
                    if !layout.in_bounds(nx, ny) || layout.tile(nx, ny) == Tile::Wall {
                        continue;
                    }
                    let nidx = (ny * width + nx) as usize;
                    if labels[nidx] == -1 {
                        labels[nidx] = count;
                        queue.push_back((nx, ny));
                    }
                }
            }
            count += 1;
        }
    }
    (labels, count)
}

fn is_openable(layout: &Layout, den: &DenLayout, x: i32, y: i32) -> bool {
    layout.in_bounds(x, y)
        && layout.tile(x, y) == Tile::Wall
        && !layout.is_border(x, y)
        && !den.is_perimeter(x, y)
}

/// Opens walls until one region remains. Returns the number of walls opened.
fn ensure_connected(layout: &mut Layout, den: &DenLayout, rng: &mut Rng) -> usize {
    let mut opened = 0;
    let max_rounds = (layout.width * layout.height) as usize;

    for _ in 0..max_rounds {
        let (labels, count) = label_regions(layout);
        if count <= 1 {
            break;
        }

        let mut picks = single_wall_bridges(layout, den, &labels, count, rng);
        if picks.is_empty() {
            match shortest_tunnel(layout, den, &labels, 1) {
                Some(path) => picks = path,
                None => {
                    log::warn!("maze repair found no tunnel; {count} regions remain");
                    break;
                }
            }
        }

        for (x, y) in picks {
            if layout.tile(x, y) == Tile::Wall {
                let tile = if den.contains(x, y) { Tile::GhostDen } else { Tile::Corridor };
                layout.set_tile(x, y, tile);
                opened += 1;
            }
        }
    }
    opened
}

/// One random wall per secondary region whose far side belongs to another region.
fn single_wall_bridges(
    layout: &Layout,
    den: &DenLayout,
    labels: &[i32],
    count: i32,
    rng: &mut Rng,
) -> Vec<(i32, i32)> {
    let label_at = |x: i32, y: i32| {
        if layout.in_bounds(x, y) {
            labels[(y * layout.width + x) as usize]
        } else {
            -1
        }
    };

    let mut picks = Vec::new();
    for area in 1..count {
        let mut candidates = Vec::new();
        for y in 0..layout.height {
            for x in 0..layout.width {
                if label_at(x, y) != area {
                    continue;
                }
                for dir in Direction::ALL {
                    let (dx, dy) = dir.delta();
                    let (wx, wy) = (x + dx, y + dy);
                    let beyond = label_at(wx + dx, wy + dy);
                    if is_openable(layout, den, wx, wy) && beyond != -1 && beyond != area {
                        candidates.push((wx, wy));
                    }
                }
            }
        }
        if let Some(&pick) = rng.pick(&candidates) {
            picks.push(pick);
        }
    }
    picks
}

/// Breadth-first search from every cell of `area` through openable walls to
/// the nearest cell of any other region. Returns the walls on that path.
fn shortest_tunnel(
    layout: &Layout,
    den: &DenLayout,
    labels: &[i32],
    area: i32,
) -> Option<Vec<(i32, i32)>> {
    let width = layout.width;
    let mut parent: Vec<Option<usize>> = vec![None; labels.len()];
    let mut visited = vec![false; labels.len()];
    let mut queue = VecDeque::new();

    for (idx, label) in labels.iter().enumerate() {
        if *label == area {
            visited[idx] = true;
            queue.push_back(idx);
        }
    }

    while let Some(idx) = queue.pop_front() {
        let (x, y) = (idx as i32 % width, idx as i32 / width);
        for (nx, ny) in [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)] {
            if !layout.in_bounds(nx, ny) {
                continue;
            }
            let nidx = (ny * width + nx) as usize;
            if visited[nidx] {
                continue;
            }
            let label = labels[nidx];
            if label != -1 && label != area {
                let mut path = Vec::new();
                let mut cursor = Some(idx);
                while let Some(step) = cursor {
                    if labels[step] == area {
                        break;
                    }
                    path.push((step as i32 % width, step as i32 / width));
                    cursor = parent[step];
                }
                return Some(path);
            }
            if label == -1 && is_openable(layout, den, nx, ny) {
                visited[nidx] = true;
                parent[nidx] = Some(idx);
                queue.push_back(nidx);
            }
        }
    }
    None
}
