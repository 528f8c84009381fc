use std::collections::VecDeque;

use crate::constants::INTERSECTION_TOLERANCE;
use crate::grid::{Grid, Tile};
use crate::types::{CellPos, Direction, GhostState, Position};

/// Who is asking to move. Den access depends on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Agent {
    Player,
    Ghost(GhostState),
}

/// Cell-level movement rule shared by every agent. Off-grid cells are open
/// only along a portal row.
pub fn can_enter(agent: Agent, current: CellPos, target: CellPos, grid: &Grid) -> bool {
    match grid.tile_at(target.col, target.row) {
        None => grid.is_portal_row(target.row),
        Some(Tile::Wall) => false,
        Some(Tile::Corridor) => true,
        Some(Tile::GhostDen) => match agent {
            Agent::Player => false,
            Agent::Ghost(state) => {
                state == GhostState::Eaten || grid.is_den(current.col, current.row)
            }
        },
    }
}

/// Player rule applied to the corners of a hitbox inset by a quarter tile,
/// with the player's top-left at `target`. Off-grid corners are open only
/// beside a portal row.
pub fn player_can_enter(target: Position, grid: &Grid) -> bool {
    let tile = grid.tile_size();
    let margin = (tile / 4.0).floor();
    let span = tile - 2.0 * margin;
    let corners = [
        (target.x + margin, target.y + margin),
        (target.x + margin + span, target.y + margin),
        (target.x + margin, target.y + margin + span),
        (target.x + margin + span, target.y + margin + span),
    ];
    corners.iter().all(|&(px, py)| {
        let col = (px / tile).floor() as i32;
        let row = (py / tile).floor() as i32;
        match grid.tile_at(col, row) {
            Some(tile) => tile == Tile::Corridor,
            None => grid.is_portal_row(row),
        }
    })
}

/// Signed distance from the lane center on the axis perpendicular to `direction`.
pub fn lane_offset(position: Position, direction: Direction, grid: &Grid) -> f32 {
    let center = grid.to_pixel(grid.to_cell(position));
    if direction.is_horizontal() {
        position.y - center.y
    } else {
        position.x - center.x
    }
}

/// Nudges the perpendicular axis toward the lane center while within `band`.
/// Never blocks movement.
pub fn center_toward_lane(
    position: Position,
    direction: Direction,
    grid: &Grid,
    band: f32,
    max_step: f32,
) -> Position {
    let offset = lane_offset(position, direction, grid);
    if offset == 0.0 || offset.abs() >= band {
        return position;
    }
    let adjust = max_step.min(offset.abs()) * offset.signum();
    if direction.is_horizontal() {
        Position::new(position.x, position.y - adjust)
    } else {
        Position::new(position.x - adjust, position.y)
    }
}

/// Leaving one edge re-enters from the opposite edge.
pub fn wrap_portal(position: Position, grid: &Grid, speed: f32) -> Position {
    let tile = grid.tile_size();
    let mut out = position;
    if out.x < -tile {
        out.x = grid.pixel_width() - speed;
    } else if out.x >= grid.pixel_width() {
        out.x = 0.0;
    }
    if out.y < -tile {
        out.y = grid.pixel_height() - speed;
    } else if out.y >= grid.pixel_height() {
        out.y = 0.0;
    }
    out
}

pub fn is_centered(position: Position, grid: &Grid, tolerance: f32) -> bool {
    let center = grid.to_pixel(grid.to_cell(position));
    (position.x - center.x).abs() <= tolerance && (position.y - center.y).abs() <= tolerance
}

/// Directions whose neighbor cell is not a wall. Portal space counts as open.
pub fn open_directions(cell: CellPos, grid: &Grid) -> Vec<Direction> {
    Direction::ALL
        .into_iter()
        .filter(|dir| {
            let next = cell.offset(*dir);
            grid.is_open(next.col, next.row)
        })
        .collect()
}

/// A junction or an L-bend, and the agent is close enough to its center to turn.
pub fn is_intersection(position: Position, grid: &Grid) -> bool {
    if !is_centered(position, grid, INTERSECTION_TOLERANCE) {
        return false;
    }
    let open = open_directions(grid.to_cell(position), grid);
    match open.as_slice() {
        [a, b] => a.opposite() != *b,
        dirs => dirs.len() > 2,
    }
}

/// First direction of a shortest in-bounds path from `from` to `goal` under
/// the agent's movement rule. `None` when already there or unreachable.
pub fn path_step(agent: Agent, from: CellPos, goal: CellPos, grid: &Grid) -> Option<Direction> {
    if from == goal || !grid.in_bounds(goal.col, goal.row) {
        return None;
    }
    path_step_where(agent, from, grid, |cell| cell == goal)
}

/// Like `path_step`, toward the nearest cell (other than `from`) accepted by `is_goal`.
pub fn path_step_where(
    agent: Agent,
    from: CellPos,
    grid: &Grid,
    is_goal: impl Fn(CellPos) -> bool,
) -> Option<Direction> {
    if !grid.in_bounds(from.col, from.row) {
        return None;
    }
    let width = grid.width();
    let index = |cell: CellPos| (cell.row * width + cell.col) as usize;
    let mut first_step: Vec<Option<Direction>> = vec![None; (width * grid.height()) as usize];
    let mut visited = vec![false; first_step.len()];
    let mut queue = VecDeque::new();
    visited[index(from)] = true;
    queue.push_back(from);

    while let Some(cell) = queue.pop_front() {
        for dir in Direction::ALL {
            let next = cell.offset(dir);
            if !grid.in_bounds(next.col, next.row) || visited[index(next)] {
                continue;
            }
            if !can_enter(agent, cell, next, grid) {
                continue;
            }
            visited[index(next)] = true;
            first_step[index(next)] = if cell == from { Some(dir) } else { first_step[index(cell)] };
            if is_goal(next) {
                return first_step[index(next)];
            }
            queue.push_back(next);
        }
    }
    None
}
