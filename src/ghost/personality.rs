use std::fmt::Debug;

use crate::constants::{
    AMBUSH_LOOKAHEAD, ERRATIC_CORNER_PERIOD_TICKS, ERRATIC_RETREAT_DISTANCE, WANDER_LOOKAHEAD,
};
use crate::grid::Grid;
use crate::rng::Rng;
use crate::types::{CellPos, Direction, Personality};

const AMBUSHER_SECOND_CHOICE: f32 = 0.15;
const WANDERER_TOP_TWO: f32 = 0.5;
const ERRATIC_ANY_CHOICE: f32 = 0.7;

/// What a personality contributes to a Normal ghost's decision.
#[derive(Clone, Copy, Debug)]
pub struct TargetInput {
    pub ghost: CellPos,
    pub player: CellPos,
    pub player_heading: Direction,
    pub total_ticks: u64,
}

pub trait GhostStrategy: Debug + Sync {
    fn personality(&self) -> Personality;

    fn scatter_target(&self, grid: &Grid) -> CellPos;

    fn chase_target(&self, input: &TargetInput, grid: &Grid) -> CellPos;

    /// Probability that distances get multiplied by random noise.
    fn noise_chance(&self) -> f32;

    /// `ranked` is sorted best first and never empty.
    fn pick(&self, ranked: &[(Direction, f32)], rng: &mut Rng) -> Direction;
}

pub fn strategy_for(personality: Personality) -> &'static dyn GhostStrategy {
    match personality {
        Personality::Chaser => &Chaser,
        Personality::Ambusher => &Ambusher,
        Personality::Wanderer => &Wanderer,
        Personality::Erratic => &Erratic,
    }
}

fn clamp_to_grid(col: i32, row: i32, grid: &Grid) -> CellPos {
    CellPos::new(
        col.clamp(0, grid.width() - 1),
        row.clamp(0, grid.height() - 1),
    )
}

fn ahead_of(input: &TargetInput, cells: i32) -> (i32, i32) {
    let (dx, dy) = input.player_heading.delta();
    (input.player.col + dx * cells, input.player.row + dy * cells)
}

#[derive(Debug)]
struct Chaser;

impl GhostStrategy for Chaser {
    fn personality(&self) -> Personality {
        Personality::Chaser
    }

    fn scatter_target(&self, _grid: &Grid) -> CellPos {
        CellPos::new(1, 1)
    }

    fn chase_target(&self, input: &TargetInput, _grid: &Grid) -> CellPos {
        input.player
    }

    fn noise_chance(&self) -> f32 {
        0.05
    }

    fn pick(&self, ranked: &[(Direction, f32)], _rng: &mut Rng) -> Direction {
        ranked[0].0
    }
}

#[derive(Debug)]
struct Ambusher;

impl GhostStrategy for Ambusher {
    fn personality(&self) -> Personality {
        Personality::Ambusher
    }

    fn scatter_target(&self, grid: &Grid) -> CellPos {
        CellPos::new(grid.width() - 2, 1)
    }

    fn chase_target(&self, input: &TargetInput, grid: &Grid) -> CellPos {
        let (mut col, row) = ahead_of(input, AMBUSH_LOOKAHEAD);
        // Looking up also shifts the target left, like the arcade original.
        if input.player_heading == Direction::Up {
            col -= AMBUSH_LOOKAHEAD;
        }
        clamp_to_grid(col, row, grid)
    }

    fn noise_chance(&self) -> f32 {
        0.1
    }

    fn pick(&self, ranked: &[(Direction, f32)], rng: &mut Rng) -> Direction {
        if ranked.len() > 1 && rng.bool(AMBUSHER_SECOND_CHOICE) {
            return ranked[1].0;
        }
        ranked[0].0
    }
}

#[derive(Debug)]
struct Wanderer;

impl GhostStrategy for Wanderer {
    fn personality(&self) -> Personality {
        Personality::Wanderer
    }

    fn scatter_target(&self, grid: &Grid) -> CellPos {
        CellPos::new(1, grid.height() - 2)
    }

    /// Reflects the point ahead of the player through the ghost's own cell.
    fn chase_target(&self, input: &TargetInput, grid: &Grid) -> CellPos {
        let (ahead_col, ahead_row) = ahead_of(input, WANDER_LOOKAHEAD);
        let col = ahead_col + (ahead_col - input.ghost.col);
        let row = ahead_row + (ahead_row - input.ghost.row);
        clamp_to_grid(col, row, grid)
    }

    fn noise_chance(&self) -> f32 {
        0.2
    }

    fn pick(&self, ranked: &[(Direction, f32)], rng: &mut Rng) -> Direction {
        if ranked.len() > 1 && rng.bool(WANDERER_TOP_TWO) {
            return ranked[rng.pick_index(2)].0;
        }
        ranked[0].0
    }
}

#[derive(Debug)]
struct Erratic;

impl GhostStrategy for Erratic {
    fn personality(&self) -> Personality {
        Personality::Erratic
    }

    fn scatter_target(&self, grid: &Grid) -> CellPos {
        CellPos::new(grid.width() - 2, grid.height() - 2)
    }

    /// Chases from afar, retreats to a bottom corner up close.
    fn chase_target(&self, input: &TargetInput, grid: &Grid) -> CellPos {
        if input.ghost.distance(input.player) > ERRATIC_RETREAT_DISTANCE {
            return input.player;
        }
        if (input.total_ticks / ERRATIC_CORNER_PERIOD_TICKS) % 2 == 0 {
            CellPos::new(1, grid.height() - 2)
        } else {
            CellPos::new(grid.width() - 2, grid.height() - 2)
        }
    }

    fn noise_chance(&self) -> f32 {
        0.4
    }

    fn pick(&self, ranked: &[(Direction, f32)], rng: &mut Rng) -> Direction {
        if ranked.len() > 1 && rng.bool(ERRATIC_ANY_CHOICE) {
            return ranked[rng.pick_index(ranked.len())].0;
        }
        ranked[0].0
    }
}
