use crate::ghost::Ghost;
use crate::grid::{Collectible, Grid};
use crate::mover::{can_enter, path_step_where, Agent};
use crate::player::Player;
use crate::rng::Rng;
use crate::types::{CellPos, Direction, GhostState};

/// Manhattan cells at which a Normal ghost turns the autopilot into escape mode.
const DANGER_CELLS: i32 = 4;

/// Headless input source: heads for the nearest collectible and runs from
/// Normal ghosts that get close.
#[derive(Clone, Debug)]
pub struct Autopilot {
    rng: Rng,
}

impl Autopilot {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: Rng::new(seed),
        }
    }

    pub fn choose(&mut self, player: &Player, ghosts: &[Ghost], grid: &Grid) -> Direction {
        let cell = player.cell(grid);
        if !grid.in_bounds(cell.col, cell.row) {
            return player.direction();
        }

        let threats: Vec<CellPos> = ghosts
            .iter()
            .filter(|ghost| ghost.state() == GhostState::Normal)
            .map(|ghost| ghost.cell(grid))
            .filter(|ghost_cell| manhattan(cell, *ghost_cell) <= DANGER_CELLS)
            .collect();
        if !threats.is_empty() {
            if let Some(dir) = self.escape_direction(cell, &threats, grid) {
                return dir;
            }
        }

        if let Some(dir) = step_toward_collectible(cell, grid) {
            return dir;
        }
        let open = open_moves(cell, grid);
        match self.rng.pick(&open) {
            Some(dir) => *dir,
            None => player.direction(),
        }
    }

    fn escape_direction(
        &mut self,
        cell: CellPos,
        threats: &[CellPos],
        grid: &Grid,
    ) -> Option<Direction> {
        let mut best: Option<(Direction, f32)> = None;
        for dir in open_moves(cell, grid) {
            let next = cell.offset(dir);
            let nearest = threats
                .iter()
                .map(|threat| manhattan(next, *threat))
                .min()
                .unwrap_or(i32::MAX);
            let score = nearest as f32 + self.rng.next_f32() * 0.4;
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((dir, score));
            }
        }
        best.map(|(dir, _)| dir)
    }
}

fn manhattan(a: CellPos, b: CellPos) -> i32 {
    (a.col - b.col).abs() + (a.row - b.row).abs()
}

fn open_moves(cell: CellPos, grid: &Grid) -> Vec<Direction> {
    Direction::ALL
        .into_iter()
        .filter(|dir| can_enter(Agent::Player, cell, cell.offset(*dir), grid))
        .collect()
}

fn step_toward_collectible(from: CellPos, grid: &Grid) -> Option<Direction> {
    path_step_where(Agent::Player, from, grid, |cell| {
        grid.collectible_at(cell.col, cell.row) != Collectible::Empty
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TILE_SIZE;
    use crate::ghost::ModeSchedule;
    use crate::types::Personality;

    fn grid() -> Grid {
        Grid::from_rows(
            &[
                "#########",
                "#   .   #",
                "# ##### #",
                "#       #",
                "#########",
            ],
            TILE_SIZE,
        )
    }

    #[test]
    fn heads_for_the_nearest_collectible() {
        let grid = grid();
        let player = Player::new(CellPos::new(1, 1), &grid);
        let mut autopilot = Autopilot::new(1);
        assert_eq!(autopilot.choose(&player, &[], &grid), Direction::Right);

        let player = Player::new(CellPos::new(6, 1), &grid);
        assert_eq!(autopilot.choose(&player, &[], &grid), Direction::Left);
    }

    #[test]
    fn runs_from_nearby_normal_ghosts() {
        let grid = grid();
        let player = Player::new(CellPos::new(2, 1), &grid);
        let mut ghost = Ghost::new(
            "g0",
            Personality::Chaser,
            CellPos::new(3, 1),
            &grid,
            ModeSchedule::default(),
        );
        let mut autopilot = Autopilot::new(2);
        for _ in 0..20 {
            assert_eq!(
                autopilot.choose(&player, std::slice::from_ref(&ghost), &grid),
                Direction::Left
            );
        }

        ghost.make_vulnerable(100);
        assert_eq!(
            autopilot.choose(&player, std::slice::from_ref(&ghost), &grid),
            Direction::Right
        );
    }

    #[test]
    fn wanders_when_nothing_is_left() {
        let grid = Grid::from_rows(&["#####", "#   #", "#####"], TILE_SIZE);
        let player = Player::new(CellPos::new(2, 1), &grid);
        let mut autopilot = Autopilot::new(3);
        for _ in 0..20 {
            let dir = autopilot.choose(&player, &[], &grid);
            assert!(dir.is_horizontal());
        }
    }
}
