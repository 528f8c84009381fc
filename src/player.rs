use crate::constants::PLAYER_SPEED;
use crate::grid::Grid;
use crate::mover::{center_toward_lane, player_can_enter, wrap_portal};
use crate::types::{CellPos, Direction, PlayerView, Position};

const ANIM_FRAMES: u8 = 3;

#[derive(Clone, Debug)]
pub struct Player {
    position: Position,
    start: Position,
    direction: Direction,
    desired: Direction,
    speed: f32,
    anim_phase: u8,
}

impl Player {
    pub fn new(start: CellPos, grid: &Grid) -> Self {
        let start = grid.to_pixel(start);
        Self {
            position: start,
            start,
            direction: Direction::Right,
            desired: Direction::Right,
            speed: PLAYER_SPEED,
            anim_phase: 0,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn desired(&self) -> Direction {
        self.desired
    }

    pub fn cell(&self, grid: &Grid) -> CellPos {
        grid.to_cell(self.position)
    }

    /// Buffered until the turn becomes possible.
    pub fn set_desired(&mut self, direction: Direction) {
        self.desired = direction;
    }

    pub fn place(&mut self, position: Position, direction: Direction) {
        self.position = position;
        self.direction = direction;
        self.desired = direction;
    }

    pub fn reset_to_start(&mut self) {
        self.position = self.start;
        self.direction = Direction::Right;
        self.desired = Direction::Right;
    }

    /// New level: new start cell.
    pub fn respawn_at(&mut self, start: CellPos, grid: &Grid) {
        self.start = grid.to_pixel(start);
        self.reset_to_start();
    }

    /// Returns true when the player actually moved.
    pub fn step(&mut self, grid: &Grid) -> bool {
        self.position = center_toward_lane(
            self.position,
            self.direction,
            grid,
            self.speed * 2.0,
            self.speed / 2.0,
        );

        // In portal space only a reversal along the tunnel is allowed.
        let cell = self.cell(grid);
        let can_turn = grid.in_bounds(cell.col, cell.row)
            || self.desired.is_horizontal() == self.direction.is_horizontal();
        if self.desired != self.direction
            && can_turn
            && player_can_enter(self.position.step(self.desired, self.speed), grid)
        {
            self.direction = self.desired;
        }

        let next = self.position.step(self.direction, self.speed);
        let moved = player_can_enter(next, grid);
        if moved {
            self.position = wrap_portal(next, grid, self.speed);
        }
        self.anim_phase = (self.anim_phase + 1) % ANIM_FRAMES;
        moved
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            x: self.position.x,
            y: self.position.y,
            dir: self.direction,
            anim_phase: self.anim_phase,
        }
    }
}
