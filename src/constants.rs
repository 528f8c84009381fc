pub const TILE_SIZE: f32 = 34.0;

pub const MIN_MAZE_WIDTH: i32 = 19;
pub const MIN_MAZE_HEIGHT: i32 = 22;
pub const DEFAULT_BLOCK_WIDTH: i32 = 4;
pub const DEFAULT_BLOCK_HEIGHT: i32 = 3;
pub const LEVEL_SEED_STRIDE: u32 = 1000;

pub const PLAYER_SPEED: f32 = 12.0;
pub const GHOST_BASE_SPEED: f32 = 4.0;
pub const GHOST_VULNERABLE_SPEED: f32 = 1.0;
pub const GHOST_EATEN_SPEED: f32 = 12.0;

pub const VULNERABLE_TICKS: u32 = 500;
pub const SCATTER_TICKS: u32 = 70;
pub const CHASE_TICKS: u32 = 200;
pub const DECISION_PERIOD_TICKS: u64 = 20;
pub const ERRATIC_CORNER_PERIOD_TICKS: u64 = 200;
pub const ERRATIC_RETREAT_DISTANCE: f32 = 8.0;
pub const AMBUSH_LOOKAHEAD: i32 = 4;
pub const WANDER_LOOKAHEAD: i32 = 2;

pub const POINT_SCORE: u32 = 10;
pub const POWER_PELLET_SCORE: u32 = 50;
pub const GHOST_EATEN_SCORE: u32 = 200;
pub const STARTING_LIVES: u32 = 3;
pub const DEFAULT_GHOST_COUNT: usize = 4;

/// Fractions of a tile.
pub const PLAYER_GHOST_COLLISION: f32 = 0.7;
pub const GHOST_GHOST_COLLISION: f32 = 0.6;
pub const GHOST_GHOST_PREFILTER: f32 = 1.5;

/// Pixels.
pub const CENTER_TOLERANCE: f32 = 4.0;
pub const INTERSECTION_TOLERANCE: f32 = 3.0;
pub const HOME_TOLERANCE: f32 = 4.0;
pub const LANE_SLACK: f32 = 2.0;

pub const FLEE_PICK_CHANCE: f32 = 0.4;
pub const CURRENT_HEADING_BONUS: f32 = 0.8;
pub const NOISE_MIN: f32 = 0.7;
pub const NOISE_MAX: f32 = 1.3;
