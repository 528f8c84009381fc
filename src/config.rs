use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CHASE_TICKS, DEFAULT_BLOCK_HEIGHT, DEFAULT_BLOCK_WIDTH, DEFAULT_GHOST_COUNT, SCATTER_TICKS,
    STARTING_LIVES, VULNERABLE_TICKS,
};
use crate::ghost::ModeSchedule;

const MAX_BLOCKS: i32 = 12;
const MAX_GHOSTS: usize = 8;
const MAX_LIVES: u32 = 9;
const MAX_PHASE_TICKS: u32 = 10_000;

/// Runtime knobs for a game. Missing JSON fields fall back to the defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameOptions {
    /// Seeds ghost decisions and, when `seed_offset` is unset, maze offsets.
    /// `None` draws from the OS.
    pub seed: Option<u32>,
    pub seed_offset: Option<u32>,
    pub level: u32,
    pub block_width: i32,
    pub block_height: i32,
    pub ghost_count: usize,
    pub lives: u32,
    pub vulnerable_ticks: u32,
    pub scatter_ticks: u32,
    pub chase_ticks: u32,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            seed: None,
            seed_offset: None,
            level: 1,
            block_width: DEFAULT_BLOCK_WIDTH,
            block_height: DEFAULT_BLOCK_HEIGHT,
            ghost_count: DEFAULT_GHOST_COUNT,
            lives: STARTING_LIVES,
            vulnerable_ticks: VULNERABLE_TICKS,
            scatter_ticks: SCATTER_TICKS,
            chase_ticks: CHASE_TICKS,
        }
    }
}

impl GameOptions {
    pub fn normalized(mut self) -> Self {
        self.level = self.level.max(1);
        self.block_width = self.block_width.clamp(1, MAX_BLOCKS);
        self.block_height = self.block_height.clamp(1, MAX_BLOCKS);
        self.ghost_count = self.ghost_count.clamp(1, MAX_GHOSTS);
        self.lives = self.lives.clamp(1, MAX_LIVES);
        self.vulnerable_ticks = self.vulnerable_ticks.clamp(1, MAX_PHASE_TICKS);
        self.scatter_ticks = self.scatter_ticks.clamp(1, MAX_PHASE_TICKS);
        self.chase_ticks = self.chase_ticks.clamp(1, MAX_PHASE_TICKS);
        self
    }

    pub fn schedule(&self) -> ModeSchedule {
        ModeSchedule {
            scatter_ticks: self.scatter_ticks,
            chase_ticks: self.chase_ticks,
        }
    }
}

pub fn load_options(path: &Path) -> io::Result<GameOptions> {
    let text = fs::read_to_string(path)?;
    let options: GameOptions = serde_json::from_str(&text)?;
    Ok(options.normalized())
}
