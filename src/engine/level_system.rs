use super::*;

impl GameEngine {
    /// Fresh maze for `level`, player back to its start, ghosts rebuilt in the den.
    pub(super) fn start_level(&mut self, level: u32) {
        let (grid, seed) = build_grid(&self.options, level, &mut self.rng);
        self.grid = grid;
        self.level = level;
        self.level_seed = seed;
        self.player.respawn_at(self.grid.player_start(), &self.grid);
        self.ghosts = spawn_ghosts(&self.options, &self.grid, &mut self.rng);
        log::info!(
            "level {level} started: {}x{} grid, seed {seed}, {} collectibles",
            self.grid.width(),
            self.grid.height(),
            self.grid.remaining_collectibles()
        );
        self.events.push(RuntimeEvent::LevelStarted { level, seed });
    }

    pub(super) fn check_level_complete(&mut self) {
        if self.grid.remaining_collectibles() > 0 {
            return;
        }
        let cleared = self.level;
        log::info!("level {cleared} cleared at tick {} with score {}", self.tick_counter, self.score);
        self.events.push(RuntimeEvent::LevelCleared { level: cleared });
        self.start_level(cleared + 1);
    }
}

pub(super) fn build_grid(options: &GameOptions, level: u32, rng: &mut Rng) -> (Grid, u32) {
    let offset = options
        .seed_offset
        .unwrap_or_else(|| random_seed_offset(rng));
    let grid = generate_maze(options.block_width, options.block_height, level, offset);
    (grid, level_seed(level, offset))
}

pub(super) fn spawn_ghosts(options: &GameOptions, grid: &Grid, rng: &mut Rng) -> Vec<Ghost> {
    let cells = shuffled_den_cells(grid, rng);
    (0..options.ghost_count)
        .map(|index| {
            Ghost::new(
                ghost_id(index),
                personality_for(index),
                cells[index % cells.len()],
                grid,
                options.schedule(),
            )
        })
        .collect()
}
