use crate::config::GameOptions;
use crate::constants::{GHOST_EATEN_SCORE, POINT_SCORE, POWER_PELLET_SCORE};
use crate::ghost::{ChaseContext, Ghost};
use crate::grid::{Collectible, Grid};
use crate::maze::{generate_maze, level_seed, random_seed_offset};
use crate::player::Player;
use crate::rng::Rng;
use crate::types::{Direction, GameOverReason, GhostState, RuntimeEvent, Snapshot};

mod collision_system;
mod level_system;
mod utils;

use self::level_system::{build_grid, spawn_ghosts};
use self::utils::{ghost_id, personality_for, shuffled_den_cells};

/// Owns one game session: the grid, the agents and the bookkeeping around them.
#[derive(Clone, Debug)]
pub struct GameEngine {
    options: GameOptions,
    rng: Rng,
    grid: Grid,
    player: Player,
    ghosts: Vec<Ghost>,
    events: Vec<RuntimeEvent>,

    level: u32,
    level_seed: u32,
    score: u32,
    lives: u32,
    tick_counter: u64,
    ended: bool,
    end_reason: Option<GameOverReason>,
}

impl GameEngine {
    pub fn new(options: GameOptions) -> Self {
        let options = options.normalized();
        let mut rng = options.seed.map(Rng::new).unwrap_or_else(Rng::from_entropy);
        let level = options.level;
        let (grid, seed) = build_grid(&options, level, &mut rng);
        let player = Player::new(grid.player_start(), &grid);
        let ghosts = spawn_ghosts(&options, &grid, &mut rng);
        log::info!(
            "level {level} started: {}x{} grid, seed {seed}, {} collectibles",
            grid.width(),
            grid.height(),
            grid.remaining_collectibles()
        );

        Self {
            lives: options.lives,
            options,
            rng,
            grid,
            player,
            ghosts,
            events: vec![RuntimeEvent::LevelStarted { level, seed }],
            level,
            level_seed: seed,
            score: 0,
            tick_counter: 0,
            ended: false,
            end_reason: None,
        }
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn end_reason(&self) -> Option<GameOverReason> {
        self.end_reason
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn level_seed(&self) -> u32 {
        self.level_seed
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn tick(&self) -> u64 {
        self.tick_counter
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    pub fn set_input(&mut self, direction: Direction) {
        self.player.set_desired(direction);
    }

    pub fn step(&mut self) {
        if self.ended {
            return;
        }
        self.tick_counter += 1;

        self.player.step(&self.grid);
        self.apply_pickups();

        let ctx = ChaseContext {
            player: self.player.position(),
            player_heading: Some(self.player.direction()),
        };
        for idx in 0..self.ghosts.len() {
            let report = self.ghosts[idx].step(&ctx, &self.grid, &mut self.rng);
            if report.enclosed {
                self.events.push(RuntimeEvent::GhostEnclosed {
                    ghost_id: self.ghosts[idx].id().to_string(),
                });
            }
            if report.returned_home {
                log::debug!("{} back home at tick {}", self.ghosts[idx].id(), self.tick_counter);
            }
            if self.resolve_player_collision(idx) {
                return;
            }
        }

        self.resolve_ghost_collisions();
        self.check_level_complete();
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let snapshot = Snapshot {
            tick: self.tick_counter,
            level: self.level,
            score: self.score,
            lives: self.lives,
            width: self.grid.width(),
            height: self.grid.height(),
            tile_size: self.grid.tile_size(),
            tiles: self.grid.render_rows(),
            remaining_collectibles: self.grid.remaining_collectibles(),
            player: self.player.view(),
            ghosts: self.ghosts.iter().map(Ghost::view).collect(),
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
            game_over: self.end_reason,
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use crate::autopilot::Autopilot;
    use crate::config::GameOptions;
    use crate::constants::{GHOST_EATEN_SCORE, POINT_SCORE, POWER_PELLET_SCORE, TILE_SIZE};
    use crate::engine::GameEngine;
    use crate::ghost::Ghost;
    use crate::grid::Grid;
    use crate::player::Player;
    use crate::types::{
        CellPos, Direction, GameOverReason, GhostState, Personality, Position, RuntimeEvent,
    };

    fn seeded(seed: u32) -> GameEngine {
        GameEngine::new(GameOptions {
            seed: Some(seed),
            ..GameOptions::default()
        })
    }

    /// Swaps in a hand-made grid with the player at `start` heading right and
    /// one ghost per entry of `ghosts`, placed at the given pixel offsets from
    /// the player.
    fn staged(seed: u32, rows: &[&str], start: CellPos, ghosts: &[(f32, GhostState)]) -> GameEngine {
        let mut engine = seeded(seed);
        engine.grid = Grid::from_rows(rows, TILE_SIZE);
        engine.player = Player::new(start, &engine.grid);
        let origin = engine.player.position();
        let home = engine.grid.den().map(|den| den.home).unwrap_or(start);
        engine.ghosts = ghosts
            .iter()
            .enumerate()
            .map(|(idx, (dx, state))| {
                let mut ghost = Ghost::new(
                    format!("ghost_{}", idx + 1),
                    Personality::Chaser,
                    home,
                    &engine.grid,
                    engine.options.schedule(),
                );
                ghost.place(Position::new(origin.x + dx, origin.y), Direction::Left);
                match state {
                    GhostState::Normal => {}
                    GhostState::Vulnerable => ghost.make_vulnerable(100),
                    GhostState::Eaten => ghost.mark_eaten(),
                }
                ghost
            })
            .collect();
        engine.events.clear();
        engine
    }

    const ROWS: &[&str] = &[
        "#########",
        "#.o.....#",
        "#.##.##.#",
        "#.#===#.#",
        "#.#####.#",
        "         ",
        "#.......#",
        "#########",
    ];

    #[test]
    fn new_engine_starts_level_one_with_ghosts_in_the_den() {
        let mut engine = seeded(42);
        assert_eq!(engine.level(), 1);
        assert_eq!(engine.lives(), 3);
        assert_eq!((engine.grid().width(), engine.grid().height()), (19, 22));
        assert_eq!(engine.ghosts().len(), 4);
        for ghost in engine.ghosts() {
            assert!(ghost.is_in_den(engine.grid()));
            assert_eq!(ghost.state(), GhostState::Normal);
        }
        let snapshot = engine.build_snapshot(true);
        assert!(matches!(
            snapshot.events.as_slice(),
            [RuntimeEvent::LevelStarted { level: 1, .. }]
        ));
        assert_eq!(snapshot.tiles.len(), 22);
    }

    #[test]
    fn build_snapshot_drains_events_when_requested() {
        let mut engine = seeded(333);
        let peek = engine.build_snapshot(false);
        assert!(peek.events.is_empty());
        let first = engine.build_snapshot(true);
        let second = engine.build_snapshot(true);
        assert_eq!(first.events.len(), 1);
        assert_eq!(second.events.len(), 0);
    }

    #[test]
    fn eating_a_point_scores_and_reports() {
        let mut engine = staged(1, ROWS, CellPos::new(1, 1), &[]);
        engine.step();
        assert_eq!(engine.score(), POINT_SCORE);
        let snapshot = engine.build_snapshot(true);
        assert_eq!(snapshot.events, vec![RuntimeEvent::PointEaten { col: 1, row: 1 }]);
    }

    #[test]
    fn power_pellet_frightens_every_ghost_but_eaten_ones() {
        let mut engine = staged(
            2,
            ROWS,
            CellPos::new(1, 1),
            &[(200.0, GhostState::Normal), (200.0, GhostState::Eaten)],
        );
        for _ in 0..2 {
            engine.step();
        }
        assert_eq!(engine.score(), POINT_SCORE + POWER_PELLET_SCORE);
        assert_eq!(engine.ghosts()[0].state(), GhostState::Vulnerable);
        assert_eq!(engine.ghosts()[1].state(), GhostState::Eaten);
    }

    #[test]
    fn catching_a_vulnerable_ghost_eats_it() {
        let mut engine = staged(3, ROWS, CellPos::new(1, 6), &[(20.0, GhostState::Vulnerable)]);
        engine.step();
        assert_eq!(engine.ghosts()[0].state(), GhostState::Eaten);
        assert_eq!(engine.score(), POINT_SCORE + GHOST_EATEN_SCORE);
        assert_eq!(engine.lives(), 3);
        let snapshot = engine.build_snapshot(true);
        assert!(snapshot.events.contains(&RuntimeEvent::GhostEaten {
            ghost_id: "ghost_1".to_string(),
            score: GHOST_EATEN_SCORE,
        }));
    }

    #[test]
    fn vulnerable_ghost_at_the_player_position_is_eaten_in_place() {
        let mut engine = staged(3, ROWS, CellPos::new(7, 6), &[(0.0, GhostState::Vulnerable)]);
        let before = engine.player.position();
        assert!(!engine.resolve_player_collision(0));
        assert_eq!(engine.ghosts()[0].state(), GhostState::Eaten);
        assert_eq!(engine.score(), GHOST_EATEN_SCORE);
        assert_eq!(engine.player.position(), before);
        assert_eq!(engine.lives(), 3);
    }

    #[test]
    fn eating_a_ghost_while_blocked_leaves_the_player_in_place() {
        // Heading right into the east wall, so the player cannot move this tick.
        let mut engine = staged(5, ROWS, CellPos::new(7, 6), &[(0.0, GhostState::Vulnerable)]);
        let before = engine.player.position();
        engine.step();
        assert_eq!(engine.player.position(), before);
        assert_eq!(engine.ghosts()[0].state(), GhostState::Eaten);
        assert_eq!(engine.score(), POINT_SCORE + GHOST_EATEN_SCORE);
    }

    #[test]
    fn eaten_ghosts_pass_through_the_player() {
        let mut engine = staged(4, ROWS, CellPos::new(1, 6), &[(20.0, GhostState::Eaten)]);
        engine.step();
        assert_eq!(engine.lives(), 3);
        assert_eq!(engine.score(), POINT_SCORE);
    }

    #[test]
    fn normal_ghost_costs_a_life_and_resets_positions() {
        let mut engine = staged(
            5,
            ROWS,
            CellPos::new(1, 6),
            &[(20.0, GhostState::Normal), (200.0, GhostState::Vulnerable)],
        );
        engine.step();
        assert_eq!(engine.lives(), 2);
        assert_eq!(engine.player().position(), engine.grid().to_pixel(CellPos::new(1, 6)));
        assert!(engine
            .ghosts()
            .iter()
            .all(|ghost| ghost.state() == GhostState::Normal));
        let snapshot = engine.build_snapshot(true);
        assert!(snapshot.events.contains(&RuntimeEvent::LifeLost {
            ghost_id: "ghost_1".to_string(),
            lives: 2,
        }));
        assert!(!engine.is_ended());
    }

    #[test]
    fn losing_the_last_life_ends_the_game() {
        let mut engine = staged(6, ROWS, CellPos::new(1, 6), &[(20.0, GhostState::Normal)]);
        engine.lives = 1;
        engine.step();
        assert!(engine.is_ended());
        assert_eq!(engine.end_reason(), Some(GameOverReason::OutOfLives));
        let tick = engine.tick();
        engine.step();
        assert_eq!(engine.tick(), tick);
        let snapshot = engine.build_snapshot(true);
        assert_eq!(snapshot.game_over, Some(GameOverReason::OutOfLives));
        assert!(snapshot.events.contains(&RuntimeEvent::GameOver {
            reason: GameOverReason::OutOfLives,
        }));
    }

    #[test]
    fn colliding_ghosts_bounce_apart() {
        let mut engine = staged(
            7,
            ROWS,
            CellPos::new(1, 6),
            &[(102.0, GhostState::Normal), (110.0, GhostState::Normal)],
        );
        engine.step();
        let snapshot = engine.build_snapshot(true);
        assert!(snapshot.events.contains(&RuntimeEvent::GhostsCollided {
            a: "ghost_1".to_string(),
            b: "ghost_2".to_string(),
        }));
    }

    #[test]
    fn clearing_the_last_collectible_advances_the_level() {
        let mut engine = staged(8, ROWS, CellPos::new(1, 6), &[]);
        for row in 0..engine.grid.height() {
            for col in 0..engine.grid.width() {
                if (col, row) != (2, 6) {
                    engine.grid.take_collectible(CellPos::new(col, row));
                }
            }
        }
        assert_eq!(engine.grid().remaining_collectibles(), 1);
        engine.lives = 2;

        let advanced = (0..10).any(|_| {
            engine.step();
            engine.level() == 2
        });
        assert!(advanced);
        assert_eq!(engine.score(), POINT_SCORE);
        assert_eq!(engine.lives(), 2);
        assert!(engine.grid().width() >= 19);
        assert!(engine.grid().remaining_collectibles() > 0);
        assert_eq!(engine.ghosts().len(), 4);
        assert_eq!(
            engine.player().position(),
            engine.grid().to_pixel(engine.grid().player_start())
        );
        let events = engine.build_snapshot(true).events;
        assert!(events.contains(&RuntimeEvent::LevelCleared { level: 1 }));
        assert!(events
            .iter()
            .any(|event| matches!(event, RuntimeEvent::LevelStarted { level: 2, .. })));
    }

    #[test]
    fn equal_seeds_replay_identically() {
        let run = |seed: u32| {
            let mut engine = seeded(seed);
            let mut autopilot = Autopilot::new(seed);
            for _ in 0..400 {
                let dir = autopilot.choose(engine.player(), engine.ghosts(), engine.grid());
                engine.set_input(dir);
                engine.step();
            }
            serde_json::to_string(&engine.build_snapshot(true)).expect("snapshot should serialize")
        };
        assert_eq!(run(77), run(77));
    }

    #[test]
    fn autopilot_runs_stay_consistent() {
        for seed in 0..12u32 {
            let mut engine = seeded(seed);
            let mut autopilot = Autopilot::new(seed);
            let initial = engine.grid().remaining_collectibles();
            for _ in 0..1_500 {
                if engine.is_ended() {
                    break;
                }
                let dir = autopilot.choose(engine.player(), engine.ghosts(), engine.grid());
                engine.set_input(dir);
                engine.step();

                let grid = engine.grid();
                for ghost in engine.ghosts() {
                    let cell = ghost.cell(grid);
                    assert!(!grid.is_wall(cell.col, cell.row), "seed={seed} ghost in wall");
                }
                let cell = engine.player().cell(grid);
                assert!(!grid.is_den(cell.col, cell.row), "seed={seed} player in den");
            }
            assert!(engine.score() > 0, "seed={seed}");
            assert!(
                engine.level() > 1 || engine.grid().remaining_collectibles() < initial,
                "seed={seed}"
            );
        }
    }
}
