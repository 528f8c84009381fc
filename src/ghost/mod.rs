pub mod personality;

use crate::constants::{
    CENTER_TOLERANCE, CHASE_TICKS, CURRENT_HEADING_BONUS, DECISION_PERIOD_TICKS,
    FLEE_PICK_CHANCE, GHOST_BASE_SPEED, GHOST_EATEN_SPEED, GHOST_GHOST_COLLISION,
    GHOST_GHOST_PREFILTER, GHOST_VULNERABLE_SPEED, HOME_TOLERANCE, LANE_SLACK, NOISE_MAX,
    NOISE_MIN, PLAYER_GHOST_COLLISION, SCATTER_TICKS,
};
use crate::grid::Grid;
use crate::mover::{
    can_enter, center_toward_lane, is_centered, is_intersection, lane_offset, path_step,
    wrap_portal, Agent,
};
use crate::rng::Rng;
use crate::types::{
    CellPos, Direction, GhostState, GhostView, MovementMode, Personality, Position,
};

use self::personality::{strategy_for, GhostStrategy, TargetInput};

/// Alternating Scatter/Chase phases for Normal ghosts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeSchedule {
    pub scatter_ticks: u32,
    pub chase_ticks: u32,
}

impl Default for ModeSchedule {
    fn default() -> Self {
        Self {
            scatter_ticks: SCATTER_TICKS,
            chase_ticks: CHASE_TICKS,
        }
    }
}

/// Player state the ghosts are allowed to see, rebuilt by the engine every tick.
#[derive(Clone, Copy, Debug)]
pub struct ChaseContext {
    pub player: Position,
    pub player_heading: Option<Direction>,
}

impl ChaseContext {
    pub fn heading(&self) -> Direction {
        self.player_heading.unwrap_or(Direction::Right)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decision {
    pub direction: Direction,
    /// No direction was enterable; `direction` is a random fallback.
    pub enclosed: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    pub enclosed: bool,
    pub returned_home: bool,
}

#[derive(Clone, Debug)]
pub struct Ghost {
    id: String,
    position: Position,
    home: CellPos,
    direction: Direction,
    state: GhostState,
    mode: MovementMode,
    strategy: &'static dyn GhostStrategy,
    schedule: ModeSchedule,
    vulnerable_ticks: u32,
    total_ticks: u64,
    mode_ticks: u32,
    decided_at: Option<CellPos>,
}

impl Ghost {
    pub fn new(
        id: impl Into<String>,
        personality: Personality,
        home: CellPos,
        grid: &Grid,
        schedule: ModeSchedule,
    ) -> Self {
        Self {
            id: id.into(),
            position: grid.to_pixel(home),
            home,
            direction: Direction::Up,
            state: GhostState::Normal,
            mode: MovementMode::Scatter,
            strategy: strategy_for(personality),
            schedule,
            vulnerable_ticks: 0,
            total_ticks: 0,
            mode_ticks: 0,
            decided_at: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn state(&self) -> GhostState {
        self.state
    }

    pub fn mode(&self) -> MovementMode {
        self.mode
    }

    pub fn personality(&self) -> Personality {
        self.strategy.personality()
    }

    pub fn home(&self) -> CellPos {
        self.home
    }

    pub fn vulnerable_ticks(&self) -> u32 {
        self.vulnerable_ticks
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    pub fn cell(&self, grid: &Grid) -> CellPos {
        grid.to_cell(self.position)
    }

    pub fn speed(&self) -> f32 {
        match self.state {
            GhostState::Normal => GHOST_BASE_SPEED,
            GhostState::Vulnerable => GHOST_VULNERABLE_SPEED,
            GhostState::Eaten => GHOST_EATEN_SPEED,
        }
    }

    pub fn is_in_den(&self, grid: &Grid) -> bool {
        let cell = self.cell(grid);
        grid.is_den(cell.col, cell.row)
    }

    /// Moves the ghost without any rule checks. Used for level setup and tests.
    pub fn place(&mut self, position: Position, direction: Direction) {
        self.position = position;
        self.direction = direction;
        self.decided_at = None;
    }

    pub fn view(&self) -> GhostView {
        GhostView {
            id: self.id.clone(),
            x: self.position.x,
            y: self.position.y,
            dir: self.direction,
            state: self.state,
            mode: self.mode,
            personality: self.personality(),
            vulnerable_ticks: self.vulnerable_ticks,
        }
    }

    pub fn make_vulnerable(&mut self, ticks: u32) {
        if self.state == GhostState::Eaten {
            return;
        }
        self.state = GhostState::Vulnerable;
        self.mode = MovementMode::Frightened;
        self.vulnerable_ticks = ticks;
    }

    pub fn mark_eaten(&mut self) {
        self.state = GhostState::Eaten;
        self.mode = MovementMode::Chase;
        self.vulnerable_ticks = 0;
        self.decided_at = None;
    }

    pub fn revert_to_normal(&mut self, grid: &Grid, rng: &mut Rng) {
        self.state = GhostState::Normal;
        self.mode = MovementMode::Chase;
        self.vulnerable_ticks = 0;
        self.mode_ticks = 0;
        self.decided_at = None;
        self.direction = if self.is_in_den(grid) {
            Direction::Up
        } else {
            random_direction(rng)
        };
    }

    /// Center distance below the player collision threshold.
    pub fn touches_player(&self, player: Position, grid: &Grid) -> bool {
        self.position.distance(player) < grid.tile_size() * PLAYER_GHOST_COLLISION
    }

    /// Eaten ghosts, ghosts inside the den and ghosts in portal space never
    /// collide with each other.
    pub fn collides_with(&self, other: &Ghost, grid: &Grid) -> bool {
        if self.state == GhostState::Eaten || other.state == GhostState::Eaten {
            return false;
        }
        if self.is_in_den(grid) || other.is_in_den(grid) {
            return false;
        }
        if !self.is_on_grid(grid) || !other.is_on_grid(grid) {
            return false;
        }
        let tile = grid.tile_size();
        if self.position.manhattan(other.position) >= tile * GHOST_GHOST_PREFILTER {
            return false;
        }
        self.position.distance(other.position) < tile * GHOST_GHOST_COLLISION
    }

    /// Snaps to the current cell and double-steps sideways, or backwards
    /// when neither side is open.
    pub fn react_to_collision(&mut self, grid: &Grid, rng: &mut Rng) {
        let on_grid = self.is_on_grid(grid);
        self.position = grid.to_pixel(self.cell(grid));
        self.decided_at = None;
        let speed = self.speed();
        let heading = self.direction;
        // Off the grid only the tunnel axis is available.
        let sideways: Vec<Direction> = if on_grid {
            Direction::ALL
                .into_iter()
                .filter(|dir| *dir != heading && *dir != heading.opposite())
                .filter(|dir| self.can_move(*dir, speed, grid))
                .collect()
        } else {
            Vec::new()
        };

        let dir = match rng.pick(&sideways) {
            Some(dir) => *dir,
            None if self.can_move(heading.opposite(), speed, grid) => heading.opposite(),
            None => return,
        };
        self.direction = dir;
        for _ in 0..2 {
            if !self.try_move(dir, speed, grid) {
                break;
            }
        }
    }

    pub fn target_cell(&self, ctx: &ChaseContext, grid: &Grid) -> CellPos {
        let player = grid.to_cell(ctx.player);
        match self.state {
            GhostState::Eaten => self.home,
            GhostState::Vulnerable => player,
            GhostState::Normal => match self.mode {
                MovementMode::Scatter => self.strategy.scatter_target(grid),
                MovementMode::Chase | MovementMode::Frightened => {
                    let input = TargetInput {
                        ghost: self.cell(grid),
                        player,
                        player_heading: ctx.heading(),
                        total_ticks: self.total_ticks,
                    };
                    self.strategy.chase_target(&input, grid)
                }
            },
        }
    }

    /// Scores each enterable neighbor cell by its distance to the target and
    /// lets the ghost's state and personality choose among them.
    pub fn decide_direction(&self, ctx: &ChaseContext, grid: &Grid, rng: &mut Rng) -> Decision {
        let cell = self.cell(grid);
        let target = self.target_cell(ctx, grid);
        let at_intersection = is_intersection(self.position, grid);
        let agent = Agent::Ghost(self.state);
        let reverse = self.direction.opposite();
        let score = |dir: Direction| {
            let next = cell.offset(dir);
            can_enter(agent, cell, next, grid).then(|| (dir, next.distance(target)))
        };

        let mut options: Vec<(Direction, f32)> = Direction::ALL
            .into_iter()
            .filter(|dir| at_intersection || *dir != reverse)
            .filter_map(score)
            .collect();
        if options.is_empty() {
            options.extend(score(reverse));
        }
        if options.is_empty() {
            log::warn!(
                "ghost {} enclosed at ({}, {}); picking a random direction",
                self.id,
                cell.col,
                cell.row
            );
            return Decision {
                direction: random_direction(rng),
                enclosed: true,
            };
        }

        let direction = match self.state {
            GhostState::Eaten => {
                sort_ascending(&mut options);
                options[0].0
            }
            GhostState::Vulnerable => {
                for option in options.iter_mut() {
                    option.1 = -option.1;
                }
                sort_ascending(&mut options);
                if options.len() > 1 && rng.bool(FLEE_PICK_CHANCE) {
                    options[rng.pick_index(2)].0
                } else {
                    options[0].0
                }
            }
            GhostState::Normal => {
                let noisy = rng.bool(self.strategy.noise_chance());
                for option in options.iter_mut() {
                    if noisy {
                        option.1 *= rng.range_f32(NOISE_MIN, NOISE_MAX);
                    }
                    if option.0 == self.direction && !at_intersection {
                        option.1 *= CURRENT_HEADING_BONUS;
                    }
                }
                sort_ascending(&mut options);
                self.strategy.pick(&options, rng)
            }
        };
        Decision {
            direction,
            enclosed: false,
        }
    }

    pub fn step(&mut self, ctx: &ChaseContext, grid: &Grid, rng: &mut Rng) -> StepReport {
        self.total_ticks += 1;
        match self.state {
            GhostState::Vulnerable => {
                self.vulnerable_ticks = self.vulnerable_ticks.saturating_sub(1);
                if self.vulnerable_ticks == 0 {
                    self.revert_to_normal(grid, rng);
                }
            }
            GhostState::Normal => self.advance_schedule(),
            GhostState::Eaten => {}
        }

        if self.state == GhostState::Eaten {
            return StepReport {
                returned_home: self.step_eaten(ctx, grid, rng),
                ..StepReport::default()
            };
        }
        if self.is_in_den(grid) {
            self.step_in_den(grid, rng);
            return StepReport::default();
        }
        StepReport {
            enclosed: self.step_in_field(ctx, grid, rng),
            ..StepReport::default()
        }
    }

    fn advance_schedule(&mut self) {
        self.mode_ticks += 1;
        match self.mode {
            MovementMode::Scatter if self.mode_ticks >= self.schedule.scatter_ticks => {
                self.mode = MovementMode::Chase;
                self.mode_ticks = 0;
            }
            MovementMode::Chase if self.mode_ticks >= self.schedule.chase_ticks => {
                self.mode = MovementMode::Scatter;
                self.mode_ticks = 0;
            }
            MovementMode::Frightened => {
                self.mode = MovementMode::Chase;
                self.mode_ticks = 0;
            }
            _ => {}
        }
    }

    /// Heads for home along the shortest legal path, moving straight at each
    /// waypoint. Returns true on the tick the ghost arrives and revives.
    fn step_eaten(&mut self, ctx: &ChaseContext, grid: &Grid, rng: &mut Rng) -> bool {
        let home = grid.to_pixel(self.home);
        if (self.position.x - home.x).abs() <= HOME_TOLERANCE
            && (self.position.y - home.y).abs() <= HOME_TOLERANCE
        {
            self.position = home;
            self.revert_to_normal(grid, rng);
            return true;
        }

        let cell = self.cell(grid);
        let waypoint = if cell == self.home {
            self.home
        } else if !grid.in_bounds(cell.col, cell.row) {
            CellPos::new(
                cell.col.clamp(0, grid.width() - 1),
                cell.row.clamp(0, grid.height() - 1),
            )
        } else if let Some(dir) = path_step(Agent::Ghost(self.state), cell, self.home, grid) {
            cell.offset(dir)
        } else {
            let decision = self.decide_direction(ctx, grid, rng);
            self.direction = decision.direction;
            self.try_move(decision.direction, self.speed(), grid);
            return false;
        };
        self.move_straight_toward(grid.to_pixel(waypoint));
        false
    }

    fn move_straight_toward(&mut self, target: Position) {
        let speed = self.speed();
        let dx = target.x - self.position.x;
        let dy = target.y - self.position.y;
        self.position.x += dx.signum() * speed.min(dx.abs());
        self.position.y += dy.signum() * speed.min(dy.abs());
        if dx.abs() >= dy.abs() && dx != 0.0 {
            self.direction = if dx > 0.0 { Direction::Right } else { Direction::Left };
        } else if dy != 0.0 {
            self.direction = if dy > 0.0 { Direction::Down } else { Direction::Up };
        }
    }

    /// Lines up with the door column, then climbs out.
    fn step_in_den(&mut self, grid: &Grid, rng: &mut Rng) {
        let speed = self.speed();
        let door = grid
            .den()
            .map(|den| den.door)
            .unwrap_or_else(|| self.cell(grid).offset(Direction::Up));
        let dx = grid.to_pixel(door).x - self.position.x;

        if dx.abs() > HOME_TOLERANCE {
            let dir = if dx > 0.0 { Direction::Right } else { Direction::Left };
            if self.try_move(dir, speed.min(dx.abs()), grid) {
                return;
            }
            // A pillar is in the way.
            let around = path_step(Agent::Ghost(self.state), self.cell(grid), door, grid);
            if let Some(dir) = around {
                if self.try_move(dir, speed, grid) {
                    return;
                }
            }
        } else if self.try_move(Direction::Up, speed, grid) {
            return;
        }

        let mut fallback = [Direction::Left, Direction::Right, Direction::Down];
        rng.shuffle(&mut fallback);
        for dir in fallback {
            if self.try_move(dir, speed, grid) {
                return;
            }
        }
    }

    fn step_in_field(&mut self, ctx: &ChaseContext, grid: &Grid, rng: &mut Rng) -> bool {
        let speed = self.speed();
        let cell = self.cell(grid);
        if self.decided_at.is_some_and(|decided| decided != cell) {
            self.decided_at = None;
        }

        let on_grid = grid.in_bounds(cell.col, cell.row);
        let centered = is_centered(self.position, grid, CENTER_TOLERANCE);
        let at_intersection = on_grid && is_intersection(self.position, grid);
        let agent = Agent::Ghost(self.state);
        let step_blocked = !self.can_move(self.direction, speed, grid);
        let next_cell_blocked =
            centered && !can_enter(agent, cell, cell.offset(self.direction), grid);
        let periodic = centered && self.total_ticks % DECISION_PERIOD_TICKS == 0;
        let fresh = self.decided_at.is_none();

        if !on_grid && !self.direction.is_horizontal() {
            self.return_to_tunnel(cell, grid);
        }

        let mut enclosed = false;
        if on_grid && (step_blocked || next_cell_blocked || (fresh && (at_intersection || periodic)))
        {
            let decision = self.decide_direction(ctx, grid, rng);
            enclosed = decision.enclosed;
            if centered && decision.direction.is_horizontal() != self.direction.is_horizontal() {
                let center = grid.to_pixel(cell);
                if decision.direction.is_horizontal() {
                    self.position.y = center.y;
                } else {
                    self.position.x = center.x;
                }
            }
            self.direction = decision.direction;
            self.decided_at = Some(cell);
        }

        if self.try_move(self.direction, speed, grid) {
            let offset = lane_offset(self.position, self.direction, grid);
            if !at_intersection && offset.abs() > LANE_SLACK {
                let nudge = offset.signum() * offset.abs().min(1.0);
                if self.direction.is_horizontal() {
                    self.position.y -= nudge;
                } else {
                    self.position.x -= nudge;
                }
            }
        } else {
            let mut others: Vec<Direction> = Direction::ALL
                .into_iter()
                .filter(|dir| *dir != self.direction)
                .filter(|dir| on_grid || dir.is_horizontal())
                .collect();
            rng.shuffle(&mut others);
            for dir in others {
                if self.try_move(dir, speed, grid) {
                    break;
                }
            }
        }

        self.position = wrap_portal(self.position, grid, speed);
        if lane_offset(self.position, self.direction, grid).abs() > LANE_SLACK {
            self.position = center_toward_lane(
                self.position,
                self.direction,
                grid,
                grid.tile_size(),
                (speed / 2.0).floor(),
            );
        }
        enclosed
    }

    fn is_on_grid(&self, grid: &Grid) -> bool {
        let cell = self.cell(grid);
        grid.in_bounds(cell.col, cell.row)
    }

    /// Portal space is a horizontal tunnel: back onto the row center, heading
    /// toward the grid.
    fn return_to_tunnel(&mut self, cell: CellPos, grid: &Grid) {
        self.position.y = grid.to_pixel(cell).y;
        self.direction = if cell.col < 0 {
            Direction::Right
        } else {
            Direction::Left
        };
    }

    fn can_move(&self, dir: Direction, amount: f32, grid: &Grid) -> bool {
        let target = self.position.step(dir, amount);
        can_enter(
            Agent::Ghost(self.state),
            self.cell(grid),
            grid.to_cell(target),
            grid,
        )
    }

    fn try_move(&mut self, dir: Direction, amount: f32, grid: &Grid) -> bool {
        if !self.can_move(dir, amount, grid) {
            return false;
        }
        self.position = self.position.step(dir, amount);
        self.direction = dir;
        true
    }
}

fn random_direction(rng: &mut Rng) -> Direction {
    Direction::ALL[rng.pick_index(Direction::ALL.len())]
}

fn sort_ascending(options: &mut [(Direction, f32)]) {
    options.sort_by(|a, b| a.1.total_cmp(&b.1));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{TILE_SIZE, VULNERABLE_TICKS};
    use crate::maze::generate_maze;

    fn small_grid() -> Grid {
        Grid::from_rows(
            &[
                "#########",
                "#.......#",
                "#.##.##.#",
                "#.#===#.#",
                "#.#####.#",
                "         ",
                "#.......#",
                "#########",
            ],
            TILE_SIZE,
        )
    }

    fn ctx_at(grid: &Grid, cell: CellPos) -> ChaseContext {
        ChaseContext {
            player: grid.to_pixel(cell),
            player_heading: Some(Direction::Left),
        }
    }

    fn ghost(grid: &Grid, personality: Personality) -> Ghost {
        Ghost::new("g0", personality, CellPos::new(4, 3), grid, ModeSchedule::default())
    }

    #[test]
    fn eaten_ghost_cannot_be_frightened() {
        let grid = small_grid();
        let mut g = ghost(&grid, Personality::Chaser);
        g.mark_eaten();
        g.make_vulnerable(VULNERABLE_TICKS);
        assert_eq!(g.state(), GhostState::Eaten);
        assert_eq!(g.speed(), GHOST_EATEN_SPEED);
    }

    #[test]
    fn vulnerability_expires_back_to_normal() {
        let grid = small_grid();
        let mut rng = Rng::new(4);
        let mut g = ghost(&grid, Personality::Chaser);
        g.place(grid.to_pixel(CellPos::new(1, 6)), Direction::Right);
        g.make_vulnerable(5);
        assert_eq!(g.mode(), MovementMode::Frightened);
        let ctx = ctx_at(&grid, CellPos::new(7, 1));
        for _ in 0..4 {
            g.step(&ctx, &grid, &mut rng);
            assert_eq!(g.state(), GhostState::Vulnerable);
        }
        g.step(&ctx, &grid, &mut rng);
        assert_eq!(g.state(), GhostState::Normal);
        assert_eq!(g.mode(), MovementMode::Chase);
    }

    #[test]
    fn eaten_ghost_walks_home_and_revives() {
        let grid = small_grid();
        let mut rng = Rng::new(9);
        let mut g = ghost(&grid, Personality::Wanderer);
        g.place(grid.to_pixel(CellPos::new(6, 6)), Direction::Left);
        g.mark_eaten();
        let ctx = ctx_at(&grid, CellPos::new(1, 1));

        let mut revived = false;
        for _ in 0..200 {
            if g.step(&ctx, &grid, &mut rng).returned_home {
                revived = true;
                break;
            }
        }
        assert!(revived);
        assert_eq!(g.state(), GhostState::Normal);
        assert_eq!(g.position(), grid.to_pixel(CellPos::new(4, 3)));
        assert_eq!(g.direction(), Direction::Up);
    }

    #[test]
    fn eaten_ghosts_return_home_in_generated_mazes() {
        for seed in 0..30u32 {
            let grid = generate_maze(4, 3, 1 + seed % 6, seed);
            let den = grid.den().expect("generated mazes have a den").clone();
            let mut rng = Rng::new(seed);
            let mut g = Ghost::new("g", Personality::Chaser, den.home, &grid, ModeSchedule::default());
            g.place(grid.to_pixel(grid.player_start()), Direction::Right);
            g.mark_eaten();
            let ctx = ctx_at(&grid, CellPos::new(1, 1));
            let arrived = (0..1_000).any(|_| g.step(&ctx, &grid, &mut rng).returned_home);
            assert!(arrived, "seed={seed}");
        }
    }

    #[test]
    fn normal_ghost_leaves_the_den() {
        let grid = small_grid();
        let mut rng = Rng::new(2);
        let mut g = Ghost::new(
            "g1",
            Personality::Chaser,
            CellPos::new(3, 3),
            &grid,
            ModeSchedule::default(),
        );
        assert!(g.is_in_den(&grid));
        let ctx = ctx_at(&grid, CellPos::new(1, 6));
        let escaped = (0..60).any(|_| {
            g.step(&ctx, &grid, &mut rng);
            !g.is_in_den(&grid)
        });
        assert!(escaped);
        assert_eq!(g.cell(&grid), CellPos::new(4, 2));
    }

    #[test]
    fn ghosts_never_enter_the_den_unless_eaten() {
        for seed in 0..10u32 {
            let grid = generate_maze(4, 3, 2, seed);
            let den = grid.den().expect("generated mazes have a den").clone();
            let mut rng = Rng::new(seed + 100);
            let mut ghosts: Vec<Ghost> = Personality::ROSTER
                .iter()
                .enumerate()
                .map(|(idx, p)| Ghost::new(format!("g{idx}"), *p, den.home, &grid, ModeSchedule::default()))
                .collect();
            let start = grid.player_start();
            for tick in 0..1_500u32 {
                let ctx = ChaseContext {
                    player: grid.to_pixel(start),
                    player_heading: Some(Direction::ALL[(tick / 50) as usize % 4]),
                };
                if tick % 300 == 150 {
                    for g in ghosts.iter_mut() {
                        g.make_vulnerable(120);
                    }
                }
                for g in ghosts.iter_mut() {
                    let was_in_den = g.is_in_den(&grid);
                    let state = g.state();
                    g.step(&ctx, &grid, &mut rng);
                    if !was_in_den && g.is_in_den(&grid) {
                        assert_eq!(state, GhostState::Eaten, "seed={seed} tick={tick} ghost={}", g.id());
                    }
                }
            }
        }
    }

    #[test]
    fn decision_avoids_reversing_in_corridors() {
        let grid = small_grid();
        let mut rng = Rng::new(11);
        let mut g = ghost(&grid, Personality::Chaser);
        // Straight corridor, target behind.
        g.place(grid.to_pixel(CellPos::new(2, 1)), Direction::Right);
        let ctx = ctx_at(&grid, CellPos::new(1, 1));
        g.mode = MovementMode::Chase;
        for _ in 0..50 {
            assert_eq!(g.decide_direction(&ctx, &grid, &mut rng).direction, Direction::Right);
        }
    }

    #[test]
    fn dead_end_readmits_reverse() {
        let grid = Grid::from_rows(&["#####", "#...#", "#####"], TILE_SIZE);
        let mut rng = Rng::new(1);
        let mut g = Ghost::new("g", Personality::Chaser, CellPos::new(1, 1), &grid, ModeSchedule::default());
        g.place(grid.to_pixel(CellPos::new(3, 1)), Direction::Right);
        let ctx = ctx_at(&grid, CellPos::new(3, 1));
        let decision = g.decide_direction(&ctx, &grid, &mut rng);
        assert_eq!(decision.direction, Direction::Left);
        assert!(!decision.enclosed);
    }

    #[test]
    fn enclosed_ghost_reports_and_picks_randomly() {
        let grid = Grid::from_rows(&["###", "#.#", "###"], TILE_SIZE);
        let mut rng = Rng::new(1);
        let g = Ghost::new("g", Personality::Erratic, CellPos::new(1, 1), &grid, ModeSchedule::default());
        let ctx = ctx_at(&grid, CellPos::new(1, 1));
        let decision = g.decide_direction(&ctx, &grid, &mut rng);
        assert!(decision.enclosed);
    }

    #[test]
    fn frightened_ghost_never_heads_toward_the_player() {
        let grid = small_grid();
        let mut rng = Rng::new(5);
        let mut g = ghost(&grid, Personality::Chaser);
        // T-junction at (4,1); player straight below on the bottom row.
        g.place(grid.to_pixel(CellPos::new(4, 1)), Direction::Left);
        g.make_vulnerable(VULNERABLE_TICKS);
        let ctx = ctx_at(&grid, CellPos::new(7, 1));
        for _ in 0..100 {
            let dir = g.decide_direction(&ctx, &grid, &mut rng).direction;
            assert_ne!(dir, Direction::Right);
        }
    }

    #[test]
    fn target_depends_on_state_and_mode() {
        let grid = small_grid();
        let mut g = ghost(&grid, Personality::Ambusher);
        let ctx = ctx_at(&grid, CellPos::new(1, 6));
        assert_eq!(g.target_cell(&ctx, &grid), CellPos::new(grid.width() - 2, 1));
        g.mode = MovementMode::Chase;
        assert_eq!(g.target_cell(&ctx, &grid), CellPos::new(0, 6));
        g.make_vulnerable(10);
        assert_eq!(g.target_cell(&ctx, &grid), CellPos::new(1, 6));
        g.mark_eaten();
        assert_eq!(g.target_cell(&ctx, &grid), CellPos::new(4, 3));
    }

    #[test]
    fn missing_player_heading_defaults_to_right() {
        let ctx = ChaseContext {
            player: Position::new(0.0, 0.0),
            player_heading: None,
        };
        assert_eq!(ctx.heading(), Direction::Right);
    }

    #[test]
    fn schedule_alternates_scatter_and_chase() {
        let grid = small_grid();
        let mut rng = Rng::new(6);
        let schedule = ModeSchedule {
            scatter_ticks: 3,
            chase_ticks: 2,
        };
        let mut g = Ghost::new("g", Personality::Chaser, CellPos::new(1, 1), &grid, schedule);
        let ctx = ctx_at(&grid, CellPos::new(7, 6));
        let modes: Vec<MovementMode> = (0..6)
            .map(|_| {
                g.step(&ctx, &grid, &mut rng);
                g.mode()
            })
            .collect();
        assert_eq!(
            modes,
            vec![
                MovementMode::Scatter,
                MovementMode::Scatter,
                MovementMode::Chase,
                MovementMode::Chase,
                MovementMode::Scatter,
                MovementMode::Scatter,
            ]
        );
    }

    #[test]
    fn collision_reaction_sidesteps_and_separates() {
        let grid = small_grid();
        let mut rng = Rng::new(3);
        let mut g = ghost(&grid, Personality::Chaser);
        let junction = grid.to_pixel(CellPos::new(4, 1));
        g.place(Position::new(junction.x + 2.0, junction.y), Direction::Up);
        g.react_to_collision(&grid, &mut rng);
        assert!(g.direction().is_horizontal());
        assert_eq!(g.position().y, junction.y);
        assert_eq!((g.position().x - junction.x).abs(), 2.0 * GHOST_BASE_SPEED);
    }

    #[test]
    fn eaten_and_den_ghosts_do_not_collide() {
        let grid = small_grid();
        let mut a = ghost(&grid, Personality::Chaser);
        let mut b = ghost(&grid, Personality::Wanderer);
        assert!(!a.collides_with(&b, &grid));
        let spot = grid.to_pixel(CellPos::new(2, 1));
        a.place(spot, Direction::Left);
        b.place(Position::new(spot.x + 10.0, spot.y), Direction::Right);
        assert!(a.collides_with(&b, &grid));
        b.mark_eaten();
        assert!(!a.collides_with(&b, &grid));
    }

    #[test]
    fn ghosts_in_portal_space_do_not_collide() {
        let grid = small_grid();
        let mut a = ghost(&grid, Personality::Chaser);
        let mut b = ghost(&grid, Personality::Wanderer);
        a.place(Position::new(-30.0, 5.0 * TILE_SIZE), Direction::Left);
        b.place(Position::new(-20.0, 5.0 * TILE_SIZE), Direction::Right);
        assert!(!a.collides_with(&b, &grid));
        assert!(!b.collides_with(&a, &grid));
    }

    #[test]
    fn collision_reaction_in_the_tunnel_stays_on_the_portal_row() {
        let grid = small_grid();
        let mut rng = Rng::new(6);
        let mut g = ghost(&grid, Personality::Wanderer);
        g.place(Position::new(-30.0, 5.0 * TILE_SIZE), Direction::Left);
        g.react_to_collision(&grid, &mut rng);
        assert_eq!(g.direction(), Direction::Right);
        assert_eq!(g.position().y, 5.0 * TILE_SIZE);

        let ctx = ctx_at(&grid, CellPos::new(1, 1));
        let mut back_on_grid = false;
        for tick in 0..100 {
            g.step(&ctx, &grid, &mut rng);
            let cell = g.cell(&grid);
            if grid.in_bounds(cell.col, cell.row) {
                back_on_grid = true;
            } else {
                assert_eq!(cell.row, 5, "tick={tick}");
            }
        }
        assert!(back_on_grid);
    }

    #[test]
    fn vertical_heading_in_portal_space_turns_along_the_tunnel() {
        let grid = small_grid();
        let mut rng = Rng::new(1);
        let mut g = ghost(&grid, Personality::Chaser);
        let start = Position::new(-TILE_SIZE, 5.0 * TILE_SIZE + 3.0);
        g.place(start, Direction::Down);
        g.step(&ctx_at(&grid, CellPos::new(1, 1)), &grid, &mut rng);
        assert_eq!(g.direction(), Direction::Right);
        assert_eq!(g.position().y, 5.0 * TILE_SIZE);
        assert!(g.position().x > start.x);
    }
}
