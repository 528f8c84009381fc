use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

/// Grid coordinates. Negative or oversized values are portal space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CellPos {
    pub col: i32,
    pub row: i32,
}

impl CellPos {
    pub fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    pub fn offset(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self::new(self.col + dx, self.row + dy)
    }

    pub fn distance(self, other: CellPos) -> f32 {
        let dx = (self.col - other.col) as f32;
        let dy = (self.row - other.row) as f32;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Pixel position of an agent's top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn step(self, dir: Direction, amount: f32) -> Self {
        let (dx, dy) = dir.delta();
        Self::new(self.x + dx as f32 * amount, self.y + dy as f32 * amount)
    }

    pub fn distance(self, other: Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn manhattan(self, other: Position) -> f32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// Ordered by precedence: an eaten ghost cannot be frightened again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostState {
    Normal,
    Vulnerable,
    Eaten,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementMode {
    Chase,
    Scatter,
    Frightened,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    Chaser,
    Ambusher,
    Wanderer,
    Erratic,
}

impl Personality {
    pub const ROSTER: [Personality; 4] = [
        Personality::Chaser,
        Personality::Ambusher,
        Personality::Wanderer,
        Personality::Erratic,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    OutOfLives,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    #[serde(rename = "animPhase")]
    pub anim_phase: u8,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    pub state: GhostState,
    pub mode: MovementMode,
    pub personality: Personality,
    #[serde(rename = "vulnerableTicks")]
    pub vulnerable_ticks: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    PointEaten {
        col: i32,
        row: i32,
    },
    PowerPelletEaten {
        col: i32,
        row: i32,
    },
    GhostEaten {
        #[serde(rename = "ghostId")]
        ghost_id: String,
        score: u32,
    },
    LifeLost {
        #[serde(rename = "ghostId")]
        ghost_id: String,
        lives: u32,
    },
    GhostsCollided {
        a: String,
        b: String,
    },
    GhostEnclosed {
        #[serde(rename = "ghostId")]
        ghost_id: String,
    },
    LevelCleared {
        level: u32,
    },
    LevelStarted {
        level: u32,
        seed: u32,
    },
    GameOver {
        reason: GameOverReason,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub level: u32,
    pub score: u32,
    pub lives: u32,
    pub width: i32,
    pub height: i32,
    #[serde(rename = "tileSize")]
    pub tile_size: f32,
    pub tiles: Vec<String>,
    #[serde(rename = "remainingCollectibles")]
    pub remaining_collectibles: usize,
    pub player: PlayerView,
    pub ghosts: Vec<GhostView>,
    pub events: Vec<RuntimeEvent>,
    #[serde(rename = "gameOver")]
    pub game_over: Option<GameOverReason>,
}
