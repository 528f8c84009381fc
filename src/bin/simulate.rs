use chrono::{SecondsFormat, Utc};
use clap::Parser;
use log::{LevelFilter, Log, Metadata, Record};
use pacdevs::autopilot::Autopilot;
use pacdevs::config::{load_options, GameOptions};
use pacdevs::engine::GameEngine;
use pacdevs::types::{GameOverReason, RuntimeEvent, Snapshot};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long, default_value_t = 3_000)]
    ticks: u64,
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long)]
    level: Option<u32>,
    #[arg(long)]
    block_width: Option<i32>,
    #[arg(long)]
    block_height: Option<i32>,
    #[arg(long)]
    ghosts: Option<usize>,
    #[arg(long)]
    lives: Option<u32>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
    #[arg(long)]
    snapshot_out: Option<PathBuf>,
    #[arg(long, default_value = "info")]
    log_level: String,
    #[arg(long)]
    match_id: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Default, Serialize)]
struct EventTally {
    #[serde(rename = "pointsEaten")]
    points_eaten: u32,
    #[serde(rename = "pelletsEaten")]
    pellets_eaten: u32,
    #[serde(rename = "ghostsEaten")]
    ghosts_eaten: u32,
    #[serde(rename = "livesLost")]
    lives_lost: u32,
    #[serde(rename = "ghostCollisions")]
    ghost_collisions: u32,
    #[serde(rename = "levelsCleared")]
    levels_cleared: u32,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    seed: u32,
    #[serde(rename = "finalTick")]
    final_tick: u64,
    #[serde(rename = "levelReached")]
    level_reached: u32,
    score: u32,
    lives: u32,
    reason: Option<GameOverReason>,
    events: EventTally,
    anomalies: Vec<String>,
}

struct RunResult {
    summary: RunSummary,
    anomaly_records: Vec<AnomalyRecord>,
    final_snapshot: Snapshot,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    timestamp: String,
    level: String,
    event: String,
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

/// Routes the core's `log` records through the same JSON line writer.
struct JsonLogger {
    match_id: String,
    level: LevelFilter,
}

impl Log for JsonLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        emit_log(
            &record.level().as_str().to_lowercase(),
            "core_log",
            &self.match_id,
            None,
            json!({
                "target": record.target(),
                "message": record.args().to_string(),
            }),
        );
    }

    fn flush(&self) {}
}

fn main() {
    let cli = Cli::parse();
    let started_at = timestamp();
    let seed = cli.seed.unwrap_or_else(|| now_ms() as u32);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed, now_ms()));

    let level = parse_log_level(&cli.log_level);
    if log::set_boxed_logger(Box::new(JsonLogger {
        match_id: match_id.clone(),
        level,
    }))
    .is_ok()
    {
        log::set_max_level(level);
    }

    let options = match resolve_options(&cli, seed) {
        Ok(options) => options,
        Err(error) => {
            emit_log(
                "error",
                "config_load_failed",
                &match_id,
                None,
                json!({
                    "path": cli.config.as_ref().map(|path| path.to_string_lossy().to_string()),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
    };

    emit_log(
        "info",
        "run_started",
        &match_id,
        None,
        json!({
            "ticks": cli.ticks,
            "options": options,
        }),
    );

    let result = run_simulation(&options, cli.ticks, &match_id);
    let mut summary = result.summary;
    summary.started_at = started_at;
    summary.finished_at = timestamp();

    for anomaly in &result.anomaly_records {
        emit_log(
            "warn",
            "anomaly_detected",
            &match_id,
            Some(anomaly.tick),
            json!({
                "message": anomaly.message,
            }),
        );
    }

    let mut outputs_written: Vec<String> = Vec::new();
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_json(path, &summary) {
            fail_write("summary_write_failed", &match_id, path, &error);
        }
        outputs_written.push(path.to_string_lossy().to_string());
    }
    if let Some(path) = cli.snapshot_out.as_ref() {
        if let Err(error) = write_json(path, &result.final_snapshot) {
            fail_write("snapshot_write_failed", &match_id, path, &error);
        }
        outputs_written.push(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &match_id,
        Some(summary.final_tick),
        json!({
            "levelReached": summary.level_reached,
            "score": summary.score,
            "lives": summary.lives,
            "reason": summary.reason,
            "anomalyCount": result.anomaly_records.len(),
            "outputs": outputs_written,
        }),
    );

    println!(
        "{}",
        serde_json::to_string(&summary).expect("run summary should serialize")
    );

    if !summary.anomalies.is_empty() {
        std::process::exit(1);
    }
}

fn resolve_options(cli: &Cli, seed: u32) -> io::Result<GameOptions> {
    let mut options = match cli.config.as_deref() {
        Some(path) => load_options(path)?,
        None => GameOptions::default(),
    };
    options.seed = Some(cli.seed.or(options.seed).unwrap_or(seed));
    if let Some(level) = cli.level {
        options.level = level;
    }
    if let Some(width) = cli.block_width {
        options.block_width = width;
    }
    if let Some(height) = cli.block_height {
        options.block_height = height;
    }
    if let Some(ghosts) = cli.ghosts {
        options.ghost_count = ghosts;
    }
    if let Some(lives) = cli.lives {
        options.lives = lives;
    }
    Ok(options.normalized())
}

fn run_simulation(options: &GameOptions, ticks: u64, match_id: &str) -> RunResult {
    let seed = options.seed.unwrap_or_default();
    let mut engine = GameEngine::new(options.clone());
    let mut autopilot = Autopilot::new(seed);
    let mut tally = EventTally::default();
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut last_score = 0u32;
    let mut last_tick = 0u64;

    for _ in 0..ticks {
        if engine.is_ended() {
            break;
        }
        let dir = autopilot.choose(engine.player(), engine.ghosts(), engine.grid());
        engine.set_input(dir);
        engine.step();
        let snapshot = engine.build_snapshot(true);
        last_tick = snapshot.tick;

        let mut messages = collect_snapshot_anomalies(&snapshot, options.lives);
        if snapshot.score < last_score {
            messages.push(format!("score went down: {last_score} -> {}", snapshot.score));
        }
        last_score = snapshot.score;
        for message in messages {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }

        for event in &snapshot.events {
            match event {
                RuntimeEvent::PointEaten { .. } => tally.points_eaten += 1,
                RuntimeEvent::PowerPelletEaten { .. } => tally.pellets_eaten += 1,
                RuntimeEvent::GhostEaten { .. } => tally.ghosts_eaten += 1,
                RuntimeEvent::LifeLost { .. } => tally.lives_lost += 1,
                RuntimeEvent::GhostsCollided { .. } => tally.ghost_collisions += 1,
                RuntimeEvent::GhostEnclosed { ghost_id } => push_anomaly(
                    &mut anomalies,
                    &mut anomaly_records,
                    &mut anomaly_seen,
                    snapshot.tick,
                    format!("ghost enclosed: {ghost_id}"),
                ),
                RuntimeEvent::LevelCleared { level } => {
                    tally.levels_cleared += 1;
                    emit_log(
                        "info",
                        "level_cleared",
                        match_id,
                        Some(snapshot.tick),
                        json!({
                            "level": level,
                            "score": snapshot.score,
                        }),
                    );
                }
                RuntimeEvent::LevelStarted { .. } | RuntimeEvent::GameOver { .. } => {}
            }
        }
    }

    let final_snapshot = engine.build_snapshot(false);
    RunResult {
        summary: RunSummary {
            match_id: match_id.to_string(),
            started_at: String::new(),
            finished_at: String::new(),
            seed,
            final_tick: last_tick,
            level_reached: engine.level(),
            score: engine.score(),
            lives: engine.lives(),
            reason: engine.end_reason(),
            events: tally,
            anomalies,
        },
        anomaly_records,
        final_snapshot,
    }
}

fn collect_snapshot_anomalies(snapshot: &Snapshot, starting_lives: u32) -> Vec<String> {
    let mut anomalies = Vec::new();
    if snapshot.lives > starting_lives {
        anomalies.push(format!("lives above start: {}", snapshot.lives));
    }

    let listed = snapshot
        .tiles
        .iter()
        .flat_map(|row| row.chars())
        .filter(|ch| *ch == '.' || *ch == 'o')
        .count();
    if listed != snapshot.remaining_collectibles {
        anomalies.push(format!(
            "collectible count mismatch: {listed} drawn, {} tracked",
            snapshot.remaining_collectibles
        ));
    }

    let player = tile_under(snapshot, snapshot.player.x, snapshot.player.y);
    if matches!(player, Some('#') | Some('=')) {
        anomalies.push("player inside a wall or the den".to_string());
    }
    for ghost in &snapshot.ghosts {
        if tile_under(snapshot, ghost.x, ghost.y) == Some('#') {
            anomalies.push(format!("ghost inside a wall: {}", ghost.id));
        }
    }
    anomalies
}

fn tile_under(snapshot: &Snapshot, x: f32, y: f32) -> Option<char> {
    let half = snapshot.tile_size / 2.0;
    let col = ((x + half) / snapshot.tile_size).floor();
    let row = ((y + half) / snapshot.tile_size).floor();
    if col < 0.0 || row < 0.0 {
        return None;
    }
    snapshot
        .tiles
        .get(row as usize)
        .and_then(|line| line.chars().nth(col as usize))
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn parse_log_level(value: &str) -> LevelFilter {
    value.parse().unwrap_or(LevelFilter::Info)
}

fn default_match_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn fail_write(event: &str, match_id: &str, path: &Path, error: &io::Error) -> ! {
    emit_log(
        "error",
        event,
        match_id,
        None,
        json!({
            "path": path.to_string_lossy(),
            "error": error.to_string(),
        }),
    );
    std::process::exit(2);
}

fn emit_log(level: &str, event: &str, match_id: &str, tick: Option<u64>, details: Value) {
    let log_line = StructuredLogLine {
        timestamp: timestamp(),
        level: level.to_string(),
        event: event.to_string(),
        match_id: match_id.to_string(),
        tick,
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text)
}
