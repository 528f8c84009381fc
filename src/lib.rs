pub mod autopilot;
pub mod config;
pub mod constants;
pub mod engine;
pub mod ghost;
pub mod grid;
pub mod maze;
pub mod mover;
pub mod player;
pub mod rng;
pub mod types;
