//! Crimson: a small raycasting shooter with procedurally generated levels.
//!
//! The core (`grid`, `levelgen`, `game`) is plain data and pure updates; the
//! renderer paints into an owned framebuffer, and the egui app shell only
//! gathers input and presents frames.

#![warn(clippy::all, rust_2018_idioms)]

pub mod error;
pub mod game;
pub mod grid;
pub mod levelgen;
pub mod render;
pub mod settings;
pub mod ui;

mod app;
pub use app::CrimsonApp;
pub use error::{Error, Result};
