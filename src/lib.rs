// Library interface for glowcube-ui to enable unit testing
// This exposes internal modules for testing without requiring hardware

pub mod app;
pub mod config;
pub mod display;
pub mod effects;
pub mod hal;
pub mod input;
pub mod menu;
pub mod render;
pub mod runner;
pub mod stats;
pub mod util;
