//! Capability traits for the hardware the runtime talks to.
//!
//! The menu core only ever sees these traits; concrete backends live in
//! `display`, `input` and `stats`. Effects receive a shared [`LedCube`]
//! handle so the supervisor thread can drive the panels without touching
//! the text screen.

use std::sync::{Arc, Mutex};

use anyhow::Result;

/// 24-bit color as the HAL currency; backends convert to their native depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Hue/saturation/value to [`Rgb`], all components in `0.0..=1.0`.
///
/// Hue wraps, so noise fields can feed it raw values; saturation and value
/// are clamped.
pub fn hsv_color(h: f32, s: f32, v: f32) -> Rgb {
    let h = h.rem_euclid(1.0) * 6.0;
    let s = s.clamp(0.0, 1.0);
    let v = v.clamp(0.0, 1.0);

    let sector = h.floor();
    let f = h - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match sector as u8 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    Rgb::new(
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
    )
}

/// Text rendering style for a row; the backend picks the matching font face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Normal,
    Highlight,
}

/// The back text screen, addressed in pixels.
pub trait TextScreen: Send {
    fn write_text(
        &mut self,
        x: i32,
        y: i32,
        text: &str,
        style: TextStyle,
        fg: Rgb,
        bg: Rgb,
    ) -> Result<()>;

    fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Rgb) -> Result<()>;
}

/// The front LED surfaces: a 16x8 panel and a 9x9x9 voxel volume.
///
/// Only background activities write here; the menu renderer never does.
pub trait LedCube: Send {
    fn set_all(&mut self, color: Rgb) -> Result<()>;
    fn set_leds(&mut self, leds: &[(u8, u8, Rgb)]) -> Result<()>;
    fn set_voxels(&mut self, voxels: &[(u8, u8, u8, Rgb)]) -> Result<()>;
}

/// Shared handle handed to effect activities. Uncontended in practice:
/// the supervisor guarantees a single activity at a time.
pub type SharedCube = Arc<Mutex<dyn LedCube>>;

/// Synchronous system metrics for the statistics readout.
pub trait SystemMetrics: Send + Sync {
    fn ip_address(&self) -> String;
    fn cpu_temp(&self) -> f32;
    fn cpu_percent(&self) -> f32;
    fn ram_percent(&self) -> f32;
    fn disk_percent(&self) -> f32;
}

/// Placeholder panel used until a real driver is wired up; frames are
/// dropped after a trace log so effects stay runnable on a bare board.
pub struct NullCube;

impl LedCube for NullCube {
    fn set_all(&mut self, color: Rgb) -> Result<()> {
        tracing::trace!(?color, "cube set_all (no panel attached)");
        Ok(())
    }

    fn set_leds(&mut self, leds: &[(u8, u8, Rgb)]) -> Result<()> {
        tracing::trace!(count = leds.len(), "cube set_leds (no panel attached)");
        Ok(())
    }

    fn set_voxels(&mut self, voxels: &[(u8, u8, u8, Rgb)]) -> Result<()> {
        tracing::trace!(count = voxels.len(), "cube set_voxels (no panel attached)");
        Ok(())
    }
}
