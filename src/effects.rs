//! LED animations that run as background activities.

use std::time::Duration;

use anyhow::Result;
use noise::{NoiseFn, OpenSimplex};
use rand::Rng;

use crate::{
    hal::{hsv_color, LedCube, Rgb, SharedCube},
    runner::{Activity, StepOutcome},
};

pub const PANEL_WIDTH: usize = 16;
pub const PANEL_HEIGHT: usize = 8;
pub const CUBE_SIZE: usize = 9;

const RAIN_DECAY: f32 = 0.4;
const RAIN_SPAWN_CHANCE: f64 = 0.1;
const RAIN_HUE: f32 = 0.6;
const RAIN_FRAME: Duration = Duration::from_nanos(1_000_000_000 / 15);
const LAVA_FRAME: Duration = Duration::from_nanos(1_000_000_000 / 30);

/// Falling blue streaks on the 16x8 panel.
///
/// Each frame shifts the brightness field down one row, fades the copied
/// values, and seeds the top row with fresh full-brightness drops.
pub struct Rain {
    cube: SharedCube,
    brightness: [[f32; PANEL_WIDTH]; PANEL_HEIGHT],
}

impl Rain {
    pub fn new(cube: SharedCube) -> Self {
        Self {
            cube,
            brightness: [[0.0; PANEL_WIDTH]; PANEL_HEIGHT],
        }
    }

    fn advance(&mut self, rng: &mut impl Rng) {
        for y in (1..PANEL_HEIGHT).rev() {
            for x in 0..PANEL_WIDTH {
                self.brightness[y][x] = self.brightness[y - 1][x] * (1.0 - RAIN_DECAY);
            }
        }
        for x in 0..PANEL_WIDTH {
            self.brightness[0][x] = if rng.gen_bool(RAIN_SPAWN_CHANCE) {
                1.0
            } else {
                0.0
            };
        }
    }

    fn frame(&self) -> Vec<(u8, u8, Rgb)> {
        let mut leds = Vec::with_capacity(PANEL_WIDTH * PANEL_HEIGHT);
        for y in 0..PANEL_HEIGHT {
            for x in 0..PANEL_WIDTH {
                leds.push((
                    x as u8,
                    y as u8,
                    hsv_color(RAIN_HUE, 1.0, self.brightness[y][x]),
                ));
            }
        }
        leds
    }
}

impl Activity for Rain {
    fn name(&self) -> &'static str {
        "rain"
    }

    fn step(&mut self) -> Result<StepOutcome> {
        self.advance(&mut rand::thread_rng());
        let leds = self.frame();
        self.cube
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .set_leds(&leds)?;
        std::thread::sleep(RAIN_FRAME);
        Ok(StepOutcome::Continue)
    }
}

/// Slow color drift over the visible shell of the 9x9x9 volume.
///
/// Hue comes from a 4-D noise field sampled at the voxel position plus a
/// time axis, so the pattern flows rather than flickers. Interior voxels
/// are skipped; only the three far faces are visible on the device.
pub struct Lava {
    cube: SharedCube,
    noise: OpenSimplex,
    tick: u64,
}

impl Lava {
    pub fn new(cube: SharedCube) -> Self {
        Self {
            cube,
            noise: OpenSimplex::new(rand::thread_rng().gen()),
            tick: 0,
        }
    }

    fn frame(&self) -> Vec<(u8, u8, u8, Rgb)> {
        let t = self.tick as f64 * 0.05;
        let max = (CUBE_SIZE - 1) as u8;
        let mut voxels = Vec::new();
        for x in 0..CUBE_SIZE as u8 {
            for y in 0..CUBE_SIZE as u8 {
                for z in 0..CUBE_SIZE as u8 {
                    if x != max && y != max && z != max {
                        continue;
                    }
                    let sample = self.noise.get([
                        f64::from(x) * 0.1,
                        f64::from(y) * 0.1,
                        f64::from(z) * 0.1,
                        t,
                    ]);
                    // Samples sit in roughly [-1, 1]; fold into a hue.
                    let hue = (sample as f32 + 1.0) / 2.0;
                    voxels.push((x, y, z, hsv_color(hue, 1.0, 1.0)));
                }
            }
        }
        voxels
    }
}

impl Activity for Lava {
    fn name(&self) -> &'static str {
        "lava"
    }

    fn step(&mut self) -> Result<StepOutcome> {
        let voxels = self.frame();
        self.cube
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .set_voxels(&voxels)?;
        self.tick += 1;
        std::thread::sleep(LAVA_FRAME);
        Ok(StepOutcome::Continue)
    }
}

/// Blank every LED surface. Used when an effect is replaced or on shutdown.
pub fn clear_cube(cube: &SharedCube) -> Result<()> {
    cube.lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .set_all(Rgb::BLACK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct FrameLog {
        led_frames: Vec<Vec<(u8, u8, Rgb)>>,
        voxel_frames: Vec<Vec<(u8, u8, u8, Rgb)>>,
        cleared: usize,
    }

    #[derive(Clone, Default)]
    struct FakeCube(Arc<Mutex<FrameLog>>);

    impl LedCube for FakeCube {
        fn set_all(&mut self, _color: Rgb) -> Result<()> {
            self.0.lock().unwrap().cleared += 1;
            Ok(())
        }

        fn set_leds(&mut self, leds: &[(u8, u8, Rgb)]) -> Result<()> {
            self.0.lock().unwrap().led_frames.push(leds.to_vec());
            Ok(())
        }

        fn set_voxels(&mut self, voxels: &[(u8, u8, u8, Rgb)]) -> Result<()> {
            self.0.lock().unwrap().voxel_frames.push(voxels.to_vec());
            Ok(())
        }
    }

    fn shared(fake: &FakeCube) -> SharedCube {
        Arc::new(Mutex::new(fake.clone()))
    }

    #[test]
    fn rain_writes_the_full_panel_every_step() {
        let fake = FakeCube::default();
        let mut rain = Rain::new(shared(&fake));

        assert_eq!(rain.step().unwrap(), StepOutcome::Continue);

        let log = fake.0.lock().unwrap();
        assert_eq!(log.led_frames.len(), 1);
        assert_eq!(log.led_frames[0].len(), PANEL_WIDTH * PANEL_HEIGHT);
    }

    #[test]
    fn rain_drops_fall_and_fade() {
        let fake = FakeCube::default();
        let mut rain = Rain::new(shared(&fake));
        rain.brightness[0][3] = 1.0;

        // StepRng stuck at u64::MAX never passes the spawn check, so the
        // advance is fully deterministic.
        let mut rng = rand::rngs::mock::StepRng::new(u64::MAX, 0);
        rain.advance(&mut rng);

        assert_eq!(rain.brightness[0][3], 0.0);
        assert!((rain.brightness[1][3] - 0.6).abs() < 1e-6);
        assert_eq!(rain.brightness[2][3], 0.0);

        rain.advance(&mut rng);
        assert!((rain.brightness[2][3] - 0.36).abs() < 1e-6);
    }

    #[test]
    fn rain_uses_the_blue_hue_scaled_by_brightness() {
        let fake = FakeCube::default();
        let mut rain = Rain::new(shared(&fake));
        rain.brightness[4][7] = 1.0;

        let frame = rain.frame();
        let lit = frame
            .iter()
            .find(|(x, y, _)| *x == 7 && *y == 4)
            .copied()
            .unwrap();
        assert_eq!(lit.2, hsv_color(RAIN_HUE, 1.0, 1.0));

        let dark = frame
            .iter()
            .find(|(x, y, _)| *x == 0 && *y == 0)
            .copied()
            .unwrap();
        assert_eq!(dark.2, Rgb::BLACK);
    }

    #[test]
    fn lava_touches_only_the_three_visible_faces() {
        let fake = FakeCube::default();
        let mut lava = Lava::new(shared(&fake));

        assert_eq!(lava.step().unwrap(), StepOutcome::Continue);

        let log = fake.0.lock().unwrap();
        let frame = &log.voxel_frames[0];
        // 9^3 minus the 8^3 interior block.
        assert_eq!(frame.len(), 9 * 9 * 9 - 8 * 8 * 8);
        for (x, y, z, _) in frame {
            assert!(*x == 8 || *y == 8 || *z == 8);
        }
    }

    #[test]
    fn lava_colors_drift_between_frames() {
        let fake = FakeCube::default();
        let mut lava = Lava::new(shared(&fake));
        lava.step().unwrap();
        lava.step().unwrap();

        let log = fake.0.lock().unwrap();
        assert_eq!(log.voxel_frames.len(), 2);
        // The time axis moved, so at least one voxel should change color.
        assert_ne!(log.voxel_frames[0], log.voxel_frames[1]);
    }

    #[test]
    fn clear_cube_blanks_everything() {
        let fake = FakeCube::default();
        let cube = shared(&fake);
        clear_cube(&cube).unwrap();
        assert_eq!(fake.0.lock().unwrap().cleared, 1);
    }
}
