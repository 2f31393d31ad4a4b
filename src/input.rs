//! Button input: raw GPIO sampling and once-per-press edge detection.
//!
//! The raw layer exposes, per button, a live pressed level and a
//! monotonically increasing press counter. The main loop samples hundreds of
//! times during one physical press; [`EdgeDetector`] latches the counter so
//! each press surfaces exactly one edge.

use anyhow::Result;

use crate::config::PinConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Top,
    Bottom,
    Middle,
}

impl Button {
    /// Fixed scan priority; simultaneous presses resolve to the first hit.
    pub const SCAN_ORDER: [Button; 3] = [Button::Top, Button::Bottom, Button::Middle];

    pub fn index(self) -> usize {
        match self {
            Button::Top => 0,
            Button::Bottom => 1,
            Button::Middle => 2,
        }
    }
}

/// Raw button state as maintained by the hardware layer.
pub trait RawButtons: Send {
    fn is_pressed(&mut self, button: Button) -> Result<bool>;
    fn press_count(&mut self, button: Button) -> u64;
}

/// Debounced input source: reports each physical press at most once.
pub struct EdgeDetector {
    raw: Box<dyn RawButtons>,
    last_count: [u64; 3],
}

impl EdgeDetector {
    /// Latches the current counters so presses from before startup are
    /// never replayed.
    pub fn new(mut raw: Box<dyn RawButtons>) -> Self {
        let last_count = [
            raw.press_count(Button::Top),
            raw.press_count(Button::Bottom),
            raw.press_count(Button::Middle),
        ];
        Self { raw, last_count }
    }

    /// At most one edge per call, in [`Button::SCAN_ORDER`] priority.
    pub fn poll_edge(&mut self) -> Result<Option<Button>> {
        for button in Button::SCAN_ORDER {
            let idx = button.index();
            let pressed = self.raw.is_pressed(button)?;
            let count = self.raw.press_count(button);
            if pressed && self.last_count[idx] != count {
                self.last_count[idx] = count;
                return Ok(Some(button));
            }
        }
        Ok(None)
    }
}

#[cfg(target_os = "linux")]
mod platform {
    use super::*;
    use anyhow::Context;
    use linux_embedded_hal::gpio_cdev::{Chip, LineHandle, LineRequestFlags};

    struct ButtonLine {
        handle: LineHandle,
        pressed: bool,
        count: u64,
    }

    impl ButtonLine {
        fn new(pin: u32, chip: &mut Chip) -> Result<Self> {
            let line = chip
                .get_line(pin)
                .with_context(|| format!("requesting GPIO line {}", pin))?;
            // Buttons are active-low with pull-ups configured in
            // /boot/config.txt; 1 is the unpressed resting state.
            let handle = line
                .request(LineRequestFlags::INPUT, 1, "glowcube-ui")
                .with_context(|| format!("configuring GPIO line {}", pin))?;
            Ok(Self {
                handle,
                pressed: false,
                count: 0,
            })
        }

        fn refresh(&mut self) -> Result<()> {
            let now = self.handle.get_value()? == 0;
            if now && !self.pressed {
                self.count += 1;
            }
            self.pressed = now;
            Ok(())
        }
    }

    /// GPIO-backed raw buttons; press counters advance on the falling edge
    /// observed while sampling.
    pub struct GpioButtons {
        lines: [ButtonLine; 3],
    }

    impl GpioButtons {
        pub fn new(pins: &PinConfig) -> Result<Self> {
            let mut chip = Chip::new("/dev/gpiochip0").context("opening GPIO chip")?;
            Ok(Self {
                lines: [
                    ButtonLine::new(pins.top_pin, &mut chip)?,
                    ButtonLine::new(pins.bottom_pin, &mut chip)?,
                    ButtonLine::new(pins.middle_pin, &mut chip)?,
                ],
            })
        }
    }

    impl RawButtons for GpioButtons {
        fn is_pressed(&mut self, button: Button) -> Result<bool> {
            let line = &mut self.lines[button.index()];
            line.refresh()?;
            Ok(line.pressed)
        }

        fn press_count(&mut self, button: Button) -> u64 {
            self.lines[button.index()].count
        }
    }

    pub fn open_buttons(pins: &PinConfig) -> Result<Box<dyn RawButtons>> {
        Ok(Box::new(GpioButtons::new(pins)?))
    }
}

#[cfg(not(target_os = "linux"))]
mod platform {
    use super::*;

    /// Inert pad for non-Linux development builds.
    pub struct StubButtons;

    impl RawButtons for StubButtons {
        fn is_pressed(&mut self, _button: Button) -> Result<bool> {
            Ok(false)
        }

        fn press_count(&mut self, _button: Button) -> u64 {
            0
        }
    }

    pub fn open_buttons(_pins: &PinConfig) -> Result<Box<dyn RawButtons>> {
        Ok(Box::new(StubButtons))
    }
}

pub use platform::open_buttons;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, Copy, Default)]
    struct PadState {
        pressed: bool,
        count: u64,
    }

    #[derive(Clone, Default)]
    struct FakePad {
        state: Arc<Mutex<[PadState; 3]>>,
    }

    impl FakePad {
        fn press(&self, button: Button) {
            let mut state = self.state.lock().unwrap();
            let slot = &mut state[button.index()];
            slot.pressed = true;
            slot.count += 1;
        }

        fn release(&self, button: Button) {
            self.state.lock().unwrap()[button.index()].pressed = false;
        }
    }

    impl RawButtons for FakePad {
        fn is_pressed(&mut self, button: Button) -> Result<bool> {
            Ok(self.state.lock().unwrap()[button.index()].pressed)
        }

        fn press_count(&mut self, button: Button) -> u64 {
            self.state.lock().unwrap()[button.index()].count
        }
    }

    #[test]
    fn one_press_yields_one_edge_across_600_polls() {
        let pad = FakePad::default();
        let mut detector = EdgeDetector::new(Box::new(pad.clone()));

        pad.press(Button::Top);
        let mut edges = 0;
        for _ in 0..600 {
            if detector.poll_edge().unwrap() == Some(Button::Top) {
                edges += 1;
            }
        }
        assert_eq!(edges, 1);

        pad.release(Button::Top);
        assert_eq!(detector.poll_edge().unwrap(), None);
    }

    #[test]
    fn each_distinct_press_is_reported() {
        let pad = FakePad::default();
        let mut detector = EdgeDetector::new(Box::new(pad.clone()));

        for _ in 0..5 {
            pad.press(Button::Middle);
            assert_eq!(detector.poll_edge().unwrap(), Some(Button::Middle));
            assert_eq!(detector.poll_edge().unwrap(), None);
            pad.release(Button::Middle);
        }
    }

    #[test]
    fn presses_before_startup_are_ignored() {
        let pad = FakePad::default();
        pad.press(Button::Bottom);
        let mut detector = EdgeDetector::new(Box::new(pad.clone()));
        assert_eq!(detector.poll_edge().unwrap(), None);
    }

    #[test]
    fn simultaneous_presses_resolve_by_priority() {
        let pad = FakePad::default();
        let mut detector = EdgeDetector::new(Box::new(pad.clone()));

        pad.press(Button::Middle);
        pad.press(Button::Bottom);
        pad.press(Button::Top);

        // Top wins the cycle; the others surface on later cycles.
        assert_eq!(detector.poll_edge().unwrap(), Some(Button::Top));
        assert_eq!(detector.poll_edge().unwrap(), Some(Button::Bottom));
        assert_eq!(detector.poll_edge().unwrap(), Some(Button::Middle));
        assert_eq!(detector.poll_edge().unwrap(), None);
    }

    #[test]
    fn released_button_with_stale_count_is_not_an_edge() {
        let pad = FakePad::default();
        let mut detector = EdgeDetector::new(Box::new(pad.clone()));

        // Count advances but the button reads released by the time we poll.
        pad.press(Button::Top);
        pad.release(Button::Top);
        assert_eq!(detector.poll_edge().unwrap(), None);

        // The edge is still latched away once the button reads pressed again.
        pad.press(Button::Top);
        assert_eq!(detector.poll_edge().unwrap(), Some(Button::Top));
    }
}
