//! Text screen driver.
//!
//! On Linux this talks to an ST7789 320x240 panel over /dev/spidev0.0 with
//! character-cell GPIO lines for data/command, reset and backlight. On
//! other targets a logging stub stands in so the controller loop can be
//! exercised off-device.

use anyhow::Result;

use crate::{config::UiConfig, hal::TextScreen};
#[cfg(target_os = "linux")]
use crate::render::Palette;

#[cfg(target_os = "linux")]
mod platform {
    use anyhow::{anyhow, Context, Result};
    use display_interface_spi::SPIInterface;
    use embedded_graphics::{
        mono_font::{
            ascii::{FONT_9X18, FONT_9X18_BOLD},
            MonoTextStyleBuilder,
        },
        pixelcolor::{Rgb565, Rgb888},
        prelude::*,
        primitives::{PrimitiveStyle, Rectangle},
        text::{Baseline, Text},
    };
    use linux_embedded_hal::{
        gpio_cdev::{Chip, LineRequestFlags},
        spidev::{SpiModeFlags, SpidevOptions},
        CdevPin, Delay, SpidevDevice,
    };
    use mipidsi::{
        models::ST7789,
        options::{Orientation, Rotation},
        Builder, Display,
    };

    use crate::{
        hal::{Rgb, TextScreen, TextStyle},
        render::{Palette, SCREEN_HEIGHT_PX, SCREEN_WIDTH_PX},
    };

    const SPI_DEVICE: &str = "/dev/spidev0.0";
    const SPI_SPEED_HZ: u32 = 4_000_000;
    const DC_PIN: u32 = 25;
    const RST_PIN: u32 = 27;
    const BACKLIGHT_PIN: u32 = 24;

    type Panel = Display<SPIInterface<SpidevDevice, CdevPin>, ST7789, CdevPin>;

    pub struct St7789Screen {
        panel: Panel,
        // Keeps the backlight line reserved for the screen's lifetime.
        #[allow(dead_code)]
        backlight: CdevPin,
    }

    impl St7789Screen {
        pub fn open(palette: &Palette) -> Result<Self> {
            let mut spi = SpidevDevice::open(SPI_DEVICE).context("opening SPI device")?;
            let options = SpidevOptions::new()
                .bits_per_word(8)
                .max_speed_hz(SPI_SPEED_HZ)
                .mode(SpiModeFlags::SPI_MODE_0)
                .build();
            spi.configure(&options).context("configuring SPI")?;

            let mut chip = Chip::new("/dev/gpiochip0").context("opening GPIO chip")?;
            let dc = CdevPin::new(
                chip.get_line(DC_PIN)
                    .context("getting DC line")?
                    .request(LineRequestFlags::OUTPUT, 0, "glowcube-dc")
                    .context("requesting DC line")?,
            )
            .context("creating DC pin")?;
            let rst = CdevPin::new(
                chip.get_line(RST_PIN)
                    .context("getting RST line")?
                    .request(LineRequestFlags::OUTPUT, 0, "glowcube-rst")
                    .context("requesting RST line")?,
            )
            .context("creating RST pin")?;
            let backlight = CdevPin::new(
                chip.get_line(BACKLIGHT_PIN)
                    .context("getting backlight line")?
                    .request(LineRequestFlags::OUTPUT, 1, "glowcube-bl")
                    .context("requesting backlight line")?,
            )
            .context("creating backlight pin")?;

            let mut delay = Delay {};
            // The panel is 240x320 native; rotating 90 degrees gives the
            // landscape 320x240 the layout expects.
            let mut panel = Builder::new(ST7789, SPIInterface::new(spi, dc))
                .reset_pin(rst)
                .display_size(SCREEN_HEIGHT_PX as u16, SCREEN_WIDTH_PX as u16)
                .orientation(Orientation::new().rotate(Rotation::Deg90))
                .init(&mut delay)
                .map_err(|e| anyhow!("LCD init failed: {e:?}"))?;

            Rectangle::new(
                Point::new(0, 0),
                Size::new(SCREEN_WIDTH_PX, SCREEN_HEIGHT_PX),
            )
            .into_styled(PrimitiveStyle::with_fill(to_rgb565(palette.background)))
            .draw(&mut panel)
            .map_err(|e| anyhow!("LCD clear failed: {e:?}"))?;

            Ok(Self { panel, backlight })
        }
    }

    fn to_rgb565(color: Rgb) -> Rgb565 {
        Rgb888::new(color.r, color.g, color.b).into()
    }

    impl TextScreen for St7789Screen {
        fn write_text(
            &mut self,
            x: i32,
            y: i32,
            text: &str,
            style: TextStyle,
            fg: Rgb,
            bg: Rgb,
        ) -> Result<()> {
            let font = match style {
                TextStyle::Normal => &FONT_9X18,
                TextStyle::Highlight => &FONT_9X18_BOLD,
            };
            let mono = MonoTextStyleBuilder::new()
                .font(font)
                .text_color(to_rgb565(fg))
                .background_color(to_rgb565(bg))
                .build();
            Text::with_baseline(text, Point::new(x, y), mono, Baseline::Top)
                .draw(&mut self.panel)
                .map_err(|e| anyhow!("LCD text draw failed: {e:?}"))?;
            Ok(())
        }

        fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Rgb) -> Result<()> {
            Rectangle::new(Point::new(x, y), Size::new(width, height))
                .into_styled(PrimitiveStyle::with_fill(to_rgb565(color)))
                .draw(&mut self.panel)
                .map_err(|e| anyhow!("LCD fill failed: {e:?}"))?;
            Ok(())
        }
    }
}

#[cfg(target_os = "linux")]
pub fn open_screen(config: &UiConfig) -> Result<Box<dyn TextScreen>> {
    let palette = Palette::from_scheme(&config.colors);
    Ok(Box::new(platform::St7789Screen::open(&palette)?))
}

#[cfg(not(target_os = "linux"))]
pub fn open_screen(_config: &UiConfig) -> Result<Box<dyn TextScreen>> {
    use crate::hal::{Rgb, TextStyle};

    struct NullScreen;

    impl TextScreen for NullScreen {
        fn write_text(
            &mut self,
            x: i32,
            y: i32,
            text: &str,
            _style: TextStyle,
            _fg: Rgb,
            _bg: Rgb,
        ) -> Result<()> {
            tracing::debug!(x, y, text, "screen write (no panel attached)");
            Ok(())
        }

        fn fill_rect(&mut self, _x: i32, _y: i32, _w: u32, _h: u32, _color: Rgb) -> Result<()> {
            Ok(())
        }
    }

    tracing::warn!("no display backend on this target, using null screen");
    Ok(Box::new(NullScreen))
}
