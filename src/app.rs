//! Controller loop: owns the screen, the menu tree and the activity slot.
//!
//! Rendering happens only on this thread. Background activities that end on
//! their own raise the shared redraw flag instead of touching the screen,
//! and the loop repaints on the next poll.

use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread,
    time::Duration,
};

use anyhow::{Context, Result};

use crate::{
    config::UiConfig,
    display::open_screen,
    effects::{clear_cube, Lava, Rain},
    hal::{NullCube, SharedCube, SystemMetrics, TextScreen},
    input::{open_buttons, Button, EdgeDetector},
    menu::{Action, MenuId, MenuTree},
    render::{MenuRenderer, Palette},
    runner::TaskRunner,
    stats,
};

pub struct App {
    screen: Box<dyn TextScreen>,
    buttons: EdgeDetector,
    cube: SharedCube,
    tree: MenuTree,
    current: MenuId,
    renderer: MenuRenderer,
    runner: TaskRunner,
    redraw: Arc<AtomicBool>,
    poll_interval: Duration,
}

impl App {
    pub fn new(config: &UiConfig, root: &Path) -> Result<Self> {
        let screen = open_screen(config).context("opening display")?;
        let buttons = EdgeDetector::new(open_buttons(&config.pins).context("opening buttons")?);
        let cube: SharedCube = Arc::new(Mutex::new(NullCube));
        let palette = Palette::from_scheme(&config.colors);

        let metrics = stats::platform_metrics(&root.to_string_lossy());
        let hold = Duration::from_secs(config.timing.stats_hold_secs);
        let (tree, current) = build_menu(&cube, metrics, hold, palette);

        let redraw = Arc::new(AtomicBool::new(false));
        Ok(Self {
            screen,
            buttons,
            cube,
            tree,
            current,
            renderer: MenuRenderer::new(palette),
            runner: TaskRunner::new(Arc::clone(&redraw)),
            redraw,
            poll_interval: Duration::from_millis(config.timing.poll_interval_ms),
        })
    }

    pub fn run(&mut self) -> Result<()> {
        clear_cube(&self.cube).context("blanking LED surfaces")?;
        self.render();

        loop {
            if self.redraw.swap(false, Ordering::AcqRel) {
                self.render();
            }

            match self.buttons.poll_edge() {
                Ok(Some(button)) => self.handle_press(button),
                Ok(None) => {}
                Err(err) => tracing::warn!("button poll failed: {err:#}"),
            }

            thread::sleep(self.poll_interval);
        }
    }

    fn handle_press(&mut self, button: Button) {
        tracing::debug!(?button, "button edge");
        match button {
            Button::Top => self.tree.move_up(self.current),
            Button::Bottom => self.tree.move_down(self.current),
            Button::Middle => {
                match self
                    .tree
                    .activate(self.current, self.screen.as_mut(), &mut self.runner)
                {
                    Ok(next) => self.current = next,
                    Err(err) => tracing::error!("activation failed: {err:#}"),
                }
            }
        }
        self.render();
    }

    // Draw failures are logged, not propagated; a transient SPI error should
    // not take the whole UI down.
    fn render(&mut self) {
        if let Err(err) = self
            .renderer
            .draw(self.screen.as_mut(), &self.tree, self.current)
        {
            tracing::error!("menu draw failed: {err:#}");
        }
    }
}

fn build_menu(
    cube: &SharedCube,
    metrics: Box<dyn SystemMetrics>,
    stats_hold: Duration,
    palette: Palette,
) -> (MenuTree, MenuId) {
    let mut tree = MenuTree::new();
    let root = tree.add_menu(None, "Main Menu");

    let scripts = tree.add_menu(Some(root), "Scripts");
    let rain_cube = Arc::clone(cube);
    tree.add_item(
        scripts,
        "Rain",
        Action::Effect(Box::new(move || Box::new(Rain::new(Arc::clone(&rain_cube))))),
    );
    let lava_cube = Arc::clone(cube);
    tree.add_item(
        scripts,
        "Lava",
        Action::Effect(Box::new(move || Box::new(Lava::new(Arc::clone(&lava_cube))))),
    );

    tree.add_item(
        root,
        "Statistics",
        Action::Script(Box::new(move |screen| {
            stats::show_readout(screen, metrics.as_ref(), stats_hold, &palette)
        })),
    );

    (tree, root)
}
