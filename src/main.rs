use std::path::PathBuf;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use glowcube_ui::{app::App, config::UiConfig};

const DEFAULT_ROOT: &str = "/root/glowcube";

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_env("GLOWCUBE_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let root = std::env::var("GLOWCUBE_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_ROOT));
    let config = UiConfig::load(&root.join("ui_conf.json"))?;

    let span = tracing::info_span!("glowcube-ui");
    let _span_guard = span.enter();

    App::new(&config, &root)?.run()
}
