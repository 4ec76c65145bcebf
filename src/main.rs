use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use webtable::AppConfig;

fn main() {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load configuration, using defaults: {err}");
            AppConfig::default()
        }
    };
    init_tracing(&config.log_level);

    let webview_data_dir = match webview_data_dir(&config) {
        Ok(dir) => Some(dir),
        Err(err) => {
            warn!(error = %format!("{err:#}"), "webview data directory unavailable");
            None
        }
    };

    let mut desktop = dioxus::desktop::Config::new()
        .with_window(dioxus::desktop::WindowBuilder::new().with_title("webtable"));
    if let Some(dir) = webview_data_dir {
        desktop = desktop.with_data_directory(dir);
    }

    dioxus::LaunchBuilder::desktop()
        .with_cfg(desktop)
        .with_context(config)
        .launch(webtable::ui::app::App);
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        error!(error = %err, "tracing subscriber already installed");
    }
}

fn webview_data_dir(config: &AppConfig) -> Result<PathBuf> {
    let dir = config.webview_data_dir()?;
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create webview data dir: {}", dir.display()))?;
    Ok(dir)
}
