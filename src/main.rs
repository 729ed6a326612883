mod app;
mod config;
mod hold;
mod input;
mod layout;
mod model;
mod quest;
mod render;
mod results;

use anyhow::Result;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let paths = config::project_paths()?;
    init_tracing(&paths.trace_path);
    info!(version = env!("CARGO_PKG_VERSION"), "allocation quest starting");
    app::run(paths)
}

// The terminal belongs to the game screen, so traces go to a file. Without
// one the game still runs, just untraced.
fn init_tracing(path: &Path) {
    let Some(file) = open_trace_file(path) else {
        return;
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .compact()
        .init();
}

fn open_trace_file(path: &Path) -> Option<File> {
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(f) => Some(f),
        Err(e) => {
            eprintln!("tracing disabled, cannot open {}: {e}", path.display());
            None
        }
    }
}
