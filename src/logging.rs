// Copyright (c) 2026 rezky_nightky

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

pub fn default_log_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("ghostgrid").join("logs").join("ghostgrid.log"))
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

pub fn init_file_logging() {
    let filter = env_filter("info");
    let opened = default_log_path().map(|p| (open_log_file(&p), p));

    match opened {
        Some((Ok(file), path)) => {
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .with(filter)
                .try_init();
            tracing::info!(path = %path.display(), "logging initialized");
        }
        // Writing to the terminal would tear the frame; go quiet instead.
        _ => {
            let _ = tracing_subscriber::registry().with(filter).try_init();
        }
    }
}

pub fn init_stderr_logging() {
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(env_filter("warn"))
        .try_init();
}
