pub mod args;
pub mod augment;
pub mod callbacks;
pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod font;
pub mod frame;
pub mod generator;
pub mod labels;
pub mod model;
pub mod output;
pub mod preview;
pub mod split;
pub mod trainer;
pub mod types;

use tracing_subscriber::EnvFilter;

/// Console logging for the binaries. `GAZE_LOG` overrides the default `info` filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("GAZE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
