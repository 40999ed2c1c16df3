use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub video_count: u32,
    pub record_path: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("RUST_PORT", "1111"),
            video_count: try_load("VIDEO_COUNT", "6"),
            record_path: var("VOTE_RECORD_PATH").ok().map(PathBuf::from),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}
