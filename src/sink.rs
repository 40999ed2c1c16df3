//! # Vote record sink
//!
//! Optional out-of-band destination for accepted votes, meant for
//! offline analysis. The store is the source of truth; the sink is
//! best-effort and a write failure never fails the vote.
//!
//! With `VOTE_RECORD_PATH` set, records are appended to that file as
//! JSON lines. Without it, each record is just logged.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::{config::Config, identity::ClientIdentity};

#[derive(Serialize, Clone)]
pub struct VoteRecord {
    pub timestamp: String,
    pub video_id: u32,
    pub client: ClientIdentity,
    pub social_follows: HashMap<String, bool>,
}

impl VoteRecord {
    pub fn new(
        video_id: u32,
        client: ClientIdentity,
        social_follows: HashMap<String, bool>,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            video_id,
            client,
            social_follows,
        }
    }
}

pub trait VoteSink: Send + Sync {
    fn record(&self, record: &VoteRecord);
}

/// Fallback when no record file is configured. Logs a truncated identity
/// so log lines stay useful without carrying the full digest around.
pub struct LogSink;

impl VoteSink for LogSink {
    fn record(&self, record: &VoteRecord) {
        info!(
            "Vote recorded: video {}, client {}..., follows {:?}",
            record.video_id,
            record.client.short(),
            record.social_follows
        );
    }
}

/// Appends one JSON line per vote to a local file.
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn append(&self, record: &VoteRecord) -> std::io::Result<()> {
        let line = serde_json::to_string(record)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")
    }
}

impl VoteSink for JsonlSink {
    fn record(&self, record: &VoteRecord) {
        if let Err(e) = self.append(record) {
            warn!("Failed to record vote to {}: {e}", self.path.display());
        }
    }
}

/// Resolved once at startup; handlers only ever see the trait object.
pub fn init_sink(config: &Config) -> Box<dyn VoteSink> {
    match &config.record_path {
        Some(path) => {
            info!("Recording votes to {}", path.display());
            Box::new(JsonlSink::new(path.clone()))
        }
        None => {
            info!("No vote record path configured, logging votes only");
            Box::new(LogSink)
        }
    }
}
