//! # Ballot store
//!
//! The authoritative vote state: per-video counters plus the set of
//! client identities that have already voted.
//!
//! ## Requirements
//!
//! - One vote per client identity, ever
//! - Counters and the voted set must never disagree
//! - Handlers run concurrently, so check-then-act must be atomic
//!
//! ## Implementation
//!
//! Both pieces of state live behind a single mutex. A vote holds the
//! lock across the duplicate check, the counter increment, and the
//! identity insert, so two racing votes from the same client cannot
//! both pass the check. Nothing inside the lock does I/O; the vote
//! record sink runs after release.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use serde::Serialize;

use crate::{
    error::AppError::{self, AlreadyVoted, InvalidVideo, MissingRequirement},
    identity::ClientIdentity,
};

/// Platforms a voter must claim to follow, checked in this order.
/// The claims are client-supplied booleans and are trusted as-is.
pub const REQUIRED_PLATFORMS: [&str; 3] = ["instagram", "linkedin", "twitter"];

pub struct BallotStore {
    inner: Mutex<Inner>,
}

struct Inner {
    counts: BTreeMap<u32, u64>,
    voted: HashSet<ClientIdentity>,
}

/// Aggregate numbers for the results view.
///
/// Percentages are rounded per video independently, so they need not sum
/// to exactly 100.
#[derive(Serialize)]
pub struct Analytics {
    pub total_votes: u64,
    pub vote_counts: BTreeMap<u32, u64>,
    pub vote_percentages: BTreeMap<u32, f64>,
    pub total_participants: usize,
    pub videos_count: usize,
}

impl BallotStore {
    /// Registers video ids `1..=video_count` with zeroed counters. The id
    /// set is fixed for the lifetime of the store.
    pub fn new(video_count: u32) -> Self {
        Self {
            inner: Mutex::new(Inner {
                counts: (1..=video_count).map(|id| (id, 0)).collect(),
                voted: HashSet::new(),
            }),
        }
    }

    /// Records one vote, returning the video's new count.
    ///
    /// Checks run in the original frontend's order: unmet platform
    /// requirements first (the first missing platform is reported), then
    /// duplicate clients, then unknown video ids.
    pub fn cast_vote(
        &self,
        video_id: u32,
        identity: ClientIdentity,
        social_follows: &HashMap<String, bool>,
    ) -> Result<u64, AppError> {
        for platform in REQUIRED_PLATFORMS {
            if !social_follows.get(platform).copied().unwrap_or(false) {
                return Err(MissingRequirement(platform));
            }
        }

        let mut inner = self.inner.lock().unwrap();

        if inner.voted.contains(&identity) {
            return Err(AlreadyVoted);
        }

        let Some(count) = inner.counts.get_mut(&video_id) else {
            return Err(InvalidVideo);
        };

        *count += 1;
        let new_count = *count;
        inner.voted.insert(identity);

        Ok(new_count)
    }

    pub fn has_voted(&self, identity: &ClientIdentity) -> bool {
        self.inner.lock().unwrap().voted.contains(identity)
    }

    /// Snapshot of all counters, taken under the lock.
    pub fn counts(&self) -> BTreeMap<u32, u64> {
        self.inner.lock().unwrap().counts.clone()
    }

    pub fn analytics(&self) -> Analytics {
        let inner = self.inner.lock().unwrap();

        let total_votes: u64 = inner.counts.values().sum();
        let vote_percentages = inner
            .counts
            .iter()
            .map(|(&id, &count)| {
                let percentage = if total_votes > 0 {
                    round_one_decimal(count as f64 / total_votes as f64 * 100.0)
                } else {
                    0.0
                };
                (id, percentage)
            })
            .collect();

        Analytics {
            total_votes,
            vote_counts: inner.counts.clone(),
            vote_percentages,
            total_participants: inner.voted.len(),
            videos_count: inner.counts.len(),
        }
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
