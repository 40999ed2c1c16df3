use std::{
    collections::{BTreeMap, HashMap},
    net::SocketAddr,
    sync::Arc,
};

use axum::{
    Json,
    extract::{ConnectInfo, State as AppState},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use tokio::task::spawn_blocking;

use crate::{
    error::AppError,
    identity::{ClientIdentity, client_address},
    sink::VoteRecord,
    state::State,
    store::Analytics,
};

#[derive(Deserialize)]
pub struct VoteRequest {
    video_id: Option<u32>,
    #[serde(default)]
    social_follows: HashMap<String, bool>,
}

#[derive(Deserialize)]
pub struct SocialVerifyRequest {
    #[serde(default)]
    platforms: HashMap<String, bool>,
}

#[derive(Serialize)]
pub struct VoteResponse {
    success: bool,
    message: &'static str,
    new_vote_count: u64,
}

#[derive(Serialize)]
pub struct VotesResponse {
    success: bool,
    votes: BTreeMap<u32, u64>,
    total_votes: u64,
}

#[derive(Serialize)]
pub struct CheckVotedResponse {
    success: bool,
    has_voted: bool,
}

#[derive(Serialize)]
pub struct SocialVerifyResponse {
    success: bool,
    verified_platforms: HashMap<String, bool>,
}

#[derive(Serialize)]
pub struct AnalyticsResponse {
    success: bool,
    analytics: Analytics,
}

pub async fn vote_handler(
    AppState(state): AppState<Arc<State>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<VoteRequest>,
) -> Result<Json<VoteResponse>, AppError> {
    let video_id = payload.video_id.ok_or(AppError::MissingVideoId)?;
    let identity = ClientIdentity::from_address(&client_address(&headers, peer));

    let new_vote_count =
        state
            .store
            .cast_vote(video_id, identity.clone(), &payload.social_follows)?;

    // Best-effort; the vote already counted, a sink failure stays local.
    let record = VoteRecord::new(video_id, identity, payload.social_follows);
    let sink_state = state.clone();
    spawn_blocking(move || sink_state.sink.record(&record));

    Ok(Json(VoteResponse {
        success: true,
        message: "Vote submitted successfully",
        new_vote_count,
    }))
}

pub async fn votes_handler(AppState(state): AppState<Arc<State>>) -> Json<VotesResponse> {
    let votes = state.store.counts();
    let total_votes = votes.values().sum();

    Json(VotesResponse {
        success: true,
        votes,
        total_votes,
    })
}

pub async fn check_voted_handler(
    AppState(state): AppState<Arc<State>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Json<CheckVotedResponse> {
    let identity = ClientIdentity::from_address(&client_address(&headers, peer));

    Json(CheckVotedResponse {
        success: true,
        has_voted: state.store.has_voted(&identity),
    })
}

/// Echoes the claimed platforms back. Claims are trusted, not checked
/// against the actual platforms.
pub async fn social_verify_handler(
    Json(payload): Json<SocialVerifyRequest>,
) -> Json<SocialVerifyResponse> {
    Json(SocialVerifyResponse {
        success: true,
        verified_platforms: payload.platforms,
    })
}

pub async fn analytics_handler(AppState(state): AppState<Arc<State>>) -> Json<AnalyticsResponse> {
    Json(AnalyticsResponse {
        success: true,
        analytics: state.store.analytics(),
    })
}
