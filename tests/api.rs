use std::net::SocketAddr;

use ballot::{build_router, state::State};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

async fn spawn_server() -> SocketAddr {
    let app = build_router(State::new());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("serve app")
    });

    addr
}

async fn send(
    addr: SocketAddr,
    method: &str,
    path: &str,
    forwarded_for: Option<&str>,
    body: Option<Value>,
) -> (u16, Value) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");

    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    if let Some(client) = forwarded_for {
        req.push_str(&format!("X-Forwarded-For: {client}\r\n"));
    }
    match body {
        Some(value) => {
            let payload = value.to_string();
            req.push_str(&format!(
                "Content-Type: application/json\r\nContent-Length: {}\r\n\r\n{payload}",
                payload.len()
            ));
        }
        None => req.push_str("\r\n"),
    }

    stream.write_all(req.as_bytes()).await.expect("write request");

    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("status");

    (status, serde_json::from_str(body).expect("json body"))
}

fn vote_payload(video_id: u32) -> Value {
    json!({
        "video_id": video_id,
        "social_follows": {
            "instagram": true,
            "linkedin": true,
            "twitter": true,
        }
    })
}

#[tokio::test]
async fn vote_dedup_and_analytics_flow() {
    let addr = spawn_server().await;

    let (status, body) = send(addr, "POST", "/vote", Some("198.51.100.1"), Some(vote_payload(3))).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Vote submitted successfully");
    assert_eq!(body["new_vote_count"], 1);

    // Same client, any video.
    let (status, body) = send(addr, "POST", "/vote", Some("198.51.100.1"), Some(vote_payload(5))).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "You have already voted");

    let (status, body) = send(addr, "POST", "/vote", Some("198.51.100.2"), Some(vote_payload(3))).await;
    assert_eq!(status, 200);
    assert_eq!(body["new_vote_count"], 2);

    let (status, body) = send(addr, "GET", "/votes", None, None).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["votes"]["3"], 2);
    assert_eq!(body["votes"]["1"], 0);
    assert_eq!(body["total_votes"], 2);

    let (status, body) = send(addr, "GET", "/analytics", None, None).await;
    assert_eq!(status, 200);
    let analytics = &body["analytics"];
    assert_eq!(analytics["total_votes"], 2);
    assert_eq!(analytics["total_participants"], 2);
    assert_eq!(analytics["vote_counts"]["3"], 2);
    assert_eq!(analytics["vote_percentages"]["3"], 100.0);
    assert_eq!(analytics["vote_percentages"]["1"], 0.0);
    assert_eq!(analytics["videos_count"], 6);
}

#[tokio::test]
async fn check_voted_reflects_votes() {
    let addr = spawn_server().await;

    let (status, body) = send(addr, "POST", "/check-voted", Some("198.51.100.9"), None).await;
    assert_eq!(status, 200);
    assert_eq!(body["has_voted"], false);

    send(addr, "POST", "/vote", Some("198.51.100.9"), Some(vote_payload(1))).await;

    let (status, body) = send(addr, "POST", "/check-voted", Some("198.51.100.9"), None).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["has_voted"], true);

    let (_, body) = send(addr, "POST", "/check-voted", Some("198.51.100.10"), None).await;
    assert_eq!(body["has_voted"], false);
}

#[tokio::test]
async fn vote_rejections() {
    let addr = spawn_server().await;

    let (status, body) = send(
        addr,
        "POST",
        "/vote",
        Some("198.51.100.20"),
        Some(json!({ "social_follows": { "instagram": true } })),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Video ID is required");

    let (status, body) = send(addr, "POST", "/vote", Some("198.51.100.20"), Some(vote_payload(99))).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Invalid video ID");

    let mut payload = vote_payload(2);
    payload["social_follows"]["twitter"] = json!(false);
    let (status, body) = send(addr, "POST", "/vote", Some("198.51.100.20"), Some(payload)).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Must follow on twitter");

    // None of the rejections counted.
    let (_, body) = send(addr, "GET", "/votes", None, None).await;
    assert_eq!(body["total_votes"], 0);
    let (_, body) = send(addr, "POST", "/check-voted", Some("198.51.100.20"), None).await;
    assert_eq!(body["has_voted"], false);
}

#[tokio::test]
async fn zero_votes_analytics() {
    let addr = spawn_server().await;

    let (status, body) = send(addr, "GET", "/analytics", None, None).await;
    assert_eq!(status, 200);
    let analytics = &body["analytics"];
    assert_eq!(analytics["total_votes"], 0);
    assert_eq!(analytics["total_participants"], 0);
    for id in 1..=6 {
        assert_eq!(analytics["vote_percentages"][id.to_string()], 0.0);
    }
}

#[tokio::test]
async fn social_verify_echoes_claims() {
    let addr = spawn_server().await;

    let (status, body) = send(
        addr,
        "POST",
        "/social-verify",
        None,
        Some(json!({ "platforms": { "instagram": true, "twitter": false } })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["verified_platforms"]["instagram"], true);
    assert_eq!(body["verified_platforms"]["twitter"], false);
}
