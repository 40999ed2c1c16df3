//! # Client identity
//!
//! Privacy-preserving client identifiers.
//!
//! Votes are deduplicated per network address, but raw addresses never
//! enter the store. Each address is reduced to a one-way SHA-256 digest
//! once, at the HTTP boundary, and only the digest travels further.

use std::net::SocketAddr;

use axum::http::HeaderMap;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// One-way digest of a client's network address.
///
/// Same address in, same identity out. The digest is not reversible, so
/// the voted set never holds anything that identifies a client directly.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    pub fn from_address(raw: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(raw.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    /// First 8 hex chars, for log lines that should not carry the full digest.
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

/// Resolve the client address for a request.
///
/// Behind the reverse proxy the peer address is the proxy itself, so
/// `X-Forwarded-For` wins when present. Only the first entry counts; the
/// rest of the chain is proxy hops.
pub fn client_address(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|addr| addr.trim().to_string())
        .unwrap_or_else(|| peer.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let a = ClientIdentity::from_address("203.0.113.7");
        let b = ClientIdentity::from_address("203.0.113.7");
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_addresses() {
        let a = ClientIdentity::from_address("203.0.113.7");
        let b = ClientIdentity::from_address("203.0.113.8");
        assert_ne!(a, b);
    }

    #[test]
    fn test_digest_shape() {
        let id = ClientIdentity::from_address("10.0.0.1");
        assert_eq!(id.0.len(), 64);
        assert!(id.0.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id.short().len(), 8);
    }

    #[test]
    fn test_forwarded_for_first_entry() {
        let peer: SocketAddr = "127.0.0.1:9999".parse().unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.2".parse().unwrap());
        assert_eq!(client_address(&headers, peer), "203.0.113.7");

        let empty = HeaderMap::new();
        assert_eq!(client_address(&empty, peer), "127.0.0.1");
    }
}
