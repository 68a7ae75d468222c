//! Caller access control: AI-consent gate and request rate limiting.
//!
//! Both checks run before any expensive work starts. The consent flag lives
//! in an external account system; here it is a trait so the pipeline can be
//! exercised with substitute gates, with a config-backed implementation
//! shipped as the default.

use crate::error::{FortellError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Caller-identity-scoped flag for AI processing.
#[async_trait]
pub trait ConsentGate: Send + Sync {
    /// Whether this caller has consented to AI processing of their audio.
    async fn allows_ai(&self, identity: &str) -> bool;
}

/// Config-backed gate: allow by default, deny identities on the list.
pub struct StaticConsentGate {
    denied: HashSet<String>,
}

impl StaticConsentGate {
    pub fn new(denied: impl IntoIterator<Item = String>) -> Self {
        Self {
            denied: denied.into_iter().collect(),
        }
    }
}

#[async_trait]
impl ConsentGate for StaticConsentGate {
    async fn allows_ai(&self, identity: &str) -> bool {
        !self.denied.contains(identity)
    }
}

/// Sliding-window request counter keyed by caller identity.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Record one request for `identity`, or fail with the seconds to wait
    /// if the window is full.
    pub async fn check(&self, identity: &str) -> Result<()> {
        let now = Instant::now();
        let mut hits = self.hits.lock().await;
        let window = self.window;

        let entry = hits.entry(identity.to_string()).or_default();
        while entry
            .front()
            .is_some_and(|t| now.duration_since(*t) >= window)
        {
            entry.pop_front();
        }

        if entry.len() >= self.max_requests as usize {
            let oldest = *entry.front().expect("window is full");
            let retry_after = window.saturating_sub(now.duration_since(oldest));
            return Err(FortellError::RateLimited {
                retry_after_secs: retry_after.as_secs().max(1),
            });
        }

        entry.push_back(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allows_up_to_limit_then_rejects() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        assert!(limiter.check("alice").await.is_ok());
        assert!(limiter.check("alice").await.is_ok());

        let err = limiter.check("alice").await.unwrap_err();
        match err {
            FortellError::RateLimited { retry_after_secs } => {
                assert!(retry_after_secs >= 1 && retry_after_secs <= 60);
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_identities_counted_separately() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check("alice").await.is_ok());
        assert!(limiter.check("bob").await.is_ok());
        assert!(limiter.check("alice").await.is_err());
    }

    #[tokio::test]
    async fn test_window_slides() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20));
        assert!(limiter.check("alice").await.is_ok());
        assert!(limiter.check("alice").await.is_err());

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(limiter.check("alice").await.is_ok());
    }

    #[tokio::test]
    async fn test_consent_gate_denies_listed_identity() {
        let gate = StaticConsentGate::new(vec!["mallory".to_string()]);
        assert!(gate.allows_ai("alice").await);
        assert!(!gate.allows_ai("mallory").await);
    }
}
