// src/utils/code.rs

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::Mutex;

/// Short-lived storage for email verification codes.
#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Stores `code` for `email`, replacing any earlier one.
    async fn put(&self, email: &str, code: &str, ttl: Duration) {
        let mut codes = self.codes.lock().await;
        let now = Instant::now();
        codes.retain(|_, pending| pending.expires > now);
        codes.insert(
            key(email),
            PendingCode {
                code: code.to_string(),
                expires: now + ttl,
                failures: 0,
            },
        );
    }

    async fn take(&self, email: &str, code: &str) -> bool {
        let mut codes = self.codes.lock().await;
        let email = key(email);

        let Some(mut pending) = codes.remove(&email) else {
            return false;
        };
        if pending.expires <= Instant::now() {
            tracing::debug!("Verification code for {} expired", email);
            return false;
        }
        if pending.code != code {
            pending.failures += 1;
            if pending.failures >= MAX_CODE_FAILURES {
                tracing::warn!(
                    "Verification code for {} dropped after {} failures",
                    email,
                    pending.failures
                );
            } else {
                codes.insert(email, pending);
            }
            return false;
        }
        true
    }
}

/// Six random digits, leading zeros kept.
pub fn generate_code() -> String {
    format!("{:06}", rand::rng().random_range(0..1_000_000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn code_is_single_use() {
        let store = MemoryCodeStore::new();
        store.put("a@example.com", "123456", Duration::from_secs(60)).await;

        assert!(!store.take("a@example.com", "654321").await);
        assert!(store.take("A@Example.com ", "123456").await);
        assert!(!store.take("a@example.com", "123456").await);
    }

    #[tokio::test]
    async fn code_is_dropped_after_repeated_failures() {
        let store = MemoryCodeStore::new();
        store.put("d@example.com", "999999", Duration::from_secs(60)).await;

        for _ in 0..MAX_CODE_FAILURES {
            assert!(!store.take("d@example.com", "000000").await);
        }
        assert!(!store.take("d@example.com", "999999").await);
    }

    #[tokio::test]
    async fn fewer_failures_keep_the_code() {
        let store = MemoryCodeStore::new();
        store.put("e@example.com", "424242", Duration::from_secs(60)).await;

        for _ in 1..MAX_CODE_FAILURES {
            assert!(!store.take("e@example.com", "000000").await);
        }
        assert!(store.take("e@example.com", "424242").await);
    }

    #[tokio::test]
    async fn expired_code_is_rejected() {
        let store = MemoryCodeStore::new();
        store.put("b@example.com", "111111", Duration::ZERO).await;
        assert!(!store.take("b@example.com", "111111").await);
    }

    #[tokio::test]
    async fn newer_code_replaces_older() {
        let store = MemoryCodeStore::new();
        store.put("c@example.com", "111111", Duration::from_secs(60)).await;
        store.put("c@example.com", "222222", Duration::from_secs(60)).await;

        assert!(!store.take("c@example.com", "111111").await);
        assert!(store.take("c@example.com", "222222").await);
    }
}
