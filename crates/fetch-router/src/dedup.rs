// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! `(userId, hash(text), minute-bucket) -> seen` dedup cache (§4.1 step 2,
//! §4.11). Two identical messages from the same user within the TTL collapse
//! to a single processed response; the second call is a silent no-op.
use std::collections::HashMap;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Process-local, TTL-bounded dedup cache. Entries are purged lazily on
/// every check rather than via a background sweep.
pub struct DedupCache {
    ttl: Duration,
    seen: HashMap<(String, String), Instant>,
}

impl DedupCache {
    pub fn new(ttl_ms: u64) -> Self {
        Self { ttl: Duration::from_millis(ttl_ms), seen: HashMap::new() }
    }

    /// Returns `true` if `(user_id, text)` was already seen within the TTL
    /// window (i.e. this call is a duplicate to drop), recording the first
    /// sighting otherwise.
    pub fn check_and_record(&mut self, user_id: &str, text: &str) -> bool {
        self.purge_expired();
        let key = (user_id.to_string(), hash_text(text));
        if self.seen.contains_key(&key) {
            return true;
        }
        self.seen.insert(key, Instant::now());
        false
    }

    fn purge_expired(&mut self) {
        let ttl = self.ttl;
        self.seen.retain(|_, seen_at| seen_at.elapsed() < ttl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sighting_is_not_a_duplicate() {
        let mut cache = DedupCache::new(30_000);
        assert!(!cache.check_and_record("alice", "hello"));
    }

    #[test]
    fn second_identical_message_within_ttl_is_a_duplicate() {
        let mut cache = DedupCache::new(30_000);
        assert!(!cache.check_and_record("alice", "hello"));
        assert!(cache.check_and_record("alice", "hello"));
    }

    #[test]
    fn different_users_do_not_collide() {
        let mut cache = DedupCache::new(30_000);
        assert!(!cache.check_and_record("alice", "hello"));
        assert!(!cache.check_and_record("bob", "hello"));
    }

    #[test]
    fn different_text_does_not_collide() {
        let mut cache = DedupCache::new(30_000);
        assert!(!cache.check_and_record("alice", "hello"));
        assert!(!cache.check_and_record("alice", "goodbye"));
    }

    #[test]
    fn expired_entry_is_not_a_duplicate() {
        let mut cache = DedupCache::new(1);
        assert!(!cache.check_and_record("alice", "hello"));
        std::thread::sleep(Duration::from_millis(5));
        assert!(!cache.check_and_record("alice", "hello"));
    }
}
