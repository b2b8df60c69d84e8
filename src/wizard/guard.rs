use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::cache::{CacheBackend, CacheError, CacheRegion, TypedCache};
use crate::wizard::{LineItem, RecipientInput};

/// SHA-256 over the staff member, the recipient and the ordered lines
pub fn submission_fingerprint(staff_id: i32, recipient: &RecipientInput, lines: &[LineItem]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(staff_id.to_be_bytes());
    hasher.update(serde_json::to_vec(recipient).unwrap_or_default());
    for line in lines {
        // Keys are per-session noise; only the content identifies a submission
        hasher.update(serde_json::to_vec(&line.fields).unwrap_or_default());
    }
    format!("{:x}", hasher.finalize())
}

/// Short-lived claims that stop the same batch from being submitted twice at once
#[derive(Clone)]
pub struct SubmissionGuard {
    claims: TypedCache<i32>,
}

impl SubmissionGuard {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            claims: TypedCache::new(backend, CacheRegion::Submission),
        }
    }

    /// `false` when an identical submission is already in flight
    pub async fn claim(&self, fingerprint: &str, staff_id: i32) -> Result<bool, CacheError> {
        self.claims.claim(fingerprint, &staff_id).await
    }

    pub async fn release(&self, fingerprint: &str) {
        if let Err(e) = self.claims.remove(fingerprint).await {
            tracing::warn!("Could not release submission claim {}: {}", fingerprint, e);
        }
    }
}
