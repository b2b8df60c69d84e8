use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Display;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheBackend, CacheError};

/// Named cache regions, each with its own key prefix and time-to-live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheRegion {
    /// Inventory tender methods per department (30 minutes)
    TenderMethods,
    /// Membership-number lookups against the member directory (10 minutes)
    LinkedAccount,
    /// In-flight batch submissions, used to reject double submits
    Submission,
    /// Wizard sessions per staff user (two weeks)
    WizardSession,
}

impl CacheRegion {
    pub fn prefix(&self) -> &'static str {
        match self {
            CacheRegion::TenderMethods => "tender_methods_department",
            CacheRegion::LinkedAccount => "linked_account",
            CacheRegion::Submission => "submission",
            CacheRegion::WizardSession => "wizard",
        }
    }

    pub fn ttl(&self) -> Duration {
        match self {
            CacheRegion::TenderMethods => Duration::from_secs(1800),
            CacheRegion::LinkedAccount => Duration::from_secs(600),
            CacheRegion::Submission => Duration::from_secs(30),
            CacheRegion::WizardSession => Duration::from_secs(1_209_600),
        }
    }

    pub fn key(&self, key: impl Display) -> String {
        format!("{}:{}", self.prefix(), key)
    }
}

/// Typed view over a cache region; values are stored as JSON
pub struct TypedCache<V> {
    backend: Arc<dyn CacheBackend>,
    region: CacheRegion,
    _value: PhantomData<fn() -> V>,
}

impl<V> Clone for TypedCache<V> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            region: self.region,
            _value: PhantomData,
        }
    }
}

impl<V> TypedCache<V>
where
    V: Serialize + DeserializeOwned,
{
    pub fn new(backend: Arc<dyn CacheBackend>, region: CacheRegion) -> Self {
        Self {
            backend,
            region,
            _value: PhantomData,
        }
    }

    /// Strict read: backend and decoding failures are returned
    pub async fn try_get(&self, key: impl Display) -> Result<Option<V>, CacheError> {
        match self.backend.get(&self.region.key(key)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Strict write with the region's TTL
    pub async fn try_set(&self, key: impl Display, value: &V) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value)?;
        self.backend
            .set(&self.region.key(key), raw, self.region.ttl())
            .await
    }

    /// Best-effort read; failures are logged and reported as a miss
    pub async fn get(&self, key: impl Display) -> Option<V> {
        let key = key.to_string();
        match self.try_get(&key).await {
            Ok(Some(value)) => {
                tracing::debug!("Cache hit: {}", self.region.key(&key));
                Some(value)
            }
            Ok(None) => {
                tracing::debug!("Cache miss: {}", self.region.key(&key));
                None
            }
            Err(e) => {
                tracing::warn!("Cache read failed for {}: {}", self.region.key(&key), e);
                None
            }
        }
    }

    /// Best-effort write; failures are logged
    pub async fn set(&self, key: impl Display, value: &V) {
        let key = key.to_string();
        if let Err(e) = self.try_set(&key, value).await {
            tracing::warn!("Cache write failed for {}: {}", self.region.key(&key), e);
        }
    }

    /// Claims the key for the region's TTL; `false` when someone else holds it
    pub async fn claim(&self, key: impl Display, value: &V) -> Result<bool, CacheError> {
        let raw = serde_json::to_string(value)?;
        self.backend
            .set_if_absent(&self.region.key(key), raw, self.region.ttl())
            .await
    }

    pub async fn remove(&self, key: impl Display) -> Result<(), CacheError> {
        self.backend.delete(&self.region.key(key)).await
    }
}
