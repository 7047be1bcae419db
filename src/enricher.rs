//! Transaction metadata enrichment.
//! Merges each owning profile's secondary identifier into transaction
//! metadata without duplicate lookups, tolerating per-profile failures.

use arc_swap::ArcSwap;
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::{Profile, Transaction};
use crate::error::ClientError;

/// Anything that can resolve a profile projection by ID. The reconciliation
/// client implements this over HTTP; tests substitute in-memory sources.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch_profile(&self, profile_id: &str) -> Result<Profile, ClientError>;
}

/// Session-scoped read-through cache of profile projections, RCU-style so
/// readers never block. Writes for a given key always carry equivalent data,
/// so last-write-wins is acceptable. Never durable; dropping it only costs a
/// cache miss.
pub struct ProfileCache {
    inner: ArcSwap<HashMap<String, Profile>>,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self {
            inner: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    pub fn get(&self, profile_id: &str) -> Option<Profile> {
        self.inner.load().get(profile_id).cloned()
    }

    pub fn insert(&self, profile: Profile) {
        let current = self.inner.load_full();
        let mut next: HashMap<String, Profile> = (*current).clone();
        next.insert(profile.id.clone(), profile);
        self.inner.store(Arc::new(next));
    }

    pub fn clear(&self) {
        self.inner.store(Arc::new(HashMap::new()));
    }

    pub fn len(&self) -> usize {
        self.inner.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.load().is_empty()
    }
}

impl Default for ProfileCache {
    fn default() -> Self {
        Self::new()
    }
}

/// One profile whose lookup failed during a batch; its transactions simply
/// stay unenriched.
#[derive(Debug)]
pub struct EnrichmentFailure {
    pub profile_id: String,
    pub error: ClientError,
}

#[derive(Debug)]
pub struct EnrichmentOutcome {
    pub transactions: Vec<Transaction>,
    pub failures: Vec<EnrichmentFailure>,
}

pub struct MetadataEnricher<S> {
    source: S,
    cache: Arc<ProfileCache>,
}

impl<S: ProfileSource> MetadataEnricher<S> {
    pub fn new(source: S) -> Self {
        Self::with_cache(source, Arc::new(ProfileCache::new()))
    }

    pub fn with_cache(source: S, cache: Arc<ProfileCache>) -> Self {
        Self { source, cache }
    }

    /// Returns a new list of transactions, each carrying
    /// `metadata.profile_secondary_id` where one could be resolved. Already
    /// enriched transactions pass through untouched, each distinct profile is
    /// looked up at most once, and lookups run concurrently with the merge
    /// waiting for all of them to settle.
    pub async fn enrich(&self, transactions: &[Transaction]) -> EnrichmentOutcome {
        let distinct: HashSet<&str> = transactions
            .iter()
            .map(|tx| tx.profile_id.as_str())
            .collect();

        let mut secondary_ids: HashMap<String, String> = HashMap::new();
        let mut to_fetch: Vec<String> = Vec::new();

        for profile_id in distinct {
            match self.cache.get(profile_id) {
                Some(profile) => {
                    if let Some(secondary) = profile.secondary_id {
                        secondary_ids.insert(profile.id, secondary);
                    }
                }
                None => to_fetch.push(profile_id.to_string()),
            }
        }

        debug!(
            "Enriching {} transaction(s): {} cached profile(s), {} to fetch",
            transactions.len(),
            secondary_ids.len(),
            to_fetch.len()
        );

        let lookups = to_fetch.into_iter().map(|profile_id| async move {
            let result = self.source.fetch_profile(&profile_id).await;
            (profile_id, result)
        });

        let mut failures = Vec::new();
        for (profile_id, result) in join_all(lookups).await {
            match result {
                Ok(profile) => {
                    self.cache.insert(profile.clone());
                    if let Some(secondary) = profile.secondary_id {
                        secondary_ids.insert(profile.id, secondary);
                    }
                }
                Err(error) => {
                    warn!("Profile lookup failed for {}: {}", profile_id, error);
                    failures.push(EnrichmentFailure { profile_id, error });
                }
            }
        }

        let transactions = transactions
            .iter()
            .map(|tx| {
                let mut tx = tx.clone();
                if tx.metadata.profile_secondary_id.is_none() {
                    if let Some(secondary) = secondary_ids.get(&tx.profile_id) {
                        tx.metadata.profile_secondary_id = Some(secondary.clone());
                    }
                }
                tx
            })
            .collect();

        EnrichmentOutcome {
            transactions,
            failures,
        }
    }
}
