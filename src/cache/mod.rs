use std::collections::HashMap;
use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use crate::error::ClientError;

/// Addresses one cacheable piece of server-derived data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    UserAccounts(Uuid),
    Account(Uuid),
    AccountHistory(Uuid),
}

impl QueryKey {
    fn is_user_accounts(&self) -> bool {
        matches!(self, QueryKey::UserAccounts(_))
    }
}

type FetchOutcome = Result<Value, String>;

struct CacheState {
    entries: HashMap<QueryKey, Value>,
    inflight: HashMap<QueryKey, watch::Receiver<Option<FetchOutcome>>>,
    /// Bumped on every invalidation. A fetch that started before the bump
    /// may still hand its result to waiting readers, but it must not land
    /// in `entries` as fresh data.
    generations: HashMap<QueryKey, u64>,
}

impl CacheState {
    fn generation(&self, key: &QueryKey) -> u64 {
        self.generations.get(key).copied().unwrap_or(0)
    }

    fn invalidate(&mut self, key: &QueryKey) {
        self.entries.remove(key);
        *self.generations.entry(key.clone()).or_insert(0) += 1;
    }
}

/// Keyed asynchronous read-cache of server data.
///
/// Reading a key fetches lazily; concurrent reads of the same key share one
/// in-flight fetch and observe the same resolved value. Invalidation marks
/// the entry stale so the next read refetches; it never updates readers
/// retroactively.
pub struct QueryCache {
    state: Mutex<CacheState>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                inflight: HashMap::new(),
                generations: HashMap::new(),
            }),
        }
    }

    /// Return the cached value for `key`, or run `fetch` to populate it.
    ///
    /// If another fetch for the same key is already in flight, this call
    /// waits for that fetch instead of starting a duplicate one, and shares
    /// its outcome (success or failure).
    pub async fn get_or_fetch<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T, ClientError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        enum Role {
            Leader(watch::Sender<Option<FetchOutcome>>, u64),
            Follower(watch::Receiver<Option<FetchOutcome>>),
        }

        let role = {
            let mut state = self.state.lock().await;

            if let Some(value) = state.entries.get(&key) {
                return Ok(serde_json::from_value(value.clone())?);
            }

            match state.inflight.get(&key) {
                Some(rx) => Role::Follower(rx.clone()),
                None => {
                    let (tx, rx) = watch::channel(None);
                    let generation = state.generation(&key);
                    state.inflight.insert(key.clone(), rx);
                    Role::Leader(tx, generation)
                }
            }
        };

        match role {
            Role::Follower(mut rx) => {
                let outcome = rx
                    .wait_for(|outcome| outcome.is_some())
                    .await
                    .map_err(|_| ClientError::Fetch("shared fetch was abandoned".to_string()))?
                    .clone()
                    .unwrap_or_else(|| Err("shared fetch produced no value".to_string()));

                match outcome {
                    Ok(value) => Ok(serde_json::from_value(value)?),
                    Err(message) => Err(ClientError::Fetch(message)),
                }
            }
            Role::Leader(tx, started_at) => {
                let result = fetch().await;

                let mut state = self.state.lock().await;
                state.inflight.remove(&key);

                match result {
                    Ok(data) => {
                        let value = serde_json::to_value(&data)?;
                        // Only store as fresh if no invalidation happened
                        // while the fetch was in flight
                        if state.generation(&key) == started_at {
                            state.entries.insert(key, value.clone());
                        }
                        let _ = tx.send(Some(Ok(value)));
                        Ok(data)
                    }
                    Err(err) => {
                        let _ = tx.send(Some(Err(err.to_string())));
                        Err(err)
                    }
                }
            }
        }
    }

    /// Mark `key` stale. The next read refetches; a read already in flight
    /// is not guaranteed to observe fresh data.
    pub async fn invalidate(&self, key: &QueryKey) {
        let mut state = self.state.lock().await;
        state.invalidate(key);
    }

    /// Mark every `UserAccounts` entry stale, whichever user it belongs to.
    /// Mutations invalidate the whole collection family, matching the
    /// invalidation protocol for account and balance changes.
    pub async fn invalidate_user_accounts(&self) {
        let mut state = self.state.lock().await;
        let keys: Vec<QueryKey> = state
            .entries
            .keys()
            .chain(state.inflight.keys())
            .filter(|key| key.is_user_accounts())
            .cloned()
            .collect();

        for key in keys {
            state.invalidate(&key);
        }
    }

    /// Whether `key` currently holds a fresh value.
    pub async fn is_fresh(&self, key: &QueryKey) -> bool {
        self.state.lock().await.entries.contains_key(key)
    }
}
