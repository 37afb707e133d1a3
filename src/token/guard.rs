//! Account Locks
//!
//! Per-account in-flight guard serializing refresh and revoke, so two
//! concurrent refreshes of one account cannot both hit the provider and race
//! on the final write.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

/// Map of account id to its async mutex.
#[derive(Default)]
pub struct AccountLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`.
    pub async fn acquire(&self, id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            // Entries nobody else holds are dropped so the map stays bounded
            // by the accounts currently in flight.
            locks.retain(|key, lock| key == id || Arc::strong_count(lock) > 1);
            locks.entry(id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of tracked accounts.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_id_is_exclusive() {
        let locks = Arc::new(AccountLocks::new());
        let guard = locks.acquire("me.api").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("me.api").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_ids_do_not_block() {
        let locks = AccountLocks::new();
        let _me = locks.acquire("me.api").await;
        let _work = tokio::time::timeout(Duration::from_secs(1), locks.acquire("work.api"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_idle_entries_are_pruned() {
        let locks = AccountLocks::new();
        drop(locks.acquire("a").await);
        drop(locks.acquire("b").await);
        drop(locks.acquire("c").await);
        assert_eq!(locks.len(), 1);
    }
}
