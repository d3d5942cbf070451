// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::SharedCredentialProvider;
use async_trait::async_trait;
use moka::future::Cache;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::RwLock;
use std::time::Duration;

/// CredentialProviderCache maps role ARNs to the credential provider
/// assuming that role.
///
/// An evicted entry is simply rebuilt by the next caller; a cache never
/// fails. Inserting under an existing key replaces the entry.
#[async_trait]
pub trait CredentialProviderCache: Debug + Send + Sync + 'static {
    /// Get the provider cached for `role_arn`.
    async fn get(&self, role_arn: &str) -> Option<SharedCredentialProvider>;

    /// Cache `provider` for `role_arn`.
    async fn insert(&self, role_arn: &str, provider: SharedCredentialProvider);
}

/// MokaCredentialProviderCache bounds the cache by entry count and by the
/// time since an entry was inserted.
#[derive(Debug, Clone)]
pub struct MokaCredentialProviderCache {
    cache: Cache<String, SharedCredentialProvider>,
}

impl MokaCredentialProviderCache {
    /// Create a cache holding at most `max_capacity` providers, each for at
    /// most `ttl`.
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(max_capacity)
                .build(),
        }
    }
}

#[async_trait]
impl CredentialProviderCache for MokaCredentialProviderCache {
    async fn get(&self, role_arn: &str) -> Option<SharedCredentialProvider> {
        self.cache.get(role_arn).await
    }

    async fn insert(&self, role_arn: &str, provider: SharedCredentialProvider) {
        self.cache.insert(role_arn.to_string(), provider).await;
    }
}

/// InMemoryCredentialProviderCache never evicts.
#[derive(Debug, Default)]
pub struct InMemoryCredentialProviderCache {
    entries: RwLock<HashMap<String, SharedCredentialProvider>>,
}

impl InMemoryCredentialProviderCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached providers.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CredentialProviderCache for InMemoryCredentialProviderCache {
    async fn get(&self, role_arn: &str) -> Option<SharedCredentialProvider> {
        self.entries
            .read()
            .expect("lock poisoned")
            .get(role_arn)
            .cloned()
    }

    async fn insert(&self, role_arn: &str, provider: SharedCredentialProvider) {
        self.entries
            .write()
            .expect("lock poisoned")
            .insert(role_arn.to_string(), provider);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StaticCredentialProvider;
    use std::sync::Arc;

    fn provider() -> SharedCredentialProvider {
        Arc::new(StaticCredentialProvider::new("ak", "sk"))
    }

    #[tokio::test]
    async fn test_in_memory_cache_replaces_entry() {
        let cache = InMemoryCredentialProviderCache::new();
        assert!(cache.get("role").await.is_none());

        let first = provider();
        cache.insert("role", first.clone()).await;
        assert!(Arc::ptr_eq(&cache.get("role").await.unwrap(), &first));

        let second = provider();
        cache.insert("role", second.clone()).await;
        assert!(Arc::ptr_eq(&cache.get("role").await.unwrap(), &second));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_moka_cache() {
        let cache = MokaCredentialProviderCache::new(16, Duration::from_secs(60));
        assert!(cache.get("role").await.is_none());

        let entry = provider();
        cache.insert("role", entry.clone()).await;
        assert!(Arc::ptr_eq(&cache.get("role").await.unwrap(), &entry));
        assert!(cache.get("other").await.is_none());
    }

    #[tokio::test]
    async fn test_moka_cache_expires_entries() {
        let cache = MokaCredentialProviderCache::new(16, Duration::from_millis(50));
        cache.insert("role", provider()).await;

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(cache.get("role").await.is_none());
    }
}
