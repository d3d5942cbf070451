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

use crate::{Context, ProvideCredential, Result, SigningCredential};
use log::debug;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex};

/// RefreshingCredentialProvider keeps the last credential loaded from its
/// source and only goes back to the source once that credential is no
/// longer valid.
///
/// The lock is never held across the load: two callers observing an
/// expired credential at the same time may both load a new one, and the
/// last one to finish wins.
pub struct RefreshingCredentialProvider<K: SigningCredential> {
    source: Arc<dyn ProvideCredential<Credential = K>>,
    credential: Mutex<Option<K>>,
}

impl<K: SigningCredential> Debug for RefreshingCredentialProvider<K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshingCredentialProvider")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl<K: SigningCredential> RefreshingCredentialProvider<K> {
    /// Wrap a credential source.
    pub fn new(source: impl ProvideCredential<Credential = K>) -> Self {
        Self::from_arc(Arc::new(source))
    }

    /// Wrap an already shared credential source.
    pub fn from_arc(source: Arc<dyn ProvideCredential<Credential = K>>) -> Self {
        Self {
            source,
            credential: Mutex::new(None),
        }
    }

    /// Drop the held credential so the next call loads a fresh one.
    pub fn invalidate(&self) {
        *self.credential.lock().expect("lock poisoned") = None;
    }
}

#[async_trait::async_trait]
impl<K: SigningCredential> ProvideCredential for RefreshingCredentialProvider<K> {
    type Credential = K;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<K>> {
        let cached = self.credential.lock().expect("lock poisoned").clone();
        if cached.is_valid() {
            return Ok(cached);
        }

        debug!("credential missing or about to expire, loading from {:?}", self.source);
        let loaded = self.source.provide_credential(ctx).await?;
        *self.credential.lock().expect("lock poisoned") = loaded.clone();
        Ok(loaded)
    }
}
