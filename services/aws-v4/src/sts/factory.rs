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

use super::{AssumeRole, HttpStsClient};
use crate::SharedCredentialProvider;
use log::debug;
use rolesign_core::Context;
use std::fmt::Debug;
use std::sync::Arc;

/// StsClientFactory builds the identity-assumption clients a credential
/// chain is made of.
///
/// Building a client performs no I/O.
pub trait StsClientFactory: Debug + Send + Sync + 'static {
    /// Client authenticated as the ambient identity of the process.
    fn ambient_client(&self) -> Arc<dyn AssumeRole>;

    /// Client authenticated as `base` and scoped to `region`.
    fn client_for(&self, base: SharedCredentialProvider, region: &str) -> Arc<dyn AssumeRole>;
}

/// HttpStsClientFactory builds [`HttpStsClient`]s.
#[derive(Debug, Clone)]
pub struct HttpStsClientFactory {
    ctx: Context,
    ambient: SharedCredentialProvider,
    sts_region: Option<String>,
}

impl HttpStsClientFactory {
    /// Create a factory whose ambient client is authenticated by `ambient`.
    pub fn new(ctx: Context, ambient: SharedCredentialProvider) -> Self {
        Self {
            ctx,
            ambient,
            sts_region: None,
        }
    }

    /// Call a regional endpoint for the ambient client instead of the
    /// global one.
    pub fn with_sts_region(mut self, region: impl Into<String>) -> Self {
        self.sts_region = Some(region.into());
        self
    }
}

impl StsClientFactory for HttpStsClientFactory {
    fn ambient_client(&self) -> Arc<dyn AssumeRole> {
        debug!("building ambient sts client, region: {:?}", self.sts_region);
        Arc::new(HttpStsClient::new(
            self.ctx.clone(),
            self.ambient.clone(),
            self.sts_region.as_deref(),
        ))
    }

    fn client_for(&self, base: SharedCredentialProvider, region: &str) -> Arc<dyn AssumeRole> {
        debug!("building sts client scoped to region {region}");
        Arc::new(HttpStsClient::new(self.ctx.clone(), base, Some(region)))
    }
}
