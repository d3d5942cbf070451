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

use crate::constants::{AWS_ROLE_ARN, MAX_PROVIDER_CACHE_TTL_SECS};
use crate::sts::{AssumeRole, HttpStsClientFactory, StsClientFactory};
use crate::{
    AssumeRoleCredentialProvider, Config, CredentialProviderCache, CredentialProviderSigner,
    MokaCredentialProviderCache, SharedCredentialProvider, SigV4Capability, SigV4Signer,
    SignCapability,
};
use async_trait::async_trait;
use log::debug;
use rolesign_core::{Context, Error, RefreshingCredentialProvider, Result};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

/// ResolveSigner hands out a [`SigV4Signer`] for a region and an optional
/// second-level role.
#[async_trait]
pub trait ResolveSigner: Debug + Send + Sync + 'static {
    /// Resolve a signer for `second_level_role`, or for the first-level
    /// role when there is none.
    ///
    /// Never assumes a role itself: the returned signer does so lazily on
    /// its first `sign`.
    async fn resolve_signer(
        &self,
        region: &str,
        second_level_role: Option<&str>,
    ) -> Arc<dyn SigV4Signer>;
}

/// RoleChainSignerResolver turns a region and an optional second-level
/// role into a ready [`SigV4Signer`].
///
/// The first-level role is assumed with the ambient identity. A
/// second-level role is assumed with the credential of the first-level
/// role, through STS in the requested region. Providers are cached per
/// role ARN so repeated resolutions reuse them.
///
/// Cache lookup and insertion are not atomic: concurrent resolutions of
/// the same uncached role may each build a provider, and the last insert
/// wins.
#[derive(Debug, Clone)]
pub struct RoleChainSignerResolver {
    ctx: Context,
    role_arn: String,
    role_session_name: String,
    partner_role_session_name: String,
    cache: Arc<dyn CredentialProviderCache>,
    sts: Arc<dyn StsClientFactory>,
    capability: Arc<dyn SignCapability>,
}

impl RoleChainSignerResolver {
    /// Create a resolver for the first-level role `role_arn`.
    pub fn new(
        ctx: Context,
        role_arn: impl Into<String>,
        cache: Arc<dyn CredentialProviderCache>,
        sts: Arc<dyn StsClientFactory>,
        capability: Arc<dyn SignCapability>,
    ) -> Self {
        let defaults = Config::default();
        Self {
            ctx,
            role_arn: role_arn.into(),
            role_session_name: defaults.role_session_name,
            partner_role_session_name: defaults.partner_role_session_name,
            cache,
            sts,
            capability,
        }
    }

    /// Build a resolver calling STS over `ctx`, authenticated as `ambient`.
    pub fn from_config(
        ctx: Context,
        config: &Config,
        ambient: SharedCredentialProvider,
    ) -> Result<Self> {
        let role_arn = config
            .role_arn
            .clone()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                Error::config_invalid("first-level role arn is not configured")
                    .with_context(format!("env: {AWS_ROLE_ARN}"))
            })?;

        if config.provider_cache_ttl > Duration::from_secs(MAX_PROVIDER_CACHE_TTL_SECS) {
            return Err(Error::config_invalid(format!(
                "provider cache ttl must not exceed {MAX_PROVIDER_CACHE_TTL_SECS} seconds"
            ))
            .with_context(format!("ttl: {:?}", config.provider_cache_ttl)));
        }

        let mut sts = HttpStsClientFactory::new(ctx.clone(), ambient);
        if let Some(region) = &config.sts_region {
            sts = sts.with_sts_region(region);
        }
        let cache = MokaCredentialProviderCache::new(
            config.provider_cache_capacity,
            config.provider_cache_ttl,
        );

        Ok(Self::new(
            ctx,
            role_arn,
            Arc::new(cache),
            Arc::new(sts),
            Arc::new(SigV4Capability::new()),
        )
        .with_role_session_name(&config.role_session_name)
        .with_partner_role_session_name(&config.partner_role_session_name))
    }

    /// Set the session name of the first-level role.
    pub fn with_role_session_name(mut self, name: impl Into<String>) -> Self {
        self.role_session_name = name.into();
        self
    }

    /// Set the session name of second-level roles.
    pub fn with_partner_role_session_name(mut self, name: impl Into<String>) -> Self {
        self.partner_role_session_name = name.into();
        self
    }

    /// Resolve the credential provider
    /// [`resolve_signer`](ResolveSigner::resolve_signer) signs with.
    pub async fn resolve_provider(
        &self,
        region: &str,
        second_level_role: Option<&str>,
    ) -> SharedCredentialProvider {
        let Some(role) = second_level_role else {
            if let Some(provider) = self.cache.get(&self.role_arn).await {
                debug!("credential provider cache hit for {}", self.role_arn);
                return provider;
            }

            let provider = self.first_level_provider();
            self.cache.insert(&self.role_arn, provider.clone()).await;
            return provider;
        };

        if let Some(provider) = self.cache.get(role).await {
            debug!("credential provider cache hit for {role}");
            return provider;
        }

        // The first-level provider is only reused here, never cached.
        let base = match self.cache.get(&self.role_arn).await {
            Some(provider) => provider,
            None => self.first_level_provider(),
        };
        let client = self.sts.client_for(base, region);
        debug!("building credential provider for {role} via {region}");
        let provider = assume_role_provider(role, &self.partner_role_session_name, client);
        self.cache.insert(role, provider.clone()).await;
        provider
    }

    fn first_level_provider(&self) -> SharedCredentialProvider {
        debug!("building credential provider for {}", self.role_arn);
        assume_role_provider(
            &self.role_arn,
            &self.role_session_name,
            self.sts.ambient_client(),
        )
    }
}

#[async_trait]
impl ResolveSigner for RoleChainSignerResolver {
    async fn resolve_signer(
        &self,
        region: &str,
        second_level_role: Option<&str>,
    ) -> Arc<dyn SigV4Signer> {
        let provider = self.resolve_provider(region, second_level_role).await;
        Arc::new(CredentialProviderSigner::new(
            self.ctx.clone(),
            provider,
            self.capability.clone(),
        ))
    }
}

fn assume_role_provider(
    role_arn: &str,
    role_session_name: &str,
    client: Arc<dyn AssumeRole>,
) -> SharedCredentialProvider {
    Arc::new(RefreshingCredentialProvider::new(
        AssumeRoleCredentialProvider::new(role_arn, client)
            .with_role_session_name(role_session_name),
    ))
}
