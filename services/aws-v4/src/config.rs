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

use crate::constants::*;
use log::warn;
use rolesign_core::Context;
use std::time::Duration;

/// Config of a [`RoleChainSignerResolver`](crate::RoleChainSignerResolver).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// ARN of the first-level role, assumed with the ambient identity.
    pub role_arn: Option<String>,
    /// Session name used to assume the first-level role.
    pub role_session_name: String,
    /// Session name used to assume second-level roles.
    pub partner_role_session_name: String,
    /// Maximum number of cached credential providers.
    pub provider_cache_capacity: u64,
    /// How long a credential provider stays cached.
    pub provider_cache_ttl: Duration,
    /// Region of the STS endpoint used for the first-level role.
    ///
    /// The global endpoint is used when unset.
    pub sts_region: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            role_arn: None,
            role_session_name: "rolesign".to_string(),
            partner_role_session_name: "rolesign-partner".to_string(),
            provider_cache_capacity: 1000,
            provider_cache_ttl: Duration::from_secs(3600),
            sts_region: None,
        }
    }
}

impl Config {
    /// Load config from the context's environment, on top of the defaults.
    ///
    /// Numeric values that fail to parse or are out of range are ignored.
    pub fn from_env(ctx: &Context) -> Self {
        let mut config = Self::default();
        let var = |key: &str| ctx.env_var(key).filter(|v| !v.is_empty());

        if let Some(v) = var(AWS_ROLE_ARN) {
            config.role_arn = Some(v);
        }
        if let Some(v) = var(AWS_ROLE_SESSION_NAME) {
            config.role_session_name = v;
        }
        if let Some(v) = var(ROLESIGN_PARTNER_ROLE_SESSION_NAME) {
            config.partner_role_session_name = v;
        }
        if let Some(v) = var(ROLESIGN_PROVIDER_CACHE_CAPACITY) {
            match v.parse() {
                Ok(capacity) => config.provider_cache_capacity = capacity,
                Err(e) => {
                    warn!("ignoring invalid {ROLESIGN_PROVIDER_CACHE_CAPACITY} {v:?}: {e}")
                }
            }
        }
        if let Some(v) = var(ROLESIGN_PROVIDER_CACHE_TTL_SECONDS) {
            match v.parse::<u64>() {
                Ok(secs) if secs <= MAX_PROVIDER_CACHE_TTL_SECS => {
                    config.provider_cache_ttl = Duration::from_secs(secs)
                }
                Ok(_) => warn!(
                    "ignoring {ROLESIGN_PROVIDER_CACHE_TTL_SECONDS} {v:?}: \
                     longer than {MAX_PROVIDER_CACHE_TTL_SECS} seconds"
                ),
                Err(e) => {
                    warn!("ignoring invalid {ROLESIGN_PROVIDER_CACHE_TTL_SECONDS} {v:?}: {e}")
                }
            }
        }
        if let Some(v) = var(AWS_REGION) {
            config.sts_region = Some(v);
        }

        config
    }
}
