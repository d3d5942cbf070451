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

use crate::constants::STS_ASSUME_ROLE_MIN_DURATION_SECS;
use crate::sts::{AssumeRole, AssumeRoleError, AssumeRoleInput};
use crate::Credential;
use async_trait::async_trait;
use log::debug;
use rolesign_core::{Context, Error, ErrorKind, ProvideCredential, Result};
use std::sync::Arc;

/// AssumeRoleCredentialProvider loads credentials by assuming a role
/// through an [`AssumeRole`] client.
///
/// Every call assumes the role again; wrap it in a
/// [`RefreshingCredentialProvider`](rolesign_core::RefreshingCredentialProvider)
/// to reuse the credential until it's about to expire.
#[derive(Debug, Clone)]
pub struct AssumeRoleCredentialProvider {
    role_arn: String,
    role_session_name: String,
    client: Arc<dyn AssumeRole>,
}

impl AssumeRoleCredentialProvider {
    /// Create a provider assuming `role_arn` through `client`.
    pub fn new(role_arn: impl Into<String>, client: Arc<dyn AssumeRole>) -> Self {
        Self {
            role_arn: role_arn.into(),
            role_session_name: "rolesign".to_string(),
            client,
        }
    }

    /// Set the role session name.
    pub fn with_role_session_name(mut self, name: impl Into<String>) -> Self {
        self.role_session_name = name.into();
        self
    }

    /// ARN of the role this provider assumes.
    pub fn role_arn(&self) -> &str {
        &self.role_arn
    }

    /// Session name this provider assumes the role with.
    pub fn role_session_name(&self) -> &str {
        &self.role_session_name
    }
}

#[async_trait]
impl ProvideCredential for AssumeRoleCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let input = AssumeRoleInput {
            role_arn: self.role_arn.clone(),
            role_session_name: self.role_session_name.clone(),
            duration_seconds: STS_ASSUME_ROLE_MIN_DURATION_SECS,
        };

        debug!("assuming role {} as {}", self.role_arn, self.role_session_name);
        let assumed = self.client.assume_role(ctx, &input).await.map_err(|err| {
            let message = format!(
                "Exception was thrown from STS while assuming role: {}.",
                self.role_arn
            );
            let kind = match &err {
                AssumeRoleError::Transport(_) => ErrorKind::Dependency,
                // Keep the kind of the failure one level down the chain.
                AssumeRoleError::BaseCredential(base) => base.kind(),
                _ => ErrorKind::ConfigInvalid,
            };
            Error::new(kind, message)
                .with_context(format!("role_arn: {}", self.role_arn))
                .with_context(format!("session_name: {}", self.role_session_name))
                .with_source(err)
        })?;

        Ok(Some(Credential {
            access_key_id: assumed.access_key_id,
            secret_access_key: assumed.secret_access_key,
            session_token: Some(assumed.session_token),
            expires_in: Some(assumed.expiration),
        }))
    }
}
