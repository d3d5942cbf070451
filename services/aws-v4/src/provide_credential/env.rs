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

use crate::{constants::*, Credential};
use async_trait::async_trait;
use log::warn;
use rolesign_core::{Context, ProvideCredential, Result};

/// EnvCredentialProvider loads the ambient AWS identity from environment
/// variables.
///
/// - `AWS_ACCESS_KEY_ID`: the access key id
/// - `AWS_SECRET_ACCESS_KEY`: the secret access key
/// - `AWS_SESSION_TOKEN`: the session token, optional
#[derive(Debug, Default, Clone)]
pub struct EnvCredentialProvider;

impl EnvCredentialProvider {
    /// Create a new EnvCredentialProvider.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProvideCredential for EnvCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let access_key_id = ctx.env_var(AWS_ACCESS_KEY_ID).filter(|v| !v.is_empty());
        let secret_access_key = ctx.env_var(AWS_SECRET_ACCESS_KEY).filter(|v| !v.is_empty());

        match (access_key_id, secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => Ok(Some(Credential {
                access_key_id,
                secret_access_key,
                session_token: ctx.env_var(AWS_SESSION_TOKEN).filter(|v| !v.is_empty()),
                expires_in: None,
            })),
            (None, None) => Ok(None),
            _ => {
                warn!(
                    "only one of {AWS_ACCESS_KEY_ID} and {AWS_SECRET_ACCESS_KEY} is set, ignoring both"
                );
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rolesign_core::StaticEnv;
    use std::collections::HashMap;

    fn context(envs: &[(&str, &str)]) -> Context {
        Context::new().with_env(StaticEnv {
            envs: envs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        })
    }

    #[tokio::test]
    async fn test_env_credential_provider() -> anyhow::Result<()> {
        let ctx = context(&[
            (AWS_ACCESS_KEY_ID, "test_access_key"),
            (AWS_SECRET_ACCESS_KEY, "test_secret_key"),
            (AWS_SESSION_TOKEN, "test_session_token"),
        ]);

        let cred = EnvCredentialProvider::new()
            .provide_credential(&ctx)
            .await?
            .expect("credential must be loaded");
        assert_eq!(cred.access_key_id, "test_access_key");
        assert_eq!(cred.secret_access_key, "test_secret_key");
        assert_eq!(cred.session_token.as_deref(), Some("test_session_token"));
        assert_eq!(cred.expires_in, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_env_credential_provider_partial_credentials() -> anyhow::Result<()> {
        let _ = env_logger::builder().is_test(true).try_init();

        let provider = EnvCredentialProvider::new();
        assert!(provider.provide_credential(&context(&[])).await?.is_none());
        assert!(provider
            .provide_credential(&context(&[(AWS_ACCESS_KEY_ID, "test_access_key")]))
            .await?
            .is_none());
        assert!(provider
            .provide_credential(&context(&[
                (AWS_ACCESS_KEY_ID, "test_access_key"),
                (AWS_SECRET_ACCESS_KEY, ""),
            ]))
            .await?
            .is_none());

        Ok(())
    }
}
