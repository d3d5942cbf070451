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

use crate::sts::AssumeRole;
use crate::{
    AssumeRoleCredentialProvider, CanonicalRequest, Credential, SharedCredentialProvider,
    SignCapability, SignInput, SignOutput,
};
use async_trait::async_trait;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Uri};
use log::{debug, warn};
use rolesign_core::{Context, Error, ProvideCredential, Result};
use std::fmt::Debug;
use std::sync::Arc;

/// SigV4Signer signs [`SignInput`]s into [`SignOutput`]s.
///
/// `sign` never mutates the input and may be called concurrently.
#[async_trait]
pub trait SigV4Signer: Debug + Send + Sync + 'static {
    /// Sign the request described by `input`.
    async fn sign(&self, input: &SignInput) -> Result<SignOutput>;
}

/// CredentialProviderSigner signs with whatever credential its provider
/// currently holds.
#[derive(Debug, Clone)]
pub struct CredentialProviderSigner {
    ctx: Context,
    provider: SharedCredentialProvider,
    capability: Arc<dyn SignCapability>,
}

impl CredentialProviderSigner {
    /// Create a signer over `provider`.
    pub fn new(
        ctx: Context,
        provider: SharedCredentialProvider,
        capability: Arc<dyn SignCapability>,
    ) -> Self {
        Self {
            ctx,
            provider,
            capability,
        }
    }

    /// The provider credentials are loaded from.
    pub fn provider(&self) -> &SharedCredentialProvider {
        &self.provider
    }
}

#[async_trait]
impl SigV4Signer for CredentialProviderSigner {
    async fn sign(&self, input: &SignInput) -> Result<SignOutput> {
        let mut req = build_canonical_request(input)?;

        let Some(cred) = self.provider.provide_credential(&self.ctx).await? else {
            warn!("provider {:?} returned no credential", self.provider);
            return Err(Error::config_invalid("no credential available for signing")
                .with_context(format!("endpoint: {}", input.endpoint)));
        };

        sign_canonical_request(&self.ctx, self.capability.as_ref(), input, &mut req, &cred).await
    }
}

/// IamRoleSigner assumes its role on every call and signs with the
/// freshly issued credential.
#[derive(Debug, Clone)]
pub struct IamRoleSigner {
    ctx: Context,
    provider: AssumeRoleCredentialProvider,
    capability: Arc<dyn SignCapability>,
}

impl IamRoleSigner {
    /// Create a signer assuming `role_arn` as `role_session_name` through
    /// `client`.
    pub fn new(
        ctx: Context,
        role_arn: impl Into<String>,
        role_session_name: impl Into<String>,
        client: Arc<dyn AssumeRole>,
        capability: Arc<dyn SignCapability>,
    ) -> Self {
        Self {
            ctx,
            provider: AssumeRoleCredentialProvider::new(role_arn, client)
                .with_role_session_name(role_session_name),
            capability,
        }
    }
}

#[async_trait]
impl SigV4Signer for IamRoleSigner {
    async fn sign(&self, input: &SignInput) -> Result<SignOutput> {
        let mut req = build_canonical_request(input)?;

        let cred = self
            .provider
            .provide_credential(&self.ctx)
            .await?
            .ok_or_else(|| {
                Error::unexpected("assumed role without credential")
                    .with_context(format!("role_arn: {}", self.provider.role_arn()))
            })?;

        sign_canonical_request(&self.ctx, self.capability.as_ref(), input, &mut req, &cred).await
    }
}

fn build_canonical_request(input: &SignInput) -> Result<CanonicalRequest> {
    let invalid_endpoint = || {
        Error::invalid_input(format!(
            "Invalid request endpoint passed in Input: {}",
            input.endpoint
        ))
    };
    let endpoint: Uri = input
        .endpoint
        .parse()
        .map_err(|e| invalid_endpoint().with_source(e))?;
    if endpoint.authority().is_none() {
        return Err(invalid_endpoint());
    }

    let mut headers = HeaderMap::new();
    for (name, value) in input.headers.iter().flatten() {
        headers.append(
            HeaderName::from_bytes(name.as_bytes())?,
            HeaderValue::from_str(value)?,
        );
    }

    Ok(CanonicalRequest {
        service: input.service_name.clone(),
        region: input.region_name.clone(),
        method: input.method.clone(),
        endpoint,
        resource_path: input.resource_path.clone().unwrap_or_default(),
        headers,
        payload: input.payload.clone(),
    })
}

async fn sign_canonical_request(
    ctx: &Context,
    capability: &dyn SignCapability,
    input: &SignInput,
    req: &mut CanonicalRequest,
    cred: &Credential,
) -> Result<SignOutput> {
    debug!(
        "signing {} {}{} for {} in {}",
        req.method, req.endpoint, req.resource_path, req.service, req.region
    );
    capability.sign_canonical_request(ctx, req, cred).await?;

    // Input headers are returned under the caller's own keys.
    let mut headers = input.headers.clone().unwrap_or_default();
    for name in req.headers.keys() {
        if headers
            .keys()
            .any(|k| k.eq_ignore_ascii_case(name.as_str()))
        {
            continue;
        }
        let values = req
            .headers
            .get_all(name)
            .iter()
            .map(|v| v.to_str())
            .collect::<std::result::Result<Vec<_>, _>>()?;
        headers.insert(name.as_str().to_string(), values.join(","));
    }
    Ok(SignOutput { headers })
}
