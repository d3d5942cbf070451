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

use super::{sts_endpoint, AssumeRole, AssumeRoleError, AssumeRoleInput, AssumedRoleCredentials};
use crate::constants::{EMPTY_STRING_SHA256, STS_API_VERSION, X_AMZ_CONTENT_SHA_256};
use crate::{Credential, RequestSigner, SharedCredentialProvider};
use async_trait::async_trait;
use bytes::Bytes;
use http::{header, Method, StatusCode};
use log::debug;
use quick_xml::de;
use rolesign_core::time::parse_rfc3339;
use rolesign_core::{Context, Signer};
use serde::Deserialize;
use std::sync::Arc;

/// HttpStsClient calls the STS `AssumeRole` API over the [`Context`]'s
/// http client, signing every call with the credential of its base
/// provider.
#[derive(Debug, Clone)]
pub struct HttpStsClient {
    endpoint: String,
    signer: Signer<Credential>,
}

impl HttpStsClient {
    /// Create a client authenticated as `base`.
    ///
    /// Without a region the global STS endpoint is called and requests are
    /// signed for `us-east-1`.
    pub fn new(ctx: Context, base: SharedCredentialProvider, region: Option<&str>) -> Self {
        let signing_region = region.filter(|v| !v.is_empty()).unwrap_or("us-east-1");
        let builder = RequestSigner::new("sts", signing_region);

        Self {
            endpoint: sts_endpoint(region),
            signer: Signer::from_arc(ctx, base, Arc::new(builder)),
        }
    }

    /// Host of the STS endpoint this client calls.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AssumeRole for HttpStsClient {
    async fn assume_role(
        &self,
        ctx: &Context,
        input: &AssumeRoleInput,
    ) -> Result<AssumedRoleCredentials, AssumeRoleError> {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("Action", "AssumeRole")
            .append_pair("RoleArn", &input.role_arn)
            .append_pair("RoleSessionName", &input.role_session_name)
            .append_pair("DurationSeconds", &input.duration_seconds.to_string())
            .append_pair("Version", STS_API_VERSION)
            .finish();
        let url = format!("https://{}/?{query}", self.endpoint);

        let req = http::Request::builder()
            .method(Method::GET)
            .uri(url)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            // Set content sha to empty string.
            .header(X_AMZ_CONTENT_SHA_256, EMPTY_STRING_SHA256)
            .body(Bytes::new())
            .map_err(transport)?;

        let (mut parts, body) = req.into_parts();
        self.signer
            .sign(&mut parts, None)
            .await
            .map_err(AssumeRoleError::BaseCredential)?;
        let req = http::Request::from_parts(parts, body);

        debug!(
            "assuming role {} with session {} via {}",
            input.role_arn, input.role_session_name, self.endpoint
        );
        let resp = ctx.http_send_as_string(req).await.map_err(transport)?;
        let status = resp.status();
        let content = resp.into_body();

        if status != StatusCode::OK {
            return Err(parse_error_response(status, &content));
        }

        let resp: AssumeRoleResponse = de::from_str(&content).map_err(|e| {
            transport(anyhow::Error::new(e).context("failed to parse STS AssumeRole response"))
        })?;
        let cred = resp.result.credentials;

        Ok(AssumedRoleCredentials {
            access_key_id: cred.access_key_id.trim().to_string(),
            secret_access_key: cred.secret_access_key.trim().to_string(),
            session_token: cred.session_token.trim().to_string(),
            expiration: parse_rfc3339(cred.expiration.trim()).map_err(transport)?,
        })
    }
}

fn transport(err: impl Into<anyhow::Error>) -> AssumeRoleError {
    AssumeRoleError::Transport(err.into())
}

fn parse_error_response(status: StatusCode, content: &str) -> AssumeRoleError {
    match de::from_str::<ErrorResponse>(content) {
        Ok(resp) if !resp.error.code.is_empty() => {
            AssumeRoleError::from_code(&resp.error.code, resp.error.message)
        }
        _ => transport(anyhow::anyhow!(
            "STS responded with {status} and no recognizable error: {content}"
        )),
    }
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct AssumeRoleResponse {
    #[serde(rename = "AssumeRoleResult")]
    result: AssumeRoleResult,
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct AssumeRoleResult {
    credentials: AssumeRoleCredentials,
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct AssumeRoleCredentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: String,
    expiration: String,
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct ErrorDetail {
    code: String,
    message: String,
}
