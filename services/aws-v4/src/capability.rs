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

use crate::constants::{AWS_URI_ENCODE_SET, X_AMZ_CONTENT_SHA_256};
use crate::{Credential, RequestSigner};
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, Uri};
use percent_encoding::utf8_percent_encode;
use rolesign_core::hash::hex_sha256;
use rolesign_core::time::DateTime;
use rolesign_core::{Context, Error, Result, SignRequest};
use std::fmt::Debug;

/// Request description handed to a [`SignCapability`].
#[derive(Debug, Clone)]
pub struct CanonicalRequest {
    /// AWS service name.
    pub service: String,
    /// AWS region name.
    pub region: String,
    /// HTTP method.
    pub method: Method,
    /// Parsed endpoint.
    pub endpoint: Uri,
    /// Resource path, empty when the input had none.
    pub resource_path: String,
    /// Headers, mutated in place by the capability.
    pub headers: HeaderMap,
    /// Request payload.
    pub payload: Bytes,
}

impl CanonicalRequest {
    /// Uri of the request: endpoint with resource path appended to its path.
    ///
    /// The resource path is taken literally and percent-encoded here.
    pub fn uri(&self) -> Result<Uri> {
        let base = self.endpoint.path().trim_end_matches('/');
        let resource = utf8_percent_encode(
            self.resource_path.trim_start_matches('/'),
            &AWS_URI_ENCODE_SET,
        )
        .to_string();
        let mut path = match (base.is_empty(), resource.is_empty()) {
            (true, true) => "/".to_string(),
            (_, true) => base.to_string(),
            _ => format!("{base}/{resource}"),
        };
        if let Some(query) = self.endpoint.query() {
            path.push('?');
            path.push_str(query);
        }

        let mut parts = self.endpoint.clone().into_parts();
        parts.path_and_query = Some(path.parse().map_err(|e| {
            Error::invalid_input(format!("invalid resource path: {}", self.resource_path))
                .with_source(e)
        })?);
        Ok(Uri::from_parts(parts)?)
    }
}

/// Signer capability: computes the signature of a canonical request and
/// writes the signature headers into it.
///
/// Implementations must be deterministic for identical inputs and time.
#[async_trait]
pub trait SignCapability: Debug + Send + Sync + 'static {
    /// Sign `req` with `cred`, mutating `req.headers`.
    async fn sign_canonical_request(
        &self,
        ctx: &Context,
        req: &mut CanonicalRequest,
        cred: &Credential,
    ) -> Result<()>;
}

/// SigV4Capability signs canonical requests with AWS SigV4.
///
/// The payload is always signed: `x-amz-content-sha256` is set to the hex
/// SHA256 of the payload unless the caller already provided it.
#[derive(Debug, Clone, Default)]
pub struct SigV4Capability {
    time: Option<DateTime>,
}

impl SigV4Capability {
    /// Create a new SigV4 capability.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the signing time. Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }
}

#[async_trait]
impl SignCapability for SigV4Capability {
    async fn sign_canonical_request(
        &self,
        ctx: &Context,
        req: &mut CanonicalRequest,
        cred: &Credential,
    ) -> Result<()> {
        let mut parts = http::Request::builder()
            .method(req.method.clone())
            .uri(req.uri()?)
            .body(())?
            .into_parts()
            .0;
        parts.headers = std::mem::take(&mut req.headers);
        if !parts.headers.contains_key(X_AMZ_CONTENT_SHA_256) {
            parts.headers.insert(
                X_AMZ_CONTENT_SHA_256,
                HeaderValue::try_from(hex_sha256(&req.payload))?,
            );
        }

        let signer = RequestSigner::new(&req.service, &req.region).with_time(self.time);
        let signed = signer
            .sign_request(ctx, &mut parts, Some(cred), None)
            .await;

        // Hand the headers back even if signing failed half way.
        req.headers = parts.headers;
        signed
    }
}
