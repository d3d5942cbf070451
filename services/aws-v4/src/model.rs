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

use bytes::Bytes;
use http::Method;
use std::collections::HashMap;

/// Everything needed to sign one request.
///
/// Required fields are constructor arguments; `resource_path` and `headers`
/// are optional and their absence is a valid, distinct state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInput {
    /// HTTP request payload.
    pub payload: Bytes,
    /// HTTP request endpoint, e.g. `https://abc.execute-api.us-east-1.amazonaws.com`.
    pub endpoint: String,
    /// Resource path appended to the endpoint path.
    pub resource_path: Option<String>,
    /// HTTP request method.
    pub method: Method,
    /// AWS service the request is sent to. API Gateway is `execute-api`.
    pub service_name: String,
    /// Region the AWS service lives in.
    pub region_name: String,
    /// HTTP request headers. When given, they are covered by the signature.
    pub headers: Option<HashMap<String, String>>,
}

impl SignInput {
    /// Create a sign input without resource path and headers.
    pub fn new(
        payload: impl Into<Bytes>,
        endpoint: impl Into<String>,
        method: Method,
        service_name: impl Into<String>,
        region_name: impl Into<String>,
    ) -> Self {
        Self {
            payload: payload.into(),
            endpoint: endpoint.into(),
            resource_path: None,
            method,
            service_name: service_name.into(),
            region_name: region_name.into(),
            headers: None,
        }
    }

    /// Set the resource path.
    pub fn with_resource_path(mut self, resource_path: impl Into<String>) -> Self {
        self.resource_path = Some(resource_path.into());
        self
    }

    /// Set the request headers.
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = Some(headers);
        self
    }
}

/// Headers of a signed request.
///
/// Contains every header of the [`SignInput`] plus the ones added while
/// signing. Header names are lower-case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOutput {
    /// Request headers with signature and related information.
    pub headers: HashMap<String, String>,
}
