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

//! Identity assumption through AWS STS.

mod client;
pub use client::HttpStsClient;

mod factory;
pub use factory::HttpStsClientFactory;
pub use factory::StsClientFactory;

use async_trait::async_trait;
use rolesign_core::time::DateTime;
use rolesign_core::Context;
use std::fmt::Debug;

/// Input of a single `AssumeRole` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssumeRoleInput {
    /// ARN of the role to assume.
    pub role_arn: String,
    /// Session name recorded by STS for the assumed role.
    pub role_session_name: String,
    /// Requested lifetime of the issued credentials.
    pub duration_seconds: u32,
}

/// Temporary credentials returned by STS.
#[derive(Clone, PartialEq, Eq)]
pub struct AssumedRoleCredentials {
    /// Access key id.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Session token.
    pub session_token: String,
    /// Expiration of the credentials.
    pub expiration: DateTime,
}

impl Debug for AssumedRoleCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use rolesign_core::utils::Redact;

        f.debug_struct("AssumedRoleCredentials")
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field("secret_access_key", &Redact::from(&self.secret_access_key))
            .field("session_token", &Redact::from(&self.session_token))
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Failure of an `AssumeRole` call.
#[derive(Debug, thiserror::Error)]
pub enum AssumeRoleError {
    /// The policy document is not valid.
    #[error("MalformedPolicyDocument: {0}")]
    MalformedPolicyDocument(String),
    /// The session policies are too large after packing.
    #[error("PackedPolicyTooLarge: {0}")]
    PackedPolicyTooLarge(String),
    /// STS is not activated in the requested region.
    #[error("RegionDisabledException: {0}")]
    RegionDisabled(String),
    /// The token of the calling identity has expired.
    #[error("ExpiredTokenException: {0}")]
    ExpiredToken(String),
    /// STS answered with any other error.
    #[error("{code}: {message}")]
    Rejected {
        /// STS error code.
        code: String,
        /// STS error message.
        message: String,
    },
    /// The credential STS is called with could not be loaded.
    #[error("failed to authenticate the call to STS")]
    BaseCredential(#[source] rolesign_core::Error),
    /// STS could not be reached, or its answer could not be understood.
    #[error("failed to call STS")]
    Transport(#[source] anyhow::Error),
}

impl AssumeRoleError {
    /// Build an error from the code and message of an STS error response.
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            "MalformedPolicyDocument" => Self::MalformedPolicyDocument(message),
            "PackedPolicyTooLarge" => Self::PackedPolicyTooLarge(message),
            "RegionDisabledException" => Self::RegionDisabled(message),
            "ExpiredTokenException" => Self::ExpiredToken(message),
            _ => Self::Rejected {
                code: code.to_string(),
                message,
            },
        }
    }

    /// Returns true if STS itself was never reached or answered garbage.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// AssumeRole exchanges the identity it's authenticated as for temporary
/// credentials of another role.
#[async_trait]
pub trait AssumeRole: Debug + Send + Sync + 'static {
    /// Assume the role described by `input`.
    async fn assume_role(
        &self,
        ctx: &Context,
        input: &AssumeRoleInput,
    ) -> Result<AssumedRoleCredentials, AssumeRoleError>;
}

/// Build the STS endpoint host.
///
/// Without a region the global endpoint is used. Regions starting with
/// `cn-` live in the `amazonaws.com.cn` partition.
pub fn sts_endpoint(region: Option<&str>) -> String {
    match region {
        Some(region) if region.starts_with("cn-") => format!("sts.{region}.amazonaws.com.cn"),
        Some(region) if !region.is_empty() => format!("sts.{region}.amazonaws.com"),
        _ => "sts.amazonaws.com".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(None, "sts.amazonaws.com"; "global")]
    #[test_case(Some(""), "sts.amazonaws.com"; "empty region")]
    #[test_case(Some("us-west-2"), "sts.us-west-2.amazonaws.com"; "regional")]
    #[test_case(Some("cn-north-1"), "sts.cn-north-1.amazonaws.com.cn"; "china")]
    fn test_sts_endpoint(region: Option<&str>, expected: &str) {
        assert_eq!(sts_endpoint(region), expected);
    }

    #[test]
    fn test_from_code() {
        assert!(matches!(
            AssumeRoleError::from_code("RegionDisabledException", "off"),
            AssumeRoleError::RegionDisabled(m) if m == "off"
        ));
        assert!(matches!(
            AssumeRoleError::from_code("AccessDenied", "nope"),
            AssumeRoleError::Rejected { code, message }
                if code == "AccessDenied" && message == "nope"
        ));
        assert!(!AssumeRoleError::from_code("ExpiredTokenException", "").is_transport());
    }
}
