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

use crate::mock::{init_logger, RecordingStsFactory, StubAssumeRole, StubCapability};
use chrono::{TimeDelta, Utc};
use http::Method;
use pretty_assertions::assert_eq;
use rolesign_aws_v4::sts::AssumeRoleError;
use rolesign_aws_v4::{
    IamRoleSigner, InMemoryCredentialProviderCache, ResolveSigner, RoleChainSignerResolver,
    SigV4Signer, SignInput,
};
use rolesign_core::{Context, ErrorKind};
use std::error::Error as _;
use std::sync::Arc;
use test_case::test_case;

const ROLE: &str = "arn:aws:iam::123456789012:role/partner";

fn input() -> SignInput {
    SignInput::new(
        "body",
        "https://svc.example.com",
        Method::POST,
        "execute-api",
        "us-east-1",
    )
}

fn region_disabled() -> AssumeRoleError {
    AssumeRoleError::RegionDisabled("STS is not activated in this region".to_string())
}

#[test_case(
    || AssumeRoleError::MalformedPolicyDocument("bad policy".to_string()),
    ErrorKind::ConfigInvalid;
    "malformed policy document"
)]
#[test_case(
    || AssumeRoleError::PackedPolicyTooLarge("too large".to_string()),
    ErrorKind::ConfigInvalid;
    "packed policy too large"
)]
#[test_case(region_disabled, ErrorKind::ConfigInvalid; "region disabled")]
#[test_case(
    || AssumeRoleError::ExpiredToken("expired".to_string()),
    ErrorKind::ConfigInvalid;
    "expired token"
)]
#[test_case(
    || AssumeRoleError::from_code("AccessDenied", "not allowed"),
    ErrorKind::ConfigInvalid;
    "other rejection"
)]
#[test_case(
    || AssumeRoleError::Transport(anyhow::anyhow!("connection reset")),
    ErrorKind::Dependency;
    "transport"
)]
#[tokio::test]
async fn test_iam_role_signer_failure(failure: fn() -> AssumeRoleError, kind: ErrorKind) {
    init_logger();
    let capability = Arc::new(StubCapability::default());
    let signer = IamRoleSigner::new(
        Context::new(),
        ROLE,
        "rolesign",
        Arc::new(StubAssumeRole::failing(failure)),
        capability.clone(),
    );

    let err = signer.sign(&input()).await.unwrap_err();

    assert_eq!(err.kind(), kind);
    assert_eq!(
        err.to_string(),
        format!("Exception was thrown from STS while assuming role: {ROLE}.")
    );
    let source = err
        .source()
        .and_then(|e| e.downcast_ref::<AssumeRoleError>())
        .expect("sts error must be kept as source");
    assert_eq!(source.to_string(), failure().to_string());
    assert!(capability.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_region_disabled_through_resolver() {
    init_logger();
    let sts = Arc::new(RecordingStsFactory::new(
        StubAssumeRole::new("ASIABASE"),
        StubAssumeRole::failing(region_disabled),
    ));
    let resolver = RoleChainSignerResolver::new(
        Context::new(),
        "arn:aws:iam::111111111111:role/base",
        Arc::new(InMemoryCredentialProviderCache::new()),
        sts.clone(),
        Arc::new(StubCapability::default()),
    );

    let signer = resolver.resolve_signer("ap-east-1", Some(ROLE)).await;
    let err = signer.sign(&input()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    assert_eq!(
        err.to_string(),
        format!("Exception was thrown from STS while assuming role: {ROLE}.")
    );
    assert!(matches!(
        err.source().and_then(|e| e.downcast_ref::<AssumeRoleError>()),
        Some(AssumeRoleError::RegionDisabled(_))
    ));
}

#[tokio::test]
async fn test_iam_role_signer_assumes_every_time() -> anyhow::Result<()> {
    init_logger();
    let client = Arc::new(StubAssumeRole::new("ASIAFRESH"));
    let capability = Arc::new(StubCapability::default());
    let signer = IamRoleSigner::new(
        Context::new(),
        ROLE,
        "rolesign",
        client.clone(),
        capability.clone(),
    );

    signer.sign(&input()).await?;
    signer.sign(&input()).await?;

    assert_eq!(client.call_count(), 2);
    let cred = &capability.credentials()[0];
    assert_eq!(cred.access_key_id, "ASIAFRESH");
    assert_eq!(cred.session_token.as_deref(), Some("ASIAFRESH-token"));
    assert!(cred.expires_in.is_some());
    Ok(())
}

#[tokio::test]
async fn test_resolved_provider_reassumes_near_expiry() -> anyhow::Result<()> {
    init_logger();
    // Valid for less than the two minute buffer: never reused.
    let sts = Arc::new(RecordingStsFactory::new(
        StubAssumeRole::new("ASIABASE")
            .expiring_at(Utc::now() + TimeDelta::try_seconds(60).expect("in bounds")),
        StubAssumeRole::new("ASIAPARTNER"),
    ));
    let resolver = RoleChainSignerResolver::new(
        Context::new(),
        "arn:aws:iam::111111111111:role/base",
        Arc::new(InMemoryCredentialProviderCache::new()),
        sts.clone(),
        Arc::new(StubCapability::default()),
    );

    let signer = resolver.resolve_signer("us-east-1", None).await;
    signer.sign(&input()).await?;
    signer.sign(&input()).await?;

    assert_eq!(sts.ambient.call_count(), 2);
    Ok(())
}
