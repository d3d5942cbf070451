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

use crate::mock::init_logger;
use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use rolesign_aws_v4::{
    Config, ResolveSigner, RoleChainSignerResolver, SignInput, StaticCredentialProvider,
};
use rolesign_core::{Context, ErrorKind, HttpSend, Result, StaticEnv};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const BASE_ROLE: &str = "arn:aws:iam::111111111111:role/base";
const PARTNER_ROLE: &str = "arn:aws:iam::222222222222:role/partner";

/// Answers STS `AssumeRole` calls; the issued access key is derived from
/// the role name.
#[derive(Debug, Clone, Default)]
struct MockSts {
    requests: Arc<Mutex<Vec<http::request::Parts>>>,
    expired: bool,
}

impl MockSts {
    fn requests(&self) -> Vec<(String, String, String)> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|parts| {
                let query: HashMap<String, String> =
                    form_urlencoded::parse(parts.uri.query().unwrap_or_default().as_bytes())
                        .into_owned()
                        .collect();
                let authorization = parts
                    .headers
                    .get(http::header::AUTHORIZATION)
                    .map(|v| v.to_str().unwrap().to_string())
                    .unwrap_or_default();
                (
                    parts.uri.host().unwrap_or_default().to_string(),
                    query.get("RoleArn").cloned().unwrap_or_default(),
                    authorization,
                )
            })
            .collect()
    }
}

#[async_trait]
impl HttpSend for MockSts {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let (parts, _) = req.into_parts();
        let role_arn = form_urlencoded::parse(parts.uri.query().unwrap_or_default().as_bytes())
            .find(|(k, _)| k == "RoleArn")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();
        self.requests.lock().unwrap().push(parts);

        if self.expired {
            return Ok(http::Response::builder()
                .status(StatusCode::FORBIDDEN)
                .body(Bytes::from_static(
                    br#"<ErrorResponse xmlns="https://sts.amazonaws.com/doc/2011-06-15/">
  <Error>
    <Type>Sender</Type>
    <Code>ExpiredTokenException</Code>
    <Message>The security token included in the request is expired</Message>
  </Error>
</ErrorResponse>"#,
                ))?);
        }

        let key = format!(
            "ASIA{}",
            role_arn.rsplit('/').next().unwrap_or_default().to_uppercase()
        );
        let body = format!(
            r#"<AssumeRoleResponse xmlns="https://sts.amazonaws.com/doc/2011-06-15/">
  <AssumeRoleResult>
    <Credentials>
      <AccessKeyId>{key}</AccessKeyId>
      <SecretAccessKey>{key}-secret</SecretAccessKey>
      <SessionToken>{key}-token</SessionToken>
      <Expiration>2099-01-01T00:00:00Z</Expiration>
    </Credentials>
  </AssumeRoleResult>
</AssumeRoleResponse>"#
        );

        Ok(http::Response::builder()
            .status(StatusCode::OK)
            .body(Bytes::from(body))?)
    }
}

fn input() -> SignInput {
    SignInput::new(
        r#"{"hello":"world"}"#,
        "https://abc.execute-api.us-west-2.amazonaws.com",
        Method::POST,
        "execute-api",
        "us-west-2",
    )
    .with_resource_path("/prod/items")
}

fn resolver(sts: &MockSts, envs: &[(&str, &str)]) -> RoleChainSignerResolver {
    init_logger();
    let ctx = Context::new()
        .with_http_send(sts.clone())
        .with_env(StaticEnv {
            envs: envs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
    let config = Config::from_env(&ctx);
    let ambient = Arc::new(StaticCredentialProvider::new(
        "AKIAAMBIENT",
        "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY",
    ));

    RoleChainSignerResolver::from_config(ctx, &config, ambient).expect("config must be valid")
}

#[tokio::test]
async fn test_two_level_chain() -> anyhow::Result<()> {
    let sts = MockSts::default();
    let resolver = resolver(&sts, &[("AWS_ROLE_ARN", BASE_ROLE)]);

    let signer = resolver.resolve_signer("us-west-2", Some(PARTNER_ROLE)).await;
    assert!(sts.requests().is_empty());

    let output = signer.sign(&input()).await?;
    assert!(output.headers["authorization"]
        .starts_with("AWS4-HMAC-SHA256 Credential=ASIAPARTNER/"));
    assert_eq!(output.headers["x-amz-security-token"], "ASIAPARTNER-token");
    assert_eq!(output.headers["host"], "abc.execute-api.us-west-2.amazonaws.com");

    // The partner role is assumed in its region with the base role's
    // credential, which itself comes from the global endpoint.
    let requests = sts.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].0, "sts.amazonaws.com");
    assert_eq!(requests[0].1, BASE_ROLE);
    assert!(requests[0].2.contains("Credential=AKIAAMBIENT/"));
    assert!(requests[0].2.contains("/us-east-1/sts/aws4_request"));
    assert_eq!(requests[1].0, "sts.us-west-2.amazonaws.com");
    assert_eq!(requests[1].1, PARTNER_ROLE);
    assert!(requests[1].2.contains("Credential=ASIABASE/"));
    assert!(requests[1].2.contains("/us-west-2/sts/aws4_request"));

    // Credentials are valid until 2099: nothing is assumed again.
    let again = resolver.resolve_signer("us-west-2", Some(PARTNER_ROLE)).await;
    again.sign(&input()).await?;
    signer.sign(&input()).await?;
    assert_eq!(sts.requests().len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_first_level_regional_sts() -> anyhow::Result<()> {
    let sts = MockSts::default();
    let resolver = resolver(
        &sts,
        &[
            ("AWS_ROLE_ARN", BASE_ROLE),
            ("AWS_ROLE_SESSION_NAME", "svc"),
            ("AWS_REGION", "cn-north-1"),
        ],
    );

    let output = resolver
        .resolve_signer("us-west-2", None)
        .await
        .sign(&input())
        .await?;
    assert!(output.headers["authorization"].starts_with("AWS4-HMAC-SHA256 Credential=ASIABASE/"));

    let requests = sts.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].uri.host(), Some("sts.cn-north-1.amazonaws.com.cn"));
    assert!(requests[0]
        .uri
        .query()
        .unwrap_or_default()
        .contains("RoleSessionName=svc"));
    Ok(())
}

#[tokio::test]
async fn test_rejected_first_level_in_chain() {
    let sts = MockSts {
        expired: true,
        ..Default::default()
    };
    let resolver = resolver(&sts, &[("AWS_ROLE_ARN", BASE_ROLE)]);

    let err = resolver
        .resolve_signer("us-west-2", Some(PARTNER_ROLE))
        .await
        .sign(&input())
        .await
        .unwrap_err();

    // Only the base role is asked for: the partner call can't be signed.
    let requests = sts.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].1, BASE_ROLE);
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    assert_eq!(
        err.to_string(),
        format!("Exception was thrown from STS while assuming role: {PARTNER_ROLE}.")
    );

    let err = resolver
        .resolve_signer("us-west-2", None)
        .await
        .sign(&input())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    assert_eq!(
        err.to_string(),
        format!("Exception was thrown from STS while assuming role: {BASE_ROLE}.")
    );
}
