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

//! AWS SigV4 request signing with chained role credentials.
//!
//! [`RoleChainSignerResolver`] resolves a [`SigV4Signer`] for a region and
//! an optional second-level role. The first-level role is assumed with the
//! ambient identity of the process; a second-level role is assumed with the
//! credential of the first-level one. Credential providers are cached per
//! role so repeated resolutions don't hit STS again.
//!
//! ```no_run
//! use http::Method;
//! use rolesign_aws_v4::{
//!     Config, EnvCredentialProvider, ResolveSigner, RoleChainSignerResolver, SignInput,
//! };
//! use rolesign_core::{Context, OsEnv};
//! use std::sync::Arc;
//!
//! # async fn example(ctx: Context) -> rolesign_core::Result<()> {
//! // `ctx` carries the http client STS is called with.
//! let ctx = ctx.with_env(OsEnv);
//! let config = Config::from_env(&ctx);
//! let resolver =
//!     RoleChainSignerResolver::from_config(ctx, &config, Arc::new(EnvCredentialProvider::new()))?;
//!
//! let signer = resolver
//!     .resolve_signer("us-east-1", Some("arn:aws:iam::123456789012:role/partner"))
//!     .await;
//! let output = signer
//!     .sign(&SignInput::new(
//!         "body",
//!         "https://abc.execute-api.us-east-1.amazonaws.com",
//!         Method::POST,
//!         "execute-api",
//!         "us-east-1",
//!     ))
//!     .await?;
//! println!("{:?}", output.headers);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod cache;
pub use cache::CredentialProviderCache;
pub use cache::InMemoryCredentialProviderCache;
pub use cache::MokaCredentialProviderCache;

mod capability;
pub use capability::CanonicalRequest;
pub use capability::SigV4Capability;
pub use capability::SignCapability;

mod config;
pub use config::Config;

mod credential;
pub use credential::Credential;

mod model;
pub use model::SignInput;
pub use model::SignOutput;

mod provide_credential;
pub use provide_credential::*;

mod resolver;
pub use resolver::ResolveSigner;
pub use resolver::RoleChainSignerResolver;

mod sign_request;
pub use sign_request::RequestSigner;

mod signer;
pub use signer::CredentialProviderSigner;
pub use signer::IamRoleSigner;
pub use signer::SigV4Signer;

pub mod sts;

mod constants;
