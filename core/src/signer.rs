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

use crate::{
    Context, ProvideCredential, RefreshingCredentialProvider, Result, SignRequest,
    SigningCredential,
};
use std::sync::Arc;
use std::time::Duration;

/// Signer is the main struct used to sign the request.
///
/// It pairs a credential provider with a request signer and keeps the
/// loaded credential until it's no longer valid.
#[derive(Clone, Debug)]
pub struct Signer<K: SigningCredential> {
    ctx: Context,
    loader: Arc<RefreshingCredentialProvider<K>>,
    builder: Arc<dyn SignRequest<Credential = K>>,
}

impl<K: SigningCredential> Signer<K> {
    /// Create a new signer.
    pub fn new(
        ctx: Context,
        loader: impl ProvideCredential<Credential = K>,
        builder: impl SignRequest<Credential = K>,
    ) -> Self {
        Self::from_arc(ctx, Arc::new(loader), Arc::new(builder))
    }

    /// Create a new signer from shared parts.
    pub fn from_arc(
        ctx: Context,
        loader: Arc<dyn ProvideCredential<Credential = K>>,
        builder: Arc<dyn SignRequest<Credential = K>>,
    ) -> Self {
        Self {
            ctx,
            loader: Arc::new(RefreshingCredentialProvider::from_arc(loader)),
            builder,
        }
    }

    /// Get the context this signer loads credentials in.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Signing request.
    ///
    /// A request is left unsigned when the provider has no credential.
    pub async fn sign(
        &self,
        req: &mut http::request::Parts,
        expires_in: Option<Duration>,
    ) -> Result<()> {
        let credential = self.loader.provide_credential(&self.ctx).await?;

        self.builder
            .sign_request(&self.ctx, req, credential.as_ref(), expires_in)
            .await
    }
}
