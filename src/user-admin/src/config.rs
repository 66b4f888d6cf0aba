// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::path::PathBuf;

use aws_types::region::Region;
use sso_aws_util::profile::ProfileSource;

use crate::client::Client;
use crate::error::Error;

/// Configuration for a [`Client`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    profile: ProfileSource,
    region: String,
    endpoint: Option<String>,
}

impl ClientConfig {
    /// Constructs a new `ClientConfig` that authenticates with the named
    /// credentials profile against the identity provider in `region`.
    pub fn new(profile: impl Into<String>, region: impl Into<String>) -> ClientConfig {
        ClientConfig {
            profile: ProfileSource::new(profile),
            region: region.into(),
            endpoint: None,
        }
    }

    /// Sends all requests to `url` instead of the region's public endpoint.
    pub fn endpoint(mut self, url: impl Into<String>) -> ClientConfig {
        self.endpoint = Some(url.into());
        self
    }

    /// Looks the profile up in the given credentials file rather than the
    /// default `~/.aws` profile files.
    pub fn credentials_file(mut self, path: impl Into<PathBuf>) -> ClientConfig {
        self.profile = self.profile.credentials_file(path);
        self
    }

    /// Builds the [`Client`].
    ///
    /// Fails with [`Error::Config`] if the profile cannot be resolved. This
    /// happens before any request is sent to the identity provider.
    pub async fn build(self) -> Result<Client, Error> {
        let credentials = self
            .profile
            .resolve()
            .await
            .map_err(|source| Error::Config {
                profile: self.profile.name().to_string(),
                source,
            })?;

        let region = Region::new(self.region);
        let mut admin = sso_aws_util::defaults()
            .region(region.clone())
            .credentials_provider(credentials);
        let mut anonymous = sso_aws_util::defaults().region(region).no_credentials();
        if let Some(endpoint) = &self.endpoint {
            admin = admin.endpoint_url(endpoint);
            anonymous = anonymous.endpoint_url(endpoint);
        }

        let admin = sso_aws_util::cognito::new_client(&admin.load().await);
        let anonymous = sso_aws_util::cognito::new_client(&anonymous.load().await);
        Ok(Client::from_parts(admin, anonymous))
    }
}
