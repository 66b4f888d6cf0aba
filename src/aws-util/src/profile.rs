// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Credentials from named profiles.
//!
//! The SDK's default chain consults environment variables, web identity
//! tokens and instance metadata before it ever looks at a profile. Operators
//! of the admin tooling pick a profile by name, so we go straight to the
//! profile files and skip everything else.

use std::path::PathBuf;

use aws_config::profile::ProfileFileCredentialsProvider;
use aws_config::profile::profile_file::{ProfileFileKind, ProfileFiles};
use aws_credential_types::provider::error::CredentialsError;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use tracing::debug;

/// Where to look up a named credentials profile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileSource {
    name: String,
    credentials_file: Option<PathBuf>,
}

impl ProfileSource {
    /// Looks up the profile `name` in the default `~/.aws/config` and
    /// `~/.aws/credentials` files.
    pub fn new(name: impl Into<String>) -> ProfileSource {
        ProfileSource {
            name: name.into(),
            credentials_file: None,
        }
    }

    /// Looks up the profile in the given credentials file instead of the
    /// default profile files.
    pub fn credentials_file(mut self, path: impl Into<PathBuf>) -> ProfileSource {
        self.credentials_file = Some(path.into());
        self
    }

    /// Returns the name of the profile.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolves the profile into a credentials provider.
    ///
    /// Credentials are fetched once before returning, so a missing or
    /// malformed profile is reported here rather than on the first request
    /// made with the provider.
    pub async fn resolve(&self) -> Result<SharedCredentialsProvider, CredentialsError> {
        let mut builder = ProfileFileCredentialsProvider::builder().profile_name(self.name.clone());
        if let Some(path) = &self.credentials_file {
            let files = ProfileFiles::builder()
                .with_file(ProfileFileKind::Credentials, path.clone())
                .build();
            builder = builder.profile_files(files);
        }
        let provider = builder.build();
        provider.provide_credentials().await?;
        debug!(profile = %self.name, "resolved AWS credentials profile");
        Ok(SharedCredentialsProvider::new(provider))
    }
}
