// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use aws_credential_types::provider::error::CredentialsError;
use aws_sdk_cognitoidentityprovider::error::{BuildError, SdkError};
use aws_sdk_cognitoidentityprovider::types::ChallengeNameType;
use thiserror::Error;

/// An error returned by the [`Client`](crate::Client).
#[derive(Debug, Error)]
pub enum Error {
    /// The operator credentials profile could not be resolved.
    #[error("resolving credentials profile {profile:?}: {source}")]
    Config {
        /// The name of the profile.
        profile: String,
        /// Why resolution failed.
        source: CredentialsError,
    },
    /// The identity provider rejected or failed a request.
    #[error(transparent)]
    Provider(#[from] aws_sdk_cognitoidentityprovider::Error),
    /// A request value could not be built.
    #[error("building request: {0}")]
    Build(#[from] BuildError),
    /// Provisioning expected the provider to demand a new password, but it
    /// answered with some other challenge, or none at all.
    #[error("expected a NEW_PASSWORD_REQUIRED challenge, got {0:?}")]
    UnexpectedChallenge(Option<ChallengeNameType>),
}

impl<E, R> From<SdkError<E, R>> for Error
where
    aws_sdk_cognitoidentityprovider::Error: From<SdkError<E, R>>,
{
    fn from(err: SdkError<E, R>) -> Error {
        Error::Provider(err.into())
    }
}

impl Error {
    /// Returns the provider's error, if this error came from the provider.
    pub fn provider_error(&self) -> Option<&aws_sdk_cognitoidentityprovider::Error> {
        match self {
            Error::Provider(err) => Some(err),
            _ => None,
        }
    }
}
