// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! User provisioning.
//!
//! Creating a user that can log in with a known password takes four
//! dependent requests:
//!
//! 1. `AdminCreateUser` creates the user with a temporary password.
//! 2. `AdminUpdateUserAttributes` marks their email as verified.
//! 3. `AdminInitiateAuth` logs in with the temporary password. The provider
//!    answers with a `NEW_PASSWORD_REQUIRED` challenge and a session.
//! 4. `AdminRespondToAuthChallenge` answers the challenge in that session,
//!    setting the same password as the permanent one.
//!
//! The requests are not atomic. [`Provisioner`] performs them one
//! [`step`](Provisioner::step) at a time and remembers how far it got, so a
//! caller that sees a failure knows which state the user was left in.

use std::fmt;

use aws_sdk_cognitoidentityprovider::types::{AttributeType, ChallengeNameType};
use tracing::{debug, warn};

use crate::client::{Client, admin_password_auth};
use crate::error::Error;

const EMAIL_VERIFIED: &str = "email_verified";

/// Builds a user attribute.
pub fn attribute(
    name: impl Into<String>,
    value: impl Into<String>,
) -> Result<AttributeType, Error> {
    Ok(AttributeType::builder().name(name).value(value).build()?)
}

/// A user to provision.
#[derive(Clone)]
pub struct NewUser {
    /// The username, unique within the pool.
    pub username: String,
    /// Used first as the temporary and then as the permanent password.
    pub password: String,
    /// The pool to create the user in.
    pub user_pool_id: String,
    /// The app client that runs the authentication flow.
    pub app_client_id: String,
    /// Attributes to create the user with.
    pub attributes: Vec<AttributeType>,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("user_pool_id", &self.user_pool_id)
            .field("app_client_id", &self.app_client_id)
            .field("attributes", &self.attributes)
            .finish()
    }
}

/// How far provisioning of a user has progressed.
#[derive(Clone, PartialEq, Eq)]
pub enum ProvisionState {
    /// No request has been sent.
    Pending,
    /// The user exists with a temporary password.
    Created,
    /// The user's email is marked as verified.
    EmailVerified,
    /// The provider demanded a new password in `session`.
    AuthInitiated {
        /// The provider's opaque session, to be echoed back verbatim.
        session: String,
    },
    /// The password is permanent. Provisioning is complete.
    PasswordConfirmed,
}

impl ProvisionState {
    /// A short name for the state, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            ProvisionState::Pending => "pending",
            ProvisionState::Created => "created",
            ProvisionState::EmailVerified => "email-verified",
            ProvisionState::AuthInitiated { .. } => "auth-initiated",
            ProvisionState::PasswordConfirmed => "password-confirmed",
        }
    }
}

// Sessions are bearer secrets; keep them out of logs.
impl fmt::Debug for ProvisionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Drives the provisioning of one user.
#[derive(Debug)]
pub struct Provisioner<'a> {
    client: &'a Client,
    user: NewUser,
    state: ProvisionState,
}

impl<'a> Provisioner<'a> {
    /// Prepares to provision `user`. Nothing is sent until the first
    /// [`step`](Provisioner::step).
    pub fn new(client: &'a Client, user: NewUser) -> Provisioner<'a> {
        Provisioner::resume(client, user, ProvisionState::Pending)
    }

    /// Picks provisioning of `user` back up from `state`.
    pub fn resume(client: &'a Client, user: NewUser, state: ProvisionState) -> Provisioner<'a> {
        Provisioner {
            client,
            user,
            state,
        }
    }

    /// The user being provisioned.
    pub fn user(&self) -> &NewUser {
        &self.user
    }

    /// The last state reached.
    pub fn state(&self) -> &ProvisionState {
        &self.state
    }

    /// Reports whether provisioning is complete.
    pub fn is_done(&self) -> bool {
        self.state == ProvisionState::PasswordConfirmed
    }

    /// Sends the next request and advances the state.
    ///
    /// On error the state is left unchanged. Once provisioning is complete
    /// this is a no-op.
    pub async fn step(&mut self) -> Result<&ProvisionState, Error> {
        let next = match &self.state {
            ProvisionState::Pending => {
                self.create().await?;
                ProvisionState::Created
            }
            ProvisionState::Created => {
                self.verify_email().await?;
                ProvisionState::EmailVerified
            }
            ProvisionState::EmailVerified => ProvisionState::AuthInitiated {
                session: self.initiate_auth().await?,
            },
            ProvisionState::AuthInitiated { session } => {
                self.confirm_password(session).await?;
                ProvisionState::PasswordConfirmed
            }
            ProvisionState::PasswordConfirmed => return Ok(&self.state),
        };
        debug!(
            username = %self.user.username,
            from = self.state.name(),
            to = next.name(),
            "provisioning advanced"
        );
        self.state = next;
        Ok(&self.state)
    }

    /// Steps until provisioning is complete.
    pub async fn run(mut self) -> Result<(), Error> {
        while !self.is_done() {
            let result = self.step().await.map(|_| ());
            if let Err(err) = result {
                warn!(
                    username = %self.user.username,
                    state = self.state.name(),
                    "provisioning stopped: {err}"
                );
                return Err(err);
            }
        }
        Ok(())
    }

    async fn create(&self) -> Result<(), Error> {
        self.client
            .admin()
            .admin_create_user()
            .username(&self.user.username)
            .temporary_password(&self.user.password)
            .user_pool_id(&self.user.user_pool_id)
            .set_user_attributes(Some(self.user.attributes.clone()))
            .send()
            .await?;
        Ok(())
    }

    async fn verify_email(&self) -> Result<(), Error> {
        self.client
            .admin()
            .admin_update_user_attributes()
            .username(&self.user.username)
            .user_pool_id(&self.user.user_pool_id)
            .user_attributes(attribute(EMAIL_VERIFIED, "true")?)
            .send()
            .await?;
        Ok(())
    }

    async fn initiate_auth(&self) -> Result<String, Error> {
        let output = admin_password_auth(
            self.client.admin(),
            &self.user.username,
            &self.user.password,
            &self.user.user_pool_id,
            &self.user.app_client_id,
        )
        .send()
        .await?;
        match (output.challenge_name(), output.session()) {
            (Some(ChallengeNameType::NewPasswordRequired), Some(session)) => Ok(session.into()),
            (challenge, _) => Err(Error::UnexpectedChallenge(challenge.cloned())),
        }
    }

    async fn confirm_password(&self, session: &str) -> Result<(), Error> {
        self.client
            .admin()
            .admin_respond_to_auth_challenge()
            .user_pool_id(&self.user.user_pool_id)
            .client_id(&self.user.app_client_id)
            .challenge_name(ChallengeNameType::NewPasswordRequired)
            .challenge_responses("USERNAME", &self.user.username)
            .challenge_responses("NEW_PASSWORD", &self.user.password)
            .session(session)
            .send()
            .await?;
        Ok(())
    }
}
