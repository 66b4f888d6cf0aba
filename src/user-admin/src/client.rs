// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use aws_sdk_cognitoidentityprovider::operation::admin_get_user::AdminGetUserOutput;
use aws_sdk_cognitoidentityprovider::operation::admin_initiate_auth::AdminInitiateAuthOutput;
use aws_sdk_cognitoidentityprovider::operation::admin_initiate_auth::builders::AdminInitiateAuthFluentBuilder;
use aws_sdk_cognitoidentityprovider::operation::admin_list_groups_for_user::AdminListGroupsForUserOutput;
use aws_sdk_cognitoidentityprovider::operation::list_users::ListUsersOutput;
use aws_sdk_cognitoidentityprovider::types::{AttributeType, AuthFlowType};
use tracing::{debug, instrument};

use crate::config::ClientConfig;
use crate::error::Error;
use crate::provision::{NewUser, Provisioner};

/// An administrative client for a user pool.
///
/// Holds one connection authenticated as the operator and one anonymous
/// connection. Both are immutable after construction, so the client can be
/// cloned and shared freely across tasks.
#[derive(Clone, Debug)]
pub struct Client {
    admin: CognitoClient,
    anonymous: CognitoClient,
}

impl Client {
    /// Creates a client that authenticates with the named credentials profile
    /// against the identity provider in `region`.
    ///
    /// See [`ClientConfig`] for more options.
    pub async fn new(
        profile: impl Into<String>,
        region: impl Into<String>,
    ) -> Result<Client, Error> {
        ClientConfig::new(profile, region).build().await
    }

    pub(crate) fn from_parts(admin: CognitoClient, anonymous: CognitoClient) -> Client {
        Client { admin, anonymous }
    }

    /// The connection authenticated with the operator's credentials.
    pub fn admin(&self) -> &CognitoClient {
        &self.admin
    }

    /// The unauthenticated connection.
    ///
    /// None of the administrative operations use it; it is there for
    /// operations that the provider allows without credentials.
    pub fn anonymous(&self) -> &CognitoClient {
        &self.anonymous
    }

    /// Creates a user and confirms `password` as their permanent password.
    ///
    /// This runs the four steps of [`Provisioner`] to completion. There is no
    /// rollback: if a later step fails, the user is left in whatever state
    /// the earlier steps reached.
    #[instrument(level = "debug", skip(self, password, attributes))]
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        user_pool_id: &str,
        app_client_id: &str,
        attributes: Vec<AttributeType>,
    ) -> Result<(), Error> {
        let user = NewUser {
            username: username.into(),
            password: password.into(),
            user_pool_id: user_pool_id.into(),
            app_client_id: app_client_id.into(),
            attributes,
        };
        Provisioner::new(self, user).run().await
    }

    /// Adds the user to the group.
    #[instrument(level = "debug", skip(self))]
    pub async fn add_user_to_group(
        &self,
        username: &str,
        user_pool_id: &str,
        group_name: &str,
    ) -> Result<(), Error> {
        self.admin
            .admin_add_user_to_group()
            .username(username)
            .user_pool_id(user_pool_id)
            .group_name(group_name)
            .send()
            .await?;
        Ok(())
    }

    /// Removes the user from the group.
    #[instrument(level = "debug", skip(self))]
    pub async fn remove_user_from_group(
        &self,
        username: &str,
        user_pool_id: &str,
        group_name: &str,
    ) -> Result<(), Error> {
        self.admin
            .admin_remove_user_from_group()
            .username(username)
            .user_pool_id(user_pool_id)
            .group_name(group_name)
            .send()
            .await?;
        Ok(())
    }

    /// Lists the groups the user belongs to, one page at a time.
    #[instrument(level = "debug", skip(self))]
    pub async fn list_groups_for_user(
        &self,
        username: &str,
        user_pool_id: &str,
        limit: Option<i32>,
        next_token: Option<String>,
    ) -> Result<AdminListGroupsForUserOutput, Error> {
        let output = self
            .admin
            .admin_list_groups_for_user()
            .username(username)
            .user_pool_id(user_pool_id)
            .set_limit(limit)
            .set_next_token(next_token)
            .send()
            .await?;
        debug!(groups = output.groups().len(), "listed groups for user");
        Ok(output)
    }

    /// Authenticates the user with the administrative, server-side password
    /// flow.
    ///
    /// The password is sent to the provider as-is instead of going through
    /// the SRP exchange, so this is only appropriate for trusted backends.
    /// Returns the provider's answer unchanged: either tokens or a further
    /// challenge.
    #[instrument(level = "debug", skip(self, password))]
    pub async fn authenticate_user(
        &self,
        username: &str,
        password: &str,
        user_pool_id: &str,
        app_client_id: &str,
    ) -> Result<AdminInitiateAuthOutput, Error> {
        let output = admin_password_auth(
            &self.admin,
            username,
            password,
            user_pool_id,
            app_client_id,
        )
        .send()
        .await?;
        debug!(challenge = ?output.challenge_name(), "authenticated user");
        Ok(output)
    }

    /// Disables the user's account.
    #[instrument(level = "debug", skip(self))]
    pub async fn disable_user(&self, username: &str, user_pool_id: &str) -> Result<(), Error> {
        self.admin
            .admin_disable_user()
            .username(username)
            .user_pool_id(user_pool_id)
            .send()
            .await?;
        Ok(())
    }

    /// Re-enables a disabled account.
    #[instrument(level = "debug", skip(self))]
    pub async fn enable_user(&self, username: &str, user_pool_id: &str) -> Result<(), Error> {
        self.admin
            .admin_enable_user()
            .username(username)
            .user_pool_id(user_pool_id)
            .send()
            .await?;
        Ok(())
    }

    /// Permanently deletes the user.
    #[instrument(level = "debug", skip(self))]
    pub async fn delete_user(&self, username: &str, user_pool_id: &str) -> Result<(), Error> {
        self.admin
            .admin_delete_user()
            .username(username)
            .user_pool_id(user_pool_id)
            .send()
            .await?;
        Ok(())
    }

    /// Looks up a single user.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_user(
        &self,
        username: &str,
        user_pool_id: &str,
    ) -> Result<AdminGetUserOutput, Error> {
        let output = self
            .admin
            .admin_get_user()
            .username(username)
            .user_pool_id(user_pool_id)
            .send()
            .await?;
        Ok(output)
    }

    /// Fetches one page of the users matching `filter`.
    ///
    /// An empty `attributes_to_get` returns every attribute and an empty
    /// `filter` matches every user. Pass the previous page's pagination token
    /// to continue a listing.
    #[instrument(level = "debug", skip(self))]
    pub async fn list_users(
        &self,
        user_pool_id: &str,
        attributes_to_get: Vec<String>,
        filter: &str,
        limit: i32,
        pagination_token: Option<String>,
    ) -> Result<ListUsersOutput, Error> {
        let attributes_to_get = (!attributes_to_get.is_empty()).then_some(attributes_to_get);
        let filter = (!filter.is_empty()).then(|| filter.to_string());
        let output = self
            .admin
            .list_users()
            .user_pool_id(user_pool_id)
            .set_attributes_to_get(attributes_to_get)
            .set_filter(filter)
            .limit(limit)
            .set_pagination_token(pagination_token)
            .send()
            .await?;
        debug!(
            users = output.users().len(),
            more = output.pagination_token().is_some(),
            "listed users"
        );
        Ok(output)
    }
}

/// Builds an `AdminInitiateAuth` request for the `ADMIN_NO_SRP_AUTH` flow.
pub(crate) fn admin_password_auth(
    client: &CognitoClient,
    username: &str,
    password: &str,
    user_pool_id: &str,
    app_client_id: &str,
) -> AdminInitiateAuthFluentBuilder {
    client
        .admin_initiate_auth()
        .user_pool_id(user_pool_id)
        .client_id(app_client_id)
        .auth_flow(AuthFlowType::AdminNoSrpAuth)
        .auth_parameters("USERNAME", username)
        .auth_parameters("PASSWORD", password)
}
