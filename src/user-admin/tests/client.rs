// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Exercises the client against the mock user pool.

use std::io::Write;

use aws_sdk_cognitoidentityprovider::Error as CognitoError;
use aws_sdk_cognitoidentityprovider::operation::admin_list_groups_for_user::AdminListGroupsForUserOutput;
use aws_sdk_cognitoidentityprovider::types::UserStatusType;
use sso_cognito_mock::{CognitoMockServer, MockConfig, PoolConfig};
use sso_user_admin::{
    Client, ClientConfig, Error, NewUser, ProvisionState, Provisioner, attribute,
};
use tempfile::NamedTempFile;

const PROFILE: &str = "sso-admin";
const REGION: &str = "us-east-1";
const POOL: &str = "us-east-1_mock";
const APP_CLIENT: &str = "mock-app-client";
const GROUP: &str = "SSOGroup";

const USERNAME: &str = "cognito-test1@example.com";
const PASSWORD: &str = "Pass123$";

struct Harness {
    server: CognitoMockServer,
    client: Client,
    credentials: NamedTempFile,
}

fn credentials_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[{PROFILE}]\n\
         aws_access_key_id = AKIDADMIN\n\
         aws_secret_access_key = admin-secret\n"
    )
    .unwrap();
    file
}

async fn harness() -> Harness {
    let pool = PoolConfig {
        id: POOL.into(),
        client_ids: vec![APP_CLIENT.into()],
        groups: vec![GROUP.into()],
    };
    let server = CognitoMockServer::start(None, vec![pool], MockConfig::default())
        .await
        .unwrap();
    let credentials = credentials_file();
    let client = ClientConfig::new(PROFILE, REGION)
        .credentials_file(credentials.path())
        .endpoint(&server.base_url)
        .build()
        .await
        .unwrap();
    Harness {
        server,
        client,
        credentials,
    }
}

async fn create_test_user(client: &Client) {
    let attributes = vec![
        attribute("name", "User Test").unwrap(),
        attribute("email", USERNAME).unwrap(),
    ];
    client
        .create_user(USERNAME, PASSWORD, POOL, APP_CLIENT, attributes)
        .await
        .unwrap();
}

fn new_user(username: &str, app_client_id: &str) -> NewUser {
    NewUser {
        username: username.into(),
        password: PASSWORD.into(),
        user_pool_id: POOL.into(),
        app_client_id: app_client_id.into(),
        attributes: vec![attribute("name", "User Test").unwrap()],
    }
}

#[tokio::test]
async fn test_create_and_authenticate_user() {
    let Harness { server, client, .. } = harness().await;
    create_test_user(&client).await;

    assert_eq!(server.request_count("AdminCreateUser"), 1);
    assert_eq!(server.request_count("AdminUpdateUserAttributes"), 1);
    assert_eq!(server.request_count("AdminInitiateAuth"), 1);
    assert_eq!(server.request_count("AdminRespondToAuthChallenge"), 1);

    let user = client.get_user(USERNAME, POOL).await.unwrap();
    assert_eq!(user.user_status(), Some(&UserStatusType::Confirmed));
    assert!(user.enabled());
    let email_verified = user
        .user_attributes()
        .iter()
        .find(|attr| attr.name() == "email_verified")
        .and_then(|attr| attr.value());
    assert_eq!(email_verified, Some("true"));

    let output = client
        .authenticate_user(USERNAME, PASSWORD, POOL, APP_CLIENT)
        .await
        .unwrap();
    assert_eq!(output.challenge_name(), None);
    let result = output.authentication_result().unwrap();
    let access_token = result.access_token().unwrap();
    assert!(!access_token.is_empty());
    let claims = server.decode_token(access_token).unwrap();
    assert_eq!(claims.username, USERNAME);
    assert_eq!(claims.client_id.as_deref(), Some(APP_CLIENT));

    client.delete_user(USERNAME, POOL).await.unwrap();
}

#[tokio::test]
async fn test_authenticate_wrong_password() {
    let Harness { client, .. } = harness().await;
    create_test_user(&client).await;

    let err = client
        .authenticate_user(USERNAME, "Wrong123$", POOL, APP_CLIENT)
        .await
        .unwrap_err();
    assert!(
        matches!(err, Error::Provider(CognitoError::NotAuthorizedException(_))),
        "{err:?}"
    );
}

#[tokio::test]
async fn test_list_users() {
    let Harness { client, .. } = harness().await;

    let page = client
        .list_users(POOL, vec![], "", 20, None)
        .await
        .unwrap();
    assert!(page.users().is_empty());
    assert_eq!(page.pagination_token(), None);

    create_test_user(&client).await;
    client
        .create_user("other@example.com", PASSWORD, POOL, APP_CLIENT, vec![])
        .await
        .unwrap();

    let page = client
        .list_users(POOL, vec![], "", 20, None)
        .await
        .unwrap();
    let usernames: Vec<_> = page.users().iter().filter_map(|u| u.username()).collect();
    assert_eq!(usernames, vec![USERNAME, "other@example.com"]);

    let page = client
        .list_users(
            POOL,
            vec!["name".into()],
            "username ^= \"cognito-\"",
            20,
            None,
        )
        .await
        .unwrap();
    assert_eq!(page.users().len(), 1);
    let attributes = page.users()[0].attributes();
    assert_eq!(attributes.len(), 1);
    assert_eq!(attributes[0].name(), "name");
    assert_eq!(attributes[0].value(), Some("User Test"));

    let first = client
        .list_users(POOL, vec![], "", 1, None)
        .await
        .unwrap();
    assert_eq!(first.users().len(), 1);
    let token = first.pagination_token().map(|t| t.to_string());
    assert!(token.is_some());
    let second = client
        .list_users(POOL, vec![], "", 1, token)
        .await
        .unwrap();
    assert_eq!(second.users()[0].username(), Some("other@example.com"));
    assert_eq!(second.pagination_token(), None);

    let err = client
        .list_users("us-east-1_missing", vec![], "", 20, None)
        .await
        .unwrap_err();
    assert!(
        matches!(err, Error::Provider(CognitoError::ResourceNotFoundException(_))),
        "{err:?}"
    );
}

#[tokio::test]
async fn test_add_remove_user_to_group() {
    let Harness { client, .. } = harness().await;
    create_test_user(&client).await;

    let groups = |output: AdminListGroupsForUserOutput| {
        output
            .groups()
            .iter()
            .filter_map(|g| g.group_name().map(|n| n.to_string()))
            .collect::<Vec<_>>()
    };

    client.add_user_to_group(USERNAME, POOL, GROUP).await.unwrap();
    // Adding twice is fine; membership is a set.
    client.add_user_to_group(USERNAME, POOL, GROUP).await.unwrap();
    let output = client
        .list_groups_for_user(USERNAME, POOL, None, None)
        .await
        .unwrap();
    assert_eq!(groups(output), vec![GROUP.to_string()]);

    client
        .remove_user_from_group(USERNAME, POOL, GROUP)
        .await
        .unwrap();
    client
        .remove_user_from_group(USERNAME, POOL, GROUP)
        .await
        .unwrap();
    let output = client
        .list_groups_for_user(USERNAME, POOL, None, None)
        .await
        .unwrap();
    assert!(groups(output).is_empty());

    let err = client
        .add_user_to_group(USERNAME, POOL, "NoSuchGroup")
        .await
        .unwrap_err();
    assert!(
        matches!(err, Error::Provider(CognitoError::ResourceNotFoundException(_))),
        "{err:?}"
    );
}

#[tokio::test]
async fn test_disable_enable_user() {
    let Harness { client, .. } = harness().await;
    create_test_user(&client).await;

    client.disable_user(USERNAME, POOL).await.unwrap();
    assert!(!client.get_user(USERNAME, POOL).await.unwrap().enabled());
    let err = client
        .authenticate_user(USERNAME, PASSWORD, POOL, APP_CLIENT)
        .await
        .unwrap_err();
    assert!(
        matches!(err, Error::Provider(CognitoError::NotAuthorizedException(_))),
        "{err:?}"
    );

    client.enable_user(USERNAME, POOL).await.unwrap();
    let output = client
        .authenticate_user(USERNAME, PASSWORD, POOL, APP_CLIENT)
        .await
        .unwrap();
    assert!(output.authentication_result().is_some());
}

#[tokio::test]
async fn test_delete_user() {
    let Harness { client, .. } = harness().await;
    create_test_user(&client).await;

    client.delete_user(USERNAME, POOL).await.unwrap();

    let err = client.get_user(USERNAME, POOL).await.unwrap_err();
    assert!(
        matches!(err, Error::Provider(CognitoError::UserNotFoundException(_))),
        "{err:?}"
    );
    let err = client.delete_user(USERNAME, POOL).await.unwrap_err();
    assert!(
        matches!(err, Error::Provider(CognitoError::UserNotFoundException(_))),
        "{err:?}"
    );
}

#[tokio::test]
async fn test_unresolvable_profile() {
    let Harness {
        server,
        credentials,
        ..
    } = harness().await;

    let err = ClientConfig::new("no-such-profile", REGION)
        .credentials_file(credentials.path())
        .endpoint(&server.base_url)
        .build()
        .await
        .unwrap_err();
    match err {
        Error::Config { profile, .. } => assert_eq!(profile, "no-such-profile"),
        err => panic!("expected a configuration error, got {err:?}"),
    }
    assert_eq!(server.total_requests(), 0);
}

#[tokio::test]
async fn test_provisioner_steps() {
    let Harness { server, client, .. } = harness().await;

    let mut provisioner = Provisioner::new(&client, new_user(USERNAME, APP_CLIENT));
    assert_eq!(provisioner.state(), &ProvisionState::Pending);

    assert_eq!(provisioner.step().await.unwrap(), &ProvisionState::Created);
    let user = client.get_user(USERNAME, POOL).await.unwrap();
    assert_eq!(user.user_status(), Some(&UserStatusType::ForceChangePassword));

    assert_eq!(
        provisioner.step().await.unwrap(),
        &ProvisionState::EmailVerified
    );

    match provisioner.step().await.unwrap() {
        ProvisionState::AuthInitiated { session } => assert!(!session.is_empty()),
        state => panic!("unexpected state {state:?}"),
    }

    assert_eq!(
        provisioner.step().await.unwrap(),
        &ProvisionState::PasswordConfirmed
    );
    assert!(provisioner.is_done());

    // Stepping a finished provisioner sends nothing.
    let before = server.total_requests();
    assert_eq!(
        provisioner.step().await.unwrap(),
        &ProvisionState::PasswordConfirmed
    );
    assert_eq!(server.total_requests(), before);

    let user = client.get_user(USERNAME, POOL).await.unwrap();
    assert_eq!(user.user_status(), Some(&UserStatusType::Confirmed));
}

#[tokio::test]
async fn test_provisioning_failure_keeps_state() {
    let Harness { client, .. } = harness().await;

    // The app client does not exist, so the auth step fails after the user
    // has already been created.
    let mut provisioner = Provisioner::new(&client, new_user(USERNAME, "no-such-client"));
    provisioner.step().await.unwrap();
    provisioner.step().await.unwrap();
    let err = provisioner.step().await.unwrap_err();
    assert!(
        matches!(err, Error::Provider(CognitoError::ResourceNotFoundException(_))),
        "{err:?}"
    );
    assert_eq!(provisioner.state(), &ProvisionState::EmailVerified);

    // Nothing was rolled back.
    let user = client.get_user(USERNAME, POOL).await.unwrap();
    assert_eq!(user.user_status(), Some(&UserStatusType::ForceChangePassword));

    // Creating the same user again fails on the first step.
    let err = client
        .create_user(USERNAME, PASSWORD, POOL, APP_CLIENT, vec![])
        .await
        .unwrap_err();
    assert!(
        matches!(err, Error::Provider(CognitoError::UsernameExistsException(_))),
        "{err:?}"
    );

    // Resuming with a valid client finishes the job.
    let mut user = provisioner.user().clone();
    user.app_client_id = APP_CLIENT.into();
    Provisioner::resume(&client, user, ProvisionState::EmailVerified)
        .run()
        .await
        .unwrap();
    client
        .authenticate_user(USERNAME, PASSWORD, POOL, APP_CLIENT)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_provisioning_unexpected_challenge() {
    let Harness { client, .. } = harness().await;
    create_test_user(&client).await;

    // The password is already permanent, so logging in yields tokens rather
    // than a challenge.
    let mut provisioner = Provisioner::resume(
        &client,
        new_user(USERNAME, APP_CLIENT),
        ProvisionState::EmailVerified,
    );
    let err = provisioner.step().await.unwrap_err();
    assert!(matches!(err, Error::UnexpectedChallenge(None)), "{err:?}");
    assert_eq!(provisioner.state(), &ProvisionState::EmailVerified);
}

#[tokio::test]
async fn test_invalid_password() {
    let Harness { client, .. } = harness().await;

    let err = client
        .create_user(USERNAME, "short", POOL, APP_CLIENT, vec![])
        .await
        .unwrap_err();
    assert!(
        matches!(err, Error::Provider(CognitoError::InvalidPasswordException(_))),
        "{err:?}"
    );
    let err = client.get_user(USERNAME, POOL).await.unwrap_err();
    assert!(
        matches!(err, Error::Provider(CognitoError::UserNotFoundException(_))),
        "{err:?}"
    );
}

#[tokio::test]
async fn test_concurrent_callers() {
    let Harness { client, .. } = harness().await;

    let mut tasks = Vec::new();
    for i in 0..8 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            let username = format!("user-{i}@example.com");
            client
                .create_user(&username, PASSWORD, POOL, APP_CLIENT, vec![])
                .await?;
            client
                .authenticate_user(&username, PASSWORD, POOL, APP_CLIENT)
                .await?;
            Ok::<_, Error>(())
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let page = client
        .list_users(POOL, vec![], "", 20, None)
        .await
        .unwrap();
    assert_eq!(page.users().len(), 8);
}
