// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Runs the full user lifecycle against a real user pool.
//!
//! These tests are skipped unless settings are available. Point
//! `SSO_USER_ADMIN_SETTINGS` at a settings file, or set
//! `SSO_COGNITO_USER_POOL_ID`, `SSO_COGNITO_APP_CLIENT_ID`, `SSO_AWS_PROFILE`
//! and optionally `SSO_AWS_REGION`. The pool must contain the group named by
//! `SSO_COGNITO_GROUP` (default `SSOGroup`).

use sso_user_admin::{Client, ClientConfig, Settings, attribute};
use uuid::Uuid;

const PASSWORD: &str = "Pass123$";

fn is_var_truthy(var: &str) -> bool {
    match std::env::var(var) {
        Ok(value) => !matches!(value.as_str(), "" | "0" | "false" | "off" | "no"),
        Err(_) => false,
    }
}

async fn live_client() -> Option<(Settings, Client)> {
    let settings = match Settings::from_env().unwrap() {
        Some(settings) => settings,
        None => {
            if is_var_truthy("CI") {
                panic!("CI is supposed to run this test but something has gone wrong!");
            }
            return None;
        }
    };
    let client = ClientConfig::new(&settings.profile, &settings.region)
        .build()
        .await
        .unwrap();
    Some((settings, client))
}

#[tokio::test]
async fn test_live_user_lifecycle() {
    let Some((settings, client)) = live_client().await else {
        return;
    };
    let pool = &settings.user_pool_id;
    let app_client = &settings.app_client_id;
    let group = std::env::var("SSO_COGNITO_GROUP").unwrap_or_else(|_| "SSOGroup".into());
    let username = format!("sso-user-admin-{}@example.com", Uuid::new_v4());

    let attributes = vec![
        attribute("name", "User Test").unwrap(),
        attribute("email", &username).unwrap(),
    ];
    client
        .create_user(&username, PASSWORD, pool, app_client, attributes)
        .await
        .unwrap();

    let output = client
        .authenticate_user(&username, PASSWORD, pool, app_client)
        .await
        .unwrap();
    assert!(output.authentication_result().is_some());

    client.add_user_to_group(&username, pool, &group).await.unwrap();
    client
        .remove_user_from_group(&username, pool, &group)
        .await
        .unwrap();

    client.disable_user(&username, pool).await.unwrap();
    assert!(
        client
            .authenticate_user(&username, PASSWORD, pool, app_client)
            .await
            .is_err()
    );
    client.enable_user(&username, pool).await.unwrap();

    let page = client
        .list_users(pool, vec![], &format!("username = \"{username}\""), 20, None)
        .await
        .unwrap();
    assert_eq!(page.users().len(), 1);

    client.delete_user(&username, pool).await.unwrap();
}
