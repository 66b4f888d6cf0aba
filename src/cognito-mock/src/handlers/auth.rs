// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::BTreeMap;

use chrono::Utc;
use uuid::Uuid;

use crate::handlers::{pool_mut, required};
use crate::models::*;
use crate::server::Context;
use crate::utils::{check_password, generate_tokens};

pub const NEW_PASSWORD_REQUIRED: &str = "NEW_PASSWORD_REQUIRED";

// Flows in which the server presents the user's password on their behalf.
const ADMIN_PASSWORD_FLOWS: &[&str] = &["ADMIN_NO_SRP_AUTH", "ADMIN_USER_PASSWORD_AUTH"];

// https://docs.aws.amazon.com/cognito-user-identity-pools/latest/APIReference/API_AdminInitiateAuth.html
pub fn admin_initiate_auth(
    context: &Context,
    request: AdminInitiateAuthRequest,
) -> Result<AuthResponse, ServiceError> {
    let mut pools = context.pools.lock().unwrap();
    let pool = pool_mut(&mut pools, &request.user_pool_id)?;
    pool.check_client(&request.client_id)?;
    if !ADMIN_PASSWORD_FLOWS.contains(&request.auth_flow.as_str()) {
        return Err(ServiceError::invalid_parameter(format!(
            "Unsupported auth flow {}.",
            request.auth_flow
        )));
    }
    let username = required(&request.auth_parameters, "USERNAME")?;
    let password = required(&request.auth_parameters, "PASSWORD")?;

    let user = pool.user(username)?;
    if !user.enabled {
        return Err(ServiceError::not_authorized("User is disabled."));
    }
    if user.password != *password {
        return Err(ServiceError::not_authorized("Incorrect username or password."));
    }

    let status = user.status;
    match status {
        UserStatus::ForceChangePassword => {
            let mut user_attributes = user.attributes.clone();
            user_attributes.remove("sub");
            let user_attributes = serde_json::to_string(&user_attributes)
                .map_err(|e| ServiceError::internal(e.to_string()))?;
            let challenge_parameters = BTreeMap::from([
                ("USER_ID_FOR_SRP".to_string(), user.username.clone()),
                ("requiredAttributes".to_string(), "[]".to_string()),
                ("userAttributes".to_string(), user_attributes),
            ]);

            // Only the latest challenge can be answered.
            pool.drop_sessions(username);
            let session = Uuid::new_v4().to_string();
            pool.sessions.insert(
                session.clone(),
                Session {
                    username: username.clone(),
                    client_id: request.client_id.clone(),
                },
            );
            Ok(AuthResponse {
                challenge_name: Some(NEW_PASSWORD_REQUIRED.into()),
                session: Some(session),
                challenge_parameters,
                authentication_result: None,
            })
        }
        UserStatus::Confirmed => {
            let tokens = generate_tokens(context, &pool.id, &request.client_id, user)?;
            Ok(AuthResponse {
                authentication_result: Some(tokens),
                ..Default::default()
            })
        }
    }
}

// https://docs.aws.amazon.com/cognito-user-identity-pools/latest/APIReference/API_AdminRespondToAuthChallenge.html
pub fn admin_respond_to_auth_challenge(
    context: &Context,
    request: AdminRespondToAuthChallengeRequest,
) -> Result<AuthResponse, ServiceError> {
    let mut pools = context.pools.lock().unwrap();
    let pool = pool_mut(&mut pools, &request.user_pool_id)?;
    pool.check_client(&request.client_id)?;
    if request.challenge_name != NEW_PASSWORD_REQUIRED {
        return Err(ServiceError::invalid_parameter(format!(
            "Unsupported challenge {}.",
            request.challenge_name
        )));
    }
    let username = required(&request.challenge_responses, "USERNAME")?;
    let new_password = required(&request.challenge_responses, "NEW_PASSWORD")?;

    let expected = Session {
        username: username.clone(),
        client_id: request.client_id.clone(),
    };
    let session_id = request.session.as_deref().unwrap_or_default();
    if pool.sessions.get(session_id) != Some(&expected) {
        return Err(ServiceError::not_authorized("Invalid session for the user."));
    }
    if pool.user(username)?.status != UserStatus::ForceChangePassword {
        return Err(ServiceError::not_authorized("User does not need a new password."));
    }
    check_password(new_password)?;
    pool.drop_sessions(username);

    let user = pool.user_mut(username)?;
    user.password = new_password.clone();
    user.status = UserStatus::Confirmed;
    user.updated_at = Utc::now();

    let user = pool.user(username)?;
    let tokens = generate_tokens(context, &pool.id, &request.client_id, user)?;
    Ok(AuthResponse {
        authentication_result: Some(tokens),
        ..Default::default()
    })
}
