// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use uuid::Uuid;

use crate::filter::Filter;
use crate::handlers::pool_mut;
use crate::models::*;
use crate::server::Context;
use crate::utils::{
    check_password, decode_pagination_token, generate_password, page_size, paginate,
};

// Attributes the service manages itself.
const IMMUTABLE_ATTRIBUTES: &[&str] = &["sub"];

fn check_attributes(attributes: &[AttributeType]) -> Result<(), ServiceError> {
    for attribute in attributes {
        if IMMUTABLE_ATTRIBUTES.contains(&attribute.name.as_str()) {
            return Err(ServiceError::invalid_parameter(format!(
                "Cannot modify an already provided {} attribute.",
                attribute.name
            )));
        }
    }
    Ok(())
}

// https://docs.aws.amazon.com/cognito-user-identity-pools/latest/APIReference/API_AdminCreateUser.html
pub fn admin_create_user(
    context: &Context,
    request: AdminCreateUserRequest,
) -> Result<AdminCreateUserResponse, ServiceError> {
    let mut pools = context.pools.lock().unwrap();
    let pool = pool_mut(&mut pools, &request.user_pool_id)?;

    if pool.users.contains_key(&request.username) {
        return Err(ServiceError::username_exists());
    }
    check_attributes(&request.user_attributes)?;
    let password = match request.temporary_password {
        Some(password) => {
            check_password(&password)?;
            password
        }
        None => generate_password(),
    };

    let mut attributes = BTreeMap::from([("sub".to_string(), Uuid::new_v4().to_string())]);
    for attribute in request.user_attributes {
        attributes.insert(attribute.name, attribute.value.unwrap_or_default());
    }

    let now = Utc::now();
    let user = User {
        username: request.username.clone(),
        password,
        attributes,
        enabled: true,
        status: UserStatus::ForceChangePassword,
        groups: BTreeSet::new(),
        created_at: now,
        updated_at: now,
    };
    let response = AdminCreateUserResponse {
        user: user.to_user_type(&[]),
    };
    pool.users.insert(request.username, user);
    Ok(response)
}

// https://docs.aws.amazon.com/cognito-user-identity-pools/latest/APIReference/API_AdminGetUser.html
pub fn admin_get_user(
    context: &Context,
    request: UserRequest,
) -> Result<AdminGetUserResponse, ServiceError> {
    let mut pools = context.pools.lock().unwrap();
    let pool = pool_mut(&mut pools, &request.user_pool_id)?;
    let user = pool.user(&request.username)?;
    let rendered = user.to_user_type(&[]);
    Ok(AdminGetUserResponse {
        username: rendered.username,
        user_attributes: rendered.attributes,
        user_create_date: rendered.user_create_date,
        user_last_modified_date: rendered.user_last_modified_date,
        enabled: rendered.enabled,
        user_status: rendered.user_status,
    })
}

// https://docs.aws.amazon.com/cognito-user-identity-pools/latest/APIReference/API_AdminUpdateUserAttributes.html
pub fn admin_update_user_attributes(
    context: &Context,
    request: AdminUpdateUserAttributesRequest,
) -> Result<Empty, ServiceError> {
    let mut pools = context.pools.lock().unwrap();
    let pool = pool_mut(&mut pools, &request.user_pool_id)?;
    check_attributes(&request.user_attributes)?;
    let user = pool.user_mut(&request.username)?;
    for attribute in request.user_attributes {
        user.attributes
            .insert(attribute.name, attribute.value.unwrap_or_default());
    }
    user.updated_at = Utc::now();
    Ok(Empty::default())
}

fn set_enabled(
    context: &Context,
    request: UserRequest,
    enabled: bool,
) -> Result<Empty, ServiceError> {
    let mut pools = context.pools.lock().unwrap();
    let pool = pool_mut(&mut pools, &request.user_pool_id)?;
    let user = pool.user_mut(&request.username)?;
    user.enabled = enabled;
    user.updated_at = Utc::now();
    Ok(Empty::default())
}

// https://docs.aws.amazon.com/cognito-user-identity-pools/latest/APIReference/API_AdminDisableUser.html
pub fn admin_disable_user(
    context: &Context,
    request: UserRequest,
) -> Result<Empty, ServiceError> {
    set_enabled(context, request, false)
}

// https://docs.aws.amazon.com/cognito-user-identity-pools/latest/APIReference/API_AdminEnableUser.html
pub fn admin_enable_user(
    context: &Context,
    request: UserRequest,
) -> Result<Empty, ServiceError> {
    set_enabled(context, request, true)
}

// https://docs.aws.amazon.com/cognito-user-identity-pools/latest/APIReference/API_AdminDeleteUser.html
pub fn admin_delete_user(
    context: &Context,
    request: UserRequest,
) -> Result<Empty, ServiceError> {
    let mut pools = context.pools.lock().unwrap();
    let pool = pool_mut(&mut pools, &request.user_pool_id)?;
    if pool.users.remove(&request.username).is_none() {
        return Err(ServiceError::user_not_found());
    }
    // Outstanding challenges die with the user.
    pool.drop_sessions(&request.username);
    Ok(Empty::default())
}

// https://docs.aws.amazon.com/cognito-user-identity-pools/latest/APIReference/API_ListUsers.html
pub fn list_users(
    context: &Context,
    request: ListUsersRequest,
) -> Result<ListUsersResponse, ServiceError> {
    let size = page_size(request.limit)?;
    let offset = decode_pagination_token(request.pagination_token.as_deref())?;
    let filter: Filter = request.filter.as_deref().unwrap_or_default().parse()?;

    let mut pools = context.pools.lock().unwrap();
    let pool = pool_mut(&mut pools, &request.user_pool_id)?;
    let matching: Vec<_> = pool
        .users
        .values()
        .filter(|user| filter.matches(user))
        .map(|user| user.to_user_type(&request.attributes_to_get))
        .collect();
    let (users, pagination_token) = paginate(matching, offset, size);
    Ok(ListUsersResponse {
        users,
        pagination_token,
    })
}
