// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::Utc;

use crate::handlers::pool_mut;
use crate::models::*;
use crate::server::Context;
use crate::utils::{decode_pagination_token, page_size, paginate};

// https://docs.aws.amazon.com/cognito-user-identity-pools/latest/APIReference/API_AdminAddUserToGroup.html
pub fn admin_add_user_to_group(
    context: &Context,
    request: GroupMembershipRequest,
) -> Result<Empty, ServiceError> {
    let mut pools = context.pools.lock().unwrap();
    let pool = pool_mut(&mut pools, &request.user_pool_id)?;
    pool.check_group(&request.group_name)?;
    let user = pool.user_mut(&request.username)?;
    if user.groups.insert(request.group_name) {
        user.updated_at = Utc::now();
    }
    Ok(Empty::default())
}

// https://docs.aws.amazon.com/cognito-user-identity-pools/latest/APIReference/API_AdminRemoveUserFromGroup.html
pub fn admin_remove_user_from_group(
    context: &Context,
    request: GroupMembershipRequest,
) -> Result<Empty, ServiceError> {
    let mut pools = context.pools.lock().unwrap();
    let pool = pool_mut(&mut pools, &request.user_pool_id)?;
    pool.check_group(&request.group_name)?;
    let user = pool.user_mut(&request.username)?;
    if user.groups.remove(&request.group_name) {
        user.updated_at = Utc::now();
    }
    Ok(Empty::default())
}

// https://docs.aws.amazon.com/cognito-user-identity-pools/latest/APIReference/API_AdminListGroupsForUser.html
pub fn admin_list_groups_for_user(
    context: &Context,
    request: AdminListGroupsForUserRequest,
) -> Result<AdminListGroupsForUserResponse, ServiceError> {
    let size = page_size(request.limit)?;
    let offset = decode_pagination_token(request.next_token.as_deref())?;

    let mut pools = context.pools.lock().unwrap();
    let pool = pool_mut(&mut pools, &request.user_pool_id)?;
    let user = pool.user(&request.username)?;
    let groups: Vec<_> = user
        .groups
        .iter()
        .filter_map(|name| pool.groups.get(name))
        .map(|group| pool.group_type(group))
        .collect();
    let (groups, next_token) = paginate(groups, offset, size);
    Ok(AdminListGroupsForUserResponse { groups, next_token })
}
