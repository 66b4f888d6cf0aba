// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Operation handlers.
//!
//! Each handler takes the decoded request body and returns the response body
//! or the service error to report. Handlers hold the pool lock for their
//! whole duration, so each operation is atomic with respect to the others.

pub mod auth;
pub mod group;
pub mod user;

use std::collections::BTreeMap;

use crate::models::{Pool, ServiceError};

pub(crate) fn pool_mut<'a>(
    pools: &'a mut BTreeMap<String, Pool>,
    user_pool_id: &str,
) -> Result<&'a mut Pool, ServiceError> {
    pools.get_mut(user_pool_id).ok_or_else(|| {
        ServiceError::resource_not_found(format!("User pool {user_pool_id} does not exist."))
    })
}

pub(crate) fn required<'a>(
    params: &'a BTreeMap<String, String>,
    name: &str,
) -> Result<&'a String, ServiceError> {
    params
        .get(name)
        .ok_or_else(|| {
            ServiceError::invalid_parameter(format!("Missing required parameter {name}"))
        })
}
