// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! A mock of the Cognito user pool admin API.
//!
//! The server speaks the AWS JSON 1.1 protocol the SDK uses, so a regular
//! `aws_sdk_cognitoidentityprovider::Client` pointed at
//! [`CognitoMockServer::base_url`] exercises the same request and error
//! paths it would against the real service.

mod filter;
mod handlers;
mod models;
mod server;
mod utils;

pub use crate::models::PoolConfig;
pub use crate::server::{CognitoMockServer, MockConfig};
pub use crate::utils::Claims;
