// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! AWS Cognito user pool client.

use aws_sdk_cognitoidentityprovider::Client;
use aws_types::SdkConfig;

/// Creates a new Cognito identity provider client from the given SDK
/// configuration.
pub fn new_client(sdk_config: &SdkConfig) -> Client {
    let conf = aws_sdk_cognitoidentityprovider::config::Builder::from(sdk_config).build();
    Client::from_conf(conf)
}
