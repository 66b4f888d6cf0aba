// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Internal AWS utility library.

#![warn(missing_docs, missing_debug_implementations)]

use aws_config::{BehaviorVersion, ConfigLoader};

pub mod profile;

#[cfg(feature = "cognito")]
pub mod cognito;

/// Creates an AWS SDK configuration loader with the defaults for the latest
/// behavior version.
///
/// Callers are expected to layer their own region, credentials and endpoint
/// on top of the returned loader before calling [`ConfigLoader::load`].
pub fn defaults() -> ConfigLoader {
    // We pin the SDK crate versions, so taking the latest behavior version
    // only changes behavior when we bump those pins.
    aws_config::defaults(BehaviorVersion::latest())
}
