// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Administrative client for Cognito user pools.
//!
//! [`Client`] exposes one method per administrative operation: creating,
//! enabling, disabling and deleting users, managing their group memberships,
//! authenticating them on the server side, and listing them. Every method is
//! a thin wrapper around a single request to the identity provider, except
//! [`Client::create_user`], which runs the multi-step [`Provisioner`].
//!
//! The provider owns all of the logic: password policy, token issuance,
//! persistence and pagination. Its errors are returned unchanged as
//! [`Error::Provider`]. This crate adds no retries, timeouts or caching of its
//! own; callers that need them wrap the calls themselves.

#![warn(missing_docs, missing_debug_implementations)]

mod client;
mod config;
mod error;
mod provision;
mod settings;

pub use crate::client::Client;
pub use crate::config::ClientConfig;
pub use crate::error::Error;
pub use crate::provision::{NewUser, ProvisionState, Provisioner, attribute};
pub use crate::settings::{SETTINGS_FILE_VAR, Settings};
