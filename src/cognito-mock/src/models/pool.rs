// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{AttributeType, GroupType, ServiceError, UserType};

/// Initial configuration of a mocked user pool.
///
/// JSON of the form: `{"id": "...", "client_ids": ["..."], "groups": ["..."]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolConfig {
    pub id: String,
    #[serde(default)]
    pub client_ids: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStatus {
    ForceChangePassword,
    Confirmed,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::ForceChangePassword => "FORCE_CHANGE_PASSWORD",
            UserStatus::Confirmed => "CONFIRMED",
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub username: String,
    pub password: String,
    pub attributes: BTreeMap<String, String>,
    pub enabled: bool,
    pub status: UserStatus,
    pub groups: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Renders the user, keeping only the `projection` attributes when it is
    /// non-empty.
    pub fn to_user_type(&self, projection: &[String]) -> UserType {
        UserType {
            username: self.username.clone(),
            attributes: self.attribute_types(projection),
            user_create_date: epoch_seconds(&self.created_at),
            user_last_modified_date: epoch_seconds(&self.updated_at),
            enabled: self.enabled,
            user_status: self.status.as_str().to_string(),
        }
    }

    pub fn attribute_types(&self, projection: &[String]) -> Vec<AttributeType> {
        self.attributes
            .iter()
            .filter(|(name, _)| projection.is_empty() || projection.contains(name))
            .map(|(name, value)| AttributeType {
                name: name.clone(),
                value: Some(value.clone()),
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct Group {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A challenge session handed out by `AdminInitiateAuth`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub client_id: String,
}

#[derive(Debug, Clone)]
pub struct Pool {
    pub id: String,
    pub clients: BTreeSet<String>,
    pub groups: BTreeMap<String, Group>,
    pub users: BTreeMap<String, User>,
    // Session ID -> session.
    pub sessions: BTreeMap<String, Session>,
}

impl Pool {
    pub fn new(config: PoolConfig, now: DateTime<Utc>) -> Pool {
        Pool {
            id: config.id,
            clients: config.client_ids.into_iter().collect(),
            groups: config
                .groups
                .into_iter()
                .map(|name| {
                    let group = Group {
                        name: name.clone(),
                        created_at: now,
                    };
                    (name, group)
                })
                .collect(),
            users: BTreeMap::new(),
            sessions: BTreeMap::new(),
        }
    }

    /// Forgets every outstanding challenge session of `username`.
    pub fn drop_sessions(&mut self, username: &str) {
        self.sessions.retain(|_, session| session.username != username);
    }

    pub fn check_client(&self, client_id: &str) -> Result<(), ServiceError> {
        if self.clients.contains(client_id) {
            Ok(())
        } else {
            Err(ServiceError::resource_not_found(format!(
                "User pool client {client_id} does not exist."
            )))
        }
    }

    pub fn check_group(&self, group_name: &str) -> Result<(), ServiceError> {
        if self.groups.contains_key(group_name) {
            Ok(())
        } else {
            Err(ServiceError::resource_not_found("Group not found."))
        }
    }

    pub fn user(&self, username: &str) -> Result<&User, ServiceError> {
        self.users.get(username).ok_or_else(ServiceError::user_not_found)
    }

    pub fn user_mut(&mut self, username: &str) -> Result<&mut User, ServiceError> {
        self.users
            .get_mut(username)
            .ok_or_else(ServiceError::user_not_found)
    }

    pub fn group_type(&self, group: &Group) -> GroupType {
        GroupType {
            group_name: group.name.clone(),
            user_pool_id: self.id.clone(),
            creation_date: epoch_seconds(&group.created_at),
            last_modified_date: epoch_seconds(&group.created_at),
        }
    }
}

/// Timestamps travel as fractional seconds since the epoch.
pub fn epoch_seconds(ts: &DateTime<Utc>) -> f64 {
    ts.timestamp_millis() as f64 / 1000.0
}
