// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The `ListUsers` filter expression language.
//!
//! The service accepts a single comparison of the form `attribute = "value"`
//! (exact match) or `attribute ^= "value"` (prefix match) on one of the
//! [`SEARCHABLE_ATTRIBUTES`]. An empty filter matches every user.

use std::str::FromStr;

use crate::models::{ServiceError, User};

pub const SEARCHABLE_ATTRIBUTES: &[&str] = &[
    "username",
    "email",
    "phone_number",
    "name",
    "given_name",
    "family_name",
    "preferred_username",
    "cognito:user_status",
    "status",
    "sub",
];

/// Compared case-insensitively; everything else is exact.
const USER_STATUS: &str = "cognito:user_status";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    All,
    Equals { attribute: String, value: String },
    StartsWith { attribute: String, value: String },
}

impl FromStr for Filter {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Filter, ServiceError> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Filter::All);
        }
        let invalid = || ServiceError::invalid_parameter(format!("Invalid search filter {s:?}."));

        // The operator must appear before the quoted value.
        let head = s.find('"').map_or(s, |quote| &s[..quote]);
        let (at, operator_len, prefix) = match (head.find("^="), head.find('=')) {
            (Some(at), _) => (at, 2, true),
            (None, Some(at)) => (at, 1, false),
            (None, None) => return Err(invalid()),
        };
        let attribute = s[..at].trim();
        if attribute.is_empty() || attribute.contains(char::is_whitespace) {
            return Err(invalid());
        }
        if !SEARCHABLE_ATTRIBUTES.contains(&attribute) {
            return Err(ServiceError::invalid_parameter(format!(
                "Cannot search on attribute {attribute}."
            )));
        }
        let value = s[at + operator_len..]
            .trim()
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .ok_or_else(invalid)?
            .replace("\\\"", "\"");

        let attribute = attribute.to_string();
        Ok(if prefix {
            Filter::StartsWith { attribute, value }
        } else {
            Filter::Equals { attribute, value }
        })
    }
}

impl Filter {
    pub fn matches(&self, user: &User) -> bool {
        match self {
            Filter::All => true,
            Filter::Equals { attribute, value } => {
                lookup(user, attribute).is_some_and(|actual| {
                    if attribute == USER_STATUS {
                        actual.eq_ignore_ascii_case(value)
                    } else {
                        actual == value
                    }
                })
            }
            Filter::StartsWith { attribute, value } => {
                lookup(user, attribute).is_some_and(|actual| {
                    if attribute == USER_STATUS {
                        actual.len() >= value.len()
                            && actual.as_bytes()[..value.len()]
                                .eq_ignore_ascii_case(value.as_bytes())
                    } else {
                        actual.starts_with(value.as_str())
                    }
                })
            }
        }
    }
}

fn lookup<'a>(user: &'a User, attribute: &str) -> Option<&'a str> {
    match attribute {
        "username" => Some(&user.username),
        "status" => Some(if user.enabled { "Enabled" } else { "Disabled" }),
        USER_STATUS => Some(user.status.as_str()),
        _ => user.attributes.get(attribute).map(|v| v.as_str()),
    }
}
