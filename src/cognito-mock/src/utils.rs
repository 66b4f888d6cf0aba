// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{AuthenticationResultType, ServiceError, User};
use crate::server::Context;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PAGE_SIZE: i64 = 60;

/// Claims carried by the access and ID tokens the mock issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    /// Either `access` or `id`.
    pub token_use: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(rename = "cognito:username")]
    pub username: String,
    #[serde(rename = "cognito:groups", default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

pub fn generate_tokens(
    context: &Context,
    pool_id: &str,
    client_id: &str,
    user: &User,
) -> Result<AuthenticationResultType, ServiceError> {
    let now = Utc::now().timestamp();
    let sub = user.attributes.get("sub").cloned().unwrap_or_default();
    let claims = Claims {
        sub,
        iss: format!("{}/{}", context.issuer, pool_id),
        token_use: "access".into(),
        client_id: Some(client_id.to_string()),
        aud: None,
        username: user.username.clone(),
        groups: user.groups.iter().cloned().collect(),
        exp: now + context.expires_in_secs,
        iat: now,
    };
    let id_claims = Claims {
        token_use: "id".into(),
        client_id: None,
        aud: Some(client_id.to_string()),
        ..claims.clone()
    };
    let encode = |claims: &Claims| {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &context.encoding_key)
            .map_err(|e| ServiceError::internal(format!("signing token: {e}")))
    };
    Ok(AuthenticationResultType {
        access_token: encode(&claims)?,
        expires_in: context.expires_in_secs,
        token_type: "Bearer".into(),
        refresh_token: Uuid::new_v4().to_string(),
        id_token: encode(&id_claims)?,
    })
}

pub fn decode_token(
    decoding_key: &DecodingKey,
    token: &str,
) -> Result<TokenData<Claims>, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    // ID tokens carry the app client as their audience, which callers don't
    // know up front.
    validation.validate_aud = false;
    jsonwebtoken::decode(token, decoding_key, &validation)
}

pub fn check_password(password: &str) -> Result<(), ServiceError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ServiceError::invalid_password(
            "Password did not conform with policy: Password not long enough",
        ));
    }
    Ok(())
}

pub fn generate_password() -> String {
    format!("Tmp-{}", Uuid::new_v4().simple())
}

/// Validates a `Limit` parameter, defaulting to [`MAX_PAGE_SIZE`].
pub fn page_size(limit: Option<i64>) -> Result<usize, ServiceError> {
    match limit {
        None => Ok(MAX_PAGE_SIZE as usize),
        Some(limit) if (1..=MAX_PAGE_SIZE).contains(&limit) => Ok(limit as usize),
        Some(limit) => Err(ServiceError::invalid_parameter(format!(
            "1 validation error detected: Value '{limit}' at 'limit' failed to satisfy \
             constraint: Member must have value between 1 and {MAX_PAGE_SIZE}"
        ))),
    }
}

const PAGINATION_PREFIX: &str = "offset:";

pub fn encode_pagination_token(offset: usize) -> String {
    URL_SAFE_NO_PAD.encode(format!("{PAGINATION_PREFIX}{offset}"))
}

pub fn decode_pagination_token(token: Option<&str>) -> Result<usize, ServiceError> {
    let Some(token) = token else {
        return Ok(0);
    };
    URL_SAFE_NO_PAD
        .decode(token)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .and_then(|s| s.strip_prefix(PAGINATION_PREFIX)?.parse().ok())
        .ok_or_else(|| ServiceError::invalid_parameter("Invalid pagination token."))
}

/// Returns the `[offset, offset + size)` window of `items` and the token for
/// the next page, if there is one.
pub fn paginate<T>(items: Vec<T>, offset: usize, size: usize) -> (Vec<T>, Option<String>) {
    let total = items.len();
    let page = items.into_iter().skip(offset).take(size).collect();
    let next = offset.saturating_add(size);
    let token = (next < total).then(|| encode_pagination_token(next));
    (page, token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_tokens() {
        assert_eq!(decode_pagination_token(None), Ok(0));
        let token = encode_pagination_token(42);
        assert_eq!(decode_pagination_token(Some(&token)), Ok(42));
        assert!(decode_pagination_token(Some("garbage!")).is_err());
        let unprefixed = URL_SAFE_NO_PAD.encode("42");
        assert!(decode_pagination_token(Some(&unprefixed)).is_err());
    }

    #[test]
    fn test_paginate() {
        let items: Vec<u32> = (0..5).collect();
        let (page, token) = paginate(items.clone(), 0, 2);
        assert_eq!(page, vec![0, 1]);
        let offset = decode_pagination_token(token.as_deref()).unwrap();
        assert_eq!(offset, 2);

        let (page, token) = paginate(items.clone(), 4, 2);
        assert_eq!(page, vec![4]);
        assert_eq!(token, None);

        let (page, token) = paginate(items, 10, 2);
        assert!(page.is_empty());
        assert_eq!(token, None);
    }

    #[test]
    fn test_page_size() {
        assert_eq!(page_size(None), Ok(60));
        assert_eq!(page_size(Some(20)), Ok(20));
        assert!(page_size(Some(0)).is_err());
        assert!(page_size(Some(61)).is_err());
    }

    #[test]
    fn test_check_password() {
        assert!(check_password("Pass123$").is_ok());
        let err = check_password("short").unwrap_err();
        assert_eq!(err.kind, "InvalidPasswordException");
    }
}
