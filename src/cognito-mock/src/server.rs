// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::future::IntoFuture;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};

use anyhow::Context as _;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::handlers::{auth, group, user};
use crate::models::{Pool, PoolConfig, ServiceError};
use crate::utils::{self, Claims};

pub const AMZ_JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Every operation is a `POST /` whose `X-Amz-Target` header names the
/// operation with this prefix.
const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService.";

/// Knobs for the tokens the mock issues.
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Issuer prefix; the pool ID is appended to form the `iss` claim.
    pub issuer: String,
    /// HMAC secret the tokens are signed with.
    pub token_secret: String,
    /// How long issued tokens are valid.
    pub expires_in_secs: i64,
}

impl Default for MockConfig {
    fn default() -> MockConfig {
        MockConfig {
            issuer: "https://cognito-idp.localhost".into(),
            token_secret: "sso-cognito-mock".into(),
            expires_in_secs: 3600,
        }
    }
}

pub struct Context {
    pub issuer: String,
    pub encoding_key: EncodingKey,
    pub expires_in_secs: i64,
    // Pool ID -> pool.
    pub pools: Mutex<BTreeMap<String, Pool>>,
    // Operation name -> number of requests received.
    requests: Arc<Mutex<BTreeMap<String, u64>>>,
}

pub struct CognitoMockServer {
    pub base_url: String,
    pub requests: Arc<Mutex<BTreeMap<String, u64>>>,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
    decoding_key: DecodingKey,
}

impl CognitoMockServer {
    /// Starts a [`CognitoMockServer`] serving the given user pools.
    ///
    /// Must be started from within a [`tokio::runtime::Runtime`]. Binds to a
    /// random localhost port when `addr` is `None`.
    pub async fn start(
        addr: Option<&SocketAddr>,
        pools: Vec<PoolConfig>,
        config: MockConfig,
    ) -> Result<CognitoMockServer, anyhow::Error> {
        let now = Utc::now();
        let pools = pools
            .into_iter()
            .map(|config| (config.id.clone(), Pool::new(config, now)))
            .collect();
        let requests = Arc::new(Mutex::new(BTreeMap::new()));

        let context = Arc::new(Context {
            issuer: config.issuer,
            encoding_key: EncodingKey::from_secret(config.token_secret.as_bytes()),
            expires_in_secs: config.expires_in_secs,
            pools: Mutex::new(pools),
            requests: Arc::clone(&requests),
        });

        let router = Router::new()
            .route("/", post(handle_request))
            .with_state(context);

        let addr = match addr {
            Some(addr) => Cow::Borrowed(addr),
            None => Cow::Owned(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)),
        };
        let listener = TcpListener::bind(*addr)
            .await
            .with_context(|| format!("binding to {addr}"))?;
        let base_url = format!("http://{}", listener.local_addr()?);
        let server = axum::serve(listener, router.into_make_service());
        let handle = tokio::spawn(server.into_future());

        Ok(CognitoMockServer {
            base_url,
            requests,
            handle,
            decoding_key: DecodingKey::from_secret(config.token_secret.as_bytes()),
        })
    }

    /// Returns how many requests for `operation` (e.g. `AdminCreateUser`)
    /// the server has received.
    pub fn request_count(&self, operation: &str) -> u64 {
        let requests = self.requests.lock().unwrap();
        requests.get(operation).copied().unwrap_or(0)
    }

    /// Returns how many requests the server has received across all
    /// operations.
    pub fn total_requests(&self) -> u64 {
        self.requests.lock().unwrap().values().sum()
    }

    /// Verifies a token issued by this server and returns its claims.
    pub fn decode_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        utils::decode_token(&self.decoding_key, token).map(|data| data.claims)
    }
}

async fn handle_request(
    State(context): State<Arc<Context>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let target = headers
        .get("x-amz-target")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let Some(operation) = target.strip_prefix(TARGET_PREFIX) else {
        return ServiceError::unknown_operation(target).into_response();
    };
    *context
        .requests
        .lock()
        .unwrap()
        .entry(operation.to_string())
        .or_default() += 1;
    debug!(operation, "handling request");

    let result = match operation {
        "AdminCreateUser" => dispatch(&context, &body, user::admin_create_user),
        "AdminGetUser" => dispatch(&context, &body, user::admin_get_user),
        "AdminUpdateUserAttributes" => {
            dispatch(&context, &body, user::admin_update_user_attributes)
        }
        "AdminDisableUser" => dispatch(&context, &body, user::admin_disable_user),
        "AdminEnableUser" => dispatch(&context, &body, user::admin_enable_user),
        "AdminDeleteUser" => dispatch(&context, &body, user::admin_delete_user),
        "ListUsers" => dispatch(&context, &body, user::list_users),
        "AdminInitiateAuth" => dispatch(&context, &body, auth::admin_initiate_auth),
        "AdminRespondToAuthChallenge" => {
            dispatch(&context, &body, auth::admin_respond_to_auth_challenge)
        }
        "AdminAddUserToGroup" => dispatch(&context, &body, group::admin_add_user_to_group),
        "AdminRemoveUserFromGroup" => {
            dispatch(&context, &body, group::admin_remove_user_from_group)
        }
        "AdminListGroupsForUser" => {
            dispatch(&context, &body, group::admin_list_groups_for_user)
        }
        _ => Err(ServiceError::unknown_operation(target)),
    };

    match result {
        Ok(response) => (
            StatusCode::OK,
            [(CONTENT_TYPE, AMZ_JSON_CONTENT_TYPE)],
            Json(response),
        )
            .into_response(),
        Err(err) => {
            debug!(operation, kind = err.kind, message = %err.message, "request failed");
            err.into_response()
        }
    }
}

fn dispatch<Req, Resp, F>(
    context: &Context,
    body: &[u8],
    handler: F,
) -> Result<serde_json::Value, ServiceError>
where
    Req: DeserializeOwned,
    Resp: Serialize,
    F: FnOnce(&Context, Req) -> Result<Resp, ServiceError>,
{
    let request = serde_json::from_slice(body)
        .map_err(|e| ServiceError::serialization(format!("decoding request: {e}")))?;
    let response = handler(context, request)?;
    serde_json::to_value(response)
        .map_err(|e| ServiceError::internal(format!("encoding response: {e}")))
}
