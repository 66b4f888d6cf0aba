// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use axum::Json;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::server::AMZ_JSON_CONTENT_TYPE;

/// An error in the shape the AWS JSON 1.1 protocol expects.
///
/// The SDK reads the error code from the `x-amzn-ErrorType` header and falls
/// back to the `__type` field of the body, so we set both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    pub kind: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    #[serde(rename = "__type")]
    kind: &'a str,
    message: &'a str,
}

impl ServiceError {
    fn new(kind: &'static str, message: impl Into<String>) -> ServiceError {
        ServiceError {
            kind,
            message: message.into(),
        }
    }

    pub fn resource_not_found(message: impl Into<String>) -> ServiceError {
        ServiceError::new("ResourceNotFoundException", message)
    }

    pub fn user_not_found() -> ServiceError {
        ServiceError::new("UserNotFoundException", "User does not exist.")
    }

    pub fn username_exists() -> ServiceError {
        ServiceError::new("UsernameExistsException", "User account already exists.")
    }

    pub fn not_authorized(message: impl Into<String>) -> ServiceError {
        ServiceError::new("NotAuthorizedException", message)
    }

    pub fn invalid_parameter(message: impl Into<String>) -> ServiceError {
        ServiceError::new("InvalidParameterException", message)
    }

    pub fn invalid_password(message: impl Into<String>) -> ServiceError {
        ServiceError::new("InvalidPasswordException", message)
    }

    pub fn serialization(message: impl Into<String>) -> ServiceError {
        ServiceError::new("SerializationException", message)
    }

    pub fn unknown_operation(target: &str) -> ServiceError {
        ServiceError::new(
            "UnknownOperationException",
            format!("unsupported operation target {target:?}"),
        )
    }

    pub fn internal(message: impl Into<String>) -> ServiceError {
        ServiceError::new("InternalErrorException", message)
    }

    fn status(&self) -> StatusCode {
        match self.kind {
            "InternalErrorException" => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            kind: self.kind,
            message: &self.message,
        });
        (
            self.status(),
            [
                ("x-amzn-errortype", self.kind),
                (CONTENT_TYPE.as_str(), AMZ_JSON_CONTENT_TYPE),
            ],
            body,
        )
            .into_response()
    }
}
