// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Body and query extractors that reject with the API error envelope.
//!
//! axum's own `Json` and `Query` answer bad input with plain-text 400, 415
//! or 422 responses. These wrappers turn every such rejection into
//! `400 {"error":"invalid"}`.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// JSON request body.
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string parameters.
#[derive(Debug, Clone, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        name: String,
    }

    fn request(content_type: Option<&str>, body: &'static str) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn accepts_well_formed_json() {
        let ApiJson(payload) = ApiJson::<Payload>::from_request(
            request(Some("application/json"), r#"{"name":"x"}"#),
            &(),
        )
        .await
        .unwrap();
        assert_eq!(payload.name, "x");
    }

    #[tokio::test]
    async fn bad_bodies_are_invalid() {
        let cases = [
            (Some("application/json"), r#"{"name":1}"#),
            (Some("application/json"), "not json"),
            (None, r#"{"name":"x"}"#),
        ];
        for (content_type, body) in cases {
            let err = ApiJson::<Payload>::from_request(request(content_type, body), &())
                .await
                .unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
            assert_eq!(err.message, "invalid", "body {body:?}");
        }
    }
}
