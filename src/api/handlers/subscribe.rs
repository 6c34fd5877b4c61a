// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

use axum::{Form, Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::AppState;
use crate::error::{AppError, Result};

/// Fields posted by the subscribe form
#[derive(Debug, Default, Deserialize)]
pub struct SubscribeForm {
    pub email: Option<String>,
    pub device: Option<String>,
    #[serde(rename = "h-captcha-response")]
    pub captcha_response: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubscribeResponse {
    pub email: String,
    pub device: String,
    pub device_name: String,
    pub version: String,
}

/// POST /subscribe
///
/// The unsubscribe token is only delivered by email, never in the response.
pub async fn subscribe_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SubscribeForm>,
) -> Result<(StatusCode, Json<SubscribeResponse>)> {
    if let Some(verifier) = &state.captcha {
        let response = form
            .captcha_response
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| AppError::Validation("Missing captcha response".to_string()))?;
        verifier.verify(response).await?;
    }

    let subscribed = state
        .subscriptions
        .subscribe(
            form.email.as_deref().unwrap_or_default(),
            form.device.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubscribeResponse {
            email: subscribed.email,
            device: subscribed.device_identifier,
            device_name: subscribed.device_name,
            version: subscribed.version,
        }),
    ))
}
