// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! CAPTCHA verification for the subscribe form

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::CaptchaConfig;
use crate::error::{AppError, Result};

/// Checks a CAPTCHA response token submitted by a browser
#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    /// `Ok(())` when the token is accepted, `CaptchaFailed` otherwise
    async fn verify(&self, response_token: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    #[serde(default)]
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// hCaptcha `siteverify` client
#[derive(Debug, Clone)]
pub struct HCaptchaVerifier {
    http: reqwest::Client,
    config: CaptchaConfig,
}

impl HCaptchaVerifier {
    pub fn new(config: CaptchaConfig, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl CaptchaVerifier for HCaptchaVerifier {
    async fn verify(&self, response_token: &str) -> Result<()> {
        if response_token.is_empty() {
            return Err(AppError::CaptchaFailed);
        }

        let result = self
            .http
            .post(&self.config.verify_url)
            .form(&[
                ("secret", self.config.secret.as_str()),
                ("response", response_token),
            ])
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("hCaptcha verification request failed: {}", e);
                return Err(AppError::CaptchaFailed);
            }
        };

        match response.json::<SiteVerifyResponse>().await {
            Ok(body) if body.success => Ok(()),
            Ok(body) => {
                tracing::debug!("hCaptcha rejected token: {:?}", body.error_codes);
                Err(AppError::CaptchaFailed)
            }
            Err(e) => {
                tracing::warn!("Unreadable hCaptcha response: {}", e);
                Err(AppError::CaptchaFailed)
            }
        }
    }
}
