// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! HTTP mail relay notifier

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::{Notification, Notifier, TemplateStore};
use crate::config::MailRelayConfig;
use crate::error::{AppError, Result};

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    to: &'a str,
    subject: &'a str,
    message: &'a str,
}

/// Renders notifications and posts them to the mail relay
///
/// Without a relay configured the notifier runs dry: messages are rendered
/// and logged, and every send succeeds.
#[derive(Debug, Clone)]
pub struct EmailNotifier {
    http: reqwest::Client,
    relay: Option<MailRelayConfig>,
    templates: TemplateStore,
}

impl EmailNotifier {
    pub fn new(
        relay: Option<MailRelayConfig>,
        templates: TemplateStore,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            relay,
            templates,
        })
    }

    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.relay.is_none()
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let body = self
            .templates
            .render(&notification.template_key, &notification.substitutions)?;

        let Some(relay) = &self.relay else {
            tracing::info!(
                recipient = %notification.recipient,
                kind = notification.kind.as_str(),
                "Dry run, not sending '{}'",
                notification.subject
            );
            return Ok(());
        };

        let response = self
            .http
            .post(&relay.url)
            .header(API_KEY_HEADER, &relay.api_key)
            .json(&RelayMessage {
                to: &notification.recipient,
                subject: &notification.subject,
                message: &body,
            })
            .send()
            .await
            .map_err(|e| AppError::Notification(format!("mail relay request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Notification(format!(
                "mail relay answered {status}"
            )));
        }

        tracing::debug!(
            recipient = %notification.recipient,
            kind = notification.kind.as_str(),
            "Notification handed to mail relay"
        );
        Ok(())
    }
}
