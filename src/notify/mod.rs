// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Outbound notifications
//!
//! The core only builds [`Notification`] values and hands them to a
//! [`Notifier`]. [`EmailNotifier`] renders the template and forwards the
//! message to an HTTP mail relay.

mod email;
mod templates;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;

pub use email::EmailNotifier;
pub use templates::TemplateStore;

pub const VERSION_TEMPLATE: &str = "email_version";
pub const UNSUBSCRIBE_TEMPLATE: &str = "email_unsubscribe";

/// What a notification announces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// A new firmware version is available
    Version,
    /// The subscription was cancelled
    Unsubscribed,
}

impl NotificationKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::Unsubscribed => "unsubscribed",
        }
    }
}

/// A message addressed to one subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub recipient: String,
    pub subject: String,
    pub template_key: String,
    pub substitutions: BTreeMap<String, String>,
}

impl Notification {
    /// Announces `version` for the device called `device_name`
    #[must_use]
    pub fn version(recipient: &str, device_name: &str, version: &str, unsubscribe_url: &str) -> Self {
        Self {
            kind: NotificationKind::Version,
            recipient: recipient.to_string(),
            subject: format!("Software version {version} now available for {device_name}"),
            template_key: VERSION_TEMPLATE.to_string(),
            substitutions: BTreeMap::from([
                ("device".to_string(), device_name.to_string()),
                ("version".to_string(), version.to_string()),
                ("unsubscribeUrl".to_string(), unsubscribe_url.to_string()),
            ]),
        }
    }

    /// Confirms that the subscription for `device_name` was cancelled
    #[must_use]
    pub fn unsubscribed(recipient: &str, device_name: &str) -> Self {
        Self {
            kind: NotificationKind::Unsubscribed,
            recipient: recipient.to_string(),
            subject: "You have unsubscribed".to_string(),
            template_key: UNSUBSCRIBE_TEMPLATE.to_string(),
            substitutions: BTreeMap::from([("device".to_string(), device_name.to_string())]),
        }
    }
}

/// Fire-and-forget delivery of notifications
///
/// `Ok` means the message was handed over for delivery. A missing template
/// fails with `TemplateNotFound`, a refused hand-over with `Notification`.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<()>;
}

/// Builds unsubscribe links pointing at the public site
#[derive(Debug, Clone)]
pub struct UnsubscribeLinks {
    base_url: String,
}

impl UnsubscribeLinks {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn url_for(&self, token: &str) -> String {
        format!("{}/unsubscribe?token={}", self.base_url, token)
    }
}
