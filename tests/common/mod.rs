// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! In-process fakes shared by the integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use firmware_notifier::cache::{CacheStore, MemoryCacheStore};
use firmware_notifier::captcha::CaptchaVerifier;
use firmware_notifier::clock::ManualClock;
use firmware_notifier::db::Database;
use firmware_notifier::devices::{DeviceCatalog, FirmwareCache};
use firmware_notifier::notify::{Notification, NotificationKind, Notifier, UnsubscribeLinks};
use firmware_notifier::subscriptions::{SqliteSubscriptionStore, SubscriptionService};
use firmware_notifier::upstream::{
    CatalogSource, DeviceCatalogEntry, FirmwareDescriptor, FirmwareSource,
};
use firmware_notifier::{AppError, AppState, DispatchReport, Dispatcher, MetricsRegistry, Result};

pub const CATALOG_TTL: Duration = Duration::from_secs(3600);
pub const FIRMWARE_TTL: Duration = Duration::from_secs(900);
pub const FIRMWARE_RETENTION: Duration = Duration::from_secs(7 * 24 * 3600);
pub const PUBLIC_BASE_URL: &str = "https://notify.example";

pub fn firmware(version: &str) -> FirmwareDescriptor {
    FirmwareDescriptor {
        version: version.to_string(),
        build_id: format!("build-{version}"),
        release_date: "2025-01-01T00:00:00Z".to_string(),
        file_size: 6_500_000_000,
    }
}

/// Upstream catalog and firmware source driven by the test
#[derive(Default)]
pub struct FakeUpstream {
    catalog: Mutex<Vec<DeviceCatalogEntry>>,
    firmware: Mutex<HashMap<String, Vec<FirmwareDescriptor>>>,
    failing: Mutex<HashSet<String>>,
    catalog_down: Mutex<bool>,
    firmware_fetches: AtomicUsize,
}

impl FakeUpstream {
    pub fn add_device(&self, identifier: &str, name: &str) {
        self.catalog.lock().unwrap().push(DeviceCatalogEntry {
            identifier: identifier.to_string(),
            name: name.to_string(),
        });
    }

    /// Publishes `versions`, newest first
    pub fn set_versions(&self, identifier: &str, versions: &[&str]) {
        self.firmware.lock().unwrap().insert(
            identifier.to_string(),
            versions.iter().map(|v| firmware(v)).collect(),
        );
    }

    pub fn fail_device(&self, identifier: &str, fail: bool) {
        let mut failing = self.failing.lock().unwrap();
        if fail {
            failing.insert(identifier.to_string());
        } else {
            failing.remove(identifier);
        }
    }

    pub fn set_catalog_down(&self, down: bool) {
        *self.catalog_down.lock().unwrap() = down;
    }

    pub fn firmware_fetches(&self) -> usize {
        self.firmware_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for FakeUpstream {
    async fn fetch_catalog(&self) -> Result<Vec<DeviceCatalogEntry>> {
        if *self.catalog_down.lock().unwrap() {
            return Err(AppError::UpstreamUnavailable("catalog down".to_string()));
        }
        Ok(self.catalog.lock().unwrap().clone())
    }
}

#[async_trait]
impl FirmwareSource for FakeUpstream {
    async fn fetch_firmware(&self, device_identifier: &str) -> Result<Vec<FirmwareDescriptor>> {
        self.firmware_fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(device_identifier) {
            return Err(AppError::UpstreamUnavailable(format!(
                "{device_identifier} unavailable"
            )));
        }
        Ok(self
            .firmware
            .lock()
            .unwrap()
            .get(device_identifier)
            .cloned()
            .unwrap_or_default())
    }
}

/// Notifier that records every accepted notification
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    failing: Mutex<HashSet<String>>,
    missing_template: Mutex<HashSet<String>>,
    pass_on_send: Mutex<Option<Arc<Dispatcher>>>,
    interleaved_reports: Mutex<Vec<DispatchReport>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, recipient: &str) -> Vec<Notification> {
        self.sent()
            .into_iter()
            .filter(|n| n.recipient == recipient)
            .collect()
    }

    pub fn count(&self, kind: NotificationKind) -> usize {
        self.sent().iter().filter(|n| n.kind == kind).count()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    pub fn fail_recipient(&self, recipient: &str, fail: bool) {
        let mut failing = self.failing.lock().unwrap();
        if fail {
            failing.insert(recipient.to_string());
        } else {
            failing.remove(recipient);
        }
    }

    /// Answers sends to `recipient` as if their template were missing
    pub fn miss_template_for(&self, recipient: &str) {
        self.missing_template
            .lock()
            .unwrap()
            .insert(recipient.to_string());
    }

    /// Runs one dispatch pass inside the next send, before it is accepted
    pub fn run_pass_on_next_send(&self, dispatcher: Arc<Dispatcher>) {
        *self.pass_on_send.lock().unwrap() = Some(dispatcher);
    }

    pub fn interleaved_reports(&self) -> Vec<DispatchReport> {
        self.interleaved_reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let dispatcher = self.pass_on_send.lock().unwrap().take();
        if let Some(dispatcher) = dispatcher {
            let report = dispatcher.run_pass().await?;
            self.interleaved_reports.lock().unwrap().push(report);
        }

        if self.failing.lock().unwrap().contains(&notification.recipient) {
            return Err(AppError::Notification("relay refused".to_string()));
        }
        if self
            .missing_template
            .lock()
            .unwrap()
            .contains(&notification.recipient)
        {
            return Err(AppError::TemplateNotFound(notification.template_key.clone()));
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// CAPTCHA verifier accepting exactly one token
pub struct FixedCaptcha {
    pub accepted: String,
}

#[async_trait]
impl CaptchaVerifier for FixedCaptcha {
    async fn verify(&self, response_token: &str) -> Result<()> {
        if response_token == self.accepted {
            Ok(())
        } else {
            Err(AppError::CaptchaFailed)
        }
    }
}

/// Fully wired core on in-memory storage
pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub upstream: Arc<FakeUpstream>,
    pub notifier: Arc<RecordingNotifier>,
    pub cache: Arc<MemoryCacheStore>,
    pub store: Arc<SqliteSubscriptionStore>,
    pub catalog: Arc<DeviceCatalog>,
    pub firmware: Arc<FirmwareCache>,
    pub metrics: MetricsRegistry,
    pub service: Arc<SubscriptionService>,
    pub dispatcher: Arc<Dispatcher>,
}

impl Harness {
    pub async fn new() -> Self {
        let clock = Arc::new(ManualClock::new());
        let upstream = Arc::new(FakeUpstream::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let cache = Arc::new(MemoryCacheStore::new(clock.clone()));
        let store = Arc::new(SqliteSubscriptionStore::new(
            Database::open_in_memory().await.unwrap(),
        ));
        let metrics = MetricsRegistry::new();

        let cache_dyn: Arc<dyn CacheStore> = cache.clone();
        let catalog = Arc::new(DeviceCatalog::new(
            cache_dyn.clone(),
            upstream.clone(),
            clock.clone(),
            CATALOG_TTL,
            metrics.clone(),
        ));
        let firmware = Arc::new(FirmwareCache::new(
            cache_dyn,
            upstream.clone(),
            clock.clone(),
            FIRMWARE_TTL,
            FIRMWARE_RETENTION,
            metrics.clone(),
        ));

        let service = Arc::new(SubscriptionService::new(
            store.clone(),
            catalog.clone(),
            firmware.clone(),
            notifier.clone(),
            UnsubscribeLinks::new(PUBLIC_BASE_URL),
            clock.clone(),
            metrics.clone(),
        ));
        let dispatcher = Arc::new(Dispatcher::new(
            store.clone(),
            catalog.clone(),
            firmware.clone(),
            notifier.clone(),
            UnsubscribeLinks::new(PUBLIC_BASE_URL),
            clock.clone(),
            metrics.clone(),
            4,
        ));

        Self {
            clock,
            upstream,
            notifier,
            cache,
            store,
            catalog,
            firmware,
            metrics,
            service,
            dispatcher,
        }
    }

    /// Moves time past the firmware TTL so the next pass refetches
    pub fn expire_firmware(&self) {
        self.clock.advance(FIRMWARE_TTL);
    }

    pub fn app_state(&self, captcha: Option<Arc<dyn CaptchaVerifier>>) -> Arc<AppState> {
        Arc::new(AppState {
            metrics: self.metrics.clone(),
            catalog: self.catalog.clone(),
            store: self.store.clone(),
            subscriptions: self.service.clone(),
            captcha,
        })
    }
}
