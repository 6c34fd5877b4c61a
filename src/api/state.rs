//! Application state shared across HTTP handlers

use std::sync::Arc;

use crate::captcha::CaptchaVerifier;
use crate::devices::DeviceCatalog;
use crate::metrics::MetricsRegistry;
use crate::subscriptions::{SubscriptionService, SubscriptionStore};

/// Shared application state
pub struct AppState {
    pub metrics: MetricsRegistry,
    pub catalog: Arc<DeviceCatalog>,
    pub store: Arc<dyn SubscriptionStore>,
    pub subscriptions: Arc<SubscriptionService>,
    /// `None` accepts subscribe requests without a CAPTCHA check
    pub captcha: Option<Arc<dyn CaptchaVerifier>>,
}
