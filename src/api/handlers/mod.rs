// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

mod devices;
mod health;
mod metrics;
mod stats;
mod subscribe;
mod unsubscribe;

pub use devices::devices_handler;
pub use health::health_check;
pub use metrics::metrics_handler;
pub use stats::stats_handler;
pub use subscribe::{SubscribeForm, SubscribeResponse, subscribe_handler};
pub use unsubscribe::{TokenParams, unsubscribe_handler, unsubscribe_page};
