// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

use axum::{Json, extract::State};
use std::sync::Arc;

use crate::api::AppState;
use crate::error::Result;
use crate::subscriptions::SubscriptionStats;

/// GET /stats
///
/// Subscription counts: total rows, active rows and distinct active devices.
pub async fn stats_handler(State(state): State<Arc<AppState>>) -> Result<Json<SubscriptionStats>> {
    let stats = state.store.stats().await?;
    state.metrics.update_subscription_stats(&stats);
    Ok(Json(stats))
}
