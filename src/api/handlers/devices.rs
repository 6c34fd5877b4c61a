// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

use axum::{Json, extract::State};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::AppState;
use crate::devices::FamilyMember;
use crate::error::Result;

/// GET /devices
///
/// The device catalog grouped by product family, e.g.
/// `{"iPhone": [{"name": "iPhone 16 Pro", "id": "iPhone17,1"}]}`.
pub async fn devices_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BTreeMap<String, Vec<FamilyMember>>>> {
    let catalog = state.catalog.resolve_catalog().await?;
    Ok(Json(catalog.grouped_by_family()))
}
