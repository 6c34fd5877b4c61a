// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Subscriptions: storage, unsubscribe tokens and the subscribe/unsubscribe flows

mod flow;
mod sqlite;
mod store;
mod token;

pub use flow::{Subscribed, SubscriptionService, UnsubscribePreview, Unsubscribed};
pub use sqlite::SqliteSubscriptionStore;
pub use store::{Subscription, SubscriptionStats, SubscriptionStore};
pub use token::{TOKEN_LEN, generate_unsubscribe_token};
