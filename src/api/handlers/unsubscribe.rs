// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::Html,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::AppState;
use crate::error::AppError;

#[derive(Debug, Default, Deserialize)]
pub struct TokenParams {
    pub token: Option<String>,
}

type PageResult = Result<Html<String>, (StatusCode, Html<String>)>;

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body>\n<h1>{title}</h1>\n{body}\n</body>\n</html>\n"
    )
}

fn error_page(error: &AppError) -> (StatusCode, Html<String>) {
    let status = error.status_code();
    let message = match error {
        AppError::InvalidOrConsumedToken => {
            "This unsubscribe link is invalid or has already been used.".to_string()
        }
        AppError::Validation(_) => "The unsubscribe link is missing its token.".to_string(),
        other => {
            tracing::error!("Unsubscribe failed: {}", other);
            "Something went wrong. Please try again later.".to_string()
        }
    };
    (
        status,
        Html(page("Unsubscribe", &format!("<p>{}</p>", escape_html(&message)))),
    )
}

/// GET /unsubscribe?token=
///
/// Renders a confirmation form and never changes the subscription, so link
/// prefetchers cannot unsubscribe anyone.
pub async fn unsubscribe_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TokenParams>,
) -> PageResult {
    let token = params.token.unwrap_or_default();
    let preview = state
        .subscriptions
        .unsubscribe_preview(&token)
        .await
        .map_err(|e| error_page(&e))?;

    let body = format!(
        "<p>Stop update emails for <strong>{}</strong> to <strong>{}</strong>?</p>\n\
         <form method=\"post\" action=\"/unsubscribe\">\n\
         <input type=\"hidden\" name=\"token\" value=\"{}\">\n\
         <button type=\"submit\">Unsubscribe</button>\n\
         </form>",
        escape_html(&preview.device_name),
        escape_html(&preview.email),
        escape_html(token.trim()),
    );
    Ok(Html(page("Confirm unsubscribe", &body)))
}

/// POST /unsubscribe
pub async fn unsubscribe_handler(
    State(state): State<Arc<AppState>>,
    Form(params): Form<TokenParams>,
) -> PageResult {
    let token = params.token.unwrap_or_default();
    let unsubscribed = state
        .subscriptions
        .unsubscribe(&token)
        .await
        .map_err(|e| error_page(&e))?;

    let body = format!(
        "<p>You will no longer receive update emails for <strong>{}</strong>.</p>",
        escape_html(&unsubscribed.device_name)
    );
    Ok(Html(page("You have unsubscribed", &body)))
}
