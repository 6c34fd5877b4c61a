// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Notification templates

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::{AppError, Result};

const TEMPLATE_EXTENSION: &str = "html";

/// Templates keyed by name, with `${name}` placeholders
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    templates: HashMap<String, String>,
}

impl TemplateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every `<key>.html` file in `dir`
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut store = Self::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(TEMPLATE_EXTENSION) {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let body = std::fs::read_to_string(&path)?;
            tracing::debug!("Loaded template '{}' from {}", key, path.display());
            store.insert(key, body);
        }
        Ok(store)
    }

    pub fn insert(&mut self, key: &str, body: String) {
        self.templates.insert(key.to_string(), body);
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.templates.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Renders `key`, replacing every `${name}` with its substitution
    ///
    /// Placeholders without a substitution are left untouched.
    pub fn render(&self, key: &str, substitutions: &BTreeMap<String, String>) -> Result<String> {
        let template = self
            .templates
            .get(key)
            .ok_or_else(|| AppError::TemplateNotFound(key.to_string()))?;

        let mut rendered = template.clone();
        for (name, value) in substitutions {
            rendered = rendered.replace(&format!("${{{name}}}"), value);
        }
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_render_replaces_all_occurrences() {
        let mut store = TemplateStore::new();
        store.insert(
            "email_version",
            "${device}: ${version} is out. ${device} users, update!".to_string(),
        );

        let rendered = store
            .render(
                "email_version",
                &subs(&[("device", "iPhone 16"), ("version", "18.1")]),
            )
            .unwrap();
        assert_eq!(rendered, "iPhone 16: 18.1 is out. iPhone 16 users, update!");
    }

    #[test]
    fn test_render_keeps_unknown_placeholders() {
        let mut store = TemplateStore::new();
        store.insert("t", "<a href=\"${unsubscribeUrl}\">${device}</a>".to_string());

        let rendered = store.render("t", &subs(&[("device", "iPad")])).unwrap();
        assert_eq!(rendered, "<a href=\"${unsubscribeUrl}\">iPad</a>");
    }

    #[test]
    fn test_render_missing_template() {
        let store = TemplateStore::new();
        let err = store.render("email_version", &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, AppError::TemplateNotFound(key) if key == "email_version"));
    }

    #[test]
    fn test_load_dir_reads_html_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("email_version.html"), "v ${version}").unwrap();
        std::fs::write(dir.path().join("email_unsubscribe.html"), "bye").unwrap();
        std::fs::write(dir.path().join("README.txt"), "ignored").unwrap();

        let store = TemplateStore::load_dir(dir.path()).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.contains("email_version"));
        assert!(store.contains("email_unsubscribe"));
        assert!(!store.contains("README"));
    }

    #[test]
    fn test_shipped_templates_cover_every_notification() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("templates");
        let store = TemplateStore::load_dir(&dir).unwrap();

        let version = crate::notify::Notification::version(
            "a@example.com",
            "iPhone 16 Pro",
            "18.1",
            "https://notify.example/unsubscribe?token=abc",
        );
        let rendered = store
            .render(&version.template_key, &version.substitutions)
            .unwrap();
        assert!(rendered.contains("iPhone 16 Pro"));
        assert!(rendered.contains("https://notify.example/unsubscribe?token=abc"));
        assert!(!rendered.contains("${"));

        let bye = crate::notify::Notification::unsubscribed("a@example.com", "iPhone 16 Pro");
        let rendered = store.render(&bye.template_key, &bye.substitutions).unwrap();
        assert!(rendered.contains("iPhone 16 Pro"));
        assert!(!rendered.contains("${"));
    }

    #[test]
    fn test_load_dir_missing_directory() {
        let err = TemplateStore::load_dir(Path::new("/nonexistent/templates")).unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }
}
