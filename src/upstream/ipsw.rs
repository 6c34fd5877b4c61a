// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! ipsw.me v4 API client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use super::{CatalogSource, DeviceCatalogEntry, FirmwareDescriptor, FirmwareSource};
use crate::error::{AppError, Result};

const USER_AGENT: &str = concat!("firmware-notifier/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct WireDevice {
    identifier: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct WireDeviceFirmwares {
    #[serde(default)]
    firmwares: Vec<WireFirmware>,
}

#[derive(Debug, Deserialize)]
struct WireFirmware {
    version: String,
    #[serde(default)]
    buildid: String,
    releasedate: Option<String>,
    #[serde(default)]
    filesize: u64,
}

impl From<WireFirmware> for FirmwareDescriptor {
    fn from(wire: WireFirmware) -> Self {
        Self {
            version: wire.version,
            build_id: wire.buildid,
            release_date: wire.releasedate.unwrap_or_default(),
            file_size: wire.filesize,
        }
    }
}

/// HTTP client for the device catalog and firmware endpoints
#[derive(Debug, Clone)]
pub struct IpswClient {
    http: reqwest::Client,
    base_url: Url,
}

impl IpswClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("Invalid upstream URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!(
                "Upstream URL '{base_url}' cannot be used as a base"
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http, base_url })
    }

    /// `{base}/{segments...}` with every segment percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn unavailable(context: &str, e: impl std::fmt::Display) -> AppError {
        AppError::UpstreamUnavailable(format!("{context}: {e}"))
    }
}

#[async_trait]
impl CatalogSource for IpswClient {
    async fn fetch_catalog(&self) -> Result<Vec<DeviceCatalogEntry>> {
        let url = self.endpoint(&["devices"]);
        tracing::debug!("Fetching device catalog from {}", url);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Self::unavailable("device catalog request failed", e))?;

        if !response.status().is_success() {
            return Err(Self::unavailable(
                "device catalog request failed",
                response.status(),
            ));
        }

        let devices: Vec<WireDevice> = response
            .json()
            .await
            .map_err(|e| Self::unavailable("device catalog is not valid JSON", e))?;

        Ok(devices
            .into_iter()
            .map(|d| DeviceCatalogEntry {
                identifier: d.identifier,
                name: d.name,
            })
            .collect())
    }
}

#[async_trait]
impl FirmwareSource for IpswClient {
    async fn fetch_firmware(&self, device_identifier: &str) -> Result<Vec<FirmwareDescriptor>> {
        let url = self.endpoint(&["device", device_identifier]);
        tracing::debug!("Fetching firmware list for {} from {}", device_identifier, url);

        let response = self
            .http
            .get(url)
            .query(&[("type", "ipsw")])
            .send()
            .await
            .map_err(|e| Self::unavailable("firmware request failed", e))?;

        // Unknown identifiers are answered with 404
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("Upstream knows no firmware for {}", device_identifier);
            return Ok(Vec::new());
        }

        if !response.status().is_success() {
            return Err(Self::unavailable(
                "firmware request failed",
                response.status(),
            ));
        }

        let device: WireDeviceFirmwares = response
            .json()
            .await
            .map_err(|e| Self::unavailable("firmware list is not valid JSON", e))?;

        Ok(device
            .firmwares
            .into_iter()
            .map(FirmwareDescriptor::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> IpswClient {
        IpswClient::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let c = client("https://api.ipsw.me/v4");
        assert_eq!(
            c.endpoint(&["devices"]).as_str(),
            "https://api.ipsw.me/v4/devices"
        );
    }

    #[test]
    fn test_endpoint_handles_trailing_slash() {
        let c = client("https://api.ipsw.me/v4/");
        assert_eq!(
            c.endpoint(&["device", "iPhone17,1"]).as_str(),
            "https://api.ipsw.me/v4/device/iPhone17,1"
        );
    }

    #[test]
    fn test_endpoint_encodes_identifier() {
        let c = client("https://api.ipsw.me/v4");
        let url = c.endpoint(&["device", "../admin?x=1"]);
        assert_eq!(url.path(), "/v4/device/..%2Fadmin%3Fx=1");
        assert!(url.query().is_none());
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let err = IpswClient::new("not a url", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_firmware_wire_format_maps_to_descriptor() {
        let json = r#"{
            "name": "iPhone 16",
            "identifier": "iPhone17,3",
            "firmwares": [
                {
                    "identifier": "iPhone17,3",
                    "version": "18.1",
                    "buildid": "22B83",
                    "sha1sum": "abc",
                    "filesize": 8413069585,
                    "url": "https://updates.cdn-apple.com/x.ipsw",
                    "releasedate": "2024-10-28T17:04:17Z",
                    "uploaddate": "2024-10-24T00:12:06Z",
                    "signed": true
                },
                {
                    "identifier": "iPhone17,3",
                    "version": "18.0.1",
                    "buildid": "22A3370",
                    "filesize": 8412000000,
                    "releasedate": null,
                    "signed": false
                }
            ]
        }"#;

        let wire: WireDeviceFirmwares = serde_json::from_str(json).unwrap();
        let firmwares: Vec<FirmwareDescriptor> =
            wire.firmwares.into_iter().map(Into::into).collect();

        assert_eq!(firmwares.len(), 2);
        assert_eq!(firmwares[0].version, "18.1");
        assert_eq!(firmwares[0].build_id, "22B83");
        assert_eq!(firmwares[0].file_size, 8_413_069_585);
        assert_eq!(firmwares[0].release_date, "2024-10-28T17:04:17Z");
        assert_eq!(firmwares[1].release_date, "");
    }

    #[test]
    fn test_catalog_wire_format_ignores_extra_fields() {
        let json = r#"[
            {"name": "iPhone 16 Pro", "identifier": "iPhone17,1", "boards": [], "boardconfig": "d93ap"},
            {"name": "HomePod mini", "identifier": "AudioAccessory5,1"}
        ]"#;
        let devices: Vec<WireDevice> = serde_json::from_str(json).unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[1].identifier, "AudioAccessory5,1");
    }
}
