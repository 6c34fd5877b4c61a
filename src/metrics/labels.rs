//! Label types for Prometheus metrics

use prometheus_client::encoding::EncodeLabelSet;

use crate::notify::NotificationKind;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct NotificationLabels {
    pub kind: String,
}

impl From<NotificationKind> for NotificationLabels {
    fn from(kind: NotificationKind) -> Self {
        Self {
            kind: kind.as_str().to_string(),
        }
    }
}

/// Upstream source that failed: `catalog` or `firmware`
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct UpstreamLabels {
    pub source: String,
}

impl UpstreamLabels {
    #[must_use]
    pub fn catalog() -> Self {
        Self {
            source: "catalog".to_string(),
        }
    }

    #[must_use]
    pub fn firmware() -> Self {
        Self {
            source: "firmware".to_string(),
        }
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct PassLabels {
    pub outcome: String,
}
