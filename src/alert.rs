//! Alert instances and the batches handed to notifiers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label carried by alerts raised because a query returned no data.
pub const NO_DATA_ALERT_NAME: &str = "DatasourceNoData";

/// Status of a single alert instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Firing,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Firing => "firing",
            AlertStatus::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One alert instance as produced by the evaluation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub status: AlertStatus,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub generator_url: Option<String>,
}

impl Alert {
    /// A firing alert started now, with no labels.
    pub fn firing() -> Self {
        Self {
            status: AlertStatus::Firing,
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            starts_at: Utc::now(),
            ends_at: None,
            generator_url: None,
        }
    }

    /// A resolved alert that ended now.
    pub fn resolved() -> Self {
        let now = Utc::now();
        Self {
            status: AlertStatus::Resolved,
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            starts_at: now,
            ends_at: Some(now),
            generator_url: None,
        }
    }

    pub fn with_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(name.into(), value.into());
        self
    }

    pub fn with_annotation(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(name.into(), value.into());
        self
    }

    pub fn is_resolved(&self) -> bool {
        self.status == AlertStatus::Resolved
    }

    /// Whether this alert was raised for a query that returned no data.
    pub fn is_no_data(&self) -> bool {
        self.labels
            .get("alertname")
            .is_some_and(|name| name == NO_DATA_ALERT_NAME)
    }
}

/// Ordered set of alerts reported together in one notification.
///
/// Batches are read-only once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertBatch {
    alerts: Vec<Alert>,
}

impl AlertBatch {
    pub fn new(alerts: Vec<Alert>) -> Self {
        Self { alerts }
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Alert> {
        self.alerts.iter()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Aggregate status: resolved only when every alert is resolved.
    ///
    /// An empty batch counts as resolved.
    pub fn status(&self) -> AlertStatus {
        if self.alerts.iter().all(Alert::is_resolved) {
            AlertStatus::Resolved
        } else {
            AlertStatus::Firing
        }
    }

    pub fn firing(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().filter(|a| !a.is_resolved())
    }

    pub fn resolved(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().filter(|a| a.is_resolved())
    }

    /// Labels whose name and value are shared by every alert in the batch.
    pub fn common_labels(&self) -> BTreeMap<String, String> {
        common_pairs(self.alerts.iter().map(|a| &a.labels))
    }

    /// Annotations whose name and value are shared by every alert in the batch.
    pub fn common_annotations(&self) -> BTreeMap<String, String> {
        common_pairs(self.alerts.iter().map(|a| &a.annotations))
    }
}

impl From<Vec<Alert>> for AlertBatch {
    fn from(alerts: Vec<Alert>) -> Self {
        Self::new(alerts)
    }
}

impl<'a> IntoIterator for &'a AlertBatch {
    type Item = &'a Alert;
    type IntoIter = std::slice::Iter<'a, Alert>;

    fn into_iter(self) -> Self::IntoIter {
        self.alerts.iter()
    }
}

fn common_pairs<'a>(
    mut maps: impl Iterator<Item = &'a BTreeMap<String, String>>,
) -> BTreeMap<String, String> {
    let Some(first) = maps.next() else {
        return BTreeMap::new();
    };
    let mut common = first.clone();
    for map in maps {
        common.retain(|k, v| map.get(k) == Some(v));
    }
    common
}
