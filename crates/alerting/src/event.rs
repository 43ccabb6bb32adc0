//! Alert events as delivered by the detection pipeline

use serde::de::{Deserializer, IgnoredAny};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Alert severity as tagged by the detection backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AlertSeverity {
    Mild,
    Moderate,
    Warning,
    Severe,
    /// Missing or unrecognized severity
    #[default]
    Unknown,
}

impl AlertSeverity {
    /// Wire name of the severity
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Mild => "mild",
            AlertSeverity::Moderate => "moderate",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Severe => "severe",
            AlertSeverity::Unknown => "unknown",
        }
    }

    /// Only warning and severe alerts drive sound escalation
    pub fn is_critical(&self) -> bool {
        matches!(self, AlertSeverity::Warning | AlertSeverity::Severe)
    }
}

impl From<&str> for AlertSeverity {
    fn from(value: &str) -> Self {
        match value {
            "mild" => AlertSeverity::Mild,
            "moderate" => AlertSeverity::Moderate,
            "warning" => AlertSeverity::Warning,
            "severe" => AlertSeverity::Severe,
            _ => AlertSeverity::Unknown,
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AlertSeverity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AlertSeverity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Anything that is not a string (null, numbers, objects) maps to Unknown
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Other(IgnoredAny),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => AlertSeverity::from(text.as_str()),
            Raw::Other(_) => AlertSeverity::Unknown,
        })
    }
}

/// A single alert inside a detection snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Severity tag
    #[serde(default)]
    pub severity: AlertSeverity,

    /// Human-readable description (diagnostic only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Production time as reported by the backend (informational)
    #[serde(default)]
    pub timestamp: String,

    /// Display color hint for the dashboard
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl AlertEvent {
    /// Create an alert with the given severity and message
    pub fn new(severity: AlertSeverity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn is_critical(&self) -> bool {
        self.severity.is_critical()
    }
}

/// One update from the detection pipeline (~15 per second)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionSnapshot {
    /// Full set of currently active alerts (not a delta)
    #[serde(default)]
    pub alerts: Vec<AlertEvent>,
}

impl DetectionSnapshot {
    pub fn new(alerts: Vec<AlertEvent>) -> Self {
        Self { alerts }
    }

    /// Alerts that participate in sound escalation
    pub fn critical_alerts(&self) -> impl Iterator<Item = &AlertEvent> {
        self.alerts.iter().filter(|alert| alert.is_critical())
    }

    pub fn has_critical_alerts(&self) -> bool {
        self.critical_alerts().next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critical_severities() {
        assert!(AlertSeverity::Severe.is_critical());
        assert!(AlertSeverity::Warning.is_critical());
        assert!(!AlertSeverity::Moderate.is_critical());
        assert!(!AlertSeverity::Mild.is_critical());
        assert!(!AlertSeverity::Unknown.is_critical());
    }

    #[test]
    fn test_parse_snapshot_from_backend() {
        let json = r##"{
            "alerts": [
                {"message": "Eyes closed", "severity": "severe",
                 "timestamp": "12:00:01", "color": "#f44336"},
                {"message": "Yawning", "severity": "mild",
                 "timestamp": "12:00:01", "color": "#ffeb3b"}
            ],
            "states": {"drowsy": true},
            "metrics": {"ear": 0.18},
            "calibration_mode": false
        }"##;

        let snapshot: DetectionSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.alerts.len(), 2);
        assert_eq!(snapshot.alerts[0].severity, AlertSeverity::Severe);
        assert_eq!(snapshot.alerts[0].message.as_deref(), Some("Eyes closed"));
        assert_eq!(snapshot.critical_alerts().count(), 1);
    }

    #[test]
    fn test_malformed_severity_is_not_critical() {
        let json = r#"{"alerts": [
            {"message": "no severity"},
            {"severity": null},
            {"severity": 3},
            {"severity": "SEVERE"},
            {"severity": "catastrophic"}
        ]}"#;

        let snapshot: DetectionSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.alerts.len(), 5);
        assert!(snapshot
            .alerts
            .iter()
            .all(|a| a.severity == AlertSeverity::Unknown));
        assert!(!snapshot.has_critical_alerts());
    }

    #[test]
    fn test_missing_alerts_field() {
        let snapshot: DetectionSnapshot = serde_json::from_str("{}").unwrap();
        assert!(snapshot.alerts.is_empty());
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        let event = AlertEvent::new(AlertSeverity::Warning, "Looking away");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""severity":"warning""#));
        assert_eq!(AlertSeverity::Warning.to_string(), "warning");
    }
}
