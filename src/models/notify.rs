//! Notification and alert rule types.
//!
//! Notifications are per-user records created as a side effect of risk
//! mutations and triggered alert rules. Alert rules are per-project
//! conditions checked on demand against the project's current risks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Visual class of a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Routine activity (risk created or updated)
    #[default]
    Info,
    /// Destructive activity (risk deleted)
    Warning,
    /// Something went wrong
    Error,
    /// Produced by a triggered alert rule
    Alert,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NotificationKind::Info => "info",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
            NotificationKind::Alert => "alert",
        };
        write!(f, "{}", s)
    }
}

/// A per-user notification record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique identifier (e.g., "ntf-a1b2c3d4e5f6")
    pub id: String,

    /// ID of the user this notification belongs to
    pub user_id: String,

    /// Short headline
    pub title: String,

    /// Full message text
    pub message: String,

    /// Visual class
    #[serde(default)]
    pub kind: NotificationKind,

    /// Whether the user has seen it
    #[serde(default)]
    pub read: bool,

    /// Linked project, when the event concerns one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    /// Linked risk.
    /// Absent on delete notifications, where the risk no longer exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_id: Option<u64>,

    /// When the notification was created
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// Create a new unread notification stamped with the current time.
    pub fn new(
        id: String,
        user_id: String,
        title: String,
        message: String,
        kind: NotificationKind,
    ) -> Self {
        Self {
            id,
            user_id,
            title,
            message,
            kind,
            read: false,
            project_id: None,
            risk_id: None,
            timestamp: Utc::now(),
        }
    }
}

/// Condition an alert rule checks against a project's risks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCondition {
    /// Count of high or critical risks reaches the threshold
    HighRiskCount,
    /// At least one critical risk exists
    CriticalRisk,
    /// Count of risks not yet resolved reaches the threshold
    RiskNotResolved,
    /// At least one risk score reaches the threshold
    SeverityThreshold,
}

impl AlertCondition {
    /// Returns true if this condition compares against a threshold.
    pub fn needs_threshold(&self) -> bool {
        !matches!(self, AlertCondition::CriticalRisk)
    }
}

impl fmt::Display for AlertCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertCondition::HighRiskCount => "high_risk_count",
            AlertCondition::CriticalRisk => "critical_risk",
            AlertCondition::RiskNotResolved => "risk_not_resolved",
            AlertCondition::SeverityThreshold => "severity_threshold",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for AlertCondition {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "high_risk_count" => Ok(AlertCondition::HighRiskCount),
            "critical_risk" => Ok(AlertCondition::CriticalRisk),
            "risk_not_resolved" => Ok(AlertCondition::RiskNotResolved),
            "severity_threshold" => Ok(AlertCondition::SeverityThreshold),
            _ => Err(crate::Error::InvalidInput(format!(
                "Unknown alert condition: {} (expected high_risk_count, critical_risk, \
                 risk_not_resolved, or severity_threshold)",
                s
            ))),
        }
    }
}

/// Delivery channel for a triggered alert.
///
/// Channels are mock senders that log instead of calling a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertChannel {
    Email,
    Sms,
    Telegram,
}

impl fmt::Display for AlertChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertChannel::Email => "email",
            AlertChannel::Sms => "sms",
            AlertChannel::Telegram => "telegram",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for AlertChannel {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "email" => Ok(AlertChannel::Email),
            "sms" => Ok(AlertChannel::Sms),
            "telegram" => Ok(AlertChannel::Telegram),
            _ => Err(crate::Error::InvalidInput(format!(
                "Unknown alert channel: {} (expected email, sms, or telegram)",
                s
            ))),
        }
    }
}

/// A per-project alert rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    /// Unique identifier (e.g., "rule-a1b2c3d4e5f6")
    pub id: String,

    /// Rule name, reused as the notification title when triggered
    pub name: String,

    /// Project whose risks this rule watches
    pub project_id: String,

    /// Condition to check
    pub condition: AlertCondition,

    /// Threshold for conditions that compare counts or scores
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    /// Channels to fan out to when triggered
    #[serde(default)]
    pub channels: Vec<AlertChannel>,

    /// Disabled rules are skipped by evaluation
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

fn default_enabled() -> bool {
    true
}

impl AlertRule {
    /// Create a new enabled rule with no channels.
    pub fn new(id: String, name: String, project_id: String, condition: AlertCondition) -> Self {
        Self {
            id,
            name,
            project_id,
            condition,
            threshold: None,
            channels: Vec::new(),
            enabled: true,
            created_at: Utc::now(),
        }
    }
}
