//! Data models for Riskbook entities.
//!
//! This module defines the core data structures:
//! - `Project` - Construction projects with status, schedule, and budget
//! - `Risk` - Risks attached to a project, with severity, probability,
//!   impact, and a derived score
//!
//! Submodules cover the supporting record types:
//! - `audit` - Append-only audit trail entries with field-level diffs
//! - `auth` - Sessions, roles, and the built-in account table
//! - `notify` - Notifications and alert rules

pub mod audit;
pub mod auth;
pub mod notify;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Planning,
    Active,
    Paused,
    Completed,
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProjectStatus::Planning => "planning",
            ProjectStatus::Active => "active",
            ProjectStatus::Paused => "paused",
            ProjectStatus::Completed => "completed",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ProjectStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "planning" => Ok(ProjectStatus::Planning),
            "active" => Ok(ProjectStatus::Active),
            "paused" => Ok(ProjectStatus::Paused),
            "completed" => Ok(ProjectStatus::Completed),
            _ => Err(crate::Error::InvalidInput(format!(
                "Unknown project status: {} (expected planning, active, paused, or completed)",
                s
            ))),
        }
    }
}

/// Severity band assigned to a risk.
///
/// Ordered so that comparisons reflect urgency (`Critical` ranks highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskSeverity {
    /// Get all severity bands, lowest first.
    pub fn all() -> &'static [RiskSeverity] {
        &[
            RiskSeverity::Low,
            RiskSeverity::Medium,
            RiskSeverity::High,
            RiskSeverity::Critical,
        ]
    }
}

impl fmt::Display for RiskSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskSeverity::Low => "low",
            RiskSeverity::Medium => "medium",
            RiskSeverity::High => "high",
            RiskSeverity::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for RiskSeverity {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "low" => Ok(RiskSeverity::Low),
            "medium" => Ok(RiskSeverity::Medium),
            "high" => Ok(RiskSeverity::High),
            "critical" => Ok(RiskSeverity::Critical),
            _ => Err(crate::Error::InvalidInput(format!(
                "Unknown severity: {} (expected low, medium, high, or critical)",
                s
            ))),
        }
    }
}

/// Tracking status of a risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskStatus {
    /// Live risk that still needs attention
    Active,
    /// Being watched but not actively worked
    Monitored,
    /// Mitigated or no longer applicable
    Resolved,
}

impl RiskStatus {
    /// Get all tracking statuses.
    pub fn all() -> &'static [RiskStatus] {
        &[RiskStatus::Active, RiskStatus::Monitored, RiskStatus::Resolved]
    }
}

impl fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskStatus::Active => "active",
            RiskStatus::Monitored => "monitored",
            RiskStatus::Resolved => "resolved",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for RiskStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "active" => Ok(RiskStatus::Active),
            "monitored" => Ok(RiskStatus::Monitored),
            "resolved" => Ok(RiskStatus::Resolved),
            _ => Err(crate::Error::InvalidInput(format!(
                "Unknown risk status: {} (expected active, monitored, or resolved)",
                s
            ))),
        }
    }
}

/// A construction project tracked by Riskbook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier: millisecond creation timestamp, bumped on
    /// collision (e.g., "1756137600000")
    pub id: String,

    /// Project name
    pub name: String,

    /// Detailed description
    #[serde(default)]
    pub description: String,

    /// Site or city where the work happens
    #[serde(default)]
    pub location: String,

    /// Current lifecycle status
    #[serde(default)]
    pub status: ProjectStatus,

    /// First day of on-site work
    pub start_date: NaiveDate,

    /// Planned completion date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    /// Responsible site manager
    #[serde(default)]
    pub manager: String,

    /// Budget in whole currency units
    #[serde(default)]
    pub budget: f64,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a new project with the given ID and name.
    pub fn new(id: String, name: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            description: String::new(),
            location: String::new(),
            status: ProjectStatus::default(),
            start_date: now.date_naive(),
            end_date: None,
            manager: String::new(),
            budget: 0.0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A single risk tracked against a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Risk {
    /// Numeric identifier, unique across the whole store
    pub id: u64,

    /// Owning project ID
    pub project_id: String,

    /// Display sequence number within the project
    #[serde(default)]
    pub seq: u32,

    /// Short risk name
    pub name: String,

    /// What could go wrong
    #[serde(default)]
    pub what: String,

    /// When in the schedule it could happen
    #[serde(default)]
    pub when: String,

    /// How it would play out on site
    #[serde(default)]
    pub how: String,

    /// Planned mitigation or response
    #[serde(default)]
    pub solution: String,

    /// Severity band, once assessed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<RiskSeverity>,

    /// Probability of occurrence (0.0-1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,

    /// Impact on the project (1.0-10.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<f64>,

    /// Derived score: probability x impact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Tracking status, once triaged
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RiskStatus>,

    /// Creation timestamp.
    /// None for records imported without one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Username that recorded the risk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,

    /// Last update timestamp
    pub last_updated: DateTime<Utc>,
}

impl Risk {
    /// Create a new risk with the given ID, owning project, and name.
    /// The display sequence starts at 1; callers assign the real slot.
    pub fn new(id: u64, project_id: String, name: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            project_id,
            seq: 1,
            name,
            what: String::new(),
            when: String::new(),
            how: String::new(),
            solution: String::new(),
            severity: None,
            probability: None,
            impact: None,
            score: None,
            status: None,
            created_at: Some(now),
            created_by: None,
            last_updated: now,
        }
    }

    /// Recompute the derived score from probability and impact.
    ///
    /// Returns `None` when either input is missing. The product is rounded
    /// to two decimal places so stored scores stay stable across float
    /// round-trips.
    pub fn compute_score(&self) -> Option<f64> {
        match (self.probability, self.impact) {
            (Some(p), Some(i)) => Some((p * i * 100.0).round() / 100.0),
            _ => None,
        }
    }
}
