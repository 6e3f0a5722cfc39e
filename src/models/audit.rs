//! Audit trail entry types.
//!
//! Every create, update, and delete of a project or risk appends one
//! `AuditEntry` to the trail. Risk updates carry a field-level diff of the
//! five narrative fields so reviewers can see exactly what changed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Risk;

/// Kind of mutation recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for AuditAction {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "create" => Ok(AuditAction::Create),
            "update" => Ok(AuditAction::Update),
            "delete" => Ok(AuditAction::Delete),
            _ => Err(crate::Error::InvalidInput(format!(
                "Unknown audit action: {} (expected create, update, or delete)",
                s
            ))),
        }
    }
}

/// Entity kind an audit entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEntityKind {
    Project,
    Risk,
}

impl fmt::Display for AuditEntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuditEntityKind::Project => "project",
            AuditEntityKind::Risk => "risk",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for AuditEntityKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "project" => Ok(AuditEntityKind::Project),
            "risk" => Ok(AuditEntityKind::Risk),
            _ => Err(crate::Error::InvalidInput(format!(
                "Unknown audit entity kind: {} (expected project or risk)",
                s
            ))),
        }
    }
}

/// A single field-level change inside an update entry.
///
/// Values are kept as raw JSON so the trail can hold strings, numbers,
/// and nulls without caring about the field's type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Field name as it appears on the record
    pub field: String,

    /// Value before the update
    pub old_value: serde_json::Value,

    /// Value after the update
    pub new_value: serde_json::Value,
}

impl FieldChange {
    /// Create a change record for a string field.
    pub fn of_str(field: &str, old: &str, new: &str) -> Self {
        Self {
            field: field.to_string(),
            old_value: serde_json::Value::String(old.to_string()),
            new_value: serde_json::Value::String(new.to_string()),
        }
    }

    /// Returns true if the old and new values differ.
    pub fn is_effective(&self) -> bool {
        self.old_value != self.new_value
    }
}

/// One record in the append-only audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique identifier (e.g., "audit-a1b2c3d4e5f6")
    pub id: String,

    /// When the mutation happened
    pub timestamp: DateTime<Utc>,

    /// ID of the account that made the change
    pub user_id: String,

    /// Username of the account that made the change
    pub username: String,

    /// What kind of mutation this was
    pub action: AuditAction,

    /// Kind of entity that changed
    pub entity_kind: AuditEntityKind,

    /// ID of the entity that changed
    pub entity_id: String,

    /// Name of the entity at the time of the change
    pub entity_name: String,

    /// Project the change belongs to: the owning project for risk
    /// entries, the project itself for project entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    /// Name of that project at change time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,

    /// Field-level diff, present on update entries
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<FieldChange>,
}

impl AuditEntry {
    /// Create a new audit entry stamped with the current time.
    pub fn new(
        id: String,
        user_id: String,
        username: String,
        action: AuditAction,
        entity_kind: AuditEntityKind,
        entity_id: String,
        entity_name: String,
    ) -> Self {
        Self {
            id,
            timestamp: Utc::now(),
            user_id,
            username,
            action,
            entity_kind,
            entity_id,
            entity_name,
            project_id: None,
            project_name: None,
            changes: Vec::new(),
        }
    }
}

/// Build the diff list for a risk update.
///
/// Always returns one entry per narrative field (name, what, when, how,
/// solution) in that order, whether or not the value changed. Keeping
/// unchanged fields in the trail lets a reviewer read the full record as
/// it stood at update time.
pub fn risk_update_changes(old: &Risk, new: &Risk) -> Vec<FieldChange> {
    vec![
        FieldChange::of_str("name", &old.name, &new.name),
        FieldChange::of_str("what", &old.what, &new.what),
        FieldChange::of_str("when", &old.when, &new.when),
        FieldChange::of_str("how", &old.how, &new.how),
        FieldChange::of_str("solution", &old.solution, &new.solution),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_entry_serialization_roundtrip() {
        let mut entry = AuditEntry::new(
            "audit-a1b2c3d4e5f6".to_string(),
            "1".to_string(),
            "admin".to_string(),
            AuditAction::Update,
            AuditEntityKind::Risk,
            "4".to_string(),
            "Groundwater ingress".to_string(),
        );
        entry.project_id = Some("1756137600000".to_string());
        entry.project_name = Some("Harbor Tunnel".to_string());
        entry.changes = vec![FieldChange::of_str("name", "old", "new")];

        let json = serde_json::to_string(&entry).unwrap();
        let deserialized: AuditEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.id, "audit-a1b2c3d4e5f6");
        assert_eq!(deserialized.action, AuditAction::Update);
        assert_eq!(deserialized.entity_kind, AuditEntityKind::Risk);
        assert_eq!(deserialized.changes.len(), 1);
    }

    #[test]
    fn test_audit_entry_skips_empty_changes() {
        let entry = AuditEntry::new(
            "audit-b2c3d4e5f6a1".to_string(),
            "1".to_string(),
            "admin".to_string(),
            AuditAction::Create,
            AuditEntityKind::Project,
            "1756137600000".to_string(),
            "Harbor Tunnel".to_string(),
        );
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("changes"));
        assert!(!json.contains("project_name"));
    }

    #[test]
    fn test_audit_action_serialization() {
        let json = serde_json::to_string(&AuditAction::Delete).unwrap();
        assert_eq!(json, r#""delete""#);
    }

    #[test]
    fn test_audit_action_from_str() {
        assert_eq!("create".parse::<AuditAction>().unwrap(), AuditAction::Create);
        assert_eq!("update".parse::<AuditAction>().unwrap(), AuditAction::Update);
        assert_eq!("delete".parse::<AuditAction>().unwrap(), AuditAction::Delete);
        assert!("archive".parse::<AuditAction>().is_err());
    }

    #[test]
    fn test_audit_entity_kind_from_str() {
        assert_eq!(
            "project".parse::<AuditEntityKind>().unwrap(),
            AuditEntityKind::Project
        );
        assert_eq!("risk".parse::<AuditEntityKind>().unwrap(), AuditEntityKind::Risk);
        assert!("user".parse::<AuditEntityKind>().is_err());
    }

    #[test]
    fn test_risk_update_changes_lists_all_five_fields() {
        let mut old = Risk::new(1, "1756137600000".to_string(), "Crane slot clash".to_string());
        old.what = "Two cranes booked for the same bay".to_string();
        let mut new = old.clone();
        new.name = "Crane scheduling clash".to_string();

        let changes = risk_update_changes(&old, &new);
        assert_eq!(changes.len(), 5);
        let fields: Vec<&str> = changes.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "what", "when", "how", "solution"]);

        // Only the name actually changed.
        assert!(changes[0].is_effective());
        assert!(!changes[1].is_effective());
    }

    #[test]
    fn test_field_change_is_effective() {
        let same = FieldChange::of_str("name", "x", "x");
        assert!(!same.is_effective());
        let diff = FieldChange::of_str("name", "x", "y");
        assert!(diff.is_effective());
    }
}
