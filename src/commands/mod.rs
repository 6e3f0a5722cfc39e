//! Command implementations for the Riskbook CLI.
//!
//! This module contains the business logic for each CLI command.
//! Commands are organized by entity type:
//! - `system` - Store initialization and inspection
//! - `auth` - Sessions and role switching
//! - `project` - Project CRUD and selection
//! - `risk` - Risk CRUD
//! - `audit` - Audit trail queries and retention
//! - `notify` - Notification inbox and the watch loop
//! - `rule` - Alert rules and on-demand evaluation
//! - `report` - Dashboard metrics, trends, and CSV export
//! - `config` - Workspace configuration
//!
//! Every command opens the store for the given workspace, checks the
//! session where the operation requires one, and returns a result struct
//! implementing [`Output`].

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::audit::{AuditAction, AuditEntityKind, AuditEntry};
use crate::models::auth::Session;
use crate::models::Project;
use crate::storage::{Store, generate_id};
use crate::{Error, Result};

mod audit;
mod auth;
mod config;
mod notify;
mod project;
mod report;
mod risk;
mod rule;
mod system;

pub use audit::*;
pub use auth::*;
pub use config::*;
pub use notify::*;
pub use project::*;
pub use report::*;
pub use risk::*;
pub use rule::*;
pub use system::*;

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output: Serialize {
    /// Serialize to JSON string.
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

/// Load the active session for a store, failing when nobody is logged in.
fn require_session(store: &Store) -> Result<Session> {
    store.load_session()?.ok_or(Error::NotAuthenticated)
}

/// Fail unless the session role may create and edit records.
fn require_edit(session: &Session) -> Result<()> {
    if session.can_edit() {
        Ok(())
    } else {
        Err(Error::PermissionDenied(format!(
            "the {} role cannot modify records",
            session.role
        )))
    }
}

/// Fail unless the session role may delete projects and purge history.
fn require_delete(session: &Session) -> Result<()> {
    if session.can_delete() {
        Ok(())
    } else {
        Err(Error::PermissionDenied(format!(
            "the {} role cannot delete this",
            session.role
        )))
    }
}

/// Resolve the project a command acts on.
///
/// An explicit `--project` wins; otherwise the selected project is used.
fn resolve_project(store: &Store, project: Option<String>) -> Result<String> {
    match project {
        Some(id) => Ok(id),
        None => store.selected_project()?.ok_or_else(|| {
            Error::InvalidInput(
                "no project given; pass --project <id> or run `rb project select <id>`".to_string(),
            )
        }),
    }
}

/// Parse a `YYYY-MM-DD` date argument.
fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| Error::InvalidInput(format!("Invalid date: {} (expected YYYY-MM-DD)", value)))
}

/// Build an audit entry for a mutation the session user just made.
///
/// Every entry links back to a project: the owning project for risk
/// entries, the project itself for project entries.
fn audit_entry(
    session: &Session,
    action: AuditAction,
    entity_kind: AuditEntityKind,
    entity_id: &str,
    entity_name: &str,
    project: &Project,
) -> AuditEntry {
    let mut entry = AuditEntry::new(
        generate_id("audit", entity_id),
        session.user_id.clone(),
        session.username.clone(),
        action,
        entity_kind,
        entity_id.to_string(),
        entity_name.to_string(),
    );
    entry.project_id = Some(project.id.clone());
    entry.project_name = Some(project.name.clone());
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::{Role, accounts};
    use crate::test_utils::TestEnv;

    fn session_with_role(role: Role) -> Session {
        let mut session = Session::new(&accounts()[0]);
        session.role = role;
        session
    }

    #[test]
    fn test_require_edit_by_role() {
        assert!(require_edit(&session_with_role(Role::Admin)).is_ok());
        assert!(require_edit(&session_with_role(Role::Manager)).is_ok());

        let err = require_edit(&session_with_role(Role::Viewer)).unwrap_err();
        assert!(err.to_string().contains("Permission denied"));
        assert!(err.to_string().contains("viewer"));
    }

    #[test]
    fn test_require_delete_admin_only() {
        assert!(require_delete(&session_with_role(Role::Admin)).is_ok());
        assert!(require_delete(&session_with_role(Role::Manager)).is_err());
        assert!(require_delete(&session_with_role(Role::Viewer)).is_err());
    }

    #[test]
    fn test_resolve_project_explicit_wins() {
        let env = TestEnv::new();
        let store = env.init_store();
        store.set_selected_project("1756137600000").unwrap();

        let id = resolve_project(&store, Some("1756137611111".to_string())).unwrap();
        assert_eq!(id, "1756137611111");
    }

    #[test]
    fn test_resolve_project_falls_back_to_selection() {
        let env = TestEnv::new();
        let store = env.init_store();
        store.set_selected_project("1756137600000").unwrap();

        let id = resolve_project(&store, None).unwrap();
        assert_eq!(id, "1756137600000");
    }

    #[test]
    fn test_resolve_project_errors_without_selection() {
        let env = TestEnv::new();
        let store = env.init_store();

        let err = resolve_project(&store, None).unwrap_err();
        assert!(err.to_string().contains("no project given"));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2026-03-01").unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
        );
        assert!(parse_date("01/03/2026").is_err());
        assert!(parse_date("2026-13-01").is_err());
    }

    #[test]
    fn test_audit_entry_links_project() {
        let session = session_with_role(Role::Admin);
        let project = Project::new("1756137600000".to_string(), "Harbor Tunnel".to_string());

        let entry = audit_entry(
            &session,
            AuditAction::Create,
            AuditEntityKind::Risk,
            "4",
            "Groundwater ingress",
            &project,
        );
        assert!(entry.id.starts_with("audit-"));
        assert_eq!(entry.user_id, session.user_id);
        assert_eq!(entry.username, "admin");
        assert_eq!(entry.entity_id, "4");
        assert_eq!(entry.project_id.as_deref(), Some("1756137600000"));
        assert_eq!(entry.project_name.as_deref(), Some("Harbor Tunnel"));
        assert!(entry.changes.is_empty());
    }
}
