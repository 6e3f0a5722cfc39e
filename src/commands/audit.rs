//! Audit trail commands: querying the trail and purging old entries.
//!
//! The trail itself is append-only; commands here never rewrite history
//! except `purge`, which drops entries older than the retention window
//! and is the only sanctioned way to remove them.

use std::path::Path;

use chrono::{Duration, Utc};
use serde::Serialize;

use crate::commands::{Output, require_delete, require_session};
use crate::models::audit::{AuditAction, AuditEntityKind, AuditEntry};
use crate::storage::Store;
use crate::{Error, Result};

/// Retention window applied when neither `--days` nor the config key is set.
const DEFAULT_RETENTION_DAYS: i64 = 90;

/// Config key overriding the default retention window.
const RETENTION_CONFIG_KEY: &str = "audit_retention_days";

fn apply_filters(
    mut entries: Vec<AuditEntry>,
    project: Option<&str>,
    risk: Option<u64>,
    user: Option<&str>,
    action: Option<AuditAction>,
) -> Vec<AuditEntry> {
    if let Some(project) = project {
        entries.retain(|e| e.project_id.as_deref() == Some(project));
    }
    if let Some(risk) = risk {
        let risk = risk.to_string();
        entries.retain(|e| e.entity_kind == AuditEntityKind::Risk && e.entity_id == risk);
    }
    if let Some(user) = user {
        entries.retain(|e| e.user_id == user);
    }
    if let Some(action) = action {
        entries.retain(|e| e.action == action);
    }
    entries
}

/// Result of `rb audit list`.
#[derive(Debug, Serialize)]
pub struct AuditListResult {
    /// Entries shown, after the limit
    pub count: usize,

    /// Entries that matched the filters
    pub matched: usize,

    pub entries: Vec<AuditEntry>,
}

impl Output for AuditListResult {
    fn to_human(&self) -> String {
        if self.entries.is_empty() {
            return "No audit entries match.".to_string();
        }

        let mut out = format!("{} of {} audit entries:\n", self.count, self.matched);
        for entry in &self.entries {
            out.push_str(&format!(
                "  {}  {:<8} {:<6} {} {} \"{}\"",
                entry.timestamp.format("%Y-%m-%d %H:%M UTC"),
                entry.username,
                entry.action.to_string(),
                entry.entity_kind,
                entry.entity_id,
                entry.entity_name
            ));
            let changed: Vec<&str> = entry
                .changes
                .iter()
                .filter(|c| c.is_effective())
                .map(|c| c.field.as_str())
                .collect();
            if !changed.is_empty() {
                out.push_str(&format!(" (changed: {})", changed.join(", ")));
            }
            out.push('\n');
        }
        out.trim_end().to_string()
    }
}

/// List audit entries, newest first.
///
/// Filters combine; `--limit` applies after filtering and sorting.
pub fn audit_list(
    workspace: &Path,
    project: Option<String>,
    risk: Option<u64>,
    user: Option<String>,
    action: Option<String>,
    limit: usize,
) -> Result<AuditListResult> {
    let store = Store::open(workspace)?;
    require_session(&store)?;

    let action = action.map(|a| a.parse::<AuditAction>()).transpose()?;
    let mut entries = apply_filters(
        store.list_audit()?,
        project.as_deref(),
        risk,
        user.as_deref(),
        action,
    );
    entries.sort_by_key(|e| std::cmp::Reverse(e.timestamp));
    let matched = entries.len();
    entries.truncate(limit);

    Ok(AuditListResult {
        count: entries.len(),
        matched,
        entries,
    })
}

/// Resolve the purge window: flag, then config key, then the default.
fn retention_days(store: &Store, days: Option<i64>) -> Result<i64> {
    let days = match days {
        Some(days) => days,
        None => match store.get_config(RETENTION_CONFIG_KEY)? {
            Some(value) => value.parse::<i64>().map_err(|_| {
                Error::InvalidInput(format!(
                    "Config {} must be a whole number of days, got: {}",
                    RETENTION_CONFIG_KEY, value
                ))
            })?,
            None => DEFAULT_RETENTION_DAYS,
        },
    };
    if days < 0 {
        return Err(Error::InvalidInput(format!(
            "Retention days must not be negative, got: {}",
            days
        )));
    }
    Ok(days)
}

/// Result of `rb audit purge`.
#[derive(Debug, Serialize)]
pub struct AuditPurgeResult {
    /// Retention window applied, in days
    pub days: i64,

    /// Entries older than the window
    pub removed: usize,

    /// Entries still in the trail
    pub remaining: usize,

    /// True when nothing was written
    pub dry_run: bool,
}

impl Output for AuditPurgeResult {
    fn to_human(&self) -> String {
        if self.dry_run {
            format!(
                "Would remove {} audit entries older than {} days ({} would remain)",
                self.removed, self.days, self.remaining
            )
        } else {
            format!(
                "Removed {} audit entries older than {} days ({} remain)",
                self.removed, self.days, self.remaining
            )
        }
    }
}

/// Drop audit entries older than the retention window.
///
/// The window comes from `--days`, else the `audit_retention_days`
/// config key, else 90 days. Only entries strictly newer than the
/// cutoff survive. Never runs automatically.
pub fn audit_purge(workspace: &Path, days: Option<i64>, dry_run: bool) -> Result<AuditPurgeResult> {
    let store = Store::open(workspace)?;
    let session = require_session(&store)?;
    require_delete(&session)?;

    let days = retention_days(&store, days)?;
    let cutoff = Utc::now() - Duration::days(days);

    let entries = store.list_audit()?;
    let total = entries.len();
    let kept: Vec<AuditEntry> = entries
        .into_iter()
        .filter(|e| e.timestamp > cutoff)
        .collect();
    let removed = total - kept.len();

    if !dry_run {
        store.save_audit(&kept)?;
    }

    Ok(AuditPurgeResult {
        days,
        removed,
        remaining: kept.len(),
        dry_run,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::generate_id;
    use crate::test_utils::TestEnv;

    fn entry(
        user_id: &str,
        action: AuditAction,
        entity_kind: AuditEntityKind,
        entity_id: &str,
        project_id: &str,
    ) -> AuditEntry {
        let mut e = AuditEntry::new(
            generate_id("audit", entity_id),
            user_id.to_string(),
            "admin".to_string(),
            action,
            entity_kind,
            entity_id.to_string(),
            format!("Entity {}", entity_id),
        );
        e.project_id = Some(project_id.to_string());
        e
    }

    #[test]
    fn test_filters_combine() {
        let entries = vec![
            entry("1", AuditAction::Create, AuditEntityKind::Risk, "1", "p1"),
            entry("1", AuditAction::Update, AuditEntityKind::Risk, "1", "p1"),
            entry("2", AuditAction::Update, AuditEntityKind::Risk, "2", "p1"),
            entry("1", AuditAction::Create, AuditEntityKind::Project, "p2", "p2"),
        ];

        let by_project = apply_filters(entries.clone(), Some("p1"), None, None, None);
        assert_eq!(by_project.len(), 3);

        let by_risk = apply_filters(entries.clone(), None, Some(1), None, None);
        assert_eq!(by_risk.len(), 2);

        let by_user = apply_filters(entries.clone(), None, None, Some("2"), None);
        assert_eq!(by_user.len(), 1);

        let narrowed = apply_filters(
            entries,
            Some("p1"),
            Some(1),
            Some("1"),
            Some(AuditAction::Update),
        );
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].action, AuditAction::Update);
    }

    #[test]
    fn test_risk_filter_ignores_project_entries() {
        // A project entry whose id happens to match the risk id must not leak in.
        let entries = vec![
            entry("1", AuditAction::Create, AuditEntityKind::Project, "7", "7"),
            entry("1", AuditAction::Create, AuditEntityKind::Risk, "7", "p1"),
        ];
        let filtered = apply_filters(entries, None, Some(7), None, None);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].entity_kind, AuditEntityKind::Risk);
    }

    #[test]
    fn test_retention_days_flag_wins() {
        let env = TestEnv::new();
        let store = env.init_store();
        store.set_config(RETENTION_CONFIG_KEY, "30").unwrap();

        assert_eq!(retention_days(&store, Some(7)).unwrap(), 7);
        assert_eq!(retention_days(&store, None).unwrap(), 30);
    }

    #[test]
    fn test_retention_days_defaults_to_90() {
        let env = TestEnv::new();
        let store = env.init_store();
        assert_eq!(retention_days(&store, None).unwrap(), 90);
    }

    #[test]
    fn test_retention_days_rejects_bad_values() {
        let env = TestEnv::new();
        let store = env.init_store();

        assert!(retention_days(&store, Some(-1)).is_err());

        store.set_config(RETENTION_CONFIG_KEY, "soon").unwrap();
        let err = retention_days(&store, None).unwrap_err();
        assert!(err.to_string().contains("audit_retention_days"));
    }

    #[test]
    fn test_purge_cutoff_keeps_strictly_newer() {
        let env = TestEnv::new();
        let store = env.init_store();

        let mut old = entry("1", AuditAction::Create, AuditEntityKind::Risk, "1", "p1");
        old.timestamp = Utc::now() - Duration::days(120);
        let fresh = entry("1", AuditAction::Update, AuditEntityKind::Risk, "1", "p1");
        store.append_audit(&old).unwrap();
        store.append_audit(&fresh).unwrap();

        // Mirror audit_purge's retain-and-save step with the default window.
        let cutoff = Utc::now() - Duration::days(90);
        let kept: Vec<AuditEntry> = store
            .list_audit()
            .unwrap()
            .into_iter()
            .filter(|e| e.timestamp > cutoff)
            .collect();
        store.save_audit(&kept).unwrap();

        let trail = store.list_audit().unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].id, fresh.id);
    }

    #[test]
    fn test_list_result_human_shows_changed_fields() {
        let mut updated = entry("1", AuditAction::Update, AuditEntityKind::Risk, "4", "p1");
        updated.changes = vec![
            crate::models::audit::FieldChange::of_str("name", "A", "B"),
            crate::models::audit::FieldChange::of_str("what", "same", "same"),
        ];
        let result = AuditListResult {
            count: 1,
            matched: 1,
            entries: vec![updated],
        };
        let human = result.to_human();
        assert!(human.contains("(changed: name)"));
        assert!(!human.contains("what"));
    }

    #[test]
    fn test_purge_result_human() {
        let dry = AuditPurgeResult {
            days: 90,
            removed: 3,
            remaining: 9,
            dry_run: true,
        };
        assert_eq!(
            dry.to_human(),
            "Would remove 3 audit entries older than 90 days (9 would remain)"
        );

        let wet = AuditPurgeResult {
            days: 30,
            removed: 0,
            remaining: 12,
            dry_run: false,
        };
        assert_eq!(
            wet.to_human(),
            "Removed 0 audit entries older than 30 days (12 remain)"
        );
    }
}
