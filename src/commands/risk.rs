//! Risk CRUD commands.
//!
//! Risk mutations are the heart of the audit trail: every create,
//! update, and delete appends an audit entry and notifies the acting
//! user. Updates always record the full five-field narrative diff
//! (name, what, when, how, solution), changed or not, so the trail
//! shows the record as it stood at update time.

use std::path::Path;

use serde::Serialize;

use crate::commands::{Output, audit_entry, require_edit, require_session, resolve_project};
use crate::models::audit::{AuditAction, AuditEntityKind, risk_update_changes};
use crate::models::auth::Session;
use crate::models::notify::{Notification, NotificationKind};
use crate::models::{Risk, RiskSeverity, RiskStatus};
use crate::storage::{Store, generate_id, parse_risk_id};
use crate::{Error, Result};

fn validate_probability(probability: f64) -> Result<()> {
    if (0.0..=1.0).contains(&probability) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "Probability must be 0-1, got: {}",
            probability
        )))
    }
}

fn validate_impact(impact: f64) -> Result<()> {
    if (1.0..=10.0).contains(&impact) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "Impact must be 1-10, got: {}",
            impact
        )))
    }
}

/// Notify the acting user about a risk mutation they just made.
fn risk_notification(
    session: &Session,
    kind: NotificationKind,
    title: &str,
    verb: &str,
    risk_name: &str,
    project_id: &str,
    risk_id: Option<u64>,
) -> Notification {
    let mut notification = Notification::new(
        generate_id("ntf", risk_name),
        session.user_id.clone(),
        title.to_string(),
        format!("{} {} risk: {}", session.username, verb, risk_name),
        kind,
    );
    notification.project_id = Some(project_id.to_string());
    notification.risk_id = risk_id;
    notification
}

/// Result of `rb risk create`.
#[derive(Debug, Serialize)]
pub struct RiskCreateResult {
    #[serde(flatten)]
    pub risk: Risk,
}

impl Output for RiskCreateResult {
    fn to_human(&self) -> String {
        format!(
            "Created risk {} (#{}): \"{}\" in project {}",
            self.risk.id, self.risk.seq, self.risk.name, self.risk.project_id
        )
    }
}

/// Create a risk in a project.
///
/// The score is taken from `--score` when given, otherwise derived from
/// probability and impact when both are present.
#[allow(clippy::too_many_arguments)]
pub fn risk_create(
    workspace: &Path,
    name: &str,
    project: Option<String>,
    seq: Option<u32>,
    what: Option<String>,
    when: Option<String>,
    how: Option<String>,
    solution: Option<String>,
    severity: Option<String>,
    probability: Option<f64>,
    impact: Option<f64>,
    score: Option<f64>,
    status: Option<String>,
) -> Result<RiskCreateResult> {
    let store = Store::open(workspace)?;
    let session = require_session(&store)?;
    require_edit(&session)?;

    if name.trim().is_empty() {
        return Err(Error::InvalidInput(
            "Risk name must not be blank".to_string(),
        ));
    }

    let project_id = resolve_project(&store, project)?;
    // Risks must reference a project that actually exists.
    let project = store.get_project(&project_id)?;

    if let Some(probability) = probability {
        validate_probability(probability)?;
    }
    if let Some(impact) = impact {
        validate_impact(impact)?;
    }

    let id = store.next_risk_id()?;
    let mut risk = Risk::new(id, project.id.clone(), name.to_string());
    risk.seq = match seq {
        Some(seq) => seq,
        None => store.next_risk_seq(&project.id)?,
    };
    if let Some(what) = what {
        risk.what = what;
    }
    if let Some(when) = when {
        risk.when = when;
    }
    if let Some(how) = how {
        risk.how = how;
    }
    if let Some(solution) = solution {
        risk.solution = solution;
    }
    if let Some(severity) = severity {
        risk.severity = Some(severity.parse::<RiskSeverity>()?);
    }
    risk.probability = probability;
    risk.impact = impact;
    risk.score = match score {
        Some(score) => Some(score),
        None => risk.compute_score(),
    };
    if let Some(status) = status {
        risk.status = Some(status.parse::<RiskStatus>()?);
    }
    risk.created_by = Some(session.username.clone());

    store.create_risk(&risk)?;
    store.append_audit(&audit_entry(
        &session,
        AuditAction::Create,
        AuditEntityKind::Risk,
        &risk.id.to_string(),
        &risk.name,
        &project,
    ))?;
    store.create_notification(&risk_notification(
        &session,
        NotificationKind::Info,
        "Risk added",
        "added",
        &risk.name,
        &project.id,
        Some(risk.id),
    ))?;

    Ok(RiskCreateResult { risk })
}

/// Result of `rb risk list`.
#[derive(Debug, Serialize)]
pub struct RiskListResult {
    pub count: usize,

    /// Project the list is scoped to; absent with `--all`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    pub risks: Vec<Risk>,
}

impl Output for RiskListResult {
    fn to_human(&self) -> String {
        if self.risks.is_empty() {
            return "No risks match.".to_string();
        }

        let mut out = format!("{} risk(s):\n", self.count);
        for risk in &self.risks {
            let severity = risk
                .severity
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unrated".to_string());
            let status = risk
                .status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "untracked".to_string());
            out.push_str(&format!(
                "  {} #{} \"{}\" [{}/{}]\n",
                risk.id, risk.seq, risk.name, severity, status
            ));
        }
        out.trim_end().to_string()
    }
}

/// List risks, scoped to one project unless `--all` is given.
pub fn risk_list(
    workspace: &Path,
    project: Option<String>,
    all: bool,
    severity: Option<String>,
    status: Option<String>,
) -> Result<RiskListResult> {
    let store = Store::open(workspace)?;
    require_session(&store)?;

    let mut risks = store.list_risks()?;
    let project_id = if all {
        None
    } else {
        let id = resolve_project(&store, project)?;
        risks.retain(|r| r.project_id == id);
        Some(id)
    };

    if let Some(severity) = severity {
        let severity = severity.parse::<RiskSeverity>()?;
        risks.retain(|r| r.severity == Some(severity));
    }
    if let Some(status) = status {
        let status = status.parse::<RiskStatus>()?;
        risks.retain(|r| r.status == Some(status));
    }

    Ok(RiskListResult {
        count: risks.len(),
        project_id,
        risks,
    })
}

/// Result of `rb risk show`.
#[derive(Debug, Serialize)]
pub struct RiskShowResult {
    #[serde(flatten)]
    pub risk: Risk,
}

impl Output for RiskShowResult {
    fn to_human(&self) -> String {
        let r = &self.risk;
        let mut out = format!("Risk {} (#{}): \"{}\"\n", r.id, r.seq, r.name);
        out.push_str(&format!("  project:     {}\n", r.project_id));
        if !r.what.is_empty() {
            out.push_str(&format!("  what:        {}\n", r.what));
        }
        if !r.when.is_empty() {
            out.push_str(&format!("  when:        {}\n", r.when));
        }
        if !r.how.is_empty() {
            out.push_str(&format!("  how:         {}\n", r.how));
        }
        if !r.solution.is_empty() {
            out.push_str(&format!("  solution:    {}\n", r.solution));
        }
        if let Some(severity) = r.severity {
            out.push_str(&format!("  severity:    {}\n", severity));
        }
        if let Some(probability) = r.probability {
            out.push_str(&format!("  probability: {}\n", probability));
        }
        if let Some(impact) = r.impact {
            out.push_str(&format!("  impact:      {}\n", impact));
        }
        if let Some(score) = r.score {
            out.push_str(&format!("  score:       {}\n", score));
        }
        if let Some(status) = r.status {
            out.push_str(&format!("  status:      {}\n", status));
        }
        if let Some(created_by) = &r.created_by {
            out.push_str(&format!("  created by:  {}\n", created_by));
        }
        out.push_str(&format!(
            "  updated:     {}",
            r.last_updated.format("%Y-%m-%d %H:%M UTC")
        ));
        out
    }
}

/// Show one risk.
pub fn risk_show(workspace: &Path, id: &str) -> Result<RiskShowResult> {
    let store = Store::open(workspace)?;
    require_session(&store)?;

    let risk = store.get_risk(parse_risk_id(id)?)?;
    Ok(RiskShowResult { risk })
}

/// Result of `rb risk update`.
#[derive(Debug, Serialize)]
pub struct RiskUpdateResult {
    #[serde(flatten)]
    pub risk: Risk,

    /// Narrative fields whose value actually changed
    pub changed_fields: Vec<String>,
}

impl Output for RiskUpdateResult {
    fn to_human(&self) -> String {
        let changed = if self.changed_fields.is_empty() {
            "no narrative changes".to_string()
        } else {
            format!("changed: {}", self.changed_fields.join(", "))
        };
        format!(
            "Updated risk {}: \"{}\" ({})",
            self.risk.id, self.risk.name, changed
        )
    }
}

/// Merge the given fields into an existing risk.
///
/// The stored score is never touched unless `--score` sets it directly
/// or `--recompute-score` derives it from the (possibly new)
/// probability and impact.
#[allow(clippy::too_many_arguments)]
pub fn risk_update(
    workspace: &Path,
    id: &str,
    name: Option<String>,
    seq: Option<u32>,
    what: Option<String>,
    when: Option<String>,
    how: Option<String>,
    solution: Option<String>,
    severity: Option<String>,
    probability: Option<f64>,
    impact: Option<f64>,
    score: Option<f64>,
    status: Option<String>,
    recompute_score: bool,
) -> Result<RiskUpdateResult> {
    let store = Store::open(workspace)?;
    let session = require_session(&store)?;
    require_edit(&session)?;

    let old = store.get_risk(parse_risk_id(id)?)?;
    let project = store.get_project(&old.project_id)?;

    if let Some(probability) = probability {
        validate_probability(probability)?;
    }
    if let Some(impact) = impact {
        validate_impact(impact)?;
    }

    let mut risk = old.clone();
    if let Some(name) = name {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Risk name must not be blank".to_string(),
            ));
        }
        risk.name = name;
    }
    if let Some(seq) = seq {
        risk.seq = seq;
    }
    if let Some(what) = what {
        risk.what = what;
    }
    if let Some(when) = when {
        risk.when = when;
    }
    if let Some(how) = how {
        risk.how = how;
    }
    if let Some(solution) = solution {
        risk.solution = solution;
    }
    if let Some(severity) = severity {
        risk.severity = Some(severity.parse::<RiskSeverity>()?);
    }
    if let Some(probability) = probability {
        risk.probability = Some(probability);
    }
    if let Some(impact) = impact {
        risk.impact = Some(impact);
    }
    if let Some(status) = status {
        risk.status = Some(status.parse::<RiskStatus>()?);
    }
    if let Some(score) = score {
        risk.score = Some(score);
    } else if recompute_score {
        risk.score = risk.compute_score();
    }
    risk.last_updated = chrono::Utc::now();

    store.update_risk(&risk)?;

    // The trail always carries all five narrative fields.
    let changes = risk_update_changes(&old, &risk);
    let changed_fields: Vec<String> = changes
        .iter()
        .filter(|c| c.is_effective())
        .map(|c| c.field.clone())
        .collect();
    let mut entry = audit_entry(
        &session,
        AuditAction::Update,
        AuditEntityKind::Risk,
        &risk.id.to_string(),
        &risk.name,
        &project,
    );
    entry.changes = changes;
    store.append_audit(&entry)?;

    store.create_notification(&risk_notification(
        &session,
        NotificationKind::Info,
        "Risk updated",
        "updated",
        &risk.name,
        &project.id,
        Some(risk.id),
    ))?;

    Ok(RiskUpdateResult {
        risk,
        changed_fields,
    })
}

/// Result of `rb risk delete`.
#[derive(Debug, Serialize)]
pub struct RiskDeleteResult {
    pub id: u64,
    pub name: String,
    pub project_id: String,
}

impl Output for RiskDeleteResult {
    fn to_human(&self) -> String {
        format!("Deleted risk {}: \"{}\"", self.id, self.name)
    }
}

/// Delete a risk.
///
/// The warning notification links the project but not the risk, which
/// no longer exists.
pub fn risk_delete(workspace: &Path, id: &str, force: bool) -> Result<RiskDeleteResult> {
    let store = Store::open(workspace)?;
    let session = require_session(&store)?;
    require_edit(&session)?;

    let risk = store.get_risk(parse_risk_id(id)?)?;
    if !force {
        return Err(Error::InvalidInput(format!(
            "Deleting risk \"{}\" cannot be undone; pass --force to confirm",
            risk.name
        )));
    }
    let project = store.get_project(&risk.project_id)?;

    store.delete_risk(risk.id)?;
    store.append_audit(&audit_entry(
        &session,
        AuditAction::Delete,
        AuditEntityKind::Risk,
        &risk.id.to_string(),
        &risk.name,
        &project,
    ))?;
    store.create_notification(&risk_notification(
        &session,
        NotificationKind::Warning,
        "Risk removed",
        "removed",
        &risk.name,
        &project.id,
        None,
    ))?;

    Ok(RiskDeleteResult {
        id: risk.id,
        name: risk.name,
        project_id: risk.project_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Project;
    use crate::models::auth::authenticate;
    use crate::test_utils::TestEnv;

    fn admin_session() -> Session {
        Session::new(authenticate("admin", "admin123").unwrap())
    }

    #[test]
    fn test_validate_probability_bounds() {
        assert!(validate_probability(0.0).is_ok());
        assert!(validate_probability(0.5).is_ok());
        assert!(validate_probability(1.0).is_ok());
        assert!(validate_probability(-0.1).is_err());
        assert!(validate_probability(1.1).is_err());
    }

    #[test]
    fn test_validate_impact_bounds() {
        assert!(validate_impact(1.0).is_ok());
        assert!(validate_impact(10.0).is_ok());
        assert!(validate_impact(0.9).is_err());
        assert!(validate_impact(10.5).is_err());
    }

    #[test]
    fn test_risk_notification_links() {
        let session = admin_session();
        let created = risk_notification(
            &session,
            NotificationKind::Info,
            "Risk added",
            "added",
            "Groundwater ingress",
            "1756137600000",
            Some(4),
        );
        assert_eq!(created.title, "Risk added");
        assert_eq!(created.message, "admin added risk: Groundwater ingress");
        assert_eq!(created.risk_id, Some(4));
        assert_eq!(created.project_id.as_deref(), Some("1756137600000"));
        assert!(!created.read);

        // Delete notifications carry no risk link.
        let removed = risk_notification(
            &session,
            NotificationKind::Warning,
            "Risk removed",
            "removed",
            "Groundwater ingress",
            "1756137600000",
            None,
        );
        assert_eq!(removed.kind, NotificationKind::Warning);
        assert!(removed.risk_id.is_none());
    }

    #[test]
    fn test_update_records_all_five_fields_in_trail() {
        let env = TestEnv::new();
        let store = env.init_store();
        let session = admin_session();

        let project = Project::new("p1".to_string(), "Harbor Tunnel".to_string());
        store.create_project(&project).unwrap();
        let mut old = Risk::new(1, "p1".to_string(), "A".to_string());
        old.what = "groundwater".to_string();
        store.create_risk(&old).unwrap();

        // Mirror risk_update's audit step: rename A -> B, nothing else.
        let mut new = old.clone();
        new.name = "B".to_string();
        store.update_risk(&new).unwrap();
        let mut entry = audit_entry(
            &session,
            AuditAction::Update,
            AuditEntityKind::Risk,
            "1",
            &new.name,
            &project,
        );
        entry.changes = risk_update_changes(&old, &new);
        store.append_audit(&entry).unwrap();

        let trail = store.list_audit().unwrap();
        assert_eq!(trail.len(), 1);
        let changes = &trail[0].changes;
        assert_eq!(changes.len(), 5);
        assert_eq!(changes[0].field, "name");
        assert_eq!(changes[0].old_value, serde_json::json!("A"));
        assert_eq!(changes[0].new_value, serde_json::json!("B"));
        // Unchanged fields still appear, equal on both sides.
        assert_eq!(changes[1].field, "what");
        assert_eq!(changes[1].old_value, changes[1].new_value);
    }

    #[test]
    fn test_create_result_human() {
        let mut risk = Risk::new(4, "1756137600000".to_string(), "Groundwater".to_string());
        risk.seq = 2;
        let result = RiskCreateResult { risk };
        assert_eq!(
            result.to_human(),
            "Created risk 4 (#2): \"Groundwater\" in project 1756137600000"
        );
    }

    #[test]
    fn test_update_result_human_lists_changes() {
        let risk = Risk::new(4, "p1".to_string(), "B".to_string());
        let with_changes = RiskUpdateResult {
            risk: risk.clone(),
            changed_fields: vec!["name".to_string(), "solution".to_string()],
        };
        assert!(with_changes.to_human().contains("changed: name, solution"));

        let without = RiskUpdateResult {
            risk,
            changed_fields: Vec::new(),
        };
        assert!(without.to_human().contains("no narrative changes"));
    }

    #[test]
    fn test_list_result_human_shows_placeholders() {
        let risk = Risk::new(1, "p1".to_string(), "Bare".to_string());
        let result = RiskListResult {
            count: 1,
            project_id: Some("p1".to_string()),
            risks: vec![risk],
        };
        assert!(result.to_human().contains("[unrated/untracked]"));
    }
}
