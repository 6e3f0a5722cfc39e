//! Alert rule commands: CRUD, enable/disable, and on-demand evaluation.
//!
//! `rule eval` is the only path that runs the evaluator. It checks a
//! project's enabled rules against its current risks, records an alert
//! notification for each rule that fires, and fans out to the mock
//! channel senders.

use std::path::Path;

use serde::Serialize;

use crate::alerts::{self, TriggeredAlert, evaluate_rules};
use crate::commands::{Output, require_delete, require_edit, require_session, resolve_project};
use crate::models::notify::{
    AlertChannel, AlertCondition, AlertRule, Notification, NotificationKind,
};
use crate::storage::{Store, generate_id, validate_id};
use crate::{Error, Result};

/// Placeholder SMS number; the sender is a mock and there is no
/// per-user number to send to.
const SMS_TARGET: &str = "+84XXXXXXXXX";

/// Placeholder Telegram chat id, for the same reason.
const TELEGRAM_TARGET: &str = "CHAT_ID";

/// Result of `rb rule create`.
#[derive(Debug, Serialize)]
pub struct RuleCreateResult {
    #[serde(flatten)]
    pub rule: AlertRule,
}

impl Output for RuleCreateResult {
    fn to_human(&self) -> String {
        let mut out = format!(
            "Created rule {}: \"{}\" ({}) for project {}",
            self.rule.id, self.rule.name, self.rule.condition, self.rule.project_id
        );
        if self.rule.condition.needs_threshold() && self.rule.threshold.is_none() {
            out.push_str("\n  note: no threshold set; this rule will never fire");
        }
        if !self.rule.enabled {
            out.push_str("\n  note: created disabled");
        }
        out
    }
}

/// Create an alert rule for a project.
///
/// Threshold conditions are accepted without a threshold, but such a
/// rule never fires; the human output points this out.
pub fn rule_create(
    workspace: &Path,
    name: &str,
    project: Option<String>,
    condition: &str,
    threshold: Option<f64>,
    channels: &[String],
    disabled: bool,
) -> Result<RuleCreateResult> {
    let store = Store::open(workspace)?;
    let session = require_session(&store)?;
    require_edit(&session)?;

    if name.trim().is_empty() {
        return Err(Error::InvalidInput(
            "Rule name must not be blank".to_string(),
        ));
    }

    let project_id = resolve_project(&store, project)?;
    let project = store.get_project(&project_id)?;

    let condition = condition.parse::<AlertCondition>()?;
    let channels = channels
        .iter()
        .map(|c| c.parse::<AlertChannel>())
        .collect::<Result<Vec<_>>>()?;

    let mut rule = AlertRule::new(
        generate_id("rule", name),
        name.to_string(),
        project.id,
        condition,
    );
    rule.threshold = threshold;
    rule.channels = channels;
    rule.enabled = !disabled;

    store.create_rule(&rule)?;
    Ok(RuleCreateResult { rule })
}

/// Result of `rb rule list`.
#[derive(Debug, Serialize)]
pub struct RuleListResult {
    pub count: usize,
    pub rules: Vec<AlertRule>,
}

impl Output for RuleListResult {
    fn to_human(&self) -> String {
        if self.rules.is_empty() {
            return "No alert rules.".to_string();
        }

        let mut out = format!("{} rule(s):\n", self.count);
        for rule in &self.rules {
            let threshold = rule
                .threshold
                .map(|t| format!(" >= {}", t))
                .unwrap_or_default();
            let channels = if rule.channels.is_empty() {
                String::new()
            } else {
                format!(
                    " via {}",
                    rule.channels
                        .iter()
                        .map(|c| c.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            };
            out.push_str(&format!(
                "  {}  \"{}\" {}{} [{}] project {}{}\n",
                rule.id,
                rule.name,
                rule.condition,
                threshold,
                if rule.enabled { "enabled" } else { "disabled" },
                rule.project_id,
                channels
            ));
        }
        out.trim_end().to_string()
    }
}

/// List alert rules, optionally narrowed to one project.
///
/// Unlike evaluation, listing shows disabled rules too.
pub fn rule_list(workspace: &Path, project: Option<String>) -> Result<RuleListResult> {
    let store = Store::open(workspace)?;
    require_session(&store)?;

    let mut rules = store.list_rules()?;
    if let Some(project) = project {
        rules.retain(|r| r.project_id == project);
    }

    Ok(RuleListResult {
        count: rules.len(),
        rules,
    })
}

/// Result of `rb rule enable` / `rb rule disable`.
#[derive(Debug, Serialize)]
pub struct RuleToggleResult {
    pub id: String,
    pub name: String,
    pub enabled: bool,
}

impl Output for RuleToggleResult {
    fn to_human(&self) -> String {
        format!(
            "{} rule {}: \"{}\"",
            if self.enabled { "Enabled" } else { "Disabled" },
            self.id,
            self.name
        )
    }
}

fn set_rule_enabled(workspace: &Path, id: &str, enabled: bool) -> Result<RuleToggleResult> {
    let store = Store::open(workspace)?;
    let session = require_session(&store)?;
    require_edit(&session)?;

    validate_id(id, "rule")?;
    let mut rule = store.get_rule(id)?;
    rule.enabled = enabled;
    store.update_rule(&rule)?;

    Ok(RuleToggleResult {
        id: rule.id,
        name: rule.name,
        enabled,
    })
}

/// Enable a rule so `rule eval` checks it again.
pub fn rule_enable(workspace: &Path, id: &str) -> Result<RuleToggleResult> {
    set_rule_enabled(workspace, id, true)
}

/// Disable a rule without deleting it.
pub fn rule_disable(workspace: &Path, id: &str) -> Result<RuleToggleResult> {
    set_rule_enabled(workspace, id, false)
}

/// Result of `rb rule delete`.
#[derive(Debug, Serialize)]
pub struct RuleDeleteResult {
    pub id: String,
    pub name: String,
}

impl Output for RuleDeleteResult {
    fn to_human(&self) -> String {
        format!("Deleted rule {}: \"{}\"", self.id, self.name)
    }
}

/// Delete a rule.
pub fn rule_delete(workspace: &Path, id: &str, force: bool) -> Result<RuleDeleteResult> {
    let store = Store::open(workspace)?;
    let session = require_session(&store)?;
    require_delete(&session)?;

    validate_id(id, "rule")?;
    let rule = store.get_rule(id)?;
    if !force {
        return Err(Error::InvalidInput(format!(
            "Deleting rule \"{}\" cannot be undone; pass --force to confirm",
            rule.name
        )));
    }

    store.delete_rule(&rule.id)?;
    Ok(RuleDeleteResult {
        id: rule.id,
        name: rule.name,
    })
}

/// Result of `rb rule eval`.
#[derive(Debug, Serialize)]
pub struct RuleEvalResult {
    pub project_id: String,

    /// Enabled rules that were checked
    pub rules_checked: usize,

    pub triggered: Vec<TriggeredAlert>,
}

impl Output for RuleEvalResult {
    fn to_human(&self) -> String {
        if self.triggered.is_empty() {
            return format!("Checked {} rule(s); nothing fired.", self.rules_checked);
        }

        let mut out = format!(
            "{} of {} rule(s) fired:\n",
            self.triggered.len(),
            self.rules_checked
        );
        for alert in &self.triggered {
            out.push_str(&format!("  {}: {}", alert.rule_name, alert.message));
            if !alert.channels.is_empty() {
                let channels = alert
                    .channels
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                out.push_str(&format!(" (sent via {})", channels));
            }
            out.push('\n');
        }
        out.trim_end().to_string()
    }
}

/// Evaluate a project's enabled rules and deliver whatever fires.
///
/// Each fired rule becomes an alert notification for the session user,
/// titled with the rule name, and goes out over the rule's channels.
/// Email goes to the session user's address; SMS and Telegram have no
/// per-user targets and use placeholders.
pub fn rule_eval(workspace: &Path, project: Option<String>) -> Result<RuleEvalResult> {
    let store = Store::open(workspace)?;
    let session = require_session(&store)?;

    let project_id = resolve_project(&store, project)?;
    let project = store.get_project(&project_id)?;

    let rules = store.project_rules(&project.id)?;
    let mut risks = store.list_risks()?;
    risks.retain(|r| r.project_id == project.id);

    let triggered = evaluate_rules(&rules, &risks);
    for alert in &triggered {
        let mut notification = Notification::new(
            generate_id("ntf", &alert.rule_id),
            session.user_id.clone(),
            alert.rule_name.clone(),
            alert.message.clone(),
            NotificationKind::Alert,
        );
        notification.project_id = Some(project.id.clone());
        store.create_notification(&notification)?;

        for channel in &alert.channels {
            match channel {
                AlertChannel::Email => {
                    alerts::send_email(&session.email, &alert.rule_name, &alert.message)
                }
                AlertChannel::Sms => alerts::send_sms(SMS_TARGET, &alert.message),
                AlertChannel::Telegram => alerts::send_telegram(TELEGRAM_TARGET, &alert.message),
            }
        }
    }

    Ok(RuleEvalResult {
        project_id: project.id,
        rules_checked: rules.len(),
        triggered,
    })
}
