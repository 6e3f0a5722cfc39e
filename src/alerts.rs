//! Alert rule evaluation and mock delivery channels.
//!
//! Evaluation is pure: it takes a project's rules and risks and reports
//! which rules fired. The command layer turns triggered alerts into
//! notifications and fans out to the channel senders, which only log;
//! wiring a real provider would replace the senders here.

use crate::models::notify::{AlertChannel, AlertCondition, AlertRule};
use crate::models::{Risk, RiskSeverity, RiskStatus};
use serde::Serialize;

/// A rule that fired during evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct TriggeredAlert {
    /// Rule that fired
    pub rule_id: String,
    /// Rule name, reused as the notification title
    pub rule_name: String,
    /// Condition that was checked
    pub condition: AlertCondition,
    /// Number of risks that matched the condition
    pub matched: usize,
    /// Message for the notification and channel fan-out
    pub message: String,
    /// Channels the rule wants notified
    pub channels: Vec<AlertChannel>,
}

/// Evaluate rules against a project's risks.
///
/// Disabled rules never fire. Threshold conditions with no stored
/// threshold never fire either; the original data cannot say when they
/// should.
pub fn evaluate_rules(rules: &[AlertRule], risks: &[Risk]) -> Vec<TriggeredAlert> {
    let mut triggered = Vec::new();

    for rule in rules {
        if !rule.enabled {
            continue;
        }

        let (matched, fired) = check_condition(rule, risks);
        if !fired {
            continue;
        }

        triggered.push(TriggeredAlert {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            condition: rule.condition,
            matched,
            message: alert_message(rule.condition, matched),
            channels: rule.channels.clone(),
        });
    }

    triggered
}

/// Count the risks matching a rule's condition and decide whether it
/// fires.
fn check_condition(rule: &AlertRule, risks: &[Risk]) -> (usize, bool) {
    match rule.condition {
        AlertCondition::HighRiskCount => {
            let matched = risks
                .iter()
                .filter(|r| {
                    matches!(
                        r.severity,
                        Some(RiskSeverity::High) | Some(RiskSeverity::Critical)
                    )
                })
                .count();
            (matched, over_threshold(matched, rule.threshold))
        }
        AlertCondition::CriticalRisk => {
            let matched = risks
                .iter()
                .filter(|r| r.severity == Some(RiskSeverity::Critical))
                .count();
            (matched, matched > 0)
        }
        AlertCondition::RiskNotResolved => {
            let matched = risks
                .iter()
                .filter(|r| r.status != Some(RiskStatus::Resolved))
                .count();
            (matched, over_threshold(matched, rule.threshold))
        }
        AlertCondition::SeverityThreshold => match rule.threshold {
            Some(t) => {
                let matched = risks
                    .iter()
                    .filter(|r| r.score.unwrap_or(0.0) >= t)
                    .count();
                (matched, matched > 0)
            }
            None => (0, false),
        },
    }
}

fn over_threshold(matched: usize, threshold: Option<f64>) -> bool {
    match threshold {
        Some(t) => matched as f64 >= t,
        None => false,
    }
}

/// Build the notification message for a fired condition.
fn alert_message(condition: AlertCondition, matched: usize) -> String {
    match condition {
        AlertCondition::HighRiskCount => {
            format!("⚠️ {} high-severity risks in the project", matched)
        }
        AlertCondition::CriticalRisk => format!("🚨 Found {} CRITICAL risks", matched),
        AlertCondition::RiskNotResolved => format!("⏰ {} risks not yet resolved", matched),
        AlertCondition::SeverityThreshold => {
            format!("⚡ {} risks above the alert score", matched)
        }
    }
}

/// Mock email sender. Logs the send instead of calling a provider.
pub fn send_email(to: &str, subject: &str, message: &str) {
    eprintln!("email to {}: {}: {}", to, subject, message);
}

/// Mock SMS sender. Logs the send instead of calling a provider.
pub fn send_sms(number: &str, message: &str) {
    eprintln!("sms to {}: {}", number, message);
}

/// Mock Telegram sender. Logs the send instead of calling a provider.
pub fn send_telegram(chat_id: &str, message: &str) {
    eprintln!("telegram to {}: {}", chat_id, message);
}
