//! Dashboard metrics, trend series, and CSV export.
//!
//! Everything here is a pure function over a slice of risks; commands
//! decide which risks to pass (one project's or all of them) and what to
//! do with the result.

use crate::models::{Risk, RiskSeverity, RiskStatus};
use chrono::{Duration, NaiveDate, Utc};
use rand::Rng;
use serde::Serialize;

/// Headline numbers for a set of risks.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardMetrics {
    /// Total number of risks
    pub total_risks: usize,
    /// Count with critical severity
    pub critical_risks: usize,
    /// Count with high severity
    pub high_risks: usize,
    /// Count with medium severity
    pub medium_risks: usize,
    /// Count with low severity
    pub low_risks: usize,
    /// Count with no severity assigned yet
    pub unrated_risks: usize,
    /// Count with active status
    pub active_risks: usize,
    /// Count with monitored status
    pub monitored_risks: usize,
    /// Count with resolved status
    pub resolved_risks: usize,
    /// Count with no status assigned yet
    pub untracked_risks: usize,
    /// Mean risk score, missing scores counted as zero, two decimals
    pub avg_risk_score: f64,
    /// Resolved share as a percentage, one decimal, zero when empty
    pub resolution_rate: f64,
}

/// Risk counts by severity band.
///
/// `unrated` picks up risks with no severity, so the five buckets always
/// sum to the number of risks counted.
#[derive(Debug, Clone, Serialize)]
pub struct SeverityDistribution {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
    pub unrated: usize,
}

/// Risk counts by tracking status.
///
/// `untracked` picks up risks with no status, so the four buckets always
/// sum to the number of risks counted.
#[derive(Debug, Clone, Serialize)]
pub struct StatusDistribution {
    pub active: usize,
    pub monitored: usize,
    pub resolved: usize,
    pub untracked: usize,
}

/// One day in a trend series.
#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    /// Calendar day
    pub date: NaiveDate,
    /// Simulated total risk count
    pub total_risks: i64,
    /// Simulated active count
    pub active_risks: i64,
    /// Simulated resolved count
    pub resolved_risks: i64,
    /// Simulated mean score
    pub avg_risk_score: f64,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Count risks by severity band.
pub fn severity_distribution(risks: &[Risk]) -> SeverityDistribution {
    SeverityDistribution {
        low: count_severity(risks, RiskSeverity::Low),
        medium: count_severity(risks, RiskSeverity::Medium),
        high: count_severity(risks, RiskSeverity::High),
        critical: count_severity(risks, RiskSeverity::Critical),
        unrated: risks.iter().filter(|r| r.severity.is_none()).count(),
    }
}

/// Count risks by tracking status.
pub fn status_distribution(risks: &[Risk]) -> StatusDistribution {
    StatusDistribution {
        active: count_status(risks, RiskStatus::Active),
        monitored: count_status(risks, RiskStatus::Monitored),
        resolved: count_status(risks, RiskStatus::Resolved),
        untracked: risks.iter().filter(|r| r.status.is_none()).count(),
    }
}

fn count_severity(risks: &[Risk], severity: RiskSeverity) -> usize {
    risks.iter().filter(|r| r.severity == Some(severity)).count()
}

fn count_status(risks: &[Risk], status: RiskStatus) -> usize {
    risks.iter().filter(|r| r.status == Some(status)).count()
}

/// Compute the headline metrics for a set of risks.
pub fn calculate_metrics(risks: &[Risk]) -> DashboardMetrics {
    let severities = severity_distribution(risks);
    let statuses = status_distribution(risks);

    let avg_score = if risks.is_empty() {
        0.0
    } else {
        let sum: f64 = risks.iter().map(|r| r.score.unwrap_or(0.0)).sum();
        sum / risks.len() as f64
    };

    let resolution_rate = if risks.is_empty() {
        0.0
    } else {
        round1(statuses.resolved as f64 / risks.len() as f64 * 100.0)
    };

    DashboardMetrics {
        total_risks: risks.len(),
        critical_risks: severities.critical,
        high_risks: severities.high,
        medium_risks: severities.medium,
        low_risks: severities.low,
        unrated_risks: severities.unrated,
        active_risks: statuses.active,
        monitored_risks: statuses.monitored,
        resolved_risks: statuses.resolved,
        untracked_risks: statuses.untracked,
        avg_risk_score: round2(avg_score),
        resolution_rate,
    }
}

/// Generate an illustrative trend series ending today.
///
/// The series ramps up to the current risk count with per-day jitter.
/// It is simulated presentation data, not stored history: only the final
/// day's neighborhood reflects the real count.
pub fn generate_trends(risks: &[Risk], days: u32) -> Vec<TrendPoint> {
    let mut rng = rand::thread_rng();
    let today = Utc::now().date_naive();
    let days = days.max(1);

    let mut trends = Vec::with_capacity(days as usize);
    for i in (0..days).rev() {
        let date = today - Duration::days(i as i64);

        let ramp = risks.len() as f64 * (1.0 - i as f64 / days as f64);
        let base = (ramp.floor() as i64).max(2);
        let jitter = rng.gen_range(-1..=1);

        trends.push(TrendPoint {
            date,
            total_risks: base + jitter,
            active_risks: (base as f64 * 0.6).floor() as i64,
            resolved_risks: (base as f64 * 0.4).floor() as i64,
            avg_risk_score: round2(4.0 + rng.r#gen::<f64>() * 3.0),
        });
    }

    trends
}

/// Return the most recently created risks, newest first.
///
/// Risks without a creation timestamp sort as oldest.
pub fn recent_changes(risks: &[Risk], limit: usize) -> Vec<Risk> {
    let mut sorted = risks.to_vec();
    sorted.sort_by_key(|r| {
        std::cmp::Reverse(r.created_at.map(|t| t.timestamp_millis()).unwrap_or(0))
    });
    sorted.truncate(limit);
    sorted
}

/// CSV column headers for the risk report.
const CSV_HEADERS: [&str; 9] = [
    "Seq",
    "Risk Name",
    "What",
    "When",
    "How",
    "Solution",
    "Severity",
    "Risk Score",
    "Status",
];

/// Render risks as CSV.
///
/// Every cell is double-quoted with embedded quotes doubled; rows are
/// joined with `\n`. Unset severity, score, and status render as "N/A".
pub fn export_csv(risks: &[Risk]) -> String {
    let mut rows: Vec<String> = Vec::with_capacity(risks.len() + 1);
    rows.push(csv_row(CSV_HEADERS.iter().map(|h| h.to_string())));

    for risk in risks {
        let cells = [
            risk.seq.to_string(),
            risk.name.clone(),
            risk.what.clone(),
            risk.when.clone(),
            risk.how.clone(),
            risk.solution.clone(),
            risk
                .severity
                .map(|s| s.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            risk
                .score
                .map(|s| s.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            risk
                .status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
        ];
        rows.push(csv_row(cells.into_iter()));
    }

    rows.join("\n")
}

fn csv_row(cells: impl Iterator<Item = String>) -> String {
    cells
        .map(|cell| format!("\"{}\"", cell.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(",")
}

/// Default export filename: `risk_report_<project>_<date>.csv`.
///
/// Path separators in the project name are replaced so the name stays a
/// single path component.
pub fn export_filename(project_name: &str, date: NaiveDate) -> String {
    let safe_name = project_name.replace(['/', '\\'], "-");
    format!("risk_report_{}_{}.csv", safe_name, date.format("%Y-%m-%d"))
}
