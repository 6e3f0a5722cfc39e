//! Reporting commands: dashboard metrics, trend series, recent risks,
//! and CSV export.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

use crate::analytics::{self, DashboardMetrics, TrendPoint};
use crate::commands::{Output, require_session, resolve_project};
use crate::models::{Project, Risk};
use crate::storage::Store;
use crate::Result;

/// Config key naming the directory CSV exports default into.
const EXPORT_DIR_CONFIG_KEY: &str = "export_dir";

/// Resolve one project and the risks belonging to it.
fn project_risks(store: &Store, project: Option<String>) -> Result<(Project, Vec<Risk>)> {
    let project_id = resolve_project(store, project)?;
    let project = store.get_project(&project_id)?;
    let mut risks = store.list_risks()?;
    risks.retain(|r| r.project_id == project.id);
    Ok((project, risks))
}

/// Result of `rb report metrics`.
#[derive(Debug, Serialize)]
pub struct ReportMetricsResult {
    /// Project scope; absent with `--all`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    #[serde(flatten)]
    pub metrics: DashboardMetrics,
}

impl Output for ReportMetricsResult {
    fn to_human(&self) -> String {
        let m = &self.metrics;
        let scope = match &self.project_id {
            Some(id) => format!("project {}", id),
            None => "all projects".to_string(),
        };
        let mut out = format!("Metrics for {}:\n", scope);
        out.push_str(&format!("  total risks:     {}\n", m.total_risks));
        out.push_str(&format!(
            "  severity:        {} critical, {} high, {} medium, {} low, {} unrated\n",
            m.critical_risks, m.high_risks, m.medium_risks, m.low_risks, m.unrated_risks
        ));
        out.push_str(&format!(
            "  status:          {} active, {} monitored, {} resolved, {} untracked\n",
            m.active_risks, m.monitored_risks, m.resolved_risks, m.untracked_risks
        ));
        out.push_str(&format!("  avg risk score:  {:.2}\n", m.avg_risk_score));
        out.push_str(&format!("  resolution rate: {:.1}%", m.resolution_rate));
        out
    }
}

/// Dashboard metrics for one project, or for every stored risk with
/// `--all`.
pub fn report_metrics(
    workspace: &Path,
    project: Option<String>,
    all: bool,
) -> Result<ReportMetricsResult> {
    let store = Store::open(workspace)?;
    require_session(&store)?;

    let (project_id, risks) = if all {
        (None, store.list_risks()?)
    } else {
        let (project, risks) = project_risks(&store, project)?;
        (Some(project.id), risks)
    };

    Ok(ReportMetricsResult {
        project_id,
        metrics: analytics::calculate_metrics(&risks),
    })
}

/// Result of `rb report trends`.
#[derive(Debug, Serialize)]
pub struct ReportTrendsResult {
    pub project_id: String,
    pub days: u32,
    pub points: Vec<TrendPoint>,
}

impl Output for ReportTrendsResult {
    fn to_human(&self) -> String {
        if self.points.is_empty() {
            return "No trend points.".to_string();
        }

        let mut out = format!(
            "Risk trend for project {} over {} day(s):\n",
            self.project_id, self.days
        );
        for p in &self.points {
            out.push_str(&format!(
                "  {}  total {:>3}  active {:>3}  resolved {:>3}  avg {:.2}\n",
                p.date, p.total_risks, p.active_risks, p.resolved_risks, p.avg_risk_score
            ));
        }
        out.trim_end().to_string()
    }
}

/// Daily trend series for a project's risks.
///
/// The series is illustrative: no history is stored, so the points are
/// derived from today's total plus noise.
pub fn report_trends(
    workspace: &Path,
    days: u32,
    project: Option<String>,
) -> Result<ReportTrendsResult> {
    let store = Store::open(workspace)?;
    require_session(&store)?;

    let (project, risks) = project_risks(&store, project)?;
    Ok(ReportTrendsResult {
        project_id: project.id,
        days,
        points: analytics::generate_trends(&risks, days),
    })
}

/// Result of `rb report recent`.
#[derive(Debug, Serialize)]
pub struct ReportRecentResult {
    pub project_id: String,
    pub count: usize,
    pub risks: Vec<Risk>,
}

impl Output for ReportRecentResult {
    fn to_human(&self) -> String {
        if self.risks.is_empty() {
            return "No risks yet.".to_string();
        }

        let mut out = format!("{} most recent risk(s):\n", self.count);
        for risk in &self.risks {
            let created = risk
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            out.push_str(&format!(
                "  {}  {} #{} \"{}\"\n",
                created, risk.id, risk.seq, risk.name
            ));
        }
        out.trim_end().to_string()
    }
}

/// Most recently created risks in a project.
pub fn report_recent(
    workspace: &Path,
    limit: usize,
    project: Option<String>,
) -> Result<ReportRecentResult> {
    let store = Store::open(workspace)?;
    require_session(&store)?;

    let (project, risks) = project_risks(&store, project)?;
    let risks = analytics::recent_changes(&risks, limit);
    Ok(ReportRecentResult {
        project_id: project.id,
        count: risks.len(),
        risks,
    })
}

/// Result of `rb report export`.
#[derive(Debug, Serialize)]
pub struct ReportExportResult {
    pub project_id: String,
    pub path: PathBuf,

    /// Data rows written, excluding the header
    pub rows: usize,
}

impl Output for ReportExportResult {
    fn to_human(&self) -> String {
        format!("Exported {} risk(s) to {}", self.rows, self.path.display())
    }
}

/// Where an export lands when `--output` is not given: the `export_dir`
/// config directory when set, else the workspace itself.
fn default_export_path(store: &Store, workspace: &Path, project_name: &str) -> Result<PathBuf> {
    let dir = match store.get_config(EXPORT_DIR_CONFIG_KEY)? {
        Some(dir) => PathBuf::from(dir),
        None => workspace.to_path_buf(),
    };
    Ok(dir.join(analytics::export_filename(project_name, Utc::now().date_naive())))
}

/// Write a project's risks to a CSV file.
///
/// The file starts with a UTF-8 BOM so spreadsheet imports detect the
/// encoding.
pub fn report_export(
    workspace: &Path,
    project: Option<String>,
    output: Option<PathBuf>,
) -> Result<ReportExportResult> {
    let store = Store::open(workspace)?;
    require_session(&store)?;

    let (project, risks) = project_risks(&store, project)?;

    let path = match output {
        Some(path) => path,
        None => default_export_path(&store, workspace, &project.name)?,
    };
    let csv = analytics::export_csv(&risks);
    fs::write(&path, format!("\u{feff}{}", csv))?;

    Ok(ReportExportResult {
        project_id: project.id,
        path,
        rows: risks.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnv;

    #[test]
    fn test_project_risks_requires_existing_project() {
        let env = TestEnv::new();
        let store = env.init_store();

        let err = project_risks(&store, Some("1756137600000".to_string())).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_project_risks_scopes_to_project() {
        let env = TestEnv::new();
        let store = env.init_store();

        let a = Project::new("p1".to_string(), "Harbor Tunnel".to_string());
        let b = Project::new("p2".to_string(), "River Bridge".to_string());
        store.create_project(&a).unwrap();
        store.create_project(&b).unwrap();
        store
            .create_risk(&Risk::new(1, "p1".to_string(), "Flooding".to_string()))
            .unwrap();
        store
            .create_risk(&Risk::new(2, "p2".to_string(), "Scour".to_string()))
            .unwrap();

        let (project, risks) = project_risks(&store, Some("p1".to_string())).unwrap();
        assert_eq!(project.name, "Harbor Tunnel");
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].id, 1);
    }

    #[test]
    fn test_default_export_path_prefers_config_dir() {
        let env = TestEnv::new();
        let store = env.init_store();

        let in_workspace = default_export_path(&store, env.path(), "Harbor Tunnel").unwrap();
        assert!(in_workspace.starts_with(env.path()));
        assert!(
            in_workspace
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("risk_report_Harbor Tunnel_")
        );

        store.set_config(EXPORT_DIR_CONFIG_KEY, "/tmp/exports").unwrap();
        let in_config_dir = default_export_path(&store, env.path(), "Harbor Tunnel").unwrap();
        assert!(in_config_dir.starts_with("/tmp/exports"));
    }

    #[test]
    fn test_metrics_result_human() {
        let result = ReportMetricsResult {
            project_id: Some("1756137600000".to_string()),
            metrics: analytics::calculate_metrics(&[]),
        };
        let human = result.to_human();
        assert!(human.contains("Metrics for project 1756137600000"));
        assert!(human.contains("resolution rate: 0.0%"));

        let all = ReportMetricsResult {
            project_id: None,
            metrics: analytics::calculate_metrics(&[]),
        };
        assert!(all.to_human().contains("Metrics for all projects"));
    }
}
