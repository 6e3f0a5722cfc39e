//! Store initialization and inspection commands.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::commands::{Output, require_session};
use crate::models::auth::Role;
use crate::storage::Store;
use crate::Result;

/// Result of `rb system init`.
#[derive(Debug, Serialize)]
pub struct SystemInitResult {
    /// False when the workspace already had a store
    pub initialized: bool,

    /// Workspace the store belongs to
    pub workspace: PathBuf,

    /// Directory holding the store files
    pub store_dir: PathBuf,
}

impl Output for SystemInitResult {
    fn to_human(&self) -> String {
        if self.initialized {
            format!(
                "Initialized riskbook store for {} at {}",
                self.workspace.display(),
                self.store_dir.display()
            )
        } else {
            format!(
                "Riskbook already initialized for {} at {}",
                self.workspace.display(),
                self.store_dir.display()
            )
        }
    }
}

/// Initialize the store for a workspace.
///
/// Running against an already-initialized workspace succeeds without
/// touching the existing data and reports `initialized: false`.
pub fn system_init(workspace: &Path) -> Result<SystemInitResult> {
    if Store::exists(workspace)? {
        let store = Store::open(workspace)?;
        return Ok(SystemInitResult {
            initialized: false,
            workspace: workspace.to_path_buf(),
            store_dir: store.root,
        });
    }

    let store = Store::init(workspace)?;
    Ok(SystemInitResult {
        initialized: true,
        workspace: workspace.to_path_buf(),
        store_dir: store.root,
    })
}

/// Result of `rb system build-info`.
#[derive(Debug, Serialize)]
pub struct BuildInfoResult {
    pub version: String,
    pub commit: String,
    pub built_at: String,
}

impl Output for BuildInfoResult {
    fn to_human(&self) -> String {
        format!(
            "rb {} (commit {}, built {})",
            self.version, self.commit, self.built_at
        )
    }
}

/// Report the compiled-in version and build metadata.
pub fn build_info() -> Result<BuildInfoResult> {
    Ok(BuildInfoResult {
        version: env!("CARGO_PKG_VERSION").to_string(),
        commit: env!("RB_GIT_COMMIT").to_string(),
        built_at: env!("RB_BUILD_TIMESTAMP").to_string(),
    })
}

/// Result of `rb system store show`.
#[derive(Debug, Serialize)]
pub struct StoreShowResult {
    pub store_dir: PathBuf,
    pub projects: usize,
    pub risks: usize,
    pub notifications: usize,
    pub rules: usize,
    pub audit_entries: usize,
    pub config_keys: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_project: Option<String>,
}

impl Output for StoreShowResult {
    fn to_human(&self) -> String {
        let mut out = format!("Store: {}\n", self.store_dir.display());
        out.push_str(&format!("  projects:      {}\n", self.projects));
        out.push_str(&format!("  risks:         {}\n", self.risks));
        out.push_str(&format!("  notifications: {}\n", self.notifications));
        out.push_str(&format!("  alert rules:   {}\n", self.rules));
        out.push_str(&format!("  audit entries: {}\n", self.audit_entries));
        out.push_str(&format!("  config keys:   {}\n", self.config_keys));
        out.push_str(&format!(
            "  session:       {}\n",
            self.session_user.as_deref().unwrap_or("(none)")
        ));
        out.push_str(&format!(
            "  selected:      {}",
            self.selected_project.as_deref().unwrap_or("(none)")
        ));
        out
    }
}

/// Summarize the store contents for a workspace.
pub fn store_show(workspace: &Path) -> Result<StoreShowResult> {
    let store = Store::open(workspace)?;
    require_session(&store)?;

    Ok(StoreShowResult {
        store_dir: store.root.clone(),
        projects: store.list_projects()?.len(),
        risks: store.list_risks()?.len(),
        notifications: store.list_notifications()?.len(),
        rules: store.list_rules()?.len(),
        audit_entries: store.list_audit()?.len(),
        config_keys: store.list_config()?.len(),
        session_user: store.load_session()?.map(|s| s.username),
        selected_project: store.selected_project()?,
    })
}

/// Result of running `rb` with no command.
#[derive(Debug, Serialize)]
pub struct StatusResult {
    pub initialized: bool,
    pub projects: usize,
    pub risks: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_user: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    /// Unread count for the session user; absent when nobody is logged in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread_notifications: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_project: Option<String>,
}

impl Output for StatusResult {
    fn to_human(&self) -> String {
        let mut out = format!(
            "Riskbook - {} project(s), {} risk(s)\n",
            self.projects, self.risks
        );
        match (&self.session_user, &self.role) {
            (Some(user), Some(role)) => {
                out.push_str(&format!("  logged in: {} ({})\n", user, role));
            }
            _ => {
                out.push_str(
                    "  logged in: nobody (run `rb auth login <username> --password <pw>`)\n",
                );
            }
        }
        if let Some(unread) = self.unread_notifications {
            out.push_str(&format!("  unread:    {} notification(s)\n", unread));
        }
        match &self.selected_project {
            Some(id) => out.push_str(&format!("  selected:  {}", id)),
            None => out.push_str("  selected:  (no project)"),
        }
        out
    }
}

/// Status summary shown when `rb` runs with no command.
///
/// Works without a session so a fresh workspace gets a useful hint
/// instead of an authentication error.
pub fn status(workspace: &Path) -> Result<StatusResult> {
    let store = Store::open(workspace)?;
    let session = store.load_session()?;

    let unread = match &session {
        Some(s) => Some(store.unread_count(&s.user_id)?),
        None => None,
    };

    Ok(StatusResult {
        initialized: true,
        projects: store.list_projects()?.len(),
        risks: store.list_risks()?.len(),
        session_user: session.as_ref().map(|s| s.username.clone()),
        role: session.as_ref().map(|s| s.role),
        unread_notifications: unread,
        selected_project: store.selected_project()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_result_human_without_session() {
        let result = StatusResult {
            initialized: true,
            projects: 0,
            risks: 0,
            session_user: None,
            role: None,
            unread_notifications: None,
            selected_project: None,
        };
        let human = result.to_human();
        assert!(human.contains("0 project(s)"));
        assert!(human.contains("rb auth login"));
        assert!(human.contains("(no project)"));
    }

    #[test]
    fn test_status_result_human_with_session() {
        let result = StatusResult {
            initialized: true,
            projects: 2,
            risks: 9,
            session_user: Some("admin".to_string()),
            role: Some(Role::Admin),
            unread_notifications: Some(3),
            selected_project: Some("1756137600000".to_string()),
        };
        let human = result.to_human();
        assert!(human.contains("logged in: admin (admin)"));
        assert!(human.contains("unread:    3 notification(s)"));
        assert!(human.contains("selected:  1756137600000"));
    }

    #[test]
    fn test_build_info_reports_version() {
        let info = build_info().unwrap();
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
        assert!(!info.built_at.is_empty());
    }
}
