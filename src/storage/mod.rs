//! Storage layer for Riskbook data.
//!
//! This module handles persistence for one workspace's risk register.
//!
//! ## Layout
//!
//! Each workspace maps to a directory under the platform data dir
//! (`~/.local/share/riskbook/<workspace-hash>/` on Linux), overridable
//! with the `RB_DATA_DIR` environment variable:
//!
//! - Whole-list JSON files rewritten on every mutation (projects.json,
//!   risks.json, notifications.json, alert-rules.json)
//! - `audit.jsonl` for the append-only audit trail
//! - Single-record JSON files (session.json, selection.json, config.json)
//!
//! Every collection is read in full and written back in full; there is no
//! cache or index. A malformed file is reported to stderr and treated as
//! empty so one bad write never bricks the store.

use crate::models::audit::AuditEntry;
use crate::models::auth::Session;
use crate::models::notify::{AlertRule, Notification};
use crate::models::{Project, Risk};
use crate::{Error, Result};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the base data directory.
pub const DATA_DIR_ENV: &str = "RB_DATA_DIR";

const PROJECTS_FILE: &str = "projects.json";
const RISKS_FILE: &str = "risks.json";
const NOTIFICATIONS_FILE: &str = "notifications.json";
const RULES_FILE: &str = "alert-rules.json";
const AUDIT_FILE: &str = "audit.jsonl";
const SESSION_FILE: &str = "session.json";
const SELECTION_FILE: &str = "selection.json";
const CONFIG_FILE: &str = "config.json";

/// The selected-project marker persisted between commands.
#[derive(Serialize, Deserialize)]
struct Selection {
    project_id: String,
}

/// Storage manager for a single workspace.
#[derive(Debug)]
pub struct Store {
    /// Root directory for this workspace's data
    pub root: PathBuf,
}

impl Store {
    /// Open storage for the given workspace path.
    pub fn open(workspace: &Path) -> Result<Self> {
        Self::open_at(get_storage_dir(workspace)?)
    }

    /// Initialize storage for a new workspace.
    pub fn init(workspace: &Path) -> Result<Self> {
        Self::init_at(get_storage_dir(workspace)?)
    }

    /// Check if storage exists for the given workspace.
    pub fn exists(workspace: &Path) -> Result<bool> {
        let root = get_storage_dir(workspace)?;
        Ok(root.exists() && root.join(PROJECTS_FILE).exists())
    }

    /// Open storage under an explicit base data directory (DI for tests).
    pub fn open_with_data_dir(workspace: &Path, data_dir: &Path) -> Result<Self> {
        Self::open_at(storage_dir_under(workspace, data_dir)?)
    }

    /// Initialize storage under an explicit base data directory (DI for tests).
    pub fn init_with_data_dir(workspace: &Path, data_dir: &Path) -> Result<Self> {
        Self::init_at(storage_dir_under(workspace, data_dir)?)
    }

    /// Check for storage under an explicit base data directory (DI for tests).
    pub fn exists_with_data_dir(workspace: &Path, data_dir: &Path) -> Result<bool> {
        let root = storage_dir_under(workspace, data_dir)?;
        Ok(root.exists() && root.join(PROJECTS_FILE).exists())
    }

    fn open_at(root: PathBuf) -> Result<Self> {
        if !root.exists() || !root.join(PROJECTS_FILE).exists() {
            return Err(Error::NotInitialized);
        }
        Ok(Self { root })
    }

    fn init_at(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root)?;

        // Create empty collection files
        let files = [
            PROJECTS_FILE,
            RISKS_FILE,
            NOTIFICATIONS_FILE,
            RULES_FILE,
            AUDIT_FILE,
        ];
        for file in files {
            let path = root.join(file);
            if !path.exists() {
                File::create(&path)?;
            }
        }

        Ok(Self { root })
    }

    // === Generic helpers ===

    /// Read a whole-list JSON file, treating missing, empty, or malformed
    /// content as an empty list.
    fn read_list<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>> {
        let path = self.root.join(file);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let raw = fs::read_to_string(&path)?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str(&raw) {
            Ok(items) => Ok(items),
            Err(e) => {
                eprintln!("Warning: {} is malformed ({}); treating it as empty", file, e);
                Ok(Vec::new())
            }
        }
    }

    /// Write a whole list back to its JSON file.
    fn write_list<T: Serialize>(&self, file: &str, items: &[T]) -> Result<()> {
        let json = serde_json::to_string_pretty(items)?;
        fs::write(self.root.join(file), json)?;
        Ok(())
    }

    // === Project Operations ===

    /// List all projects in creation order.
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        self.read_list(PROJECTS_FILE)
    }

    /// Replace the whole project list.
    pub fn save_projects(&self, projects: &[Project]) -> Result<()> {
        self.write_list(PROJECTS_FILE, projects)
    }

    /// Get a project by ID.
    pub fn get_project(&self, id: &str) -> Result<Project> {
        self.list_projects()?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::NotFound(format!("project {}", id)))
    }

    /// Create a new project.
    pub fn create_project(&self, project: &Project) -> Result<()> {
        let mut projects = self.list_projects()?;
        projects.push(project.clone());
        self.save_projects(&projects)
    }

    /// Update a project in place.
    pub fn update_project(&self, project: &Project) -> Result<()> {
        let mut projects = self.list_projects()?;
        let slot = projects
            .iter_mut()
            .find(|p| p.id == project.id)
            .ok_or_else(|| Error::NotFound(format!("project {}", project.id)))?;
        *slot = project.clone();
        self.save_projects(&projects)
    }

    /// Delete a project by ID. Risks are cascaded by the caller.
    pub fn delete_project(&self, id: &str) -> Result<()> {
        let mut projects = self.list_projects()?;
        let before = projects.len();
        projects.retain(|p| p.id != id);
        if projects.len() == before {
            return Err(Error::NotFound(format!("project {}", id)));
        }
        self.save_projects(&projects)
    }

    /// Allocate the next project ID.
    ///
    /// IDs are the creation time in milliseconds; on collision the value
    /// is bumped until free.
    pub fn next_project_id(&self) -> Result<String> {
        let projects = self.list_projects()?;
        let mut id = Utc::now().timestamp_millis();
        while projects.iter().any(|p| p.id == id.to_string()) {
            id += 1;
        }
        Ok(id.to_string())
    }

    // === Risk Operations ===

    /// List all risks across all projects.
    pub fn list_risks(&self) -> Result<Vec<Risk>> {
        self.read_list(RISKS_FILE)
    }

    /// Replace the whole risk list.
    pub fn save_risks(&self, risks: &[Risk]) -> Result<()> {
        self.write_list(RISKS_FILE, risks)
    }

    /// Get a risk by ID.
    pub fn get_risk(&self, id: u64) -> Result<Risk> {
        self.list_risks()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::NotFound(format!("risk {}", id)))
    }

    /// Create a new risk.
    pub fn create_risk(&self, risk: &Risk) -> Result<()> {
        let mut risks = self.list_risks()?;
        risks.push(risk.clone());
        self.save_risks(&risks)
    }

    /// Update a risk in place.
    pub fn update_risk(&self, risk: &Risk) -> Result<()> {
        let mut risks = self.list_risks()?;
        let slot = risks
            .iter_mut()
            .find(|r| r.id == risk.id)
            .ok_or_else(|| Error::NotFound(format!("risk {}", risk.id)))?;
        *slot = risk.clone();
        self.save_risks(&risks)
    }

    /// Delete a risk by ID.
    pub fn delete_risk(&self, id: u64) -> Result<()> {
        let mut risks = self.list_risks()?;
        let before = risks.len();
        risks.retain(|r| r.id != id);
        if risks.len() == before {
            return Err(Error::NotFound(format!("risk {}", id)));
        }
        self.save_risks(&risks)
    }

    /// Allocate the next risk ID: one past the highest stored ID.
    pub fn next_risk_id(&self) -> Result<u64> {
        let max = self.list_risks()?.iter().map(|r| r.id).max().unwrap_or(0);
        Ok(max + 1)
    }

    /// Allocate the next display sequence number within a project.
    pub fn next_risk_seq(&self, project_id: &str) -> Result<u32> {
        let max = self
            .list_risks()?
            .iter()
            .filter(|r| r.project_id == project_id)
            .map(|r| r.seq)
            .max()
            .unwrap_or(0);
        Ok(max + 1)
    }

    // === Audit Trail Operations ===

    /// Append an entry to the audit trail.
    pub fn append_audit(&self, entry: &AuditEntry) -> Result<()> {
        let path = self.root.join(AUDIT_FILE);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;

        let json = serde_json::to_string(entry)?;
        writeln!(file, "{}", json)?;

        Ok(())
    }

    /// Read the whole audit trail in append order, skipping unparseable
    /// lines.
    pub fn list_audit(&self) -> Result<Vec<AuditEntry>> {
        let path = self.root.join(AUDIT_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&path)?;
        let reader = BufReader::new(file);

        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            if let Ok(entry) = serde_json::from_str::<AuditEntry>(&line) {
                entries.push(entry);
            }
        }

        Ok(entries)
    }

    /// Rewrite the audit trail. Used by purge only.
    pub fn save_audit(&self, entries: &[AuditEntry]) -> Result<()> {
        let path = self.root.join(AUDIT_FILE);
        let mut file = File::create(&path)?;
        for entry in entries {
            let json = serde_json::to_string(entry)?;
            writeln!(file, "{}", json)?;
        }
        Ok(())
    }

    // === Notification Operations ===

    /// List every notification for every user.
    pub fn list_notifications(&self) -> Result<Vec<Notification>> {
        self.read_list(NOTIFICATIONS_FILE)
    }

    /// Replace the whole notification list.
    pub fn save_notifications(&self, notifications: &[Notification]) -> Result<()> {
        self.write_list(NOTIFICATIONS_FILE, notifications)
    }

    /// Create a new notification.
    pub fn create_notification(&self, notification: &Notification) -> Result<()> {
        let mut notifications = self.list_notifications()?;
        notifications.push(notification.clone());
        self.save_notifications(&notifications)
    }

    /// List one user's notifications, newest first.
    pub fn user_notifications(&self, user_id: &str) -> Result<Vec<Notification>> {
        let mut notifications: Vec<Notification> = self
            .list_notifications()?
            .into_iter()
            .filter(|n| n.user_id == user_id)
            .collect();
        notifications.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(notifications)
    }

    /// Count one user's unread notifications.
    pub fn unread_count(&self, user_id: &str) -> Result<usize> {
        Ok(self
            .user_notifications(user_id)?
            .iter()
            .filter(|n| !n.read)
            .count())
    }

    /// Mark one notification as read.
    pub fn mark_notification_read(&self, id: &str) -> Result<()> {
        let mut notifications = self.list_notifications()?;
        let notification = notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| Error::NotFound(format!("notification {}", id)))?;
        notification.read = true;
        self.save_notifications(&notifications)
    }

    /// Mark all of one user's notifications as read. Returns how many
    /// were still unread.
    pub fn mark_all_notifications_read(&self, user_id: &str) -> Result<usize> {
        let mut notifications = self.list_notifications()?;
        let mut marked = 0;
        for n in notifications.iter_mut() {
            if n.user_id == user_id && !n.read {
                n.read = true;
                marked += 1;
            }
        }
        self.save_notifications(&notifications)?;
        Ok(marked)
    }

    /// Delete one notification by ID, whoever owns it.
    pub fn delete_notification(&self, id: &str) -> Result<()> {
        let mut notifications = self.list_notifications()?;
        let before = notifications.len();
        notifications.retain(|n| n.id != id);
        if notifications.len() == before {
            return Err(Error::NotFound(format!("notification {}", id)));
        }
        self.save_notifications(&notifications)
    }

    // === Alert Rule Operations ===

    /// List all alert rules.
    pub fn list_rules(&self) -> Result<Vec<AlertRule>> {
        self.read_list(RULES_FILE)
    }

    /// Replace the whole rule list.
    pub fn save_rules(&self, rules: &[AlertRule]) -> Result<()> {
        self.write_list(RULES_FILE, rules)
    }

    /// Get a rule by ID.
    pub fn get_rule(&self, id: &str) -> Result<AlertRule> {
        self.list_rules()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::NotFound(format!("alert rule {}", id)))
    }

    /// Create a new alert rule.
    pub fn create_rule(&self, rule: &AlertRule) -> Result<()> {
        let mut rules = self.list_rules()?;
        rules.push(rule.clone());
        self.save_rules(&rules)
    }

    /// Update a rule in place.
    pub fn update_rule(&self, rule: &AlertRule) -> Result<()> {
        let mut rules = self.list_rules()?;
        let slot = rules
            .iter_mut()
            .find(|r| r.id == rule.id)
            .ok_or_else(|| Error::NotFound(format!("alert rule {}", rule.id)))?;
        *slot = rule.clone();
        self.save_rules(&rules)
    }

    /// Delete a rule by ID.
    pub fn delete_rule(&self, id: &str) -> Result<()> {
        let mut rules = self.list_rules()?;
        let before = rules.len();
        rules.retain(|r| r.id != id);
        if rules.len() == before {
            return Err(Error::NotFound(format!("alert rule {}", id)));
        }
        self.save_rules(&rules)
    }

    /// List the enabled rules watching one project.
    pub fn project_rules(&self, project_id: &str) -> Result<Vec<AlertRule>> {
        Ok(self
            .list_rules()?
            .into_iter()
            .filter(|r| r.project_id == project_id && r.enabled)
            .collect())
    }

    // === Session Operations ===

    /// Load the current session, if someone is logged in.
    pub fn load_session(&self) -> Result<Option<Session>> {
        let path = self.root.join(SESSION_FILE);
        if !path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&path)?;
        match serde_json::from_str(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                eprintln!(
                    "Warning: {} is malformed ({}); treating it as logged out",
                    SESSION_FILE, e
                );
                Ok(None)
            }
        }
    }

    /// Persist the session.
    pub fn save_session(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string_pretty(session)?;
        fs::write(self.root.join(SESSION_FILE), json)?;
        Ok(())
    }

    /// Remove the session file. No-op when already logged out.
    pub fn clear_session(&self) -> Result<()> {
        let path = self.root.join(SESSION_FILE);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    // === Selection Operations ===

    /// Get the selected project ID, if one is set.
    pub fn selected_project(&self) -> Result<Option<String>> {
        let path = self.root.join(SELECTION_FILE);
        if !path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&path)?;
        match serde_json::from_str::<Selection>(&raw) {
            Ok(selection) => Ok(Some(selection.project_id)),
            Err(e) => {
                eprintln!(
                    "Warning: {} is malformed ({}); treating it as no selection",
                    SELECTION_FILE, e
                );
                Ok(None)
            }
        }
    }

    /// Set the selected project ID.
    pub fn set_selected_project(&self, project_id: &str) -> Result<()> {
        let selection = Selection {
            project_id: project_id.to_string(),
        };
        let json = serde_json::to_string_pretty(&selection)?;
        fs::write(self.root.join(SELECTION_FILE), json)?;
        Ok(())
    }

    /// Clear the selected project.
    pub fn clear_selected_project(&self) -> Result<()> {
        let path = self.root.join(SELECTION_FILE);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    // === Config Operations ===

    /// Read the whole config map.
    pub fn list_config(&self) -> Result<BTreeMap<String, String>> {
        let path = self.root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let raw = fs::read_to_string(&path)?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        match serde_json::from_str(&raw) {
            Ok(map) => Ok(map),
            Err(e) => {
                eprintln!(
                    "Warning: {} is malformed ({}); treating it as empty",
                    CONFIG_FILE, e
                );
                Ok(BTreeMap::new())
            }
        }
    }

    /// Get a config value by key.
    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        Ok(self.list_config()?.get(key).cloned())
    }

    /// Set a config value.
    pub fn set_config(&self, key: &str, value: &str) -> Result<()> {
        let mut config = self.list_config()?;
        config.insert(key.to_string(), value.to_string());
        let json = serde_json::to_string_pretty(&config)?;
        fs::write(self.root.join(CONFIG_FILE), json)?;
        Ok(())
    }
}

/// Get the storage directory for a workspace.
///
/// Uses a hash of the workspace path to create a unique directory under
/// the base data dir: `RB_DATA_DIR` when set, otherwise the platform
/// data dir plus `riskbook/`.
pub fn get_storage_dir(workspace: &Path) -> Result<PathBuf> {
    let base = match std::env::var(DATA_DIR_ENV) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::data_dir()
            .ok_or_else(|| Error::Other("Could not determine data directory".to_string()))?
            .join("riskbook"),
    };
    storage_dir_under(workspace, &base)
}

/// Get the storage directory for a workspace under an explicit base.
fn storage_dir_under(workspace: &Path, base: &Path) -> Result<PathBuf> {
    let canonical = workspace
        .canonicalize()
        .map_err(|e| Error::Other(format!("Could not canonicalize workspace path: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string_lossy().as_bytes());
    let hash = hasher.finalize();
    let hash_hex = format!("{:x}", hash);

    Ok(base.join(&hash_hex[..12]))
}

/// Generate a unique ID for an audit entry, notification, or alert rule.
///
/// Format: `<prefix>-<12 hex chars>`
/// - Audit prefix: "audit"
/// - Notification prefix: "ntf"
/// - Alert rule prefix: "rule"
pub fn generate_id(prefix: &str, seed: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(
        chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or(0)
            .to_le_bytes(),
    );
    let hash = hasher.finalize();
    let hash_hex = format!("{:x}", hash);
    format!("{}-{}", prefix, &hash_hex[..12])
}

/// Validate that an ID matches the expected format.
pub fn validate_id(id: &str, prefix: &str) -> Result<()> {
    if !id.starts_with(&format!("{}-", prefix)) {
        return Err(Error::InvalidId(format!(
            "ID must start with '{}-', got: {}",
            prefix, id
        )));
    }

    let suffix = &id[prefix.len() + 1..];
    if suffix.len() != 12 || !suffix.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidId(format!(
            "ID suffix must be 12 hex characters, got: {}",
            suffix
        )));
    }

    Ok(())
}

/// Parse a risk ID from its decimal string form.
pub fn parse_risk_id(id: &str) -> Result<u64> {
    id.parse()
        .map_err(|_| Error::InvalidId(format!("Risk ID must be a number, got: {}", id)))
}
