//! Session commands: login, logout, whoami, and role switching.
//!
//! Riskbook authenticates against the built-in demo account table; a
//! successful login persists the session to the store and everything
//! else reads it back. Switching roles rewrites the persisted session,
//! which is a demo affordance only - nothing here is a real security
//! boundary, since the store lives on the same machine as the user.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::commands::{Output, require_session};
use crate::models::auth::{self, Role, Session};
use crate::storage::Store;
use crate::{Error, Result};

/// Result of `rb auth login`.
#[derive(Debug, Serialize)]
pub struct LoginResult {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl Output for LoginResult {
    fn to_human(&self) -> String {
        format!(
            "Logged in as {} ({})\n  edit: {}  delete: {}",
            self.username,
            self.role,
            if self.can_edit { "yes" } else { "no" },
            if self.can_delete { "yes" } else { "no" }
        )
    }
}

/// Log in with a demo account and persist the session.
///
/// A failed login leaves any existing session untouched.
pub fn auth_login(workspace: &Path, username: &str, password: &str) -> Result<LoginResult> {
    let store = Store::open(workspace)?;

    let account = auth::authenticate(username, password)
        .ok_or_else(|| Error::InvalidInput("invalid username or password".to_string()))?;

    let session = Session::new(account);
    store.save_session(&session)?;

    Ok(LoginResult {
        user_id: session.user_id,
        username: session.username,
        email: session.email,
        role: session.role,
        can_edit: session.role.can_edit(),
        can_delete: session.role.can_delete(),
    })
}

/// Result of `rb auth logout`.
#[derive(Debug, Serialize)]
pub struct LogoutResult {
    /// Username that was logged out, when there was a session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Output for LogoutResult {
    fn to_human(&self) -> String {
        match &self.username {
            Some(name) => format!("Logged out {}", name),
            None => "No active session".to_string(),
        }
    }
}

/// End the current session. Logging out twice is fine.
pub fn auth_logout(workspace: &Path) -> Result<LogoutResult> {
    let store = Store::open(workspace)?;
    let username = store.load_session()?.map(|s| s.username);
    store.clear_session()?;
    Ok(LogoutResult { username })
}

/// Result of `rb auth whoami`.
#[derive(Debug, Serialize)]
pub struct WhoamiResult {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub can_edit: bool,
    pub can_delete: bool,
    pub logged_in_at: DateTime<Utc>,
}

impl Output for WhoamiResult {
    fn to_human(&self) -> String {
        format!(
            "{} ({}), logged in since {}\n  edit: {}  delete: {}",
            self.username,
            self.role,
            self.logged_in_at.format("%Y-%m-%d %H:%M UTC"),
            if self.can_edit { "yes" } else { "no" },
            if self.can_delete { "yes" } else { "no" }
        )
    }
}

/// Show the logged-in user and the permissions their role grants.
pub fn auth_whoami(workspace: &Path) -> Result<WhoamiResult> {
    let store = Store::open(workspace)?;
    let session = require_session(&store)?;

    Ok(WhoamiResult {
        user_id: session.user_id,
        username: session.username,
        email: session.email,
        role: session.role,
        can_edit: session.role.can_edit(),
        can_delete: session.role.can_delete(),
        logged_in_at: session.logged_in_at,
    })
}

/// Result of `rb auth switch-role`.
#[derive(Debug, Serialize)]
pub struct SwitchRoleResult {
    pub username: String,
    pub old_role: Role,
    pub role: Role,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl Output for SwitchRoleResult {
    fn to_human(&self) -> String {
        format!(
            "Switched {} from {} to {}\n  edit: {}  delete: {}",
            self.username,
            self.old_role,
            self.role,
            if self.can_edit { "yes" } else { "no" },
            if self.can_delete { "yes" } else { "no" }
        )
    }
}

/// Switch the active session to another role.
///
/// Any authenticated session may switch; the role takes effect for
/// every later command until logout or another switch.
pub fn auth_switch_role(workspace: &Path, role: &str) -> Result<SwitchRoleResult> {
    let store = Store::open(workspace)?;
    let mut session = require_session(&store)?;

    let new_role: Role = role.parse()?;
    let old_role = session.role;
    session.role = new_role;
    store.save_session(&session)?;

    Ok(SwitchRoleResult {
        username: session.username,
        old_role,
        role: new_role,
        can_edit: new_role.can_edit(),
        can_delete: new_role.can_delete(),
    })
}
