//! Accounts, roles, and session state.
//!
//! Riskbook ships a fixed table of demo accounts; there is no user
//! management. A session records who is logged in and with which role,
//! and the role decides what the gated commands allow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Access level of an account or session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access, including deletes
    Admin,
    /// Can create and edit, but not delete
    Manager,
    /// Read-only access
    Viewer,
}

impl Role {
    /// Returns true if this role may create and edit records.
    pub fn can_edit(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }

    /// Returns true if this role may delete records.
    pub fn can_delete(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Viewer => "viewer",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Role {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "viewer" => Ok(Role::Viewer),
            _ => Err(crate::Error::InvalidInput(format!(
                "Unknown role: {} (expected admin, manager, or viewer)",
                s
            ))),
        }
    }
}

/// A built-in demo account.
#[derive(Debug, Clone, Copy)]
pub struct Account {
    /// Stable account ID
    pub id: &'static str,
    /// Login name, stored lowercase
    pub username: &'static str,
    /// Login password
    pub password: &'static str,
    /// Contact address used by the email alert channel
    pub email: &'static str,
    /// Display glyph
    pub avatar: &'static str,
    /// Role granted at login
    pub role: Role,
}

/// The fixed account table.
const ACCOUNTS: &[Account] = &[
    Account {
        id: "1",
        username: "admin",
        password: "admin123",
        email: "admin@construction.com",
        avatar: "👨‍💼",
        role: Role::Admin,
    },
    Account {
        id: "2",
        username: "manager",
        password: "manager123",
        email: "manager@construction.com",
        avatar: "👨‍💼",
        role: Role::Manager,
    },
    Account {
        id: "3",
        username: "viewer",
        password: "viewer123",
        email: "viewer@construction.com",
        avatar: "👁️",
        role: Role::Viewer,
    },
];

/// Get all built-in accounts.
pub fn accounts() -> &'static [Account] {
    ACCOUNTS
}

/// Look up an account by credentials.
///
/// Usernames match case-insensitively; passwords must match exactly.
/// Returns `None` when either check fails.
pub fn authenticate(username: &str, password: &str) -> Option<&'static Account> {
    let username = username.to_lowercase();
    ACCOUNTS
        .iter()
        .find(|a| a.username == username && a.password == password)
}

/// The logged-in user for a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Account ID
    pub user_id: String,

    /// Account username
    pub username: String,

    /// Contact address for the email alert channel
    #[serde(default)]
    pub email: String,

    /// Display glyph
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,

    /// Role in effect for this session.
    /// Starts as the account's role and may be switched later.
    pub role: Role,

    /// When the session started
    pub logged_in_at: DateTime<Utc>,
}

impl Session {
    /// Start a session for the given account.
    pub fn new(account: &Account) -> Self {
        Self {
            user_id: account.id.to_string(),
            username: account.username.to_string(),
            email: account.email.to_string(),
            avatar: Some(account.avatar.to_string()),
            role: account.role,
            logged_in_at: Utc::now(),
        }
    }

    /// Returns true if this session may create and edit records.
    pub fn can_edit(&self) -> bool {
        self.role.can_edit()
    }

    /// Returns true if this session may delete records.
    pub fn can_delete(&self) -> bool {
        self.role.can_delete()
    }
}
