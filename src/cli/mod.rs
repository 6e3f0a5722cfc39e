//! CLI argument definitions for Riskbook.

use clap::{Parser, Subcommand};

/// Riskbook - a risk register for construction projects.
///
/// Start with `rb system init` to set up the workspace store, then
/// `rb auth login` to open a session.
#[derive(Parser, Debug)]
#[command(name = "rb")]
#[command(author, version, about = "A CLI risk register for construction projects", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Run as if rb was started in <path> instead of the current directory.
    /// The path must exist and is used literally.
    /// Can also be set via RB_WORKSPACE environment variable.
    #[arg(short = 'C', long = "workspace", global = true, env = "RB_WORKSPACE")]
    pub workspace_path: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// System administration commands
    System {
        #[command(subcommand)]
        command: SystemCommands,
    },

    /// Session and account commands
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },

    /// Project management commands
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Risk management commands
    Risk {
        #[command(subcommand)]
        command: RiskCommands,
    },

    /// Audit trail commands
    Audit {
        #[command(subcommand)]
        command: AuditCommands,
    },

    /// Notification commands
    Notify {
        #[command(subcommand)]
        command: NotifyCommands,
    },

    /// Alert rule commands
    Rule {
        #[command(subcommand)]
        command: RuleCommands,
    },

    /// Dashboard metrics, trends, and CSV export
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// System administration subcommands
#[derive(Subcommand, Debug)]
pub enum SystemCommands {
    /// Initialize the riskbook store for this workspace
    Init,

    /// Show version and build information
    BuildInfo,

    /// Data store management
    Store {
        #[command(subcommand)]
        command: StoreCommands,
    },
}

/// Store management subcommands
#[derive(Subcommand, Debug)]
pub enum StoreCommands {
    /// Display summary of current store contents
    Show,
}

/// Session subcommands
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Log in with a demo account and start a session
    Login {
        /// Account username (matched case-insensitively)
        username: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },

    /// End the current session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Switch the active session to another role
    SwitchRole {
        /// New role
        #[arg(value_parser = ["admin", "manager", "viewer"])]
        role: String,
    },
}

/// Project subcommands
#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create a new project (requires edit permission)
    ///
    /// The new project becomes the selected project.
    Create {
        /// Project name
        name: String,

        /// Project description
        #[arg(short, long)]
        description: Option<String>,

        /// Site location
        #[arg(short, long)]
        location: Option<String>,

        /// Project status
        #[arg(long, value_parser = ["planning", "active", "paused", "completed"])]
        status: Option<String>,

        /// Start date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        start_date: Option<String>,

        /// Planned end date (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,

        /// Project manager name
        #[arg(short, long)]
        manager: Option<String>,

        /// Budget amount
        #[arg(short, long)]
        budget: Option<f64>,
    },

    /// List projects
    List,

    /// Show project details
    Show {
        /// Project ID
        id: String,
    },

    /// Update a project (requires edit permission)
    Update {
        /// Project ID
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// New site location
        #[arg(long)]
        location: Option<String>,

        /// New status
        #[arg(long, value_parser = ["planning", "active", "paused", "completed"])]
        status: Option<String>,

        /// New start date (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,

        /// New planned end date (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,

        /// New project manager name
        #[arg(long)]
        manager: Option<String>,

        /// New budget amount
        #[arg(long)]
        budget: Option<f64>,
    },

    /// Delete a project and all of its risks (requires delete permission)
    Delete {
        /// Project ID
        id: String,

        /// Skip the confirmation requirement
        #[arg(long)]
        force: bool,
    },

    /// Select the project that later commands default to
    Select {
        /// Project ID
        id: String,
    },
}

/// Risk subcommands
#[derive(Subcommand, Debug)]
pub enum RiskCommands {
    /// Create a new risk (requires edit permission)
    Create {
        /// Risk name
        name: String,

        /// Project ID (defaults to the selected project)
        #[arg(short, long)]
        project: Option<String>,

        /// Sequence number within the project (defaults to the next free)
        #[arg(long)]
        seq: Option<u32>,

        /// What could go wrong
        #[arg(long)]
        what: Option<String>,

        /// When it could occur
        #[arg(long)]
        when: Option<String>,

        /// How it could occur
        #[arg(long)]
        how: Option<String>,

        /// Mitigation or response plan
        #[arg(long)]
        solution: Option<String>,

        /// Severity
        #[arg(long, value_parser = ["low", "medium", "high", "critical"])]
        severity: Option<String>,

        /// Probability of occurrence (0-1)
        #[arg(long)]
        probability: Option<f64>,

        /// Impact if it occurs (1-10)
        #[arg(long)]
        impact: Option<f64>,

        /// Risk score; computed from probability and impact when omitted
        #[arg(long)]
        score: Option<f64>,

        /// Tracking status
        #[arg(long, value_parser = ["active", "monitored", "resolved"])]
        status: Option<String>,
    },

    /// List risks for a project
    List {
        /// Project ID (defaults to the selected project)
        #[arg(short, long)]
        project: Option<String>,

        /// List risks across all projects
        #[arg(long)]
        all: bool,

        /// Filter by severity
        #[arg(long, value_parser = ["low", "medium", "high", "critical"])]
        severity: Option<String>,

        /// Filter by status
        #[arg(long, value_parser = ["active", "monitored", "resolved"])]
        status: Option<String>,
    },

    /// Show risk details
    Show {
        /// Risk ID
        id: String,
    },

    /// Update a risk (requires edit permission)
    Update {
        /// Risk ID
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New sequence number within the project
        #[arg(long)]
        seq: Option<u32>,

        /// New description of what could go wrong
        #[arg(long)]
        what: Option<String>,

        /// New description of when it could occur
        #[arg(long)]
        when: Option<String>,

        /// New description of how it could occur
        #[arg(long)]
        how: Option<String>,

        /// New mitigation or response plan
        #[arg(long)]
        solution: Option<String>,

        /// New severity
        #[arg(long, value_parser = ["low", "medium", "high", "critical"])]
        severity: Option<String>,

        /// New probability of occurrence (0-1)
        #[arg(long)]
        probability: Option<f64>,

        /// New impact if it occurs (1-10)
        #[arg(long)]
        impact: Option<f64>,

        /// New risk score
        #[arg(long)]
        score: Option<f64>,

        /// New tracking status
        #[arg(long, value_parser = ["active", "monitored", "resolved"])]
        status: Option<String>,

        /// Recompute the score from probability and impact
        #[arg(long)]
        recompute_score: bool,
    },

    /// Delete a risk (requires edit permission)
    Delete {
        /// Risk ID
        id: String,

        /// Skip the confirmation requirement
        #[arg(long)]
        force: bool,
    },
}

/// Audit trail subcommands
#[derive(Subcommand, Debug)]
pub enum AuditCommands {
    /// List audit entries, newest first
    List {
        /// Filter by project ID
        #[arg(short, long)]
        project: Option<String>,

        /// Filter by risk ID
        #[arg(long)]
        risk: Option<u64>,

        /// Filter by user ID
        #[arg(long)]
        user: Option<String>,

        /// Filter by action
        #[arg(long, value_parser = ["create", "update", "delete"])]
        action: Option<String>,

        /// Maximum number of entries to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Remove audit entries older than the retention window
    Purge {
        /// Retention window in days (overrides the audit_retention_days config key)
        #[arg(long)]
        days: Option<i64>,

        /// Preview what would be removed without changing anything
        #[arg(long)]
        dry_run: bool,
    },
}

/// Notification subcommands
#[derive(Subcommand, Debug)]
pub enum NotifyCommands {
    /// List the session user's notifications, newest first
    List {
        /// Only show unread notifications
        #[arg(long)]
        unread: bool,
    },

    /// Show the unread notification count
    Count,

    /// Mark a notification as read
    Read {
        /// Notification ID (e.g., ntf-a1b2c3d4e5f6)
        id: String,
    },

    /// Mark all notifications as read
    ReadAll,

    /// Delete a notification
    Delete {
        /// Notification ID
        id: String,
    },

    /// Poll for new notifications until interrupted
    Watch {
        /// Poll interval in seconds
        #[arg(short, long, default_value = "3")]
        interval: u64,
    },
}

/// Alert rule subcommands
#[derive(Subcommand, Debug)]
pub enum RuleCommands {
    /// Create an alert rule (requires edit permission)
    Create {
        /// Rule name
        name: String,

        /// Project ID the rule watches (defaults to the selected project)
        #[arg(short, long)]
        project: Option<String>,

        /// Trigger condition
        #[arg(long, value_parser = ["high_risk_count", "critical_risk", "risk_not_resolved", "severity_threshold"])]
        condition: String,

        /// Numeric threshold for conditions that use one
        #[arg(long)]
        threshold: Option<f64>,

        /// Delivery channel (repeatable)
        #[arg(long, value_parser = ["email", "sms", "telegram"])]
        channel: Vec<String>,

        /// Create the rule disabled
        #[arg(long)]
        disabled: bool,
    },

    /// List alert rules
    List {
        /// Filter by project ID
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Enable a rule
    Enable {
        /// Rule ID (e.g., rule-a1b2c3d4e5f6)
        id: String,
    },

    /// Disable a rule
    Disable {
        /// Rule ID
        id: String,
    },

    /// Delete a rule (requires delete permission)
    Delete {
        /// Rule ID
        id: String,

        /// Skip the confirmation requirement
        #[arg(long)]
        force: bool,
    },

    /// Evaluate enabled rules against current risks and send alerts
    Eval {
        /// Project ID (defaults to the selected project)
        #[arg(short, long)]
        project: Option<String>,
    },
}

/// Reporting subcommands
#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Dashboard metrics for a project
    Metrics {
        /// Project ID (defaults to the selected project)
        #[arg(short, long)]
        project: Option<String>,

        /// Compute metrics across all projects
        #[arg(long)]
        all: bool,
    },

    /// Daily risk trend series
    Trends {
        /// Number of days the series covers
        #[arg(long, default_value = "30")]
        days: u32,

        /// Project ID (defaults to the selected project)
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Most recently created risks
    Recent {
        /// Maximum number of risks to show
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Project ID (defaults to the selected project)
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Export a project's risks as CSV
    Export {
        /// Project ID (defaults to the selected project)
        #[arg(short, long)]
        project: Option<String>,

        /// Output file path (defaults to risk_report_<project>_<date>.csv)
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },

    /// List all configuration values
    List,
}
