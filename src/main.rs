//! Riskbook CLI - a risk register for construction project teams.

use clap::Parser;
use riskbook::cli::{
    AuditCommands, AuthCommands, Cli, Commands, ConfigCommands, NotifyCommands, ProjectCommands,
    ReportCommands, RiskCommands, RuleCommands, StoreCommands, SystemCommands,
};
use riskbook::commands::{self, Output};
use std::env;
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    let cli = Cli::parse();
    let human = cli.human_readable;

    // Determine workspace path: --workspace flag > RB_WORKSPACE env > cwd
    let workspace = resolve_workspace_path(cli.workspace_path, human);

    let result = run_command(cli.command, &workspace, human);

    if let Err(e) = result {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

/// Resolve the workspace the store belongs to.
///
/// An explicit path (via -C/--workspace or RB_WORKSPACE) is used
/// literally and must exist; otherwise the current directory is the
/// workspace.
fn resolve_workspace_path(explicit_path: Option<PathBuf>, human: bool) -> PathBuf {
    match explicit_path {
        Some(path) => {
            if !path.exists() {
                if human {
                    eprintln!(
                        "Error: Specified workspace path does not exist: {}",
                        path.display()
                    );
                } else {
                    eprintln!(
                        "{}",
                        serde_json::json!({
                            "error": format!(
                                "Specified workspace path does not exist: {}",
                                path.display()
                            )
                        })
                    );
                }
                process::exit(1);
            }
            path
        }
        None => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn run_command(
    command: Option<Commands>,
    workspace: &Path,
    human: bool,
) -> Result<(), riskbook::Error> {
    match command {
        Some(Commands::System { command }) => match command {
            SystemCommands::Init => {
                let result = commands::system_init(workspace)?;
                output(&result, human);
            }
            SystemCommands::BuildInfo => {
                let result = commands::build_info()?;
                output(&result, human);
            }
            SystemCommands::Store { command } => match command {
                StoreCommands::Show => {
                    let result = commands::store_show(workspace)?;
                    output(&result, human);
                }
            },
        },

        Some(Commands::Auth { command }) => match command {
            AuthCommands::Login { username, password } => {
                let result = commands::auth_login(workspace, &username, &password)?;
                output(&result, human);
            }
            AuthCommands::Logout => {
                let result = commands::auth_logout(workspace)?;
                output(&result, human);
            }
            AuthCommands::Whoami => {
                let result = commands::auth_whoami(workspace)?;
                output(&result, human);
            }
            AuthCommands::SwitchRole { role } => {
                let result = commands::auth_switch_role(workspace, &role)?;
                output(&result, human);
            }
        },

        Some(Commands::Project { command }) => match command {
            ProjectCommands::Create {
                name,
                description,
                location,
                status,
                start_date,
                end_date,
                manager,
                budget,
            } => {
                let result = commands::project_create(
                    workspace,
                    &name,
                    description,
                    location,
                    status,
                    start_date,
                    end_date,
                    manager,
                    budget,
                )?;
                output(&result, human);
            }
            ProjectCommands::List => {
                let result = commands::project_list(workspace)?;
                output(&result, human);
            }
            ProjectCommands::Show { id } => {
                let result = commands::project_show(workspace, &id)?;
                output(&result, human);
            }
            ProjectCommands::Update {
                id,
                name,
                description,
                location,
                status,
                start_date,
                end_date,
                manager,
                budget,
            } => {
                let result = commands::project_update(
                    workspace,
                    &id,
                    name,
                    description,
                    location,
                    status,
                    start_date,
                    end_date,
                    manager,
                    budget,
                )?;
                output(&result, human);
            }
            ProjectCommands::Delete { id, force } => {
                let result = commands::project_delete(workspace, &id, force)?;
                output(&result, human);
            }
            ProjectCommands::Select { id } => {
                let result = commands::project_select(workspace, &id)?;
                output(&result, human);
            }
        },

        Some(Commands::Risk { command }) => match command {
            RiskCommands::Create {
                name,
                project,
                seq,
                what,
                when,
                how,
                solution,
                severity,
                probability,
                impact,
                score,
                status,
            } => {
                let result = commands::risk_create(
                    workspace,
                    &name,
                    project,
                    seq,
                    what,
                    when,
                    how,
                    solution,
                    severity,
                    probability,
                    impact,
                    score,
                    status,
                )?;
                output(&result, human);
            }
            RiskCommands::List {
                project,
                all,
                severity,
                status,
            } => {
                let result = commands::risk_list(workspace, project, all, severity, status)?;
                output(&result, human);
            }
            RiskCommands::Show { id } => {
                let result = commands::risk_show(workspace, &id)?;
                output(&result, human);
            }
            RiskCommands::Update {
                id,
                name,
                seq,
                what,
                when,
                how,
                solution,
                severity,
                probability,
                impact,
                score,
                status,
                recompute_score,
            } => {
                let result = commands::risk_update(
                    workspace,
                    &id,
                    name,
                    seq,
                    what,
                    when,
                    how,
                    solution,
                    severity,
                    probability,
                    impact,
                    score,
                    status,
                    recompute_score,
                )?;
                output(&result, human);
            }
            RiskCommands::Delete { id, force } => {
                let result = commands::risk_delete(workspace, &id, force)?;
                output(&result, human);
            }
        },

        Some(Commands::Audit { command }) => match command {
            AuditCommands::List {
                project,
                risk,
                user,
                action,
                limit,
            } => {
                let result = commands::audit_list(workspace, project, risk, user, action, limit)?;
                output(&result, human);
            }
            AuditCommands::Purge { days, dry_run } => {
                let result = commands::audit_purge(workspace, days, dry_run)?;
                output(&result, human);
            }
        },

        Some(Commands::Notify { command }) => match command {
            NotifyCommands::List { unread } => {
                let result = commands::notify_list(workspace, unread)?;
                output(&result, human);
            }
            NotifyCommands::Count => {
                let result = commands::notify_count(workspace)?;
                output(&result, human);
            }
            NotifyCommands::Read { id } => {
                let result = commands::notify_read(workspace, &id)?;
                output(&result, human);
            }
            NotifyCommands::ReadAll => {
                let result = commands::notify_read_all(workspace)?;
                output(&result, human);
            }
            NotifyCommands::Delete { id } => {
                let result = commands::notify_delete(workspace, &id)?;
                output(&result, human);
            }
            NotifyCommands::Watch { interval } => {
                // Prints arrivals itself until interrupted.
                commands::notify_watch(workspace, interval, human)?;
            }
        },

        Some(Commands::Rule { command }) => match command {
            RuleCommands::Create {
                name,
                project,
                condition,
                threshold,
                channel,
                disabled,
            } => {
                let result = commands::rule_create(
                    workspace, &name, project, &condition, threshold, &channel, disabled,
                )?;
                output(&result, human);
            }
            RuleCommands::List { project } => {
                let result = commands::rule_list(workspace, project)?;
                output(&result, human);
            }
            RuleCommands::Enable { id } => {
                let result = commands::rule_enable(workspace, &id)?;
                output(&result, human);
            }
            RuleCommands::Disable { id } => {
                let result = commands::rule_disable(workspace, &id)?;
                output(&result, human);
            }
            RuleCommands::Delete { id, force } => {
                let result = commands::rule_delete(workspace, &id, force)?;
                output(&result, human);
            }
            RuleCommands::Eval { project } => {
                let result = commands::rule_eval(workspace, project)?;
                output(&result, human);
            }
        },

        Some(Commands::Report { command }) => match command {
            ReportCommands::Metrics { project, all } => {
                let result = commands::report_metrics(workspace, project, all)?;
                output(&result, human);
            }
            ReportCommands::Trends { days, project } => {
                let result = commands::report_trends(workspace, days, project)?;
                output(&result, human);
            }
            ReportCommands::Recent { limit, project } => {
                let result = commands::report_recent(workspace, limit, project)?;
                output(&result, human);
            }
            ReportCommands::Export {
                project,
                output: out_path,
            } => {
                let result = commands::report_export(workspace, project, out_path)?;
                output(&result, human);
            }
        },

        Some(Commands::Config { command }) => match command {
            ConfigCommands::Get { key } => {
                let result = commands::config_get(workspace, &key)?;
                output(&result, human);
            }
            ConfigCommands::Set { key, value } => {
                let result = commands::config_set(workspace, &key, &value)?;
                output(&result, human);
            }
            ConfigCommands::List => {
                let result = commands::config_list(workspace)?;
                output(&result, human);
            }
        },

        None => {
            // Default: show status summary
            match commands::status(workspace) {
                Ok(summary) => output(&summary, human),
                Err(riskbook::Error::NotInitialized) => {
                    if human {
                        println!("Riskbook - Not initialized.");
                        println!(
                            "Run `rb system init` to initialize, then `rb auth login admin --password admin123` to open a session."
                        );
                    } else {
                        println!(
                            "{}",
                            serde_json::json!({ "initialized": false, "projects": 0, "risks": 0 })
                        );
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    Ok(())
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
