//! Project CRUD and selection commands.
//!
//! Projects are the unit everything else hangs off: risks belong to one,
//! alert rules watch one, and most commands default to the selected
//! project. Deleting a project cascades to its risks and repairs the
//! selection so later commands never point at a ghost.

use std::path::Path;

use serde::Serialize;

use crate::commands::{
    Output, audit_entry, parse_date, require_delete, require_edit, require_session,
};
use crate::models::audit::{AuditAction, AuditEntityKind};
use crate::models::{Project, ProjectStatus};
use crate::storage::Store;
use crate::{Error, Result};

/// Result of `rb project create`.
#[derive(Debug, Serialize)]
pub struct ProjectCreateResult {
    #[serde(flatten)]
    pub project: Project,

    /// The new project always becomes the selected project
    pub selected: bool,
}

impl Output for ProjectCreateResult {
    fn to_human(&self) -> String {
        format!(
            "Created project {}: \"{}\" ({})",
            self.project.id, self.project.name, self.project.status
        )
    }
}

/// Create a project and select it.
#[allow(clippy::too_many_arguments)]
pub fn project_create(
    workspace: &Path,
    name: &str,
    description: Option<String>,
    location: Option<String>,
    status: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    manager: Option<String>,
    budget: Option<f64>,
) -> Result<ProjectCreateResult> {
    let store = Store::open(workspace)?;
    let session = require_session(&store)?;
    require_edit(&session)?;

    if name.trim().is_empty() {
        return Err(Error::InvalidInput(
            "Project name must not be blank".to_string(),
        ));
    }

    let id = store.next_project_id()?;
    let mut project = Project::new(id, name.to_string());
    if let Some(description) = description {
        project.description = description;
    }
    if let Some(location) = location {
        project.location = location;
    }
    if let Some(status) = status {
        project.status = status.parse()?;
    }
    if let Some(start_date) = start_date {
        project.start_date = parse_date(&start_date)?;
    }
    if let Some(end_date) = end_date {
        project.end_date = Some(parse_date(&end_date)?);
    }
    if let Some(manager) = manager {
        project.manager = manager;
    }
    if let Some(budget) = budget {
        project.budget = budget;
    }

    store.create_project(&project)?;
    store.append_audit(&audit_entry(
        &session,
        AuditAction::Create,
        AuditEntityKind::Project,
        &project.id,
        &project.name,
        &project,
    ))?;
    store.set_selected_project(&project.id)?;

    Ok(ProjectCreateResult {
        project,
        selected: true,
    })
}

/// Result of `rb project list`.
#[derive(Debug, Serialize)]
pub struct ProjectListResult {
    pub count: usize,
    pub projects: Vec<Project>,

    /// Currently selected project, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
}

impl Output for ProjectListResult {
    fn to_human(&self) -> String {
        if self.projects.is_empty() {
            return "No projects yet. Create one with `rb project create <name>`.".to_string();
        }

        let mut out = format!("{} project(s):\n", self.count);
        for project in &self.projects {
            let marker = if self.selected.as_deref() == Some(project.id.as_str()) {
                "*"
            } else {
                " "
            };
            out.push_str(&format!(
                "{} {} [{}] \"{}\" - {}\n",
                marker, project.id, project.status, project.name, project.location
            ));
        }
        out.trim_end().to_string()
    }
}

/// List all projects in creation order.
pub fn project_list(workspace: &Path) -> Result<ProjectListResult> {
    let store = Store::open(workspace)?;
    require_session(&store)?;

    let projects = store.list_projects()?;
    Ok(ProjectListResult {
        count: projects.len(),
        projects,
        selected: store.selected_project()?,
    })
}

/// Result of `rb project show`.
#[derive(Debug, Serialize)]
pub struct ProjectShowResult {
    #[serde(flatten)]
    pub project: Project,

    /// How many risks reference this project
    pub risk_count: usize,
}

impl Output for ProjectShowResult {
    fn to_human(&self) -> String {
        let p = &self.project;
        let mut out = format!("Project {}: \"{}\"\n", p.id, p.name);
        out.push_str(&format!("  status:      {}\n", p.status));
        if !p.description.is_empty() {
            out.push_str(&format!("  description: {}\n", p.description));
        }
        if !p.location.is_empty() {
            out.push_str(&format!("  location:    {}\n", p.location));
        }
        out.push_str(&format!("  start date:  {}\n", p.start_date));
        if let Some(end) = p.end_date {
            out.push_str(&format!("  end date:    {}\n", end));
        }
        if !p.manager.is_empty() {
            out.push_str(&format!("  manager:     {}\n", p.manager));
        }
        out.push_str(&format!("  budget:      {}\n", p.budget));
        out.push_str(&format!("  risks:       {}", self.risk_count));
        out
    }
}

/// Show one project with its risk count.
pub fn project_show(workspace: &Path, id: &str) -> Result<ProjectShowResult> {
    let store = Store::open(workspace)?;
    require_session(&store)?;

    let project = store.get_project(id)?;
    let risk_count = store
        .list_risks()?
        .iter()
        .filter(|r| r.project_id == id)
        .count();

    Ok(ProjectShowResult {
        project,
        risk_count,
    })
}

/// Result of `rb project update`.
#[derive(Debug, Serialize)]
pub struct ProjectUpdateResult {
    #[serde(flatten)]
    pub project: Project,
}

impl Output for ProjectUpdateResult {
    fn to_human(&self) -> String {
        format!(
            "Updated project {}: \"{}\"",
            self.project.id, self.project.name
        )
    }
}

/// Merge the given fields into an existing project.
///
/// `updated_at` is regenerated on every update, changed fields or not.
#[allow(clippy::too_many_arguments)]
pub fn project_update(
    workspace: &Path,
    id: &str,
    name: Option<String>,
    description: Option<String>,
    location: Option<String>,
    status: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    manager: Option<String>,
    budget: Option<f64>,
) -> Result<ProjectUpdateResult> {
    let store = Store::open(workspace)?;
    let session = require_session(&store)?;
    require_edit(&session)?;

    let mut project = store.get_project(id)?;
    if let Some(name) = name {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Project name must not be blank".to_string(),
            ));
        }
        project.name = name;
    }
    if let Some(description) = description {
        project.description = description;
    }
    if let Some(location) = location {
        project.location = location;
    }
    if let Some(status) = status {
        project.status = status.parse::<ProjectStatus>()?;
    }
    if let Some(start_date) = start_date {
        project.start_date = parse_date(&start_date)?;
    }
    if let Some(end_date) = end_date {
        project.end_date = Some(parse_date(&end_date)?);
    }
    if let Some(manager) = manager {
        project.manager = manager;
    }
    if let Some(budget) = budget {
        project.budget = budget;
    }
    project.updated_at = chrono::Utc::now();

    store.update_project(&project)?;
    store.append_audit(&audit_entry(
        &session,
        AuditAction::Update,
        AuditEntityKind::Project,
        &project.id,
        &project.name,
        &project,
    ))?;

    Ok(ProjectUpdateResult { project })
}

/// Result of `rb project delete`.
#[derive(Debug, Serialize)]
pub struct ProjectDeleteResult {
    pub id: String,
    pub name: String,

    /// Risks removed by the cascade
    pub removed_risks: usize,

    /// Selection after the delete: the first remaining project when the
    /// deleted one was selected, otherwise whatever was selected before
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
}

impl Output for ProjectDeleteResult {
    fn to_human(&self) -> String {
        let mut out = format!(
            "Deleted project \"{}\" and {} risk(s)",
            self.name, self.removed_risks
        );
        match &self.selected {
            Some(id) => out.push_str(&format!("\nSelected project is now {}", id)),
            None => out.push_str("\nNo project selected"),
        }
        out
    }
}

/// Delete a project and every risk that references it.
///
/// When the deleted project was selected, the first remaining project
/// becomes selected (or the selection is cleared).
pub fn project_delete(workspace: &Path, id: &str, force: bool) -> Result<ProjectDeleteResult> {
    let store = Store::open(workspace)?;
    let session = require_session(&store)?;
    require_delete(&session)?;

    let project = store.get_project(id)?;
    if !force {
        return Err(Error::InvalidInput(format!(
            "Deleting project \"{}\" removes it and all of its risks; pass --force to confirm",
            project.name
        )));
    }

    // Cascade first, then drop the project itself.
    let mut risks = store.list_risks()?;
    let before = risks.len();
    risks.retain(|r| r.project_id != id);
    let removed_risks = before - risks.len();
    store.save_risks(&risks)?;
    store.delete_project(id)?;

    store.append_audit(&audit_entry(
        &session,
        AuditAction::Delete,
        AuditEntityKind::Project,
        &project.id,
        &project.name,
        &project,
    ))?;

    // Repair the selection so it never points at the deleted project.
    let mut selected = store.selected_project()?;
    if selected.as_deref() == Some(id) {
        selected = store.list_projects()?.first().map(|p| p.id.clone());
        match &selected {
            Some(next) => store.set_selected_project(next)?,
            None => store.clear_selected_project()?,
        }
    }

    Ok(ProjectDeleteResult {
        id: project.id,
        name: project.name,
        removed_risks,
        selected,
    })
}

/// Result of `rb project select`.
#[derive(Debug, Serialize)]
pub struct ProjectSelectResult {
    pub id: String,
    pub name: String,
}

impl Output for ProjectSelectResult {
    fn to_human(&self) -> String {
        format!("Selected project {}: \"{}\"", self.id, self.name)
    }
}

/// Select the project later commands default to.
pub fn project_select(workspace: &Path, id: &str) -> Result<ProjectSelectResult> {
    let store = Store::open(workspace)?;
    require_session(&store)?;

    let project = store.get_project(id)?;
    store.set_selected_project(&project.id)?;

    Ok(ProjectSelectResult {
        id: project.id,
        name: project.name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Risk;
    use crate::models::audit::AuditAction;
    use crate::models::auth::{Session, authenticate};
    use crate::test_utils::TestEnv;

    fn seeded_store(env: &TestEnv) -> Store {
        let store = env.init_store();
        let account = authenticate("admin", "admin123").unwrap();
        store.save_session(&Session::new(account)).unwrap();
        store
    }

    fn add_project(store: &Store, id: &str, name: &str) -> Project {
        let project = Project::new(id.to_string(), name.to_string());
        store.create_project(&project).unwrap();
        project
    }

    #[test]
    fn test_delete_cascades_and_reselects() {
        let env = TestEnv::new();
        let store = seeded_store(&env);
        let session = store.load_session().unwrap().unwrap();

        add_project(&store, "p1", "First");
        add_project(&store, "p2", "Second");
        store.set_selected_project("p2").unwrap();

        store
            .create_risk(&Risk::new(1, "p1".to_string(), "Keep me".to_string()))
            .unwrap();
        store
            .create_risk(&Risk::new(2, "p2".to_string(), "Drop me".to_string()))
            .unwrap();
        store
            .create_risk(&Risk::new(3, "p2".to_string(), "Me too".to_string()))
            .unwrap();

        // Mirror project_delete against the store directly: cascade,
        // delete, audit, reselect.
        let project = store.get_project("p2").unwrap();
        let mut risks = store.list_risks().unwrap();
        risks.retain(|r| r.project_id != "p2");
        store.save_risks(&risks).unwrap();
        store.delete_project("p2").unwrap();
        store
            .append_audit(&audit_entry(
                &session,
                AuditAction::Delete,
                AuditEntityKind::Project,
                &project.id,
                &project.name,
                &project,
            ))
            .unwrap();
        let next = store.list_projects().unwrap().first().map(|p| p.id.clone());
        store.set_selected_project(next.as_deref().unwrap()).unwrap();

        let remaining = store.list_risks().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].project_id, "p1");
        assert_eq!(store.selected_project().unwrap().as_deref(), Some("p1"));

        let trail = store.list_audit().unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].action, AuditAction::Delete);
        assert_eq!(trail[0].entity_kind, AuditEntityKind::Project);
        assert!(trail[0].changes.is_empty());
    }

    #[test]
    fn test_create_result_human_and_json() {
        let project = Project::new("1756137600000".to_string(), "Harbor Tunnel".to_string());
        let result = ProjectCreateResult {
            project,
            selected: true,
        };
        assert!(result.to_human().contains("Created project 1756137600000"));
        let json = result.to_json();
        // Flattened: project fields sit at the top level.
        assert!(json.contains(r#""id":"1756137600000""#));
        assert!(json.contains(r#""selected":true"#));
    }

    #[test]
    fn test_list_result_marks_selection() {
        let a = Project::new("p1".to_string(), "First".to_string());
        let b = Project::new("p2".to_string(), "Second".to_string());
        let result = ProjectListResult {
            count: 2,
            projects: vec![a, b],
            selected: Some("p2".to_string()),
        };
        let human = result.to_human();
        assert!(human.contains("* p2"));
        assert!(human.contains("  p1"));
    }

    #[test]
    fn test_delete_result_human_mentions_selection() {
        let cleared = ProjectDeleteResult {
            id: "p1".to_string(),
            name: "First".to_string(),
            removed_risks: 2,
            selected: None,
        };
        assert!(cleared.to_human().contains("No project selected"));

        let reselected = ProjectDeleteResult {
            id: "p1".to_string(),
            name: "First".to_string(),
            removed_risks: 0,
            selected: Some("p2".to_string()),
        };
        assert!(reselected.to_human().contains("now p2"));
    }
}
