//! `appmodel projects`, `create-project` and `delete-project` commands.

use tracing::info;

use super::describe;
use crate::context::ServiceContext;
use crate::store::{Direction, Project, ProjectRepository};

/// Prints every project in id order, as `<id>\t<name>` lines or as a JSON
/// array of `{ "id", "name" }` objects.
///
/// # Errors
///
/// Returns an error string if the project scan fails.
pub async fn list(repo: &ProjectRepository, json: bool) -> Result<(), String> {
    let mut projects = Vec::new();
    repo.query(|project| projects.push(project), None, Direction::Next)
        .await
        .map_err(|e| describe(&e))?;
    print!("{}", render_list(&projects, json).map_err(|e| describe(&e))?);
    Ok(())
}

fn render_list(projects: &[Project], json: bool) -> Result<String, serde_json::Error> {
    if json {
        return Ok(format!("{}\n", serde_json::to_string_pretty(projects)?));
    }
    if projects.is_empty() {
        return Ok("No projects.\n".to_string());
    }
    Ok(projects.iter().map(|p| format!("{}\t{}\n", p.id, p.name)).collect())
}

/// Creates a project named `name` and prints its new id.
///
/// # Errors
///
/// Returns an error string if the name is blank or the write fails.
pub async fn create(repo: &ProjectRepository, ctx: &ServiceContext, name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Project name must not be empty".to_string());
    }
    let project = Project::new(ctx.id_gen.new_project_id(), name);
    repo.put_project(&project).await.map_err(|e| describe(&e))?;
    info!(id = %project.id, name = %project.name, "project created");
    println!("{}", project.id);
    Ok(())
}

/// Deletes project `id` and all of its assets.
///
/// # Errors
///
/// Returns an error string if the project does not exist or the delete fails.
pub async fn delete(repo: &ProjectRepository, id: &str) -> Result<(), String> {
    let project = repo.get_project(id).await.map_err(|e| describe(&e))?;
    repo.delete_project(id).await.map_err(|e| describe(&e))?;
    println!("Deleted {} ({})", project.id, project.name);
    Ok(())
}
