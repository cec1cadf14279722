//! Model editing commands: `add-module`, `add-class`, `remove-class`,
//! `add-field` and `set-stereotype`.
//!
//! Each one opens the project's model controller, applies one edit, and
//! waits for the resulting save before returning.

use super::{describe, open_model};
use crate::error::ModelError;
use crate::model::{App, Field, ModulePath, Stereotype, Type};
use crate::store::ProjectRepository;

/// Creates every missing module along the dotted `path`.
///
/// # Errors
///
/// Returns an error string if the project is missing, a segment is invalid,
/// or the save fails.
pub async fn add_module(repo: &ProjectRepository, project: &str, path: &str) -> Result<(), String> {
    let path = ModulePath::parse(path);
    if path.is_root() {
        return Err("Module path must not be empty".to_string());
    }
    apply(repo, project, |app| app.create_module_path(&path)).await?;
    println!("Module {path} ready");
    Ok(())
}

/// Creates an empty class `name` in `module` (the root when `None`).
///
/// # Errors
///
/// Returns an error string if the name is invalid or taken, the module is
/// missing, or the save fails.
pub async fn add_class(
    repo: &ProjectRepository,
    project: &str,
    name: &str,
    module: Option<&str>,
) -> Result<(), String> {
    let module = module.map_or_else(ModulePath::root, ModulePath::parse);
    let ty = apply(repo, project, |app| app.create_class(&module, name)).await?;
    println!("Created class {ty}");
    Ok(())
}

/// Removes the class with fully qualified name `class`.
///
/// # Errors
///
/// Returns an error string if the class does not exist or the save fails.
pub async fn remove_class(repo: &ProjectRepository, project: &str, class: &str) -> Result<(), String> {
    let ty = Type::new(class);
    apply(repo, project, |app| {
        if app.remove_class_by_type(&ty) {
            Ok(())
        } else {
            Err(ModelError::ClassNotFound(class.to_string()))
        }
    })
    .await?;
    println!("Removed class {ty}");
    Ok(())
}

/// Adds field `name` to `class`, replacing a field of the same name.
///
/// # Errors
///
/// Returns an error string if the class does not exist, the type does not
/// parse, or the save fails.
pub async fn add_field(
    repo: &ProjectRepository,
    project: &str,
    class: &str,
    name: &str,
    ty: Option<&str>,
) -> Result<(), String> {
    let field_type = ty.map(Type::parse).transpose().map_err(|e| describe(&e))?;
    let owner = Type::new(class);
    apply(repo, project, |app| {
        let target =
            app.resolve_type_mut(&owner).ok_or_else(|| ModelError::ClassNotFound(class.to_string()))?;
        let name = if name.is_empty() { target.generate_field_name() } else { name.to_string() };
        target.add_field(Field::new(name, field_type));
        Ok(())
    })
    .await?;
    println!("Updated class {owner}");
    Ok(())
}

/// Sets the stereotype of `class` to the tag `stereotype`.
///
/// # Errors
///
/// Returns an error string if the class or tag is unknown, or the save fails.
pub async fn set_stereotype(
    repo: &ProjectRepository,
    project: &str,
    class: &str,
    stereotype: &str,
) -> Result<(), String> {
    let stereotype: Stereotype = stereotype.parse().map_err(|e| describe(&e))?;
    let owner = Type::new(class);
    let platform = apply(repo, project, |app| {
        let target =
            app.resolve_type_mut(&owner).ok_or_else(|| ModelError::ClassNotFound(class.to_string()))?;
        target.set_stereotype(stereotype);
        Ok(app.platform_for_stereotype(stereotype))
    })
    .await?;
    println!("{owner} is now {stereotype} ({platform})");
    Ok(())
}

/// Applies `edit` to the model of `project` and persists the result.
/// A failed edit is reported without saving.
async fn apply<R>(
    repo: &ProjectRepository,
    project: &str,
    edit: impl FnOnce(&mut App) -> Result<R, ModelError>,
) -> Result<R, String> {
    let mut controller = open_model(repo, project).await?;
    let app = controller.value_mut().ok_or("Model not loaded")?;
    let result = edit(app).map_err(|e| describe(&e))?;
    controller.notify_value_changed();
    controller.flush().await.map_err(|e| describe(&e))?;
    Ok(result)
}
