//! `appmodel show` and `appmodel types` commands.

use std::fmt::Write as _;

use super::{describe, open_model};
use crate::cli::ShowFormat;
use crate::model::{App, Class, Module, Variable};
use crate::store::ProjectRepository;

/// Prints the model of `project` in `format`.
///
/// # Errors
///
/// Returns an error string if the project does not exist or rendering fails.
pub async fn run(repo: &ProjectRepository, project: &str, format: ShowFormat) -> Result<(), String> {
    let controller = open_model(repo, project).await?;
    let app = controller.value().ok_or("Model not loaded")?;
    let rendered = match format {
        ShowFormat::Tree => render_tree(app),
        ShowFormat::Json => serde_json::to_string_pretty(&app.to_object()).map_err(|e| describe(&e))?,
        ShowFormat::Yaml => serde_yaml::to_string(&app.to_object()).map_err(|e| describe(&e))?,
    };
    print!("{rendered}");
    if format == ShowFormat::Json {
        println!();
    }
    Ok(())
}

/// Prints the types selectable in `project`, one per line.
///
/// # Errors
///
/// Returns an error string if the project does not exist.
#[allow(clippy::fn_params_excessive_bools)]
pub async fn types(
    repo: &ProjectRepository,
    project: &str,
    void: bool,
    lists: bool,
    maps: bool,
) -> Result<(), String> {
    let controller = open_model(repo, project).await?;
    let app = controller.value().ok_or("Model not loaded")?;
    for ty in app.get_types(void, lists, maps) {
        println!("{ty}");
    }
    Ok(())
}

/// Renders `app` as an indented outline.
#[must_use]
pub fn render_tree(app: &App) -> String {
    let mut out = String::new();
    if app.classes().is_empty() && app.modules().is_empty() {
        out.push_str("(empty model)\n");
        return out;
    }
    render_module(app, 0, &mut out);
    out
}

fn render_module(module: &Module, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    for class in module.classes() {
        render_class(class, &indent, out);
    }
    for child in module.modules() {
        let _ = writeln!(out, "{indent}module {}", child.name());
        render_module(child, depth + 1, out);
    }
}

fn render_class(class: &Class, indent: &str, out: &mut String) {
    let visibility = if class.exported { "" } else { "private " };
    let _ = write!(out, "{indent}{visibility}class {}", class.name());
    if let Some(stereotype) = class.stereotype() {
        let _ = write!(out, " [{stereotype}]");
    }
    out.push('\n');

    for field in class.fields() {
        let visibility = if field.exported { "" } else { "private " };
        let _ = writeln!(out, "{indent}  {visibility}field {}", variable(field));
    }
    for method in class.methods() {
        let params: Vec<String> = method.parameters().iter().map(variable).collect();
        let _ = write!(out, "{indent}  method {}({})", method.name(), params.join(", "));
        if !method.returns().is_empty() {
            let returns: Vec<String> = method.returns().iter().map(variable).collect();
            let _ = write!(out, " -> ({})", returns.join(", "));
        }
        out.push('\n');
        for code in method.implementations() {
            let _ = writeln!(out, "{indent}    impl {} ({} lines)", code.platform, code.lines().len());
        }
    }
}

fn variable(var: &Variable) -> String {
    match &var.ty {
        Some(ty) if var.name.is_empty() => ty.to_string(),
        Some(ty) => format!("{}: {ty}", var.name),
        None => format!("{}: ?", var.name),
    }
}
