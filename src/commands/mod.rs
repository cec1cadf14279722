//! Command dispatch and handlers.

pub mod edit;
pub mod projects;
pub mod show;
pub mod whoami;

use std::error::Error;
use std::fmt::Write as _;

use tokio::runtime::Builder;

use crate::cli::Cli;
use crate::cli::Command;
use crate::config::Config;
use crate::context::ServiceContext;
use crate::controller::AppModelController;
use crate::store::ProjectRepository;

/// Dispatch a parsed command line to its handler.
///
/// Configuration comes from the environment (and `.env`), with `--db`
/// taking precedence over `APPMODEL_DB`.
///
/// # Errors
///
/// Returns an error string if the runtime cannot start or the selected
/// command handler fails.
pub fn dispatch(cli: &Cli) -> Result<(), String> {
    let config = Config::from_env().with_db_override(cli.db.clone());
    let ctx = ServiceContext::live(&config);
    let runtime = Builder::new_current_thread()
        .build()
        .map_err(|e| format!("Failed to start runtime: {e}"))?;
    runtime.block_on(dispatch_with_context(&cli.command, &config, &ctx))
}

/// Dispatch a command with the given configuration and service context.
///
/// # Errors
///
/// Returns an error string if the command handler fails.
pub async fn dispatch_with_context(
    command: &Command,
    config: &Config,
    ctx: &ServiceContext,
) -> Result<(), String> {
    // Only whoami runs without the project database.
    let repo = match command {
        Command::Whoami => return whoami::run(ctx).await,
        _ => ProjectRepository::open(&config.db_path).await.map_err(|e| describe(&e))?,
    };
    match command {
        Command::Projects { json } => projects::list(&repo, *json).await,
        Command::CreateProject { name } => projects::create(&repo, ctx, name).await,
        Command::DeleteProject { id } => projects::delete(&repo, id).await,
        Command::Show { project, format } => show::run(&repo, project, *format).await,
        Command::Types { project, void, lists, maps } => {
            show::types(&repo, project, *void, *lists, *maps).await
        }
        Command::AddModule { project, path } => edit::add_module(&repo, project, path).await,
        Command::AddClass { project, name, module } => {
            edit::add_class(&repo, project, name, module.as_deref()).await
        }
        Command::RemoveClass { project, class } => edit::remove_class(&repo, project, class).await,
        Command::AddField { project, class, name, ty } => {
            edit::add_field(&repo, project, class, name, ty.as_deref()).await
        }
        Command::SetStereotype { project, class, stereotype } => {
            edit::set_stereotype(&repo, project, class, stereotype).await
        }
        Command::Whoami => Ok(()),
    }
}

/// Opens the model of an existing project through a controller.
pub(crate) async fn open_model(
    repo: &ProjectRepository,
    project: &str,
) -> Result<AppModelController, String> {
    repo.get_project(project).await.map_err(|e| describe(&e))?;
    Ok(AppModelController::open(repo.clone(), project).await)
}

/// Formats an error with its chain of sources.
pub(crate) fn describe(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(message, ": {cause}");
        source = cause.source();
    }
    message
}
