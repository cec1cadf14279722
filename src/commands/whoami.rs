//! `appmodel whoami` command.

use crate::context::ServiceContext;

/// Prints the authorization value of the current session.
///
/// # Errors
///
/// Returns an error string if no session is available.
pub async fn run(ctx: &ServiceContext) -> Result<(), String> {
    let session = ctx.session.session().await.map_err(|e| e.to_string())?;
    println!("{}", session.authorization_header());
    Ok(())
}
