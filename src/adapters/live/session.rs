//! Live adapter for the `SessionProvider` port backed by configuration.

use std::sync::Mutex;

use tracing::debug;

use crate::ports::session::{Session, SessionFuture, SessionProvider};

/// Serves the session id configured through `APPMODEL_SESSION`.
///
/// The id is resolved once and cached for the life of the provider.
#[derive(Debug)]
pub struct EnvSessionProvider {
    configured: Option<String>,
    cached: Mutex<Option<Session>>,
}

impl EnvSessionProvider {
    /// Creates a provider for the configured session id, if any.
    #[must_use]
    pub fn new(configured: Option<String>) -> Self {
        Self { configured, cached: Mutex::new(None) }
    }
}

impl SessionProvider for EnvSessionProvider {
    fn session(&self) -> SessionFuture<'_> {
        Box::pin(async move {
            let mut cached = self.cached.lock().map_err(|_| "session cache poisoned")?;
            if let Some(session) = cached.as_ref() {
                return Ok(session.clone());
            }
            let id = self
                .configured
                .clone()
                .ok_or("no session configured; set APPMODEL_SESSION")?;
            debug!("session resolved from configuration");
            let session = Session { id };
            *cached = Some(session.clone());
            Ok(session)
        })
    }
}
