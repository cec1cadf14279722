//! Service context bundling the port trait objects.

use crate::adapters::live::id_gen::UuidProjectIds;
use crate::adapters::live::session::EnvSessionProvider;
use crate::config::Config;
use crate::ports::id_gen::IdGenerator;
use crate::ports::session::SessionProvider;

/// Bundles the port trait objects a command may need.
pub struct ServiceContext {
    /// Allocates ids for new projects.
    pub id_gen: Box<dyn IdGenerator>,
    /// Supplies the account session.
    pub session: Box<dyn SessionProvider>,
}

impl ServiceContext {
    /// Wires the live adapters from `config`.
    #[must_use]
    pub fn live(config: &Config) -> Self {
        Self::new(
            Box::new(UuidProjectIds),
            Box::new(EnvSessionProvider::new(config.session.clone())),
        )
    }

    /// Builds a context from explicit adapters.
    #[must_use]
    pub fn new(id_gen: Box<dyn IdGenerator>, session: Box<dyn SessionProvider>) -> Self {
        Self { id_gen, session }
    }
}
