//! Session port: the signed-in user's session as seen by the core.

use std::error::Error;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Boxed future type alias used by [`SessionProvider`] to keep the trait dyn-compatible.
pub type SessionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Session, Box<dyn Error + Send + Sync>>> + Send + 'a>>;

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque session id issued by the account service.
    pub id: String,
}

impl Session {
    /// Value for an `Authorization` header carrying this session.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("Session {}", self.id)
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Supplies the current session.
pub trait SessionProvider: Send + Sync {
    /// Resolves the current session.
    ///
    /// # Errors
    ///
    /// Returns an error if no session is available.
    fn session(&self) -> SessionFuture<'_>;
}

#[cfg(test)]
mod tests {
    use super::Session;

    #[test]
    fn authorization_header_carries_id() {
        let session = Session { id: "abc123".into() };
        assert_eq!(session.authorization_header(), "Session abc123");
        assert_eq!(session.to_string(), "abc123");
    }
}
