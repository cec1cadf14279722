//! Id generator port for new project ids.

/// Produces ids for newly created projects.
///
/// Tests substitute a fixed sequence so command output is predictable.
pub trait IdGenerator: Send + Sync {
    /// Returns an id no existing project uses.
    fn new_project_id(&self) -> String;
}
