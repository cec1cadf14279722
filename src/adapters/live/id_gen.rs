//! Live adapter for the `IdGenerator` port.

use uuid::Uuid;

use crate::ports::IdGenerator;

/// Allocates random v4 UUIDs as project ids.
#[derive(Debug, Default)]
pub struct UuidProjectIds;

impl IdGenerator for UuidProjectIds {
    fn new_project_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
