//! In-memory application model edited by the builder.
//!
//! The tree is owned top-down by value:
//!
//! ```text
//! App
//!  └── Module (root)
//!       ├── Module ...
//!       └── Class
//!            ├── Field
//!            └── Method
//!                 ├── Variable (parameters, returns)
//!                 └── SourceCode
//! ```
//!
//! Back-references are plain handles (`ModulePath`, the owning class's
//! `Type`, `MethodRef`) that are re-derived after every structural edit and
//! after decoding. They are never serialized.
//!
//! Each entity has a hand-written `to_object`/`from_object` pair producing the
//! persisted JSON shape.

mod app;
mod class;
mod method;
mod module;
pub mod naming;
mod source;
mod types;
mod variable;
mod wire;

pub use app::App;
pub use class::{Class, Stereotype};
pub use method::{Method, MethodRef};
pub use module::{Module, ModulePath};
pub use source::{Platform, SourceCode};
pub use types::Type;
pub use variable::{Field, Variable, VariableOwner};
