//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the model core and something it
//! does not own (id allocation, the account session). Implementations live
//! in `src/adapters/`.

pub mod id_gen;
pub mod session;

pub use id_gen::IdGenerator;
pub use session::{Session, SessionFuture, SessionProvider};
