//! Live adapters for real external interactions.

pub mod id_gen;
pub mod session;
