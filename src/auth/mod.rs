//! # Authentication Data
//!
//! The pre-provisioned user registry consulted by the handshake.

pub mod registry;

pub use registry::{UserRecord, UserRegistry, NAME_MAX};
