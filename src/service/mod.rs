//! # Service Layer
//!
//! Authenticated, encrypted sessions built on the framed transport.

pub mod secure;

pub use secure::SecureConnection;
