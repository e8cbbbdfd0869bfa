//! # Utility Modules
//!
//! Supporting utilities for cryptography, logging and metrics.
//!
//! ## Components
//! - **Crypto**: RSA challenge proof, session-key wrapping, session ciphers
//! - **Logging**: Structured logging configuration
//! - **Metrics**: Thread-safe observability counters
//!
//! ## Security
//! - Cryptographically secure RNG (getrandom)
//! - Memory zeroing for session keys (zeroize crate)

pub mod crypto;
pub mod logging;
pub mod metrics;

pub use metrics::{Metrics, MetricsSnapshot};
