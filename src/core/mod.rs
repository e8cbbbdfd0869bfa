//! # Core Framing Components
//!
//! Low-level message framing over a byte stream.
//!
//! TCP has no message boundaries, so every exchange after the username is
//! wrapped in a length-prefixed frame. The username itself travels in the
//! shorter 2-byte-length string form.
//!
//! ## Components
//! - **Codec**: Tokio codec for 4-byte length frames
//! - **Utf**: 2-byte length string primitive used for the username
//!
//! ## Wire Format
//! ```text
//! frame:    [Length(4, big-endian)] [Payload(N)]
//! username: [Length(2, big-endian)] [Modified UTF-8(N)]
//! ```
//!
//! ## Security
//! - Maximum frame size is bounded (prevents memory exhaustion)
//! - Length validation before allocation

pub mod codec;
pub mod utf;
