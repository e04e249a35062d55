//! # Client Helpers
//!
//! Typed entry points on top of the generic [`Client`](entity_framework::Client),
//! so callers ask for `client.guild(id)` instead of spelling out kinds and paths.

pub mod client_ext;

pub use client_ext::ChatClientExt;
