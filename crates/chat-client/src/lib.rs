//! # Chat Client
//!
//! The chat platform's object model on top of [`entity_framework`]: guilds,
//! roles, channels, users, bans and scheduled events, the Gateway handler that
//! keeps them current, and the lifecycle that runs it all.

pub mod ban_actor;
pub mod channel_actor;
pub mod clients;
pub mod error;
pub mod gateway;
pub mod guild_actor;
pub mod lifecycle;
pub mod model;
pub mod role_actor;
pub mod scheduled_event_actor;
pub mod user_actor;

pub use error::ChatError;
