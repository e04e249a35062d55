//! # Wire Models
//!
//! Decoded snapshots of the platform's JSON objects. Every field other than the
//! id is a [`Field`](entity_framework::Field): REST objects and Gateway payloads
//! routinely omit keys, and an omitted key must never clear cached data.

pub mod ban;
pub mod channel;
pub mod guild;
pub mod role;
pub mod scheduled_event;
pub mod user;

pub use ban::BanModel;
pub use channel::{ChannelModel, ChannelType};
pub use guild::GuildModel;
pub use role::RoleModel;
pub use scheduled_event::{EventStatus, ScheduledEventModel};
pub use user::UserModel;
