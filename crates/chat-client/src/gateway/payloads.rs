//! Gateway payload shapes that are not plain models.

use crate::model::{ChannelModel, RoleModel, UserModel};
use entity_framework::Id;
use serde::Deserialize;

/// Children sent alongside the guild in `GUILD_CREATE`.
#[derive(Debug, Default, Deserialize)]
pub struct GuildChildren {
    #[serde(default)]
    pub roles: Vec<RoleModel>,
    #[serde(default)]
    pub channels: Vec<ChannelModel>,
}

#[derive(Debug, Deserialize)]
pub struct GuildDelete {
    pub id: Id,
    /// Present and true when the guild went dark in an outage.
    #[serde(default)]
    pub unavailable: bool,
}

#[derive(Debug, Deserialize)]
pub struct RoleUpsert {
    pub guild_id: Id,
    pub role: RoleModel,
}

#[derive(Debug, Deserialize)]
pub struct RoleDelete {
    pub guild_id: Id,
    pub role_id: Id,
}

#[derive(Debug, Deserialize)]
pub struct BanChange {
    pub guild_id: Id,
    pub user: UserModel,
}
