use entity_framework::{fold_fields, EntityModel, Field, Id};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuildModel {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub name: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub owner_id: Field<Id>,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub afk_channel_id: Field<Option<Id>>,
    /// Seconds of inactivity before a member is moved to the AFK channel.
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub afk_timeout: Field<u32>,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub icon: Field<Option<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub description: Field<Option<String>>,
    /// Set by the Gateway during an outage.
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub unavailable: Field<bool>,
}

impl GuildModel {
    pub fn new(id: Id) -> Self {
        Self {
            id,
            name: Field::Unspecified,
            owner_id: Field::Unspecified,
            afk_channel_id: Field::Unspecified,
            afk_timeout: Field::Unspecified,
            icon: Field::Unspecified,
            description: Field::Unspecified,
            unavailable: Field::Unspecified,
        }
    }
}

impl EntityModel for GuildModel {
    fn id(&self) -> Id {
        self.id
    }

    fn apply(&mut self, delta: Self) {
        fold_fields!(self, delta; name, owner_id, afk_channel_id, afk_timeout, icon, description, unavailable);
    }
}
