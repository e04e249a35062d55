use entity_framework::{fold_fields, EntityModel, Field, Id};
use serde::{Deserialize, Serialize};

/// The subset of channel types the client distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ChannelType {
    GuildText,
    Dm,
    GuildVoice,
    GuildCategory,
    GuildAnnouncement,
    GuildForum,
    Other(u8),
}

impl From<u8> for ChannelType {
    fn from(raw: u8) -> Self {
        match raw {
            0 => ChannelType::GuildText,
            1 => ChannelType::Dm,
            2 => ChannelType::GuildVoice,
            4 => ChannelType::GuildCategory,
            5 => ChannelType::GuildAnnouncement,
            15 => ChannelType::GuildForum,
            other => ChannelType::Other(other),
        }
    }
}

impl From<ChannelType> for u8 {
    fn from(kind: ChannelType) -> Self {
        match kind {
            ChannelType::GuildText => 0,
            ChannelType::Dm => 1,
            ChannelType::GuildVoice => 2,
            ChannelType::GuildCategory => 4,
            ChannelType::GuildAnnouncement => 5,
            ChannelType::GuildForum => 15,
            ChannelType::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelModel {
    pub id: Id,
    #[serde(rename = "type", default, skip_serializing_if = "Field::is_unspecified")]
    pub kind: Field<ChannelType>,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub guild_id: Field<Option<Id>>,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub name: Field<Option<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub topic: Field<Option<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub position: Field<i32>,
    /// Category for guild channels, forum for threads.
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub parent_id: Field<Option<Id>>,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub nsfw: Field<bool>,
}

impl ChannelModel {
    pub fn new(id: Id) -> Self {
        Self {
            id,
            kind: Field::Unspecified,
            guild_id: Field::Unspecified,
            name: Field::Unspecified,
            topic: Field::Unspecified,
            position: Field::Unspecified,
            parent_id: Field::Unspecified,
            nsfw: Field::Unspecified,
        }
    }
}

impl EntityModel for ChannelModel {
    fn id(&self) -> Id {
        self.id
    }

    fn apply(&mut self, delta: Self) {
        fold_fields!(self, delta; kind, guild_id, name, topic, position, parent_id, nsfw);
    }
}
