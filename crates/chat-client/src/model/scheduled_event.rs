use entity_framework::{fold_fields, EntityModel, Field, Id};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum EventStatus {
    Scheduled,
    Active,
    Completed,
    Canceled,
    Other(u8),
}

impl From<u8> for EventStatus {
    fn from(raw: u8) -> Self {
        match raw {
            1 => EventStatus::Scheduled,
            2 => EventStatus::Active,
            3 => EventStatus::Completed,
            4 => EventStatus::Canceled,
            other => EventStatus::Other(other),
        }
    }
}

impl From<EventStatus> for u8 {
    fn from(status: EventStatus) -> Self {
        match status {
            EventStatus::Scheduled => 1,
            EventStatus::Active => 2,
            EventStatus::Completed => 3,
            EventStatus::Canceled => 4,
            EventStatus::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEventModel {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub guild_id: Field<Id>,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub channel_id: Field<Option<Id>>,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub creator_id: Field<Option<Id>>,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub name: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub description: Field<Option<String>>,
    /// ISO 8601 timestamp, kept as sent.
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub scheduled_start_time: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub scheduled_end_time: Field<Option<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub status: Field<EventStatus>,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub user_count: Field<u32>,
}

impl EntityModel for ScheduledEventModel {
    fn id(&self) -> Id {
        self.id
    }

    fn apply(&mut self, delta: Self) {
        fold_fields!(self, delta;
            guild_id, channel_id, creator_id, name, description,
            scheduled_start_time, scheduled_end_time, status, user_count
        );
    }
}
