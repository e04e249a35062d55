use entity_framework::{fold_fields, EntityModel, Field, Id};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleModel {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub name: Field<String>,
    /// RGB packed into an integer; 0 means no color.
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub color: Field<u32>,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub hoist: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub position: Field<i32>,
    /// Permission bit set, as a decimal string.
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub permissions: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub managed: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub mentionable: Field<bool>,
}

impl RoleModel {
    pub fn new(id: Id) -> Self {
        Self {
            id,
            name: Field::Unspecified,
            color: Field::Unspecified,
            hoist: Field::Unspecified,
            position: Field::Unspecified,
            permissions: Field::Unspecified,
            managed: Field::Unspecified,
            mentionable: Field::Unspecified,
        }
    }

    pub fn with_color(mut self, color: u32) -> Self {
        self.color = Field::Specified(color);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Field::Specified(name.into());
        self
    }
}

impl EntityModel for RoleModel {
    fn id(&self) -> Id {
        self.id
    }

    fn apply(&mut self, delta: Self) {
        fold_fields!(self, delta; name, color, hoist, position, permissions, managed, mentionable);
    }
}
