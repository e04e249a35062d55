use entity_framework::{fold_fields, EntityModel, Field, Id};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserModel {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub username: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub global_name: Field<Option<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub avatar: Field<Option<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub bot: Field<bool>,
}

impl UserModel {
    pub fn new(id: Id) -> Self {
        Self {
            id,
            username: Field::Unspecified,
            global_name: Field::Unspecified,
            avatar: Field::Unspecified,
            bot: Field::Unspecified,
        }
    }

    /// The name shown in clients: the global name if set, else the username.
    pub fn display_name(&self) -> Option<&str> {
        self.global_name
            .flatten()
            .or(self.username.get())
            .map(String::as_str)
    }
}

impl EntityModel for UserModel {
    fn id(&self) -> Id {
        self.id
    }

    fn apply(&mut self, delta: Self) {
        fold_fields!(self, delta; username, global_name, avatar, bot);
    }
}
