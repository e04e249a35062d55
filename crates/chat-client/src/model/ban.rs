use crate::model::UserModel;
use entity_framework::{EntityModel, Field, Id};
use serde::{Deserialize, Serialize};

/// A guild ban. Bans have no id of their own: they are addressed by the banned
/// user's id within their guild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BanModel {
    pub user: UserModel,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub reason: Field<Option<String>>,
}

impl BanModel {
    pub fn new(user: UserModel) -> Self {
        Self {
            user,
            reason: Field::Unspecified,
        }
    }
}

impl EntityModel for BanModel {
    fn id(&self) -> Id {
        self.user.id
    }

    fn apply(&mut self, delta: Self) {
        self.user.apply(delta.user);
        self.reason.merge(delta.reason);
    }
}
