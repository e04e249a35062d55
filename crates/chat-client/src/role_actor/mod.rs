//! # Role Actor
//!
//! Roles only exist inside a guild: every route embeds the guild id, so a role
//! actor must be created under its guild's scope (see
//! [`GuildActorExt::role`](crate::guild_actor::GuildActorExt::role)).

use crate::guild_actor::Guild;
use crate::model::RoleModel;
use entity_framework::{Actor, CachePath, ConstructionContext, FrameworkError, Id, Kind, Route};

#[derive(Debug, Clone)]
pub struct RoleLinks {
    pub guild: Actor<Guild>,
}

pub struct Role;

impl Kind for Role {
    const NAME: &'static str = "role";
    type Model = RoleModel;
    type Derived = RoleLinks;

    fn derive(
        ctx: &ConstructionContext<'_, Self>,
        model: &RoleModel,
    ) -> Result<RoleLinks, FrameworkError> {
        let guild_id = ctx.path().require::<Guild>(Self::NAME, model.id)?;
        Ok(RoleLinks {
            guild: ctx.actor_of::<Guild>(CachePath::root(), guild_id),
        })
    }

    fn fetch_route(path: &CachePath, id: Id) -> Result<Route, FrameworkError> {
        let guild_id = path.require::<Guild>(Self::NAME, id)?;
        Ok(Route::get(format!("/guilds/{guild_id}/roles/{id}")))
    }

    fn modify_route(path: &CachePath, id: Id) -> Result<Route, FrameworkError> {
        let guild_id = path.require::<Guild>(Self::NAME, id)?;
        Ok(Route::patch(format!("/guilds/{guild_id}/roles/{id}")))
    }

    fn delete_route(path: &CachePath, id: Id) -> Result<Route, FrameworkError> {
        let guild_id = path.require::<Guild>(Self::NAME, id)?;
        Ok(Route::delete(format!("/guilds/{guild_id}/roles/{id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ChatClientExt;
    use crate::guild_actor::GuildActorExt;
    use entity_framework::fixtures::fixture_client;
    use entity_framework::{Field, HttpMethod};
    use serde_json::json;

    #[tokio::test]
    async fn test_role_outside_guild_scope_is_rejected() {
        let (client, _mock) = fixture_client();
        let orphan = client.actor::<Role>(CachePath::root(), Id(20));

        let err = orphan.create_entity(RoleModel::new(Id(20))).unwrap_err();
        assert!(matches!(
            err,
            FrameworkError::MissingPath { kind: "role", parent: "guild", .. }
        ));
        assert!(client.lookup::<Role>(Id(20)).is_none());
    }

    #[tokio::test]
    async fn test_modify_patches_and_folds_response() {
        let (client, mock) = fixture_client();
        mock.expect(HttpMethod::Patch, "/guilds/10/roles/20")
            .return_ok(json!({ "id": "20", "name": "mods", "color": 255 }));

        let role = client.guild(Id(10)).role(Id(20)).unwrap();
        let entity = role
            .modify(&json!({ "color": 255 }), None, None)
            .await
            .unwrap();

        assert_eq!(entity.read(|model, _| model.color), Field::Specified(255));
        assert_eq!(mock.requests()[0].body, Some(json!({ "color": 255 })));
    }

    #[tokio::test]
    async fn test_delete_evicts() {
        let (client, mock) = fixture_client();
        mock.expect(HttpMethod::Delete, "/guilds/10/roles/20").return_none();

        let role = client.guild(Id(10)).role(Id(20)).unwrap();
        let _entity = role.create_entity(RoleModel::new(Id(20)).with_name("mods")).unwrap();
        role.delete(None, None).await.unwrap();

        assert!(client.lookup::<Role>(Id(20)).is_none());
        mock.verify();
    }
}
