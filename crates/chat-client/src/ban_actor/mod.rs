//! # Ban Actor
//!
//! A ban is keyed by the banned user's id, which is only unique inside a guild:
//! the same user banned from two guilds has two bans. [`Ban`] therefore scopes
//! its cache entries by guild, and every ban actor needs the guild in its path.
//! Deleting a ban lifts it.

use crate::guild_actor::Guild;
use crate::model::BanModel;
use crate::user_actor::User;
use entity_framework::{
    Actor, CacheKey, CachePath, ConstructionContext, FrameworkError, Id, Kind, Route,
};

#[derive(Debug, Clone)]
pub struct BanLinks {
    pub guild: Actor<Guild>,
    pub user: Actor<User>,
}

pub struct Ban;

impl Kind for Ban {
    const NAME: &'static str = "ban";
    type Model = BanModel;
    type Derived = BanLinks;

    fn derive(ctx: &ConstructionContext<'_, Self>, model: &BanModel) -> Result<BanLinks, FrameworkError> {
        let guild_id = ctx.path().require::<Guild>(Self::NAME, model.user.id)?;
        Ok(BanLinks {
            guild: ctx.actor_of::<Guild>(CachePath::root(), guild_id),
            user: ctx.actor_of::<User>(CachePath::root(), model.user.id),
        })
    }

    fn scope(path: &CachePath) -> Option<CacheKey> {
        path.get::<Guild>().map(CacheKey::of::<Guild>)
    }

    fn fetch_route(path: &CachePath, id: Id) -> Result<Route, FrameworkError> {
        let guild_id = path.require::<Guild>(Self::NAME, id)?;
        Ok(Route::get(format!("/guilds/{guild_id}/bans/{id}")))
    }

    fn delete_route(path: &CachePath, id: Id) -> Result<Route, FrameworkError> {
        let guild_id = path.require::<Guild>(Self::NAME, id)?;
        Ok(Route::delete(format!("/guilds/{guild_id}/bans/{id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ChatClientExt;
    use crate::guild_actor::GuildActorExt;
    use entity_framework::fixtures::fixture_client;
    use entity_framework::HttpMethod;
    use serde_json::json;

    #[tokio::test]
    async fn test_fetch_and_lift_ban() {
        let (client, mock) = fixture_client();
        mock.expect(HttpMethod::Get, "/guilds/10/bans/5")
            .return_ok(json!({ "user": { "id": "5", "username": "spam" }, "reason": "spam" }));
        mock.expect(HttpMethod::Delete, "/guilds/10/bans/5").return_none();

        let ban = client.guild(Id(10)).ban(Id(5)).unwrap();
        let entity = ban.fetch(None, None).await.unwrap().unwrap();
        assert_eq!(entity.read(|model, _| model.reason.flatten().cloned()), Some("spam".to_string()));
        assert_eq!(entity.derived().user.id(), Id(5));

        ban.delete(None, None).await.unwrap();
        assert!(client.lookup_in::<Ban>(&CachePath::of::<Guild>(Id(10)), Id(5)).is_none());
        mock.verify();
    }

    #[tokio::test]
    async fn test_same_user_banned_in_two_guilds() {
        let (client, mock) = fixture_client();
        mock.expect(HttpMethod::Get, "/guilds/11/bans/5")
            .return_ok(json!({ "user": { "id": "5" }, "reason": "raid" }));

        let first = client.guild(Id(10)).ban(Id(5)).unwrap();
        let _first = first
            .create_entity(serde_json::from_value(json!({ "user": { "id": "5" }, "reason": "spam" })).unwrap())
            .unwrap();
        let second = client.guild(Id(11)).ban(Id(5)).unwrap();
        assert!(!first.same_binding(&second));
        assert_eq!(second.path(), CachePath::of::<Guild>(Id(11)));

        let entity = second.fetch(None, None).await.unwrap().unwrap();
        assert_eq!(entity.derived().guild.id(), Id(11));
        assert_eq!(entity.read(|model, _| model.reason.flatten().cloned()), Some("raid".to_string()));

        let in_first = client.lookup_in::<Ban>(&CachePath::of::<Guild>(Id(10)), Id(5)).unwrap();
        assert_eq!(in_first.derived().guild.id(), Id(10));
        assert_eq!(in_first.read(|model, _| model.reason.flatten().cloned()), Some("spam".to_string()));
        mock.verify();
    }
}
