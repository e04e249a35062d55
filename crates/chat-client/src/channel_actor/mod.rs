//! # Channel Actor
//!
//! Channels are addressed by id alone, but most of them belong to a guild and
//! may sit under a parent category. The guild is taken from the model when the
//! payload carries `guild_id`, otherwise from the actor's cache path.

use crate::guild_actor::Guild;
use crate::model::ChannelModel;
use entity_framework::{Actor, CachePath, ConstructionContext, FrameworkError, Id, Kind, Route};

#[derive(Debug, Clone)]
pub struct ChannelLinks {
    pub guild: Option<Actor<Guild>>,
    /// Category or parent forum.
    pub parent: Option<Actor<Channel>>,
}

pub struct Channel;

impl Kind for Channel {
    const NAME: &'static str = "channel";
    type Model = ChannelModel;
    type Derived = ChannelLinks;

    fn derive(
        ctx: &ConstructionContext<'_, Self>,
        model: &ChannelModel,
    ) -> Result<ChannelLinks, FrameworkError> {
        let guild_id = model
            .guild_id
            .flatten()
            .copied()
            .or_else(|| ctx.path().get::<Guild>());
        let scope = guild_id
            .map(CachePath::of::<Guild>)
            .unwrap_or_default();

        Ok(ChannelLinks {
            guild: guild_id.map(|id| ctx.actor_of::<Guild>(CachePath::root(), id)),
            parent: model
                .parent_id
                .flatten()
                .map(|&id| ctx.actor_of::<Channel>(scope, id)),
        })
    }

    fn fetch_route(_path: &CachePath, id: Id) -> Result<Route, FrameworkError> {
        Ok(Route::get(format!("/channels/{id}")))
    }

    fn modify_route(_path: &CachePath, id: Id) -> Result<Route, FrameworkError> {
        Ok(Route::patch(format!("/channels/{id}")))
    }

    fn delete_route(_path: &CachePath, id: Id) -> Result<Route, FrameworkError> {
        Ok(Route::delete(format!("/channels/{id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ChatClientExt;
    use entity_framework::fixtures::fixture_client;
    use entity_framework::Field;

    #[tokio::test]
    async fn test_guild_from_payload_and_parent_category() {
        let (client, _mock) = fixture_client();
        let mut model = ChannelModel::new(Id(31));
        model.guild_id = Field::Specified(Some(Id(10)));
        model.parent_id = Field::Specified(Some(Id(30)));

        let entity = client.channel(Id(31)).create_entity(model).unwrap();
        let links = entity.derived();
        assert_eq!(links.guild.map(|guild| guild.id()), Some(Id(10)));

        let parent = links.parent.unwrap();
        assert_eq!(parent.id(), Id(30));
        assert_eq!(parent.path(), CachePath::of::<Guild>(Id(10)));
    }

    #[tokio::test]
    async fn test_direct_message_channel_has_no_guild() {
        let (client, _mock) = fixture_client();
        let mut model = ChannelModel::new(Id(40));
        model.guild_id = Field::Specified(None);

        let entity = client.channel(Id(40)).create_entity(model).unwrap();
        assert!(entity.derived().guild.is_none());
        assert!(entity.derived().parent.is_none());
    }
}
