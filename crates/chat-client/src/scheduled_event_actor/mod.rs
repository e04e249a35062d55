//! # Scheduled Event Actor

use crate::channel_actor::Channel;
use crate::guild_actor::Guild;
use crate::model::ScheduledEventModel;
use crate::user_actor::User;
use entity_framework::{Actor, CachePath, ConstructionContext, FrameworkError, Id, Kind, Route};

#[derive(Debug, Clone)]
pub struct ScheduledEventLinks {
    pub guild: Actor<Guild>,
    /// Stage or voice channel hosting the event, if any.
    pub channel: Option<Actor<Channel>>,
    pub creator: Option<Actor<User>>,
}

pub struct ScheduledEvent;

impl Kind for ScheduledEvent {
    const NAME: &'static str = "scheduled_event";
    type Model = ScheduledEventModel;
    type Derived = ScheduledEventLinks;

    fn derive(
        ctx: &ConstructionContext<'_, Self>,
        model: &ScheduledEventModel,
    ) -> Result<ScheduledEventLinks, FrameworkError> {
        let guild_id = match model.guild_id.get() {
            Some(&id) => id,
            None => ctx.path().require::<Guild>(Self::NAME, model.id)?,
        };
        let scope = CachePath::of::<Guild>(guild_id);

        Ok(ScheduledEventLinks {
            guild: ctx.actor_of::<Guild>(CachePath::root(), guild_id),
            channel: model
                .channel_id
                .flatten()
                .map(|&id| ctx.actor_of::<Channel>(scope, id)),
            creator: model
                .creator_id
                .flatten()
                .map(|&id| ctx.actor_of::<User>(CachePath::root(), id)),
        })
    }

    fn fetch_route(path: &CachePath, id: Id) -> Result<Route, FrameworkError> {
        let guild_id = path.require::<Guild>(Self::NAME, id)?;
        Ok(Route::get(format!("/guilds/{guild_id}/scheduled-events/{id}")))
    }

    fn modify_route(path: &CachePath, id: Id) -> Result<Route, FrameworkError> {
        let guild_id = path.require::<Guild>(Self::NAME, id)?;
        Ok(Route::patch(format!("/guilds/{guild_id}/scheduled-events/{id}")))
    }

    fn delete_route(path: &CachePath, id: Id) -> Result<Route, FrameworkError> {
        let guild_id = path.require::<Guild>(Self::NAME, id)?;
        Ok(Route::delete(format!("/guilds/{guild_id}/scheduled-events/{id}")))
    }
}
