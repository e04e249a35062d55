use crate::channel_actor::Channel;
use crate::guild_actor::Guild;
use crate::user_actor::User;
use entity_framework::{Actor, CachePath, Client, Entity, Id};
use std::sync::Arc;

/// Actors for the platform's top-level kinds.
pub trait ChatClientExt {
    fn guild(&self, id: Id) -> Actor<Guild>;

    fn user(&self, id: Id) -> Actor<User>;

    /// A channel addressed by id alone. Guild channels reached through
    /// [`GuildActorExt::channel`](crate::guild_actor::GuildActorExt::channel)
    /// share the same actor, which takes on the guild's path whichever way it
    /// was reached first.
    fn channel(&self, id: Id) -> Actor<Channel>;

    /// Guilds currently held in memory, sorted by id.
    fn cached_guilds(&self) -> Vec<Arc<Entity<Guild>>>;
}

impl ChatClientExt for Client {
    fn guild(&self, id: Id) -> Actor<Guild> {
        self.actor::<Guild>(CachePath::root(), id)
    }

    fn user(&self, id: Id) -> Actor<User> {
        self.actor::<User>(CachePath::root(), id)
    }

    fn channel(&self, id: Id) -> Actor<Channel> {
        self.actor::<Channel>(CachePath::root(), id)
    }

    fn cached_guilds(&self) -> Vec<Arc<Entity<Guild>>> {
        let mut guilds = self.cache().entities::<Guild>();
        guilds.sort_by_key(|guild| guild.id());
        guilds
    }
}
