//! # Guild Ban Pagination
//!
//! Bans are listed page by page, ordered by user id, with an `after` cursor.
//! A [`BanPager`] remembers that cursor between calls, so it is attached to the
//! guild actor as a trait rather than created per call.

use crate::ban_actor::Ban;
use crate::guild_actor::Guild;
use crate::model::BanModel;
use crate::user_actor::User;
use entity_framework::{
    CachePath, CancelToken, ClientRef, Entity, FrameworkError, Id, Kind, RestRequest, Route,
    TraitKey,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Largest page the platform serves.
pub const MAX_PAGE_SIZE: u16 = 1000;

/// Trait slot holding a guild's [`BanPager`].
pub struct GuildBans;

impl TraitKey for GuildBans {
    const NAME: &'static str = "guild_bans";
    type Value = BanPager;
}

#[derive(Debug, Default)]
struct PagerState {
    after: Option<Id>,
    exhausted: bool,
}

/// Cursor over the bans of one guild.
#[derive(Debug)]
pub struct BanPager {
    guild_id: Id,
    client: ClientRef,
    state: Mutex<PagerState>,
}

impl BanPager {
    pub fn new(guild_id: Id, client: ClientRef) -> Self {
        Self {
            guild_id,
            client,
            state: Mutex::new(PagerState::default()),
        }
    }

    pub fn guild_id(&self) -> Id {
        self.guild_id
    }

    /// User id of the last ban seen, if any.
    pub fn cursor(&self) -> Option<Id> {
        self.state.lock().after
    }

    pub fn is_exhausted(&self) -> bool {
        self.state.lock().exhausted
    }

    /// Starts over from the first page.
    pub fn reset(&self) {
        *self.state.lock() = PagerState::default();
    }

    /// Fetches the next page and materializes every ban on it.
    ///
    /// The banned users are pushed to their own actors as well. Returns an empty
    /// page once the listing is exhausted.
    #[instrument(skip(self, cancel), fields(guild_id = %self.guild_id))]
    pub async fn next_page(
        &self,
        limit: u16,
        cancel: Option<&CancelToken>,
    ) -> Result<Vec<Arc<Entity<Ban>>>, FrameworkError> {
        let after = {
            let state = self.state.lock();
            if state.exhausted {
                debug!("Exhausted");
                return Ok(Vec::new());
            }
            state.after
        };

        let client = self.client.upgrade().ok_or(FrameworkError::ClientDropped)?;
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let mut path = format!("/guilds/{}/bans?limit={limit}", self.guild_id);
        if let Some(after) = after {
            path.push_str(&format!("&after={after}"));
        }

        let bans: Vec<BanModel> = match client
            .send(RestRequest::new(Route::get(path)), None, cancel)
            .await?
        {
            Some(raw) => serde_json::from_value(raw).map_err(|source| FrameworkError::Decode {
                kind: Ban::NAME,
                source,
            })?,
            None => Vec::new(),
        };

        let scope = CachePath::of::<Guild>(self.guild_id);
        let mut page = Vec::with_capacity(bans.len());
        let mut last = after;
        for ban in bans {
            let user = ban.user.clone();
            last = last.max(Some(user.id));
            client
                .actor::<User>(CachePath::root(), user.id)
                .deliver_model(user)?;
            page.push(client.create_latent::<Ban>(ban, &scope)?);
        }

        let mut state = self.state.lock();
        state.after = last;
        state.exhausted = page.len() < usize::from(limit);
        debug!(count = page.len(), exhausted = state.exhausted, "Fetched page");
        Ok(page)
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

    fn ban_json(user_id: u64, name: &str) -> serde_json::Value {
        json!({ "user": { "id": user_id.to_string(), "username": name }, "reason": null })
    }

    #[tokio::test]
    async fn test_pages_follow_cursor_until_short_page() {
        let (client, mock) = fixture_client();
        mock.expect(HttpMethod::Get, "/guilds/10/bans?limit=2")
            .return_ok(json!([ban_json(5, "a"), ban_json(7, "b")]));
        mock.expect(HttpMethod::Get, "/guilds/10/bans?limit=2&after=7")
            .return_ok(json!([ban_json(9, "c")]));

        let pager = client.guild(Id(10)).bans().unwrap();
        let first = pager.next_page(2, None).await.unwrap();
        assert_eq!(first.iter().map(|ban| ban.id()).collect::<Vec<_>>(), vec![Id(5), Id(7)]);
        assert_eq!(pager.cursor(), Some(Id(7)));
        assert!(!pager.is_exhausted());

        let second = pager.next_page(2, None).await.unwrap();
        assert_eq!(second.len(), 1);
        assert!(pager.is_exhausted());
        assert!(pager.next_page(2, None).await.unwrap().is_empty());
        mock.verify();
    }

    #[tokio::test]
    async fn test_pager_is_shared_per_guild() {
        let (client, _mock) = fixture_client();
        let first = client.guild(Id(10)).bans().unwrap();
        let second = client.guild(Id(10)).bans().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(client.guild(Id(10)).trait_names(), vec!["guild_bans"]);
    }

    #[tokio::test]
    async fn test_banned_users_are_pushed_to_user_actors() {
        let (client, mock) = fixture_client();
        mock.expect(HttpMethod::Get, "/guilds/10/bans?limit=10")
            .return_ok(json!([ban_json(5, "ferris")]));

        let pager = client.guild(Id(10)).bans().unwrap();
        let page = pager.next_page(10, None).await.unwrap();

        let ban_links = page[0].derived();
        assert_eq!(ban_links.guild.id(), Id(10));
        let user = ban_links.user.try_get_precached_entity().unwrap();
        assert_eq!(user.read(|model, _| model.username.get().cloned()), Some("ferris".to_string()));
    }

    #[tokio::test]
    async fn test_reset_starts_over() {
        let (client, mock) = fixture_client();
        mock.expect(HttpMethod::Get, "/guilds/10/bans?limit=1").return_none();
        mock.expect(HttpMethod::Get, "/guilds/10/bans?limit=1").return_ok(json!([]));

        let pager = client.guild(Id(10)).bans().unwrap();
        assert!(pager.next_page(1, None).await.unwrap().is_empty());
        assert!(pager.is_exhausted());

        pager.reset();
        assert!(!pager.is_exhausted());
        assert!(pager.next_page(1, None).await.unwrap().is_empty());
        mock.verify();
    }

    #[tokio::test]
    async fn test_failed_page_keeps_cursor() {
        let (client, mock) = fixture_client();
        mock.expect(HttpMethod::Get, "/guilds/10/bans?limit=1")
            .return_ok(json!([ban_json(5, "a")]));
        mock.expect(HttpMethod::Get, "/guilds/10/bans?limit=1&after=5")
            .return_err("gateway timeout");

        let pager = client.guild(Id(10)).bans().unwrap();
        pager.next_page(1, None).await.unwrap();
        let err = pager.next_page(1, None).await.unwrap_err();
        assert!(matches!(err, FrameworkError::Transport(_)));
        assert_eq!(pager.cursor(), Some(Id(5)));
        assert!(!pager.is_exhausted());
    }
}
