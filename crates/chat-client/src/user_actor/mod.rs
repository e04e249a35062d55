//! # User Actor
//!
//! The simplest kind: users are global, derive nothing, and can only be
//! fetched. Profile changes arrive through `USER_UPDATE` or embedded in other
//! objects (bans, members).

use crate::model::UserModel;
use entity_framework::{CachePath, ConstructionContext, FrameworkError, Id, Kind, Route};

pub struct User;

impl Kind for User {
    const NAME: &'static str = "user";
    type Model = UserModel;
    type Derived = ();

    fn derive(_ctx: &ConstructionContext<'_, Self>, _model: &UserModel) -> Result<(), FrameworkError> {
        Ok(())
    }

    fn fetch_route(_path: &CachePath, id: Id) -> Result<Route, FrameworkError> {
        Ok(Route::get(format!("/users/{id}")))
    }
}
