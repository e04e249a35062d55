//! # Test Fixtures
//!
//! Two small kinds for exercising the engine without a real platform:
//! top-level [`Folder`]s and [`Note`]s that live inside a folder. Routes follow
//! the `/folders/{folder}/notes/{note}` shape.

use crate::client::Client;
use crate::config::ClientConfig;
use crate::entity::ConstructionContext;
use crate::error::FrameworkError;
use crate::field::Field;
use crate::fold_fields;
use crate::id::Id;
use crate::kind::Kind;
use crate::mock::MockTransport;
use crate::model::EntityModel;
use crate::path::CachePath;
use crate::transport::Route;
use crate::actor::Actor;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderModel {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub name: Field<String>,
}

impl EntityModel for FolderModel {
    fn id(&self) -> Id {
        self.id
    }

    fn apply(&mut self, delta: Self) {
        fold_fields!(self, delta; name);
    }
}

pub struct Folder;

impl Kind for Folder {
    const NAME: &'static str = "folder";
    type Model = FolderModel;
    type Derived = ();

    fn derive(_ctx: &ConstructionContext<'_, Self>, _model: &FolderModel) -> Result<(), FrameworkError> {
        Ok(())
    }

    fn fetch_route(_path: &CachePath, id: Id) -> Result<Route, FrameworkError> {
        Ok(Route::get(format!("/folders/{id}")))
    }

    fn delete_route(_path: &CachePath, id: Id) -> Result<Route, FrameworkError> {
        Ok(Route::delete(format!("/folders/{id}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteModel {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub title: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub body: Field<Option<String>>,
    #[serde(default, skip_serializing_if = "Field::is_unspecified")]
    pub pinned: Field<bool>,
}

impl NoteModel {
    /// A delta carrying nothing but the id.
    pub fn empty(id: Id) -> Self {
        Self {
            id,
            title: Field::Unspecified,
            body: Field::Unspecified,
            pinned: Field::Unspecified,
        }
    }
}

impl EntityModel for NoteModel {
    fn id(&self) -> Id {
        self.id
    }

    fn apply(&mut self, delta: Self) {
        fold_fields!(self, delta; title, body, pinned);
    }
}

#[derive(Debug, Clone)]
pub struct NoteLinks {
    pub folder: Actor<Folder>,
}

pub struct Note;

impl Kind for Note {
    const NAME: &'static str = "note";
    type Model = NoteModel;
    type Derived = NoteLinks;

    fn derive(ctx: &ConstructionContext<'_, Self>, model: &NoteModel) -> Result<NoteLinks, FrameworkError> {
        let folder_id = ctx.path().require::<Folder>(Self::NAME, model.id)?;
        Ok(NoteLinks {
            folder: ctx.actor_of::<Folder>(CachePath::root(), folder_id),
        })
    }

    fn fetch_route(path: &CachePath, id: Id) -> Result<Route, FrameworkError> {
        let folder_id = path.require::<Folder>(Self::NAME, id)?;
        Ok(Route::get(format!("/folders/{folder_id}/notes/{id}")))
    }

    fn modify_route(path: &CachePath, id: Id) -> Result<Route, FrameworkError> {
        let folder_id = path.require::<Folder>(Self::NAME, id)?;
        Ok(Route::patch(format!("/folders/{folder_id}/notes/{id}")))
    }

    fn delete_route(path: &CachePath, id: Id) -> Result<Route, FrameworkError> {
        let folder_id = path.require::<Folder>(Self::NAME, id)?;
        Ok(Route::delete(format!("/folders/{folder_id}/notes/{id}")))
    }
}

pub fn folder(id: u64, name: &str) -> FolderModel {
    FolderModel {
        id: Id(id),
        name: Field::Specified(name.to_string()),
    }
}

/// A full note model with a title and no body.
pub fn note(id: u64, title: &str) -> NoteModel {
    NoteModel {
        id: Id(id),
        title: Field::Specified(title.to_string()),
        body: Field::Specified(None),
        pinned: Field::Specified(false),
    }
}

pub fn folder_path(id: u64) -> CachePath {
    CachePath::of::<Folder>(Id(id))
}

/// A client over a fresh [`MockTransport`], plus the mock for scripting.
pub fn fixture_client() -> (Client, MockTransport) {
    let mock = MockTransport::new();
    let client = Client::new(Arc::new(mock.clone()), ClientConfig::default());
    (client, mock)
}
