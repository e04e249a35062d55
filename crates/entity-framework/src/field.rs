//! # Specified vs. Unspecified Fields
//!
//! A decoded model rarely carries every field: partial Gateway payloads and
//! sparse REST objects leave keys out. [`Field`] keeps "the wire said nothing"
//! apart from "the wire said null", so folding a delta never clears data it has
//! no information about.
//!
//! Nullable wire fields are written as `Field<Option<T>>`:
//!
//! | JSON            | Decoded                      |
//! |-----------------|------------------------------|
//! | key absent      | `Field::Unspecified`         |
//! | `"topic": null` | `Field::Specified(None)`     |
//! | `"topic": "x"`  | `Field::Specified(Some(..))` |
//!
//! Model fields must be annotated with
//! `#[serde(default, skip_serializing_if = "Field::is_unspecified")]`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A model field that may or may not have been present on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field<T> {
    Unspecified,
    Specified(T),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Unspecified
    }
}

impl<T> Field<T> {
    pub fn is_specified(&self) -> bool {
        matches!(self, Field::Specified(_))
    }

    pub fn is_unspecified(&self) -> bool {
        matches!(self, Field::Unspecified)
    }

    pub fn as_ref(&self) -> Field<&T> {
        match self {
            Field::Specified(value) => Field::Specified(value),
            Field::Unspecified => Field::Unspecified,
        }
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Field::Specified(value) => Some(value),
            Field::Unspecified => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Field::Specified(value) => Some(value),
            Field::Unspecified => None,
        }
    }

    /// Folds `delta` into `self`. An unspecified delta leaves `self` untouched.
    pub fn merge(&mut self, delta: Field<T>) {
        if let Field::Specified(value) = delta {
            *self = Field::Specified(value);
        }
    }
}

impl<T> Field<Option<T>> {
    /// Flattens a nullable field: unspecified and null both read as `None`.
    pub fn flatten(&self) -> Option<&T> {
        match self {
            Field::Specified(Some(value)) => Some(value),
            _ => None,
        }
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Field::Specified(value)
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Specified(value) => value.serialize(serializer),
            Field::Unspecified => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Field::Specified)
    }
}

/// Implements [`EntityModel::apply`](crate::model::EntityModel::apply) by merging a
/// list of [`Field`]s from `delta` into `target`.
///
/// ```rust
/// use entity_framework::{fold_fields, Field};
///
/// struct Topic { name: Field<String>, topic: Field<Option<String>> }
///
/// let mut current = Topic { name: "a".to_string().into(), topic: Some("t".to_string()).into() };
/// let delta = Topic { name: "b".to_string().into(), topic: Field::Unspecified };
/// fold_fields!(current, delta; name, topic);
///
/// assert_eq!(current.name.get().map(String::as_str), Some("b"));
/// assert_eq!(current.topic.flatten().map(String::as_str), Some("t"));
/// ```
#[macro_export]
macro_rules! fold_fields {
    ($target:expr, $delta:expr; $($field:ident),+ $(,)?) => {
        $( $target.$field.merge($delta.$field); )+
    };
}
