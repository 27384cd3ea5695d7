//! SuperHero entity, transport record, and partial-update object
//!
//! - [`SuperHero`] is the persisted record. Its identity is the store-assigned `id`.
//! - [`SuperHeroDto`] is the JSON shape exchanged over HTTP.
//! - [`SuperHeroPatch`] describes a partial update: each field is either
//!   [`FieldPatch::Unchanged`] or [`FieldPatch::Set`].
//!
//! Equality on both [`SuperHero`] and [`SuperHeroDto`] is identity-based: two
//! values are equal only when both carry the same `Some(id)`. A value without an
//! id is unequal to everything, itself included, so neither type implements `Eq`.
//!
//! # Example
//!
//! ```rust
//! use hero_service::domain::{FieldPatch, SuperHero, SuperHeroPatch};
//!
//! let mut hero = SuperHero::new()
//!     .with_id(1)
//!     .with_name("Storm")
//!     .with_age(30)
//!     .with_superpower("weather");
//!
//! hero.apply_patch(SuperHeroPatch {
//!     name: FieldPatch::Set("Ororo".to_string()),
//!     ..SuperHeroPatch::default()
//! });
//!
//! assert_eq!(hero.name.as_deref(), Some("Ororo"));
//! assert_eq!(hero.age, Some(30));
//! ```

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Entity name used in alert headers and error payloads
pub const ENTITY_NAME: &str = "superHero";

/// A persisted SuperHero record
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct SuperHero {
    /// Store-assigned identifier, `None` until the record is first saved
    pub id: Option<i64>,
    /// Display name
    pub name: Option<String>,
    /// Age in years
    pub age: Option<i32>,
    /// Superpower description
    pub superpower: Option<String>,
}

impl SuperHero {
    /// Create an empty, unsaved record
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identifier
    #[must_use]
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the age
    #[must_use]
    pub fn with_age(mut self, age: i32) -> Self {
        self.age = Some(age);
        self
    }

    /// Set the superpower
    #[must_use]
    pub fn with_superpower(mut self, superpower: impl Into<String>) -> Self {
        self.superpower = Some(superpower.into());
        self
    }

    /// Copy every `Set` field of the patch onto this record
    ///
    /// `Unchanged` fields and the patch's `id` are ignored.
    pub fn apply_patch(&mut self, patch: SuperHeroPatch) {
        patch.name.apply_to(&mut self.name);
        patch.age.apply_to(&mut self.age);
        patch.superpower.apply_to(&mut self.superpower);
    }
}

impl PartialEq for SuperHero {
    fn eq(&self, other: &Self) -> bool {
        matches!((self.id, other.id), (Some(a), Some(b)) if a == b)
    }
}

impl fmt::Display for SuperHero {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SuperHero")?;
        write_fields(f, self.id, &self.name, self.age, &self.superpower)
    }
}

/// Transport representation of a SuperHero
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuperHeroDto {
    /// Identifier, absent on create requests
    pub id: Option<i64>,
    /// Display name
    pub name: Option<String>,
    /// Age in years
    pub age: Option<i32>,
    /// Superpower description
    pub superpower: Option<String>,
}

impl PartialEq for SuperHeroDto {
    fn eq(&self, other: &Self) -> bool {
        matches!((self.id, other.id), (Some(a), Some(b)) if a == b)
    }
}

impl fmt::Display for SuperHeroDto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SuperHeroDto")?;
        write_fields(f, self.id, &self.name, self.age, &self.superpower)
    }
}

fn write_fields(
    f: &mut fmt::Formatter<'_>,
    id: Option<i64>,
    name: &Option<String>,
    age: Option<i32>,
    superpower: &Option<String>,
) -> fmt::Result {
    write!(f, "{{id=")?;
    match id {
        Some(id) => write!(f, "{}", id)?,
        None => write!(f, "null")?,
    }
    match name {
        Some(name) => write!(f, ", name='{}'", name)?,
        None => write!(f, ", name=null")?,
    }
    match age {
        Some(age) => write!(f, ", age={}", age)?,
        None => write!(f, ", age=null")?,
    }
    match superpower {
        Some(superpower) => write!(f, ", superpower='{}'", superpower)?,
        None => write!(f, ", superpower=null")?,
    }
    write!(f, "}}")
}

impl From<SuperHero> for SuperHeroDto {
    fn from(entity: SuperHero) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            age: entity.age,
            superpower: entity.superpower,
        }
    }
}

impl From<SuperHeroDto> for SuperHero {
    fn from(dto: SuperHeroDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            age: dto.age,
            superpower: dto.superpower,
        }
    }
}

/// A single field of a partial update
///
/// JSON `null` and a missing key both decode to [`FieldPatch::Unchanged`].
/// A patch cannot clear a field; a full update does that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPatch<T> {
    /// Leave the stored value as is
    Unchanged,
    /// Overwrite the stored value
    Set(T),
}

impl<T> Default for FieldPatch<T> {
    fn default() -> Self {
        Self::Unchanged
    }
}

impl<T> FieldPatch<T> {
    /// Whether this field will overwrite the stored value
    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    /// Write the value into `target` when set
    pub fn apply_to(self, target: &mut Option<T>) {
        if let Self::Set(value) = self {
            *target = Some(value);
        }
    }
}

impl<T> From<Option<T>> for FieldPatch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Set(value),
            None => Self::Unchanged,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for FieldPatch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Self::from)
    }
}

impl<T: Serialize> Serialize for FieldPatch<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Set(value) => serializer.serialize_some(value),
            Self::Unchanged => serializer.serialize_none(),
        }
    }
}

/// Partial update of a SuperHero
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuperHeroPatch {
    /// Identifier carried by the request body, checked against the path
    #[serde(default)]
    pub id: Option<i64>,
    /// New name
    #[serde(default)]
    pub name: FieldPatch<String>,
    /// New age
    #[serde(default)]
    pub age: FieldPatch<i32>,
    /// New superpower
    #[serde(default)]
    pub superpower: FieldPatch<String>,
}

impl SuperHeroPatch {
    /// Whether any field would change
    pub fn has_updates(&self) -> bool {
        self.name.is_set() || self.age.is_set() || self.superpower.is_set()
    }
}

impl From<SuperHeroDto> for SuperHeroPatch {
    fn from(dto: SuperHeroDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name.into(),
            age: dto.age.into(),
            superpower: dto.superpower.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hero() -> SuperHero {
        SuperHero::new()
            .with_id(1)
            .with_name("AAAAAAAAAA")
            .with_age(1)
            .with_superpower("AAAAAAAAAA")
    }

    #[test]
    fn test_entity_equality_is_identity_based() {
        let a = hero();
        let b = SuperHero::new().with_id(1).with_name("other");
        assert_eq!(a, b);

        let c = SuperHero::new().with_id(2).with_name("AAAAAAAAAA");
        assert_ne!(a, c);
    }

    #[test]
    fn test_unsaved_entity_is_never_equal() {
        let unsaved = SuperHero::new().with_name("AAAAAAAAAA");
        assert_ne!(unsaved, unsaved.clone());
        assert_ne!(unsaved, hero());
        assert_ne!(hero(), unsaved);
    }

    #[test]
    fn test_dto_equality_requires_both_ids() {
        let a = SuperHeroDto {
            id: Some(1),
            ..SuperHeroDto::default()
        };
        let b = SuperHeroDto {
            id: Some(1),
            name: Some("different".to_string()),
            ..SuperHeroDto::default()
        };
        assert_eq!(a, b);

        let c = SuperHeroDto {
            id: Some(2),
            ..SuperHeroDto::default()
        };
        assert_ne!(a, c);

        let empty = SuperHeroDto::default();
        assert_ne!(a, empty);
        assert_ne!(empty, empty.clone());
    }

    #[test]
    fn test_mapping_copies_every_field() {
        let dto = SuperHeroDto::from(hero());
        assert_eq!(dto.id, Some(1));
        assert_eq!(dto.name.as_deref(), Some("AAAAAAAAAA"));
        assert_eq!(dto.age, Some(1));
        assert_eq!(dto.superpower.as_deref(), Some("AAAAAAAAAA"));

        let entity = SuperHero::from(dto);
        assert_eq!(entity.id, Some(1));
        assert_eq!(entity.age, Some(1));
    }

    #[test]
    fn test_apply_patch_only_touches_set_fields() {
        let mut entity = hero();
        entity.apply_patch(SuperHeroPatch {
            id: Some(99),
            name: FieldPatch::Set("BBBBBBBBBB".to_string()),
            ..SuperHeroPatch::default()
        });

        assert_eq!(entity.id, Some(1));
        assert_eq!(entity.name.as_deref(), Some("BBBBBBBBBB"));
        assert_eq!(entity.age, Some(1));
        assert_eq!(entity.superpower.as_deref(), Some("AAAAAAAAAA"));
    }

    #[test]
    fn test_patch_from_dto_skips_null_fields() {
        let patch = SuperHeroPatch::from(SuperHeroDto {
            id: Some(1),
            name: None,
            age: Some(2),
            superpower: None,
        });
        assert_eq!(patch.name, FieldPatch::Unchanged);
        assert_eq!(patch.age, FieldPatch::Set(2));
        assert!(patch.has_updates());
    }

    #[test]
    fn test_patch_json_null_and_missing_are_unchanged() {
        let patch: SuperHeroPatch =
            serde_json::from_str(r#"{"id": 3, "name": null, "age": 40}"#).unwrap();
        assert_eq!(patch.id, Some(3));
        assert_eq!(patch.name, FieldPatch::Unchanged);
        assert_eq!(patch.age, FieldPatch::Set(40));
        assert_eq!(patch.superpower, FieldPatch::Unchanged);
    }

    #[test]
    fn test_empty_patch_has_no_updates() {
        let patch: SuperHeroPatch = serde_json::from_str(r#"{"id": 3}"#).unwrap();
        assert!(!patch.has_updates());
    }

    #[test]
    fn test_dto_json_shape() {
        let dto = SuperHeroDto::from(hero());
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 1,
                "name": "AAAAAAAAAA",
                "age": 1,
                "superpower": "AAAAAAAAAA"
            })
        );
    }

    #[test]
    fn test_display_rendering() {
        let dto = SuperHeroDto {
            id: Some(1),
            name: Some("A".to_string()),
            age: None,
            superpower: Some("fly".to_string()),
        };
        assert_eq!(
            dto.to_string(),
            "SuperHeroDto{id=1, name='A', age=null, superpower='fly'}"
        );
        assert_eq!(
            SuperHero::new().to_string(),
            "SuperHero{id=null, name=null, age=null, superpower=null}"
        );
    }
}
