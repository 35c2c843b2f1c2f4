//! Accommodation model

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

/// An opaque accommodation identifier.
///
/// Items written by other clients may carry any non-empty string here, so the
/// value is never interpreted. Fresh ids are UUID v7 (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccommodationId(String);

impl AccommodationId {
    /// Create a new unique accommodation ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AccommodationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccommodationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AccommodationId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        if value.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Accommodation id cannot be empty".to_string(),
            ));
        }
        Ok(Self(value))
    }
}

impl From<AccommodationId> for String {
    fn from(value: AccommodationId) -> Self {
        value.0
    }
}

impl FromStr for AccommodationId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::try_from(s.to_string())
    }
}

/// Who put an accommodation on the list. Display-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Entered by a person
    #[default]
    User,
    /// Proposed by the suggestion provider
    Ai,
}

/// An image attached to an accommodation.
///
/// Serialized as a plain string: either a `data:` URL carrying the encoded
/// image inline, or an external URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ImageSource {
    /// Inline `data:` URL
    Embedded(String),
    /// External image URL
    External(String),
}

impl ImageSource {
    /// The string form stored in the document.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Embedded(value) | Self::External(value) => value,
        }
    }

    pub const fn is_embedded(&self) -> bool {
        matches!(self, Self::Embedded(_))
    }
}

impl From<String> for ImageSource {
    fn from(value: String) -> Self {
        if value.starts_with("data:") {
            Self::Embedded(value)
        } else {
            Self::External(value)
        }
    }
}

impl From<ImageSource> for String {
    fn from(value: ImageSource) -> Self {
        match value {
            ImageSource::Embedded(value) | ImageSource::External(value) => value,
        }
    }
}

/// A candidate place to stay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accommodation {
    /// Unique identifier, stable for the lifetime of the entity
    pub id: AccommodationId,
    #[serde(default)]
    pub name: String,
    /// Free-form price as shown to people (e.g. "1500" or "1200-1800")
    #[serde(default, deserialize_with = "price_from_string_or_number")]
    pub price: String,
    /// Booking or search link
    #[serde(default)]
    pub link: String,
    /// Map link
    #[serde(default)]
    pub location_link: String,
    #[serde(default)]
    pub images: Vec<ImageSource>,
    #[serde(default)]
    pub notes: String,
    /// Anonymous, unlimited vote counter
    #[serde(default)]
    pub votes: u32,
    #[serde(default)]
    pub added_by: Origin,
}

impl Accommodation {
    /// Whether this entry came from the suggestion provider
    pub fn is_suggested(&self) -> bool {
        self.added_by == Origin::Ai
    }

    /// Overwrite the descriptive fields from a draft, keeping id, votes and origin.
    pub fn apply_draft(&mut self, draft: AccommodationDraft) -> Result<()> {
        let draft = draft.validated()?;
        self.name = draft.name;
        self.price = draft.price;
        self.link = draft.link;
        self.location_link = draft.location_link;
        self.images = draft.images;
        self.notes = draft.notes;
        Ok(())
    }
}

/// The descriptive part of an accommodation, as entered by a person or
/// returned by the suggestion provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccommodationDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "price_from_string_or_number")]
    pub price: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub location_link: String,
    #[serde(default, deserialize_with = "images_or_null")]
    pub images: Vec<ImageSource>,
    #[serde(default)]
    pub notes: String,
}

impl AccommodationDraft {
    /// Create a draft with just a name
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = price.into();
        self
    }

    /// Trim text fields and reject drafts without a name.
    pub fn validated(self) -> Result<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::InvalidInput(
                "Accommodation name cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            name,
            price: self.price.trim().to_string(),
            link: self.link.trim().to_string(),
            location_link: self.location_link.trim().to_string(),
            images: self.images,
            notes: self.notes.trim().to_string(),
        })
    }

    /// Turn the draft into a new accommodation with a fresh id and no votes.
    pub fn into_accommodation(self, origin: Origin) -> Result<Accommodation> {
        let draft = self.validated()?;
        Ok(Accommodation {
            id: AccommodationId::new(),
            name: draft.name,
            price: draft.price,
            link: draft.link,
            location_link: draft.location_link,
            images: draft.images,
            notes: draft.notes,
            votes: 0,
            added_by: origin,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PriceValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

fn price_from_string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<PriceValue>::deserialize(deserializer)?;
    Ok(match value {
        None => String::new(),
        Some(PriceValue::Text(text)) => text,
        Some(PriceValue::Integer(number)) => number.to_string(),
        Some(PriceValue::Float(number)) => number.to_string(),
    })
}

fn images_or_null<'de, D>(deserializer: D) -> std::result::Result<Vec<ImageSource>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<ImageSource>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_accommodation_id_unique() {
        assert_ne!(AccommodationId::new(), AccommodationId::new());
    }

    #[test]
    fn test_accommodation_id_parse() {
        let id = AccommodationId::new();
        let parsed: AccommodationId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_accommodation_id_is_opaque() {
        let id: AccommodationId = "p-1700000000000".parse().unwrap();
        assert_eq!(id.as_str(), "p-1700000000000");
        assert!(matches!(
            "  ".parse::<AccommodationId>(),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_items_from_other_clients_keep_their_ids() {
        let json = r#"{"id": "p-1700000000000", "name": "Baan Suan", "votes": 2}"#;
        let place: Accommodation = serde_json::from_str(json).unwrap();
        assert_eq!(place.id.as_str(), "p-1700000000000");

        let value = serde_json::to_value(&place).unwrap();
        assert_eq!(value["id"], "p-1700000000000");

        let empty = r#"{"id": "", "name": "Nameless"}"#;
        assert!(serde_json::from_str::<Accommodation>(empty).is_err());
    }

    #[test]
    fn test_draft_into_accommodation() {
        let place = AccommodationDraft::named("  Seaside Hut ")
            .with_price("1500")
            .into_accommodation(Origin::User)
            .unwrap();
        assert_eq!(place.name, "Seaside Hut");
        assert_eq!(place.price, "1500");
        assert_eq!(place.votes, 0);
        assert_eq!(place.added_by, Origin::User);
    }

    #[test]
    fn test_draft_requires_name() {
        let err = AccommodationDraft::named("   ")
            .into_accommodation(Origin::User)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_apply_draft_keeps_identity_and_votes() {
        let mut place = AccommodationDraft::named("Old")
            .into_accommodation(Origin::Ai)
            .unwrap();
        place.votes = 4;
        let id = place.id.clone();

        place
            .apply_draft(AccommodationDraft::named("New").with_price("900"))
            .unwrap();

        assert_eq!(place.id, id);
        assert_eq!(place.votes, 4);
        assert_eq!(place.added_by, Origin::Ai);
        assert_eq!(place.name, "New");
        assert_eq!(place.price, "900");
    }

    #[test]
    fn test_document_format_is_compatible() {
        let json = r#"{
            "id": "0190a1b2-c3d4-7e5f-8a9b-0c1d2e3f4a5b",
            "name": "Rimtalay Resort",
            "price": 1800,
            "link": "https://example.com/rimtalay",
            "locationLink": "https://maps.example.com/?q=rimtalay",
            "images": ["data:image/jpeg;base64,AAAA", "https://img.example.com/1.jpg"],
            "notes": "BBQ allowed",
            "votes": 3,
            "addedBy": "ai"
        }"#;

        let place: Accommodation = serde_json::from_str(json).unwrap();
        assert_eq!(place.price, "1800");
        assert_eq!(place.location_link, "https://maps.example.com/?q=rimtalay");
        assert!(place.images[0].is_embedded());
        assert!(!place.images[1].is_embedded());
        assert_eq!(place.votes, 3);
        assert!(place.is_suggested());

        let value = serde_json::to_value(&place).unwrap();
        assert_eq!(value["locationLink"], "https://maps.example.com/?q=rimtalay");
        assert_eq!(value["addedBy"], "ai");
        assert_eq!(value["images"][1], "https://img.example.com/1.jpg");
    }

    #[test]
    fn test_missing_fields_are_tolerated() {
        let json = r#"{"id": "0190a1b2-c3d4-7e5f-8a9b-0c1d2e3f4a5b", "name": "Bare"}"#;
        let place: Accommodation = serde_json::from_str(json).unwrap();
        assert_eq!(place.votes, 0);
        assert!(place.images.is_empty());
        assert_eq!(place.added_by, Origin::User);
    }

    #[test]
    fn test_draft_accepts_null_images() {
        let json = r#"{"name": "Ban Rin", "price": "2500", "images": null}"#;
        let draft: AccommodationDraft = serde_json::from_str(json).unwrap();
        assert!(draft.images.is_empty());
    }
}
