//! Domain model for the record shown on a card, and the merge that turns
//! possibly-partial upstream data into a fully-populated, renderable shape.

use serde::{Deserialize, Serialize};

use crate::{BlobId, LatLon, RecordId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    #[default]
    WantedPerson,
    MissingPerson,
    UnidentifiedDeceased,
    StolenProperty,
}

impl Category {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WantedPerson => "wanted-person",
            Self::MissingPerson => "missing-person",
            Self::UnidentifiedDeceased => "unidentified-deceased",
            Self::StolenProperty => "stolen-property",
        }
    }

    /// Fixed presentation config per category. Exhaustive by construction:
    /// adding a category without a badge fails to compile.
    #[must_use]
    pub const fn badge(self) -> Badge {
        match self {
            Self::WantedPerson => Badge {
                label: "Wanted",
                icon: "gavel",
                color: "badge-red",
            },
            Self::MissingPerson => Badge {
                label: "Missing",
                icon: "person-search",
                color: "badge-amber",
            },
            Self::UnidentifiedDeceased => Badge {
                label: "Unidentified",
                icon: "question-mark",
                color: "badge-slate",
            },
            Self::StolenProperty => Badge {
                label: "Stolen",
                icon: "package",
                color: "badge-blue",
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Normal,
    Urgent,
    New,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Urgent => "urgent",
            Self::New => "new",
        }
    }

    #[must_use]
    pub const fn badge(self) -> Badge {
        match self {
            Self::Normal => Badge {
                label: "Case",
                icon: "file",
                color: "badge-neutral",
            },
            Self::Urgent => Badge {
                label: "Urgent",
                icon: "alert",
                color: "badge-red",
            },
            Self::New => Badge {
                label: "New",
                icon: "sparkle",
                color: "badge-green",
            },
        }
    }
}

/// Presentation config resolved from a category or priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub label: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

/// Don't store image bytes. Store a handle with metadata; the display URL
/// is minted by the shell and tracked in [`crate::object_url::ObjectUrlCache`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRef {
    pub id: BlobId,
    pub mime_type: Option<String>,
    pub size_bytes: Option<u64>,
}

impl BlobRef {
    #[must_use]
    pub fn new(id: BlobId) -> Self {
        Self {
            id,
            mime_type: None,
            size_bytes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaRef {
    Remote { url: String },
    Local { blob: BlobRef },
}

impl MediaRef {
    #[must_use]
    pub fn remote(url: impl Into<String>) -> Self {
        Self::Remote { url: url.into() }
    }

    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Local { .. })
    }

    #[must_use]
    pub fn blob_id(&self) -> Option<&BlobId> {
        match self {
            Self::Local { blob } => Some(&blob.id),
            Self::Remote { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MediaSet {
    pub primary: Option<MediaRef>,
    pub gallery: Vec<MediaRef>,
}

impl MediaSet {
    pub fn iter(&self) -> impl Iterator<Item = &MediaRef> {
        self.primary.iter().chain(self.gallery.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ContactBlock {
    pub person: String,
    pub phone: String,
    pub email: String,
    pub department: String,
    pub availability: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub category: Category,
    pub priority: Priority,
    pub title: String,
    pub short_description: String,
    pub long_description: String,
    pub features: String,
    pub tags: Vec<String>,
    pub media: MediaSet,
    /// Free-text address. Resolved coordinates are derived at render time,
    /// never stored on the record.
    pub main_location: Option<String>,
    /// Imported records may carry coordinates without any address text.
    pub coordinates: Option<LatLon>,
    pub contact: ContactBlock,
}

impl Record {
    /// The well-known fallback shown until (or instead of) real data.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            id: RecordId::new("unknown"),
            category: Category::WantedPerson,
            priority: Priority::Normal,
            title: "Unnamed case".into(),
            short_description: "No summary available yet.".into(),
            long_description: "Details for this case have not been published yet.".into(),
            features: String::new(),
            tags: Vec::new(),
            media: MediaSet::default(),
            main_location: None,
            coordinates: None,
            contact: ContactBlock {
                person: "Duty desk".into(),
                phone: "+49 711 8990-0".into(),
                email: "hinweise@polizei.example".into(),
                department: "Criminal Investigation".into(),
                availability: "Mon-Fri 08:00-18:00".into(),
            },
        }
    }

    /// Insert a tag, dropping duplicates while keeping first-seen order.
    pub fn insert_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.iter().any(|t| t == &tag) {
            self.tags.push(tag);
        }
    }

    #[must_use]
    pub fn description_preview(&self, max_len: usize) -> String {
        preview(&self.short_description, max_len)
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::fallback()
    }
}

#[must_use]
pub fn preview(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max_len.saturating_sub(3)).collect();
        out.push_str("...");
        out
    }
}

/// Upstream payload: every field optional, unknown fields ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PartialRecord {
    pub id: Option<RecordId>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub title: Option<String>,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub features: Option<String>,
    pub tags: Option<Vec<String>>,
    pub primary_image: Option<MediaRef>,
    pub gallery: Option<Vec<MediaRef>>,
    pub main_location: Option<String>,
    pub coordinates: Option<LatLon>,
    pub contact: Option<PartialContact>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PartialContact {
    pub person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    pub availability: Option<String>,
}

/// Field-level merge: prefer the partial's value when present, else the
/// fallback's. Nested contact info merges per sub-field; a partial contact
/// with only a phone number keeps the fallback's email. Total: never
/// panics, ignores nothing it recognizes, invents nothing.
#[must_use]
pub fn merge(partial: Option<&PartialRecord>, fallback: &Record) -> Record {
    let Some(p) = partial else {
        return fallback.clone();
    };

    let mut tags = Vec::new();
    for tag in p.tags.as_deref().unwrap_or(&fallback.tags) {
        if !tags.iter().any(|t: &String| t == tag) {
            tags.push(tag.clone());
        }
    }

    Record {
        id: p.id.clone().unwrap_or_else(|| fallback.id.clone()),
        category: p.category.unwrap_or(fallback.category),
        priority: p.priority.unwrap_or(fallback.priority),
        title: p.title.clone().unwrap_or_else(|| fallback.title.clone()),
        short_description: p
            .short_description
            .clone()
            .unwrap_or_else(|| fallback.short_description.clone()),
        long_description: p
            .long_description
            .clone()
            .unwrap_or_else(|| fallback.long_description.clone()),
        features: p
            .features
            .clone()
            .unwrap_or_else(|| fallback.features.clone()),
        tags,
        media: MediaSet {
            primary: p
                .primary_image
                .clone()
                .or_else(|| fallback.media.primary.clone()),
            gallery: p
                .gallery
                .clone()
                .unwrap_or_else(|| fallback.media.gallery.clone()),
        },
        main_location: p
            .main_location
            .clone()
            .or_else(|| fallback.main_location.clone()),
        coordinates: p.coordinates.or(fallback.coordinates),
        contact: merge_contact(p.contact.as_ref(), &fallback.contact),
    }
}

fn merge_contact(partial: Option<&PartialContact>, fallback: &ContactBlock) -> ContactBlock {
    let Some(p) = partial else {
        return fallback.clone();
    };
    ContactBlock {
        person: p.person.clone().unwrap_or_else(|| fallback.person.clone()),
        phone: p.phone.clone().unwrap_or_else(|| fallback.phone.clone()),
        email: p.email.clone().unwrap_or_else(|| fallback.email.clone()),
        department: p
            .department
            .clone()
            .unwrap_or_else(|| fallback.department.clone()),
        availability: p
            .availability
            .clone()
            .unwrap_or_else(|| fallback.availability.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn merge_with_no_partial_returns_fallback() {
        let fallback = Record::fallback();
        assert_eq!(merge(None, &fallback), fallback);
    }

    #[test]
    fn merge_prefers_partial_values_field_by_field() {
        let fallback = Record::fallback();
        let partial = PartialRecord {
            title: Some("Robbery, Königstraße".into()),
            priority: Some(Priority::Urgent),
            ..PartialRecord::default()
        };
        let merged = merge(Some(&partial), &fallback);
        assert_eq!(merged.title, "Robbery, Königstraße");
        assert_eq!(merged.priority, Priority::Urgent);
        assert_eq!(merged.short_description, fallback.short_description);
        assert_eq!(merged.contact, fallback.contact);
    }

    #[test]
    fn merge_nested_contact_is_per_field_not_whole_object() {
        let fallback = Record::fallback();
        let partial = PartialRecord {
            contact: Some(PartialContact {
                phone: Some("+49 711 555-1234".into()),
                ..PartialContact::default()
            }),
            ..PartialRecord::default()
        };
        let merged = merge(Some(&partial), &fallback);
        assert_eq!(merged.contact.phone, "+49 711 555-1234");
        assert_eq!(merged.contact.email, fallback.contact.email);
        assert_eq!(merged.contact.department, fallback.contact.department);
    }

    #[test]
    fn merge_dedupes_incoming_tags() {
        let fallback = Record::fallback();
        let partial = PartialRecord {
            tags: Some(vec!["fraud".into(), "downtown".into(), "fraud".into()]),
            ..PartialRecord::default()
        };
        let merged = merge(Some(&partial), &fallback);
        assert_eq!(merged.tags, vec!["fraud".to_string(), "downtown".into()]);
    }

    #[test]
    fn insert_tag_ignores_duplicates() {
        let mut record = Record::fallback();
        record.insert_tag("burglary");
        record.insert_tag("burglary");
        assert_eq!(record.tags, vec!["burglary".to_string()]);
    }

    #[test]
    fn unknown_json_fields_are_ignored() {
        let payload = r#"{
            "title": "Pickpocketing series",
            "internal_flag": true,
            "rows_affected": 3
        }"#;
        let partial: PartialRecord = serde_json::from_str(payload).unwrap();
        assert_eq!(partial.title.as_deref(), Some("Pickpocketing series"));
    }

    #[test]
    fn preview_truncates_on_char_boundaries() {
        let text = "Tätergruppe flüchtete über die Königstraße";
        let p = preview(text, 20);
        assert!(p.ends_with("..."));
        assert!(p.chars().count() <= 20);
    }

    fn arb_partial() -> impl Strategy<Value = PartialRecord> {
        (
            proptest::option::of(".{0,40}"),
            proptest::option::of(".{0,40}"),
            proptest::option::of(prop_oneof![
                Just(Category::WantedPerson),
                Just(Category::MissingPerson),
                Just(Category::UnidentifiedDeceased),
                Just(Category::StolenProperty),
            ]),
            proptest::option::of(prop_oneof![
                Just(Priority::Normal),
                Just(Priority::Urgent),
                Just(Priority::New),
            ]),
            proptest::option::of(proptest::collection::vec(".{0,12}", 0..6)),
            proptest::option::of((
                proptest::option::of(".{0,20}"),
                proptest::option::of(".{0,20}"),
            )),
        )
            .prop_map(|(title, location, category, priority, tags, contact)| {
                PartialRecord {
                    title,
                    main_location: location,
                    category,
                    priority,
                    tags,
                    contact: contact.map(|(person, phone)| PartialContact {
                        person,
                        phone,
                        ..PartialContact::default()
                    }),
                    ..PartialRecord::default()
                }
            })
    }

    proptest! {
        // Merge totality: whatever the upstream sends, every rendered field
        // is populated from either the partial or the fallback, never left
        // unset.
        #[test]
        fn merge_is_total(partial in proptest::option::of(arb_partial())) {
            let fallback = Record::fallback();
            let merged = merge(partial.as_ref(), &fallback);

            let expected_title = partial
                .as_ref()
                .and_then(|p| p.title.clone())
                .unwrap_or_else(|| fallback.title.clone());
            prop_assert_eq!(&merged.title, &expected_title);

            let expected_person = partial
                .as_ref()
                .and_then(|p| p.contact.as_ref())
                .and_then(|c| c.person.clone())
                .unwrap_or_else(|| fallback.contact.person.clone());
            prop_assert_eq!(&merged.contact.person, &expected_person);

            prop_assert!(!merged.id.as_str().is_empty());
            for (i, tag) in merged.tags.iter().enumerate() {
                prop_assert!(!merged.tags[..i].contains(tag), "duplicate tag survived merge");
            }
        }
    }
}
