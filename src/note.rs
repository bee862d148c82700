//! Note record: titled text linked to a contact, with a set of tags.
use chrono::{DateTime, NaiveDateTime, Utc};
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{dedup_tags, PaError, Record, Result};

/// Represents a single note in our system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Identifier drawn from the notes id sequence
    id: u64,
    /// Note title, unique ignoring case
    title: String,
    /// Name of the associated contact
    contact: String,
    /// Free text body
    content: String,
    /// Tags for organization, no duplicates
    tags: Vec<String>,
    /// When the note was created
    #[serde(deserialize_with = "deserialize_timestamp")]
    created_at: DateTime<Utc>,
    /// Last modification time
    #[serde(deserialize_with = "deserialize_timestamp")]
    updated_at: DateTime<Utc>,
}

impl Note {
    /// Creates a new note with the given id, rejecting empty fields.
    pub fn new(
        id: u64,
        title: impl Into<String>,
        contact: impl Into<String>,
        content: impl Into<String>,
        tags: Vec<String>,
    ) -> Result<Self> {
        let now = Utc::now();
        let note = Note {
            id,
            title: title.into(),
            contact: contact.into(),
            content: content.into(),
            tags: dedup_tags(tags),
            created_at: now,
            updated_at: now,
        };
        note.check_required()?;
        Ok(note)
    }

    fn check_required(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(PaError::EmptyField { field: "Title" });
        }
        if self.contact.trim().is_empty() {
            return Err(PaError::EmptyField { field: "Contact" });
        }
        if self.content.trim().is_empty() {
            return Err(PaError::EmptyField { field: "Content" });
        }
        Ok(())
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn contact(&self) -> &str {
        &self.contact
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Tags in lexicographic order
    pub fn sorted_tags(&self) -> Vec<String> {
        let mut tags = self.tags.clone();
        tags.sort();
        tags
    }

    /// Adds `tag`, returning false when it was already present.
    pub fn add_tag(&mut self, tag: &str) -> Result<bool> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(PaError::EmptyField { field: "Tag" });
        }
        if self.has_tag(tag) {
            return Ok(false);
        }
        self.tags.push(tag.to_string());
        self.touch();
        Ok(true)
    }

    /// Removes `tag`, returning false when it was not present.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        if self.tags.len() == before {
            return false;
        }
        self.touch();
        true
    }

    /// Replaces content and tags together.
    ///
    /// `None` or empty values keep the current field. Returns whether
    /// anything was replaced.
    pub fn replace(&mut self, content: Option<String>, tags: Option<Vec<String>>) -> bool {
        let content = content.filter(|c| !c.trim().is_empty());
        let tags = tags.map(dedup_tags).filter(|t| !t.is_empty());

        if content.is_none() && tags.is_none() {
            return false;
        }
        if let Some(content) = content {
            self.content = content;
        }
        if let Some(tags) = tags {
            self.tags = tags;
        }
        self.touch();
        true
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Record for Note {
    const KIND: &'static str = "note";
    const REQUIRED_FIELDS: &'static [&'static str] = &[
        "id",
        "title",
        "contact",
        "content",
        "created_at",
        "updated_at",
        "tags",
    ];

    fn from_raw(raw: Value) -> Result<Self> {
        let mut note: Note = serde_json::from_value(raw).map_err(|e| PaError::InvalidRecord {
            kind: Self::KIND,
            message: e.to_string(),
        })?;

        let unique = dedup_tags(note.tags.clone());
        if unique.len() != note.tags.len() {
            warn!("Note {} had duplicate or blank tags, keeping {:?}", note.id, unique);
            note.tags = unique;
        }

        note.check_required()?;
        Ok(note)
    }

    fn to_raw(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// ISO 8601 local time without an offset, as older note files store it
const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parses an RFC 3339 timestamp, or one without an offset taken as UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(stamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(stamp.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(value, NAIVE_TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| PaError::InvalidRecord {
            kind: Note::KIND,
            message: format!("invalid timestamp '{}': {}", value, e),
        })
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<DateTime<Utc>, D::Error> {
    let value = String::deserialize(deserializer)?;
    parse_timestamp(&value).map_err(serde::de::Error::custom)
}
