//! Metadata document model.
//!
//! A [`MetadataDocument`] is the unit the query engine filters. Its JSON shape
//! is the storage boundary format: both backends read and write exactly this
//! shape, which is what makes migration lossless.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::fields::FieldSlot;

// =============================================================================
// ENUMERATED ATTRIBUTES
// =============================================================================

/// Publication status of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Draft,
    Published,
    Archived,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            _ => Err(Error::InvalidValue(format!("unknown status '{}'", s))),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(Error::InvalidValue(format!("unknown priority '{}'", s))),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// DOCUMENT
// =============================================================================

/// PARA categorization: four parallel lists of related paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Para {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub projects: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub areas: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub resources: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub archive: Vec<String>,
}

/// Metadata for one content file, keyed by `path`.
///
/// Every write replaces the whole document; there are no partial updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDocument {
    pub path: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,

    /// Single category; empty means "no collection" and is omitted on output.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub collection: String,

    #[serde(rename = "type", default)]
    pub file_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    /// Size in bytes.
    #[serde(default)]
    pub size: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edited: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub folders: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub boards: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ancestor: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub parents: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub kids: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub used_links: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub links_to_here: Vec<String>,

    #[serde(default)]
    pub para: Para,
}

/// Accept `null` for list fields and read it as an empty list.
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<String>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Borrowed view of one field's value, tagged by value type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    List(&'a [String]),
    Instant(Option<DateTime<Utc>>),
    Int(i64),
    Bool(bool),
}

impl FieldValue<'_> {
    /// Short description used in evaluation errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "string value",
            Self::List(_) => "array value",
            Self::Instant(_) => "date value",
            Self::Int(_) => "int value",
            Self::Bool(_) => "bool value",
        }
    }
}

impl MetadataDocument {
    /// Create an empty document for the given path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Reject documents that cannot be stored.
    pub fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(Error::InvalidValue(
                "document path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Value stored in the given slot.
    ///
    /// Absent optional scalars read as the empty string, so filters treat
    /// "no status" and `status = ""` the same way in every backend.
    pub fn value_of(&self, slot: FieldSlot) -> FieldValue<'_> {
        match slot {
            FieldSlot::Path => FieldValue::Text(&self.path),
            FieldSlot::Name => FieldValue::Text(&self.name),
            FieldSlot::Title => FieldValue::Text(&self.title),
            FieldSlot::Collection => FieldValue::Text(&self.collection),
            FieldSlot::FileType => FieldValue::Text(&self.file_type),
            FieldSlot::Status => FieldValue::Text(self.status.map(|s| s.as_str()).unwrap_or("")),
            FieldSlot::Priority => {
                FieldValue::Text(self.priority.map(|p| p.as_str()).unwrap_or(""))
            }
            FieldSlot::Size => FieldValue::Int(self.size),
            FieldSlot::CreatedAt => FieldValue::Instant(self.created_at),
            FieldSlot::LastEdited => FieldValue::Instant(self.last_edited),
            FieldSlot::TargetDate => FieldValue::Instant(self.target_date),
            slot => FieldValue::List(self.list(slot).unwrap_or(&[])),
        }
    }

    /// Array field for the slot, or `None` for scalar slots.
    pub fn list(&self, slot: FieldSlot) -> Option<&[String]> {
        let list = match slot {
            FieldSlot::Folders => &self.folders,
            FieldSlot::Tags => &self.tags,
            FieldSlot::Boards => &self.boards,
            FieldSlot::Ancestor => &self.ancestor,
            FieldSlot::Parents => &self.parents,
            FieldSlot::Kids => &self.kids,
            FieldSlot::UsedLinks => &self.used_links,
            FieldSlot::LinksToHere => &self.links_to_here,
            FieldSlot::Projects => &self.para.projects,
            FieldSlot::Areas => &self.para.areas,
            FieldSlot::Resources => &self.para.resources,
            FieldSlot::Archive => &self.para.archive,
            _ => return None,
        };
        Some(list)
    }

    /// Mutable array field for the slot, or `None` for scalar slots.
    pub fn list_mut(&mut self, slot: FieldSlot) -> Option<&mut Vec<String>> {
        let list = match slot {
            FieldSlot::Folders => &mut self.folders,
            FieldSlot::Tags => &mut self.tags,
            FieldSlot::Boards => &mut self.boards,
            FieldSlot::Ancestor => &mut self.ancestor,
            FieldSlot::Parents => &mut self.parents,
            FieldSlot::Kids => &mut self.kids,
            FieldSlot::UsedLinks => &mut self.used_links,
            FieldSlot::LinksToHere => &mut self.links_to_here,
            FieldSlot::Projects => &mut self.para.projects,
            FieldSlot::Areas => &mut self.para.areas,
            FieldSlot::Resources => &mut self.para.resources,
            FieldSlot::Archive => &mut self.para.archive,
            _ => return None,
        };
        Some(list)
    }

    // Builder helpers, mostly for indexers and tests.

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_absent_fields_serialize_as_documented() {
        let doc = MetadataDocument::new("notes/a.md");
        let json = serde_json::to_value(&doc).unwrap();

        assert_eq!(json["tags"], serde_json::json!([]));
        assert_eq!(json["para"]["archive"], serde_json::json!([]));
        assert!(json.get("collection").is_none());
        assert!(json.get("createdAt").is_none());
        assert!(json.get("status").is_none());
    }

    #[test]
    fn test_deserialize_wire_shape() {
        let json = r#"{
            "path": "projects/site.md", "name": "site", "title": "Site",
            "collection": "work", "type": "markdown", "status": "published",
            "priority": "high", "size": 2048,
            "createdAt": "2024-03-01T10:00:00Z", "lastEdited": "2024-03-02T11:30:00+02:00",
            "folders": ["projects"], "tags": ["web", "alpha"], "boards": null,
            "usedLinks": ["index.md"], "linksToHere": [],
            "para": {"projects": ["site"], "areas": null}
        }"#;
        let doc: MetadataDocument = serde_json::from_str(json).unwrap();

        assert_eq!(doc.file_type, "markdown");
        assert_eq!(doc.status, Some(Status::Published));
        assert_eq!(doc.priority, Some(Priority::High));
        assert!(doc.boards.is_empty());
        assert!(doc.para.areas.is_empty());
        assert_eq!(doc.para.projects, vec!["site".to_string()]);
        assert_eq!(
            doc.last_edited,
            Some(Utc.with_ymd_and_hms(2024, 3, 2, 9, 30, 0).unwrap())
        );
        assert!(doc.target_date.is_none());
    }

    #[test]
    fn test_value_of_absent_status_reads_empty() {
        let doc = MetadataDocument::new("a.md");
        assert_eq!(doc.value_of(FieldSlot::Status), FieldValue::Text(""));
        assert_eq!(doc.value_of(FieldSlot::TargetDate), FieldValue::Instant(None));
    }

    #[test]
    fn test_para_lists_reachable_by_slot() {
        let mut doc = MetadataDocument::new("a.md");
        doc.list_mut(FieldSlot::Resources)
            .unwrap()
            .push("books".to_string());

        assert_eq!(
            doc.value_of(FieldSlot::Resources),
            FieldValue::List(&["books".to_string()])
        );
        assert!(doc.list(FieldSlot::Size).is_none());
    }

    #[test]
    fn test_validate_rejects_empty_path() {
        assert!(MetadataDocument::new("  ").validate().is_err());
        assert!(MetadataDocument::new("x.md").validate().is_ok());
    }

    #[test]
    fn test_status_round_trip_strings() {
        for status in [Status::Draft, Status::Published, Status::Archived] {
            assert_eq!(status.as_str().parse::<Status>().unwrap(), status);
        }
        assert!("Published".parse::<Status>().is_err());
    }
}
