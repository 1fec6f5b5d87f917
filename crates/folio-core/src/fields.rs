//! Static field registry.
//!
//! Maps each queryable field name to its storage column, value type and the
//! closed set of operators it accepts. The registry is built once and is
//! read-only afterwards, so lookups need no locking.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::criteria::Operator;
use crate::error::{Error, Result};

/// Value type of a queryable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Array,
    Date,
    Int,
    Bool,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Array => "array",
            Self::Date => "date",
            Self::Int => "int",
            Self::Bool => "bool",
        }
    }

    /// Operators every field of this type accepts.
    pub fn operators(&self) -> &'static [Operator] {
        use Operator::*;
        match self {
            Self::String => &[Equals, Contains, In, Regex],
            Self::Array => &[Equals, Contains, In],
            Self::Date | Self::Int => &[Equals, Greater, Less, Gte, Lte],
            Self::Bool => &[Equals],
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document attribute a descriptor reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldSlot {
    Path,
    Name,
    Title,
    Collection,
    FileType,
    Status,
    Priority,
    Size,
    CreatedAt,
    LastEdited,
    TargetDate,
    Folders,
    Tags,
    Boards,
    Ancestor,
    Parents,
    Kids,
    UsedLinks,
    LinksToHere,
    Projects,
    Areas,
    Resources,
    Archive,
}

/// Immutable description of one queryable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Name used in criteria (the JSON key of the document).
    pub name: &'static str,
    /// Relational column, or the `field` key of multi-valued rows for arrays.
    pub column: &'static str,
    pub value_type: ValueType,
    pub slot: FieldSlot,
}

impl FieldDescriptor {
    const fn new(
        name: &'static str,
        column: &'static str,
        value_type: ValueType,
        slot: FieldSlot,
    ) -> Self {
        Self {
            name,
            column,
            value_type,
            slot,
        }
    }

    /// Operators accepted by this field.
    pub fn operators(&self) -> &'static [Operator] {
        self.value_type.operators()
    }

    pub fn supports(&self, op: Operator) -> bool {
        self.operators().contains(&op)
    }
}

/// Every queryable field, in document order.
pub const FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("path", "path", ValueType::String, FieldSlot::Path),
    FieldDescriptor::new("name", "name", ValueType::String, FieldSlot::Name),
    FieldDescriptor::new("title", "title", ValueType::String, FieldSlot::Title),
    FieldDescriptor::new("collection", "collection", ValueType::String, FieldSlot::Collection),
    FieldDescriptor::new("type", "file_type", ValueType::String, FieldSlot::FileType),
    FieldDescriptor::new("status", "status", ValueType::String, FieldSlot::Status),
    FieldDescriptor::new("priority", "priority", ValueType::String, FieldSlot::Priority),
    FieldDescriptor::new("size", "size", ValueType::Int, FieldSlot::Size),
    FieldDescriptor::new("createdAt", "created_at", ValueType::Date, FieldSlot::CreatedAt),
    FieldDescriptor::new("lastEdited", "last_edited", ValueType::Date, FieldSlot::LastEdited),
    FieldDescriptor::new("targetDate", "target_date", ValueType::Date, FieldSlot::TargetDate),
    FieldDescriptor::new("folders", "folders", ValueType::Array, FieldSlot::Folders),
    FieldDescriptor::new("tags", "tags", ValueType::Array, FieldSlot::Tags),
    FieldDescriptor::new("boards", "boards", ValueType::Array, FieldSlot::Boards),
    FieldDescriptor::new("ancestor", "ancestor", ValueType::Array, FieldSlot::Ancestor),
    FieldDescriptor::new("parents", "parents", ValueType::Array, FieldSlot::Parents),
    FieldDescriptor::new("kids", "kids", ValueType::Array, FieldSlot::Kids),
    FieldDescriptor::new("usedLinks", "used_links", ValueType::Array, FieldSlot::UsedLinks),
    FieldDescriptor::new("linksToHere", "links_to_here", ValueType::Array, FieldSlot::LinksToHere),
    FieldDescriptor::new("projects", "para_projects", ValueType::Array, FieldSlot::Projects),
    FieldDescriptor::new("areas", "para_areas", ValueType::Array, FieldSlot::Areas),
    FieldDescriptor::new("resources", "para_resources", ValueType::Array, FieldSlot::Resources),
    FieldDescriptor::new("archive", "para_archive", ValueType::Array, FieldSlot::Archive),
];

static STANDARD: Lazy<FieldRegistry> = Lazy::new(|| FieldRegistry::from_descriptors(FIELDS));

/// Lookup table from field name (and column) to descriptor.
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    by_name: HashMap<&'static str, FieldDescriptor>,
    by_column: HashMap<&'static str, FieldDescriptor>,
    names: Vec<&'static str>,
}

impl FieldRegistry {
    /// The registry of document fields, built on first use.
    pub fn standard() -> &'static FieldRegistry {
        &STANDARD
    }

    pub fn from_descriptors(descriptors: &[FieldDescriptor]) -> Self {
        Self {
            by_name: descriptors.iter().map(|d| (d.name, *d)).collect(),
            by_column: descriptors.iter().map(|d| (d.column, *d)).collect(),
            names: descriptors.iter().map(|d| d.name).collect(),
        }
    }

    /// Resolve a field name, failing with `UnknownField`.
    pub fn lookup(&self, name: &str) -> Result<FieldDescriptor> {
        self.get(name)
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<FieldDescriptor> {
        self.by_name.get(name).copied()
    }

    /// Resolve a storage column back to its descriptor.
    pub fn by_column(&self, column: &str) -> Option<FieldDescriptor> {
        self.by_column.get(column).copied()
    }

    /// All field names in registration order.
    pub fn all_names(&self) -> &[&'static str] {
        &self.names
    }

    pub fn descriptors(&self) -> impl Iterator<Item = FieldDescriptor> + '_ {
        self.names.iter().filter_map(|name| self.get(name))
    }
}
