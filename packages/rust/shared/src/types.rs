//! Typed rows for the character, relationship and merged tables.
//!
//! Known columns get typed fields; every other column rides along in
//! [`Passthrough`] so tables survive a read/write cycle unchanged. Each table
//! carries its column order explicitly.

use std::collections::BTreeMap;

/// Column names shared by the storage codecs and pipeline stages.
pub mod columns {
    pub const NAME: &str = "name";
    pub const WIKI_PAGE_URL: &str = "wiki_page_url";
    pub const PHOTO_URL: &str = "photo_url";

    pub const SOURCE_LABEL: &str = "source_label";
    pub const TARGET_LABEL: &str = "target_label";
    pub const RELATIONSHIP: &str = "relationship";

    pub const SOURCE_WIKI_PAGE_URL: &str = "source_wiki_page_url";
    pub const SOURCE_PHOTO_URL: &str = "source_photo_url";
    pub const TARGET_WIKI_PAGE_URL: &str = "target_wiki_page_url";
    pub const TARGET_PHOTO_URL: &str = "target_photo_url";

    /// Columns appended to the relationship table by the merger, in order.
    pub const MERGED: [&str; 4] = [
        SOURCE_WIKI_PAGE_URL,
        SOURCE_PHOTO_URL,
        TARGET_WIKI_PAGE_URL,
        TARGET_PHOTO_URL,
    ];
}

/// Untyped columns carried through a stage verbatim. `None` is an empty cell.
pub type Passthrough = BTreeMap<String, Option<String>>;

// ---------------------------------------------------------------------------
// Characters
// ---------------------------------------------------------------------------

/// One row of the character table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterRecord {
    /// Character name, the join key.
    pub name: String,
    /// Profile page on the wiki.
    pub wiki_page_url: Option<String>,
    /// Resolved portrait. `Some("")` once enrichment found nothing.
    pub photo_url: Option<String>,
    /// Other columns.
    pub extra: Passthrough,
}

impl CharacterRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_wiki_page_url(mut self, url: impl Into<String>) -> Self {
        self.wiki_page_url = Some(url.into());
        self
    }

    /// Cell value for `column`, as it would be written out.
    pub fn value(&self, column: &str) -> Option<&str> {
        match column {
            columns::NAME => Some(&self.name),
            columns::WIKI_PAGE_URL => self.wiki_page_url.as_deref(),
            columns::PHOTO_URL => self.photo_url.as_deref(),
            other => self.extra.get(other).and_then(|v| v.as_deref()),
        }
    }
}

/// The character table: column order plus rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterTable {
    pub columns: Vec<String>,
    pub records: Vec<CharacterRecord>,
}

impl CharacterTable {
    /// Build a table with the minimal `name, wiki_page_url` layout.
    pub fn from_records(records: Vec<CharacterRecord>) -> Self {
        Self {
            columns: vec![columns::NAME.into(), columns::WIKI_PAGE_URL.into()],
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

// ---------------------------------------------------------------------------
// Relationships
// ---------------------------------------------------------------------------

/// One row of the relationship (edge) table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipRecord {
    pub source_label: String,
    pub target_label: String,
    pub relationship: Option<String>,
    pub extra: Passthrough,
}

impl RelationshipRecord {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source_label: source.into(),
            target_label: target.into(),
            ..Self::default()
        }
    }

    pub fn with_relationship(mut self, relationship: impl Into<String>) -> Self {
        self.relationship = Some(relationship.into());
        self
    }

    pub fn value(&self, column: &str) -> Option<&str> {
        match column {
            columns::SOURCE_LABEL => Some(&self.source_label),
            columns::TARGET_LABEL => Some(&self.target_label),
            columns::RELATIONSHIP => self.relationship.as_deref(),
            other => self.extra.get(other).and_then(|v| v.as_deref()),
        }
    }
}

/// The relationship table: column order plus rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipTable {
    pub columns: Vec<String>,
    pub records: Vec<RelationshipRecord>,
}

impl RelationshipTable {
    /// Build a table with the minimal `source_label, target_label, relationship` layout.
    pub fn from_records(records: Vec<RelationshipRecord>) -> Self {
        Self {
            columns: vec![
                columns::SOURCE_LABEL.into(),
                columns::TARGET_LABEL.into(),
                columns::RELATIONSHIP.into(),
            ],
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Merged edges
// ---------------------------------------------------------------------------

/// A relationship row with both endpoints' character attributes joined on.
///
/// Each joined field is `None` when no character matched the endpoint label,
/// or when the matched character had an empty cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichedRelationshipRecord {
    pub edge: RelationshipRecord,
    pub source_wiki_page_url: Option<String>,
    pub source_photo_url: Option<String>,
    pub target_wiki_page_url: Option<String>,
    pub target_photo_url: Option<String>,
}

impl EnrichedRelationshipRecord {
    pub fn value(&self, column: &str) -> Option<&str> {
        match column {
            columns::SOURCE_WIKI_PAGE_URL => self.source_wiki_page_url.as_deref(),
            columns::SOURCE_PHOTO_URL => self.source_photo_url.as_deref(),
            columns::TARGET_WIKI_PAGE_URL => self.target_wiki_page_url.as_deref(),
            columns::TARGET_PHOTO_URL => self.target_photo_url.as_deref(),
            other => self.edge.value(other),
        }
    }
}

/// The merged edge table written for the graph builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedTable {
    pub columns: Vec<String>,
    pub records: Vec<EnrichedRelationshipRecord>,
}

impl MergedTable {
    /// Column layout for a merge of `edge_columns`: the edge table's columns
    /// followed by any merged column it does not already have.
    pub fn columns_for(edge_columns: &[String]) -> Vec<String> {
        let mut out = edge_columns.to_vec();
        for column in columns::MERGED {
            if !out.iter().any(|c| c == column) {
                out.push(column.to_string());
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
