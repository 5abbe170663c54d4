//! Typed codecs between [`RawTable`] and the castgraph tables.

use std::path::Path;

use castgraph_shared::{
    CharacterRecord, CharacterTable, EnrichedRelationshipRecord, MergedTable, RelationshipRecord,
    RelationshipTable, Result, columns,
};

use crate::{RawTable, read_table, write_table};

// ---------------------------------------------------------------------------
// Characters
// ---------------------------------------------------------------------------

/// Read the character table. Requires `name` and `wiki_page_url`.
pub fn read_characters(path: &Path) -> Result<CharacterTable> {
    let raw = read_table(path)?;
    raw.require_columns(path, &[columns::NAME, columns::WIKI_PAGE_URL])?;

    let records = raw
        .rows
        .iter()
        .map(|row| character_from_row(&raw.headers, row))
        .collect();

    Ok(CharacterTable {
        columns: raw.headers,
        records,
    })
}

/// Write the character table in its own column order.
pub fn write_characters(path: &Path, table: &CharacterTable) -> Result<()> {
    let rows = table
        .records
        .iter()
        .map(|record| project(&table.columns, |c| record.value(c)))
        .collect();

    write_table(
        path,
        &RawTable {
            headers: table.columns.clone(),
            rows,
        },
    )
}

fn character_from_row(headers: &[String], row: &[Option<String>]) -> CharacterRecord {
    let mut record = CharacterRecord::default();
    for (column, cell) in headers.iter().zip(row) {
        match column.as_str() {
            columns::NAME => record.name = cell.clone().unwrap_or_default(),
            columns::WIKI_PAGE_URL => record.wiki_page_url = cell.clone(),
            columns::PHOTO_URL => record.photo_url = cell.clone(),
            _ => {
                record.extra.insert(column.clone(), cell.clone());
            }
        }
    }
    record
}

// ---------------------------------------------------------------------------
// Relationships
// ---------------------------------------------------------------------------

/// Read the relationship table. Requires `source_label`, `target_label` and `relationship`.
pub fn read_relationships(path: &Path) -> Result<RelationshipTable> {
    let raw = read_table(path)?;
    raw.require_columns(
        path,
        &[
            columns::SOURCE_LABEL,
            columns::TARGET_LABEL,
            columns::RELATIONSHIP,
        ],
    )?;

    let records = raw
        .rows
        .iter()
        .map(|row| relationship_from_row(&raw.headers, row))
        .collect();

    Ok(RelationshipTable {
        columns: raw.headers,
        records,
    })
}

fn relationship_from_row(headers: &[String], row: &[Option<String>]) -> RelationshipRecord {
    let mut record = RelationshipRecord::default();
    for (column, cell) in headers.iter().zip(row) {
        match column.as_str() {
            columns::SOURCE_LABEL => record.source_label = cell.clone().unwrap_or_default(),
            columns::TARGET_LABEL => record.target_label = cell.clone().unwrap_or_default(),
            columns::RELATIONSHIP => record.relationship = cell.clone(),
            _ => {
                record.extra.insert(column.clone(), cell.clone());
            }
        }
    }
    record
}

// ---------------------------------------------------------------------------
// Merged edges
// ---------------------------------------------------------------------------

/// Read a merged edge table. Only the endpoint labels are required; absent
/// merged columns read as `None`.
pub fn read_merged(path: &Path) -> Result<MergedTable> {
    let raw = read_table(path)?;
    raw.require_columns(path, &[columns::SOURCE_LABEL, columns::TARGET_LABEL])?;

    let records = raw
        .rows
        .iter()
        .map(|row| merged_from_row(&raw.headers, row))
        .collect();

    Ok(MergedTable {
        columns: raw.headers,
        records,
    })
}

/// Write a merged edge table in its own column order.
pub fn write_merged(path: &Path, table: &MergedTable) -> Result<()> {
    let rows = table
        .records
        .iter()
        .map(|record| project(&table.columns, |c| record.value(c)))
        .collect();

    write_table(
        path,
        &RawTable {
            headers: table.columns.clone(),
            rows,
        },
    )
}

fn merged_from_row(headers: &[String], row: &[Option<String>]) -> EnrichedRelationshipRecord {
    let mut edge_headers = Vec::with_capacity(headers.len());
    let mut edge_row = Vec::with_capacity(row.len());
    let mut record = EnrichedRelationshipRecord::default();

    for (column, cell) in headers.iter().zip(row) {
        match column.as_str() {
            columns::SOURCE_WIKI_PAGE_URL => record.source_wiki_page_url = cell.clone(),
            columns::SOURCE_PHOTO_URL => record.source_photo_url = cell.clone(),
            columns::TARGET_WIKI_PAGE_URL => record.target_wiki_page_url = cell.clone(),
            columns::TARGET_PHOTO_URL => record.target_photo_url = cell.clone(),
            _ => {
                edge_headers.push(column.clone());
                edge_row.push(cell.clone());
            }
        }
    }

    record.edge = relationship_from_row(&edge_headers, &edge_row);
    record
}

fn project<'a>(
    columns: &[String],
    value: impl Fn(&str) -> Option<&'a str>,
) -> Vec<Option<String>> {
    columns
        .iter()
        .map(|c| value(c).map(str::to_string))
        .collect()
}
