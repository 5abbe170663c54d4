//! Left join of character attributes onto both ends of each relationship.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info, instrument};

use castgraph_shared::{
    CharacterRecord, CharacterTable, EnrichedRelationshipRecord, MergedTable, RelationshipTable,
    Result,
};
use castgraph_storage::{read_relationships, write_merged};

/// Join `characters` onto `edges` by name, once as source and once as target.
///
/// Every edge row is kept and no row is multiplied: when a name occurs more
/// than once in `characters` its first row is used. Blank names and blank
/// labels never match.
pub fn merge(edges: &RelationshipTable, characters: &CharacterTable) -> MergedTable {
    let mut by_name: HashMap<&str, &CharacterRecord> = HashMap::with_capacity(characters.len());
    for record in characters.records.iter().filter(|r| !r.name.is_empty()) {
        by_name.entry(record.name.as_str()).or_insert(record);
    }

    let mut unmatched = 0;
    let records = edges
        .records
        .iter()
        .map(|edge| {
            let source = lookup(&by_name, &edge.source_label);
            let target = lookup(&by_name, &edge.target_label);
            unmatched += usize::from(source.is_none()) + usize::from(target.is_none());
            EnrichedRelationshipRecord {
                edge: edge.clone(),
                source_wiki_page_url: source.and_then(|c| c.wiki_page_url.clone()),
                source_photo_url: source.and_then(|c| c.photo_url.clone()),
                target_wiki_page_url: target.and_then(|c| c.wiki_page_url.clone()),
                target_photo_url: target.and_then(|c| c.photo_url.clone()),
            }
        })
        .collect::<Vec<_>>();

    debug!(rows = records.len(), unmatched, "merge complete");

    MergedTable {
        columns: MergedTable::columns_for(&edges.columns),
        records,
    }
}

fn lookup<'a>(by_name: &HashMap<&str, &'a CharacterRecord>, label: &str) -> Option<&'a CharacterRecord> {
    if label.is_empty() {
        return None;
    }
    by_name.get(label).copied()
}

/// Read the relationship table, merge `characters` onto it and write the result.
#[instrument(skip(characters), fields(edges = %edges_path.display(), out = %out_path.display()))]
pub fn merge_files(
    edges_path: &Path,
    characters: &CharacterTable,
    out_path: &Path,
) -> Result<MergedTable> {
    let edges = read_relationships(edges_path)?;
    info!(edges = edges.len(), characters = characters.len(), "merging");

    let merged = merge(&edges, characters);
    write_merged(out_path, &merged)?;

    info!(rows = merged.len(), "merged table written");
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use castgraph_shared::RelationshipRecord;

    fn characters() -> CharacterTable {
        let mut tanya = CharacterRecord::new("Tanya").with_wiki_page_url("https://w/Tanya");
        tanya.photo_url = Some("https://img/tanya.png".into());
        let mut greg = CharacterRecord::new("Greg").with_wiki_page_url("https://w/Greg");
        greg.photo_url = Some(String::new());
        let mut dup = CharacterRecord::new("Tanya").with_wiki_page_url("https://w/Other");
        dup.photo_url = Some("https://img/other.png".into());

        let mut table = CharacterTable::from_records(vec![tanya, greg, dup]);
        table.columns.push("photo_url".into());
        table
    }

    #[test]
    fn keeps_every_edge_and_fills_both_ends() {
        let edges = RelationshipTable::from_records(vec![
            RelationshipRecord::new("Tanya", "Greg").with_relationship("married"),
            RelationshipRecord::new("Greg", "Portia").with_relationship("acquaintance"),
            RelationshipRecord::new("Tanya", "Greg").with_relationship("married"),
        ]);
        let merged = merge(&edges, &characters());

        assert_eq!(merged.len(), edges.len());
        let first = &merged.records[0];
        assert_eq!(first.source_wiki_page_url.as_deref(), Some("https://w/Tanya"));
        assert_eq!(first.source_photo_url.as_deref(), Some("https://img/tanya.png"));
        assert_eq!(first.target_photo_url.as_deref(), Some(""));

        let unmatched = &merged.records[1];
        assert_eq!(unmatched.target_wiki_page_url, None);
        assert_eq!(unmatched.target_photo_url, None);
        assert_eq!(unmatched.edge.relationship.as_deref(), Some("acquaintance"));
    }

    #[test]
    fn columns_are_edges_then_merged() {
        let mut edges = RelationshipTable::from_records(vec![RelationshipRecord::new("A", "B")]);
        edges.columns.push("source_photo_url".into());
        edges.columns.push("season".into());

        let merged = merge(&edges, &CharacterTable::default());
        assert_eq!(
            merged.columns,
            vec![
                "source_label",
                "target_label",
                "relationship",
                "source_photo_url",
                "season",
                "source_wiki_page_url",
                "target_wiki_page_url",
                "target_photo_url",
            ]
        );
    }

    #[test]
    fn blank_labels_never_match_nameless_characters() {
        let mut nameless = CharacterRecord::new("").with_wiki_page_url("https://w/nameless");
        nameless.photo_url = Some("https://img/n.png".into());
        let mut characters = characters();
        characters.records.insert(0, nameless);

        let edges = RelationshipTable::from_records(vec![
            RelationshipRecord::new("", "Greg").with_relationship("rel"),
            RelationshipRecord::new("Tanya", "").with_relationship("rel"),
        ]);
        let merged = merge(&edges, &characters);

        let first = &merged.records[0];
        assert_eq!(first.source_wiki_page_url, None);
        assert_eq!(first.source_photo_url, None);
        assert_eq!(first.target_wiki_page_url.as_deref(), Some("https://w/Greg"));

        let second = &merged.records[1];
        assert_eq!(second.source_photo_url.as_deref(), Some("https://img/tanya.png"));
        assert_eq!(second.target_wiki_page_url, None);
        assert_eq!(second.target_photo_url, None);
    }

    #[test]
    fn blank_key_from_csv_cells_stays_unmatched() {
        let dir = tempfile::tempdir().unwrap();
        let characters_path = dir.path().join("characters.csv");
        let edges_path = dir.path().join("relationships.csv");
        let out_path = dir.path().join("merged.csv");
        std::fs::write(
            &characters_path,
            "name,wiki_page_url,photo_url\n,https://w/nameless,https://img/n.png\n",
        )
        .unwrap();
        std::fs::write(&edges_path, "source_label,target_label,relationship\n,Greg,rel\n").unwrap();

        let characters = castgraph_storage::read_characters(&characters_path).unwrap();
        let merged = merge_files(&edges_path, &characters, &out_path).unwrap();

        assert_eq!(merged.records[0].source_wiki_page_url, None);
        assert_eq!(merged.records[0].source_photo_url, None);
    }

    #[test]
    fn merge_files_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let edges_path = dir.path().join("relationships.csv");
        let out_path = dir.path().join("merged.csv");
        std::fs::write(
            &edges_path,
            "source_label,target_label,relationship\nTanya,Greg,married\nHarper,Ethan,\n",
        )
        .unwrap();

        let merged = merge_files(&edges_path, &characters(), &out_path).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(
            std::fs::read_to_string(&out_path).unwrap(),
            "source_label,target_label,relationship,source_wiki_page_url,source_photo_url,target_wiki_page_url,target_photo_url\n\
             Tanya,Greg,married,https://w/Tanya,https://img/tanya.png,https://w/Greg,\n\
             Harper,Ethan,,,,,\n"
        );
    }

    #[test]
    fn merge_files_rejects_missing_relationship_column() {
        let dir = tempfile::tempdir().unwrap();
        let edges_path = dir.path().join("relationships.csv");
        std::fs::write(&edges_path, "source_label,target_label\nA,B\n").unwrap();

        let out_path = dir.path().join("merged.csv");
        assert!(merge_files(&edges_path, &characters(), &out_path).is_err());
        assert!(!out_path.exists());
    }
}
