//! Fixes for character rows whose profile URL in the source table is wrong.

use std::path::Path;

use tracing::{info, instrument};

use castgraph_shared::{CharacterTable, Result};
use castgraph_storage::{read_characters, write_characters};

/// Replace the `wiki_page_url` of every row named `name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlCorrection {
    pub name: &'static str,
    pub new_url: &'static str,
}

/// Known-bad profile URLs in the character table.
pub const KNOWN_URL_CORRECTIONS: &[UrlCorrection] = &[
    UrlCorrection {
        name: "Tanya McQuoid",
        new_url: "https://thewhitelotus.fandom.com/wiki/Tanya_McQuoid-Hunt",
    },
    UrlCorrection {
        name: "Lucia",
        new_url: "https://thewhitelotus.fandom.com/wiki/Lucia_Greco",
    },
    UrlCorrection {
        name: "Belinda",
        new_url: "https://thewhitelotus.fandom.com/wiki/Belinda_Lindsey",
    },
];

/// Apply `corrections` to a copy of `table`. Names must match exactly.
pub fn correct(table: &CharacterTable, corrections: &[UrlCorrection]) -> CharacterTable {
    correct_counted(table, corrections).0
}

/// Like [`correct`], also returning how many rows each correction touched.
fn correct_counted(
    table: &CharacterTable,
    corrections: &[UrlCorrection],
) -> (CharacterTable, Vec<usize>) {
    let mut out = table.clone();
    let mut touched = vec![0; corrections.len()];

    for record in &mut out.records {
        for (i, correction) in corrections.iter().enumerate() {
            if record.name == correction.name {
                record.wiki_page_url = Some(correction.new_url.to_string());
                touched[i] += 1;
            }
        }
    }
    (out, touched)
}

/// Correct the character table at `path` and write it back in place.
#[instrument(skip(corrections), fields(path = %path.display()))]
pub fn correct_file(path: &Path, corrections: &[UrlCorrection]) -> Result<CharacterTable> {
    let table = read_characters(path)?;
    let (corrected, touched) = correct_counted(&table, corrections);

    for (correction, rows) in corrections.iter().zip(&touched) {
        info!(
            name = correction.name,
            url = correction.new_url,
            rows,
            "applied url correction"
        );
    }

    write_characters(path, &corrected)?;
    Ok(corrected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use castgraph_shared::CharacterRecord;

    fn table() -> CharacterTable {
        CharacterTable::from_records(vec![
            CharacterRecord::new("Tanya McQuoid").with_wiki_page_url("old"),
            CharacterRecord::new("Greg").with_wiki_page_url("https://thewhitelotus.fandom.com/wiki/Greg"),
            CharacterRecord::new("Lucia"),
            CharacterRecord::new("belinda").with_wiki_page_url("lowercase"),
        ])
    }

    #[test]
    fn rewrites_only_named_rows() {
        let corrected = correct(&table(), KNOWN_URL_CORRECTIONS);

        assert_eq!(
            corrected.records[0].wiki_page_url.as_deref(),
            Some("https://thewhitelotus.fandom.com/wiki/Tanya_McQuoid-Hunt")
        );
        assert_eq!(
            corrected.records[1].wiki_page_url.as_deref(),
            Some("https://thewhitelotus.fandom.com/wiki/Greg")
        );
        assert_eq!(
            corrected.records[2].wiki_page_url.as_deref(),
            Some("https://thewhitelotus.fandom.com/wiki/Lucia_Greco")
        );
        // exact match only
        assert_eq!(corrected.records[3].wiki_page_url.as_deref(), Some("lowercase"));
    }

    #[test]
    fn correction_is_idempotent() {
        let once = correct(&table(), KNOWN_URL_CORRECTIONS);
        let twice = correct(&once, KNOWN_URL_CORRECTIONS);
        assert_eq!(once, twice);
    }

    #[test]
    fn single_row_scenario() {
        let corrections = [UrlCorrection {
            name: "Tanya McQuoid",
            new_url: "new",
        }];
        let input = CharacterTable::from_records(vec![
            CharacterRecord::new("Tanya McQuoid").with_wiki_page_url("old"),
        ]);
        let corrected = correct(&input, &corrections);
        assert_eq!(corrected.records[0].wiki_page_url.as_deref(), Some("new"));
        assert_eq!(input.records[0].wiki_page_url.as_deref(), Some("old"));
    }

    #[test]
    fn correct_file_rewrites_in_place_and_keeps_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("characters.csv");
        std::fs::write(
            &path,
            "name,wiki_page_url,season\nBelinda,https://wrong/Belinda,1\nArmond,https://w/Armond,1\n",
        )
        .unwrap();

        let table = correct_file(&path, KNOWN_URL_CORRECTIONS).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "name,wiki_page_url,season\n\
             Belinda,https://thewhitelotus.fandom.com/wiki/Belinda_Lindsey,1\n\
             Armond,https://w/Armond,1\n"
        );
    }

    #[test]
    fn correct_file_reports_missing_table() {
        let dir = tempfile::tempdir().unwrap();
        assert!(correct_file(&dir.path().join("absent.csv"), KNOWN_URL_CORRECTIONS).is_err());
    }
}
