// src/links.rs

use std::collections::HashMap;

use crate::error::{ImporterError, Result};
use crate::table::{ParsedTable, Record};

/// Name of the table that maps movie ids onto external catalogues.
pub const LINKS_TABLE: &str = "links.csv";

pub const MOVIE_ID: &str = "movieId";
pub const IMDB_ID: &str = "imdbId";
pub const TMDB_ID: &str = "tmdbId";

const IMDB_PREFIX: &str = "tt";
const IMDB_WIDTH: usize = 7;

/// External identifiers for one movie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub imdb_id: String,
    pub tmdb_id: String,
}

/// `movieId` → external identifiers, built once from `links.csv`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkTable {
    links: HashMap<String, Link>,
}

impl LinkTable {
    pub fn from_parsed(parsed: &ParsedTable) -> Result<Self> {
        for field in [MOVIE_ID, IMDB_ID, TMDB_ID] {
            if !parsed.has_column(field) {
                return Err(ImporterError::MissingField {
                    table: LINKS_TABLE.to_string(),
                    field,
                });
            }
        }

        let links = parsed
            .records
            .iter()
            .filter_map(|r| {
                let movie_id = r.get(MOVIE_ID)?;
                let link = Link {
                    imdb_id: r.get(IMDB_ID).unwrap_or_default().to_string(),
                    tmdb_id: r.get(TMDB_ID).unwrap_or_default().to_string(),
                };
                Some((movie_id.to_string(), link))
            })
            .collect();

        Ok(Self { links })
    }

    pub fn get(&self, movie_id: &str) -> Option<&Link> {
        self.links.get(movie_id)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Set `imdbId`/`tmdbId` on every record whose `movieId` has a link.
    /// Records without a match are left as they are.
    pub fn enrich(&self, records: &mut [Record], normalize_imdb: bool) {
        for record in records.iter_mut() {
            let Some(link) = record.get(MOVIE_ID).and_then(|id| self.links.get(id)) else {
                continue;
            };
            let imdb = if normalize_imdb {
                normalize_imdb_id(&link.imdb_id)
            } else {
                link.imdb_id.clone()
            };
            record.set(IMDB_ID, imdb);
            record.set(TMDB_ID, link.tmdb_id.clone());
        }
    }
}

impl FromIterator<(String, Link)> for LinkTable {
    fn from_iter<I: IntoIterator<Item = (String, Link)>>(iter: I) -> Self {
        Self {
            links: iter.into_iter().collect(),
        }
    }
}

/// Canonical IMDb title id: `tt` followed by at least seven zero-padded digits.
pub fn normalize_imdb_id(raw: &str) -> String {
    format!("{}{:0>width$}", IMDB_PREFIX, raw, width = IMDB_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::parse_records;

    fn toy_story() -> LinkTable {
        [(
            "1".to_string(),
            Link {
                imdb_id: "0114709".into(),
                tmdb_id: "862".into(),
            },
        )]
        .into_iter()
        .collect()
    }

    #[test]
    fn normalizes_to_prefixed_seven_digits() {
        assert_eq!(normalize_imdb_id("114709"), "tt0114709");
        assert_eq!(normalize_imdb_id("0114709"), "tt0114709");
        assert_eq!(normalize_imdb_id(""), "tt0000000");
        assert_eq!(normalize_imdb_id("12345678"), "tt12345678");
    }

    #[test]
    fn zero_padding_law_holds_for_short_digit_ids() {
        for len in 0..=7 {
            let raw: String = "9".repeat(len);
            let norm = normalize_imdb_id(&raw);
            assert_eq!(norm, format!("tt{}{}", "0".repeat(7 - len), raw));
            assert_eq!(norm.len(), 9);
        }
    }

    #[test]
    fn builds_from_links_csv() {
        let parsed = parse_records(
            LINKS_TABLE,
            "movieId,imdbId,tmdbId\n1,0114709,862\n2,0113497,\n",
        )
        .unwrap();
        let links = LinkTable::from_parsed(&parsed).unwrap();

        assert_eq!(links.len(), 2);
        assert_eq!(links.get("1"), toy_story().get("1"));
        assert_eq!(links.get("2").map(|l| l.tmdb_id.as_str()), Some(""));
    }

    #[test]
    fn links_without_key_column_are_rejected() {
        let parsed = parse_records(LINKS_TABLE, "id,imdbId,tmdbId\n1,2,3\n").unwrap();
        let err = LinkTable::from_parsed(&parsed).unwrap_err();
        assert!(matches!(err, ImporterError::MissingField { field: MOVIE_ID, .. }));
    }

    #[test]
    fn enrich_sets_fields_and_skips_unmatched() {
        let mut records = vec![
            Record::from_iter([("movieId", "1"), ("rating", "4.0")]),
            Record::from_iter([("movieId", "99"), ("rating", "2.5")]),
        ];
        toy_story().enrich(&mut records, false);

        assert_eq!(
            records[0],
            Record::from_iter([
                ("movieId", "1"),
                ("rating", "4.0"),
                ("imdbId", "0114709"),
                ("tmdbId", "862"),
            ])
        );
        assert_eq!(
            records[1],
            Record::from_iter([("movieId", "99"), ("rating", "2.5")])
        );
    }

    #[test]
    fn enrich_normalizes_imdb_only() {
        let mut records = vec![Record::from_iter([("movieId", "1")])];
        toy_story().enrich(&mut records, true);

        assert_eq!(records[0].get("imdbId"), Some("tt0114709"));
        assert_eq!(records[0].get("tmdbId"), Some("862"));
    }
}
