// src/archive.rs

use std::{
    fs::File,
    io::{Read, Seek},
    path::Path,
};
use zip::ZipArchive;

use crate::error::{ImporterError, Result};

/// A container of named table files.
pub trait TableArchive {
    /// Every entry name, directories included, in archive order.
    fn entry_names(&self) -> &[String];

    /// Full decompressed content of the entry called exactly `name`.
    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>>;
}

/// `TableArchive` over a zip container. Owns the underlying reader, so the
/// file handle is released when this value is dropped.
pub struct ZipTableArchive<R = File> {
    zip: ZipArchive<R>,
    names: Vec<String>,
    label: std::path::PathBuf,
}

impl ZipTableArchive<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ImporterError::Archive {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        Self::new(file, path)
    }
}

impl<R: Read + Seek> ZipTableArchive<R> {
    /// Read the central directory of `reader`; `label` names it in errors.
    pub fn new<P: AsRef<Path>>(reader: R, label: P) -> Result<Self> {
        let label = label.as_ref().to_path_buf();
        let mut zip = ZipArchive::new(reader).map_err(|source| ImporterError::Archive {
            path: label.clone(),
            source,
        })?;

        let mut names = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let entry = zip.by_index(i).map_err(|source| ImporterError::Archive {
                path: label.clone(),
                source,
            })?;
            names.push(entry.name().to_string());
        }

        Ok(Self { zip, names, label })
    }
}

impl<R: Read + Seek> TableArchive for ZipTableArchive<R> {
    fn entry_names(&self) -> &[String] {
        &self.names
    }

    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>> {
        let label = self.label.clone();
        let archive_err = |source: zip::result::ZipError| ImporterError::Archive {
            path: label.clone(),
            source,
        };
        let mut entry = match self.zip.by_name(name) {
            Ok(entry) => entry,
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(ImporterError::NotFound(name.to_string()))
            }
            Err(e) => return Err(archive_err(e)),
        };
        let mut buf = Vec::with_capacity(prealloc_hint(entry.size()));
        entry
            .read_to_end(&mut buf)
            .map_err(|e| archive_err(e.into()))?;
        Ok(buf)
    }
}

/// Upper bound on the up-front buffer for one entry; the header size is untrusted.
const MAX_PREALLOC: u64 = 64 << 20;

fn prealloc_hint(declared: u64) -> usize {
    declared.min(MAX_PREALLOC) as usize
}

fn is_dir(entry: &str) -> bool {
    entry.ends_with('/')
}

/// Last path component of an entry name; empty for directory entries.
pub fn base_name(entry: &str) -> &str {
    entry.rsplit('/').next().unwrap_or(entry)
}

/// True when `entry` is `table` itself or ends with `/` followed by `table`.
/// Case-sensitive, and only whole path components match.
pub fn matches_table(entry: &str, table: &str) -> bool {
    if table.is_empty() || is_dir(entry) {
        return false;
    }
    match entry.strip_suffix(table) {
        Some("") => true,
        Some(prefix) => prefix.ends_with('/'),
        None => false,
    }
}

/// Resolve `table` to exactly one entry name.
pub fn find_entry<'a>(names: &'a [String], table: &str) -> Result<&'a str> {
    let mut hits = names.iter().filter(|n| matches_table(n, table));
    match (hits.next(), hits.next()) {
        (None, _) => Err(ImporterError::NotFound(table.to_string())),
        (Some(only), None) => Ok(only.as_str()),
        (Some(first), Some(second)) => {
            let mut matches = vec![first.clone(), second.clone()];
            matches.extend(hits.cloned());
            Err(ImporterError::Ambiguous {
                name: table.to_string(),
                matches,
            })
        }
    }
}

/// Base names of the non-directory entries, in archive order, duplicates kept.
pub fn table_names(names: &[String]) -> Vec<String> {
    names
        .iter()
        .map(|n| base_name(n))
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    /// Build an in-memory zip; entries ending in `/` become directories.
    pub(crate) fn zip_bytes(entries: &[(&str, &str)]) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options = SimpleFileOptions::default();
            for (name, body) in entries {
                if name.ends_with('/') {
                    zip.add_directory(*name, options)?;
                } else {
                    zip.start_file(*name, options)?;
                    zip.write_all(body.as_bytes())?;
                }
            }
            zip.finish()?;
        }
        Ok(buf)
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn suffix_match_respects_path_components() {
        assert!(matches_table("ml/ratings.csv", "ratings.csv"));
        assert!(matches_table("ratings.csv", "ratings.csv"));
        assert!(matches_table("a/ml/ratings.csv", "ml/ratings.csv"));
        assert!(!matches_table("ml/ratings.csv", "s.csv"));
        assert!(!matches_table("ml/ratings.csv", "Ratings.csv"));
        assert!(!matches_table("ml/", "ml/"));
        assert!(!matches_table("ml/ratings.csv", ""));
    }

    #[test]
    fn find_entry_reports_absent_and_ambiguous() {
        let list = names(&["a/ratings.csv", "b/ratings.csv", "a/movies.csv"]);

        assert_eq!(find_entry(&list, "movies.csv").unwrap(), "a/movies.csv");
        assert!(matches!(
            find_entry(&list, "tags.csv"),
            Err(ImporterError::NotFound(ref n)) if n == "tags.csv"
        ));
        match find_entry(&list, "ratings.csv") {
            Err(ImporterError::Ambiguous { name, matches }) => {
                assert_eq!(name, "ratings.csv");
                assert_eq!(matches, names(&["a/ratings.csv", "b/ratings.csv"]));
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
        assert_eq!(find_entry(&list, "a/ratings.csv").unwrap(), "a/ratings.csv");
    }

    #[test]
    fn declared_entry_size_is_clamped() {
        assert_eq!(prealloc_hint(0), 0);
        assert_eq!(prealloc_hint(4096), 4096);
        assert_eq!(prealloc_hint(u64::MAX), 64 << 20);
    }

    #[test]
    fn table_names_skip_directories() {
        let list = names(&["ml/links.csv", "ml/movies.csv", "ml/"]);
        assert_eq!(table_names(&list), names(&["links.csv", "movies.csv"]));
    }

    #[test]
    fn zip_archive_lists_and_reads_entries() -> Result<()> {
        let bytes = zip_bytes(&[("ml/", ""), ("ml/links.csv", "movieId,imdbId,tmdbId\n")])?;
        let mut archive = ZipTableArchive::new(Cursor::new(bytes), "mem.zip")?;

        assert_eq!(archive.entry_names(), &names(&["ml/", "ml/links.csv"])[..]);
        assert_eq!(archive.read_entry("ml/links.csv")?, b"movieId,imdbId,tmdbId\n");
        assert!(matches!(
            archive.read_entry("ml/nope.csv"),
            Err(ImporterError::NotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn garbage_is_archive_error() {
        let err = ZipTableArchive::new(Cursor::new(b"not a zip".to_vec()), "junk.zip")
            .err()
            .expect("garbage must not open");
        assert!(matches!(err, ImporterError::Archive { ref path, .. } if path.ends_with("junk.zip")));
    }

    #[test]
    fn missing_file_is_archive_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ZipTableArchive::open(dir.path().join("absent.zip"))
            .err()
            .expect("absent file must not open");
        assert!(matches!(err, ImporterError::Archive { .. }));
    }
}
