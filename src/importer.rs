// src/importer.rs

use std::{
    collections::HashMap,
    env,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info, instrument};

use crate::archive::{self, TableArchive, ZipTableArchive};
use crate::dataset::{DatasetSource, Profile};
use crate::error::{ImporterError, Result};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::links::{LinkTable, LINKS_TABLE, MOVIE_ID};
use crate::table::{decode, parse_records, Table};

/// Configures an [`Importer`]. Nothing touches the disk or network until the
/// built importer is first asked for data.
#[derive(Debug, Clone)]
pub struct ImporterBuilder<F = HttpFetcher> {
    dataset: String,
    filename: Option<PathBuf>,
    parse: bool,
    normalize_imdb: bool,
    cache_dir: Option<PathBuf>,
    fetcher: F,
}

impl Default for ImporterBuilder<HttpFetcher> {
    fn default() -> Self {
        Self {
            dataset: Profile::Small.name().to_string(),
            filename: None,
            parse: true,
            normalize_imdb: false,
            cache_dir: None,
            fetcher: HttpFetcher::new(),
        }
    }
}

impl ImporterBuilder<HttpFetcher> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<F: Fetcher> ImporterBuilder<F> {
    /// Named profile to download when no explicit file is given.
    pub fn dataset(mut self, name: impl Into<String>) -> Self {
        self.dataset = name.into();
        self
    }

    /// Read this archive instead of a downloaded profile.
    pub fn filename(mut self, path: impl Into<PathBuf>) -> Self {
        self.filename = Some(path.into());
        self
    }

    /// When false, tables come back as raw text.
    pub fn parse(mut self, parse: bool) -> Self {
        self.parse = parse;
        self
    }

    /// Rewrite enriched `imdbId` values as `tt` + seven digits.
    pub fn normalize_imdb(mut self, normalize: bool) -> Self {
        self.normalize_imdb = normalize;
        self
    }

    /// Directory holding downloaded profiles. Defaults to the OS temp dir.
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn fetcher<G: Fetcher>(self, fetcher: G) -> ImporterBuilder<G> {
        ImporterBuilder {
            dataset: self.dataset,
            filename: self.filename,
            parse: self.parse,
            normalize_imdb: self.normalize_imdb,
            cache_dir: self.cache_dir,
            fetcher,
        }
    }

    /// Validate the configuration. Fails with `Config` on an unknown profile.
    pub fn build(self) -> Result<Importer<F>> {
        let cache_dir = self.cache_dir.unwrap_or_else(env::temp_dir);
        let source = DatasetSource::resolve(&self.dataset, self.filename, &cache_dir)?;
        debug!(?source, "resolved data set");

        Ok(Importer {
            source,
            parse: self.parse,
            normalize_imdb: self.normalize_imdb,
            fetcher: self.fetcher,
            state: ArchiveState::Unloaded,
            tables: HashMap::new(),
            links: None,
        })
    }

    /// Build around an archive that is already open; the importer will not
    /// fetch or open anything itself. No file backs such an archive, so
    /// `archive_path` keeps failing with `State`.
    pub fn build_with_archive<A>(self, archive: A) -> Result<Importer<F>>
    where
        A: TableArchive + 'static,
    {
        let mut importer = self.build()?;
        importer.state = ArchiveState::Loaded {
            archive: Box::new(archive),
            path: None,
        };
        Ok(importer)
    }
}

enum ArchiveState {
    Unloaded,
    Loaded {
        archive: Box<dyn TableArchive>,
        /// File the archive was opened from, if any.
        path: Option<PathBuf>,
    },
    /// Load failed once; the importer stays unusable.
    Failed(String),
}

/// Lazily loads a MovieLens archive and serves its tables, enriching rows
/// that carry a `movieId` with the identifiers from `links.csv`.
///
/// Tables and links are parsed once and cached for the life of the value.
/// Not meant to be shared across threads: every read takes `&mut self`.
/// The archive file handle is released when the importer is dropped.
pub struct Importer<F = HttpFetcher> {
    source: DatasetSource,
    parse: bool,
    normalize_imdb: bool,
    fetcher: F,
    state: ArchiveState,
    tables: HashMap<String, Table>,
    links: Option<Arc<LinkTable>>,
}

impl Importer<HttpFetcher> {
    pub fn builder() -> ImporterBuilder<HttpFetcher> {
        ImporterBuilder::new()
    }
}

impl<F: Fetcher> Importer<F> {
    pub fn source(&self) -> &DatasetSource {
        &self.source
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, ArchiveState::Loaded { .. })
    }

    /// Open the archive, downloading it first when the cache file is missing.
    fn open_archive(&self) -> Result<Box<dyn TableArchive>> {
        if let DatasetSource::Remote {
            profile,
            uri,
            cache_path,
        } = &self.source
        {
            if cache_path.is_file() {
                info!(path = %cache_path.display(), "loading from cache file");
            } else {
                info!(%profile, %uri, path = %cache_path.display(), "downloading data set");
                self.fetcher.fetch(uri, cache_path)?;
            }
        }

        let path = self.source.local_path();
        let archive = ZipTableArchive::open(path)?;
        info!(
            path = %path.display(),
            entries = archive.entry_names().len(),
            "archive opened"
        );
        Ok(Box::new(archive))
    }

    fn ensure_loaded(&mut self) -> Result<&mut dyn TableArchive> {
        if let ArchiveState::Unloaded = self.state {
            match self.open_archive() {
                Ok(archive) => {
                    self.state = ArchiveState::Loaded {
                        archive,
                        path: Some(self.source.local_path().to_path_buf()),
                    }
                }
                Err(e) => {
                    self.state = ArchiveState::Failed(e.to_string());
                    return Err(e);
                }
            }
        }

        match &mut self.state {
            ArchiveState::Loaded { archive, .. } => Ok(&mut **archive),
            ArchiveState::Failed(reason) => Err(ImporterError::Unavailable(reason.clone())),
            ArchiveState::Unloaded => Err(ImporterError::State),
        }
    }

    /// Text of the single entry whose name ends with the path component(s) `table`.
    pub fn read_raw(&mut self, table: &str) -> Result<String> {
        let container = self.ensure_loaded()?;
        let entry = archive::find_entry(container.entry_names(), table)?.to_string();
        debug!(table, entry = %entry, "reading entry");
        let bytes = container.read_entry(&entry)?;
        decode(table, bytes)
    }

    /// The `movieId` link table, loaded on first use.
    pub fn links(&mut self) -> Result<Arc<LinkTable>> {
        if let Some(links) = &self.links {
            return Ok(Arc::clone(links));
        }

        let text = self.read_raw(LINKS_TABLE)?;
        let parsed = parse_records(LINKS_TABLE, &text)?;
        let links = Arc::new(LinkTable::from_parsed(&parsed)?);
        debug!(count = links.len(), "link table built");

        self.links = Some(Arc::clone(&links));
        Ok(links)
    }

    /// Read `table`, parsing and enriching it unless parsing is disabled.
    /// Repeat calls return the cached content without touching the archive.
    #[instrument(level = "debug", skip(self))]
    pub fn read_table(&mut self, table: &str) -> Result<Table> {
        if let Some(cached) = self.tables.get(table) {
            debug!("cache hit");
            return Ok(cached.clone());
        }

        let text = self.read_raw(table)?;
        let loaded = if !self.parse {
            Table::Raw(Arc::from(text))
        } else {
            let mut parsed = parse_records(table, &text)?;
            if table == LINKS_TABLE {
                // later links() calls reuse this parse
                if self.links.is_none() {
                    if let Ok(links) = LinkTable::from_parsed(&parsed) {
                        self.links = Some(Arc::new(links));
                    }
                }
            } else if parsed.has_column(MOVIE_ID) {
                let links = self.links()?;
                links.enrich(&mut parsed.records, self.normalize_imdb);
            }
            debug!(rows = parsed.records.len(), "parsed");
            Table::Rows(Arc::new(parsed.records))
        };

        self.tables.insert(table.to_string(), loaded.clone());
        Ok(loaded)
    }

    /// Base names of every file in the archive, in archive order.
    pub fn table_names(&mut self) -> Result<Vec<String>> {
        let container = self.ensure_loaded()?;
        Ok(archive::table_names(container.entry_names()))
    }

    /// Local path of the loaded archive. `State` until something has loaded it.
    pub fn archive_path(&self) -> Result<&Path> {
        match &self.state {
            ArchiveState::Loaded {
                path: Some(path), ..
            } => Ok(path.as_path()),
            _ => Err(ImporterError::State),
        }
    }
}
