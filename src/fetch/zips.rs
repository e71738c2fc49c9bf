// src/fetch/zips.rs

use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use std::{fs, path::Path};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};
use url::Url;

use super::Fetcher;
use crate::error::{ImporterError, Result};

fn retrieval<E>(uri: &str, err: E) -> ImporterError
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    ImporterError::Retrieval {
        uri: uri.to_string(),
        source: err.into(),
    }
}

/// Blocking HTTP download of a whole archive. The client is built on the
/// first download, so an unused fetcher costs nothing.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: OnceCell<Client>,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client: OnceCell::with_value(client),
        }
    }

    fn client(&self) -> &Client {
        self.client.get_or_init(Client::new)
    }
}

impl Fetcher for HttpFetcher {
    /// Streams the body into a temp file next to `dest`, then renames it into place.
    #[instrument(level = "info", skip(self, dest), fields(dest = %dest.display()))]
    fn fetch(&self, uri: &str, dest: &Path) -> Result<u64> {
        let url = Url::parse(uri).map_err(|e| retrieval(uri, e))?;

        let dir = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| retrieval(uri, e))?;

        let mut resp = self
            .client()
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| retrieval(uri, e))?;
        debug!(status = %resp.status(), "response received");

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| retrieval(uri, e))?;
        let written = resp.copy_to(&mut tmp).map_err(|e| retrieval(uri, e))?;
        tmp.as_file().sync_all().map_err(|e| retrieval(uri, e))?;
        tmp.persist(dest).map_err(|e| retrieval(uri, e.error))?;

        info!(bytes = written, "downloaded");
        Ok(written)
    }
}
