//! MovieLens data set importer.
//!
//! Fetches a MovieLens zip (or opens a local one), reads its CSV tables and
//! fills in `imdbId`/`tmdbId` on every row that carries a `movieId`.
//!
//! ```no_run
//! use movielens_importer::Importer;
//!
//! # fn main() -> movielens_importer::Result<()> {
//! let mut movielens = Importer::builder().dataset("small").normalize_imdb(true).build()?;
//! let ratings = movielens.read_table("ratings.csv")?;
//! println!("{:?}", ratings.rows().and_then(|r| r.first()));
//! println!("{}", movielens.archive_path()?.display());
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod dataset;
pub mod error;
pub mod fetch;
pub mod importer;
pub mod links;
pub mod table;

pub use dataset::{DatasetSource, Profile};
pub use error::{ImporterError, Result};
pub use fetch::{Fetcher, HttpFetcher};
pub use importer::{Importer, ImporterBuilder};
pub use links::{normalize_imdb_id, Link, LinkTable};
pub use table::{Record, Table};
