// src/dataset.rs

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::error::ImporterError;

/// The published MovieLens variants this importer knows how to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    Small,
    Full,
}

impl Profile {
    pub const ALL: [Profile; 2] = [Profile::Small, Profile::Full];

    pub fn name(self) -> &'static str {
        match self {
            Profile::Small => "small",
            Profile::Full => "full",
        }
    }

    pub fn uri(self) -> &'static str {
        match self {
            Profile::Small => "http://files.grouplens.org/datasets/movielens/ml-latest-small.zip",
            Profile::Full => "http://files.grouplens.org/datasets/movielens/ml-latest.zip",
        }
    }

    /// Where a downloaded copy of this profile lives under `cache_dir`.
    pub fn cache_path(self, cache_dir: &Path) -> PathBuf {
        cache_dir.join(format!(".movielens_importer_{}.zip", self.name()))
    }
}

impl FromStr for Profile {
    type Err = ImporterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Profile::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| ImporterError::Config(s.to_string()))
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where the archive for an importer comes from. Fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    /// An archive the caller already has on disk.
    Local(PathBuf),
    /// A named profile, downloaded to `cache_path` unless already there.
    Remote {
        profile: Profile,
        uri: String,
        cache_path: PathBuf,
    },
}

impl DatasetSource {
    /// An explicit `filename` wins; otherwise `dataset` must name a known profile.
    pub fn resolve(
        dataset: &str,
        filename: Option<PathBuf>,
        cache_dir: &Path,
    ) -> Result<Self, ImporterError> {
        if let Some(path) = filename {
            return Ok(DatasetSource::Local(path));
        }
        let profile: Profile = dataset.parse()?;
        Ok(DatasetSource::Remote {
            profile,
            uri: profile.uri().to_string(),
            cache_path: profile.cache_path(cache_dir),
        })
    }

    /// Local file backing this source, whether or not it exists yet.
    pub fn local_path(&self) -> &Path {
        match self {
            DatasetSource::Local(path) => path,
            DatasetSource::Remote { cache_path, .. } => cache_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_profiles_resolve_to_cache_paths() {
        let dir = Path::new("/tmp/ml");
        for p in Profile::ALL {
            let src = DatasetSource::resolve(p.name(), None, dir).unwrap();
            match src {
                DatasetSource::Remote {
                    profile,
                    uri,
                    cache_path,
                } => {
                    assert_eq!(profile, p);
                    assert_eq!(uri, p.uri());
                    assert_eq!(
                        cache_path,
                        dir.join(format!(".movielens_importer_{}.zip", p.name()))
                    );
                }
                other => panic!("expected remote source, got {:?}", other),
            }
        }
    }

    #[test]
    fn unknown_profile_is_config_error() {
        let err = DatasetSource::resolve("huge", None, Path::new("/tmp")).unwrap_err();
        assert!(matches!(err, ImporterError::Config(ref name) if name == "huge"));
    }

    #[test]
    fn explicit_filename_overrides_profile() {
        let src =
            DatasetSource::resolve("huge", Some(PathBuf::from("ml.zip")), Path::new("/tmp")).unwrap();
        assert_eq!(src, DatasetSource::Local(PathBuf::from("ml.zip")));
        assert_eq!(src.local_path(), Path::new("ml.zip"));
    }
}
