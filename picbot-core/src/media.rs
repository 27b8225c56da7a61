//! Local media pool: the source of posted pictures and the destination
//! for harvested ones.
//!
//! A pool is a flat directory of image files. The listing is re-read on
//! every pick so files added by an administrator (or by the harvester)
//! become eligible immediately.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rand::Rng;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("failed to read media pool at {path}: {source}")]
    ListDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("media pool at {0} is empty")]
    EmptyPool(PathBuf),

    #[error("harvested file has no usable filename: {0:?}")]
    BadFilename(String),

    #[error("failed to store harvested file at {path}: {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Handle to the pool directory. Cheap to clone; holds no open resources.
#[derive(Debug, Clone)]
pub struct MediaPool {
    dir: PathBuf,
}

impl MediaPool {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Fresh, sorted listing of the regular files in the pool.
    pub fn list(&self) -> Result<Vec<PathBuf>, MediaError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| MediaError::ListDir {
            path: self.dir.clone(),
            source,
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();
        Ok(files)
    }

    /// Pick one file uniformly at random from the current listing.
    pub fn pick_random(&self) -> Result<PathBuf, MediaError> {
        self.pick_with(&mut rand::thread_rng())
    }

    /// Uniform pick with a caller-supplied source of randomness.
    pub fn pick_with(&self, rng: &mut impl Rng) -> Result<PathBuf, MediaError> {
        let mut files = self.list()?;
        if files.is_empty() {
            return Err(MediaError::EmptyPool(self.dir.clone()));
        }
        let idx = rng.gen_range(0..files.len());
        Ok(files.swap_remove(idx))
    }

    /// Store a harvested file under its server-reported filename.
    ///
    /// Only the basename of `filename` is used so a hostile name cannot
    /// escape the pool directory. Collisions are not deduplicated: last
    /// write wins.
    pub fn store(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, MediaError> {
        let basename = Path::new(filename)
            .file_name()
            .ok_or_else(|| MediaError::BadFilename(filename.to_string()))?;
        let path = self.dir.join(basename);
        if path.exists() {
            debug!(path = %path.display(), "overwriting existing pool file");
        }
        fs::write(&path, bytes).map_err(|source| MediaError::Store {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}
