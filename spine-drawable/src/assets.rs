use crate::Error;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Source of raw asset bytes (atlas text, skeleton JSON, page images).
pub trait AssetSource {
    fn read(&self, path: &str) -> Result<Vec<u8>, Error>;

    fn read_to_string(&self, path: &str) -> Result<String, Error> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|_| Error::InvalidUtf8 {
            path: path.to_string(),
        })
    }
}

/// Reads assets from disk, searching an ordered list of resource directories.
#[derive(Clone, Debug, Default)]
pub struct FileSystem {
    resource_paths: Vec<PathBuf>,
}

impl FileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_resource_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.resource_paths.contains(&path) {
            self.resource_paths.push(path);
        }
    }

    pub fn resource_paths(&self) -> &[PathBuf] {
        &self.resource_paths
    }

    /// First existing candidate: the path as given, then each resource path joined with it.
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        let direct = Path::new(path);
        if direct.is_file() {
            return Some(direct.to_path_buf());
        }
        if direct.is_absolute() {
            return None;
        }
        self.resource_paths
            .iter()
            .map(|root| root.join(path))
            .find(|candidate| candidate.is_file())
    }
}

impl AssetSource for FileSystem {
    fn read(&self, path: &str) -> Result<Vec<u8>, Error> {
        let resolved = self.resolve(path).ok_or_else(|| Error::AssetNotFound {
            path: path.to_string(),
        })?;
        log::debug!("reading asset {}", resolved.display());
        std::fs::read(&resolved).map_err(|source| Error::Io {
            path: resolved.display().to_string(),
            source,
        })
    }
}

/// In-memory assets keyed by path, for embedded data.
#[derive(Clone, Debug, Default)]
pub struct MemoryAssets {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }

    pub fn with(mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }
}

impl AssetSource for MemoryAssets {
    fn read(&self, path: &str) -> Result<Vec<u8>, Error> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| Error::AssetNotFound {
                path: path.to_string(),
            })
    }
}

impl<A: AssetSource + ?Sized> AssetSource for &A {
    fn read(&self, path: &str) -> Result<Vec<u8>, Error> {
        (**self).read(path)
    }
}

/// Resolves `name` against the directory containing `file`.
///
/// Atlas page names are relative to the atlas file, so `sibling_path("chars/witch.atlas",
/// "witch.png")` yields `chars/witch.png`.
pub fn sibling_path(file: &str, name: &str) -> String {
    match file.rfind(['/', '\\']) {
        Some(split) => format!("{}{}", &file[..=split], name),
        None => name.to_string(),
    }
}
