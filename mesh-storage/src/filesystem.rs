//! Filesystem storage adapter: one generated module file per key.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mesh_core::{MeshResult, StoreConfig, StorageError, DEFAULT_MODULE_EXTENSION};
use tracing::debug;

use crate::adapter::StoreStorageAdapter;
use crate::module::{normalize_module_text, ArtifactModule};
use crate::options::ProxyOptions;

/// Adapter persisting every key as `<root>/<key>.<extension>`.
///
/// Absolute keys are used as paths directly and ignore the root. Writes go to
/// a sibling temporary file which is then renamed over the target, so a
/// reader never observes a half-written module. Deleting a missing key is an
/// I/O error.
#[derive(Debug, Clone)]
pub struct FileSystemStorageAdapter {
    root: PathBuf,
    extension: String,
}

impl FileSystemStorageAdapter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: DEFAULT_MODULE_EXTENSION.to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.root_dir.clone()).with_extension(config.extension.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// File path backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file = format!("{}.{}", key, self.extension);
        if Path::new(key).is_absolute() {
            PathBuf::from(file)
        } else {
            self.root.join(file)
        }
    }
}

fn io_error(key: &str, err: io::Error) -> StorageError {
    if err.kind() == io::ErrorKind::NotFound {
        return StorageError::NotFound {
            key: key.to_string(),
        };
    }
    StorageError::Io {
        key: key.to_string(),
        reason: err.to_string(),
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[async_trait]
impl StoreStorageAdapter for FileSystemStorageAdapter {
    async fn exists(&self, key: &str) -> MeshResult<bool> {
        let path = self.path_for(key);
        let found = tokio::fs::try_exists(&path)
            .await
            .map_err(|e| io_error(key, e))?;
        Ok(found)
    }

    async fn read<O: ProxyOptions>(&self, key: &str, options: &O) -> MeshResult<O::Value> {
        let path = self.path_for(key);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| io_error(key, e))?;
        debug!(key, path = %path.display(), strategy = options.name(), "Loading artifact module");

        let export = ArtifactModule::parse(&text, key)?.into_default_export(key)?;
        options.load(export, key)
    }

    async fn write<O: ProxyOptions>(
        &self,
        key: &str,
        value: &O::Value,
        options: &O,
    ) -> MeshResult<()> {
        let path = self.path_for(key);
        let text = normalize_module_text(&options.codify(value, key)?);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(key, e))?;
        }

        let temp = temp_path(&path);
        tokio::fs::write(&temp, text.as_bytes())
            .await
            .map_err(|e| io_error(key, e))?;
        tokio::fs::rename(&temp, &path)
            .await
            .map_err(|e| io_error(key, e))?;

        debug!(key, path = %path.display(), bytes = text.len(), "Wrote artifact module");
        Ok(())
    }

    async fn delete(&self, key: &str) -> MeshResult<()> {
        let path = self.path_for(key);
        tokio::fs::remove_file(&path).await.map_err(|e| StorageError::Io {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        debug!(key, path = %path.display(), "Deleted artifact module");
        Ok(())
    }
}
