//! # Note Storage
//!
//! Where sessions load and save notes. The editor only knows the
//! [`NoteStore`] trait; callers pick the backend.
//!
//! - [`MemoryStore`]: a map behind a lock, for tests and the browser
//! - [`FileStore`]: one `<id>.json` file per note under a directory

use crate::{EditorError, EditorResult};
use async_trait::async_trait;
use nextnote_model::PersistedDoc;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn load_note(&self, id: &str) -> EditorResult<PersistedDoc>;

    async fn save_note(&self, id: &str, doc: PersistedDoc) -> EditorResult<()>;
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    notes: RwLock<HashMap<String, PersistedDoc>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.notes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.notes.read().await.is_empty()
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn load_note(&self, id: &str) -> EditorResult<PersistedDoc> {
        self.notes
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| EditorError::NotFound(id.to_string()))
    }

    async fn save_note(&self, id: &str, doc: PersistedDoc) -> EditorResult<()> {
        self.notes.write().await.insert(id.to_string(), doc);
        Ok(())
    }
}

#[cfg(feature = "store")]
pub use file::FileStore;

#[cfg(feature = "store")]
mod file {
    use super::*;
    use std::path::{Path, PathBuf};
    use tracing::debug;

    /// Notes as pretty-printed JSON files in one directory
    #[derive(Debug, Clone)]
    pub struct FileStore {
        root: PathBuf,
    }

    impl FileStore {
        pub fn new(root: impl Into<PathBuf>) -> Self {
            Self { root: root.into() }
        }

        pub fn root(&self) -> &Path {
            &self.root
        }

        fn path_for(&self, id: &str) -> EditorResult<PathBuf> {
            let valid = !id.is_empty()
                && id != "."
                && id != ".."
                && !id.contains(|c: char| c == '/' || c == '\\' || c.is_control());
            if !valid {
                return Err(EditorError::invalid("id", format!("'{id}' is not a note id")));
            }
            Ok(self.root.join(format!("{id}.json")))
        }
    }

    #[async_trait]
    impl NoteStore for FileStore {
        async fn load_note(&self, id: &str) -> EditorResult<PersistedDoc> {
            let path = self.path_for(id)?;
            let source = match tokio::fs::read_to_string(&path).await {
                Ok(source) => source,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    return Err(EditorError::NotFound(id.to_string()))
                }
                Err(err) => return Err(err.into()),
            };
            debug!(path = %path.display(), bytes = source.len(), "loaded note");
            Ok(serde_json::from_str(&source)?)
        }

        async fn save_note(&self, id: &str, doc: PersistedDoc) -> EditorResult<()> {
            let path = self.path_for(id)?;
            let json = serde_json::to_string_pretty(&doc)?;
            tokio::fs::create_dir_all(&self.root).await?;
            tokio::fs::write(&path, json).await?;
            debug!(path = %path.display(), "saved note");
            Ok(())
        }
    }
}
