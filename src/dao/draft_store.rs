//! Durable storage for the single setup draft.

use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::{fs, sync::Mutex};

use crate::dao::{
    models::SetupDraftEntity,
    storage::{StorageError, StorageResult},
};

/// Storage for the setup draft, read when the setup screen loads and written
/// after every roster or header change.
pub trait DraftStore: Send + Sync {
    fn load(&self) -> BoxFuture<'static, StorageResult<Option<SetupDraftEntity>>>;
    fn save(&self, draft: SetupDraftEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn clear(&self) -> BoxFuture<'static, StorageResult<()>>;
}

#[derive(Debug, Error)]
pub enum DraftFileError {
    #[error("failed to read draft file `{path}`")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write draft file `{path}`")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("draft file `{path}` does not contain a valid draft")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode draft")]
    Encode {
        #[source]
        source: serde_json::Error,
    },
}

impl From<DraftFileError> for StorageError {
    fn from(err: DraftFileError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}

/// Draft stored as a single JSON document on disk.
#[derive(Clone)]
pub struct FileDraftStore {
    path: Arc<PathBuf>,
    /// Serialises writers so the temp-file swap never interleaves.
    write_gate: Arc<Mutex<()>>,
}

impl FileDraftStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
            write_gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Option<SetupDraftEntity>, DraftFileError> {
        let path = self.path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(DraftFileError::Read {
                    path: path.clone(),
                    source,
                });
            }
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| DraftFileError::Decode {
                path: path.clone(),
                source,
            })
    }

    async fn write(&self, draft: &SetupDraftEntity) -> Result<(), DraftFileError> {
        let path = self.path.as_ref();
        let payload = serde_json::to_vec_pretty(draft)
            .map_err(|source| DraftFileError::Encode { source })?;

        let _gate = self.write_gate.lock().await;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| DraftFileError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let staging = path.with_extension("json.tmp");
        fs::write(&staging, payload)
            .await
            .map_err(|source| DraftFileError::Write {
                path: staging.clone(),
                source,
            })?;
        fs::rename(&staging, path)
            .await
            .map_err(|source| DraftFileError::Write {
                path: path.clone(),
                source,
            })
    }

    async fn remove(&self) -> Result<(), DraftFileError> {
        let path = self.path.as_ref();
        let _gate = self.write_gate.lock().await;
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(DraftFileError::Write {
                path: path.clone(),
                source,
            }),
        }
    }
}

impl DraftStore for FileDraftStore {
    fn load(&self) -> BoxFuture<'static, StorageResult<Option<SetupDraftEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.read().await.map_err(Into::into) })
    }

    fn save(&self, draft: SetupDraftEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.write(&draft).await.map_err(Into::into) })
    }

    fn clear(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.remove().await.map_err(Into::into) })
    }
}

/// Draft kept in memory only.
#[derive(Clone, Default)]
pub struct MemoryDraftStore {
    slot: Arc<Mutex<Option<SetupDraftEntity>>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DraftStore for MemoryDraftStore {
    fn load(&self) -> BoxFuture<'static, StorageResult<Option<SetupDraftEntity>>> {
        let slot = self.slot.clone();
        Box::pin(async move { Ok(slot.lock().await.clone()) })
    }

    fn save(&self, draft: SetupDraftEntity) -> BoxFuture<'static, StorageResult<()>> {
        let slot = self.slot.clone();
        Box::pin(async move {
            *slot.lock().await = Some(draft);
            Ok(())
        })
    }

    fn clear(&self) -> BoxFuture<'static, StorageResult<()>> {
        let slot = self.slot.clone();
        Box::pin(async move {
            slot.lock().await.take();
            Ok(())
        })
    }
}
