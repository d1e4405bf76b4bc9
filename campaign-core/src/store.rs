//! File-backed key-value store
//!
//! Every value is JSON, keyed by string, and the whole map lives in one file.
//! Each mutation rewrites the file through a temp file + rename so a crash
//! never leaves a half-written store behind. The in-memory map only changes
//! once the new file is in place.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};

use crate::models::{BrandKit, CampaignBriefData, SelectedBrief};

pub const SELECTED_BRIEF_ID_KEY: &str = "selected-brief-id";
pub const SELECTED_BRIEF_KEY: &str = "selected-brief";
pub const BRIEF_DRAFT_KEY: &str = "brief-draft";
pub const BRAND_KIT_KEY: &str = "brand-kit";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Store serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug)]
pub struct KvStore {
    path: PathBuf,
    data: RwLock<BTreeMap<String, Value>>,
}

impl KvStore {
    /// Open the store at `path`, starting empty when the file does not exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let data = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(io_error(&path, e)),
        };

        tracing::info!(path = %path.display(), keys = data.len(), "Key-value store opened");
        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let data = self.data.read().await;
        match data.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => Ok(Some(serde_json::from_value(v.clone())?)),
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value)?;
        self.update(|data| {
            data.insert(key.to_string(), value);
        })
        .await
    }

    /// Remove a key. Returns whether it was present.
    pub async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.update(|data| data.remove(key).is_some()).await
    }

    /// Apply `f` to a copy of the map and persist it as one write.
    ///
    /// The copy replaces the live map only after it is on disk; on error the
    /// store keeps its previous contents.
    pub async fn update<R>(&self, f: impl FnOnce(&mut BTreeMap<String, Value>) -> R) -> Result<R, StoreError> {
        let mut data = self.data.write().await;
        let mut next = data.clone();
        let out = f(&mut next);
        if next != *data {
            self.persist(&next).await?;
            *data = next;
        }
        Ok(out)
    }

    pub async fn keys(&self) -> Vec<String> {
        self.data.read().await.keys().cloned().collect()
    }

    async fn persist(&self, data: &BTreeMap<String, Value>) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(data)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }
        tokio::fs::write(&tmp, &bytes).await.map_err(|e| io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| io_error(&self.path, e))?;

        tracing::debug!(path = %self.path.display(), keys = data.len(), "Store persisted");
        Ok(())
    }

    // ========================================================================
    // Typed helpers
    // ========================================================================

    /// The stored brand kit, or the default one when none was saved.
    pub async fn brand_kit(&self) -> Result<BrandKit, StoreError> {
        Ok(self.get(BRAND_KIT_KEY).await?.unwrap_or_default())
    }

    pub async fn save_brand_kit(&self, kit: &BrandKit) -> Result<(), StoreError> {
        self.set(BRAND_KIT_KEY, kit).await
    }

    pub async fn brief_draft(&self) -> Result<Option<CampaignBriefData>, StoreError> {
        self.get(BRIEF_DRAFT_KEY).await
    }

    pub async fn save_brief_draft(&self, brief: &CampaignBriefData) -> Result<(), StoreError> {
        self.set(BRIEF_DRAFT_KEY, brief).await
    }

    pub async fn clear_brief_draft(&self) -> Result<bool, StoreError> {
        self.delete(BRIEF_DRAFT_KEY).await
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

// ============================================================================
// BriefStore
// ============================================================================

/// Selected-brief accessors with change notification.
#[derive(Debug, Clone)]
pub struct BriefStore {
    kv: Arc<KvStore>,
    changes: broadcast::Sender<Option<SelectedBrief>>,
}

impl BriefStore {
    pub fn new(kv: Arc<KvStore>) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self { kv, changes }
    }

    /// Receive the new selection (or `None` when cleared) after every change.
    pub fn subscribe(&self) -> broadcast::Receiver<Option<SelectedBrief>> {
        self.changes.subscribe()
    }

    pub async fn selected_brief_id(&self) -> Result<Option<String>, StoreError> {
        Ok(self
            .kv
            .get::<String>(SELECTED_BRIEF_ID_KEY)
            .await?
            .filter(|id| !id.is_empty()))
    }

    pub async fn selected_brief(&self) -> Result<Option<SelectedBrief>, StoreError> {
        self.kv.get(SELECTED_BRIEF_KEY).await
    }

    /// Store the id and the brief together; either both change or neither does.
    pub async fn set_selected_brief(&self, brief: &SelectedBrief) -> Result<(), StoreError> {
        let value = serde_json::to_value(brief)?;
        self.kv
            .update(|data| {
                data.insert(SELECTED_BRIEF_ID_KEY.to_string(), Value::String(brief.id.clone()));
                data.insert(SELECTED_BRIEF_KEY.to_string(), value);
            })
            .await?;
        // No receivers is fine.
        let _ = self.changes.send(Some(brief.clone()));
        Ok(())
    }

    pub async fn clear_selected_brief(&self) -> Result<(), StoreError> {
        self.kv
            .update(|data| {
                data.remove(SELECTED_BRIEF_ID_KEY);
                data.remove(SELECTED_BRIEF_KEY);
            })
            .await?;
        let _ = self.changes.send(None);
        Ok(())
    }
}
