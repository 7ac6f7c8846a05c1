use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::fs;
use uuid::Uuid;

use super::snapshot::ProgressSnapshot;
use crate::game::grid::LetterGrid;

/// Identifies one player's progress on one puzzle
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgressKey {
    pub player: Uuid,
    pub puzzle_id: String,
}

impl ProgressKey {
    pub fn new(player: Uuid, puzzle_id: impl Into<String>) -> Self {
        Self {
            player,
            puzzle_id: puzzle_id.into(),
        }
    }
}

/// Durable keyed storage for serialized progress snapshots
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn read(&self, key: &ProgressKey) -> Result<Option<String>>;
    async fn write(&self, key: &ProgressKey, contents: String) -> Result<()>;
    async fn remove(&self, key: &ProgressKey) -> Result<()>;
}

/// Serialize and store a snapshot
pub async fn save_snapshot(
    store: &dyn ProgressStore,
    key: &ProgressKey,
    snapshot: &ProgressSnapshot,
) -> Result<()> {
    let contents = snapshot.to_json().context("Failed to serialize progress snapshot")?;
    store.write(key, contents).await
}

/// Load a snapshot for `key`, checked against the puzzle grid.
///
/// Missing, unreadable and corrupt snapshots all come back as `None`; the
/// caller starts from empty progress.
pub async fn load_snapshot(
    store: &dyn ProgressStore,
    key: &ProgressKey,
    grid: &LetterGrid,
) -> Option<ProgressSnapshot> {
    let raw = match store.read(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(
                "Failed to read progress for player {} puzzle {}: {:#}",
                key.player,
                key.puzzle_id,
                e
            );
            return None;
        }
    };

    match ProgressSnapshot::parse(&raw, grid) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            tracing::warn!(
                "Discarding corrupt progress for player {} puzzle {}: {}",
                key.player,
                key.puzzle_id,
                e
            );
            None
        }
    }
}

/// Stores each snapshot as `<root>/<player>/puzzle_<id>.json`
pub struct FileProgressStore {
    root: PathBuf,
}

impl FileProgressStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &ProgressKey) -> PathBuf {
        self.root
            .join(key.player.to_string())
            .join(format!("puzzle_{}.json", file_safe(&key.puzzle_id)))
    }
}

/// Escape a puzzle id so it is a single safe path component
fn file_safe(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c.to_string()
            } else {
                format!("_{:x}", c as u32)
            }
        })
        .collect()
}

#[async_trait]
impl ProgressStore for FileProgressStore {
    async fn read(&self, key: &ProgressKey) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    async fn write(&self, key: &ProgressKey, contents: String) -> Result<()> {
        let path = self.path_for(key);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        // Write then rename so a crash never leaves a half-written snapshot
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        Ok(())
    }

    async fn remove(&self, key: &ProgressKey) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }
}

/// Non-durable store used when no progress directory is wanted, and in tests
#[derive(Default)]
pub struct MemoryProgressStore {
    entries: DashMap<ProgressKey, String>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn read(&self, key: &ProgressKey) -> Result<Option<String>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn write(&self, key: &ProgressKey, contents: String) -> Result<()> {
        self.entries.insert(key.clone(), contents);
        Ok(())
    }

    async fn remove(&self, key: &ProgressKey) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}
