//! File-based memory: persistent JSON-lines storage.
//!
//! Each line is a JSON-encoded [`MemoryRecord`]. The document is loaded on
//! creation and flushed to disk on every write, so reads are served from
//! memory and writes are durable.
//!
//! Storage location: `~/.homeclaw/memory.json` unless configured.

use crate::document::{MemoryDocument, MemoryRecord};
use async_trait::async_trait;
use homeclaw_core::error::MemoryError;
use homeclaw_core::memory::AssistantMemory;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// A file-backed memory store.
pub struct FileMemory {
    path: PathBuf,
    doc: Arc<RwLock<MemoryDocument>>,

    /// Held across mutate-then-flush so snapshots hit the disk in order
    write_lock: Mutex<()>,
}

impl FileMemory {
    /// Open the store at `path`.
    ///
    /// A missing file starts empty; it is created on the first write.
    pub fn new(path: PathBuf) -> Self {
        let doc = Self::load_from_disk(&path);
        debug!(path = %path.display(), facts = doc.facts().len(), "File memory loaded");
        Self {
            path,
            doc: Arc::new(RwLock::new(doc)),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse records, skipping lines that fail to decode.
    fn load_from_disk(path: &Path) -> MemoryDocument {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return MemoryDocument::default(),
        };

        let records = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<MemoryRecord>(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted memory record");
                    None
                }
            });
        MemoryDocument::from_records(records)
    }

    /// Write every record to disk. Callers hold `write_lock`.
    async fn flush(&self) -> Result<(), MemoryError> {
        let doc = self.doc.read().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                MemoryError::Storage(format!("Failed to create memory directory: {e}"))
            })?;
        }

        let mut content = String::new();
        for record in doc.records() {
            let line = serde_json::to_string(&record).map_err(|e| {
                MemoryError::Storage(format!("Failed to serialize memory record: {e}"))
            })?;
            content.push_str(&line);
            content.push('\n');
        }
        drop(doc);

        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to write memory file: {e}")))
    }

    /// Forget everything and persist the empty document.
    pub async fn clear(&self) -> Result<(), MemoryError> {
        let _guard = self.write_lock.lock().await;
        self.doc.write().await.clear();
        self.flush().await
    }

    /// Remove the backing file entirely.
    pub async fn delete_storage(&self) -> Result<(), MemoryError> {
        let _guard = self.write_lock.lock().await;
        self.doc.write().await.clear();
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MemoryError::Storage(format!(
                "Failed to delete memory file: {e}"
            ))),
        }
    }

    pub async fn fact_count(&self) -> usize {
        self.doc.read().await.facts().len()
    }
}

#[async_trait]
impl AssistantMemory for FileMemory {
    fn name(&self) -> &str {
        "file"
    }

    async fn record_interaction(&self, text: &str) -> Result<(), MemoryError> {
        let _guard = self.write_lock.lock().await;
        let changed = self.doc.write().await.record(text);
        if changed {
            self.flush().await?;
        }
        Ok(())
    }

    async fn load(&self) -> Result<(), MemoryError> {
        let _guard = self.write_lock.lock().await;
        let doc = Self::load_from_disk(&self.path);
        *self.doc.write().await = doc;
        Ok(())
    }

    async fn build_prompt(&self) -> Result<String, MemoryError> {
        Ok(self.doc.read().await.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[tokio::test]
    async fn record_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memory.json");

        let mem = FileMemory::new(path.clone());
        mem.record_interaction("I prefer warm white light").await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("I prefer warm white light"));

        let mem2 = FileMemory::new(path);
        assert_eq!(mem2.fact_count().await, 1);
        let prompt = mem2.build_prompt().await.unwrap();
        assert!(prompt.contains("I prefer warm white light"));
    }

    #[tokio::test]
    async fn creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("memory.json");
        let mem = FileMemory::new(path.clone());
        mem.record_interaction("turn on the hall").await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn load_picks_up_external_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memory.json");

        let reader = FileMemory::new(path.clone());
        let writer = FileMemory::new(path);
        writer.record_interaction("Remember the dog is called Rex").await.unwrap();

        assert_eq!(reader.build_prompt().await.unwrap(), "");
        reader.load().await.unwrap();
        assert!(reader.build_prompt().await.unwrap().contains("Rex"));
    }

    #[tokio::test]
    async fn empty_store_builds_empty_prompt() {
        let dir = TempDir::new().unwrap();
        let mem = FileMemory::new(dir.path().join("missing.json"));
        assert_eq!(mem.build_prompt().await.unwrap(), "");
    }

    #[tokio::test]
    async fn blank_utterance_does_not_touch_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memory.json");
        let mem = FileMemory::new(path.clone());
        mem.record_interaction("  ").await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn clear_and_delete_storage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memory.json");
        let mem = FileMemory::new(path.clone());
        mem.record_interaction("I like jazz").await.unwrap();

        mem.clear().await.unwrap();
        assert_eq!(FileMemory::new(path.clone()).fact_count().await, 0);

        mem.delete_storage().await.unwrap();
        assert!(!path.exists());
        // Deleting twice is fine
        mem.delete_storage().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_records_all_reach_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memory.json");
        let mem = Arc::new(FileMemory::new(path.clone()));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let mem = mem.clone();
                tokio::spawn(async move {
                    mem.record_interaction(&format!("I prefer scene number {i}"))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // The last flush on disk must hold every fact, not an older snapshot
        let reopened = FileMemory::new(path);
        assert_eq!(reopened.fact_count().await, 8);
        let prompt = reopened.build_prompt().await.unwrap();
        for i in 0..8 {
            assert!(prompt.contains(&format!("I prefer scene number {i}")));
        }
    }

    #[tokio::test]
    async fn handles_corrupted_lines() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, r#"{{"kind":"fact","content":"I like tea","created_at":"2026-01-01T00:00:00Z"}}"#).unwrap();
        writeln!(tmp, "this is not json").unwrap();
        writeln!(tmp, r#"{{"kind":"interaction","content":"lights off","created_at":"2026-01-01T00:01:00Z"}}"#).unwrap();

        let mem = FileMemory::new(tmp.path().to_path_buf());
        assert_eq!(mem.fact_count().await, 1);
        let prompt = mem.build_prompt().await.unwrap();
        assert!(prompt.contains("I like tea"));
        assert!(prompt.contains("lights off"));
    }
}
