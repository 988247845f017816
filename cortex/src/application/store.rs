// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! Single-writer memory persistence.
//!
//! The memory document is wrapped in a store with a dedicated writer task:
//! investigations commit full snapshots over a channel, reads are served
//! from the in-memory copy. Writes are atomic (temp file + rename), so the
//! file on disk is always the result of a complete write. A corrupt or
//! partial file degrades to an empty memory rather than failing the
//! investigation.

use crate::domain::memory::AgentMemory;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("memory I/O failed: {0}")]
    Io(String),
    #[error("memory serialization failed: {0}")]
    Serde(String),
    #[error("memory writer is gone")]
    WriterGone,
}

struct Commit {
    memory: AgentMemory,
    done: oneshot::Sender<Result<(), MemoryError>>,
}

pub struct MemoryStore {
    snapshot: Arc<RwLock<AgentMemory>>,
    tx: mpsc::Sender<Commit>,
    path: PathBuf,
}

impl MemoryStore {
    /// Default location: `~/.ship/agent_memory.json`.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ship")
            .join("agent_memory.json")
    }

    /// Load (or initialize) the memory file and start the writer task.
    pub async fn open(path: PathBuf) -> Self {
        let memory = load(&path).await;
        let snapshot = Arc::new(RwLock::new(memory));

        let (tx, mut rx) = mpsc::channel::<Commit>(8);
        let writer_path = path.clone();
        tokio::spawn(async move {
            while let Some(commit) = rx.recv().await {
                let result = write_atomic(&writer_path, &commit.memory).await;
                if let Err(ref e) = result {
                    warn!(path = %writer_path.display(), error = %e, "memory write failed; continuing in-memory only");
                }
                let _ = commit.done.send(result);
            }
        });

        Self { snapshot, tx, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current in-memory state, cloned. Readers never block a commit for
    /// longer than the snapshot swap.
    pub async fn snapshot(&self) -> AgentMemory {
        self.snapshot.read().await.clone()
    }

    /// Replace the snapshot and persist it. The returned error is advisory:
    /// callers run degraded (in-memory only) when the disk is unavailable.
    pub async fn commit(&self, memory: AgentMemory) -> Result<(), MemoryError> {
        {
            let mut guard = self.snapshot.write().await;
            *guard = memory.clone();
        }

        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(Commit {
                memory,
                done: done_tx,
            })
            .await
            .map_err(|_| MemoryError::WriterGone)?;
        done_rx.await.map_err(|_| MemoryError::WriterGone)?
    }
}

async fn load(path: &Path) -> AgentMemory {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => match serde_json::from_str::<AgentMemory>(&contents) {
            Ok(memory) => {
                debug!(
                    path = %path.display(),
                    schemas = memory.schemas.len(),
                    patterns = memory.patterns.len(),
                    "loaded agent memory"
                );
                memory
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "memory file did not parse; starting with empty memory");
                AgentMemory::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => AgentMemory::default(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read memory file; starting with empty memory");
            AgentMemory::default()
        }
    }
}

/// Write the document to a sibling temp file, then rename over the target.
async fn write_atomic(path: &Path, memory: &AgentMemory) -> Result<(), MemoryError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| MemoryError::Io(e.to_string()))?;
    }

    let json =
        serde_json::to_string_pretty(memory).map_err(|e| MemoryError::Serde(e.to_string()))?;

    let tmp = path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4()));
    tokio::fs::write(&tmp, json.as_bytes())
        .await
        .map_err(|e| MemoryError::Io(e.to_string()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| MemoryError::Io(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::episode::QuerySuccess;
    use chrono::Utc;

    fn memory_with_one_success() -> AgentMemory {
        let mut memory = AgentMemory::default();
        memory.push_success(QuerySuccess {
            original_intent: "list instances".to_string(),
            generated_sql: "SELECT * FROM aws_ec2_instance".to_string(),
            result_count: 3,
            duration_ms: 120,
            timestamp: Utc::now(),
        });
        memory
    }

    #[tokio::test]
    async fn test_commit_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent_memory.json");

        let store = MemoryStore::open(path.clone()).await;
        store.commit(memory_with_one_success()).await.unwrap();

        // A fresh store reads exactly what was written.
        let reopened = MemoryStore::open(path).await;
        let loaded = reopened.snapshot().await;
        assert_eq!(loaded.successes.len(), 1);
        assert_eq!(loaded.successes[0].original_intent, "list instances");
    }

    #[tokio::test]
    async fn test_load_then_save_is_fixed_point() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent_memory.json");

        let store = MemoryStore::open(path.clone()).await;
        store.commit(memory_with_one_success()).await.unwrap();
        let first = tokio::fs::read_to_string(&path).await.unwrap();

        let reopened = MemoryStore::open(path.clone()).await;
        let snapshot = reopened.snapshot().await;
        reopened.commit(snapshot).await.unwrap();
        let second = tokio::fs::read_to_string(&path).await.unwrap();

        let a: serde_json::Value = serde_json::from_str(&first).unwrap();
        let b: serde_json::Value = serde_json::from_str(&second).unwrap();
        assert_eq!(a["schemas"], b["schemas"]);
        assert_eq!(a["patterns"], b["patterns"]);
        assert_eq!(a["successes"], b["successes"]);
        assert_eq!(a["failures"], b["failures"]);
    }

    #[tokio::test]
    async fn test_corrupt_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent_memory.json");
        tokio::fs::write(&path, b"{ this is not json").await.unwrap();

        let store = MemoryStore::open(path).await;
        let memory = store.snapshot().await;
        assert!(memory.successes.is_empty());
        assert!(memory.schemas.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_memory() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::open(dir.path().join("nope.json")).await;
        assert!(store.snapshot().await.patterns.is_empty());
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent_memory.json");
        let store = MemoryStore::open(path).await;
        store.commit(memory_with_one_success()).await.unwrap();
        store.commit(memory_with_one_success()).await.unwrap();

        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        assert_eq!(names, vec!["agent_memory.json".to_string()]);
    }
}
