//! SQLite persistence for vector indexes.
//!
//! One database file holds exactly one index. Embeddings are stored as
//! little-endian `f32` blobs so a reloaded index scores queries bit-for-bit
//! like the original.

use super::{IndexMetadata, VectorIndex};
use crate::chunking::Chunk;
use crate::error::{Result, WatchpostError};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::{info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS index_meta (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        source TEXT NOT NULL,
        fetched_at TEXT NOT NULL,
        created_time TEXT NOT NULL,
        upload_time TEXT,
        dimensions INTEGER NOT NULL,
        built_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS chunks (
        ordinal INTEGER PRIMARY KEY,
        content TEXT NOT NULL,
        start_offset INTEGER NOT NULL,
        overlap INTEGER NOT NULL,
        embedding BLOB NOT NULL
    );
"#;

/// Write `index` to `path`, replacing any previous index in one transaction.
#[instrument(skip(index))]
pub(super) fn persist(index: &VectorIndex, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;

    let tx = conn.transaction()?;
    tx.execute("DELETE FROM chunks", [])?;
    tx.execute("DELETE FROM index_meta", [])?;

    let meta = index.metadata();
    tx.execute(
        r#"
        INSERT INTO index_meta (id, source, fetched_at, created_time, upload_time, dimensions, built_at)
        VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            meta.source,
            meta.fetched_at.to_rfc3339(),
            meta.created_time,
            meta.upload_time,
            meta.dimensions as i64,
            meta.built_at.to_rfc3339(),
        ],
    )?;

    {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO chunks (ordinal, content, start_offset, overlap, embedding)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )?;

        for entry in index.entries() {
            stmt.execute(params![
                entry.chunk.ordinal as i64,
                entry.chunk.text,
                entry.chunk.start as i64,
                entry.chunk.overlap as i64,
                embedding_to_bytes(&entry.embedding),
            ])?;
        }
    }

    tx.commit()?;
    info!("Persisted index with {} chunks to {:?}", index.len(), path);
    Ok(())
}

/// Read the index stored at `path`.
#[instrument]
pub(super) fn load(path: &Path) -> Result<VectorIndex> {
    if !path.exists() {
        return Err(WatchpostError::Index(format!(
            "No index found at {}. Run 'watchpost refresh' first.",
            path.display()
        )));
    }

    let conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;

    let metadata = conn
        .query_row(
            "SELECT source, fetched_at, created_time, upload_time, dimensions, built_at FROM index_meta WHERE id = 1",
            [],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, String>(5)?,
                ))
            },
        )
        .optional()?
        .ok_or_else(|| WatchpostError::Index(format!("{} holds no index", path.display())))?;

    let (source, fetched_at, created_time, upload_time, dimensions, built_at) = metadata;
    let metadata = IndexMetadata {
        source,
        fetched_at: parse_timestamp(&fetched_at)?,
        created_time,
        upload_time,
        dimensions: dimensions as usize,
        built_at: parse_timestamp(&built_at)?,
    };

    let mut stmt = conn.prepare(
        "SELECT ordinal, content, start_offset, overlap, embedding FROM chunks ORDER BY ordinal",
    )?;

    let rows = stmt.query_map([], |row| {
        let ordinal: i64 = row.get(0)?;
        let start: i64 = row.get(2)?;
        let overlap: i64 = row.get(3)?;
        let embedding: Vec<u8> = row.get(4)?;
        Ok((
            Chunk::new(ordinal as usize, row.get(1)?, start as usize, overlap as usize),
            bytes_to_embedding(&embedding),
        ))
    })?;

    let entries = rows.collect::<std::result::Result<Vec<_>, _>>()?;

    if entries.iter().any(|(_, e)| e.len() != metadata.dimensions) {
        return Err(WatchpostError::Index(format!(
            "{} holds embeddings that do not match {} dimensions",
            path.display(),
            metadata.dimensions
        )));
    }

    info!("Loaded index with {} chunks from {:?}", entries.len(), path);
    Ok(VectorIndex::from_parts(metadata, entries))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| WatchpostError::Index(format!("Invalid timestamp '{}': {}", value, e)))
}

/// Serialize embedding to bytes.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize embedding from bytes.
fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use crate::index::IndexMetadata;

    #[test]
    fn test_embedding_bytes() {
        let embedding = vec![0.1f32, -2.5, f32::MIN_POSITIVE, 0.0];
        assert_eq!(bytes_to_embedding(&embedding_to_bytes(&embedding)), embedding);
    }

    #[tokio::test]
    async fn test_persist_replaces_previous_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("index.db");
        let embedder = HashingEmbedder::new(32);

        let first = VectorIndex::build(
            crate::chunking::split("first report with several words in it", 12, 3).unwrap(),
            &embedder,
            IndexMetadata::new("a.pdf", Utc::now(), "09:00"),
        )
        .await
        .unwrap();
        first.persist(&path).unwrap();

        let second = VectorIndex::build(
            vec![Chunk::new(0, "second".to_string(), 0, 0)],
            &embedder,
            IndexMetadata::new("b.pdf", Utc::now(), "10:00")
                .with_upload_time(Some("10:05".to_string())),
        )
        .await
        .unwrap();
        second.persist(&path).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.metadata().source, "b.pdf");
        assert_eq!(loaded.metadata().created_time, "10:00");
        assert_eq!(loaded.metadata().upload_time.as_deref(), Some("10:05"));
        assert_eq!(loaded, second);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load(&dir.path().join("missing.db"));
        assert!(matches!(result, Err(WatchpostError::Index(_))));
    }
}
