//! SQLite-backed vector index
//!
//! Entries are append-only. Each `insert` call is one transaction, so a
//! failed batch never leaves partial rows behind. Search is an exact cosine
//! scan over every stored vector in insertion order.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkSource, Document, ScoredChunk, StoreStats};

/// File holding the index inside the index directory
pub const INDEX_FILE_NAME: &str = "index.sqlite3";

const DIMENSION_KEY: &str = "dimension";

/// SQLite-based vector store
pub struct SqliteVectorStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteVectorStore {
    /// Open the index in `directory`, creating the directory and an empty index if needed.
    ///
    /// Opening the same directory repeatedly yields the same state.
    pub fn open_or_create<P: AsRef<Path>>(directory: P) -> Result<Self> {
        let directory = directory.as_ref();
        std::fs::create_dir_all(directory).map_err(|e| {
            Error::store_write(format!(
                "Failed to create index directory '{}': {}",
                directory.display(),
                e
            ))
        })?;

        let path = directory.join(INDEX_FILE_NAME);
        let existed = path.exists();
        let conn = Connection::open(&path)
            .map_err(|e| Error::store_read(format!("Failed to open index: {}", e)))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.migrate()?;

        tracing::info!(
            path = %directory.display(),
            existed,
            entries = store.count()?,
            "Vector index opened"
        );
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::store_read(format!("Failed to open in-memory index: {}", e)))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA foreign_keys=ON;
            "#,
        )
        .map_err(|e| Error::store_read(format!("Index is unreadable or corrupted: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS store_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                filename TEXT NOT NULL,
                content_hash TEXT NOT NULL UNIQUE,
                file_size INTEGER NOT NULL,
                page_count INTEGER NOT NULL,
                chunk_count INTEGER NOT NULL,
                ingested_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS entries (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                chunk_id TEXT NOT NULL UNIQUE,
                document_id TEXT NOT NULL REFERENCES documents(id),
                filename TEXT NOT NULL,
                page_number INTEGER NOT NULL,
                chunk_index INTEGER NOT NULL,
                char_start INTEGER NOT NULL,
                char_end INTEGER NOT NULL,
                overlap INTEGER NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_entries_document_id ON entries(document_id);
            "#,
        )
        .map_err(|e| Error::store_read(format!("Failed to initialise index schema: {}", e)))?;

        Ok(())
    }

    /// Number of stored entries
    pub fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))
            .map_err(|e| Error::store_read(format!("Failed to count entries: {}", e)))?;
        Ok(count as usize)
    }

    /// Vector dimension recorded by the first insert
    pub fn dimension(&self) -> Result<Option<usize>> {
        let conn = self.conn.lock();
        read_dimension(&conn)
    }

    /// Append a document and its embedded chunks atomically.
    ///
    /// Every chunk must carry an embedding of the index dimension; the first
    /// insert into an empty index fixes that dimension.
    pub fn insert(&self, document: &Document, chunks: &[Chunk]) -> Result<()> {
        let vectors = chunks
            .iter()
            .map(|chunk| {
                chunk.embedding.as_deref().ok_or_else(|| {
                    Error::store_write(format!("Chunk {} has no embedding", chunk.id))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut conn = self.conn.lock();

        let batch_dimension = match vectors.first() {
            Some(first) => {
                let dim = first.len();
                if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
                    return Err(Error::store_write(format!(
                        "Batch mixes {} and {} dimensional vectors",
                        dim,
                        bad.len()
                    )));
                }
                Some(dim)
            }
            None => None,
        };

        let stored_dimension = read_dimension(&conn)?;
        if let (Some(stored), Some(batch)) = (stored_dimension, batch_dimension) {
            if stored != batch {
                return Err(Error::store_write(format!(
                    "Vector dimension {} does not match index dimension {}",
                    batch, stored
                )));
            }
        }

        let tx = conn
            .transaction()
            .map_err(|e| Error::store_write(format!("Failed to begin transaction: {}", e)))?;

        if let (None, Some(batch)) = (stored_dimension, batch_dimension) {
            tx.execute(
                "INSERT INTO store_meta (key, value) VALUES (?1, ?2)",
                params![DIMENSION_KEY, batch.to_string()],
            )
            .map_err(|e| Error::store_write(format!("Failed to record dimension: {}", e)))?;
        }

        tx.execute(
            r#"
            INSERT INTO documents (id, filename, content_hash, file_size, page_count, chunk_count, ingested_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                document.id.to_string(),
                document.filename,
                document.content_hash,
                document.file_size as i64,
                document.page_count as i64,
                chunks.len() as i64,
                document.ingested_at.to_rfc3339(),
            ],
        )
        .map_err(|e| Error::store_write(format!("Failed to register document: {}", e)))?;

        {
            let mut stmt = tx
                .prepare(
                    r#"
                    INSERT INTO entries (
                        chunk_id, document_id, filename, page_number, chunk_index,
                        char_start, char_end, overlap, content, embedding
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                    "#,
                )
                .map_err(|e| Error::store_write(format!("Failed to prepare statement: {}", e)))?;

            for (chunk, vector) in chunks.iter().zip(&vectors) {
                stmt.execute(params![
                    chunk.id.to_string(),
                    chunk.document_id.to_string(),
                    chunk.source.filename,
                    chunk.source.page_number as i64,
                    chunk.chunk_index as i64,
                    chunk.source.char_start as i64,
                    chunk.source.char_end as i64,
                    chunk.overlap as i64,
                    chunk.content,
                    encode_vector(vector),
                ])
                .map_err(|e| Error::store_write(format!("Failed to insert entry: {}", e)))?;
            }
        }

        tx.commit()
            .map_err(|e| Error::store_write(format!("Failed to commit transaction: {}", e)))?;

        Ok(())
    }

    /// Up to `k` nearest entries by cosine similarity, best first.
    ///
    /// Equal scores keep insertion order.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let conn = self.conn.lock();
        match read_dimension(&conn)? {
            None => return Ok(Vec::new()),
            Some(dim) if dim != vector.len() => {
                return Err(Error::store_read(format!(
                    "Query vector has {} dimensions, index holds {}",
                    vector.len(),
                    dim
                )));
            }
            Some(_) => {}
        }

        let mut stmt = conn
            .prepare(
                r#"
                SELECT chunk_id, document_id, filename, page_number, chunk_index,
                       char_start, char_end, overlap, content, embedding
                FROM entries ORDER BY seq
                "#,
            )
            .map_err(|e| Error::store_read(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], row_to_entry)
            .map_err(|e| Error::store_read(format!("Failed to scan entries: {}", e)))?;

        let mut scored = Vec::new();
        for row in rows {
            let (chunk, blob) =
                row.map_err(|e| Error::store_read(format!("Failed to read entry: {}", e)))?;
            let stored = decode_vector(&blob, vector.len()).ok_or_else(|| {
                Error::store_read(format!("Entry {} has a corrupted embedding", chunk.id))
            })?;
            scored.push(ScoredChunk {
                score: cosine_similarity(vector, &stored),
                chunk,
            });
        }

        // stable sort: ties stay in insertion order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }

    /// Whether a document with this content hash was committed
    pub fn contains_hash(&self, content_hash: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let found = conn
            .query_row(
                "SELECT 1 FROM documents WHERE content_hash = ?1",
                params![content_hash],
                |_| Ok(()),
            )
            .optional()
            .map_err(|e| Error::store_read(format!("Failed to look up content hash: {}", e)))?;
        Ok(found.is_some())
    }

    /// Registered documents in ingestion order
    pub fn documents(&self) -> Result<Vec<Document>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                r#"
                SELECT id, filename, content_hash, file_size, page_count, ingested_at
                FROM documents ORDER BY rowid
                "#,
            )
            .map_err(|e| Error::store_read(format!("Failed to prepare query: {}", e)))?;

        let documents = stmt
            .query_map([], row_to_document)
            .map_err(|e| Error::store_read(format!("Failed to list documents: {}", e)))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::store_read(format!("Failed to read document: {}", e)))?;

        Ok(documents)
    }

    /// Entry, document and dimension counts
    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.conn.lock();
        let (entries, documents): (i64, i64) = conn
            .query_row(
                "SELECT (SELECT COUNT(*) FROM entries), (SELECT COUNT(*) FROM documents)",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(|e| Error::store_read(format!("Failed to read stats: {}", e)))?;

        Ok(StoreStats {
            entries: entries as usize,
            documents: documents as usize,
            dimension: read_dimension(&conn)?,
        })
    }
}

fn read_dimension(conn: &Connection) -> Result<Option<usize>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM store_meta WHERE key = ?1",
            params![DIMENSION_KEY],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| Error::store_read(format!("Failed to read index dimension: {}", e)))?;

    value
        .map(|v| {
            v.parse::<usize>()
                .map_err(|_| Error::store_read(format!("Corrupted index dimension '{}'", v)))
        })
        .transpose()
}

fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<(Chunk, Vec<u8>)> {
    let chunk_id: String = row.get(0)?;
    let document_id: String = row.get(1)?;
    let filename: String = row.get(2)?;
    let page_number: i64 = row.get(3)?;
    let chunk_index: i64 = row.get(4)?;
    let char_start: i64 = row.get(5)?;
    let char_end: i64 = row.get(6)?;
    let overlap: i64 = row.get(7)?;
    let content: String = row.get(8)?;
    let embedding: Vec<u8> = row.get(9)?;

    let chunk = Chunk {
        id: parse_uuid(0, &chunk_id)?,
        document_id: parse_uuid(1, &document_id)?,
        content,
        overlap: overlap as usize,
        chunk_index: chunk_index as usize,
        source: ChunkSource {
            filename,
            page_number: page_number as u32,
            char_start: char_start as usize,
            char_end: char_end as usize,
        },
        embedding: None,
    };

    Ok((chunk, embedding))
}

fn row_to_document(row: &rusqlite::Row) -> rusqlite::Result<Document> {
    let id: String = row.get(0)?;
    let ingested_at: String = row.get(5)?;
    let file_size: i64 = row.get(3)?;
    let page_count: i64 = row.get(4)?;

    Ok(Document {
        id: parse_uuid(0, &id)?,
        filename: row.get(1)?,
        content_hash: row.get(2)?,
        file_size: file_size as u64,
        page_count: page_count as usize,
        ingested_at: DateTime::parse_from_rfc3339(&ingested_at)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| conversion_failure(5, e))?,
    })
}

fn parse_uuid(column: usize, value: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| conversion_failure(column, e))
}

fn conversion_failure<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_vector(blob: &[u8], dimension: usize) -> Option<Vec<f32>> {
    if blob.len() != dimension * 4 {
        return None;
    }
    Some(
        blob.chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
    )
}

/// Cosine similarity; zero vectors score 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
