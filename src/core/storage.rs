//! Storage - SQLite backend
//!
//! Uses SQLite with FTS5 for full-text search.
//!
//! # Key Points
//! - `facts` holds one row per fact; rationale and links are JSON columns
//! - `fact_links` indexes entity links for entity lookups
//! - `facts_fts` is an external-content FTS5 table kept in sync by triggers
//! - `contradictions` remembers flagged pairs so a rescan does not count them twice
//! - Batch updates run in a single transaction and roll back as a whole

use std::collections::{BTreeMap, HashSet};
use std::path::Path as FilePath;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use ulid::Ulid;

use super::error::MemoryError;
use super::fact::{Category, Fact, FactId, FactPatch, Lifecycle, Provenance, ProvenanceKind, Trust};
use super::store::FactStore;
use super::text::words;

/// Database storage
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open or create a database
    pub fn open(path: &FilePath) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open database")?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")?;

        let storage = Self { conn };
        storage.init_schema()?;

        Ok(storage)
    }

    /// Open an in-memory database (for testing)
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let storage = Self { conn };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS facts (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                summary TEXT,
                provenance_kind TEXT NOT NULL,
                actor TEXT,
                context TEXT,
                learned_at TEXT NOT NULL,
                trust_score REAL NOT NULL,
                rationale TEXT NOT NULL DEFAULT '[]',  -- JSON array
                last_confirmed TEXT,
                support_count INTEGER NOT NULL DEFAULT 0,
                conflict_count INTEGER NOT NULL DEFAULT 0,
                category TEXT NOT NULL,
                links TEXT NOT NULL DEFAULT '[]',  -- JSON array
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                last_used_at TEXT NOT NULL,
                use_count INTEGER NOT NULL DEFAULT 0,
                decay_rate REAL NOT NULL,
                relevance REAL NOT NULL DEFAULT 1.0,
                protected INTEGER NOT NULL DEFAULT 0,
                embedding BLOB  -- little-endian f32
            );

            CREATE INDEX IF NOT EXISTS idx_facts_category ON facts(category);
            CREATE INDEX IF NOT EXISTS idx_facts_created ON facts(created_at);

            CREATE TABLE IF NOT EXISTS fact_links (
                fact_id TEXT NOT NULL,
                entity TEXT NOT NULL,
                PRIMARY KEY (fact_id, entity)
            );

            CREATE INDEX IF NOT EXISTS idx_fact_links_entity ON fact_links(entity);

            -- fact_a < fact_b
            CREATE TABLE IF NOT EXISTS contradictions (
                fact_a TEXT NOT NULL,
                fact_b TEXT NOT NULL,
                reason TEXT NOT NULL,
                flagged_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
                PRIMARY KEY (fact_a, fact_b)
            );

            CREATE VIRTUAL TABLE IF NOT EXISTS facts_fts USING fts5(
                id UNINDEXED,
                content,
                summary,
                content='facts',
                content_rowid='rowid'
            );

            CREATE TRIGGER IF NOT EXISTS facts_ai AFTER INSERT ON facts BEGIN
                INSERT INTO facts_fts(rowid, id, content, summary)
                VALUES (new.rowid, new.id, new.content, new.summary);
            END;

            CREATE TRIGGER IF NOT EXISTS facts_ad AFTER DELETE ON facts BEGIN
                INSERT INTO facts_fts(facts_fts, rowid, id, content, summary)
                VALUES ('delete', old.rowid, old.id, old.content, old.summary);
            END;

            CREATE TRIGGER IF NOT EXISTS facts_au AFTER UPDATE OF content, summary ON facts BEGIN
                INSERT INTO facts_fts(facts_fts, rowid, id, content, summary)
                VALUES ('delete', old.rowid, old.id, old.content, old.summary);
                INSERT INTO facts_fts(rowid, id, content, summary)
                VALUES (new.rowid, new.id, new.content, new.summary);
            END;
            "#,
        )?;

        Ok(())
    }

    /// Run `f` inside one transaction; any error rolls the whole thing back
    fn in_transaction<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let tx = self.conn.unchecked_transaction()?;
        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            // Dropping the transaction rolls it back
            Err(e) => Err(MemoryError::Inconsistent(format!("{:#}", e)).into()),
        }
    }

    fn insert(conn: &Connection, fact: &Fact) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO facts (
                id, content, summary, provenance_kind, actor, context, learned_at,
                trust_score, rationale, last_confirmed, support_count, conflict_count,
                category, links, created_at, updated_at, last_used_at, use_count,
                decay_rate, relevance, protected, embedding
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16, ?17, ?18,
                ?19, ?20, ?21, ?22
            )
            "#,
            params![
                fact.id.to_string(),
                fact.content,
                fact.summary,
                fact.provenance.kind.to_string(),
                fact.provenance.actor,
                fact.provenance.context,
                fact.provenance.learned_at.to_rfc3339(),
                fact.trust.score,
                serde_json::to_string(&fact.trust.rationale)?,
                fact.trust.last_confirmed.map(|dt| dt.to_rfc3339()),
                fact.trust.support_count,
                fact.trust.conflict_count,
                fact.category.to_string(),
                serde_json::to_string(&fact.links)?,
                fact.lifecycle.created_at.to_rfc3339(),
                fact.lifecycle.updated_at.to_rfc3339(),
                fact.lifecycle.last_used_at.to_rfc3339(),
                fact.lifecycle.use_count,
                fact.decay_rate,
                fact.relevance,
                fact.protected,
                fact.embedding.as_deref().map(encode_embedding),
            ],
        )?;
        Self::write_links(conn, fact)?;
        Ok(())
    }

    /// Overwrite the mutable columns of an existing row
    fn write(conn: &Connection, fact: &Fact) -> Result<()> {
        conn.execute(
            r#"
            UPDATE facts SET
                content = ?2, summary = ?3, trust_score = ?4, rationale = ?5,
                last_confirmed = ?6, support_count = ?7, conflict_count = ?8,
                links = ?9, updated_at = ?10, last_used_at = ?11, use_count = ?12,
                decay_rate = ?13, relevance = ?14, protected = ?15, embedding = ?16
            WHERE id = ?1
            "#,
            params![
                fact.id.to_string(),
                fact.content,
                fact.summary,
                fact.trust.score,
                serde_json::to_string(&fact.trust.rationale)?,
                fact.trust.last_confirmed.map(|dt| dt.to_rfc3339()),
                fact.trust.support_count,
                fact.trust.conflict_count,
                serde_json::to_string(&fact.links)?,
                fact.lifecycle.updated_at.to_rfc3339(),
                fact.lifecycle.last_used_at.to_rfc3339(),
                fact.lifecycle.use_count,
                fact.decay_rate,
                fact.relevance,
                fact.protected,
                fact.embedding.as_deref().map(encode_embedding),
            ],
        )?;
        Self::write_links(conn, fact)?;
        Ok(())
    }

    fn write_links(conn: &Connection, fact: &Fact) -> Result<()> {
        let id = fact.id.to_string();
        conn.execute("DELETE FROM fact_links WHERE fact_id = ?1", [&id])?;
        let mut stmt = conn.prepare("INSERT INTO fact_links (fact_id, entity) VALUES (?1, ?2)")?;
        for entity in &fact.links {
            stmt.execute(params![id, entity])?;
        }
        Ok(())
    }

    fn fetch(conn: &Connection, id: &FactId) -> Result<Option<Fact>> {
        conn.query_row("SELECT * FROM facts WHERE id = ?1", [id.to_string()], |row| {
            Self::row_to_fact(row)
        })
        .optional()
        .map_err(Into::into)
    }

    fn patch(conn: &Connection, id: &FactId, patch: FactPatch) -> Result<Option<Fact>> {
        let Some(mut fact) = Self::fetch(conn, id)? else {
            return Ok(None);
        };
        fact.apply(patch, Utc::now());
        Self::write(conn, &fact)?;
        Ok(Some(fact))
    }

    fn query_facts(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Fact>> {
        let mut stmt = self.conn.prepare(sql)?;
        let facts = stmt
            .query_map(params, |row| Self::row_to_fact(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(facts)
    }

    /// Escape and prepare query for FTS5
    /// Each word is quoted and joined with OR so any matching word counts
    fn escape_fts_query(query: &str) -> String {
        words(query)
            .into_iter()
            .map(|w| format!("\"{}\"", w.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(" OR ")
    }

    /// Convert a database row to a Fact
    fn row_to_fact(row: &rusqlite::Row) -> rusqlite::Result<Fact> {
        let rationale_json: String = row.get("rationale")?;
        let links_json: String = row.get("links")?;
        let embedding: Option<Vec<u8>> = row.get("embedding")?;

        Ok(Fact {
            id: parse_column(row, "id")?,
            content: row.get("content")?,
            summary: row.get("summary")?,
            provenance: Provenance {
                kind: parse_column::<ProvenanceKind>(row, "provenance_kind")?,
                actor: row.get("actor")?,
                context: row.get("context")?,
                learned_at: time_column(row, "learned_at")?,
            },
            trust: Trust {
                score: row.get("trust_score")?,
                rationale: serde_json::from_str(&rationale_json).unwrap_or_default(),
                last_confirmed: optional_time_column(row, "last_confirmed")?,
                support_count: row.get("support_count")?,
                conflict_count: row.get("conflict_count")?,
            },
            category: parse_column::<Category>(row, "category")?,
            links: serde_json::from_str(&links_json).unwrap_or_default(),
            lifecycle: Lifecycle {
                created_at: time_column(row, "created_at")?,
                updated_at: time_column(row, "updated_at")?,
                last_used_at: time_column(row, "last_used_at")?,
                use_count: row.get("use_count")?,
            },
            decay_rate: row.get("decay_rate")?,
            relevance: row.get("relevance")?,
            protected: row.get("protected")?,
            embedding: embedding.map(|bytes| decode_embedding(&bytes)),
        })
    }

    /// Get database statistics
    pub fn stats(&self, archive_threshold: f64) -> Result<StorageStats> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM facts", [], |row| row.get(0))?;

        let protected: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM facts WHERE protected = 1",
            [],
            |row| row.get(0),
        )?;

        let archived: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM facts WHERE protected = 0 AND relevance < ?1",
            [archive_threshold],
            |row| row.get(0),
        )?;

        let embedded: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM facts WHERE embedding IS NOT NULL",
            [],
            |row| row.get(0),
        )?;

        let contested: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM facts WHERE conflict_count > 0",
            [],
            |row| row.get(0),
        )?;

        Ok(StorageStats {
            total_facts: total as usize,
            protected_facts: protected as usize,
            archived_facts: archived as usize,
            embedded_facts: embedded as usize,
            contested_facts: contested as usize,
            by_category: self.count_by("category")?,
            by_kind: self.count_by("provenance_kind")?,
        })
    }

    fn count_by(&self, column: &str) -> Result<BTreeMap<String, usize>> {
        let sql = format!("SELECT {column}, COUNT(*) FROM facts GROUP BY {column}");
        let mut stmt = self.conn.prepare(&sql)?;
        let counts = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
            })?
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(counts)
    }
}

impl FactStore for Storage {
    fn create_fact(&self, fact: &Fact) -> Result<()> {
        self.in_transaction(|conn| Self::insert(conn, fact))
    }

    fn get_fact(&self, id: &FactId) -> Result<Option<Fact>> {
        Self::fetch(&self.conn, id)
    }

    fn update_fact(&self, id: &FactId, patch: FactPatch) -> Result<Option<Fact>> {
        self.in_transaction(|conn| Self::patch(conn, id, patch))
    }

    fn update_facts(&self, updates: &[(FactId, FactPatch)]) -> Result<usize> {
        if updates.is_empty() {
            return Ok(0);
        }
        self.in_transaction(|conn| {
            for (id, patch) in updates {
                if Self::patch(conn, id, patch.clone())?.is_none() {
                    anyhow::bail!("fact {} disappeared during update", id);
                }
            }
            Ok(updates.len())
        })
    }

    fn delete_fact(&self, id: &FactId) -> Result<bool> {
        self.in_transaction(|conn| {
            let id = id.to_string();
            conn.execute("DELETE FROM fact_links WHERE fact_id = ?1", [&id])?;
            conn.execute(
                "DELETE FROM contradictions WHERE fact_a = ?1 OR fact_b = ?1",
                [&id],
            )?;
            let deleted = conn.execute("DELETE FROM facts WHERE id = ?1", [&id])?;
            Ok(deleted > 0)
        })
    }

    fn search_by_text(&self, text: &str, limit: usize) -> Result<Vec<Fact>> {
        let fts_query = Self::escape_fts_query(text);
        if fts_query.is_empty() {
            return Ok(Vec::new());
        }

        self.query_facts(
            r#"
            SELECT f.*
            FROM facts f
            JOIN facts_fts ON f.rowid = facts_fts.rowid
            WHERE facts_fts MATCH ?1
            ORDER BY bm25(facts_fts, 0, 1.0, 0.5)
            LIMIT ?2
            "#,
            params![fts_query, sql_limit(limit)],
        )
    }

    fn search_by_category(&self, category: Category, limit: usize) -> Result<Vec<Fact>> {
        self.query_facts(
            "SELECT * FROM facts WHERE category = ?1 ORDER BY created_at DESC LIMIT ?2",
            params![category.to_string(), sql_limit(limit)],
        )
    }

    fn facts_for_entity(&self, entity: &str, limit: usize) -> Result<Vec<Fact>> {
        self.query_facts(
            r#"
            SELECT f.*
            FROM facts f
            JOIN fact_links l ON l.fact_id = f.id
            WHERE l.entity = ?1
            ORDER BY f.created_at DESC
            LIMIT ?2
            "#,
            params![entity, sql_limit(limit)],
        )
    }

    fn all_facts(&self, limit: Option<usize>) -> Result<Vec<Fact>> {
        // LIMIT -1 means no limit in SQLite
        let limit = limit.map_or(-1, sql_limit);
        self.query_facts(
            "SELECT * FROM facts ORDER BY created_at DESC LIMIT ?1",
            params![limit],
        )
    }

    fn all_embeddings(&self) -> Result<Vec<(FactId, Vec<f32>)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, embedding FROM facts WHERE embedding IS NOT NULL")?;
        let rows = stmt
            .query_map([], |row| {
                let id: FactId = parse_column(row, "id")?;
                let bytes: Vec<u8> = row.get("embedding")?;
                Ok((id, decode_embedding(&bytes)))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn contradiction_pairs(&self) -> Result<HashSet<(FactId, FactId)>> {
        let mut stmt = self.conn.prepare("SELECT fact_a, fact_b FROM contradictions")?;
        let pairs = stmt
            .query_map([], |row| {
                let a: FactId = parse_column(row, "fact_a")?;
                let b: FactId = parse_column(row, "fact_b")?;
                Ok((a.min(b), a.max(b)))
            })?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(pairs)
    }

    fn record_contradictions(
        &self,
        pairs: &[(FactId, FactId, String)],
        updates: &[(FactId, FactPatch)],
    ) -> Result<usize> {
        if pairs.is_empty() && updates.is_empty() {
            return Ok(0);
        }
        self.in_transaction(|conn| {
            let mut recorded = 0;
            for (a, b, reason) in pairs {
                let (a, b) = ((*a).min(*b), (*a).max(*b));
                recorded += conn.execute(
                    "INSERT OR IGNORE INTO contradictions (fact_a, fact_b, reason) VALUES (?1, ?2, ?3)",
                    params![a.to_string(), b.to_string(), reason],
                )?;
            }
            for (id, patch) in updates {
                if Self::patch(conn, id, patch.clone())?.is_none() {
                    anyhow::bail!("fact {} disappeared during update", id);
                }
            }
            Ok(recorded)
        })
    }

    fn mark_used(&self, ids: &[FactId], now: DateTime<Utc>) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.in_transaction(|conn| {
            let mut stmt = conn.prepare(
                r#"
                UPDATE facts
                SET use_count = use_count + 1, last_used_at = ?2, updated_at = ?2, relevance = 1.0
                WHERE id = ?1
                "#,
            )?;
            let mut touched = 0;
            for id in ids {
                touched += stmt.execute(params![id.to_string(), now.to_rfc3339()])?;
            }
            Ok(touched)
        })
    }
}

/// Storage statistics
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct StorageStats {
    pub total_facts: usize,
    pub protected_facts: usize,
    pub archived_facts: usize,
    pub embedded_facts: usize,
    pub contested_facts: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_kind: BTreeMap<String, usize>,
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

fn conversion_error(row: &rusqlite::Row, name: &str, err: anyhow::Error) -> rusqlite::Error {
    let idx = row.as_ref().column_index(name).unwrap_or(0);
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

fn parse_column<T>(row: &rusqlite::Row, name: &str) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = row.get(name)?;
    raw.parse::<T>()
        .map_err(|e| conversion_error(row, name, anyhow::anyhow!("{}: {}", name, e)))
}

fn time_column(row: &rusqlite::Row, name: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(name)?;
    parse_time(&raw).map_err(|e| conversion_error(row, name, e))
}

fn optional_time_column(row: &rusqlite::Row, name: &str) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(name)?;
    raw.map(|s| parse_time(&s).map_err(|e| conversion_error(row, name, e)))
        .transpose()
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("bad timestamp: {}", raw))?
        .with_timezone(&Utc))
}

/// Parse a fact id, accepting the short `trove-` prefix used in output
pub fn parse_fact_id(raw: &str) -> Result<FactId> {
    let trimmed = raw.trim().trim_start_matches("trove-");
    Ulid::from_string(trimmed)
        .map_err(|_| MemoryError::InvalidInput(format!("invalid fact id: {}", raw)).into())
}
