// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document CRUD and aggregation operations.
//!
//! Write operations go through `Database::write_with_retry`; reads run on
//! pooled snapshot transactions. No function here touches the file any
//! other way.

use murmur_core::MurmurError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{Document, SentimentStats};

const DOCUMENT_COLUMNS: &str = "doc_id, brand, platform, country_code, language, sentiment,
     text_clean, engagement_count, created_at";

fn document_from_row(row: &rusqlite::Row<'_>) -> Result<Document, rusqlite::Error> {
    Ok(Document {
        doc_id: row.get(0)?,
        brand: row.get(1)?,
        platform: row.get(2)?,
        country_code: row.get(3)?,
        language: row.get(4)?,
        sentiment: row.get(5)?,
        text: row.get(6)?,
        engagement_count: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Insert a new document.
pub async fn insert_document(db: &Database, document: &Document) -> Result<(), MurmurError> {
    let document = document.clone();
    db.write_with_retry(move |tx| {
        tx.execute(
            "INSERT INTO documents (doc_id, brand, platform, country_code, language,
                                    sentiment, text_clean, engagement_count, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                document.doc_id,
                document.brand,
                document.platform,
                document.country_code,
                document.language,
                document.sentiment,
                document.text,
                document.engagement_count,
                document.created_at,
            ],
        )?;
        Ok(())
    })
    .await
}

/// Get a document by ID.
pub async fn get_document(db: &Database, doc_id: &str) -> Result<Option<Document>, MurmurError> {
    let doc_id = doc_id.to_string();
    db.read(move |tx| {
        let mut stmt = tx.prepare(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE doc_id = ?1"
        ))?;
        match stmt.query_row(params![doc_id], document_from_row) {
            Ok(document) => Ok(Some(document)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    })
    .await
}

/// List documents, newest first, optionally filtered by brand.
pub async fn list_documents(
    db: &Database,
    brand: Option<String>,
    limit: i64,
) -> Result<Vec<Document>, MurmurError> {
    db.read(move |tx| {
        let mut documents = Vec::new();
        match &brand {
            Some(brand_filter) => {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {DOCUMENT_COLUMNS} FROM documents
                     WHERE brand = ?1 ORDER BY created_at DESC LIMIT ?2"
                ))?;
                let rows = stmt.query_map(params![brand_filter, limit], document_from_row)?;
                for row in rows {
                    documents.push(row?);
                }
            }
            None => {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {DOCUMENT_COLUMNS} FROM documents
                     ORDER BY created_at DESC LIMIT ?1"
                ))?;
                let rows = stmt.query_map(params![limit], document_from_row)?;
                for row in rows {
                    documents.push(row?);
                }
            }
        }
        Ok(documents)
    })
    .await
}

/// Increment a document's engagement counter through the write path.
///
/// Deliberately a read-modify-write (SELECT then UPDATE) inside one
/// exclusive transaction rather than an atomic UPDATE; the write
/// serializer makes the sequence safe under concurrency. Returns the new
/// count, or `None` if the document does not exist.
pub async fn engage_document(db: &Database, doc_id: &str) -> Result<Option<i64>, MurmurError> {
    let doc_id = doc_id.to_string();
    db.write_with_retry(move |tx| {
        let current: Option<i64> = match tx.query_row(
            "SELECT engagement_count FROM documents WHERE doc_id = ?1",
            params![doc_id],
            |row| row.get(0),
        ) {
            Ok(value) => Some(value),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e),
        };
        match current {
            Some(value) => {
                let next = value + 1;
                tx.execute(
                    "UPDATE documents SET engagement_count = ?1 WHERE doc_id = ?2",
                    params![next, doc_id],
                )?;
                Ok(Some(next))
            }
            None => Ok(None),
        }
    })
    .await
}

/// Count all documents.
pub async fn count_documents(db: &Database) -> Result<i64, MurmurError> {
    db.read(|tx| tx.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0)))
        .await
}

/// Aggregate sentiment counts over all documents.
pub async fn sentiment_stats(db: &Database) -> Result<SentimentStats, MurmurError> {
    db.read(|tx| {
        let mut stats = SentimentStats::default();
        let mut stmt =
            tx.prepare("SELECT sentiment, COUNT(*) FROM documents GROUP BY sentiment")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (sentiment, count) = row?;
            stats.total += count;
            match sentiment.as_str() {
                "pos" => stats.positive = count,
                "neu" => stats.neutral = count,
                "neg" => stats.negative = count,
                _ => {}
            }
        }
        Ok(stats)
    })
    .await
}
