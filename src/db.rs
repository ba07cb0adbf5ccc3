use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::types::{Type, Value};
use rusqlite::{params_from_iter, Connection, OpenFlags, Row};
use tracing::{debug, error, info, warn};

use crate::error::{PipelineError, Result};
use crate::models::{Batch, PolarityScores, ScoredRecord, SearchRecord, SentimentLabel};
use crate::schema::{quote_ident, Column, RAW_COLUMNS, SCORE_COLUMNS};
use crate::validation::InputValidator;

/// A record type that can be written to and read back from a table
pub trait TableRow: Sized {
    /// Columns in insertion order; the table is created from these
    fn columns() -> Vec<Column>;

    /// Values in the same order as [`TableRow::columns`]
    fn values(&self) -> Vec<Value>;

    /// Decode a row selected with [`TableRow::columns`]
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn non_negative(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

impl TableRow for SearchRecord {
    fn columns() -> Vec<Column> {
        RAW_COLUMNS.to_vec()
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.id),
            Value::Text(self.created_at.format("%F %T%.f%:z").to_string()),
            Value::Text(self.language.clone()),
            Value::Integer(i64::from(self.is_retweet)),
            Value::Text(self.author_screen_name.clone()),
            Value::Integer(saturating_i64(self.author_followers_count)),
            Value::Text(self.author_location.clone()),
            self.author_time_zone.clone().map_or(Value::Null, Value::Text),
            Value::Integer(saturating_i64(self.favorite_count)),
            Value::Text(self.text.clone()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            created_at: row.get(1)?,
            language: row.get(2)?,
            is_retweet: row.get(3)?,
            author_screen_name: row.get(4)?,
            author_followers_count: non_negative(row.get(5)?),
            author_location: row.get(6)?,
            author_time_zone: row.get(7)?,
            favorite_count: non_negative(row.get(8)?),
            text: row.get(9)?,
        })
    }
}

impl TableRow for ScoredRecord {
    fn columns() -> Vec<Column> {
        RAW_COLUMNS.iter().chain(SCORE_COLUMNS.iter()).copied().collect()
    }

    fn values(&self) -> Vec<Value> {
        let mut values = self.record.values();
        values.extend([
            Value::Real(self.scores.neg),
            Value::Real(self.scores.neu),
            Value::Real(self.scores.pos),
            Value::Real(self.scores.compound),
            Value::Text(self.label.as_str().to_string()),
        ]);
        values
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let offset = RAW_COLUMNS.len();
        let label_text: String = row.get(offset + 4)?;
        let label = label_text
            .parse::<SentimentLabel>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(offset + 4, Type::Text, Box::new(e)))?;

        Ok(Self {
            record: SearchRecord::from_row(row)?,
            scores: PolarityScores {
                neg: row.get(offset)?,
                neu: row.get(offset + 1)?,
                pos: row.get(offset + 2)?,
                compound: row.get(offset + 3)?,
            },
            label,
        })
    }
}

/// File-backed table store
///
/// Every operation opens its own connection and closes it before returning;
/// nothing is pooled or shared between calls.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    /// Create a store handle for `path`; the file is created on first write
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        InputValidator::validate_store_path(&path)?;
        Ok(Self { path })
    }

    /// Location of the store file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a batch, logging and swallowing any failure
    ///
    /// Returns the number of rows written, or `None` when the batch was dropped.
    pub fn append<T: TableRow>(&self, batch: &Batch<T>, table: &str) -> Option<usize> {
        match self.try_append(batch, table) {
            Ok(rows) => Some(rows),
            Err(e) => {
                error!(
                    error = %e,
                    table,
                    path = %self.path.display(),
                    rows = batch.len(),
                    "Failed to persist batch; batch dropped"
                );
                None
            },
        }
    }

    /// Append a batch in one transaction, creating the table if absent
    ///
    /// On error nothing from the batch is kept.
    pub fn try_append<T: TableRow>(&self, batch: &Batch<T>, table: &str) -> Result<usize> {
        InputValidator::validate_table_name(table)?;

        let mut conn = self.open_for_write()?;
        debug!(path = %self.path.display(), table, "Store connection opened");

        let written = Self::write_batch(&mut conn, batch, table);
        let closed = Self::close(conn);

        let rows = settle_append(written, closed, table)?;
        info!(table, rows, path = %self.path.display(), "Batch committed");
        Ok(rows)
    }

    fn write_batch<T: TableRow>(conn: &mut Connection, batch: &Batch<T>, table: &str) -> Result<usize> {
        let columns = T::columns();
        let table_ident = quote_ident(table);

        let definitions = columns
            .iter()
            .map(|column| format!("{} {}", quote_ident(column.name), column.sql_type))
            .collect::<Vec<_>>()
            .join(", ");
        let names = columns
            .iter()
            .map(|column| quote_ident(column.name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=columns.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");

        let tx = conn.transaction()?;
        tx.execute(&format!("CREATE TABLE IF NOT EXISTS {table_ident} ({definitions})"), [])?;
        {
            let mut stmt = tx.prepare(&format!("INSERT INTO {table_ident} ({names}) VALUES ({placeholders})"))?;
            for record in batch {
                stmt.execute(params_from_iter(record.values()))?;
            }
        }
        tx.commit()?;

        Ok(batch.len())
    }

    /// Read every row of a table in insertion order
    pub fn read_table<T: TableRow>(&self, table: &str) -> Result<Batch<T>> {
        InputValidator::validate_table_name(table)?;

        let conn = self.open_read_only()?;
        let rows = {
            let names = T::columns()
                .iter()
                .map(|column| quote_ident(column.name))
                .collect::<Vec<_>>()
                .join(", ");
            let mut stmt = conn.prepare(&format!("SELECT {names} FROM {} ORDER BY rowid", quote_ident(table)))?;
            let rows = stmt.query_map([], T::from_row)?.collect::<rusqlite::Result<Batch<T>>>();
            rows
        };
        Self::close(conn)?;

        Ok(rows?)
    }

    /// Number of rows in a table
    pub fn row_count(&self, table: &str) -> Result<usize> {
        InputValidator::validate_table_name(table)?;

        let conn = self.open_read_only()?;
        let count = conn.query_row(&format!("SELECT COUNT(*) FROM {}", quote_ident(table)), [], |row| {
            row.get::<_, i64>(0)
        });
        Self::close(conn)?;

        Ok(usize::try_from(count?).unwrap_or_default())
    }

    /// Names of the user tables in the store, sorted; empty when the file does not exist yet
    pub fn list_tables(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let conn = self.open_read_only()?;
        let tables = {
            let mut stmt = conn.prepare(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )?;
            let tables = stmt.query_map([], |row| row.get::<_, String>(0))?.collect::<rusqlite::Result<Vec<_>>>();
            tables
        };
        Self::close(conn)?;

        Ok(tables?)
    }

    fn open_for_write(&self) -> Result<Connection> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Connection::open(&self.path)?)
    }

    fn open_read_only(&self) -> Result<Connection> {
        if !self.path.exists() {
            return Err(PipelineError::Persistence(format!("Store {} does not exist", self.path.display())));
        }
        Ok(Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?)
    }

    fn close(conn: Connection) -> Result<()> {
        match conn.close() {
            Ok(()) => {
                debug!("Store connection closed");
                Ok(())
            },
            Err((_conn, e)) => {
                warn!(error = %e, "Store connection did not close cleanly");
                Err(e.into())
            },
        }
    }
}

/// Outcome of an append: once the commit succeeded the rows are stored, so a failed close is only logged
fn settle_append(written: Result<usize>, closed: Result<()>, table: &str) -> Result<usize> {
    let rows = written?;
    if let Err(e) = closed {
        warn!(error = %e, table, rows, "Batch committed but the store connection failed to close");
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn record(id: i64) -> SearchRecord {
        SearchRecord {
            id,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            language: "en".to_string(),
            is_retweet: id % 2 == 0,
            author_screen_name: format!("user{id}"),
            author_followers_count: 10,
            author_location: String::new(),
            author_time_zone: None,
            favorite_count: 1,
            text: "hello".to_string(),
        }
    }

    #[test]
    fn test_scored_columns_extend_raw_columns() {
        let columns = ScoredRecord::columns();
        assert_eq!(columns.len(), 15);
        assert_eq!(columns[9].name, "TweetText");
        assert_eq!(columns[14].name, "Sentiment");
    }

    #[test]
    fn test_close_failure_after_commit_keeps_row_count() {
        let closed = Err(PipelineError::Persistence("database is locked".to_string()));
        assert_eq!(settle_append(Ok(3), closed, "HappyTweets").unwrap(), 3);
        assert_eq!(settle_append(Ok(3), Ok(()), "HappyTweets").unwrap(), 3);
    }

    #[test]
    fn test_write_failure_wins_over_close_outcome() {
        let written = Err(PipelineError::Persistence("disk I/O error".to_string()));
        let result = settle_append(written, Ok(()), "HappyTweets");
        assert!(matches!(result, Err(PipelineError::Persistence(_))));
    }

    #[test]
    fn test_append_creates_nested_directories() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("nested").join("Tweets.db")).unwrap();

        let batch: Batch<SearchRecord> = (1..=3).map(record).collect();
        assert_eq!(store.append(&batch, "HappyTweets"), Some(3));
        assert_eq!(store.row_count("HappyTweets").unwrap(), 3);
    }

    #[test]
    fn test_invalid_table_name_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("Tweets.db")).unwrap();
        let batch: Batch<SearchRecord> = vec![record(1)].into();

        assert!(matches!(
            store.try_append(&batch, "Tweets; DROP TABLE x"),
            Err(PipelineError::InvalidArgument(_))
        ));
        assert_eq!(store.append(&batch, "1Tweets"), None);
    }

    #[test]
    fn test_list_tables_on_missing_store() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("absent.db")).unwrap();
        assert!(store.list_tables().unwrap().is_empty());
        assert!(!store.path().exists());
    }
}
