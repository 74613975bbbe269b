#![forbid(unsafe_code)]

mod rows;
mod schema;

use censo_model::{CensusYear, SchoolRecord};
use rusqlite::{params, Connection};
use std::fmt::{Display, Formatter};
use std::path::Path;
use tracing::info;

pub use rows::{stored_record_from_row, StoredRecord, SELECT_COLUMNS};
pub use schema::SCHEMA_VERSION;

pub const CRATE_NAME: &str = "censo-store";

#[derive(Debug)]
pub struct StoreError(pub String);

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self(e.to_string())
    }
}

/// Owned handle to one SQLite database. Never a process-wide singleton:
/// callers open a store per operation scope and pass it down explicitly.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        schema::prepare(&conn)?;
        info!(path = %path.display(), "store opened");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        schema::prepare(&conn)?;
        Ok(Self { conn })
    }

    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Writes the whole batch inside one transaction. Any failure rolls the
    /// transaction back when it is dropped, so no partial batch survives.
    pub fn bulk_insert(&mut self, records: &[SchoolRecord]) -> Result<u64, StoreError> {
        let tx = self.conn.transaction()?;
        let written = rows::insert_all(&tx, records)?;
        tx.commit()?;
        Ok(written)
    }

    /// Drop-and-reload for one census year, as a single transaction: the
    /// delete and the batch insert commit together or not at all.
    pub fn replace_year(
        &mut self,
        year: CensusYear,
        records: &[SchoolRecord],
    ) -> Result<u64, StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM microdados_censo WHERE nu_ano_censo = ?1",
            params![year.value()],
        )?;
        let written = rows::insert_all(&tx, records)?;
        tx.commit()?;
        Ok(written)
    }

    pub fn clear_year(&mut self, year: CensusYear) -> Result<u64, StoreError> {
        let removed = self.conn.execute(
            "DELETE FROM microdados_censo WHERE nu_ano_censo = ?1",
            params![year.value()],
        )?;
        Ok(removed as u64)
    }

    pub fn count_year(&self, year: CensusYear) -> Result<u64, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM microdados_censo WHERE nu_ano_censo = ?1",
            params![year.value()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn insert_record(&self, record: &SchoolRecord) -> Result<i64, StoreError> {
        rows::insert_one(&self.conn, record)?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_record(&self, id: i64) -> Result<Option<StoredRecord>, StoreError> {
        rows::get_by_id(&self.conn, id)
    }

    pub fn update_record(&self, id: i64, record: &SchoolRecord) -> Result<bool, StoreError> {
        rows::update_by_id(&self.conn, id, record)
    }

    pub fn delete_record(&self, id: i64) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            "DELETE FROM microdados_censo WHERE id = ?1",
            params![id],
        )?;
        Ok(changed > 0)
    }
}
