#![forbid(unsafe_code)]

mod cursor;

use censo_model::CensusYear;
use censo_store::{stored_record_from_row, StoredRecord, SELECT_COLUMNS};
use rusqlite::{params_from_iter, types::Value, Connection};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use cursor::{decode_cursor, encode_cursor, CursorError, CursorErrorCode, CursorPayload};

pub const CRATE_NAME: &str = "censo-query";

#[derive(Debug)]
pub enum QueryError {
    InvalidRequest(String),
    InvalidCursor(CursorError),
    Storage(String),
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
            Self::InvalidCursor(e) => write!(f, "invalid cursor: {e}"),
            Self::Storage(msg) => write!(f, "storage error: {msg}"),
        }
    }
}
impl std::error::Error for QueryError {}

impl From<rusqlite::Error> for QueryError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryLimits {
    pub default_limit: usize,
    pub max_limit: usize,
    pub ranking_default: usize,
    pub ranking_max: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            default_limit: 100,
            max_limit: 500,
            ranking_default: 10,
            ranking_max: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankingEntry {
    pub nu_ranking: u64,
    #[serde(flatten)]
    pub row: StoredRecord,
}

/// Top institutions of one census year by derived total, densely ranked
/// from 1. Ties break on row id for a stable order.
pub fn ranking(
    conn: &Connection,
    year: CensusYear,
    limit: usize,
    limits: &QueryLimits,
) -> Result<Vec<RankingEntry>, QueryError> {
    if limit == 0 || limit > limits.ranking_max {
        return Err(QueryError::InvalidRequest(format!(
            "limit must be between 1 and {}",
            limits.ranking_max
        )));
    }
    let sql = format!(
        "SELECT {SELECT_COLUMNS} FROM microdados_censo \
         WHERE nu_ano_censo = ?1 \
         ORDER BY qt_mat_total DESC, id ASC LIMIT ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(
            rusqlite::params![year.value(), limit as i64],
            stored_record_from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| RankingEntry {
            nu_ranking: i as u64 + 1,
            row,
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFilter {
    pub year: CensusYear,
    pub sg_uf: Option<String>,
    pub co_municipio: Option<i64>,
    pub name_prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub filter: ListFilter,
    pub limit: usize,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListPage {
    pub rows: Vec<StoredRecord>,
    pub next_cursor: Option<String>,
}

/// Keyset-paginated listing scoped to one census year, ordered by
/// `(qt_mat_total DESC, id ASC)`. The cursor is HMAC-signed and bound to
/// the filter + limit that produced it.
pub fn list_records(
    conn: &Connection,
    req: &ListRequest,
    limits: &QueryLimits,
    cursor_secret: &[u8],
) -> Result<ListPage, QueryError> {
    if req.limit == 0 || req.limit > limits.max_limit {
        return Err(QueryError::InvalidRequest(format!(
            "limit must be between 1 and {}",
            limits.max_limit
        )));
    }
    let query_hash = request_hash(req)?;
    let position = match &req.cursor {
        Some(token) => Some(
            decode_cursor(token, cursor_secret, &query_hash)
                .map_err(QueryError::InvalidCursor)?,
        ),
        None => None,
    };

    let mut sql = format!(
        "SELECT {SELECT_COLUMNS} FROM microdados_censo WHERE nu_ano_censo = ?"
    );
    let mut params: Vec<Value> = vec![Value::Integer(i64::from(req.filter.year.value()))];
    if let Some(sg_uf) = &req.filter.sg_uf {
        sql.push_str(" AND sg_uf = ?");
        params.push(Value::Text(sg_uf.clone()));
    }
    if let Some(co_municipio) = req.filter.co_municipio {
        sql.push_str(" AND co_municipio = ?");
        params.push(Value::Integer(co_municipio));
    }
    if let Some(prefix) = &req.filter.name_prefix {
        sql.push_str(" AND no_entidade LIKE ?");
        params.push(Value::Text(format!("{prefix}%")));
    }
    if let Some(position) = &position {
        sql.push_str(" AND (qt_mat_total < ? OR (qt_mat_total = ? AND id > ?))");
        params.push(Value::Integer(position.last_total));
        params.push(Value::Integer(position.last_total));
        params.push(Value::Integer(position.last_id));
    }
    sql.push_str(" ORDER BY qt_mat_total DESC, id ASC LIMIT ?");
    params.push(Value::Integer(req.limit as i64 + 1));

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt
        .query_map(params_from_iter(params.iter()), stored_record_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let has_more = rows.len() > req.limit;
    if has_more {
        rows.truncate(req.limit);
    }
    let next_cursor = if has_more {
        let last = rows
            .last()
            .ok_or_else(|| QueryError::Storage("pagination invariant violated".to_string()))?;
        let payload = CursorPayload {
            cursor_version: "v1".to_string(),
            last_total: last.record.total(),
            last_id: last.id,
            query_hash,
        };
        Some(encode_cursor(&payload, cursor_secret).map_err(QueryError::InvalidCursor)?)
    } else {
        None
    };

    Ok(ListPage { rows, next_cursor })
}

fn request_hash(req: &ListRequest) -> Result<String, QueryError> {
    let canonical = serde_json::json!({
        "filter": req.filter,
        "limit": req.limit,
    });
    let bytes = serde_json::to_vec(&canonical)
        .map_err(|e| QueryError::InvalidRequest(e.to_string()))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}
