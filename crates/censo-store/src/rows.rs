use crate::StoreError;
use censo_model::{CensusYear, EnrollmentCounts, GeoAttributes, InstitutionCode, SchoolRecord};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

/// A record as stored, with its row id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredRecord {
    pub id: i64,
    #[serde(flatten)]
    pub record: SchoolRecord,
}

pub const SELECT_COLUMNS: &str = "id, co_entidade, no_entidade, nu_ano_censo, \
     co_regiao, no_regiao, co_uf, sg_uf, no_uf, co_municipio, no_municipio, \
     co_mesorregiao, no_mesorregiao, co_microrregiao, no_microrregiao, \
     qt_mat_bas, qt_mat_prof, qt_mat_eja, qt_mat_esp, qt_mat_fund, \
     qt_mat_inf, qt_mat_med, qt_mat_zr_na, qt_mat_zr_rur, qt_mat_zr_urb";

const INSERT_SQL: &str = "INSERT INTO microdados_censo (\
     co_entidade, no_entidade, nu_ano_censo, \
     co_regiao, no_regiao, co_uf, sg_uf, no_uf, co_municipio, no_municipio, \
     co_mesorregiao, no_mesorregiao, co_microrregiao, no_microrregiao, \
     qt_mat_bas, qt_mat_prof, qt_mat_eja, qt_mat_esp, qt_mat_fund, \
     qt_mat_inf, qt_mat_med, qt_mat_zr_na, qt_mat_zr_rur, qt_mat_zr_urb, \
     qt_mat_total) VALUES (\
     ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, \
     ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25)";

const UPDATE_SQL: &str = "UPDATE microdados_censo SET \
     co_entidade=?1, no_entidade=?2, nu_ano_censo=?3, \
     co_regiao=?4, no_regiao=?5, co_uf=?6, sg_uf=?7, no_uf=?8, \
     co_municipio=?9, no_municipio=?10, co_mesorregiao=?11, no_mesorregiao=?12, \
     co_microrregiao=?13, no_microrregiao=?14, \
     qt_mat_bas=?15, qt_mat_prof=?16, qt_mat_eja=?17, qt_mat_esp=?18, \
     qt_mat_fund=?19, qt_mat_inf=?20, qt_mat_med=?21, qt_mat_zr_na=?22, \
     qt_mat_zr_rur=?23, qt_mat_zr_urb=?24, qt_mat_total=?25 WHERE id=?26";

macro_rules! record_params {
    ($r:expr) => {
        params![
            $r.co_entidade.as_str(),
            $r.geo.no_entidade,
            $r.nu_ano_censo.value(),
            $r.geo.co_regiao,
            $r.geo.no_regiao,
            $r.geo.co_uf,
            $r.geo.sg_uf,
            $r.geo.no_uf,
            $r.geo.co_municipio,
            $r.geo.no_municipio,
            $r.geo.co_mesorregiao,
            $r.geo.no_mesorregiao,
            $r.geo.co_microrregiao,
            $r.geo.no_microrregiao,
            $r.counts.qt_mat_bas,
            $r.counts.qt_mat_prof,
            $r.counts.qt_mat_eja,
            $r.counts.qt_mat_esp,
            $r.counts.qt_mat_fund,
            $r.counts.qt_mat_inf,
            $r.counts.qt_mat_med,
            $r.counts.qt_mat_zr_na,
            $r.counts.qt_mat_zr_rur,
            $r.counts.qt_mat_zr_urb,
            $r.total(),
        ]
    };
}

pub fn insert_one(conn: &Connection, record: &SchoolRecord) -> Result<(), StoreError> {
    conn.execute(INSERT_SQL, record_params!(record))?;
    Ok(())
}

pub fn insert_all(conn: &Connection, records: &[SchoolRecord]) -> Result<u64, StoreError> {
    let mut stmt = conn.prepare(INSERT_SQL)?;
    for record in records {
        stmt.execute(record_params!(record))?;
    }
    Ok(records.len() as u64)
}

pub fn update_by_id(conn: &Connection, id: i64, record: &SchoolRecord) -> Result<bool, StoreError> {
    let mut stmt = conn.prepare(UPDATE_SQL)?;
    let changed = stmt.execute(params![
        record.co_entidade.as_str(),
        record.geo.no_entidade,
        record.nu_ano_censo.value(),
        record.geo.co_regiao,
        record.geo.no_regiao,
        record.geo.co_uf,
        record.geo.sg_uf,
        record.geo.no_uf,
        record.geo.co_municipio,
        record.geo.no_municipio,
        record.geo.co_mesorregiao,
        record.geo.no_mesorregiao,
        record.geo.co_microrregiao,
        record.geo.no_microrregiao,
        record.counts.qt_mat_bas,
        record.counts.qt_mat_prof,
        record.counts.qt_mat_eja,
        record.counts.qt_mat_esp,
        record.counts.qt_mat_fund,
        record.counts.qt_mat_inf,
        record.counts.qt_mat_med,
        record.counts.qt_mat_zr_na,
        record.counts.qt_mat_zr_rur,
        record.counts.qt_mat_zr_urb,
        record.total(),
        id,
    ])?;
    Ok(changed > 0)
}

pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<StoredRecord>, StoreError> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM microdados_censo WHERE id = ?1");
    let found = conn
        .query_row(&sql, params![id], stored_record_from_row)
        .optional()?;
    Ok(found)
}

/// Maps one result row (in `SELECT_COLUMNS` order) back into the model.
/// The derived total is recomputed from the counters rather than read, so
/// a read can never surface a total inconsistent with its parts.
pub fn stored_record_from_row(row: &Row<'_>) -> rusqlite::Result<StoredRecord> {
    let id: i64 = row.get(0)?;
    let code_raw: String = row.get(1)?;
    let code = InstitutionCode::parse(&code_raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let year_raw: i64 = row.get(3)?;
    let year = CensusYear::parse(year_raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Integer, Box::new(e))
    })?;
    let geo = GeoAttributes {
        no_entidade: row.get(2)?,
        co_regiao: row.get(4)?,
        no_regiao: row.get(5)?,
        co_uf: row.get(6)?,
        sg_uf: row.get(7)?,
        no_uf: row.get(8)?,
        co_municipio: row.get(9)?,
        no_municipio: row.get(10)?,
        co_mesorregiao: row.get(11)?,
        no_mesorregiao: row.get(12)?,
        co_microrregiao: row.get(13)?,
        no_microrregiao: row.get(14)?,
    };
    let counts = EnrollmentCounts {
        qt_mat_bas: row.get(15)?,
        qt_mat_prof: row.get(16)?,
        qt_mat_eja: row.get(17)?,
        qt_mat_esp: row.get(18)?,
        qt_mat_fund: row.get(19)?,
        qt_mat_inf: row.get(20)?,
        qt_mat_med: row.get(21)?,
        qt_mat_zr_na: row.get(22)?,
        qt_mat_zr_rur: row.get(23)?,
        qt_mat_zr_urb: row.get(24)?,
    };
    Ok(StoredRecord {
        id,
        record: SchoolRecord::new(code, year, geo, counts),
    })
}
