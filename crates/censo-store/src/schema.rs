use crate::StoreError;
use rusqlite::Connection;

pub const SCHEMA_VERSION: i64 = 1;

/// Applies the PRAGMA block and creates the table and indexes if absent.
///
/// There is deliberately no unique key on (co_entidade, nu_ano_censo): the
/// bulk loader is not idempotent by itself, and the clear-before-load
/// policy lives in the load orchestration.
pub fn prepare(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode=WAL;
        PRAGMA synchronous=NORMAL;
        PRAGMA temp_store=MEMORY;
        PRAGMA cache_size=-32000;
        PRAGMA foreign_keys=ON;
        CREATE TABLE IF NOT EXISTS microdados_censo (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          co_entidade TEXT NOT NULL,
          no_entidade TEXT NOT NULL,
          nu_ano_censo INTEGER NOT NULL,
          co_regiao INTEGER,
          no_regiao TEXT,
          co_uf INTEGER,
          sg_uf TEXT,
          no_uf TEXT,
          co_municipio INTEGER,
          no_municipio TEXT,
          co_mesorregiao INTEGER,
          no_mesorregiao TEXT,
          co_microrregiao INTEGER,
          no_microrregiao TEXT,
          qt_mat_bas INTEGER NOT NULL,
          qt_mat_prof INTEGER NOT NULL,
          qt_mat_eja INTEGER NOT NULL,
          qt_mat_esp INTEGER NOT NULL,
          qt_mat_fund INTEGER NOT NULL,
          qt_mat_inf INTEGER NOT NULL,
          qt_mat_med INTEGER NOT NULL,
          qt_mat_zr_na INTEGER NOT NULL,
          qt_mat_zr_rur INTEGER NOT NULL,
          qt_mat_zr_urb INTEGER NOT NULL,
          qt_mat_total INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_microdados_entidade
          ON microdados_censo(co_entidade);
        CREATE INDEX IF NOT EXISTS idx_microdados_ano
          ON microdados_censo(nu_ano_censo);
        CREATE INDEX IF NOT EXISTS idx_microdados_ranking
          ON microdados_censo(nu_ano_censo, qt_mat_total DESC, id);
        ",
    )?;
    conn.execute_batch(&format!("PRAGMA user_version={SCHEMA_VERSION};"))?;
    Ok(())
}
