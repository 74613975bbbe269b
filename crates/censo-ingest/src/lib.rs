#![forbid(unsafe_code)]

mod aggregate;
mod logging;
mod merge;
mod source;

use censo_model::CensusYear;
use censo_store::Store;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{error, info, warn};

pub use aggregate::{aggregate_rows, GroupAccumulator, Groups, LoadReport};
pub use logging::{LoadEvent, LoadLog, LoadStage};
pub use merge::merge_groups;
pub use source::{
    coerce_code, coerce_count, latin1_to_string, RawRow, RowSource, SourceError,
    ATTRIBUTE_COLUMNS, CSV_DELIMITER, KEY_COLUMNS,
};

pub const CRATE_NAME: &str = "censo-ingest";

/// Outcome status for one year. File-level and storage-level defects end
/// up here; they never escape as panics and never block other years.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Success,
    SkippedMissingSource,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadOutcome {
    pub year: i32,
    pub rows_read: u64,
    pub groups_written: u64,
    pub status: LoadStatus,
    pub report: LoadReport,
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub data_dir: PathBuf,
    /// Clear-before-load policy: replace the year's records inside the
    /// load transaction so repeated loads are idempotent. Turning this off
    /// exposes the bulk loader's raw append semantics.
    pub clear_existing: bool,
}

impl LoadOptions {
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            clear_existing: true,
        }
    }

    #[must_use]
    pub fn source_path(&self, year: CensusYear) -> PathBuf {
        self.data_dir
            .join(format!("microdados_ed_basica_{year}.csv"))
    }
}

pub fn load_year(store: &mut Store, opts: &LoadOptions, year: CensusYear) -> LoadOutcome {
    load_year_with_events(store, opts, year).0
}

/// Full pipeline for one census year: open, aggregate, merge, persist.
/// One pass over the file; one transaction against the store.
pub fn load_year_with_events(
    store: &mut Store,
    opts: &LoadOptions,
    year: CensusYear,
) -> (LoadOutcome, Vec<LoadEvent>) {
    let mut log = LoadLog::default();
    let path = opts.source_path(year);
    log.emit(
        LoadStage::Open,
        "load.open",
        BTreeMap::from([("path".to_string(), path.display().to_string())]),
    );

    let outcome = |status: LoadStatus, rows: u64, groups: u64, report: LoadReport| LoadOutcome {
        year: year.value(),
        rows_read: rows,
        groups_written: groups,
        status,
        report,
    };

    let rows = match RowSource::open(&path) {
        Ok(rows) => rows,
        Err(SourceError::NotFound(path)) => {
            warn!(year = year.value(), path = %path.display(), "source missing, year skipped");
            return (
                outcome(LoadStatus::SkippedMissingSource, 0, 0, LoadReport::default()),
                log.events().to_vec(),
            );
        }
        Err(e @ SourceError::Malformed(_)) => {
            error!(year = year.value(), error = %e, "source unreadable");
            return (
                outcome(LoadStatus::Failed(e.to_string()), 0, 0, LoadReport::default()),
                log.events().to_vec(),
            );
        }
    };

    let mut report = LoadReport::default();
    log.emit(LoadStage::Aggregate, "load.aggregate.begin", BTreeMap::new());
    let groups = match aggregate_rows(rows, &mut report) {
        Ok(groups) => groups,
        Err(e) => {
            error!(year = year.value(), error = %e, "aggregation aborted");
            return (
                outcome(
                    LoadStatus::Failed(e.to_string()),
                    report.rows_read,
                    0,
                    report,
                ),
                log.events().to_vec(),
            );
        }
    };

    log.emit(LoadStage::Merge, "load.merge", BTreeMap::new());
    let records = merge_groups(groups);

    log.emit(
        LoadStage::Persist,
        "load.persist.begin",
        BTreeMap::from([("records".to_string(), records.len().to_string())]),
    );
    let written = if opts.clear_existing {
        store.replace_year(year, &records)
    } else {
        store.bulk_insert(&records)
    };
    let (status, groups_written) = match written {
        Ok(written) => {
            info!(
                year = year.value(),
                rows = report.rows_read,
                groups = written,
                "year loaded"
            );
            (LoadStatus::Success, written)
        }
        Err(e) => {
            error!(year = year.value(), error = %e, "bulk write failed, batch rolled back");
            (
                LoadStatus::Failed(format!("persistence error for year {year}: {e}")),
                0,
            )
        }
    };
    log.emit(LoadStage::Finalize, "load.complete", BTreeMap::new());

    (
        outcome(status, report.rows_read, groups_written, report),
        log.events().to_vec(),
    )
}

/// Years are processed independently and sequentially; a failed year is
/// reported and the run moves on.
pub fn load_years(store: &mut Store, opts: &LoadOptions, years: &[CensusYear]) -> Vec<LoadOutcome> {
    years
        .iter()
        .map(|year| load_year(store, opts, *year))
        .collect()
}
