use crate::source::{coerce_code, coerce_count, RawRow, SourceError};
use censo_model::{
    CensusYear, EnrollmentCounts, GeoAttributes, InstitutionCode, InstitutionYearKey,
    ENROLLMENT_COLUMNS,
};
use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::warn;

/// Per-load data-quality counters. Cell-level defects are corrected
/// locally and only counted here, never surfaced as errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoadReport {
    pub rows_read: u64,
    pub skipped_rows: u64,
    pub defaulted_cells: u64,
    pub negative_cells: u64,
    pub attribute_conflicts: u64,
}

/// Running state for one aggregation group: summed counters plus the
/// attribute set of the first row seen for the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupAccumulator {
    pub counts: EnrollmentCounts,
    pub attrs: GeoAttributes,
}

pub type Groups = BTreeMap<InstitutionYearKey, GroupAccumulator>;

/// Single pass over the raw rows: coerces the enrollment columns, groups
/// by (institution, year) with elementwise sums, and reconciles the
/// descriptive attributes first-seen-wins.
///
/// Rows whose key cells are missing or invalid are counted and skipped;
/// they never abort the load. A row-level read error aborts with
/// `Malformed`, since past that point the file shape cannot be trusted.
pub fn aggregate_rows<I>(rows: I, report: &mut LoadReport) -> Result<Groups, SourceError>
where
    I: IntoIterator<Item = Result<RawRow, SourceError>>,
{
    let mut groups = Groups::new();
    for row in rows {
        let row = row?;
        report.rows_read += 1;
        let Some(key) = row_key(&row) else {
            report.skipped_rows += 1;
            continue;
        };
        let counts = row_counts(&row, report);
        match groups.entry(key) {
            Entry::Vacant(slot) => {
                let attrs = row_attributes(&row);
                slot.insert(GroupAccumulator { counts, attrs });
            }
            Entry::Occupied(mut slot) => {
                let attrs = row_attributes(&row);
                let group = slot.get_mut();
                group.counts.merge(&counts);
                // First row wins; divergent duplicates are flagged, not
                // merged. See the load report consumer for the policy.
                if group.attrs != attrs {
                    report.attribute_conflicts += 1;
                    warn!(key = %slot.key(), "conflicting attributes on duplicate row");
                }
            }
        }
    }
    Ok(groups)
}

fn row_key(row: &RawRow) -> Option<InstitutionYearKey> {
    let code = InstitutionCode::parse(row.get("CO_ENTIDADE")?).ok()?;
    let year = CensusYear::parse_str(row.get("NU_ANO_CENSO")?).ok()?;
    Some(InstitutionYearKey { code, year })
}

fn row_counts(row: &RawRow, report: &mut LoadReport) -> EnrollmentCounts {
    let mut counts = EnrollmentCounts::default();
    for column in ENROLLMENT_COLUMNS {
        let (value, defaulted) = coerce_count(row.get(column));
        if defaulted {
            report.defaulted_cells += 1;
        }
        if value < 0 {
            report.negative_cells += 1;
        }
        counts.set(column, value);
    }
    counts
}

pub(crate) fn row_attributes(row: &RawRow) -> GeoAttributes {
    let text = |column: &str| row.get(column).map(str::to_string);
    GeoAttributes {
        no_entidade: row.get("NO_ENTIDADE").unwrap_or_default().to_string(),
        co_regiao: coerce_code(row.get("CO_REGIAO")),
        no_regiao: text("NO_REGIAO"),
        co_uf: coerce_code(row.get("CO_UF")),
        sg_uf: text("SG_UF"),
        no_uf: text("NO_UF"),
        co_municipio: coerce_code(row.get("CO_MUNICIPIO")),
        no_municipio: text("NO_MUNICIPIO"),
        co_mesorregiao: coerce_code(row.get("CO_MESORREGIAO")),
        no_mesorregiao: text("NO_MESORREGIAO"),
        co_microrregiao: coerce_code(row.get("CO_MICRORREGIAO")),
        no_microrregiao: text("NO_MICRORREGIAO"),
    }
}
