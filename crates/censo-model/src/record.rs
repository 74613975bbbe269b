// SPDX-License-Identifier: Apache-2.0

use crate::enrollment::EnrollmentCounts;
use crate::ids::{CensusYear, InstitutionCode, InstitutionYearKey};
use serde::{Deserialize, Serialize};

/// Descriptive and geographic attributes of an institution, taken from the
/// first raw row seen for its key. Everything is optional: a missing cell
/// never drops the group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeoAttributes {
    pub no_entidade: String,
    pub co_regiao: Option<i64>,
    pub no_regiao: Option<String>,
    pub co_uf: Option<i64>,
    pub sg_uf: Option<String>,
    pub no_uf: Option<String>,
    pub co_municipio: Option<i64>,
    pub no_municipio: Option<String>,
    pub co_mesorregiao: Option<i64>,
    pub no_mesorregiao: Option<String>,
    pub co_microrregiao: Option<i64>,
    pub no_microrregiao: Option<String>,
}

/// The persistent unit of storage: one aggregated institution/year row.
///
/// The derived total is private and always recomputed from the counters at
/// construction time, so it can never drift from its parts or be supplied
/// by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchoolRecord {
    pub co_entidade: InstitutionCode,
    pub nu_ano_censo: CensusYear,
    #[serde(flatten)]
    pub geo: GeoAttributes,
    #[serde(flatten)]
    pub counts: EnrollmentCounts,
    qt_mat_total: i64,
}

impl SchoolRecord {
    #[must_use]
    pub fn new(
        co_entidade: InstitutionCode,
        nu_ano_censo: CensusYear,
        geo: GeoAttributes,
        counts: EnrollmentCounts,
    ) -> Self {
        let qt_mat_total = counts.total();
        Self {
            co_entidade,
            nu_ano_censo,
            geo,
            counts,
            qt_mat_total,
        }
    }

    #[must_use]
    pub fn total(&self) -> i64 {
        self.qt_mat_total
    }

    #[must_use]
    pub fn key(&self) -> InstitutionYearKey {
        InstitutionYearKey {
            code: self.co_entidade.clone(),
            year: self.nu_ano_censo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GeoAttributes, SchoolRecord};
    use crate::enrollment::EnrollmentCounts;
    use crate::ids::{CensusYear, InstitutionCode};

    #[test]
    fn total_is_derived_at_construction() {
        let counts = EnrollmentCounts {
            qt_mat_bas: 15,
            qt_mat_fund: 20,
            ..EnrollmentCounts::default()
        };
        let record = SchoolRecord::new(
            InstitutionCode::parse("A1").expect("code"),
            CensusYear::parse(2022).expect("year"),
            GeoAttributes::default(),
            counts,
        );
        assert_eq!(record.total(), 35);
    }

    #[test]
    fn serializes_with_flattened_counter_and_geo_fields() {
        let record = SchoolRecord::new(
            InstitutionCode::parse("26000012").expect("code"),
            CensusYear::parse(2024).expect("year"),
            GeoAttributes {
                no_entidade: "ESCOLA RECANTO".to_string(),
                sg_uf: Some("PE".to_string()),
                ..GeoAttributes::default()
            },
            EnrollmentCounts::default(),
        );
        let value = serde_json::to_value(&record).expect("json");
        assert_eq!(value["co_entidade"], "26000012");
        assert_eq!(value["sg_uf"], "PE");
        assert_eq!(value["qt_mat_bas"], 0);
        assert_eq!(value["qt_mat_total"], 0);
    }
}
