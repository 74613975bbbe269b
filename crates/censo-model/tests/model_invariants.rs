// SPDX-License-Identifier: Apache-2.0

use censo_model::{
    CensusYear, EnrollmentCounts, GeoAttributes, InstitutionCode, InstitutionYearKey, SchoolRecord,
};

fn record(code: &str, year: i64, bas: i64, fund: i64) -> SchoolRecord {
    SchoolRecord::new(
        InstitutionCode::parse(code).expect("code"),
        CensusYear::parse(year).expect("year"),
        GeoAttributes::default(),
        EnrollmentCounts {
            qt_mat_bas: bas,
            qt_mat_fund: fund,
            ..EnrollmentCounts::default()
        },
    )
}

#[test]
fn key_ordering_is_code_then_year() {
    let a = InstitutionYearKey {
        code: InstitutionCode::parse("A1").expect("code"),
        year: CensusYear::parse(2023).expect("year"),
    };
    let b = InstitutionYearKey {
        code: InstitutionCode::parse("A1").expect("code"),
        year: CensusYear::parse(2022).expect("year"),
    };
    let c = InstitutionYearKey {
        code: InstitutionCode::parse("B9").expect("code"),
        year: CensusYear::parse(2022).expect("year"),
    };
    assert!(b < a);
    assert!(a < c);
}

#[test]
fn total_tracks_counter_sum_for_every_record() {
    for (bas, fund) in [(0, 0), (15, 20), (-3, 5)] {
        let r = record("12345678901234", 2022, bas, fund);
        assert_eq!(r.total(), bas + fund);
        assert_eq!(r.co_entidade.as_str(), "12345678901234");
    }
}
