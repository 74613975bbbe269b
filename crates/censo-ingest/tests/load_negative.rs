// SPDX-License-Identifier: Apache-2.0

use censo_ingest::{load_year, load_years, LoadOptions, LoadStatus};
use censo_model::CensusYear;
use censo_store::Store;
use std::fs;
use tempfile::tempdir;

fn year(value: i64) -> CensusYear {
    CensusYear::parse(value).expect("year")
}

#[test]
fn missing_source_skips_the_year_without_touching_storage() {
    let tmp = tempdir().expect("tmp");
    let mut store = Store::open_in_memory().expect("store");

    let outcome = load_year(&mut store, &LoadOptions::new(tmp.path()), year(2022));
    assert_eq!(outcome.status, LoadStatus::SkippedMissingSource);
    assert_eq!(outcome.rows_read, 0);
    assert_eq!(outcome.groups_written, 0);
    assert_eq!(store.count_year(year(2022)).expect("count"), 0);
}

#[test]
fn wrong_delimiter_fails_the_year_without_partial_writes() {
    let tmp = tempdir().expect("tmp");
    fs::write(
        tmp.path().join("microdados_ed_basica_2022.csv"),
        "CO_ENTIDADE,NU_ANO_CENSO,QT_MAT_BAS\nA1,2022,10\n",
    )
    .expect("write");
    let mut store = Store::open_in_memory().expect("store");

    let outcome = load_year(&mut store, &LoadOptions::new(tmp.path()), year(2022));
    match &outcome.status {
        LoadStatus::Failed(reason) => assert!(
            reason.contains("CO_ENTIDADE") || reason.contains("malformed"),
            "unexpected reason: {reason}"
        ),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(store.count_year(year(2022)).expect("count"), 0);
}

#[test]
fn one_bad_year_never_blocks_the_others() {
    let tmp = tempdir().expect("tmp");
    fs::write(
        tmp.path().join("microdados_ed_basica_2022.csv"),
        "CO_ENTIDADE;NO_ENTIDADE;NU_ANO_CENSO;QT_MAT_BAS\nA1;ESCOLA UM;2022;3\n",
    )
    .expect("write good year");
    fs::write(
        tmp.path().join("microdados_ed_basica_2024.csv"),
        "CO_ENTIDADE,NU_ANO_CENSO\nbroken,file\n",
    )
    .expect("write bad year");
    let mut store = Store::open_in_memory().expect("store");

    let outcomes = load_years(
        &mut store,
        &LoadOptions::new(tmp.path()),
        &[year(2022), year(2023), year(2024)],
    );
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].status, LoadStatus::Success);
    assert_eq!(outcomes[1].status, LoadStatus::SkippedMissingSource);
    assert!(matches!(outcomes[2].status, LoadStatus::Failed(_)));
    assert_eq!(store.count_year(year(2022)).expect("count"), 1);
}
