// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use axum::body::to_bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use censo_model::{CensusYear, EnrollmentCounts, GeoAttributes, InstitutionCode, SchoolRecord};
use censo_server::{
    create_microdado, delete_microdado, get_microdado, healthz, list_microdados, ranking,
    update_microdado, AppState,
};
use censo_store::Store;
use serde_json::Value;

fn record(code: &str, name: &str, year: i64, bas: i64) -> SchoolRecord {
    SchoolRecord::new(
        InstitutionCode::parse(code).expect("code"),
        CensusYear::parse(year).expect("year"),
        GeoAttributes {
            no_entidade: name.to_string(),
            sg_uf: Some("PE".to_string()),
            ..GeoAttributes::default()
        },
        EnrollmentCounts {
            qt_mat_bas: bas,
            ..EnrollmentCounts::default()
        },
    )
}

fn seeded_state() -> AppState {
    let mut store = Store::open_in_memory().expect("store");
    let records = vec![
        record("A1", "ESCOLA ALFA", 2022, 50),
        record("B2", "ESCOLA BETA", 2022, 80),
        record("C3", "ESCOLA GAMA", 2022, 10),
        record("D4", "ESCOLA DELTA", 2023, 99),
    ];
    store.bulk_insert(&records).expect("seed");
    AppState::from_store(store, b"test-secret".to_vec())
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn no_params() -> Query<BTreeMap<String, String>> {
    Query(BTreeMap::new())
}

fn params(pairs: &[(&str, &str)]) -> Query<BTreeMap<String, String>> {
    Query(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

#[tokio::test]
async fn health_reports_ok() {
    let state = seeded_state();
    let response = healthz(State(state)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn ranking_orders_by_total_descending() {
    let state = seeded_state();
    let response = ranking(State(state), Path("2022".to_string()), no_params()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let entries = body["ranking"].as_array().expect("ranking array");
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["co_entidade"], "B2");
    assert_eq!(entries[0]["nu_ranking"], 1);
    assert_eq!(entries[1]["co_entidade"], "A1");
    assert_eq!(entries[2]["co_entidade"], "C3");
    assert_eq!(entries[2]["nu_ranking"], 3);
}

#[tokio::test]
async fn ranking_rejects_bad_year() {
    let state = seeded_state();
    let response = ranking(State(state), Path("abc".to_string()), no_params()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "InvalidYear");
}

#[tokio::test]
async fn listing_pages_without_gaps() {
    let state = seeded_state();
    let first = list_microdados(
        State(state.clone()),
        params(&[("ano", "2022"), ("limit", "2")]),
    )
    .await;
    assert_eq!(first.status(), StatusCode::OK);
    let first = body_json(first).await;
    assert_eq!(first["rows"].as_array().expect("rows").len(), 2);
    let cursor = first["page"]["next_cursor"]
        .as_str()
        .expect("cursor present")
        .to_string();

    let second = list_microdados(
        State(state),
        params(&[("ano", "2022"), ("limit", "2"), ("cursor", &cursor)]),
    )
    .await;
    let second = body_json(second).await;
    let rows = second["rows"].as_array().expect("rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["co_entidade"], "C3");
    assert!(second["page"]["next_cursor"].is_null());
}

#[tokio::test]
async fn listing_renders_every_stored_row() {
    let state = seeded_state();
    let response = list_microdados(State(state), params(&[("ano", "2022")])).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let rows = body["rows"].as_array().expect("rows");
    assert_eq!(rows.len(), 3, "every 2022 row must appear in the page");
    for row in rows {
        assert!(row["co_entidade"].is_string());
        assert!(row["qt_mat_total"].is_i64());
    }
}

#[tokio::test]
async fn listing_rejects_unknown_parameter() {
    let state = seeded_state();
    let response = list_microdados(
        State(state),
        params(&[("ano", "2022"), ("order", "asc")]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "InvalidQueryParameter");
}

#[tokio::test]
async fn record_crud_lifecycle() {
    let state = seeded_state();
    let payload = serde_json::json!({
        "co_entidade": "Z9",
        "no_entidade": "ESCOLA ZETA",
        "nu_ano_censo": 2024,
        "qt_mat_bas": 7,
        "qt_mat_inf": 3
    });

    let created = create_microdado(State(state.clone()), Json(payload)).await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let created = body_json(created).await;
    let id = created["id"].as_i64().expect("id");
    assert_eq!(created["qt_mat_total"], 10);

    let fetched = get_microdado(State(state.clone()), Path(id)).await;
    assert_eq!(fetched.status(), StatusCode::OK);

    let update = serde_json::json!({
        "co_entidade": "Z9",
        "no_entidade": "ESCOLA ZETA II",
        "nu_ano_censo": 2024,
        "qt_mat_bas": 1
    });
    let updated = update_microdado(State(state.clone()), Path(id), Json(update)).await;
    assert_eq!(updated.status(), StatusCode::OK);
    let updated = body_json(updated).await;
    assert_eq!(updated["no_entidade"], "ESCOLA ZETA II");
    assert_eq!(updated["qt_mat_total"], 1);

    let deleted = delete_microdado(State(state.clone()), Path(id)).await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let missing = get_microdado(State(state), Path(id)).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_rejects_unknown_field_and_ignores_supplied_total() {
    let state = seeded_state();
    let bogus = serde_json::json!({
        "co_entidade": "X1",
        "no_entidade": "ESCOLA XIS",
        "nu_ano_censo": 2024,
        "qt_mat_surprise": 1
    });
    let response = create_microdado(State(state.clone()), Json(bogus)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let lying_total = serde_json::json!({
        "co_entidade": "X1",
        "no_entidade": "ESCOLA XIS",
        "nu_ano_censo": 2024,
        "qt_mat_bas": 4,
        "qt_mat_total": 9000
    });
    let response = create_microdado(State(state), Json(lying_total)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["qt_mat_total"], 4);
}

#[tokio::test]
async fn missing_record_is_not_found() {
    let state = seeded_state();
    let response = get_microdado(State(state.clone()), Path(424242)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = delete_microdado(State(state), Path(424242)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
