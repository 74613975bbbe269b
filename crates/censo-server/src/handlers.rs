// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use censo_api::params::{parse_list_params, parse_ranking_params, parse_year_path};
use censo_api::{
    ApiError, ApiErrorCode, HealthDto, ListResponseDto, MicrodadoDto, PageDto, API_VERSION,
};
use censo_query::{list_records, ranking as ranking_query};
use serde_json::{json, Value};

use crate::AppState;

fn status_for(code: ApiErrorCode) -> StatusCode {
    match code {
        ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
        ApiErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    }
}

fn error_response(err: ApiError) -> Response {
    let status = status_for(err.code);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(message = %err.message, "request failed");
    }
    (status, Json(json!({"error": err}))).into_response()
}

fn json_ok<T: serde::Serialize>(body: &T) -> Response {
    Json(serde_json::to_value(body).unwrap_or(Value::Null)).into_response()
}

pub async fn root(State(_state): State<AppState>) -> Response {
    json_ok(&json!({
        "service": "censo-escolar",
        "api_version": API_VERSION,
        "endpoints": [
            "/healthz",
            "/v1/instituicoes/ranking/{ano}",
            "/v1/microdados",
            "/v1/microdados/{id}",
        ],
    }))
}

pub async fn healthz(State(state): State<AppState>) -> Response {
    let store = state.store().await;
    let probe: Result<i64, _> = store
        .connection()
        .query_row("SELECT 1", [], |row| row.get(0));
    match probe {
        Ok(_) => json_ok(&HealthDto {
            status: "ok",
            message: "service and storage reachable",
        }),
        Err(e) => error_response(ApiError::internal(e.to_string())),
    }
}

pub async fn ranking(
    State(state): State<AppState>,
    Path(ano): Path<String>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Response {
    let year = match parse_year_path(&ano) {
        Ok(year) => year,
        Err(err) => return error_response(err),
    };
    let limit = match parse_ranking_params(&params, state.limits()) {
        Ok(limit) => limit,
        Err(err) => return error_response(err),
    };
    let store = state.store().await;
    match ranking_query(store.connection(), year, limit, state.limits()) {
        Ok(entries) => json_ok(&json!({
            "api_version": API_VERSION,
            "nu_ano_censo": year.value(),
            "ranking": entries,
        })),
        Err(e) => error_response(ApiError::from(e)),
    }
}

pub async fn list_microdados(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Response {
    let request = match parse_list_params(&params, state.limits()) {
        Ok(request) => request,
        Err(err) => return error_response(err),
    };
    let store = state.store().await;
    let page = match list_records(
        store.connection(),
        &request,
        state.limits(),
        state.cursor_secret(),
    ) {
        Ok(page) => page,
        Err(e) => return error_response(ApiError::from(e)),
    };
    let mut rows = Vec::with_capacity(page.rows.len());
    for row in &page.rows {
        match serde_json::to_value(row) {
            Ok(value) => rows.push(value),
            // A row that cannot be rendered must fail the page, not
            // shrink it.
            Err(e) => return error_response(ApiError::internal(e.to_string())),
        }
    }
    json_ok(&ListResponseDto {
        api_version: API_VERSION.to_string(),
        page: PageDto {
            next_cursor: page.next_cursor,
        },
        rows,
    })
}

fn decode_body(body: Value) -> Result<MicrodadoDto, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::invalid_body(e.to_string()))
}

pub async fn create_microdado(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Response {
    let record = match decode_body(body).and_then(MicrodadoDto::into_record) {
        Ok(record) => record,
        Err(err) => return error_response(err),
    };
    let store = state.store().await;
    let id = match store.insert_record(&record) {
        Ok(id) => id,
        Err(e) => return error_response(ApiError::internal(e.to_string())),
    };
    match store.get_record(id) {
        Ok(Some(stored)) => (StatusCode::CREATED, Json(json!(stored))).into_response(),
        Ok(None) => error_response(ApiError::internal("inserted row not found")),
        Err(e) => error_response(ApiError::internal(e.to_string())),
    }
}

pub async fn get_microdado(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let store = state.store().await;
    match store.get_record(id) {
        Ok(Some(stored)) => json_ok(&stored),
        Ok(None) => error_response(ApiError::not_found("microdado", id)),
        Err(e) => error_response(ApiError::internal(e.to_string())),
    }
}

pub async fn update_microdado(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let record = match decode_body(body).and_then(MicrodadoDto::into_record) {
        Ok(record) => record,
        Err(err) => return error_response(err),
    };
    let store = state.store().await;
    match store.update_record(id, &record) {
        Ok(true) => match store.get_record(id) {
            Ok(Some(stored)) => json_ok(&stored),
            Ok(None) => error_response(ApiError::internal("updated row not found")),
            Err(e) => error_response(ApiError::internal(e.to_string())),
        },
        Ok(false) => error_response(ApiError::not_found("microdado", id)),
        Err(e) => error_response(ApiError::internal(e.to_string())),
    }
}

pub async fn delete_microdado(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let store = state.store().await;
    match store.delete_record(id) {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => error_response(ApiError::not_found("microdado", id)),
        Err(e) => error_response(ApiError::internal(e.to_string())),
    }
}
