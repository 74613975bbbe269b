// SPDX-License-Identifier: Apache-2.0

//! Query-string parsing for the read endpoints. Handlers collect the
//! raw pairs into a map and the functions here turn them into typed
//! requests, rejecting unknown parameters up front.

use std::collections::BTreeMap;

use censo_model::CensusYear;
use censo_query::{ListFilter, ListRequest, QueryLimits};

use crate::ApiError;

const LIST_PARAMS: [&str; 6] = [
    "ano",
    "limit",
    "cursor",
    "sg_uf",
    "co_municipio",
    "nome_prefixo",
];

const RANKING_PARAMS: [&str; 1] = ["limit"];

pub fn parse_list_params(
    params: &BTreeMap<String, String>,
    limits: &QueryLimits,
) -> Result<ListRequest, ApiError> {
    reject_unknown(params, &LIST_PARAMS)?;

    let ano = params
        .get("ano")
        .ok_or_else(|| ApiError::invalid_param("ano", "<missing>"))?;
    let year = CensusYear::parse_str(ano).map_err(|_| ApiError::invalid_year(ano))?;

    let limit = match params.get("limit") {
        Some(raw) => parse_limit(raw, limits.max_limit)?,
        None => limits.default_limit,
    };

    let co_municipio = match params.get("co_municipio") {
        Some(raw) => Some(
            raw.parse::<i64>()
                .map_err(|_| ApiError::invalid_param("co_municipio", raw))?,
        ),
        None => None,
    };

    let sg_uf = match params.get("sg_uf") {
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.len() > 2 {
                return Err(ApiError::invalid_param("sg_uf", raw));
            }
            Some(trimmed.to_ascii_uppercase())
        }
        None => None,
    };

    let name_prefix = match params.get("nome_prefixo") {
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Err(ApiError::invalid_param("nome_prefixo", raw));
            }
            Some(trimmed.to_string())
        }
        None => None,
    };

    Ok(ListRequest {
        filter: ListFilter {
            year,
            sg_uf,
            co_municipio,
            name_prefix,
        },
        limit,
        cursor: params.get("cursor").cloned(),
    })
}

pub fn parse_ranking_params(
    params: &BTreeMap<String, String>,
    limits: &QueryLimits,
) -> Result<usize, ApiError> {
    reject_unknown(params, &RANKING_PARAMS)?;
    match params.get("limit") {
        Some(raw) => parse_limit(raw, limits.ranking_max),
        None => Ok(limits.ranking_default),
    }
}

pub fn parse_year_path(raw: &str) -> Result<CensusYear, ApiError> {
    CensusYear::parse_str(raw).map_err(|_| ApiError::invalid_year(raw))
}

fn parse_limit(raw: &str, max: usize) -> Result<usize, ApiError> {
    let limit = raw
        .parse::<usize>()
        .map_err(|_| ApiError::invalid_param("limit", raw))?;
    if limit == 0 || limit > max {
        return Err(ApiError::invalid_param("limit", raw));
    }
    Ok(limit)
}

fn reject_unknown(
    params: &BTreeMap<String, String>,
    allowed: &[&str],
) -> Result<(), ApiError> {
    for key in params.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(ApiError::invalid_param(key, params[key].as_str()));
        }
    }
    Ok(())
}
