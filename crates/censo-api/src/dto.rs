// SPDX-License-Identifier: Apache-2.0

use crate::ApiError;
use censo_model::{
    CensusYear, EnrollmentCounts, GeoAttributes, InstitutionCode, SchoolRecord, NAME_MAX_LEN,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthDto {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageDto {
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListResponseDto {
    pub api_version: String,
    pub page: PageDto,
    pub rows: Vec<Value>,
}

/// Write-side payload for record create/update. Unknown fields are
/// rejected. `qt_mat_total` is tolerated on input for round-trip
/// convenience but never trusted: the stored total is always recomputed
/// from the counters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MicrodadoDto {
    pub co_entidade: String,
    pub no_entidade: String,
    pub nu_ano_censo: i64,
    #[serde(default)]
    pub co_regiao: Option<i64>,
    #[serde(default)]
    pub no_regiao: Option<String>,
    #[serde(default)]
    pub co_uf: Option<i64>,
    #[serde(default)]
    pub sg_uf: Option<String>,
    #[serde(default)]
    pub no_uf: Option<String>,
    #[serde(default)]
    pub co_municipio: Option<i64>,
    #[serde(default)]
    pub no_municipio: Option<String>,
    #[serde(default)]
    pub co_mesorregiao: Option<i64>,
    #[serde(default)]
    pub no_mesorregiao: Option<String>,
    #[serde(default)]
    pub co_microrregiao: Option<i64>,
    #[serde(default)]
    pub no_microrregiao: Option<String>,
    #[serde(default)]
    pub qt_mat_bas: Option<i64>,
    #[serde(default)]
    pub qt_mat_prof: Option<i64>,
    #[serde(default)]
    pub qt_mat_eja: Option<i64>,
    #[serde(default)]
    pub qt_mat_esp: Option<i64>,
    #[serde(default)]
    pub qt_mat_fund: Option<i64>,
    #[serde(default)]
    pub qt_mat_inf: Option<i64>,
    #[serde(default)]
    pub qt_mat_med: Option<i64>,
    #[serde(default)]
    pub qt_mat_zr_na: Option<i64>,
    #[serde(default)]
    pub qt_mat_zr_rur: Option<i64>,
    #[serde(default)]
    pub qt_mat_zr_urb: Option<i64>,
    #[serde(default)]
    pub qt_mat_total: Option<i64>,
}

impl MicrodadoDto {
    pub fn into_record(self) -> Result<SchoolRecord, ApiError> {
        let code = InstitutionCode::parse(&self.co_entidade)
            .map_err(|e| ApiError::invalid_body(e.to_string()))?;
        let year = CensusYear::parse(self.nu_ano_censo)
            .map_err(|e| ApiError::invalid_body(e.to_string()))?;
        if self.no_entidade.trim().is_empty() {
            return Err(ApiError::invalid_body("no_entidade must not be empty"));
        }
        if self.no_entidade.len() > NAME_MAX_LEN {
            return Err(ApiError::invalid_body(format!(
                "no_entidade exceeds max length {NAME_MAX_LEN}"
            )));
        }
        let geo = GeoAttributes {
            no_entidade: self.no_entidade,
            co_regiao: self.co_regiao,
            no_regiao: self.no_regiao,
            co_uf: self.co_uf,
            sg_uf: self.sg_uf,
            no_uf: self.no_uf,
            co_municipio: self.co_municipio,
            no_municipio: self.no_municipio,
            co_mesorregiao: self.co_mesorregiao,
            no_mesorregiao: self.no_mesorregiao,
            co_microrregiao: self.co_microrregiao,
            no_microrregiao: self.no_microrregiao,
        };
        let counts = EnrollmentCounts {
            qt_mat_bas: self.qt_mat_bas.unwrap_or(0),
            qt_mat_prof: self.qt_mat_prof.unwrap_or(0),
            qt_mat_eja: self.qt_mat_eja.unwrap_or(0),
            qt_mat_esp: self.qt_mat_esp.unwrap_or(0),
            qt_mat_fund: self.qt_mat_fund.unwrap_or(0),
            qt_mat_inf: self.qt_mat_inf.unwrap_or(0),
            qt_mat_med: self.qt_mat_med.unwrap_or(0),
            qt_mat_zr_na: self.qt_mat_zr_na.unwrap_or(0),
            qt_mat_zr_rur: self.qt_mat_zr_rur.unwrap_or(0),
            qt_mat_zr_urb: self.qt_mat_zr_urb.unwrap_or(0),
        };
        Ok(SchoolRecord::new(code, year, geo, counts))
    }
}

#[cfg(test)]
mod tests {
    use super::MicrodadoDto;

    fn minimal_json() -> serde_json::Value {
        serde_json::json!({
            "co_entidade": "26000012",
            "no_entidade": "ESCOLA RECANTO",
            "nu_ano_censo": 2024,
            "qt_mat_bas": 30,
            "qt_mat_fund": 12
        })
    }

    #[test]
    fn total_is_recomputed_not_trusted() {
        let mut body = minimal_json();
        body["qt_mat_total"] = serde_json::json!(9999);
        let dto: MicrodadoDto = serde_json::from_value(body).expect("dto");
        let record = dto.into_record().expect("record");
        assert_eq!(record.total(), 42);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let mut body = minimal_json();
        body["qt_mat_bogus"] = serde_json::json!(1);
        let err = serde_json::from_value::<MicrodadoDto>(body).expect_err("unknown field");
        assert!(err.to_string().contains("qt_mat_bogus"));
    }

    #[test]
    fn missing_counters_default_to_zero() {
        let body = serde_json::json!({
            "co_entidade": "A1",
            "no_entidade": "ESCOLA UM",
            "nu_ano_censo": 2022
        });
        let dto: MicrodadoDto = serde_json::from_value(body).expect("dto");
        let record = dto.into_record().expect("record");
        assert_eq!(record.total(), 0);
    }

    #[test]
    fn invalid_year_is_a_body_error() {
        let mut body = minimal_json();
        body["nu_ano_censo"] = serde_json::json!(1200);
        let dto: MicrodadoDto = serde_json::from_value(body).expect("dto");
        assert!(dto.into_record().is_err());
    }
}
