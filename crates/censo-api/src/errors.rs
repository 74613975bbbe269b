use censo_query::QueryError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ApiErrorCode {
    InvalidQueryParameter,
    InvalidYear,
    InvalidBody,
    InvalidCursor,
    NotFound,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Value,
}

impl ApiError {
    #[must_use]
    pub fn invalid_param(name: &str, value: &str) -> Self {
        Self {
            code: ApiErrorCode::InvalidQueryParameter,
            message: format!("invalid query parameter: {name}"),
            details: json!({"parameter": name, "value": value}),
        }
    }

    #[must_use]
    pub fn invalid_year(value: &str) -> Self {
        Self {
            code: ApiErrorCode::InvalidYear,
            message: "invalid census year".to_string(),
            details: json!({"value": value}),
        }
    }

    #[must_use]
    pub fn invalid_body(message: impl Into<String>) -> Self {
        Self {
            code: ApiErrorCode::InvalidBody,
            message: message.into(),
            details: json!({}),
        }
    }

    #[must_use]
    pub fn not_found(resource: &str, id: i64) -> Self {
        Self {
            code: ApiErrorCode::NotFound,
            message: format!("{resource} not found"),
            details: json!({"id": id}),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: ApiErrorCode::Internal,
            message: message.into(),
            details: json!({}),
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::InvalidRequest(msg) => Self {
                code: ApiErrorCode::InvalidQueryParameter,
                message: msg,
                details: json!({}),
            },
            QueryError::InvalidCursor(inner) => Self {
                code: ApiErrorCode::InvalidCursor,
                message: "invalid cursor".to_string(),
                details: json!({"reason": inner.message}),
            },
            QueryError::Storage(msg) => Self::internal(msg),
        }
    }
}
