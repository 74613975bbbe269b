#![forbid(unsafe_code)]

mod dto;
mod errors;
pub mod params;

pub use dto::{HealthDto, ListResponseDto, MicrodadoDto, PageDto};
pub use errors::{ApiError, ApiErrorCode};

pub const CRATE_NAME: &str = "censo-api";
pub const API_VERSION: &str = "v1";
